use std::collections::BTreeSet;
use std::fs;

use camino::Utf8PathBuf;

use orthoscope::app::App;
use orthoscope::compose::{CallFilter, ConditionFilter, GeneFilter, TaxonomyFilter};
use orthoscope::config::ResolvedConfig;
use orthoscope::domain::{EntityId, GeneId, TaxonId};
use orthoscope::error::OrthoError;
use orthoscope::ingest::IngestWarning;
use orthoscope::store::IndexStore;

fn write(path: &Utf8PathBuf, content: &str) {
    fs::write(path.as_std_path(), content).unwrap();
}

fn installation(dir: &Utf8PathBuf) -> ResolvedConfig {
    let groups = dir.join("groups.json");
    let gene_map = dir.join("genes.json");
    let taxonomy = dir.join("taxonomy.json");
    let relations = dir.join("relations.json");
    let entities = dir.join("entities.json");

    write(
        &groups,
        r#"[{
            "id": "HOG1",
            "taxon_id": 1,
            "children": [
                {"id": "HOG1.hs", "taxon_id": 9606, "genes": ["x1", "x9"]},
                {"id": "HOG1.gg", "taxon_id": 9031, "genes": ["x2"]}
            ]
        }]"#,
    );
    write(
        &gene_map,
        r#"[
            {"external": "x1", "internal": "G1", "species": 9606},
            {"external": "x2", "internal": "G2", "species": 9031}
        ]"#,
    );
    write(
        &taxonomy,
        r#"[
            {"id": 1, "name": "Tetrapoda"},
            {"id": 9606, "parent": 1, "species": true},
            {"id": 9031, "parent": 1, "species": true}
        ]"#,
    );
    write(
        &relations,
        r#"[{
            "relation_type": "homology",
            "taxon_scope": 1,
            "entities": ["UBERON:0000001", "UBERON:0000002"],
            "evidence": [{
                "evidence_code": "ECO:0000033",
                "confidence": "high",
                "references": ["PMID:12345"]
            }]
        }]"#,
    );
    write(
        &entities,
        r#"{
            "UBERON:0000001": [9606],
            "UBERON:0000002": [9031]
        }"#,
    );

    ResolvedConfig {
        schema_version: 1,
        groups,
        gene_map,
        taxonomy,
        relations: Some(relations),
        entities: Some(entities),
        scope_taxa: [1, 9606, 9031].into_iter().map(TaxonId::new).collect(),
        index_dir: dir.join("index"),
    }
}

#[test]
fn ingest_then_query_round_trip() {
    let temp = tempfile::tempdir().unwrap();
    let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let config = installation(&dir);
    let app = App::new(IndexStore::new(config.index_dir.clone()));

    let report = app.ingest(&config).unwrap();
    assert_eq!(report.records, 3);
    assert_eq!(report.assignments, 2);
    // x9 has no internal gene: dropped from assignment, reported for audit.
    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(
        report.warnings[0],
        IngestWarning::UnresolvedGene { .. }
    ));

    let result = app
        .orthologs("G1".parse().unwrap(), TaxonId::new(1))
        .unwrap();
    assert_eq!(result.orthologs.len(), 2);

    let result = app
        .orthologs("G1".parse().unwrap(), TaxonId::new(9606))
        .unwrap();
    assert_eq!(result.orthologs.len(), 1);
}

#[test]
fn comparable_exposes_retained_evidence() {
    let temp = tempfile::tempdir().unwrap();
    let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let config = installation(&dir);
    let app = App::new(IndexStore::new(config.index_dir.clone()));

    let report = app
        .comparable(
            &config,
            "UBERON:0000001".parse().unwrap(),
            "UBERON:0000002".parse().unwrap(),
            TaxonId::new(9606),
        )
        .unwrap();
    assert!(report.comparable);
    let relation = report.relation.unwrap();
    assert_eq!(relation.evidence.len(), 1);
    assert_eq!(relation.evidence[0].evidence_code, "ECO:0000033");

    let report = app
        .comparable(
            &config,
            "UBERON:0000001".parse().unwrap(),
            "UBERON:0000404".parse().unwrap(),
            TaxonId::new(9606),
        )
        .unwrap();
    assert!(!report.comparable);
    assert!(report.relation.is_none());
}

#[test]
fn scope_expands_across_species_after_ingest() {
    let temp = tempfile::tempdir().unwrap();
    let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let config = installation(&dir);
    let app = App::new(IndexStore::new(config.index_dir.clone()));
    app.ingest(&config).unwrap();

    let filter = CallFilter {
        gene_filters: vec![GeneFilter {
            species: TaxonId::new(9606),
            genes: ["G1".parse().unwrap()].into_iter().collect(),
        }],
        conditions: vec![ConditionFilter {
            anat_entities: ["UBERON:0000001".parse().unwrap()].into_iter().collect(),
            dev_stages: BTreeSet::new(),
        }],
        taxonomy: TaxonomyFilter {
            taxon: TaxonId::new(1),
        },
        force_homology: true,
    };

    let scope = app.scope(&config, &filter).unwrap();
    let chicken = scope
        .species
        .iter()
        .find(|s| s.species == TaxonId::new(9031))
        .unwrap();
    assert!(chicken.genes.contains(&"G2".parse::<GeneId>().unwrap()));
    assert!(
        chicken
            .anat_entities
            .contains(&"UBERON:0000002".parse::<EntityId>().unwrap())
    );
    assert!(!chicken.incomplete);
}

#[test]
fn query_before_ingest_reports_missing_index() {
    let temp = tempfile::tempdir().unwrap();
    let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let app = App::new(IndexStore::new(dir.join("index")));

    let err = app
        .orthologs("G1".parse().unwrap(), TaxonId::new(1))
        .unwrap_err();
    assert!(matches!(err, OrthoError::IndexNotFound(_)));
}
