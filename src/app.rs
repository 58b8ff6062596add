use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::compose::{CallFilter, CatalogData, Composer, ResolvedQueryScope};
use crate::config::ResolvedConfig;
use crate::domain::{EntityId, ExternalGeneId, GeneId, TaxonId};
use crate::error::OrthoError;
use crate::homology::{Comparability, EvoTransRelation, HomologyResolver};
use crate::index::OrthologyIndex;
use crate::ingest::{Group, GroupForest, IngestWarning, ingest};
use crate::store::{IndexMeta, IndexStore, read_json};
use crate::taxonomy::{SpeciesTaxonomy, TaxonNode};

/// One row of the installation's gene mapping file: a pipeline gene id,
/// the internal gene it resolves to, and the species that gene belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneMapEntry {
    pub external: ExternalGeneId,
    pub internal: GeneId,
    pub species: TaxonId,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub records: usize,
    pub assignments: usize,
    pub warnings: Vec<IngestWarning>,
    pub index_dir: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrthologReport {
    pub gene: GeneId,
    pub taxon: TaxonId,
    pub orthologs: BTreeSet<GeneId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparableReport {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    pub taxon: TaxonId,
    pub comparable: bool,
    pub relation: Option<EvoTransRelation>,
}

pub struct App {
    store: IndexStore,
}

impl App {
    pub fn new(store: IndexStore) -> Self {
        Self { store }
    }

    /// One-shot batch step: read the group trees and gene mapping, run the
    /// nested-set ingestion, and persist the index atomically. Warnings
    /// are part of the report, not a side channel.
    pub fn ingest(&self, config: &ResolvedConfig) -> Result<IngestReport, OrthoError> {
        let groups: Vec<Group> = read_json(&config.groups)?;
        let gene_map: Vec<GeneMapEntry> = read_json(&config.gene_map)?;
        let resolver: HashMap<ExternalGeneId, GeneId> = gene_map
            .into_iter()
            .map(|entry| (entry.external, entry.internal))
            .collect();

        let forest = GroupForest::from_groups(groups);
        info!(nodes = forest.len(), "loaded orthology trees");

        let output = ingest(&forest, &config.scope_taxa, &resolver)?;

        let meta = IndexMeta {
            tool: format!("orthoscope/{}", env!("CARGO_PKG_VERSION")),
            built_at: chrono::Utc::now().to_rfc3339(),
            records: output.records.len(),
            assignments: output.assignments.len(),
            warnings: output.warnings.len(),
            scope_taxa: config.scope_taxa.iter().copied().collect(),
        };
        self.store.save(&output.records, &output.assignments, &meta)?;

        Ok(IngestReport {
            records: output.records.len(),
            assignments: output.assignments.len(),
            warnings: output.warnings,
            index_dir: self.store.root().to_string(),
        })
    }

    pub fn load_index(&self) -> Result<OrthologyIndex, OrthoError> {
        let (records, assignments) = self.store.load()?;
        Ok(OrthologyIndex::new(records, assignments))
    }

    pub fn orthologs(&self, gene: GeneId, taxon: TaxonId) -> Result<OrthologReport, OrthoError> {
        let index = self.load_index()?;
        let orthologs = index.lookup_orthologs(&gene, taxon);
        Ok(OrthologReport {
            gene,
            taxon,
            orthologs,
        })
    }

    pub fn comparable(
        &self,
        config: &ResolvedConfig,
        entity_a: EntityId,
        entity_b: EntityId,
        taxon: TaxonId,
    ) -> Result<ComparableReport, OrthoError> {
        let resolver = load_resolver(config)?;
        let result = resolver.is_comparable(&entity_a, &entity_b, taxon);
        let relation = match result {
            Comparability::Comparable(relation) => Some(relation),
            Comparability::NotComparable => None,
        };
        Ok(ComparableReport {
            entity_a,
            entity_b,
            taxon,
            comparable: relation.is_some(),
            relation,
        })
    }

    pub fn scope(
        &self,
        config: &ResolvedConfig,
        filter: &CallFilter,
    ) -> Result<ResolvedQueryScope, OrthoError> {
        let index = self.load_index()?;
        let taxonomy = load_taxonomy(config)?;
        let resolver = load_resolver(config)?;
        let catalog = load_catalog(config)?;
        let composer = Composer::new(&index, &resolver, &taxonomy, &catalog);
        composer.compose(filter)
    }
}

pub fn load_taxonomy(config: &ResolvedConfig) -> Result<SpeciesTaxonomy, OrthoError> {
    let nodes: Vec<TaxonNode> = read_json(&config.taxonomy)?;
    Ok(SpeciesTaxonomy::new(nodes))
}

pub fn load_resolver(config: &ResolvedConfig) -> Result<HomologyResolver, OrthoError> {
    let taxonomy = load_taxonomy(config)?;
    let relations: Vec<EvoTransRelation> = match &config.relations {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    Ok(HomologyResolver::new(relations, taxonomy))
}

pub fn load_catalog(config: &ResolvedConfig) -> Result<CatalogData, OrthoError> {
    let gene_map: Vec<GeneMapEntry> = read_json(&config.gene_map)?;
    let genes: BTreeMap<GeneId, TaxonId> = gene_map
        .into_iter()
        .map(|entry| (entry.internal, entry.species))
        .collect();
    let entities: BTreeMap<EntityId, BTreeSet<TaxonId>> = match &config.entities {
        Some(path) => read_json(path)?,
        None => BTreeMap::new(),
    };
    Ok(CatalogData { genes, entities })
}
