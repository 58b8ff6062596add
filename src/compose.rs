use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{EntityId, GeneId, TaxonId};
use crate::error::OrthoError;
use crate::homology::HomologyResolver;
use crate::index::OrthologyIndex;
use crate::taxonomy::SpeciesTaxonomy;

/// Taxonomic anchor of a multi-species query; resolved against the
/// installation's taxonomy to a concrete species set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyFilter {
    pub taxon: TaxonId,
}

/// Requested genes for one species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneFilter {
    pub species: TaxonId,
    #[serde(default)]
    pub genes: BTreeSet<GeneId>,
}

/// One condition; multiple condition filters are AND-combined.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConditionFilter {
    #[serde(default)]
    pub anat_entities: BTreeSet<EntityId>,
    #[serde(default)]
    pub dev_stages: BTreeSet<EntityId>,
}

/// Complete query parameters, constructed per query and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFilter {
    #[serde(default)]
    pub gene_filters: Vec<GeneFilter>,
    #[serde(default)]
    pub conditions: Vec<ConditionFilter>,
    pub taxonomy: TaxonomyFilter,
    #[serde(default)]
    pub force_homology: bool,
}

/// Which species a gene belongs to and which species' ontologies contain a
/// given entity. Provided by the installation's dataset catalog.
pub trait InstallationCatalog {
    fn species_of_gene(&self, gene: &GeneId) -> Option<TaxonId>;
    fn entity_in_species(&self, entity: &EntityId, species: TaxonId) -> bool;
}

/// Map-backed catalog, loadable from the installation's data files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub genes: BTreeMap<GeneId, TaxonId>,
    #[serde(default)]
    pub entities: BTreeMap<EntityId, BTreeSet<TaxonId>>,
}

impl InstallationCatalog for CatalogData {
    fn species_of_gene(&self, gene: &GeneId) -> Option<TaxonId> {
        self.genes.get(gene).copied()
    }

    fn entity_in_species(&self, entity: &EntityId, species: TaxonId) -> bool {
        self.entities
            .get(entity)
            .map(|set| set.contains(&species))
            .unwrap_or(false)
    }
}

/// Concrete ids to query for one species. `incomplete` flags that some
/// requested gene or entity found no ortholog/homolog counterpart in this
/// species; callers decide whether partial coverage is acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesScope {
    pub species: TaxonId,
    pub genes: BTreeSet<GeneId>,
    pub anat_entities: BTreeSet<EntityId>,
    pub dev_stages: BTreeSet<EntityId>,
    pub incomplete: bool,
}

impl SpeciesScope {
    fn new(species: TaxonId) -> Self {
        Self {
            species,
            genes: BTreeSet::new(),
            anat_entities: BTreeSet::new(),
            dev_stages: BTreeSet::new(),
            incomplete: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedQueryScope {
    pub taxon: TaxonId,
    pub species: Vec<SpeciesScope>,
}

/// Combines a call filter with the orthology index, the homology resolver
/// and the installation catalog into one validated query scope.
pub struct Composer<'a, C: InstallationCatalog> {
    index: &'a OrthologyIndex,
    resolver: &'a HomologyResolver,
    taxonomy: &'a SpeciesTaxonomy,
    catalog: &'a C,
}

impl<'a, C: InstallationCatalog> Composer<'a, C> {
    pub fn new(
        index: &'a OrthologyIndex,
        resolver: &'a HomologyResolver,
        taxonomy: &'a SpeciesTaxonomy,
        catalog: &'a C,
    ) -> Self {
        Self {
            index,
            resolver,
            taxonomy,
            catalog,
        }
    }

    /// Resolve the filter to per-species gene/entity/stage sets.
    ///
    /// Without `force_homology` the scope is exactly the explicit ids.
    /// With it, and more than one target species, requested genes are
    /// expanded through the orthology index at the filter's taxon and
    /// requested entities/stages through homology relations (never
    /// homoplasy). Missing coverage flags the species `incomplete` instead
    /// of failing the query; an empty species set is a configuration
    /// error.
    pub fn compose(&self, filter: &CallFilter) -> Result<ResolvedQueryScope, OrthoError> {
        let species = self.taxonomy.species_under(filter.taxonomy.taxon);
        if species.is_empty() {
            return Err(OrthoError::UnknownTaxon(filter.taxonomy.taxon));
        }

        let mut scopes: BTreeMap<TaxonId, SpeciesScope> = species
            .iter()
            .map(|&sp| (sp, SpeciesScope::new(sp)))
            .collect();

        for gene_filter in &filter.gene_filters {
            match scopes.get_mut(&gene_filter.species) {
                Some(scope) => scope.genes.extend(gene_filter.genes.iter().cloned()),
                None => {
                    debug!(species = %gene_filter.species, "gene filter targets species outside taxonomy filter");
                }
            }
        }

        let mut anat_entities: BTreeSet<EntityId> = BTreeSet::new();
        let mut dev_stages: BTreeSet<EntityId> = BTreeSet::new();
        for condition in &filter.conditions {
            anat_entities.extend(condition.anat_entities.iter().cloned());
            dev_stages.extend(condition.dev_stages.iter().cloned());
        }
        for scope in scopes.values_mut() {
            scope.anat_entities.extend(anat_entities.iter().cloned());
            scope.dev_stages.extend(dev_stages.iter().cloned());
        }

        if filter.force_homology && scopes.len() > 1 {
            self.expand_genes(filter, &mut scopes);
            self.expand_entities(filter, &anat_entities, &mut scopes, EntityKind::Anat);
            self.expand_entities(filter, &dev_stages, &mut scopes, EntityKind::Stage);
        }

        Ok(ResolvedQueryScope {
            taxon: filter.taxonomy.taxon,
            species: scopes.into_values().collect(),
        })
    }

    fn expand_genes(&self, filter: &CallFilter, scopes: &mut BTreeMap<TaxonId, SpeciesScope>) {
        let requested: BTreeSet<GeneId> = filter
            .gene_filters
            .iter()
            .flat_map(|gene_filter| gene_filter.genes.iter().cloned())
            .collect();

        for gene in &requested {
            let orthologs = self.index.lookup_orthologs(gene, filter.taxonomy.taxon);
            for scope in scopes.values_mut() {
                let mut covered = false;
                if self.catalog.species_of_gene(gene) == Some(scope.species) {
                    scope.genes.insert(gene.clone());
                    covered = true;
                }
                for ortholog in &orthologs {
                    if self.catalog.species_of_gene(ortholog) == Some(scope.species) {
                        scope.genes.insert(ortholog.clone());
                        covered = true;
                    }
                }
                if !covered {
                    debug!(gene = %gene, species = %scope.species, "no ortholog in species");
                    scope.incomplete = true;
                }
            }
        }
    }

    fn expand_entities(
        &self,
        filter: &CallFilter,
        requested: &BTreeSet<EntityId>,
        scopes: &mut BTreeMap<TaxonId, SpeciesScope>,
        kind: EntityKind,
    ) {
        for entity in requested {
            let partners =
                self.resolver
                    .comparable_entities(entity, filter.taxonomy.taxon, true);
            for scope in scopes.values_mut() {
                let mut covered = self.catalog.entity_in_species(entity, scope.species);
                for (partner, _) in &partners {
                    if self.catalog.entity_in_species(partner, scope.species) {
                        match kind {
                            EntityKind::Anat => scope.anat_entities.insert(partner.clone()),
                            EntityKind::Stage => scope.dev_stages.insert(partner.clone()),
                        };
                        covered = true;
                    }
                }
                if !covered {
                    debug!(entity = %entity, species = %scope.species, "no homologous entity in species");
                    scope.incomplete = true;
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum EntityKind {
    Anat,
    Stage,
}
