use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::TaxonId;

/// One node of the species taxonomy. `species: true` marks the leaves an
/// installation actually holds expression data for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonNode {
    pub id: TaxonId,
    #[serde(default)]
    pub parent: Option<TaxonId>,
    #[serde(default)]
    pub species: bool,
    #[serde(default)]
    pub name: Option<String>,
}

/// Species taxonomy as a parent map. Pure lookup structure: ancestor
/// tests, depth, and species-under-taxon enumeration.
#[derive(Debug, Clone, Default)]
pub struct SpeciesTaxonomy {
    nodes: HashMap<TaxonId, TaxonNode>,
}

impl SpeciesTaxonomy {
    pub fn new(nodes: Vec<TaxonNode>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|node| (node.id, node)).collect(),
        }
    }

    pub fn contains(&self, taxon: TaxonId) -> bool {
        self.nodes.contains_key(&taxon)
    }

    pub fn get(&self, taxon: TaxonId) -> Option<&TaxonNode> {
        self.nodes.get(&taxon)
    }

    pub fn parent(&self, taxon: TaxonId) -> Option<TaxonId> {
        self.nodes.get(&taxon).and_then(|node| node.parent)
    }

    /// Walks from `descendant` to the root; guarded against malformed
    /// parent maps containing a cycle.
    pub fn is_ancestor_or_self(&self, ancestor: TaxonId, descendant: TaxonId) -> bool {
        let mut current = Some(descendant);
        let mut seen = HashSet::new();
        while let Some(taxon) = current {
            if taxon == ancestor {
                return true;
            }
            if !seen.insert(taxon) {
                return false;
            }
            current = self.parent(taxon);
        }
        false
    }

    /// Distance from the root; unknown taxa report depth 0.
    pub fn depth(&self, taxon: TaxonId) -> usize {
        let mut depth = 0;
        let mut seen = HashSet::new();
        let mut current = self.parent(taxon);
        while let Some(taxon) = current {
            if !seen.insert(taxon) {
                break;
            }
            depth += 1;
            current = self.parent(taxon);
        }
        depth
    }

    /// All species at or below `taxon`.
    pub fn species_under(&self, taxon: TaxonId) -> BTreeSet<TaxonId> {
        self.nodes
            .values()
            .filter(|node| node.species)
            .filter(|node| self.is_ancestor_or_self(taxon, node.id))
            .map(|node| node.id)
            .collect()
    }
}
