use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{EntityId, RelationType, TaxonId};
use crate::taxonomy::SpeciesTaxonomy;

/// One piece of curated support for a relation. Multiple evidences for the
/// same relation are all retained; confidence aggregation is a caller
/// decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationEvidence {
    pub evidence_code: String,
    pub confidence: String,
    #[serde(default)]
    pub supporting_text: Option<String>,
    #[serde(default)]
    pub references: BTreeSet<String>,
}

/// Typed, taxon-scoped evolutionary relation between anatomical or
/// developmental entities.
///
/// Most relations link exactly two entities; the set may be larger when no
/// single ancestral structure exists (e.g. lung/swim bladder homology).
/// Immutable; produced by curation ingestion, consumed read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvoTransRelation {
    pub relation_type: RelationType,
    pub taxon_scope: TaxonId,
    pub entities: BTreeSet<EntityId>,
    #[serde(default)]
    pub evidence: Vec<RelationEvidence>,
}

impl EvoTransRelation {
    pub fn links(&self, a: &EntityId, b: &EntityId) -> bool {
        self.entities.contains(a) && self.entities.contains(b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparability {
    Comparable(EvoTransRelation),
    NotComparable,
}

impl Comparability {
    pub fn is_comparable(&self) -> bool {
        matches!(self, Comparability::Comparable(_))
    }

    pub fn relation(&self) -> Option<&EvoTransRelation> {
        match self {
            Comparability::Comparable(relation) => Some(relation),
            Comparability::NotComparable => None,
        }
    }
}

/// Answers "are entities X and Y comparable at taxon T" over the curated
/// relation set, scoped by the species taxonomy.
#[derive(Debug, Clone, Default)]
pub struct HomologyResolver {
    relations: Vec<EvoTransRelation>,
    taxonomy: SpeciesTaxonomy,
}

impl HomologyResolver {
    pub fn new(relations: Vec<EvoTransRelation>, taxonomy: SpeciesTaxonomy) -> Self {
        Self {
            relations,
            taxonomy,
        }
    }

    pub fn relations(&self) -> &[EvoTransRelation] {
        &self.relations
    }

    /// A relation applies at `taxon` when its scope is an ancestor-or-self
    /// of `taxon`: broader relations hold for more specific descendants.
    fn in_scope(&self, relation: &EvoTransRelation, taxon: TaxonId) -> bool {
        self.taxonomy
            .is_ancestor_or_self(relation.taxon_scope, taxon)
    }

    /// Among relations linking both entities and applying at `taxon`, the
    /// one whose scope is closest to `taxon` (deepest) wins; ties go to the
    /// earliest curated relation. Homoplasy relations are reported like any
    /// other; callers decide what they may be used for.
    pub fn is_comparable(&self, a: &EntityId, b: &EntityId, taxon: TaxonId) -> Comparability {
        let winner = self
            .relations
            .iter()
            .filter(|relation| relation.links(a, b))
            .filter(|relation| self.in_scope(relation, taxon))
            .fold(None::<&EvoTransRelation>, |best, candidate| match best {
                Some(best)
                    if self.taxonomy.depth(best.taxon_scope)
                        >= self.taxonomy.depth(candidate.taxon_scope) =>
                {
                    Some(best)
                }
                _ => Some(candidate),
            });

        match winner {
            Some(relation) => Comparability::Comparable(relation.clone()),
            None => {
                debug!(a = %a, b = %b, taxon = %taxon, "no comparable relation");
                Comparability::NotComparable
            }
        }
    }

    /// Partner entities of `entity` across relations applying at `taxon`.
    /// With `homology_only`, homoplasy relations are skipped entirely
    /// (convergent similarity never justifies forced-homology expansion).
    pub fn comparable_entities(
        &self,
        entity: &EntityId,
        taxon: TaxonId,
        homology_only: bool,
    ) -> Vec<(EntityId, &EvoTransRelation)> {
        let mut partners = Vec::new();
        for relation in &self.relations {
            if homology_only && relation.relation_type == RelationType::Homoplasy {
                continue;
            }
            if !relation.entities.contains(entity) || !self.in_scope(relation, taxon) {
                continue;
            }
            for partner in &relation.entities {
                if partner != entity {
                    partners.push((partner.clone(), relation));
                }
            }
        }
        partners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::TaxonNode;

    fn taxonomy() -> SpeciesTaxonomy {
        SpeciesTaxonomy::new(vec![
            TaxonNode {
                id: TaxonId::new(1),
                parent: None,
                species: false,
                name: None,
            },
            TaxonNode {
                id: TaxonId::new(2),
                parent: Some(TaxonId::new(1)),
                species: false,
                name: None,
            },
            TaxonNode {
                id: TaxonId::new(9606),
                parent: Some(TaxonId::new(2)),
                species: true,
                name: None,
            },
        ])
    }

    fn relation(kind: RelationType, scope: u32, entities: &[&str]) -> EvoTransRelation {
        EvoTransRelation {
            relation_type: kind,
            taxon_scope: TaxonId::new(scope),
            entities: entities.iter().map(|e| e.parse().unwrap()).collect(),
            evidence: Vec::new(),
        }
    }

    #[test]
    fn broader_scope_applies_to_descendants() {
        let resolver = HomologyResolver::new(
            vec![relation(RelationType::Homology, 1, &["U:1", "U:2"])],
            taxonomy(),
        );
        let a: EntityId = "U:1".parse().unwrap();
        let b: EntityId = "U:2".parse().unwrap();
        assert!(resolver.is_comparable(&a, &b, TaxonId::new(9606)).is_comparable());
    }

    #[test]
    fn narrower_scope_does_not_apply_upward() {
        let resolver = HomologyResolver::new(
            vec![relation(RelationType::Homology, 9606, &["U:1", "U:2"])],
            taxonomy(),
        );
        let a: EntityId = "U:1".parse().unwrap();
        let b: EntityId = "U:2".parse().unwrap();
        assert!(!resolver.is_comparable(&a, &b, TaxonId::new(1)).is_comparable());
    }

    #[test]
    fn closest_scope_wins() {
        let broad = relation(RelationType::Homology, 1, &["U:1", "U:2"]);
        let narrow = relation(RelationType::Homology, 2, &["U:1", "U:2"]);
        let resolver = HomologyResolver::new(vec![broad, narrow.clone()], taxonomy());
        let a: EntityId = "U:1".parse().unwrap();
        let b: EntityId = "U:2".parse().unwrap();
        let result = resolver.is_comparable(&a, &b, TaxonId::new(9606));
        assert_eq!(result.relation(), Some(&narrow));
    }

    #[test]
    fn homoplasy_reported_but_excluded_from_expansion() {
        let resolver = HomologyResolver::new(
            vec![relation(RelationType::Homoplasy, 1, &["U:1", "U:2"])],
            taxonomy(),
        );
        let a: EntityId = "U:1".parse().unwrap();
        let b: EntityId = "U:2".parse().unwrap();

        let result = resolver.is_comparable(&a, &b, TaxonId::new(9606));
        assert!(result.is_comparable());

        let partners = resolver.comparable_entities(&a, TaxonId::new(9606), true);
        assert!(partners.is_empty());
    }

    #[test]
    fn related_entity_set_links_indirectly() {
        // lung/swim bladder style relation over a set of three entities
        let resolver = HomologyResolver::new(
            vec![relation(RelationType::Homology, 1, &["U:1", "U:2", "U:3"])],
            taxonomy(),
        );
        let a: EntityId = "U:1".parse().unwrap();
        let partners = resolver.comparable_entities(&a, TaxonId::new(9606), false);
        assert_eq!(partners.len(), 2);
    }
}
