use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{GeneId, GroupId, TaxonId};

/// Surrogate id assigned to a retained tree node during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One retained node of an orthology tree in nested-set encoding.
///
/// For two records sharing `group_id`, the `[left, right]` intervals are
/// either disjoint or one strictly contains the other; containment mirrors
/// the ancestor/descendant relationship of the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchicalGroupRecord {
    pub id: RecordId,
    pub group_id: GroupId,
    pub left: u32,
    pub right: u32,
    pub taxon_id: Option<TaxonId>,
}

impl HierarchicalGroupRecord {
    /// Ancestor-or-self containment test, O(1) on the nested-set bounds.
    pub fn contains(&self, other: &HierarchicalGroupRecord) -> bool {
        self.group_id == other.group_id
            && self.left <= other.left
            && self.right >= other.right
    }
}

/// Gene-to-record association. At most one per gene; the first assignment
/// made during ingestion wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneOrthologyAssignment {
    pub gene: GeneId,
    pub record: RecordId,
}

/// Read-only queryable orthology index built from an ingestion pass.
///
/// Records are kept sorted by `(group_id, left)` so that all records of one
/// orthology tree form a contiguous slice and descendant scans stay local.
#[derive(Debug, Clone, Default)]
pub struct OrthologyIndex {
    records: Vec<HierarchicalGroupRecord>,
    position: HashMap<RecordId, usize>,
    record_of_gene: HashMap<GeneId, RecordId>,
    genes_of_record: HashMap<RecordId, Vec<GeneId>>,
}

impl OrthologyIndex {
    pub fn new(
        mut records: Vec<HierarchicalGroupRecord>,
        assignments: Vec<GeneOrthologyAssignment>,
    ) -> Self {
        records.sort_by(|a, b| (&a.group_id, a.left).cmp(&(&b.group_id, b.left)));
        let position = records
            .iter()
            .enumerate()
            .map(|(pos, record)| (record.id, pos))
            .collect();

        let mut record_of_gene = HashMap::new();
        let mut genes_of_record: HashMap<RecordId, Vec<GeneId>> = HashMap::new();
        for assignment in assignments {
            record_of_gene.insert(assignment.gene.clone(), assignment.record);
            genes_of_record
                .entry(assignment.record)
                .or_default()
                .push(assignment.gene);
        }

        Self {
            records,
            position,
            record_of_gene,
            genes_of_record,
        }
    }

    pub fn records(&self) -> &[HierarchicalGroupRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record_for_gene(&self, gene: &GeneId) -> Option<&HierarchicalGroupRecord> {
        let record = self.record_of_gene.get(gene)?;
        let pos = self.position.get(record)?;
        self.records.get(*pos)
    }

    /// All genes orthologous to `gene` at the taxonomic level `taxon`.
    ///
    /// Finds the record assigned to `gene`, then its most specific
    /// ancestor-or-self at `taxon` (the containing record with the largest
    /// `left`), and returns every gene assigned under that ancestor,
    /// including `gene` itself. Absence of a record or of an ancestor at
    /// the requested rank yields an empty set, never an error.
    pub fn lookup_orthologs(&self, gene: &GeneId, taxon: TaxonId) -> BTreeSet<GeneId> {
        let Some(record) = self.record_for_gene(gene) else {
            return BTreeSet::new();
        };

        let group = self.group_slice(&record.group_id);
        let anchor = group
            .iter()
            .filter(|candidate| candidate.contains(record))
            .filter(|candidate| candidate.taxon_id == Some(taxon))
            .fold(None::<&HierarchicalGroupRecord>, |best, candidate| {
                match best {
                    Some(best) if best.left >= candidate.left => Some(best),
                    _ => Some(candidate),
                }
            });
        let Some(anchor) = anchor else {
            debug!(gene = %gene, taxon = %taxon, "no ancestor at requested taxon");
            return BTreeSet::new();
        };

        group
            .iter()
            .filter(|descendant| anchor.contains(descendant))
            .flat_map(|descendant| {
                self.genes_of_record
                    .get(&descendant.id)
                    .into_iter()
                    .flatten()
                    .cloned()
            })
            .collect()
    }

    fn group_slice(&self, group: &GroupId) -> &[HierarchicalGroupRecord] {
        let start = self.records.partition_point(|r| r.group_id < *group);
        let end = self.records.partition_point(|r| r.group_id <= *group);
        &self.records[start..end]
    }
}

/// Published index handle. Re-ingestion replaces the whole record set in
/// one atomic swap; in-flight readers keep querying their snapshot.
#[derive(Debug, Default)]
pub struct SharedIndex {
    inner: RwLock<Arc<OrthologyIndex>>,
}

impl SharedIndex {
    pub fn new(index: OrthologyIndex) -> Self {
        Self {
            inner: RwLock::new(Arc::new(index)),
        }
    }

    pub fn publish(&self, index: OrthologyIndex) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(index);
    }

    pub fn snapshot(&self) -> Arc<OrthologyIndex> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
