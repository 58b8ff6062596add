use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{ExternalGeneId, GeneId, GroupId, TaxonId};
use crate::error::OrthoError;
use crate::index::{GeneOrthologyAssignment, HierarchicalGroupRecord, RecordId};

/// Input tree node as produced by the external orthology pipeline.
/// Transient; discarded after ingestion, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    #[serde(default)]
    pub taxon_id: Option<TaxonId>,
    #[serde(default)]
    pub children: Vec<Group>,
    #[serde(default)]
    pub genes: Vec<ExternalGeneId>,
}

pub type NodeIdx = usize;

#[derive(Debug, Clone)]
struct GroupNode {
    id: GroupId,
    taxon_id: Option<TaxonId>,
    children: Vec<NodeIdx>,
    genes: Vec<ExternalGeneId>,
}

/// Arena of group nodes. Ingestion walks indices instead of a recursive
/// tree so that deep orthology trees cannot exhaust the call stack, and a
/// malformed input that aliases a node under two parents (or into itself)
/// is detectable as a repeated index.
#[derive(Debug, Clone, Default)]
pub struct GroupForest {
    nodes: Vec<GroupNode>,
    roots: Vec<NodeIdx>,
}

impl GroupForest {
    /// Flatten owned input trees into the arena. An owned `Group` tree
    /// cannot be cyclic; cycles only arise from hand-built arenas.
    pub fn from_groups(groups: Vec<Group>) -> Self {
        let mut forest = Self::default();
        for group in groups {
            let root = forest.push_subtree(group);
            forest.roots.push(root);
        }
        forest
    }

    pub fn add_node(
        &mut self,
        id: GroupId,
        taxon_id: Option<TaxonId>,
        genes: Vec<ExternalGeneId>,
    ) -> NodeIdx {
        self.nodes.push(GroupNode {
            id,
            taxon_id,
            children: Vec::new(),
            genes,
        });
        self.nodes.len() - 1
    }

    pub fn add_child(&mut self, parent: NodeIdx, child: NodeIdx) {
        self.nodes[parent].children.push(child);
    }

    pub fn add_root(&mut self, root: NodeIdx) {
        self.roots.push(root);
    }

    pub fn roots(&self) -> &[NodeIdx] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push_subtree(&mut self, group: Group) -> NodeIdx {
        let Group {
            id,
            taxon_id,
            children,
            genes,
        } = group;
        let root = self.add_node(id, taxon_id, genes);
        let mut stack: Vec<(NodeIdx, std::vec::IntoIter<Group>)> =
            vec![(root, children.into_iter())];
        loop {
            let next = match stack.last_mut() {
                Some((parent, iter)) => iter.next().map(|child| (*parent, child)),
                None => break,
            };
            match next {
                Some((parent, child)) => {
                    let Group {
                        id,
                        taxon_id,
                        children,
                        genes,
                    } = child;
                    let idx = self.add_node(id, taxon_id, genes);
                    self.add_child(parent, idx);
                    stack.push((idx, children.into_iter()));
                }
                None => {
                    stack.pop();
                }
            }
        }
        root
    }
}

/// Maps a pipeline-assigned gene identifier to a gene of the installation,
/// if any. Resolution failures are expected and non-fatal.
pub trait GeneIdResolver {
    fn resolve(&self, id: &ExternalGeneId) -> Option<GeneId>;
}

impl GeneIdResolver for HashMap<ExternalGeneId, GeneId> {
    fn resolve(&self, id: &ExternalGeneId) -> Option<GeneId> {
        self.get(id).cloned()
    }
}

/// Non-fatal ingestion findings, returned as data so the caller decides
/// presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestWarning {
    /// A gene was seen in two different groups; the first assignment wins.
    GeneConflict {
        gene: GeneId,
        existing: RecordId,
        attempted: RecordId,
    },
    /// A cross-referenced gene id has no corresponding internal gene.
    UnresolvedGene {
        gene: ExternalGeneId,
        group: GroupId,
    },
}

#[derive(Debug, Clone, Default)]
pub struct IngestOutput {
    pub records: Vec<HierarchicalGroupRecord>,
    pub assignments: Vec<GeneOrthologyAssignment>,
    pub warnings: Vec<IngestWarning>,
}

/// Mutable state of one ingestion pass. Owned solely by the `ingest` call;
/// independent forests can be ingested in parallel.
struct IngestContext {
    next_bound: u32,
    next_record: u64,
    records: Vec<HierarchicalGroupRecord>,
    assignments: Vec<GeneOrthologyAssignment>,
    assigned: HashMap<GeneId, RecordId>,
    warnings: Vec<IngestWarning>,
}

impl IngestContext {
    fn new() -> Self {
        Self {
            next_bound: 1,
            next_record: 1,
            records: Vec::new(),
            assignments: Vec::new(),
            assigned: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    fn register_gene(&mut self, gene: GeneId, record: RecordId) {
        match self.assigned.get(&gene) {
            Some(existing) if *existing != record => {
                self.warnings.push(IngestWarning::GeneConflict {
                    gene,
                    existing: *existing,
                    attempted: record,
                });
            }
            Some(_) => {}
            None => {
                self.assigned.insert(gene.clone(), record);
                self.assignments
                    .push(GeneOrthologyAssignment { gene, record });
            }
        }
    }
}

enum Frame {
    Enter(NodeIdx),
    Exit(usize),
}

/// Walk the forest once, depth-first and left-to-right, assigning
/// nested-set bounds to every retained node and registering gene
/// associations with conflict detection.
///
/// A node whose taxon is absent from `scope_taxa` is discarded together
/// with its entire subtree; paralog nodes (`taxon_id == None`) are always
/// retained. Gene resolution failures and assignment conflicts are
/// collected as warnings and never abort the batch; a repeated node index
/// is a fatal cyclic-hierarchy error.
pub fn ingest<R: GeneIdResolver>(
    forest: &GroupForest,
    scope_taxa: &BTreeSet<TaxonId>,
    resolver: &R,
) -> Result<IngestOutput, OrthoError> {
    let mut ctx = IngestContext::new();
    let mut visited: HashSet<NodeIdx> = HashSet::new();

    for &root in &forest.roots {
        let group_id = forest.nodes[root].id.clone();
        // Bounds restart per top-level tree; records of different trees are
        // only ever compared under an equal group id.
        ctx.next_bound = 1;
        let mut stack = vec![Frame::Enter(root)];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(idx) => {
                    if !visited.insert(idx) {
                        return Err(OrthoError::CyclicHierarchy(group_id));
                    }
                    let node = &forest.nodes[idx];

                    if let Some(taxon) = node.taxon_id {
                        if !scope_taxa.contains(&taxon) {
                            debug!(group = %group_id, taxon = %taxon, "discarding out-of-scope subtree");
                            continue;
                        }
                    }

                    let record_id = RecordId::new(ctx.next_record);
                    ctx.next_record += 1;
                    let left = ctx.next_bound;
                    ctx.next_bound += 1;
                    let position = ctx.records.len();
                    ctx.records.push(HierarchicalGroupRecord {
                        id: record_id,
                        group_id: group_id.clone(),
                        left,
                        right: left,
                        taxon_id: node.taxon_id,
                    });

                    for external in &node.genes {
                        match resolver.resolve(external) {
                            Some(gene) => ctx.register_gene(gene, record_id),
                            None => ctx.warnings.push(IngestWarning::UnresolvedGene {
                                gene: external.clone(),
                                group: group_id.clone(),
                            }),
                        }
                    }

                    stack.push(Frame::Exit(position));
                    for &child in node.children.iter().rev() {
                        stack.push(Frame::Enter(child));
                    }
                }
                Frame::Exit(position) => {
                    ctx.records[position].right = ctx.next_bound;
                    ctx.next_bound += 1;
                }
            }
        }
    }

    info!(
        records = ctx.records.len(),
        assignments = ctx.assignments.len(),
        warnings = ctx.warnings.len(),
        "ingestion pass complete"
    );

    Ok(IngestOutput {
        records: ctx.records,
        assignments: ctx.assignments,
        warnings: ctx.warnings,
    })
}

/// Number of records an ingestion pass would produce for this forest:
/// one per retained node, where an out-of-scope taxon discards the whole
/// subtree without visiting its children.
pub fn count_groups(forest: &GroupForest, scope_taxa: &BTreeSet<TaxonId>) -> usize {
    let mut count = 0;
    let mut stack: Vec<NodeIdx> = forest.roots.to_vec();
    let mut visited: HashSet<NodeIdx> = HashSet::new();

    while let Some(idx) = stack.pop() {
        if !visited.insert(idx) {
            continue;
        }
        let node = &forest.nodes[idx];
        if let Some(taxon) = node.taxon_id {
            if !scope_taxa.contains(&taxon) {
                continue;
            }
        }
        count += 1;
        stack.extend(node.children.iter().copied());
    }

    count
}
