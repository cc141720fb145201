//! Category hierarchy assembled from the flat list the store returns.
//!
//! Rules:
//! - parents are normalized with [`normalize_parent_id`], so bare ids and
//!   embedded `{id}` objects are equivalent;
//! - a record whose parent is absent, equals the configured root sentinel,
//!   or points at an id missing from the list is a root (orphan-as-root);
//! - siblings keep first-seen order unless [`SortOrder::Alphabetical`];
//! - duplicate ids and parent cycles are errors, never silent.

use super::aggregate::{normalize_parent_id, CategoryRecord, RecordId};
use crate::shared::error::TreeError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Which nodes the presenter may offer for selection.
///
/// There is no default: every call site names its rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectablePolicy {
    /// Only nodes without children (e.g. assigning a product to a category)
    LeafOnly,
    /// Only nodes with children
    ParentOnly,
    /// Every node (e.g. choosing a new parent)
    All,
}

impl SelectablePolicy {
    pub fn is_selectable(self, has_children: bool) -> bool {
        match self {
            SelectablePolicy::LeafOnly => !has_children,
            SelectablePolicy::ParentOnly => has_children,
            SelectablePolicy::All => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SelectablePolicy::LeafOnly => "leaf_only",
            SelectablePolicy::ParentOnly => "parent_only",
            SelectablePolicy::All => "all",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "leaf_only" => Some(SelectablePolicy::LeafOnly),
            "parent_only" => Some(SelectablePolicy::ParentOnly),
            "all" => Some(SelectablePolicy::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Keep the order in which the store listed the records
    #[default]
    FirstSeen,
    /// Case-insensitive by title at every level
    Alphabetical,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::FirstSeen => "first_seen",
            SortOrder::Alphabetical => "alphabetical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "first_seen" => Some(SortOrder::FirstSeen),
            "alphabetical" => Some(SortOrder::Alphabetical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeOptions {
    pub policy: SelectablePolicy,
    pub sort: SortOrder,
    /// Parent id that means "no parent" (some stores use `0`)
    pub root_parent: Option<RecordId>,
}

impl TreeOptions {
    pub fn new(policy: SelectablePolicy) -> Self {
        Self {
            policy,
            sort: SortOrder::FirstSeen,
            root_parent: None,
        }
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_root_parent(mut self, root: impl Into<RecordId>) -> Self {
        self.root_parent = Some(root.into());
        self
    }
}

/// Query string of the tree endpoint: `?policy=leaf_only&sort=alphabetical&root=0`.
///
/// `root` stays text because query values carry no type; it is parsed with
/// `RecordId::from_str`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeQuery {
    pub policy: SelectablePolicy,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

impl From<&TreeOptions> for TreeQuery {
    fn from(options: &TreeOptions) -> Self {
        Self {
            policy: options.policy,
            sort: options.sort,
            root: options.root_parent.as_ref().map(ToString::to_string),
        }
    }
}

impl From<TreeQuery> for TreeOptions {
    fn from(query: TreeQuery) -> Self {
        let root_parent = query
            .root
            .filter(|r| !r.trim().is_empty())
            .and_then(|r| r.parse::<RecordId>().ok());
        Self {
            policy: query.policy,
            sort: query.sort,
            root_parent,
        }
    }
}

/// Deepest hierarchy the backend stores. Nested JSON deeper than this would
/// exceed the recursion limits of the wire codec.
pub const MAX_DEPTH: usize = 32;

/// A node of the presented forest.
///
/// `Clone`, `PartialEq` and `Drop` walk the subtree with an explicit stack,
/// so arbitrarily deep chains never exhaust the thread stack.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryTreeNode {
    pub key: RecordId,
    pub title: String,
    pub selectable: bool,
    pub children: Vec<CategoryTreeNode>,
}

impl CategoryTreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Same label and key with a different set of children.
    fn with_children(&self, children: Vec<CategoryTreeNode>) -> Self {
        Self {
            key: self.key.clone(),
            title: self.title.clone(),
            selectable: self.selectable,
            children,
        }
    }
}

impl Clone for CategoryTreeNode {
    fn clone(&self) -> Self {
        self.with_children(rebuild_forest(&self.children, |node, children| {
            Some(node.with_children(children))
        }))
    }
}

impl PartialEq for CategoryTreeNode {
    fn eq(&self, other: &Self) -> bool {
        let left = flatten_tree(std::slice::from_ref(self));
        let right = flatten_tree(std::slice::from_ref(other));
        left.len() == right.len()
            && left.iter().zip(&right).all(|((da, a), (db, b))| {
                da == db
                    && a.key == b.key
                    && a.title == b.title
                    && a.selectable == b.selectable
                    && a.children.len() == b.children.len()
            })
    }
}

impl Drop for CategoryTreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Builds the forest from a flat list. Pure: the input is only read.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    options: TreeOptions,
}

impl TreeBuilder {
    pub fn new(options: TreeOptions) -> Self {
        Self { options }
    }

    pub fn build(&self, records: &[CategoryRecord]) -> Result<Vec<CategoryTreeNode>, TreeError> {
        if records.is_empty() {
            return Ok(vec![]);
        }

        let mut index: HashMap<&RecordId, usize> = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if index.insert(&record.id, i).is_some() {
                return Err(TreeError::DuplicateIdentifier(record.id.clone()));
            }
        }

        let parents: Vec<Option<usize>> = records
            .iter()
            .map(|record| self.resolve_parent(record, &index))
            .collect();

        check_acyclic(records, &parents)?;

        // Group children by parent position, preserving list order
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
        let mut roots = Vec::new();
        for (i, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => children[*p].push(i),
                None => roots.push(i),
            }
        }

        // Pre-order: every parent comes before its children
        let mut order = Vec::with_capacity(records.len());
        let mut pending: Vec<usize> = roots.iter().rev().copied().collect();
        while let Some(i) = pending.pop() {
            order.push(i);
            pending.extend(children[i].iter().rev());
        }

        // Walk it backwards so children are finished before their parent
        let mut built: Vec<Option<CategoryTreeNode>> = (0..records.len()).map(|_| None).collect();
        for &i in order.iter().rev() {
            let kids: Vec<CategoryTreeNode> = children[i]
                .iter()
                .filter_map(|&c| built[c].take())
                .collect();
            let record = &records[i];
            built[i] = Some(CategoryTreeNode {
                key: record.id.clone(),
                title: record.name.clone(),
                selectable: self.options.policy.is_selectable(!kids.is_empty()),
                children: kids,
            });
        }

        let mut forest: Vec<CategoryTreeNode> =
            roots.iter().filter_map(|&r| built[r].take()).collect();

        if self.options.sort == SortOrder::Alphabetical {
            sort_nodes(&mut forest);
        }
        Ok(forest)
    }

    /// Position of the parent record, or `None` when the record is a root.
    fn resolve_parent(
        &self,
        record: &CategoryRecord,
        index: &HashMap<&RecordId, usize>,
    ) -> Option<usize> {
        let parent_id = normalize_parent_id(record.parent.as_ref())?;
        if self.options.root_parent.as_ref() == Some(parent_id) {
            return None;
        }
        // Unknown parent: orphan-as-root
        index.get(parent_id).copied()
    }
}

/// Shorthand for `TreeBuilder::new(options).build(records)`.
pub fn build_tree(
    records: &[CategoryRecord],
    options: TreeOptions,
) -> Result<Vec<CategoryTreeNode>, TreeError> {
    TreeBuilder::new(options).build(records)
}

/// Walks every parent chain once; a chain that reaches a record already on
/// the current walk is a cycle.
fn check_acyclic(records: &[CategoryRecord], parents: &[Option<usize>]) -> Result<(), TreeError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; records.len()];
    let mut path: Vec<usize> = Vec::new();

    for start in 0..records.len() {
        let mut current = Some(start);
        while let Some(i) = current {
            match marks[i] {
                Mark::Done => break,
                Mark::OnPath => {
                    let from = path.iter().position(|&p| p == i).unwrap_or(0);
                    let mut cycle: Vec<RecordId> =
                        path[from..].iter().map(|&p| records[p].id.clone()).collect();
                    cycle.push(records[i].id.clone());
                    return Err(TreeError::CyclicHierarchy { path: cycle });
                }
                Mark::Unvisited => {
                    marks[i] = Mark::OnPath;
                    path.push(i);
                    current = parents[i];
                }
            }
        }
        for &i in &path {
            marks[i] = Mark::Done;
        }
        path.clear();
    }
    Ok(())
}

fn sort_nodes(nodes: &mut Vec<CategoryTreeNode>) {
    let mut pending: Vec<&mut Vec<CategoryTreeNode>> = vec![nodes];
    while let Some(level) = pending.pop() {
        level.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.key.cmp(&b.key))
        });
        for node in level {
            if !node.children.is_empty() {
                pending.push(&mut node.children);
            }
        }
    }
}

/// Post-order copy of a forest. `make` receives each source node with its
/// already rebuilt children and returns `None` to leave the node out.
fn rebuild_forest<F>(nodes: &[CategoryTreeNode], mut make: F) -> Vec<CategoryTreeNode>
where
    F: FnMut(&CategoryTreeNode, Vec<CategoryTreeNode>) -> Option<CategoryTreeNode>,
{
    struct Level<'a> {
        siblings: &'a [CategoryTreeNode],
        next: usize,
        built: Vec<CategoryTreeNode>,
    }

    let mut stack = vec![Level {
        siblings: nodes,
        next: 0,
        built: Vec::new(),
    }];
    while let Some(level) = stack.last() {
        let siblings = level.siblings;
        if let Some(node) = siblings.get(level.next) {
            stack.push(Level {
                siblings: &node.children,
                next: 0,
                built: Vec::new(),
            });
            continue;
        }

        let Some(finished) = stack.pop() else { break };
        let Some(parent) = stack.last_mut() else {
            return finished.built;
        };
        let siblings = parent.siblings;
        let source = &siblings[parent.next];
        parent.next += 1;
        if let Some(node) = make(source, finished.built) {
            parent.built.push(node);
        }
    }
    Vec::new()
}

/// Nodes whose title contains `query` (case-insensitive), together with their
/// ancestors. An empty query returns the forest unchanged.
pub fn filter_tree(nodes: &[CategoryTreeNode], query: &str) -> Vec<CategoryTreeNode> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return nodes.to_vec();
    }
    rebuild_forest(nodes, |node, children| {
        if node.title.to_lowercase().contains(&query) || !children.is_empty() {
            Some(node.with_children(children))
        } else {
            None
        }
    })
}

pub fn count_nodes(nodes: &[CategoryTreeNode]) -> usize {
    let mut count = 0;
    let mut pending: Vec<&[CategoryTreeNode]> = vec![nodes];
    while let Some(level) = pending.pop() {
        count += level.len();
        pending.extend(level.iter().map(|node| node.children.as_slice()));
    }
    count
}

/// Number of levels; 0 for an empty forest.
pub fn tree_depth(nodes: &[CategoryTreeNode]) -> usize {
    let mut depth = 0;
    let mut pending: Vec<(usize, &[CategoryTreeNode])> = vec![(1, nodes)];
    while let Some((level, siblings)) = pending.pop() {
        if siblings.is_empty() {
            continue;
        }
        depth = depth.max(level);
        pending.extend(siblings.iter().map(|node| (level + 1, node.children.as_slice())));
    }
    depth
}

pub fn find_node<'a>(nodes: &'a [CategoryTreeNode], key: &RecordId) -> Option<&'a CategoryTreeNode> {
    let mut pending: Vec<&CategoryTreeNode> = nodes.iter().rev().collect();
    while let Some(node) = pending.pop() {
        if &node.key == key {
            return Some(node);
        }
        pending.extend(node.children.iter().rev());
    }
    None
}

/// `key` and every id below it. Empty when `key` is not in the forest.
pub fn descendant_ids(nodes: &[CategoryTreeNode], key: &RecordId) -> HashSet<RecordId> {
    let mut out = HashSet::new();
    let Some(node) = find_node(nodes, key) else {
        return out;
    };
    let mut pending = vec![node];
    while let Some(node) = pending.pop() {
        out.insert(node.key.clone());
        pending.extend(node.children.iter());
    }
    out
}

/// Depth-first `(depth, node)` pairs in display order.
pub fn flatten_tree(nodes: &[CategoryTreeNode]) -> Vec<(usize, &CategoryTreeNode)> {
    let mut out = Vec::new();
    let mut pending: Vec<(usize, &CategoryTreeNode)> = nodes.iter().rev().map(|n| (0, n)).collect();
    while let Some((depth, node)) = pending.pop() {
        out.push((depth, node));
        pending.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
    }
    out
}
