pub mod aggregate;
pub mod orchestrator;
pub mod tree;

pub use aggregate::{
    normalize_parent_id, CategoryDto, CategoryRecord, EmbeddedParent, ParentRef, RecordId,
};
pub use orchestrator::{CategoryOrchestrator, CategorySnapshot, CategoryStore, Mutation};
pub use tree::{
    build_tree, count_nodes, descendant_ids, filter_tree, find_node, flatten_tree, tree_depth,
    CategoryTreeNode, SelectablePolicy, SortOrder, TreeBuilder, TreeOptions, TreeQuery, MAX_DEPTH,
};
