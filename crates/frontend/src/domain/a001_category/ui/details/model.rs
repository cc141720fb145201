use contracts::domain::a001_category::{
    descendant_ids, flatten_tree, CategoryRecord, CategoryTreeNode, RecordId, SelectablePolicy,
    SortOrder, TreeOptions,
};
use contracts::shared::error::CatalogError;

use crate::domain::a001_category::api::HttpCategoryStore;

/// One entry of the parent picker.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentOption {
    pub id: RecordId,
    pub title: String,
    pub depth: usize,
}

impl ParentOption {
    pub fn label(&self) -> String {
        format!("{}{}", "\u{a0}\u{a0}".repeat(self.depth), self.title)
    }
}

/// Every category that may become the parent of `editing`: the whole tree
/// minus `editing` itself and its descendants.
pub fn parent_options(tree: &[CategoryTreeNode], editing: Option<&RecordId>) -> Vec<ParentOption> {
    let excluded = editing
        .map(|id| descendant_ids(tree, id))
        .unwrap_or_default();

    flatten_tree(tree)
        .into_iter()
        .filter(|(_, node)| !excluded.contains(&node.key))
        .map(|(depth, node)| ParentOption {
            id: node.key.clone(),
            title: node.title.clone(),
            depth,
        })
        .collect()
}

/// Picker value back to an id; the empty value means top level.
pub fn resolve_parent(options: &[ParentOption], value: &str) -> Option<RecordId> {
    if value.is_empty() {
        return None;
    }
    options
        .iter()
        .find(|o| o.id.to_string() == value)
        .map(|o| o.id.clone())
}

pub async fn fetch_by_id(
    store: &HttpCategoryStore,
    id: &RecordId,
) -> Result<CategoryRecord, CatalogError> {
    store.get(id).await
}

/// Picker source: every node selectable, names in alphabetical order.
pub async fn fetch_parent_tree(
    store: &HttpCategoryStore,
) -> Result<Vec<CategoryTreeNode>, CatalogError> {
    let options = TreeOptions::new(SelectablePolicy::All).sorted(SortOrder::Alphabetical);
    store.tree(&options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a001_category::build_tree;

    fn sample_tree() -> Vec<CategoryTreeNode> {
        let records = vec![
            CategoryRecord::new(1, "Electronics"),
            CategoryRecord::new(2, "Phones").with_parent(RecordId::Int(1)),
            CategoryRecord::new(3, "Smartphones").with_parent(RecordId::Int(2)),
            CategoryRecord::new(4, "Clothing"),
        ];
        build_tree(&records, TreeOptions::new(SelectablePolicy::All)).unwrap()
    }

    #[test]
    fn test_new_record_may_pick_any_parent() {
        let options = parent_options(&sample_tree(), None);
        let titles: Vec<&str> = options.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, vec!["Electronics", "Phones", "Smartphones", "Clothing"]);
        assert_eq!(options[2].depth, 2);
    }

    #[test]
    fn test_own_subtree_is_excluded() {
        let options = parent_options(&sample_tree(), Some(&RecordId::Int(2)));
        let ids: Vec<RecordId> = options.into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![RecordId::Int(1), RecordId::Int(4)]);
    }

    #[test]
    fn test_resolve_parent() {
        let options = parent_options(&sample_tree(), None);
        assert_eq!(resolve_parent(&options, "3"), Some(RecordId::Int(3)));
        assert_eq!(resolve_parent(&options, ""), None);
        assert_eq!(resolve_parent(&options, "99"), None);
    }

    #[test]
    fn test_label_indents_by_depth() {
        let option = ParentOption {
            id: RecordId::Int(3),
            title: "Smartphones".into(),
            depth: 2,
        };
        assert_eq!(option.label(), "\u{a0}\u{a0}\u{a0}\u{a0}Smartphones");
    }
}
