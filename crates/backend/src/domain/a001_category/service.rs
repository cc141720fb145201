use super::repository::{self, CategoryFields, Model};
use crate::shared::error::ApiError;
use crate::shared::logger;
use crate::shared::state::AppState;
use contracts::domain::a001_category::{
    tree_depth, CategoryDto, CategoryRecord, CategoryTreeNode, EmbeddedParent, ParentRef,
    RecordId, TreeBuilder, TreeOptions, MAX_DEPTH,
};
use contracts::shared::error::CatalogError;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::collections::{HashMap, HashSet};

/// Ids issued by this store are integers; string ids must still parse as one.
pub fn parse_id(id: &RecordId) -> Result<i64, ApiError> {
    match id {
        RecordId::Int(v) => Ok(*v),
        RecordId::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ApiError::validation(format!("invalid category id '{}'", s))),
    }
}

pub async fn list(conn: &DatabaseConnection, expand_parent: bool) -> Result<Vec<CategoryRecord>, ApiError> {
    let mut records: Vec<CategoryRecord> = repository::list_all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    if expand_parent {
        embed_parents(&mut records);
    }
    Ok(records)
}

/// Replace bare parent ids with `{id, name}` objects, the way stores that
/// expand relations return them. Unknown parents keep the bare id.
fn embed_parents(records: &mut [CategoryRecord]) {
    let names: HashMap<RecordId, String> = records
        .iter()
        .map(|r| (r.id.clone(), r.name.clone()))
        .collect();
    for record in records.iter_mut() {
        if let Some(ParentRef::Id(parent_id)) = &record.parent {
            if let Some(name) = names.get(parent_id) {
                record.parent = Some(ParentRef::Embedded(EmbeddedParent {
                    id: parent_id.clone(),
                    name: Some(name.clone()),
                }));
            }
        }
    }
}

pub async fn get_by_id(conn: &DatabaseConnection, id: i64) -> Result<CategoryRecord, ApiError> {
    Ok(find_live(conn, id).await?.into())
}

async fn find_live<C: ConnectionTrait>(conn: &C, id: i64) -> Result<Model, ApiError> {
    repository::get_by_id(conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("category {}", id)))
}

// Hierarchy writes run under `state.writes` inside one transaction: the row
// is written first, then the resulting parent map is checked, and any
// failure rolls the write back when the transaction is dropped.

pub async fn create(state: &AppState, dto: CategoryDto) -> Result<CategoryRecord, ApiError> {
    let dto = dto.normalized();
    dto.validate()?;
    let parent = dto.parent.as_ref().map(parse_id).transpose()?;

    let _writes = state.writes.lock().await;
    let txn = state.db.begin().await?;
    let parent_id = resolve_parent(&txn, parent).await?;
    let id = repository::insert(
        &txn,
        CategoryFields {
            name: dto.name.clone(),
            description: dto.description,
            parent_id,
        },
    )
    .await?;
    check_hierarchy(&txn, id).await?;
    txn.commit().await?;

    tracing::info!("Category #{} '{}' created", id, dto.name);
    logger::log(&state.db, "category", &format!("created #{} '{}'", id, dto.name));
    get_by_id(&state.db, id).await
}

pub async fn update(state: &AppState, id: i64, dto: CategoryDto) -> Result<CategoryRecord, ApiError> {
    let dto = dto.normalized();
    dto.validate()?;
    let parent = dto.parent.as_ref().map(parse_id).transpose()?;

    let _writes = state.writes.lock().await;
    let txn = state.db.begin().await?;
    let existing = find_live(&txn, id).await?;
    let parent_id = resolve_parent(&txn, parent).await?;

    let name = dto.name.clone();
    let updated = repository::update(
        &txn,
        existing,
        CategoryFields {
            name: dto.name,
            description: dto.description,
            parent_id,
        },
    )
    .await?;
    check_hierarchy(&txn, id).await?;
    txn.commit().await?;

    tracing::info!("Category #{} '{}' updated (v{})", id, name, updated.version);
    logger::log(&state.db, "category", &format!("updated #{} '{}'", id, name));
    Ok(updated.into())
}

/// Soft delete. Categories that still have live children are kept, so no
/// record is silently turned into an orphan.
pub async fn delete(state: &AppState, id: i64) -> Result<(), ApiError> {
    let _writes = state.writes.lock().await;
    let txn = state.db.begin().await?;
    let existing = find_live(&txn, id).await?;

    let children = repository::count_children(&txn, id).await?;
    if children > 0 {
        return Err(ApiError::validation(format!(
            "category {} still has {} subcategories",
            id, children
        )));
    }

    repository::soft_delete(&txn, existing).await?;
    txn.commit().await?;

    tracing::info!("Category #{} deleted", id);
    logger::log(&state.db, "category", &format!("deleted #{}", id));
    Ok(())
}

pub async fn tree(
    conn: &DatabaseConnection,
    options: TreeOptions,
) -> Result<Vec<CategoryTreeNode>, ApiError> {
    let records = list(conn, false).await?;
    let forest = TreeBuilder::new(options)
        .build(&records)
        .map_err(CatalogError::from)?;

    // Rows written before the depth limit existed
    let depth = tree_depth(&forest);
    if depth > MAX_DEPTH {
        return Err(ApiError::validation(format!(
            "hierarchy is {} levels deep, at most {} can be served",
            depth, MAX_DEPTH
        )));
    }
    Ok(forest)
}

/// Parent must be a live category of this store.
async fn resolve_parent<C: ConnectionTrait>(
    conn: &C,
    parent: Option<i64>,
) -> Result<Option<i64>, ApiError> {
    let Some(parent_id) = parent else {
        return Ok(None);
    };
    if repository::get_by_id(conn, parent_id).await?.is_none() {
        return Err(ApiError::validation(format!(
            "parent category {} does not exist",
            parent_id
        )));
    }
    Ok(Some(parent_id))
}

/// After writing `id`: it must not be its own ancestor and its subtree must
/// stay within [`MAX_DEPTH`] levels.
async fn check_hierarchy<C: ConnectionTrait>(conn: &C, id: i64) -> Result<(), ApiError> {
    let parents: HashMap<i64, Option<i64>> = repository::list_all(conn)
        .await?
        .into_iter()
        .map(|m| (m.id, m.parent_id))
        .collect();

    if let Some(&Some(parent)) = parents.get(&id) {
        if let Some(chain) = ancestor_chain(&parents, id, parent) {
            let path = chain.into_iter().map(RecordId::Int).collect();
            return Err(CatalogError::cyclic(path).into());
        }
    }

    let depth = level_of(&parents, id) + subtree_height(&parents, id) - 1;
    if depth > MAX_DEPTH {
        return Err(ApiError::validation(format!(
            "hierarchy would be {} levels deep, the limit is {}",
            depth, MAX_DEPTH
        )));
    }
    Ok(())
}

/// Walks up from `new_parent`. Returns the would-be cycle
/// `[id, new_parent, ..., id]` if `id` is reached.
fn ancestor_chain(parents: &HashMap<i64, Option<i64>>, id: i64, new_parent: i64) -> Option<Vec<i64>> {
    let mut chain = vec![id];
    let mut seen = HashSet::new();
    let mut current = Some(new_parent);

    while let Some(node) = current {
        chain.push(node);
        if node == id {
            return Some(chain);
        }
        // Pre-existing loop that does not involve `id`
        if !seen.insert(node) {
            return None;
        }
        current = parents.get(&node).copied().flatten();
    }
    None
}

/// 1 for a root. Parents missing from the map end the walk.
fn level_of(parents: &HashMap<i64, Option<i64>>, id: i64) -> usize {
    let mut seen = HashSet::new();
    let mut current = Some(id);
    while let Some(node) = current {
        if !parents.contains_key(&node) || !seen.insert(node) {
            break;
        }
        current = parents.get(&node).copied().flatten();
    }
    seen.len()
}

/// Levels from `id` down to its deepest descendant, `id` included.
fn subtree_height(parents: &HashMap<i64, Option<i64>>, id: i64) -> usize {
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for (&child, parent) in parents {
        if let Some(parent) = parent {
            children.entry(*parent).or_default().push(child);
        }
    }

    let mut seen = HashSet::from([id]);
    let mut level = vec![id];
    let mut height = 0;
    while !level.is_empty() {
        height += 1;
        level = level
            .iter()
            .filter_map(|node| children.get(node))
            .flatten()
            .copied()
            .filter(|child| seen.insert(*child))
            .collect();
    }
    height
}

/// Sample hierarchy for an empty store.
pub async fn insert_test_data(state: &AppState) -> Result<usize, ApiError> {
    let data: [(&str, &str, Option<&str>); 10] = [
        ("Electronics", "Devices and gadgets", None),
        ("Phones", "Mobile phones", Some("Electronics")),
        ("Smartphones", "Touchscreen phones", Some("Phones")),
        ("Laptops", "Portable computers", Some("Electronics")),
        ("Clothing", "Apparel", None),
        ("Men", "Men's clothing", Some("Clothing")),
        ("Women", "Women's clothing", Some("Clothing")),
        ("Dresses", "Evening and casual dresses", Some("Women")),
        ("Home & Garden", "Furniture and tools", None),
        ("Garden tools", "Shovels, rakes and hoses", Some("Home & Garden")),
    ];

    let _writes = state.writes.lock().await;
    let txn = state.db.begin().await?;
    let mut ids: HashMap<&str, i64> = HashMap::new();
    for (name, description, parent) in data {
        let parent_id = match parent {
            Some(p) => Some(
                *ids.get(p)
                    .ok_or_else(|| anyhow::anyhow!("sample parent '{}' missing", p))?,
            ),
            None => None,
        };
        let id = repository::insert(
            &txn,
            CategoryFields {
                name: name.to_string(),
                description: Some(description.to_string()),
                parent_id,
            },
        )
        .await?;
        ids.insert(name, id);
    }
    txn.commit().await?;

    tracing::info!("Inserted {} sample categories", ids.len());
    Ok(ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::AuthConfig;
    use crate::shared::data::db::connect_in_memory;
    use contracts::domain::a001_category::{count_nodes, SelectablePolicy};
    use contracts::shared::error::ErrorKind;

    async fn test_state() -> AppState {
        let db = connect_in_memory().await.unwrap();
        AppState::with_auth(db, AuthConfig::default())
    }

    fn kind(err: &ApiError) -> Option<ErrorKind> {
        match err {
            ApiError::Catalog(e) => Some(e.kind()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let state = test_state().await;
        let conn = state.db.clone();
        let root = create(&state, CategoryDto::new("  Shoes ")).await.unwrap();
        let child = create(&state, CategoryDto::new("Boots").with_parent(root.id.clone()))
            .await
            .unwrap();

        assert_eq!(root.name, "Shoes");
        assert_eq!(child.parent_id(), Some(&root.id));
        let fetched = get_by_id(&conn, parse_id(&child.id).unwrap()).await.unwrap();
        assert_eq!(fetched.name, "Boots");
        assert_eq!(fetched.metadata.unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_create_requires_existing_parent() {
        let state = test_state().await;
        let err = create(&state, CategoryDto::new("Orphan").with_parent(999))
            .await
            .unwrap_err();
        assert_eq!(kind(&err), Some(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let state = test_state().await;
        let err = create(&state, CategoryDto::new(" ")).await.unwrap_err();
        assert_eq!(kind(&err), Some(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn test_update_cannot_create_cycle() {
        let state = test_state().await;
        let a = create(&state, CategoryDto::new("A")).await.unwrap();
        let b = create(&state, CategoryDto::new("B").with_parent(a.id.clone()))
            .await
            .unwrap();
        let c = create(&state, CategoryDto::new("C").with_parent(b.id.clone()))
            .await
            .unwrap();

        let a_id = parse_id(&a.id).unwrap();
        let err = update(&state, a_id, CategoryDto::new("A").with_parent(c.id.clone()))
            .await
            .unwrap_err();
        match err {
            ApiError::Catalog(CatalogError::Tree(e)) => {
                assert_eq!(e.to_string(), "cyclic hierarchy: 1 -> 3 -> 2 -> 1");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let self_parent = update(&state, a_id, CategoryDto::new("A").with_parent(a.id.clone()))
            .await
            .unwrap_err();
        assert_eq!(kind(&self_parent), Some(ErrorKind::CyclicHierarchy));
    }

    #[tokio::test]
    async fn test_update_moves_and_bumps_version() {
        let state = test_state().await;
        let a = create(&state, CategoryDto::new("A")).await.unwrap();
        let b = create(&state, CategoryDto::new("B").with_parent(a.id.clone()))
            .await
            .unwrap();

        let moved = update(&state, parse_id(&b.id).unwrap(), CategoryDto::new("B2"))
            .await
            .unwrap();
        assert_eq!(moved.name, "B2");
        assert_eq!(moved.parent, None);
        assert_eq!(moved.metadata.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let state = test_state().await;
        let err = update(&state, 77, CategoryDto::new("X")).await.unwrap_err();
        assert_eq!(kind(&err), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let state = test_state().await;
        let conn = state.db.clone();
        let a = create(&state, CategoryDto::new("A")).await.unwrap();
        let b = create(&state, CategoryDto::new("B").with_parent(a.id.clone()))
            .await
            .unwrap();
        let a_id = parse_id(&a.id).unwrap();
        let b_id = parse_id(&b.id).unwrap();

        let err = delete(&state, a_id).await.unwrap_err();
        assert_eq!(kind(&err), Some(ErrorKind::Validation));

        delete(&state, b_id).await.unwrap();
        delete(&state, a_id).await.unwrap();
        assert!(list(&conn, false).await.unwrap().is_empty());

        let again = delete(&state, a_id).await.unwrap_err();
        assert_eq!(kind(&again), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_list_expands_parent() {
        let state = test_state().await;
        let conn = state.db.clone();
        let a = create(&state, CategoryDto::new("A")).await.unwrap();
        create(&state, CategoryDto::new("B").with_parent(a.id.clone()))
            .await
            .unwrap();

        let plain = list(&conn, false).await.unwrap();
        assert_eq!(plain[1].parent, Some(ParentRef::Id(a.id.clone())));

        let expanded = list(&conn, true).await.unwrap();
        assert_eq!(
            expanded[1].parent,
            Some(ParentRef::Embedded(EmbeddedParent {
                id: a.id.clone(),
                name: Some("A".into()),
            }))
        );
    }

    #[tokio::test]
    async fn test_tree_over_sample_data() {
        let state = test_state().await;
        let conn = state.db.clone();
        let inserted = insert_test_data(&state).await.unwrap();

        let forest = tree(&conn, TreeOptions::new(SelectablePolicy::LeafOnly))
            .await
            .unwrap();

        assert_eq!(count_nodes(&forest), inserted);
        let titles: Vec<&str> = forest.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Electronics", "Clothing", "Home & Garden"]);
        assert!(!forest[0].selectable);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_moves_cannot_form_cycle() {
        for _ in 0..20 {
            let state = test_state().await;
            let a = create(&state, CategoryDto::new("A")).await.unwrap();
            let b = create(&state, CategoryDto::new("B")).await.unwrap();
            let a_id = parse_id(&a.id).unwrap();
            let b_id = parse_id(&b.id).unwrap();

            let a_under_b = tokio::spawn({
                let state = state.clone();
                let parent = b.id.clone();
                async move { update(&state, a_id, CategoryDto::new("A").with_parent(parent)).await }
            });
            let b_under_a = tokio::spawn({
                let state = state.clone();
                let parent = a.id.clone();
                async move { update(&state, b_id, CategoryDto::new("B").with_parent(parent)).await }
            });
            let results = [a_under_b.await.unwrap(), b_under_a.await.unwrap()];

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            let rejected = results.iter().find_map(|r| r.as_ref().err()).unwrap();
            assert_eq!(kind(rejected), Some(ErrorKind::CyclicHierarchy));
            let forest = tree(&state.db, TreeOptions::new(SelectablePolicy::All))
                .await
                .unwrap();
            assert_eq!(count_nodes(&forest), 2);
        }
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let state = test_state().await;
        let mut chain: Vec<RecordId> = Vec::new();
        for level in 0..MAX_DEPTH {
            let mut dto = CategoryDto::new(format!("Level {}", level + 1));
            dto.parent = chain.last().cloned();
            chain.push(create(&state, dto).await.unwrap().id);
        }

        let deepest = chain[MAX_DEPTH - 1].clone();
        let err = create(&state, CategoryDto::new("Too deep").with_parent(deepest))
            .await
            .unwrap_err();
        assert_eq!(kind(&err), Some(ErrorKind::Validation));

        // A two-level branch moved under the second deepest level overflows too
        let top = create(&state, CategoryDto::new("Top")).await.unwrap();
        create(&state, CategoryDto::new("Below").with_parent(top.id.clone()))
            .await
            .unwrap();
        let err = update(
            &state,
            parse_id(&top.id).unwrap(),
            CategoryDto::new("Top").with_parent(chain[MAX_DEPTH - 2].clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(kind(&err), Some(ErrorKind::Validation));

        // Rejected writes were rolled back
        let records = list(&state.db, false).await.unwrap();
        assert_eq!(records.len(), MAX_DEPTH + 2);
        let top_now = get_by_id(&state.db, parse_id(&top.id).unwrap()).await.unwrap();
        assert_eq!(top_now.parent, None);
        assert_eq!(top_now.metadata.unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_rejected_cycle_is_rolled_back() {
        let state = test_state().await;
        let a = create(&state, CategoryDto::new("A")).await.unwrap();
        let b = create(&state, CategoryDto::new("B").with_parent(a.id.clone()))
            .await
            .unwrap();

        update(&state, parse_id(&a.id).unwrap(), CategoryDto::new("A2").with_parent(b.id.clone()))
            .await
            .unwrap_err();

        let a_now = get_by_id(&state.db, parse_id(&a.id).unwrap()).await.unwrap();
        assert_eq!(a_now.name, "A");
        assert_eq!(a_now.parent, None);
    }

    #[test]
    fn test_levels_and_heights() {
        let parents = HashMap::from([(1, None), (2, Some(1)), (3, Some(2)), (4, Some(1)), (5, Some(99))]);
        assert_eq!(level_of(&parents, 1), 1);
        assert_eq!(level_of(&parents, 3), 3);
        // Unknown parent ends the walk
        assert_eq!(level_of(&parents, 5), 1);
        assert_eq!(subtree_height(&parents, 1), 3);
        assert_eq!(subtree_height(&parents, 3), 1);
    }

    #[test]
    fn test_ancestor_chain() {
        let parents = HashMap::from([(1, None), (2, Some(1)), (3, Some(2)), (4, Some(4))]);
        assert_eq!(ancestor_chain(&parents, 1, 3), Some(vec![1, 3, 2, 1]));
        assert_eq!(ancestor_chain(&parents, 3, 1), None);
        // Existing self-loop elsewhere terminates
        assert_eq!(ancestor_chain(&parents, 1, 4), None);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(&RecordId::Int(3)).unwrap(), 3);
        assert_eq!(parse_id(&RecordId::Str(" 12 ".into())).unwrap(), 12);
        assert!(parse_id(&RecordId::Str("abc".into())).is_err());
    }
}
