//! CRUD orchestration over a category store.
//!
//! Every mutation is followed by a full reload of the flat list and a fresh
//! tree build; nothing is patched locally.

use super::aggregate::{CategoryDto, CategoryRecord, RecordId};
use super::tree::{CategoryTreeNode, TreeBuilder, TreeOptions};
use crate::shared::error::{CatalogError, TreeError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// The flat record store as seen by the UI.
///
/// `?Send` so browser implementations built on JS futures qualify.
#[async_trait(?Send)]
pub trait CategoryStore {
    async fn list(&self) -> Result<Vec<CategoryRecord>, CatalogError>;

    async fn create(&self, dto: &CategoryDto) -> Result<CategoryRecord, CatalogError>;

    async fn update(&self, id: &RecordId, dto: &CategoryDto)
        -> Result<CategoryRecord, CatalogError>;

    async fn remove(&self, id: &RecordId) -> Result<(), CatalogError>;
}

/// Records and the tree built from them, tagged with the load that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySnapshot {
    pub generation: u64,
    pub records: Vec<CategoryRecord>,
    pub tree: Vec<CategoryTreeNode>,
}

/// Result of a mutating call. The write itself succeeded; the reload that
/// follows it may not have.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    /// The record returned by the store; `None` after a delete
    pub record: Option<CategoryRecord>,
    /// `None` when a newer load started while this one was in flight, or
    /// when the reload failed
    pub snapshot: Option<CategorySnapshot>,
    /// Why the reload after the write failed
    pub reload_error: Option<CatalogError>,
}

pub struct CategoryOrchestrator<S> {
    store: S,
    options: RwLock<TreeOptions>,
    generation: AtomicU64,
}

impl<S: CategoryStore> CategoryOrchestrator<S> {
    pub fn new(store: S, options: TreeOptions) -> Self {
        Self {
            store,
            options: RwLock::new(options),
            generation: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> TreeOptions {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the tree options. Callers rebuild from the records they hold
    /// with [`CategoryOrchestrator::rebuild`]; no reload is needed.
    pub fn set_options(&self, options: TreeOptions) {
        *self.options.write().unwrap_or_else(PoisonError::into_inner) = options;
    }

    pub fn rebuild(&self, records: &[CategoryRecord]) -> Result<Vec<CategoryTreeNode>, TreeError> {
        TreeBuilder::new(self.options()).build(records)
    }

    /// Fetch the full list and build the tree.
    ///
    /// Returns `Ok(None)` when another load started after this one: its
    /// result is stale and must not replace newer data.
    pub async fn load(&self) -> Result<Option<CategorySnapshot>, CatalogError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let records = self.store.list().await?;

        if self.generation.load(Ordering::SeqCst) != generation {
            log::debug!("category load #{generation} superseded, result dropped");
            return Ok(None);
        }

        let tree = self.rebuild(&records)?;
        Ok(Some(CategorySnapshot {
            generation,
            records,
            tree,
        }))
    }

    pub async fn create(&self, dto: CategoryDto) -> Result<Mutation, CatalogError> {
        let dto = dto.normalized();
        dto.validate()?;
        let record = self.store.create(&dto).await?;
        Ok(self.reload_after_write(Some(record)).await)
    }

    pub async fn update(&self, id: &RecordId, dto: CategoryDto) -> Result<Mutation, CatalogError> {
        let dto = dto.normalized();
        dto.validate()?;
        if dto.parent.as_ref() == Some(id) {
            return Err(CatalogError::cyclic(vec![id.clone(), id.clone()]));
        }
        let record = self.store.update(id, &dto).await?;
        Ok(self.reload_after_write(Some(record)).await)
    }

    pub async fn remove(&self, id: &RecordId) -> Result<Mutation, CatalogError> {
        self.store.remove(id).await?;
        Ok(self.reload_after_write(None).await)
    }

    /// Reload after a successful write. A failed reload lands in
    /// `reload_error`; the write still counts as done.
    async fn reload_after_write(&self, record: Option<CategoryRecord>) -> Mutation {
        match self.load().await {
            Ok(snapshot) => Mutation {
                record,
                snapshot,
                reload_error: None,
            },
            Err(e) => {
                log::warn!("category reload after write failed: {}", e);
                Mutation {
                    record,
                    snapshot: None,
                    reload_error: Some(e),
                }
            }
        }
    }
}
