use super::model::{self, ParentOption};
use crate::domain::a001_category::api::HttpCategoryOrchestrator;
use crate::shared::api_client::spawn_error_report;
use contracts::domain::a001_category::{CategoryDto, CategoryRecord, Mutation, RecordId};
use contracts::shared::error::CatalogError;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::sync::Arc;

/// State and commands of the category details form.
#[derive(Clone, Copy)]
pub struct CategoryDetailsViewModel {
    pub form: RwSignal<CategoryDto>,
    pub record: RwSignal<Option<CategoryRecord>>,
    pub parent_options: RwSignal<Vec<ParentOption>>,
    pub error: RwSignal<Option<CatalogError>>,
    pub busy: RwSignal<bool>,
    editing: StoredValue<Option<RecordId>>,
    orchestrator: StoredValue<Arc<HttpCategoryOrchestrator>>,
}

impl CategoryDetailsViewModel {
    pub fn new(orchestrator: Arc<HttpCategoryOrchestrator>, editing: Option<RecordId>) -> Self {
        Self {
            form: RwSignal::new(CategoryDto::new("")),
            record: RwSignal::new(None),
            parent_options: RwSignal::new(Vec::new()),
            error: RwSignal::new(None),
            busy: RwSignal::new(false),
            editing: StoredValue::new(editing),
            orchestrator: StoredValue::new(orchestrator),
        }
    }

    pub fn editing_id(&self) -> Option<RecordId> {
        self.editing.get_value()
    }

    pub fn is_edit_mode(&self) -> bool {
        self.editing.with_value(Option::is_some)
    }

    pub fn is_form_valid(&self) -> bool {
        self.form.with(|f| f.clone().normalized().validate().is_ok())
    }

    fn fail(&self, error: CatalogError) {
        log::warn!("category details: {}", error);
        let client = self
            .orchestrator
            .with_value(|o| o.store().client().clone());
        spawn_error_report(client, "category_details", error.clone());
        self.error.set(Some(error));
    }

    /// Fetch the record being edited (if any) and the parent picker tree.
    pub fn load(&self) {
        let this = *self;
        let orchestrator = self.orchestrator.get_value();
        let editing = self.editing_id();

        spawn_local(async move {
            this.busy.set(true);
            let store = orchestrator.store();

            if let Some(id) = &editing {
                match model::fetch_by_id(store, id).await {
                    Ok(record) => {
                        this.form.set(record.to_dto());
                        this.record.set(Some(record));
                    }
                    Err(e) => this.fail(e),
                }
            }

            match model::fetch_parent_tree(store).await {
                Ok(tree) => this
                    .parent_options
                    .set(model::parent_options(&tree, editing.as_ref())),
                Err(e) => this.fail(e),
            }
            this.busy.set(false);
        });
    }

    pub fn set_parent_from_picker(&self, value: &str) {
        let parent = self
            .parent_options
            .with_untracked(|options| model::resolve_parent(options, value));
        self.form.update(|f| f.parent = parent);
    }

    pub fn save(&self, on_saved: Callback<Mutation>) {
        let this = *self;
        let orchestrator = self.orchestrator.get_value();
        let editing = self.editing_id();
        let dto = self.form.get_untracked();

        this.error.set(None);
        this.busy.set(true);
        spawn_local(async move {
            let result = match &editing {
                Some(id) => orchestrator.update(id, dto).await,
                None => orchestrator.create(dto).await,
            };
            this.busy.set(false);
            match result {
                Ok(mutation) => on_saved.run(mutation),
                Err(e) => this.fail(e),
            }
        });
    }

    pub fn delete(&self, on_deleted: Callback<Mutation>) {
        let Some(id) = self.editing_id() else {
            return;
        };
        let this = *self;
        let orchestrator = self.orchestrator.get_value();

        this.error.set(None);
        this.busy.set(true);
        spawn_local(async move {
            let result = orchestrator.remove(&id).await;
            this.busy.set(false);
            match result {
                Ok(mutation) => on_deleted.run(mutation),
                Err(e) => this.fail(e),
            }
        });
    }
}
