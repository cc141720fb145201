use super::view_model::CategoryDetailsViewModel;
use crate::domain::a001_category::api::HttpCategoryOrchestrator;
use crate::shared::error_banner::ErrorBanner;
use crate::shared::icons::icon;
use contracts::domain::a001_category::{CategoryRecord, Mutation, RecordId};
use contracts::domain::common::AggregateRoot;
use leptos::prelude::*;
use std::sync::Arc;

#[component]
pub fn CategoryDetails(
    orchestrator: Arc<HttpCategoryOrchestrator>,
    /// `None` opens an empty form for a new category
    id: Option<RecordId>,
    /// Prefills the parent of a new category
    initial_parent: Option<RecordId>,
    on_saved: Callback<Mutation>,
    on_cancel: Callback<()>,
) -> impl IntoView {
    let vm = CategoryDetailsViewModel::new(orchestrator, id);
    if !vm.is_edit_mode() {
        vm.form.update(|f| f.parent = initial_parent);
    }
    vm.load();

    let element = CategoryRecord::element_name().to_lowercase();
    let title = if vm.is_edit_mode() {
        format!("Edit {}", element)
    } else {
        format!("New {}", element)
    };

    let parent_value = move || {
        vm.form
            .with(|f| f.parent.as_ref().map(ToString::to_string))
            .unwrap_or_default()
    };

    let confirm_delete = move |_| {
        let name = vm.form.with_untracked(|f| f.name.clone());
        let confirmed = window()
            .confirm_with_message(&format!("Delete category '{}'?", name))
            .unwrap_or(false);
        if confirmed {
            vm.delete(on_saved);
        }
    };

    view! {
        <div class="details-container category-details">
            <div class="modal-header">
                <h3 class="modal-title">{title}</h3>
                <div class="modal-header-actions">
                    <Show when=move || vm.is_edit_mode()>
                        <button
                            class="button button--danger"
                            on:click=confirm_delete
                            disabled=move || vm.busy.get()
                        >
                            {icon("trash")}
                            {"Delete"}
                        </button>
                    </Show>
                    <button
                        class="button button--primary"
                        on:click=move |_| vm.save(on_saved)
                        disabled=move || !vm.is_form_valid() || vm.busy.get()
                    >
                        {icon("save")}
                        {"Save"}
                    </button>
                    <button class="button button--secondary" on:click=move |_| on_cancel.run(())>
                        {icon("x")}
                        {"Close"}
                    </button>
                </div>
            </div>

            <div class="modal-body">
                <ErrorBanner
                    error=vm.error
                    on_dismiss=Callback::new(move |_| vm.error.set(None))
                />

                <div class="form__group">
                    <label class="form__label" for="category-name">{"Name"}</label>
                    <input
                        id="category-name"
                        class="form__input"
                        type="text"
                        maxlength="255"
                        prop:value=move || vm.form.with(|f| f.name.clone())
                        on:input=move |ev| {
                            let value = event_target_value(&ev);
                            vm.form.update(|f| f.name = value);
                        }
                    />
                </div>

                <div class="form__group">
                    <label class="form__label" for="category-parent">{"Parent"}</label>
                    <select
                        id="category-parent"
                        class="form__select"
                        prop:value=parent_value
                        on:change=move |ev| vm.set_parent_from_picker(&event_target_value(&ev))
                    >
                        <option value="">{"(top level)"}</option>
                        <For
                            each=move || vm.parent_options.get()
                            key=|option| option.id.clone()
                            children=move |option| {
                                let value = option.id.to_string();
                                let selected_value = value.clone();
                                view! {
                                    <option
                                        value=value
                                        selected=move || parent_value() == selected_value
                                    >
                                        {option.label()}
                                    </option>
                                }
                            }
                        />
                    </select>
                </div>

                <div class="form__group">
                    <label class="form__label" for="category-description">{"Description"}</label>
                    <textarea
                        id="category-description"
                        class="form__textarea"
                        rows="4"
                        prop:value=move || vm.form.with(|f| f.description.clone().unwrap_or_default())
                        on:input=move |ev| {
                            let value = event_target_value(&ev);
                            vm.form.update(|f| f.description = Some(value));
                        }
                    />
                </div>

                {move || vm.record.get().and_then(|r| r.metadata).map(|m| view! {
                    <div class="details-meta">
                        {format!(
                            "Version {} · updated {}",
                            m.version,
                            m.updated_at.format("%Y-%m-%d %H:%M"),
                        )}
                    </div>
                })}
            </div>
        </div>
    }
}
