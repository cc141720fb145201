use super::super::details::CategoryDetails;
use crate::domain::a001_category::api::{HttpCategoryOrchestrator, HttpCategoryStore};
use crate::shared::api_client::{spawn_error_report, ApiClient};
use crate::shared::error_banner::ErrorBanner;
use crate::shared::icons::icon;
use crate::shared::modal_stack::ModalStackService;
use contracts::domain::a001_category::{
    count_nodes, filter_tree, flatten_tree, CategoryRecord, CategorySnapshot, CategoryTreeNode,
    Mutation, RecordId, SelectablePolicy, SortOrder, TreeOptions,
};
use contracts::domain::common::AggregateRoot;
use contracts::shared::error::CatalogError;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::collections::HashSet;
use std::sync::Arc;

const POLICIES: [(SelectablePolicy, &str); 3] = [
    (SelectablePolicy::LeafOnly, "Leaves only"),
    (SelectablePolicy::ParentOnly, "Parents only"),
    (SelectablePolicy::All, "Any category"),
];

/// Splits `text` into runs, flagging the case-insensitive matches of `query`.
pub fn match_segments<'a>(text: &'a str, query: &str) -> Vec<(&'a str, bool)> {
    let query = query.trim().to_lowercase();
    let lower = text.to_lowercase();
    // Offsets are only comparable when lowercasing kept the byte layout
    if query.is_empty() || lower.len() != text.len() {
        return vec![(text, false)];
    }

    let mut segments = Vec::new();
    let mut last = 0;
    while let Some(found) = lower[last..].find(&query) {
        let start = last + found;
        let end = start + query.len();
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            break;
        }
        if start > last {
            segments.push((&text[last..start], false));
        }
        segments.push((&text[start..end], true));
        last = end;
    }
    if last < text.len() {
        segments.push((&text[last..], false));
    }
    segments
}

fn highlight_matches(text: &str, query: &str) -> AnyView {
    match_segments(text, query)
        .into_iter()
        .map(|(part, hit)| {
            let part = part.to_string();
            if hit {
                view! { <mark class="tree-match">{part}</mark> }.into_any()
            } else {
                view! { <span>{part}</span> }.into_any()
            }
        })
        .collect_view()
        .into_any()
}

/// Ids of every node that has children.
fn expandable_ids(nodes: &[CategoryTreeNode]) -> HashSet<RecordId> {
    flatten_tree(nodes)
        .into_iter()
        .filter(|(_, node)| !node.is_leaf())
        .map(|(_, node)| node.key.clone())
        .collect()
}

/// Keep only checked ids that are still present and selectable.
fn retain_selectable(checked: &HashSet<RecordId>, nodes: &[CategoryTreeNode]) -> HashSet<RecordId> {
    flatten_tree(nodes)
        .into_iter()
        .filter(|(_, node)| node.selectable && checked.contains(&node.key))
        .map(|(_, node)| node.key.clone())
        .collect()
}

/// Callbacks and view state shared by every row.
#[derive(Clone, Copy)]
struct RowContext {
    expanded: RwSignal<HashSet<RecordId>>,
    checked: RwSignal<HashSet<RecordId>>,
    on_open: Callback<RecordId>,
    on_add_child: Callback<RecordId>,
}

/// Visible rows in display order. Children of collapsed nodes are skipped.
fn render_rows(
    nodes: &[CategoryTreeNode],
    ctx: RowContext,
    expanded_ids: &HashSet<RecordId>,
    checked_ids: &HashSet<RecordId>,
    filter: &str,
) -> Vec<AnyView> {
    // While filtering every surviving branch is shown open
    let show_all = !filter.trim().is_empty();
    let mut rows = Vec::new();
    let mut pending: Vec<(usize, &CategoryTreeNode)> = nodes.iter().rev().map(|n| (0, n)).collect();
    while let Some((level, node)) = pending.pop() {
        let is_expanded = !node.is_leaf() && (show_all || expanded_ids.contains(&node.key));
        rows.push(render_row(node, level, is_expanded, ctx, checked_ids, filter));
        if is_expanded {
            pending.extend(node.children.iter().rev().map(|c| (level + 1, c)));
        }
    }
    rows
}

fn render_row(
    node: &CategoryTreeNode,
    level: usize,
    is_expanded: bool,
    ctx: RowContext,
    checked_ids: &HashSet<RecordId>,
    filter: &str,
) -> AnyView {
    let key = node.key.clone();
    let has_children = !node.is_leaf();

    let toggle = if has_children {
        let key = key.clone();
        view! {
            <button
                class="tree-toggle"
                on:click=move |_| {
                    ctx.expanded.update(|set| {
                        if !set.remove(&key) {
                            set.insert(key.clone());
                        }
                    })
                }
            >
                {icon(if is_expanded { "chevron-down" } else { "chevron-right" })}
            </button>
        }
        .into_any()
    } else {
        view! { <span class="tree-toggle-placeholder"></span> }.into_any()
    };

    let node_icon = match (has_children, is_expanded) {
        (true, true) => view! { <span class="tree-icon tree-icon--folder">{icon("folder-open")}</span> }.into_any(),
        (true, false) => view! { <span class="tree-icon tree-icon--folder">{icon("folder-closed")}</span> }.into_any(),
        _ => view! { <span class="tree-icon">{icon("item")}</span> }.into_any(),
    };

    let selectable = node.selectable;
    let is_checked = checked_ids.contains(&key);
    let on_check = {
        let key = key.clone();
        move |_| {
            ctx.checked.update(|set| {
                if !set.remove(&key) {
                    set.insert(key.clone());
                }
            })
        }
    };
    let open = {
        let key = key.clone();
        move |_| ctx.on_open.run(key.clone())
    };
    let add_child = {
        let key = key.clone();
        move |_| ctx.on_add_child.run(key.clone())
    };

    view! {
        <tr class="tree-row" class:tree-row--disabled={!selectable}>
            <td class="text-center p-0-8" style="width: 40px;">
                <input
                    type="checkbox"
                    prop:checked=is_checked
                    disabled={!selectable}
                    title={if selectable { "" } else { "Not selectable under the current rule" }}
                    on:change=on_check
                />
            </td>
            <td class="cell-truncate p-0-8">
                <div class="tree-cell" style={format!("padding-left: {}px;", level * 16)}>
                    {toggle}
                    {node_icon}
                    <span class="tree-label" on:click=open>
                        {highlight_matches(&node.title, filter)}
                    </span>
                </div>
            </td>
            <td class="text-right p-0-8" style="width: 48px;">
                <button class="button button--ghost" title="Add subcategory" on:click=add_child>
                    {icon("plus")}
                </button>
            </td>
        </tr>
    }
    .into_any()
}

/// Category hierarchy page: search, expand/collapse, selection rule and
/// ordering switches, and the details modal for create/edit/delete.
#[component]
pub fn CategoryTree(
    client: ApiClient,
    #[prop(optional)] on_sign_out: Option<Callback<()>>,
) -> impl IntoView {
    let modal_stack = expect_context::<ModalStackService>();

    let initial_options = TreeOptions::new(SelectablePolicy::LeafOnly);
    let orchestrator = StoredValue::new(Arc::new(HttpCategoryOrchestrator::new(
        HttpCategoryStore::new(client.clone()),
        initial_options.clone(),
    )));
    let client = StoredValue::new(client);

    let records = RwSignal::new(Vec::<CategoryRecord>::new());
    let roots = RwSignal::new(Vec::<CategoryTreeNode>::new());
    let error = RwSignal::new(None::<CatalogError>);
    let is_loading = RwSignal::new(false);
    let filter_text = RwSignal::new(String::new());
    let options = RwSignal::new(initial_options);
    let expanded = RwSignal::new(HashSet::<RecordId>::new());
    let checked = RwSignal::new(HashSet::<RecordId>::new());

    let show_error = move |e: CatalogError| {
        log::warn!("category tree: {}", e);
        spawn_error_report(client.get_value(), "category_tree", e.clone());
        error.set(Some(e));
    };

    let apply_snapshot = move |snapshot: CategorySnapshot| {
        log::debug!(
            "category snapshot #{}: {} records",
            snapshot.generation,
            snapshot.records.len()
        );
        checked.update(|set| *set = retain_selectable(set, &snapshot.tree));
        records.set(snapshot.records);
        roots.set(snapshot.tree);
        error.set(None);
    };

    let load = move || {
        let orch = orchestrator.get_value();
        is_loading.set(true);
        spawn_local(async move {
            match orch.load().await {
                Ok(Some(snapshot)) => apply_snapshot(snapshot),
                // A newer load is in flight and will publish its own result
                Ok(None) => return,
                Err(e) => show_error(e),
            }
            is_loading.set(false);
        });
    };

    // Options change: rebuild from the records already held, no request
    let change_options = move |next: TreeOptions| {
        let orch = orchestrator.get_value();
        orch.set_options(next.clone());
        options.set(next);
        match orch.rebuild(&records.get_untracked()) {
            Ok(tree) => {
                checked.update(|set| *set = retain_selectable(set, &tree));
                roots.set(tree);
            }
            Err(e) => show_error(e.into()),
        }
    };

    let on_mutation = Callback::new(move |mutation: Mutation| {
        if let Some(record) = &mutation.record {
            log::info!("category #{} '{}' saved", record.id, record.name);
        }
        if let Some(snapshot) = mutation.snapshot {
            apply_snapshot(snapshot);
        }
        if let Some(e) = mutation.reload_error {
            show_error(e);
        }
    });

    let open_details = move |id: Option<RecordId>, initial_parent: Option<RecordId>| {
        let orch = orchestrator.get_value();
        modal_stack.push_with_frame(
            Some("max-width: min(640px, 95vw); width: min(640px, 95vw);".to_string()),
            Some("category-modal".to_string()),
            move |handle| {
                view! {
                    <CategoryDetails
                        orchestrator=orch.clone()
                        id=id.clone()
                        initial_parent=initial_parent.clone()
                        on_saved=Callback::new(move |mutation: Mutation| {
                            handle.close();
                            on_mutation.run(mutation);
                        })
                        on_cancel=Callback::new(move |_| handle.close())
                    />
                }
                .into_any()
            },
        );
    };

    let insert_sample_data = move |_| {
        let client = client.get_value();
        spawn_local(async move {
            let result: Result<serde_json::Value, CatalogError> = client
                .post_json("/api/products/categories/testdata", &serde_json::json!({}))
                .await;
            match result {
                Ok(_) => load(),
                Err(e) => show_error(e),
            }
        });
    };

    let row_context = RowContext {
        expanded,
        checked,
        on_open: Callback::new(move |id: RecordId| open_details(Some(id), None)),
        on_add_child: Callback::new(move |parent: RecordId| open_details(None, Some(parent))),
    };

    let visible_roots = Memo::new(move |_| {
        let query = filter_text.get();
        roots.with(|nodes| filter_tree(nodes, &query))
    });

    load();

    view! {
        <div class="content">
            <div class="page__header">
                <div class="page__header-left">
                    {icon("products")}
                    <h2 class="page__title">{CategoryRecord::list_name()}</h2>
                </div>
                <div class="page__header-right">
                    <button class="button button--primary" on:click=move |_| open_details(None, None)>
                        {icon("plus")}
                        {"New"}
                    </button>
                    <button class="button button--secondary" on:click=move |_| load() disabled=move || is_loading.get()>
                        {icon("refresh")}
                        {"Reload"}
                    </button>
                    {on_sign_out.map(|cb| view! {
                        <button class="button button--secondary" on:click=move |_| cb.run(())>
                            {"Sign out"}
                        </button>
                    })}
                </div>
            </div>

            <ErrorBanner error=error on_dismiss=Callback::new(move |_| error.set(None)) />

            <div class="tree-toolbar">
                <div class="tree-search">
                    <input
                        type="text"
                        placeholder="Search categories..."
                        prop:value=move || filter_text.get()
                        on:input=move |ev| filter_text.set(event_target_value(&ev))
                    />
                    <Show when=move || !filter_text.get().is_empty()>
                        <button class="tree-search__clear" title="Clear" on:click=move |_| filter_text.set(String::new())>
                            {icon("x")}
                        </button>
                    </Show>
                </div>

                <label class="tree-toolbar__field">
                    {"Selectable: "}
                    <select on:change=move |ev| {
                        if let Some(policy) = SelectablePolicy::parse(&event_target_value(&ev)) {
                            change_options(TreeOptions { policy, ..options.get_untracked() });
                        }
                    }>
                        {POLICIES
                            .iter()
                            .map(|(policy, label)| {
                                let policy = *policy;
                                view! {
                                    <option
                                        value=policy.as_str()
                                        selected=move || options.with(|o| o.policy == policy)
                                    >
                                        {*label}
                                    </option>
                                }
                            })
                            .collect_view()}
                    </select>
                </label>

                <label class="tree-toolbar__field">
                    <input
                        type="checkbox"
                        prop:checked=move || options.with(|o| o.sort == SortOrder::Alphabetical)
                        on:change=move |ev| {
                            let sort = if event_target_checked(&ev) {
                                SortOrder::Alphabetical
                            } else {
                                SortOrder::FirstSeen
                            };
                            change_options(TreeOptions { sort, ..options.get_untracked() });
                        }
                    />
                    {" Sort A–Z"}
                </label>

                <button class="button button--ghost" on:click=move |_| expanded.set(roots.with(|r| expandable_ids(r)))>
                    {"Expand all"}
                </button>
                <button class="button button--ghost" on:click=move |_| expanded.set(HashSet::new())>
                    {"Collapse all"}
                </button>
            </div>

            <div class="tree-summary">
                {move || format!(
                    "{} categories · {} selected",
                    roots.with(|r| count_nodes(r)),
                    checked.with(HashSet::len),
                )}
            </div>

            {move || if is_loading.get() && records.with(Vec::is_empty) {
                view! { <div class="tree-loading">{"Loading..."}</div> }.into_any()
            } else {
                view! {
                    <div class="table-container">
                        <table class="tree-table">
                            <tbody>
                                {move || {
                                    let filter = filter_text.get();
                                    let expanded_ids = expanded.get();
                                    let checked_ids = checked.get();
                                    visible_roots.with(|nodes| {
                                        if nodes.is_empty() {
                                            let message = if roots.with(Vec::is_empty) {
                                                "No categories yet."
                                            } else {
                                                "Nothing matches the search."
                                            };
                                            return view! {
                                                <tr><td colspan="3" class="text-center tree-empty">{message}</td></tr>
                                            }
                                            .into_any();
                                        }
                                        render_rows(nodes, row_context, &expanded_ids, &checked_ids, &filter)
                                            .into_iter()
                                            .collect_view()
                                            .into_any()
                                    })
                                }}
                            </tbody>
                        </table>
                        <Show when=move || roots.with(Vec::is_empty) && !is_loading.get()>
                            <button class="button button--secondary" on:click=insert_sample_data>
                                {"Insert sample categories"}
                            </button>
                        </Show>
                    </div>
                }.into_any()
            }}
        </div>
    }
}
