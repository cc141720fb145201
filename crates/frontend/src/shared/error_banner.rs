use contracts::shared::error::{CatalogError, TreeError};
use leptos::prelude::*;

use crate::shared::icons::icon;

/// Operator-facing wording for an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorText {
    pub title: &'static str,
    pub detail: String,
}

pub fn describe(error: &CatalogError) -> ErrorText {
    match error {
        CatalogError::Validation(message) => ErrorText {
            title: "Check the form",
            detail: message.clone(),
        },
        CatalogError::NotFound(what) => ErrorText {
            title: "Not found",
            detail: format!("{} no longer exists; the list was probably changed elsewhere", what),
        },
        CatalogError::Tree(TreeError::CyclicHierarchy { path }) => ErrorText {
            title: "Cyclic hierarchy",
            detail: format!(
                "categories reference each other: {}",
                path.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" → ")
            ),
        },
        CatalogError::Tree(TreeError::DuplicateIdentifier(id)) => ErrorText {
            title: "Duplicate identifier",
            detail: format!("more than one category has id {}", id),
        },
        CatalogError::Unauthorized => ErrorText {
            title: "Access denied",
            detail: "the API token was rejected; sign in again".to_string(),
        },
        other => ErrorText {
            title: "Request failed",
            detail: other.to_string(),
        },
    }
}

#[component]
pub fn ErrorBanner(
    #[prop(into)] error: Signal<Option<CatalogError>>,
    #[prop(optional)] on_dismiss: Option<Callback<()>>,
) -> impl IntoView {
    move || {
        error.get().map(|err| {
            let text = describe(&err);
            let kind = err.kind().as_str();
            view! {
                <div class=format!("error-banner error-banner--{kind}") role="alert">
                    <div class="error-banner__body">
                        <strong>{text.title}</strong>
                        <span>{text.detail}</span>
                    </div>
                    {on_dismiss.map(|cb| view! {
                        <button class="error-banner__close" title="Dismiss" on:click=move |_| cb.run(())>
                            {icon("x")}
                        </button>
                    })}
                </div>
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_kind_has_its_own_title() {
        let cases = [
            (CatalogError::Validation("name is required".into()), "Check the form"),
            (CatalogError::not_found("category 4"), "Not found"),
            (CatalogError::cyclic(vec![1.into(), 2.into(), 1.into()]), "Cyclic hierarchy"),
            (
                CatalogError::Tree(TreeError::DuplicateIdentifier(3.into())),
                "Duplicate identifier",
            ),
            (CatalogError::Unauthorized, "Access denied"),
            (CatalogError::Transport("offline".into()), "Request failed"),
        ];
        for (error, title) in cases {
            assert_eq!(describe(&error).title, title);
        }
    }

    #[test]
    fn test_cycle_detail_lists_path() {
        let text = describe(&CatalogError::cyclic(vec![1.into(), 2.into(), 1.into()]));
        assert!(text.detail.ends_with("1 → 2 → 1"));
    }
}
