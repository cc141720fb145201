//! Error taxonomy shared by backend and frontend.
//!
//! The backend serializes every failure as [`ApiErrorBody`]; the client maps
//! it back with [`CatalogError::from_response`], so each kind reaches the UI
//! intact instead of collapsing into one generic failure.

use crate::domain::a001_category::RecordId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    CyclicHierarchy,
    DuplicateIdentifier,
    Unauthorized,
    Http,
    Transport,
    Decode,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::CyclicHierarchy => "cyclic_hierarchy",
            ErrorKind::DuplicateIdentifier => "duplicate_identifier",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Http => "http",
            ErrorKind::Transport => "transport",
            ErrorKind::Decode => "decode",
        }
    }
}

/// Structural problems found while assembling a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(RecordId),

    /// `path` starts and ends with the same id, e.g. `[1, 2, 1]`
    #[error("cyclic hierarchy: {}", join_path(.path))]
    CyclicHierarchy { path: Vec<RecordId> },
}

fn join_path(path: &[RecordId]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("unauthorized")]
    Unauthorized,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(_) => ErrorKind::Validation,
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::Tree(TreeError::CyclicHierarchy { .. }) => ErrorKind::CyclicHierarchy,
            CatalogError::Tree(TreeError::DuplicateIdentifier(_)) => {
                ErrorKind::DuplicateIdentifier
            }
            CatalogError::Unauthorized => ErrorKind::Unauthorized,
            CatalogError::Http { .. } => ErrorKind::Http,
            CatalogError::Transport(_) => ErrorKind::Transport,
            CatalogError::Decode(_) => ErrorKind::Decode,
        }
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        CatalogError::NotFound(what.to_string())
    }

    pub fn cyclic(path: Vec<RecordId>) -> Self {
        CatalogError::Tree(TreeError::CyclicHierarchy { path })
    }

    pub fn to_body(&self) -> ApiErrorBody {
        let ids = match self {
            CatalogError::Tree(TreeError::CyclicHierarchy { path }) => path.clone(),
            CatalogError::Tree(TreeError::DuplicateIdentifier(id)) => vec![id.clone()],
            _ => Vec::new(),
        };
        ApiErrorBody {
            kind: self.kind(),
            message: self.to_string(),
            ids,
        }
    }

    /// Rebuild the error from a body produced by [`CatalogError::to_body`].
    pub fn from_body(status: u16, body: ApiErrorBody) -> Self {
        match body.kind {
            ErrorKind::Validation => CatalogError::Validation(strip_prefix(
                &body.message,
                "validation failed: ",
            )),
            ErrorKind::NotFound => {
                CatalogError::NotFound(strip_prefix(&body.message, "not found: "))
            }
            ErrorKind::CyclicHierarchy => CatalogError::cyclic(body.ids),
            ErrorKind::DuplicateIdentifier => match body.ids.into_iter().next() {
                Some(id) => CatalogError::Tree(TreeError::DuplicateIdentifier(id)),
                None => CatalogError::Http {
                    status,
                    message: body.message,
                },
            },
            ErrorKind::Unauthorized => CatalogError::Unauthorized,
            ErrorKind::Transport => CatalogError::Transport(body.message),
            ErrorKind::Decode => CatalogError::Decode(body.message),
            ErrorKind::Http => CatalogError::Http {
                status,
                message: body.message,
            },
        }
    }

    /// Map a non-success HTTP response to an error; bodies that are not an
    /// [`ApiErrorBody`] fall back to the status code.
    pub fn from_response(status: u16, text: &str) -> Self {
        match serde_json::from_str::<ApiErrorBody>(text) {
            Ok(body) => Self::from_body(status, body),
            Err(_) => match status {
                401 => CatalogError::Unauthorized,
                404 => CatalogError::NotFound(text.to_string()),
                _ => CatalogError::Http {
                    status,
                    message: text.to_string(),
                },
            },
        }
    }
}

fn strip_prefix(message: &str, prefix: &str) -> String {
    message.strip_prefix(prefix).unwrap_or(message).to_string()
}

/// JSON error body returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    /// Ids involved: the cycle path or the duplicated id
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<RecordId>,
}
