use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::domain::a001_category::{
    CategoryDto, CategoryRecord, CategoryTreeNode, RecordId, TreeOptions, TreeQuery,
};
use serde::Deserialize;
use serde_json::json;

use crate::domain::a001_category::service;
use crate::shared::error::ApiError;
use crate::shared::extract::{ApiJson, ApiQuery};
use crate::shared::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// `expand=parent` embeds `{id, name}` instead of the bare parent id
    #[serde(default)]
    pub expand: Option<String>,
}

impl ListQuery {
    fn expands_parent(&self) -> bool {
        self.expand
            .as_deref()
            .map(|v| v.split(',').any(|part| part.trim() == "parent"))
            .unwrap_or(false)
    }
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    service::parse_id(&RecordId::Str(raw.to_string()))
}

/// GET /api/products/categories
pub async fn list_all(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<CategoryRecord>>, ApiError> {
    let records = service::list(&state.db, query.expands_parent()).await?;
    Ok(Json(records))
}

/// GET /api/products/categories/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CategoryRecord>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(service::get_by_id(&state.db, id).await?))
}

/// POST /api/products/categories
pub async fn create(
    State(state): State<AppState>,
    ApiJson(dto): ApiJson<CategoryDto>,
) -> Result<(StatusCode, Json<CategoryRecord>), ApiError> {
    let record = service::create(&state, dto).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/products/categories/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(dto): ApiJson<CategoryDto>,
) -> Result<Json<CategoryRecord>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(service::update(&state, id, dto).await?))
}

/// DELETE /api/products/categories/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    service::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/products/categories/tree?policy=leaf_only&sort=alphabetical&root=0
pub async fn tree(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TreeQuery>,
) -> Result<Json<Vec<CategoryTreeNode>>, ApiError> {
    let options = TreeOptions::from(query);
    Ok(Json(service::tree(&state.db, options).await?))
}

/// POST /api/products/categories/testdata
pub async fn insert_test_data(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let inserted = service::insert_test_data(&state).await?;
    Ok(Json(json!({ "inserted": inserted })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_parsing() {
        let q = |v: &str| ListQuery {
            expand: Some(v.to_string()),
        };
        assert!(q("parent").expands_parent());
        assert!(q("children, parent").expands_parent());
        assert!(!q("children").expands_parent());
        assert!(!ListQuery::default().expands_parent());
    }

    #[test]
    fn test_path_id() {
        assert_eq!(parse_id("15").unwrap(), 15);
        assert!(parse_id("abc").is_err());
    }
}
