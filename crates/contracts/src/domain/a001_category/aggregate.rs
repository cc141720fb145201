use crate::domain::common::{AggregateRoot, EntityMetadata};
use crate::shared::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ID Type
// ============================================================================

/// Identifier of a category as issued by the record store.
///
/// Stores return either integers or strings. Equality is strict: `Int(1)`
/// and `Str("1")` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl RecordId {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            RecordId::Int(v) => Some(*v),
            RecordId::Str(_) => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(v) => write!(f, "{}", v),
            RecordId::Str(s) => f.write_str(s),
        }
    }
}

/// Text coming from URLs and form fields: digits become `Int`, anything
/// else is kept as `Str`.
impl FromStr for RecordId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<i64>() {
            Ok(v) => RecordId::Int(v),
            Err(_) => RecordId::Str(s.to_string()),
        })
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Str(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId::Str(value)
    }
}

// ============================================================================
// Parent reference
// ============================================================================

/// Parent as embedded by stores that expand relations: `{"id": 2, "name": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedParent {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Parent reference as it arrives on the wire: a bare id or an embedded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParentRef {
    Id(RecordId),
    Embedded(EmbeddedParent),
}

impl ParentRef {
    pub fn id(&self) -> &RecordId {
        match self {
            ParentRef::Id(id) => id,
            ParentRef::Embedded(parent) => &parent.id,
        }
    }
}

impl From<RecordId> for ParentRef {
    fn from(value: RecordId) -> Self {
        ParentRef::Id(value)
    }
}

/// The single place where both parent representations collapse to a scalar id.
/// `None` means the record declares no parent.
pub fn normalize_parent_id(parent: Option<&ParentRef>) -> Option<&RecordId> {
    parent.map(ParentRef::id)
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// A category exactly as the flat record store lists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: RecordId,
    pub name: String,
    #[serde(
        default,
        alias = "parentRef",
        alias = "parent_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<ParentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EntityMetadata>,
}

impl CategoryRecord {
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent: None,
            description: None,
            metadata: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<ParentRef>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn parent_id(&self) -> Option<&RecordId> {
        normalize_parent_id(self.parent.as_ref())
    }

    /// Form contents for editing this record
    pub fn to_dto(&self) -> CategoryDto {
        CategoryDto {
            name: self.name.clone(),
            parent: self.parent_id().cloned(),
            description: self.description.clone(),
        }
    }
}

impl AggregateRoot for CategoryRecord {
    fn aggregate_index() -> &'static str {
        "a001"
    }

    fn collection_name() -> &'static str {
        "category"
    }

    fn element_name() -> &'static str {
        "Category"
    }

    fn list_name() -> &'static str {
        "Product categories"
    }
}

// ============================================================================
// DTO
// ============================================================================

/// Body of create and update requests.
///
/// Update replaces all editable fields, so a missing `parent` moves the
/// category to the top level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryDto {
    pub name: String,
    #[serde(
        default,
        alias = "parentRef",
        alias = "parent_id",
        deserialize_with = "deserialize_parent"
    )]
    pub parent: Option<RecordId>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Accept both parent forms on input; only the id is kept.
fn deserialize_parent<'de, D>(deserializer: D) -> Result<Option<RecordId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let parent = Option::<ParentRef>::deserialize(deserializer)?;
    Ok(normalize_parent_id(parent.as_ref()).cloned())
}

impl CategoryDto {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<RecordId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Trim text fields; a blank description becomes `None`.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::Validation("name is required".into()));
        }
        if self.name.chars().count() > 255 {
            return Err(CatalogError::Validation(
                "name must not exceed 255 characters".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parent_forms_normalize_to_same_id() {
        let scalar: CategoryRecord =
            serde_json::from_value(json!({"id": 2, "name": "Child", "parent": 1})).unwrap();
        let embedded: CategoryRecord = serde_json::from_value(
            json!({"id": 3, "name": "Grandchild", "parent": {"id": 1, "name": "Root"}}),
        )
        .unwrap();

        assert_eq!(scalar.parent_id(), Some(&RecordId::Int(1)));
        assert_eq!(embedded.parent_id(), Some(&RecordId::Int(1)));
    }

    #[test]
    fn test_scalar_parent_kept_unchanged() {
        let record: CategoryRecord =
            serde_json::from_value(json!({"id": "b", "name": "B", "parent": "a"})).unwrap();
        assert_eq!(record.parent_id(), Some(&RecordId::Str("a".into())));
    }

    #[test]
    fn test_null_and_absent_parent() {
        let null: CategoryRecord =
            serde_json::from_value(json!({"id": 1, "name": "A", "parent": null})).unwrap();
        let absent: CategoryRecord =
            serde_json::from_value(json!({"id": 1, "name": "A"})).unwrap();
        assert_eq!(null.parent_id(), None);
        assert_eq!(absent.parent_id(), None);
    }

    #[test]
    fn test_parent_field_aliases() {
        let camel: CategoryRecord =
            serde_json::from_value(json!({"id": 4, "name": "A", "parentRef": {"id": 9}}))
                .unwrap();
        let snake: CategoryRecord =
            serde_json::from_value(json!({"id": 4, "name": "A", "parent_id": 9})).unwrap();
        assert_eq!(camel.parent_id(), Some(&RecordId::Int(9)));
        assert_eq!(snake.parent_id(), Some(&RecordId::Int(9)));
    }

    #[test]
    fn test_record_id_from_str() {
        assert_eq!("42".parse::<RecordId>().unwrap(), RecordId::Int(42));
        assert_eq!(
            "abc-1".parse::<RecordId>().unwrap(),
            RecordId::Str("abc-1".into())
        );
    }

    #[test]
    fn test_dto_accepts_embedded_parent() {
        let dto: CategoryDto =
            serde_json::from_value(json!({"name": "Shoes", "parent": {"id": 7}})).unwrap();
        assert_eq!(dto.parent, Some(RecordId::Int(7)));
    }

    #[test]
    fn test_dto_validation() {
        assert!(CategoryDto::new("   ").validate().is_err());
        assert!(CategoryDto::new("x".repeat(256)).validate().is_err());
        assert!(CategoryDto::new("Shoes").validate().is_ok());
    }

    #[test]
    fn test_dto_normalized() {
        let dto = CategoryDto {
            name: "  Shoes ".into(),
            parent: None,
            description: Some("   ".into()),
        }
        .normalized();
        assert_eq!(dto.name, "Shoes");
        assert_eq!(dto.description, None);
    }

    #[test]
    fn test_naming() {
        assert_eq!(CategoryRecord::table_name(), "a001_category");
        assert_eq!(CategoryRecord::element_name(), "Category");
        assert_eq!(CategoryRecord::list_name(), "Product categories");
    }
}
