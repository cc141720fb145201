use chrono::Utc;
use contracts::domain::a001_category::{CategoryRecord, ParentRef, RecordId};
use contracts::domain::common::EntityMetadata;
use sea_orm::entity::prelude::*;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    fn metadata(&self) -> EntityMetadata {
        EntityMetadata {
            created_at: self.created_at.unwrap_or_else(Utc::now),
            updated_at: self.updated_at.unwrap_or_else(Utc::now),
            is_deleted: self.is_deleted,
            version: self.version,
        }
    }
}

impl From<Model> for CategoryRecord {
    fn from(m: Model) -> Self {
        let metadata = m.metadata();
        CategoryRecord {
            id: RecordId::Int(m.id),
            name: m.name,
            parent: m.parent_id.map(|p| ParentRef::Id(RecordId::Int(p))),
            description: m.description,
            metadata: Some(metadata),
        }
    }
}

/// Fields written by create and update
pub struct CategoryFields {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
}

/// Live (not soft-deleted) rows in insertion order
pub async fn list_all<C: ConnectionTrait>(conn: &C) -> Result<Vec<Model>, DbErr> {
    Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Id)
        .all(conn)
        .await
}

pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: i64) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(id)
        .filter(Column::IsDeleted.eq(false))
        .one(conn)
        .await
}

pub async fn insert<C: ConnectionTrait>(conn: &C, fields: CategoryFields) -> Result<i64, DbErr> {
    let metadata = EntityMetadata::new();
    let active = ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        name: Set(fields.name),
        description: Set(fields.description),
        parent_id: Set(fields.parent_id),
        is_deleted: Set(metadata.is_deleted),
        created_at: Set(Some(metadata.created_at)),
        updated_at: Set(Some(metadata.updated_at)),
        version: Set(metadata.version),
    };
    let result = Entity::insert(active).exec(conn).await?;
    Ok(result.last_insert_id)
}

pub async fn update<C: ConnectionTrait>(
    conn: &C,
    existing: Model,
    fields: CategoryFields,
) -> Result<Model, DbErr> {
    let mut metadata = existing.metadata();
    metadata.revise();

    let mut active: ActiveModel = existing.into();
    active.name = Set(fields.name);
    active.description = Set(fields.description);
    active.parent_id = Set(fields.parent_id);
    active.updated_at = Set(Some(metadata.updated_at));
    active.version = Set(metadata.version);
    active.update(conn).await
}

/// Hide the row from every list; it stays in the table.
pub async fn soft_delete<C: ConnectionTrait>(conn: &C, existing: Model) -> Result<Model, DbErr> {
    let mut metadata = existing.metadata();
    metadata.mark_deleted();

    let mut active: ActiveModel = existing.into();
    active.is_deleted = Set(metadata.is_deleted);
    active.updated_at = Set(Some(metadata.updated_at));
    active.version = Set(metadata.version);
    active.update(conn).await
}

pub async fn count_children<C: ConnectionTrait>(conn: &C, id: i64) -> Result<u64, DbErr> {
    Entity::find()
        .filter(Column::ParentId.eq(id))
        .filter(Column::IsDeleted.eq(false))
        .count(conn)
        .await
}
