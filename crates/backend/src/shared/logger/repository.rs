use chrono::Utc;
use contracts::shared::logger::{LogEntry, LogSource};
use sea_orm::entity::prelude::*;
use sea_orm::{EntityTrait, QueryOrder, QuerySelect, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "system_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub timestamp: String,
    pub source: String,
    pub category: String,
    pub message: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LogEntry {
    fn from(m: Model) -> Self {
        LogEntry {
            id: m.id,
            timestamp: m.timestamp,
            source: m.source,
            category: m.category,
            message: m.message,
        }
    }
}

/// Fire-and-forget write; failures go to the tracing log only.
pub fn log_event_internal(
    conn: DatabaseConnection,
    source: LogSource,
    category: &str,
    message: &str,
) {
    let category = category.to_string();
    let message = message.to_string();

    tokio::spawn(async move {
        if let Err(e) = log_event(&conn, source, &category, &message).await {
            tracing::warn!("Failed to log event: {}", e);
        }
    });
}

pub async fn log_event(
    conn: &DatabaseConnection,
    source: LogSource,
    category: &str,
    message: &str,
) -> Result<(), DbErr> {
    let now = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();

    let active = ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        timestamp: Set(now),
        source: Set(source.as_str().to_string()),
        category: Set(category.to_string()),
        message: Set(message.to_string()),
    };

    active.insert(conn).await?;
    Ok(())
}

/// Newest first, at most `limit` entries
pub async fn get_recent_logs(conn: &DatabaseConnection, limit: u64) -> Result<Vec<LogEntry>, DbErr> {
    let logs = Entity::find()
        .order_by_desc(Column::Id)
        .limit(limit)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(logs)
}

pub async fn clear_all_logs(conn: &DatabaseConnection) -> Result<u64, DbErr> {
    let result = Entity::delete_many().exec(conn).await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;

    #[tokio::test]
    async fn test_log_roundtrip_newest_first() {
        let conn = connect_in_memory().await.unwrap();
        log_event(&conn, LogSource::Server, "startup", "first").await.unwrap();
        log_event(&conn, LogSource::Client, "ui", "second").await.unwrap();

        let logs = get_recent_logs(&conn, 10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "second");
        assert_eq!(logs[0].source, "client");

        assert_eq!(get_recent_logs(&conn, 1).await.unwrap().len(), 1);
        assert_eq!(clear_all_logs(&conn).await.unwrap(), 2);
        assert!(get_recent_logs(&conn, 10).await.unwrap().is_empty());
    }
}
