use contracts::domain::a001_category::CategoryRecord;
use contracts::domain::common::AggregateRoot;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use std::path::Path;

/// Open (or create) the sqlite file and bootstrap the schema.
pub async fn initialize_database(db_file: &Path) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Opening database {}", absolute_path.display());
    let mut options = ConnectOptions::new(db_url);
    options.sqlx_logging(false);
    let conn = Database::connect(options).await?;

    bootstrap_schema(&conn).await?;
    Ok(conn)
}

/// Private in-memory database. A single pooled connection keeps every query
/// on the same memory instance.
pub async fn connect_in_memory() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(options).await?;

    bootstrap_schema(&conn).await?;
    Ok(conn)
}

/// Minimal schema bootstrap; safe to run on every start.
async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let category_table = CategoryRecord::table_name();
    let statements = [
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {category_table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                parent_id INTEGER,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT,
                updated_at TEXT,
                version INTEGER NOT NULL DEFAULT 0
            );
            "#
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{category_table}_parent ON {category_table} (parent_id);"
        ),
        r#"
            CREATE TABLE IF NOT EXISTS system_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                source TEXT NOT NULL,
                category TEXT NOT NULL,
                message TEXT NOT NULL
            );
        "#
        .to_string(),
    ];

    for sql in statements {
        conn.execute(Statement::from_string(DatabaseBackend::Sqlite, sql))
            .await?;
    }
    tracing::debug!("Schema ready ({})", category_table);
    Ok(())
}
