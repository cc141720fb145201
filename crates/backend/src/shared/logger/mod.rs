pub mod repository;

use contracts::shared::logger::LogSource;
use sea_orm::DatabaseConnection;

/// Record a server-side event in `system_log` without waiting for the write.
///
/// ```ignore
/// logger::log(&state.db, "category", "created #12 'Shoes'");
/// ```
pub fn log(conn: &DatabaseConnection, category: &str, message: &str) {
    repository::log_event_internal(conn.clone(), LogSource::Server, category, message);
}
