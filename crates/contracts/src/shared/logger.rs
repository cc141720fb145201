use serde::{Deserialize, Serialize};

/// Where a log entry originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    Client,
    Server,
}

impl LogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::Client => "client",
            LogSource::Server => "server",
        }
    }
}

/// Stored log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: String,
    pub source: String,
    pub category: String,
    pub message: String,
}

/// Body of `POST /api/logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLogRequest {
    pub source: LogSource,
    pub category: String,
    pub message: String,
}
