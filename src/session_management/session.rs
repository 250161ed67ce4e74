use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Metadata of a log session, cheap to clone and hand out to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogSession {
    pub id: Uuid,
    pub container_name: String,
    pub started_at: DateTime<Utc>,
}

impl LogSession {
    pub fn new(container_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            container_name: container_name.to_string(),
            started_at: Utc::now(),
        }
    }
}
