use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Link between a project and the contest it was entered into
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ContestEntry {
    pub project_id: Uuid,
    pub parent_id: Uuid,
    /// Set by jury tooling, never by the submission pipeline
    pub winner: bool,
    pub created_at: DateTime<Utc>,
}
