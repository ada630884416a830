use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of user-authored content handled by the submission pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "text", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Project,
    Contest,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Project => "project",
            ContentType::Contest => "contest",
        }
    }

    /// Path segment used when building permalinks
    pub fn slug(&self) -> &'static str {
        match self {
            ContentType::Project => "projects",
            ContentType::Contest => "contests",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "project" | "projects" => Ok(ContentType::Project),
            "contest" | "contests" => Ok(ContentType::Contest),
            other => Err(format!("Unknown content type: {}", other)),
        }
    }
}

/// Lifecycle status of a content item.
///
/// `Private` is the moderation holding state. Moving between `Draft` and
/// `Private` is always allowed; entering `Published` requires the publish gate
/// to pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "text", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Draft,
    Private,
    Published,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Private => "private",
            ContentStatus::Published => "published",
        }
    }

    /// Whether moving into `self` has to be validated first
    pub fn requires_validation(&self) -> bool {
        matches!(self, ContentStatus::Published)
    }

    /// Whether this status is visible to end users
    pub fn is_public(&self) -> bool {
        matches!(self, ContentStatus::Published)
    }

    /// Status a failed publish attempt falls back to. Always draft, never moderation.
    pub fn fallback() -> Self {
        ContentStatus::Draft
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(ContentStatus::Draft),
            "private" | "moderation" | "pending" => Ok(ContentStatus::Private),
            "published" | "publish" => Ok(ContentStatus::Published),
            other => Err(format!("Unknown content status: {}", other)),
        }
    }
}

/// A persisted project or contest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ContentItem {
    pub id: Uuid,
    pub content_type: ContentType,
    pub author_id: Uuid,
    pub status: ContentStatus,
    pub title: String,
    pub body: String,
    pub primary_image_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Core record fields written by a submission (everything except metadata)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreFields {
    pub title: String,
    pub body: String,
    pub status: ContentStatus,
    /// Free-text tags; replaced wholesale on every save
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Minimal record inserted to obtain an id before uploads run
#[derive(Debug, Clone)]
pub struct NewContent {
    pub content_type: ContentType,
    pub author_id: Uuid,
    pub core: CoreFields,
}
