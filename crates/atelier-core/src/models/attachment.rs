use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored, validated image owned by one content item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Attachment {
    pub id: Uuid,
    pub parent_id: Uuid,
    /// Content-addressed name the bytes are stored under
    pub filename: String,
    pub original_filename: String,
    pub storage_key: String,
    pub storage_url: String,
    /// Mime type the client declared
    pub declared_mime: String,
    /// Mime type detected from the bytes
    pub mime_type: String,
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub created_at: DateTime<Utc>,
}

/// Attachment record to register after the bytes are stored
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub parent_id: Uuid,
    pub filename: String,
    pub original_filename: String,
    pub storage_key: String,
    pub storage_url: String,
    pub declared_mime: String,
    pub mime_type: String,
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
}

/// Stable reference handed back to callers of the upload engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub id: Uuid,
    pub filename: String,
    pub url: String,
}

impl From<&Attachment> for AttachmentRef {
    fn from(attachment: &Attachment) -> Self {
        Self {
            id: attachment.id,
            filename: attachment.filename.clone(),
            url: attachment.storage_url.clone(),
        }
    }
}
