//! Database repositories for data access layer
//!
//! Each repository is a trait with a PostgreSQL implementation. The
//! [`memory::InMemoryStore`] implements all of them over shared maps.

pub mod association;
pub mod attachment;
pub mod content;
pub mod memory;
pub mod users;

pub use association::{AssociationRepository, PostgresAssociationRepository};
pub use attachment::{AttachmentRepository, PostgresAttachmentRepository};
pub use content::{ContentRepository, PostgresContentRepository};
pub use memory::InMemoryStore;
pub use users::{PostgresUserDirectory, UserDirectory};

use sqlx::PgPool;
use std::sync::Arc;

/// The full set of repositories the pipeline talks to
#[derive(Clone)]
pub struct Repositories {
    pub content: Arc<dyn ContentRepository>,
    pub attachments: Arc<dyn AttachmentRepository>,
    pub users: Arc<dyn UserDirectory>,
    pub associations: Arc<dyn AssociationRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            content: Arc::new(PostgresContentRepository::new(pool.clone())),
            attachments: Arc::new(PostgresAttachmentRepository::new(pool.clone())),
            users: Arc::new(PostgresUserDirectory::new(pool.clone())),
            associations: Arc::new(PostgresAssociationRepository::new(pool)),
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        Self {
            content: Arc::new(store.clone()),
            attachments: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            associations: Arc::new(store),
        }
    }
}
