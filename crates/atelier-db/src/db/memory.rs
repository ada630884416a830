//! In-memory repositories.
//!
//! Backs every repository trait with maps behind one async mutex. Used by the
//! test suites and by the API when no `DATABASE_URL` is configured.

use async_trait::async_trait;
use atelier_core::models::{
    Attachment, ContentItem, ContentStatus, ContestEntry, CoreFields, NewAttachment, NewContent,
    Role,
};
use atelier_core::AppError;
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AssociationRepository, AttachmentRepository, ContentRepository, UserDirectory};

#[derive(Default)]
struct State {
    items: HashMap<Uuid, ContentItem>,
    metadata: HashMap<Uuid, HashMap<String, Value>>,
    tags: HashMap<Uuid, BTreeSet<String>>,
    categories: HashMap<(Uuid, String), String>,
    attachments: HashMap<Uuid, Attachment>,
    users: HashMap<Uuid, Role>,
    entries: Vec<ContestEntry>,
    failing: HashSet<&'static str>,
}

impl State {
    fn check(&self, operation: &'static str) -> Result<(), AppError> {
        if self.failing.contains(operation) {
            return Err(AppError::Internal(format!(
                "simulated repository failure in {}",
                operation
            )));
        }
        Ok(())
    }

    fn item_mut(&mut self, id: Uuid) -> Result<&mut ContentItem, AppError> {
        self.items
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Content item {} not found", id)))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, id: Uuid, role: Role) {
        self.state.lock().await.users.insert(id, role);
    }

    /// Make every later call of the named repository operation fail
    /// (e.g. `"set_metadata"`, `"register"`), to exercise outage paths.
    pub async fn fail_operation(&self, operation: &'static str) {
        self.state.lock().await.failing.insert(operation);
    }

    pub async fn item_count(&self) -> usize {
        self.state.lock().await.items.len()
    }

    pub async fn attachment_count(&self) -> usize {
        self.state.lock().await.attachments.len()
    }
}

#[async_trait]
impl ContentRepository for InMemoryStore {
    async fn create(&self, new: &NewContent) -> Result<ContentItem, AppError> {
        let mut state = self.state.lock().await;
        state.check("create")?;

        let now = Utc::now();
        let item = ContentItem {
            id: Uuid::new_v4(),
            content_type: new.content_type,
            author_id: new.author_id,
            status: new.core.status,
            title: new.core.title.clone(),
            body: new.core.body.clone(),
            primary_image_id: None,
            created_at: now,
            updated_at: now,
        };
        state.items.insert(item.id, item.clone());
        state
            .tags
            .insert(item.id, new.core.tags.iter().cloned().collect());
        Ok(item)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ContentItem>, AppError> {
        let state = self.state.lock().await;
        state.check("get")?;
        Ok(state.items.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        state.check("delete")?;

        let existed = state.items.remove(&id).is_some();
        state.metadata.remove(&id);
        state.tags.remove(&id);
        state.categories.retain(|(item_id, _), _| *item_id != id);
        Ok(existed)
    }

    async fn update_core(&self, id: Uuid, core: &CoreFields) -> Result<ContentItem, AppError> {
        let mut state = self.state.lock().await;
        state.check("update_core")?;

        let item = state.item_mut(id)?;
        item.title = core.title.clone();
        item.body = core.body.clone();
        item.status = core.status;
        item.updated_at = Utc::now();
        let updated = item.clone();

        state.tags.insert(id, core.tags.iter().cloned().collect());
        Ok(updated)
    }

    async fn set_status(&self, id: Uuid, status: ContentStatus) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        state.check("set_status")?;

        let item = state.item_mut(id)?;
        item.status = status;
        item.updated_at = Utc::now();
        Ok(())
    }

    async fn set_primary_image(&self, id: Uuid, image_id: Option<Uuid>) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        state.check("set_primary_image")?;

        let item = state.item_mut(id)?;
        item.primary_image_id = image_id;
        item.updated_at = Utc::now();
        Ok(())
    }

    async fn get_metadata(&self, id: Uuid) -> Result<HashMap<String, Value>, AppError> {
        let state = self.state.lock().await;
        state.check("get_metadata")?;
        Ok(state.metadata.get(&id).cloned().unwrap_or_default())
    }

    async fn set_metadata(&self, id: Uuid, key: &str, value: &Value) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        state.check("set_metadata")?;

        if !state.items.contains_key(&id) {
            return Err(AppError::NotFound(format!("Content item {} not found", id)));
        }
        state
            .metadata
            .entry(id)
            .or_default()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn get_tags(&self, id: Uuid) -> Result<Vec<String>, AppError> {
        let state = self.state.lock().await;
        state.check("get_tags")?;
        Ok(state
            .tags
            .get(&id)
            .map(|tags| tags.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn set_classification(
        &self,
        id: Uuid,
        taxonomy: &str,
        term: Option<&str>,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        state.check("set_classification")?;

        let key = (id, taxonomy.to_string());
        match term {
            Some(term) => {
                state.categories.insert(key, term.to_string());
            }
            None => {
                state.categories.remove(&key);
            }
        }
        Ok(())
    }

    async fn get_classification(
        &self,
        id: Uuid,
        taxonomy: &str,
    ) -> Result<Option<String>, AppError> {
        let state = self.state.lock().await;
        state.check("get_classification")?;
        Ok(state.categories.get(&(id, taxonomy.to_string())).cloned())
    }
}

#[async_trait]
impl AttachmentRepository for InMemoryStore {
    async fn register(&self, new: &NewAttachment) -> Result<Attachment, AppError> {
        let mut state = self.state.lock().await;
        state.check("register")?;

        let attachment = Attachment {
            id: Uuid::new_v4(),
            parent_id: new.parent_id,
            filename: new.filename.clone(),
            original_filename: new.original_filename.clone(),
            storage_key: new.storage_key.clone(),
            storage_url: new.storage_url.clone(),
            declared_mime: new.declared_mime.clone(),
            mime_type: new.mime_type.clone(),
            file_size: new.file_size,
            width: new.width,
            height: new.height,
            created_at: Utc::now(),
        };
        state.attachments.insert(attachment.id, attachment.clone());
        Ok(attachment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Attachment>, AppError> {
        let state = self.state.lock().await;
        Ok(state.attachments.get(&id).cloned())
    }

    async fn list_for_parent(&self, parent_id: Uuid) -> Result<Vec<Attachment>, AppError> {
        let state = self.state.lock().await;
        let mut attachments: Vec<Attachment> = state
            .attachments
            .values()
            .filter(|a| a.parent_id == parent_id)
            .cloned()
            .collect();
        attachments.sort_by_key(|a| a.created_at);
        Ok(attachments)
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_with_roles(&self, ids: &[Uuid], roles: &[Role]) -> Result<Vec<Uuid>, AppError> {
        let state = self.state.lock().await;
        state.check("find_with_roles")?;
        Ok(ids
            .iter()
            .filter(|id| {
                state
                    .users
                    .get(id)
                    .is_some_and(|role| roles.contains(role))
            })
            .copied()
            .collect())
    }
}

#[async_trait]
impl AssociationRepository for InMemoryStore {
    async fn exists(&self, project_id: Uuid, parent_id: Uuid) -> Result<bool, AppError> {
        let state = self.state.lock().await;
        state.check("exists")?;
        Ok(state
            .entries
            .iter()
            .any(|e| e.project_id == project_id && e.parent_id == parent_id))
    }

    async fn insert(&self, project_id: Uuid, parent_id: Uuid) -> Result<ContestEntry, AppError> {
        let mut state = self.state.lock().await;
        state.check("insert")?;

        let entry = ContestEntry {
            project_id,
            parent_id,
            winner: false,
            created_at: Utc::now(),
        };
        state.entries.push(entry.clone());
        Ok(entry)
    }

    async fn list_for_parent(&self, parent_id: Uuid) -> Result<Vec<ContestEntry>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.parent_id == parent_id)
            .cloned()
            .collect())
    }
}
