use atelier_db::ContentRepository;
use std::sync::Arc;
use uuid::Uuid;

/// Removes a freshly created item unless the submission completes.
///
/// `rollback` is the normal failure path. If the submission future is dropped
/// instead (request deadline, client gone), `Drop` schedules the delete on the
/// current runtime.
pub(super) struct CreationGuard {
    content: Arc<dyn ContentRepository>,
    id: Uuid,
    armed: bool,
}

impl CreationGuard {
    pub(super) fn new(content: Arc<dyn ContentRepository>, id: Uuid) -> Self {
        Self {
            content,
            id,
            armed: true,
        }
    }

    pub(super) fn disarm(mut self) {
        self.armed = false;
    }

    pub(super) async fn rollback(mut self) {
        self.armed = false;
        match self.content.delete(self.id).await {
            Ok(_) => tracing::info!(content_id = %self.id, "Rolled back created item"),
            Err(e) => tracing::error!(
                error = %e,
                content_id = %self.id,
                "Failed to roll back created item"
            ),
        }
    }
}

impl Drop for CreationGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let content = self.content.clone();
        let id = self.id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(content_id = %id, "Submission cancelled, rolling back created item");
                handle.spawn(async move {
                    if let Err(e) = content.delete(id).await {
                        tracing::error!(
                            error = %e,
                            content_id = %id,
                            "Failed to roll back cancelled item"
                        );
                    }
                });
            }
            Err(_) => {
                tracing::error!(content_id = %id, "No runtime to roll back cancelled item");
            }
        }
    }
}
