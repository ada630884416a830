//! Collaborator list reconciliation.

use atelier_core::models::Actor;
use atelier_core::AppError;
use atelier_db::UserDirectory;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Compute the collaborator set to store for a project.
///
/// Previously stored collaborators that the client still proposes are kept
/// whatever their role. Other proposals are kept only if they resolve to a
/// user holding a role the acting actor may grant; the rest are dropped
/// silently. The author is never their own collaborator. The result is
/// deduplicated and sorted, and depends only on the inputs.
pub async fn reconcile_collaborators(
    users: &dyn UserDirectory,
    actor: &Actor,
    proposed: &[Uuid],
    author_id: Uuid,
    stored: &[Uuid],
) -> Result<Vec<Uuid>, AppError> {
    let mut proposed: BTreeSet<Uuid> = proposed.iter().copied().collect();
    proposed.remove(&author_id);

    let keepers: BTreeSet<Uuid> = stored
        .iter()
        .copied()
        .filter(|id| proposed.contains(id))
        .collect();

    let candidates: Vec<Uuid> = proposed.difference(&keepers).copied().collect();

    let mut result = keepers;
    if !candidates.is_empty() {
        let resolved = users
            .find_with_roles(&candidates, &actor.grantable_roles())
            .await?;
        let accepted: Vec<Uuid> = resolved
            .into_iter()
            .filter(|id| candidates.contains(id))
            .collect();

        if accepted.len() < candidates.len() {
            tracing::debug!(
                actor_id = %actor.id,
                dropped = candidates.len() - accepted.len(),
                "Dropped collaborator candidates that did not resolve"
            );
        }
        result.extend(accepted);
    }

    Ok(result.into_iter().collect())
}
