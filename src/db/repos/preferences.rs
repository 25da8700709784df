use async_trait::async_trait;
use uuid::Uuid;

use crate::db::error::DbResult;

/// Per-user dashboard preferences. Today that is just the current
/// organization selection.
#[async_trait]
pub trait PreferenceRepo: Send + Sync {
    async fn get_current_org(&self, user_id: Uuid) -> DbResult<Option<Uuid>>;

    /// Upsert the user's current organization. Idempotent.
    async fn set_current_org(&self, user_id: Uuid, organization_id: Uuid) -> DbResult<()>;

    /// Clear the selection only if it still points at `organization_id`.
    async fn clear_if_current(&self, user_id: Uuid, organization_id: Uuid) -> DbResult<()>;
}
