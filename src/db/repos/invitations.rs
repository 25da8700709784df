use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{Invitation, NewInvitation},
};

#[async_trait]
pub trait InvitationRepo: Send + Sync {
    /// Record a pending invitation. At most one pending invitation may
    /// exist per (organization, email); a second attempt is a conflict.
    async fn create(&self, organization_id: Uuid, input: NewInvitation) -> DbResult<Invitation>;

    async fn get_by_token(&self, token: Uuid) -> DbResult<Option<Invitation>>;

    /// Pending invitations for an organization, newest first.
    async fn list_pending(&self, organization_id: Uuid) -> DbResult<Vec<Invitation>>;

    /// Atomically accept the invitation identified by `token` on behalf of
    /// the signed-in user: validates that it is pending, unexpired, and
    /// addressed to `user_email`, creates the membership with the invited
    /// role, marks the invitation accepted, and points the user's
    /// current-organization preference at the organization.
    async fn accept(&self, token: Uuid, user_id: Uuid, user_email: &str) -> DbResult<Invitation>;

    /// Mark a pending invitation revoked. Terminal states stay put.
    async fn revoke(&self, id: Uuid) -> DbResult<()>;

    /// Hard delete, used to unwind an invitation whose email never went out.
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}
