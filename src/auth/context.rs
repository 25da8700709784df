use uuid::Uuid;

use super::{
    error::{AuthError, AuthResult},
    session::SessionHandle,
};
use crate::models::OrgRole;

/// Resolved tenant context for one operation.
#[derive(Debug, Clone, Copy)]
pub struct OrgContext {
    pub user_id: Uuid,
    pub org_id: Uuid,
    /// None when the cached claims carry an org without a role. Permission
    /// checks treat it as granting nothing.
    pub role: Option<OrgRole>,
}

/// Resolve the current organization for the session.
///
/// Optimistic first: if the cached claims already name an organization,
/// use them as-is. Otherwise refresh the session once (claims go stale
/// right after sign-up or an org switch) and look again. Still nothing
/// means the user genuinely has no organization selected, which is theirs
/// to fix, not a bug.
pub async fn require_org_context(handle: &mut SessionHandle) -> AuthResult<OrgContext> {
    if let Some(org_id) = handle.claims().org_id {
        return Ok(OrgContext {
            user_id: handle.user_id(),
            org_id,
            role: handle.role(),
        });
    }

    handle.refresh_claims().await?;

    match handle.claims().org_id {
        Some(org_id) => Ok(OrgContext {
            user_id: handle.user_id(),
            org_id,
            role: handle.role(),
        }),
        None => Err(AuthError::NoOrgSelected),
    }
}
