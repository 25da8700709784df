use std::sync::Arc;

use uuid::Uuid;

use super::{
    claims::{OrgClaims, decode_claims},
    error::AuthResult,
    identity::IdentityProvider,
};
use crate::{authz, authz::Permission, models::OrgRole};

/// An authenticated session as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
}

/// A session plus its decoded tenant claims.
///
/// Claims are decoded once per token and cached here; `refresh_claims`
/// exchanges the session for a fresh token and re-decodes. Holders see a
/// consistent view until they explicitly refresh.
pub struct SessionHandle {
    provider: Arc<dyn IdentityProvider>,
    session: Session,
    claims: OrgClaims,
}

impl SessionHandle {
    pub fn new(provider: Arc<dyn IdentityProvider>, session: Session) -> Self {
        let claims = decode_claims(&session.access_token);
        Self {
            provider,
            session,
            claims,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.session.user_id
    }

    pub fn email(&self) -> &str {
        &self.session.email
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn claims(&self) -> &OrgClaims {
        &self.claims
    }

    pub fn role(&self) -> Option<OrgRole> {
        self.claims.org_role
    }

    /// UI gating against the cached claims. The store still enforces.
    pub fn has_permission(&self, permission: Permission) -> bool {
        authz::has_permission(self.claims.org_role, permission)
    }

    /// Exchange the session for a freshly minted token and re-decode its
    /// claims. Called after any mutation that changes tenant state.
    pub async fn refresh_claims(&mut self) -> AuthResult<()> {
        let session = self.provider.refresh_session(&self.session).await?;
        self.claims = decode_claims(&session.access_token);
        self.session = session;
        Ok(())
    }

    pub async fn sign_out(self) -> AuthResult<()> {
        self.provider.sign_out(&self.session).await
    }
}
