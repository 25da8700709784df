//! Identity provider seam and the embedded database-backed implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{
    claims::{AccessClaims, OrgClaims},
    error::{AuthError, AuthResult},
    session::Session,
};
use crate::{
    config::AuthConfig,
    db::{DbError, DbPool, NewUser},
    models::User,
    services::{Email, Mailer},
};

/// The hosted identity surface the rest of the crate programs against.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Session>;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session>;

    /// Mail a single-use sign-in link, creating the account if needed.
    async fn send_magic_link(&self, email: &str) -> AuthResult<()>;

    /// Exchange a magic-link token for a session.
    async fn verify_magic_link(&self, token: &str) -> AuthResult<Session>;

    /// Ensure an account exists for `email` and mail it a sign-in link.
    /// Privileged; callers gate it behind their own authorization.
    async fn invite_by_email(&self, email: &str) -> AuthResult<User>;

    async fn sign_out(&self, session: &Session) -> AuthResult<()>;

    /// Re-issue the session with claims recomputed from current state.
    async fn refresh_session(&self, session: &Session) -> AuthResult<Session>;
}

#[derive(Debug, Serialize, Deserialize)]
struct MagicLinkClaims {
    sub: Uuid,
    email: String,
    purpose: String,
    iat: i64,
    exp: i64,
}

const MAGIC_LINK_PURPOSE: &str = "magic_link";

/// Database-backed provider minting HS256 tokens.
///
/// Tenant claims are recomputed from the membership and preference tables
/// on every issue and refresh, so a token handed out after a mutation
/// always reflects it. Meant for embedded and development use; production
/// deployments terminate auth at a real identity provider.
pub struct LocalIdentityProvider {
    db: Arc<DbPool>,
    mailer: Arc<dyn Mailer>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    magic_link_ttl: Duration,
    base_url: String,
}

impl LocalIdentityProvider {
    pub fn new(db: Arc<DbPool>, mailer: Arc<dyn Mailer>, config: &AuthConfig) -> Self {
        Self {
            db,
            mailer,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl: Duration::seconds(config.token_ttl_secs as i64),
            magic_link_ttl: Duration::seconds(config.magic_link_ttl_secs as i64),
            base_url: config.base_url.clone(),
        }
    }

    /// Recompute tenant claims from the database. The preferred org only
    /// counts while the membership behind it still exists, so a user whose
    /// current org was deleted falls back to no selection.
    async fn org_claims_for(&self, user_id: Uuid) -> AuthResult<OrgClaims> {
        let memberships = self.db.members().list_for_user(user_id).await?;
        let preferred = self.db.preferences().get_current_org(user_id).await?;

        let current = preferred
            .and_then(|org_id| memberships.iter().find(|m| m.organization_id == org_id));

        Ok(OrgClaims {
            org_id: current.map(|m| m.organization_id),
            org_role: current.map(|m| m.role),
            orgs: memberships.iter().map(|m| m.organization_id).collect(),
        })
    }

    fn mint_access_token(&self, user: &User, claims: OrgClaims) -> AuthResult<String> {
        let now = Utc::now();
        let access = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
            org_id: claims.org_id,
            org_role: claims.org_role,
            orgs: claims.orgs,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &access,
            &self.encoding_key,
        )?)
    }

    async fn issue_session(&self, user: &User) -> AuthResult<Session> {
        let claims = self.org_claims_for(user.id).await?;
        let access_token = self.mint_access_token(user, claims)?;
        Ok(Session {
            user_id: user.id,
            email: user.email.clone(),
            access_token,
        })
    }

    async fn get_or_create_user(&self, email: &str) -> AuthResult<User> {
        if let Some(user) = self.db.users().get_by_email(email).await? {
            return Ok(user);
        }
        match self
            .db
            .users()
            .create(NewUser {
                email: email.to_string(),
                password_hash: None,
            })
            .await
        {
            Ok(user) => Ok(user),
            // Lost a race with a concurrent signup; the account exists now.
            Err(DbError::Conflict(_)) => self
                .db
                .users()
                .get_by_email(email)
                .await?
                .ok_or_else(|| AuthError::Internal("User vanished after conflict".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn mail_magic_link(&self, user: &User) -> AuthResult<()> {
        let now = Utc::now();
        let claims = MagicLinkClaims {
            sub: user.id,
            email: user.email.clone(),
            purpose: MAGIC_LINK_PURPOSE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.magic_link_ttl).timestamp(),
        };
        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        self.mailer
            .send(Email {
                to: user.email.clone(),
                subject: "Your sign-in link".to_string(),
                body: format!("{}/auth/confirm?token={}", self.base_url, token),
            })
            .await?;
        Ok(())
    }
}

fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::random();
    let salt_hex = hex::encode(salt);
    let digest = salted_digest(&salt_hex, password);
    format!("{}${}", salt_hex, digest)
}

fn verify_password(stored: &str, password: &str) -> bool {
    match stored.split_once('$') {
        Some((salt_hex, digest)) => salted_digest(salt_hex, password) == digest,
        None => false,
    }
}

fn salted_digest(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Session> {
        let user = self
            .db
            .users()
            .create(NewUser {
                email: email.to_string(),
                password_hash: Some(hash_password(password)),
            })
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::from(other),
            })?;

        self.issue_session(&user).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        let user = self
            .db
            .users()
            .get_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let ok = user
            .password_hash
            .as_deref()
            .is_some_and(|stored| verify_password(stored, password));
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_session(&user).await
    }

    async fn send_magic_link(&self, email: &str) -> AuthResult<()> {
        let user = self.get_or_create_user(email).await?;
        self.mail_magic_link(&user).await
    }

    async fn verify_magic_link(&self, token: &str) -> AuthResult<Session> {
        let data = jsonwebtoken::decode::<MagicLinkClaims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| AuthError::InvalidMagicLink)?;

        if data.claims.purpose != MAGIC_LINK_PURPOSE {
            return Err(AuthError::InvalidMagicLink);
        }

        let user = self
            .db
            .users()
            .get_by_id(data.claims.sub)
            .await?
            .ok_or(AuthError::InvalidMagicLink)?;

        self.issue_session(&user).await
    }

    async fn invite_by_email(&self, email: &str) -> AuthResult<User> {
        let user = self.get_or_create_user(email).await?;
        self.mail_magic_link(&user).await?;
        Ok(user)
    }

    async fn sign_out(&self, _session: &Session) -> AuthResult<()> {
        // Tokens are stateless; expiry is the revocation mechanism.
        Ok(())
    }

    async fn refresh_session(&self, session: &Session) -> AuthResult<Session> {
        let user = self
            .db
            .users()
            .get_by_id(session.user_id)
            .await?
            .ok_or(AuthError::NotAuthenticated)?;

        self.issue_session(&user).await
    }
}
