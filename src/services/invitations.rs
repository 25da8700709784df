use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use super::mailer::{Email, Mailer};
use crate::{
    config::AuthConfig,
    db::{DbError, DbPool, DbResult},
    models::{Invitation, NewInvitation, OrgRole},
};

#[derive(Clone)]
pub struct InvitationService {
    db: Arc<DbPool>,
    mailer: Arc<dyn Mailer>,
    ttl: Duration,
    base_url: String,
}

impl InvitationService {
    pub fn new(db: Arc<DbPool>, mailer: Arc<dyn Mailer>, config: &AuthConfig) -> Self {
        Self {
            db,
            mailer,
            ttl: Duration::hours(config.invitation_ttl_hours),
            base_url: config.base_url.clone(),
        }
    }

    /// Record an invitation and mail the acceptance link.
    ///
    /// No preflight duplicate check; the partial unique index on pending
    /// invitations is the arbiter, and a violation comes back as a
    /// conflict. If the email fails to send, the freshly inserted row is
    /// deleted again so the invitee can be re-invited immediately.
    pub async fn create(
        &self,
        organization_id: Uuid,
        email: &str,
        role: OrgRole,
        invited_by: Uuid,
    ) -> DbResult<Invitation> {
        let org = self
            .db
            .organizations()
            .get_by_id(organization_id)
            .await?
            .ok_or(DbError::NotFound)?;

        let invitation = self
            .db
            .invitations()
            .create(
                organization_id,
                NewInvitation {
                    email: email.to_lowercase(),
                    role,
                    invited_by,
                    expires_at: Utc::now() + self.ttl,
                },
            )
            .await?;

        let message = Email {
            to: invitation.email.clone(),
            subject: format!("You've been invited to join {}", org.name),
            body: format!(
                "{}/invitations/accept?token={}",
                self.base_url, invitation.token
            ),
        };

        if let Err(send_err) = self.mailer.send(message).await {
            if let Err(cleanup_err) = self.db.invitations().delete(invitation.id).await {
                tracing::warn!(
                    invitation_id = %invitation.id,
                    error = %cleanup_err,
                    "Failed to roll back invitation after email failure"
                );
            }
            return Err(DbError::Internal(format!(
                "Failed to send invitation email: {}",
                send_err
            )));
        }

        Ok(invitation)
    }

    pub async fn list_pending(&self, organization_id: Uuid) -> DbResult<Vec<Invitation>> {
        self.db.invitations().list_pending(organization_id).await
    }

    /// Accept on behalf of the signed-in user. Membership role comes from
    /// the stored invitation; the transaction covers validation, the new
    /// membership, the status flip, and the preference upsert.
    pub async fn accept(
        &self,
        token: Uuid,
        user_id: Uuid,
        user_email: &str,
    ) -> DbResult<Invitation> {
        self.db.invitations().accept(token, user_id, user_email).await
    }

    /// Revoke a pending invitation belonging to `organization_id`.
    pub async fn revoke(&self, organization_id: Uuid, id: Uuid) -> DbResult<()> {
        let pending = self.db.invitations().list_pending(organization_id).await?;
        if !pending.iter().any(|i| i.id == id) {
            return Err(DbError::NotFound);
        }
        self.db.invitations().revoke(id).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::db::{
        sqlite::SqliteUserRepo,
        tests::{create_org, create_user, test_pool},
    };
    use crate::services::mailer::{MailerError, MemoryMailer};

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _email: Email) -> Result<(), MailerError> {
            Err(MailerError::Delivery("smtp down".to_string()))
        }
    }

    async fn setup(mailer: Arc<dyn Mailer>) -> (Arc<DbPool>, InvitationService) {
        let db = Arc::new(DbPool::from_sqlite(test_pool().await));
        let service = InvitationService::new(Arc::clone(&db), mailer, &AuthConfig::default());
        (db, service)
    }

    #[tokio::test]
    async fn test_create_sends_acceptance_link() {
        let mailer = Arc::new(MemoryMailer::new());
        let (db, service) = setup(mailer.clone()).await;
        let owner = create_user(&SqliteUserRepo::new(db.pool().clone()), "o@example.com").await;
        let org = create_org(db.pool(), "invite-mail", owner.id).await;

        let invitation = service
            .create(org.id, "Guest@Example.com", OrgRole::Member, owner.id)
            .await
            .expect("Failed to create invitation");

        assert_eq!(invitation.email, "guest@example.com");

        let outbox = mailer.outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "guest@example.com");
        assert!(outbox[0].body.contains(&invitation.token.to_string()));
    }

    #[tokio::test]
    async fn test_send_failure_rolls_back_invitation() {
        let (db, service) = setup(Arc::new(FailingMailer)).await;
        let owner = create_user(&SqliteUserRepo::new(db.pool().clone()), "o@example.com").await;
        let org = create_org(db.pool(), "rollback", owner.id).await;

        let result = service
            .create(org.id, "guest@example.com", OrgRole::Member, owner.id)
            .await;
        assert!(matches!(result, Err(DbError::Internal(_))));

        // The row is gone, so a retry is not treated as a duplicate
        let pending = service.list_pending(org.id).await.unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_pending_is_a_conflict() {
        let (db, service) = setup(Arc::new(MemoryMailer::new())).await;
        let owner = create_user(&SqliteUserRepo::new(db.pool().clone()), "o@example.com").await;
        let org = create_org(db.pool(), "dup", owner.id).await;

        service
            .create(org.id, "guest@example.com", OrgRole::Member, owner.id)
            .await
            .expect("First invitation should succeed");

        let result = service
            .create(org.id, "GUEST@example.com", OrgRole::Viewer, owner.id)
            .await;
        match result {
            Err(DbError::Conflict(msg)) => {
                assert_eq!(msg, "An invitation has already been sent to this email");
            }
            other => panic!("Expected conflict, got {:?}", other.map(|i| i.id)),
        }
    }

    #[tokio::test]
    async fn test_revoke_scoped_to_org() {
        let (db, service) = setup(Arc::new(MemoryMailer::new())).await;
        let users = SqliteUserRepo::new(db.pool().clone());
        let owner = create_user(&users, "o@example.com").await;
        let org_a = create_org(db.pool(), "org-a", owner.id).await;
        let org_b = create_org(db.pool(), "org-b", owner.id).await;

        let invitation = service
            .create(org_a.id, "guest@example.com", OrgRole::Member, owner.id)
            .await
            .expect("Failed to create invitation");

        // Another org cannot revoke it
        let result = service.revoke(org_b.id, invitation.id).await;
        assert!(matches!(result, Err(DbError::NotFound)));

        service
            .revoke(org_a.id, invitation.id)
            .await
            .expect("Failed to revoke");
        assert!(service.list_pending(org_a.id).await.unwrap().is_empty());
    }
}
