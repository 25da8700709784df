use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{parse_role, parse_status, parse_uuid};
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::InvitationRepo,
    },
    models::{Invitation, InvitationStatus, NewInvitation},
};

pub struct SqliteInvitationRepo {
    pool: SqlitePool,
}

impl SqliteInvitationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_invitation(row: &sqlx::sqlite::SqliteRow) -> DbResult<Invitation> {
    Ok(Invitation {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        organization_id: parse_uuid(&row.get::<String, _>("organization_id"))?,
        email: row.get("email"),
        role: parse_role(&row.get::<String, _>("role"))?,
        token: parse_uuid(&row.get::<String, _>("token"))?,
        status: parse_status(&row.get::<String, _>("status"))?,
        expires_at: row.get("expires_at"),
        invited_by: parse_uuid(&row.get::<String, _>("invited_by"))?,
        created_at: row.get("created_at"),
    })
}

const SELECT_COLS: &str =
    "id, organization_id, email, role, token, status, expires_at, invited_by, created_at";

#[async_trait]
impl InvitationRepo for SqliteInvitationRepo {
    async fn create(&self, organization_id: Uuid, input: NewInvitation) -> DbResult<Invitation> {
        let id = Uuid::new_v4();
        let token = Uuid::new_v4();
        let now = chrono::Utc::now();
        let email = input.email.to_lowercase();

        sqlx::query(
            r#"
            INSERT INTO organization_invitations
                (id, organization_id, email, role, token, status, expires_at, invited_by, created_at)
            VALUES (?, ?, ?, ?, ?, 'pending', ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(organization_id.to_string())
        .bind(&email)
        .bind(input.role.as_str())
        .bind(token.to_string())
        .bind(input.expires_at)
        .bind(input.invited_by.to_string())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::Conflict("An invitation has already been sent to this email".to_string())
            }
            _ => DbError::from(e),
        })?;

        Ok(Invitation {
            id,
            organization_id,
            email,
            role: input.role,
            token,
            status: InvitationStatus::Pending,
            expires_at: input.expires_at,
            invited_by: input.invited_by,
            created_at: now,
        })
    }

    async fn get_by_token(&self, token: Uuid) -> DbResult<Option<Invitation>> {
        let result = sqlx::query(&format!(
            "SELECT {} FROM organization_invitations WHERE token = ?",
            SELECT_COLS
        ))
        .bind(token.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match result {
            Some(row) => Ok(Some(row_to_invitation(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_pending(&self, organization_id: Uuid) -> DbResult<Vec<Invitation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM organization_invitations
            WHERE organization_id = ? AND status = 'pending'
            ORDER BY created_at DESC, id DESC
            "#,
            SELECT_COLS
        ))
        .bind(organization_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_invitation).collect()
    }

    async fn accept(&self, token: Uuid, user_id: Uuid, user_email: &str) -> DbResult<Invitation> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM organization_invitations WHERE token = ?",
            SELECT_COLS
        ))
        .bind(token.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        let invitation = match row {
            Some(row) => row_to_invitation(&row)?,
            None => return Err(DbError::NotFound),
        };

        if invitation.status != InvitationStatus::Pending {
            return Err(DbError::Validation(
                "Invitation not found or already used".to_string(),
            ));
        }
        if invitation.expires_at < chrono::Utc::now() {
            return Err(DbError::Validation("Invitation has expired".to_string()));
        }
        if invitation.email != user_email.to_lowercase() {
            return Err(DbError::Validation(
                "Invitation email does not match your account".to_string(),
            ));
        }

        let now = chrono::Utc::now();

        // Membership role comes from the stored invitation, never the caller.
        sqlx::query(
            r#"
            INSERT INTO organization_members (id, organization_id, user_id, role, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(invitation.organization_id.to_string())
        .bind(user_id.to_string())
        .bind(invitation.role.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::Conflict("User is already a member of this organization".to_string())
            }
            _ => DbError::from(e),
        })?;

        sqlx::query("UPDATE organization_invitations SET status = 'accepted' WHERE id = ?")
            .bind(invitation.id.to_string())
            .execute(&mut *tx)
            .await?;

        // The accepter lands in the organization they just joined.
        sqlx::query(
            r#"
            INSERT INTO user_preferences (user_id, current_organization_id, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE
            SET current_organization_id = excluded.current_organization_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id.to_string())
        .bind(invitation.organization_id.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Invitation {
            status: InvitationStatus::Accepted,
            ..invitation
        })
    }

    async fn revoke(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE organization_invitations SET status = 'revoked' WHERE id = ? AND status = 'pending'",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM organization_invitations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::db::{
        sqlite::SqliteUserRepo,
        tests::{create_org, create_user, test_pool},
    };
    use crate::models::OrgRole;

    fn new_invitation(email: &str, invited_by: Uuid) -> NewInvitation {
        NewInvitation {
            email: email.to_string(),
            role: OrgRole::Member,
            invited_by,
            expires_at: Utc::now() + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn test_create_invitation() {
        let pool = test_pool().await;
        let owner = create_user(&SqliteUserRepo::new(pool.clone()), "owner@example.com").await;
        let org = create_org(&pool, "invite-test", owner.id).await;
        let repo = SqliteInvitationRepo::new(pool);

        let invitation = repo
            .create(org.id, new_invitation("Guest@Example.com", owner.id))
            .await
            .expect("Failed to create invitation");

        assert_eq!(invitation.email, "guest@example.com");
        assert_eq!(invitation.status, InvitationStatus::Pending);
        assert_eq!(invitation.role, OrgRole::Member);
    }

    #[tokio::test]
    async fn test_duplicate_pending_invitation_fails() {
        let pool = test_pool().await;
        let owner = create_user(&SqliteUserRepo::new(pool.clone()), "owner@example.com").await;
        let org = create_org(&pool, "dup-invite", owner.id).await;
        let repo = SqliteInvitationRepo::new(pool);

        repo.create(org.id, new_invitation("guest@example.com", owner.id))
            .await
            .expect("Failed to create invitation");

        let result = repo
            .create(org.id, new_invitation("guest@example.com", owner.id))
            .await;

        match result {
            Err(DbError::Conflict(msg)) => {
                assert_eq!(msg, "An invitation has already been sent to this email");
            }
            other => panic!("Expected conflict, got {:?}", other.map(|i| i.id)),
        }
    }

    #[tokio::test]
    async fn test_resolved_invitation_frees_the_email() {
        let pool = test_pool().await;
        let owner = create_user(&SqliteUserRepo::new(pool.clone()), "owner@example.com").await;
        let org = create_org(&pool, "free-email", owner.id).await;
        let repo = SqliteInvitationRepo::new(pool);

        let first = repo
            .create(org.id, new_invitation("guest@example.com", owner.id))
            .await
            .expect("Failed to create invitation");
        repo.revoke(first.id).await.expect("Failed to revoke");

        // The pending-only uniqueness rule lets a fresh invitation through
        repo.create(org.id, new_invitation("guest@example.com", owner.id))
            .await
            .expect("Second invitation should be allowed after revocation");
    }

    #[tokio::test]
    async fn test_accept_creates_membership_and_preference() {
        let pool = test_pool().await;
        let users = SqliteUserRepo::new(pool.clone());
        let owner = create_user(&users, "owner@example.com").await;
        let guest = create_user(&users, "guest@example.com").await;
        let org = create_org(&pool, "accept-test", owner.id).await;
        let repo = SqliteInvitationRepo::new(pool.clone());

        let invitation = repo
            .create(org.id, new_invitation("guest@example.com", owner.id))
            .await
            .expect("Failed to create invitation");

        let accepted = repo
            .accept(invitation.token, guest.id, "guest@example.com")
            .await
            .expect("Failed to accept invitation");

        assert_eq!(accepted.status, InvitationStatus::Accepted);

        let member = sqlx::query(
            "SELECT role FROM organization_members WHERE organization_id = ? AND user_id = ?",
        )
        .bind(org.id.to_string())
        .bind(guest.id.to_string())
        .fetch_one(&pool)
        .await
        .expect("Membership should exist");
        assert_eq!(member.get::<String, _>("role"), "member");

        let pref = sqlx::query("SELECT current_organization_id FROM user_preferences WHERE user_id = ?")
            .bind(guest.id.to_string())
            .fetch_one(&pool)
            .await
            .expect("Preference should exist");
        assert_eq!(
            pref.get::<String, _>("current_organization_id"),
            org.id.to_string()
        );
    }

    #[tokio::test]
    async fn test_accept_wrong_email_fails() {
        let pool = test_pool().await;
        let users = SqliteUserRepo::new(pool.clone());
        let owner = create_user(&users, "owner@example.com").await;
        let other = create_user(&users, "other@example.com").await;
        let org = create_org(&pool, "wrong-email", owner.id).await;
        let repo = SqliteInvitationRepo::new(pool);

        let invitation = repo
            .create(org.id, new_invitation("guest@example.com", owner.id))
            .await
            .expect("Failed to create invitation");

        let result = repo
            .accept(invitation.token, other.id, "other@example.com")
            .await;
        assert!(matches!(result, Err(DbError::Validation(_))));
    }

    #[tokio::test]
    async fn test_accept_expired_fails() {
        let pool = test_pool().await;
        let users = SqliteUserRepo::new(pool.clone());
        let owner = create_user(&users, "owner@example.com").await;
        let guest = create_user(&users, "guest@example.com").await;
        let org = create_org(&pool, "expired", owner.id).await;
        let repo = SqliteInvitationRepo::new(pool);

        let invitation = repo
            .create(
                org.id,
                NewInvitation {
                    email: "guest@example.com".to_string(),
                    role: OrgRole::Member,
                    invited_by: owner.id,
                    expires_at: Utc::now() - Duration::hours(1),
                },
            )
            .await
            .expect("Failed to create invitation");

        let result = repo
            .accept(invitation.token, guest.id, "guest@example.com")
            .await;

        match result {
            Err(DbError::Validation(msg)) => assert_eq!(msg, "Invitation has expired"),
            other => panic!("Expected validation error, got {:?}", other.map(|i| i.id)),
        }
    }

    #[tokio::test]
    async fn test_accept_twice_fails() {
        let pool = test_pool().await;
        let users = SqliteUserRepo::new(pool.clone());
        let owner = create_user(&users, "owner@example.com").await;
        let guest = create_user(&users, "guest@example.com").await;
        let org = create_org(&pool, "double-accept", owner.id).await;
        let repo = SqliteInvitationRepo::new(pool);

        let invitation = repo
            .create(org.id, new_invitation("guest@example.com", owner.id))
            .await
            .expect("Failed to create invitation");

        repo.accept(invitation.token, guest.id, "guest@example.com")
            .await
            .expect("First accept should succeed");

        let result = repo
            .accept(invitation.token, guest.id, "guest@example.com")
            .await;
        assert!(matches!(result, Err(DbError::Validation(_))));
    }

    #[tokio::test]
    async fn test_accept_unknown_token() {
        let repo = SqliteInvitationRepo::new(test_pool().await);

        let result = repo
            .accept(Uuid::new_v4(), Uuid::new_v4(), "nobody@example.com")
            .await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    #[tokio::test]
    async fn test_revoke_then_accept_fails() {
        let pool = test_pool().await;
        let users = SqliteUserRepo::new(pool.clone());
        let owner = create_user(&users, "owner@example.com").await;
        let guest = create_user(&users, "guest@example.com").await;
        let org = create_org(&pool, "revoked", owner.id).await;
        let repo = SqliteInvitationRepo::new(pool);

        let invitation = repo
            .create(org.id, new_invitation("guest@example.com", owner.id))
            .await
            .expect("Failed to create invitation");

        repo.revoke(invitation.id).await.expect("Failed to revoke");

        let result = repo
            .accept(invitation.token, guest.id, "guest@example.com")
            .await;
        assert!(matches!(result, Err(DbError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_pending_excludes_resolved() {
        let pool = test_pool().await;
        let owner = create_user(&SqliteUserRepo::new(pool.clone()), "owner@example.com").await;
        let org = create_org(&pool, "pending-list", owner.id).await;
        let repo = SqliteInvitationRepo::new(pool);

        let first = repo
            .create(org.id, new_invitation("a@example.com", owner.id))
            .await
            .expect("Failed to create invitation");
        repo.create(org.id, new_invitation("b@example.com", owner.id))
            .await
            .expect("Failed to create invitation");

        repo.revoke(first.id).await.expect("Failed to revoke");

        let pending = repo.list_pending(org.id).await.expect("Failed to list");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].email, "b@example.com");
    }

    #[tokio::test]
    async fn test_delete_invitation() {
        let pool = test_pool().await;
        let owner = create_user(&SqliteUserRepo::new(pool.clone()), "owner@example.com").await;
        let org = create_org(&pool, "delete-invite", owner.id).await;
        let repo = SqliteInvitationRepo::new(pool);

        let invitation = repo
            .create(org.id, new_invitation("gone@example.com", owner.id))
            .await
            .expect("Failed to create invitation");

        repo.delete(invitation.id).await.expect("Failed to delete");

        let result = repo
            .get_by_token(invitation.token)
            .await
            .expect("Query should succeed");
        assert!(result.is_none());
    }
}
