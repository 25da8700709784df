use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::db::{error::DbResult, repos::PreferenceRepo};

pub struct SqlitePreferenceRepo {
    pool: SqlitePool,
}

impl SqlitePreferenceRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceRepo for SqlitePreferenceRepo {
    async fn get_current_org(&self, user_id: Uuid) -> DbResult<Option<Uuid>> {
        let result = sqlx::query(
            "SELECT current_organization_id FROM user_preferences WHERE user_id = ?",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match result {
            Some(row) => match row.get::<Option<String>, _>("current_organization_id") {
                Some(id) => Ok(Some(parse_uuid(&id)?)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    async fn set_current_org(&self, user_id: Uuid, organization_id: Uuid) -> DbResult<()> {
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
        .bind(organization_id.to_string())
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_if_current(&self, user_id: Uuid, organization_id: Uuid) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE user_preferences
            SET current_organization_id = NULL, updated_at = ?
            WHERE user_id = ? AND current_organization_id = ?
            "#,
        )
        .bind(chrono::Utc::now())
        .bind(user_id.to_string())
        .bind(organization_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        sqlite::SqliteUserRepo,
        tests::{create_org, create_user, test_pool},
    };

    #[tokio::test]
    async fn test_set_and_get_current_org() {
        let pool = test_pool().await;
        let user = create_user(&SqliteUserRepo::new(pool.clone()), "user@example.com").await;
        let org = create_org(&pool, "pref-test", user.id).await;
        let repo = SqlitePreferenceRepo::new(pool);

        repo.set_current_org(user.id, org.id)
            .await
            .expect("Failed to set preference");

        let current = repo
            .get_current_org(user.id)
            .await
            .expect("Query should succeed");
        assert_eq!(current, Some(org.id));
    }

    #[tokio::test]
    async fn test_set_is_idempotent() {
        let pool = test_pool().await;
        let user = create_user(&SqliteUserRepo::new(pool.clone()), "user@example.com").await;
        let org = create_org(&pool, "idem-test", user.id).await;
        let repo = SqlitePreferenceRepo::new(pool);

        repo.set_current_org(user.id, org.id)
            .await
            .expect("First set should succeed");
        repo.set_current_org(user.id, org.id)
            .await
            .expect("Second set should succeed");

        let current = repo.get_current_org(user.id).await.unwrap();
        assert_eq!(current, Some(org.id));
    }

    #[tokio::test]
    async fn test_clear_if_current_only_clears_matching() {
        let pool = test_pool().await;
        let user = create_user(&SqliteUserRepo::new(pool.clone()), "user@example.com").await;
        let org_a = create_org(&pool, "org-a", user.id).await;
        let org_b = create_org(&pool, "org-b", user.id).await;
        let repo = SqlitePreferenceRepo::new(pool);

        repo.set_current_org(user.id, org_a.id)
            .await
            .expect("Failed to set preference");

        // Clearing for a different organization leaves the selection alone
        repo.clear_if_current(user.id, org_b.id)
            .await
            .expect("Clear should succeed");
        assert_eq!(repo.get_current_org(user.id).await.unwrap(), Some(org_a.id));

        repo.clear_if_current(user.id, org_a.id)
            .await
            .expect("Clear should succeed");
        assert_eq!(repo.get_current_org(user.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_preference_is_none() {
        let pool = test_pool().await;
        let user = create_user(&SqliteUserRepo::new(pool.clone()), "user@example.com").await;
        let repo = SqlitePreferenceRepo::new(pool);

        let current = repo
            .get_current_org(user.id)
            .await
            .expect("Query should succeed");
        assert!(current.is_none());
    }
}
