use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{parse_role, parse_uuid};
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::MemberRepo,
    },
    models::{AddMember, OrgMember, OrgMemberDetail, OrgRole},
};

pub struct SqliteMemberRepo {
    pool: SqlitePool,
}

impl SqliteMemberRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_member(row: &sqlx::sqlite::SqliteRow) -> DbResult<OrgMember> {
    Ok(OrgMember {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        organization_id: parse_uuid(&row.get::<String, _>("organization_id"))?,
        user_id: parse_uuid(&row.get::<String, _>("user_id"))?,
        role: parse_role(&row.get::<String, _>("role"))?,
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl MemberRepo for SqliteMemberRepo {
    async fn add(&self, organization_id: Uuid, input: AddMember) -> DbResult<OrgMember> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        sqlx::query(
            r#"
            INSERT INTO organization_members (id, organization_id, user_id, role, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(organization_id.to_string())
        .bind(input.user_id.to_string())
        .bind(input.role.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::Conflict("User is already a member of this organization".to_string())
            }
            _ => DbError::from(e),
        })?;

        Ok(OrgMember {
            id,
            organization_id,
            user_id: input.user_id,
            role: input.role,
            created_at: now,
        })
    }

    async fn get(&self, organization_id: Uuid, user_id: Uuid) -> DbResult<Option<OrgMember>> {
        let result = sqlx::query(
            r#"
            SELECT id, organization_id, user_id, role, created_at
            FROM organization_members
            WHERE organization_id = ? AND user_id = ?
            "#,
        )
        .bind(organization_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match result {
            Some(row) => Ok(Some(row_to_member(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_for_org(&self, organization_id: Uuid) -> DbResult<Vec<OrgMemberDetail>> {
        let rows = sqlx::query(
            r#"
            SELECT m.user_id, u.email, m.role, m.created_at
            FROM organization_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.organization_id = ?
            ORDER BY m.created_at ASC, m.id ASC
            "#,
        )
        .bind(organization_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OrgMemberDetail {
                    user_id: parse_uuid(&row.get::<String, _>("user_id"))?,
                    email: row.get("email"),
                    role: parse_role(&row.get::<String, _>("role"))?,
                    joined_at: row.get("created_at"),
                })
            })
            .collect()
    }

    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<OrgMember>> {
        let rows = sqlx::query(
            r#"
            SELECT id, organization_id, user_id, role, created_at
            FROM organization_members
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_member).collect()
    }

    async fn update_role(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> DbResult<OrgMember> {
        let result = sqlx::query(
            r#"
            UPDATE organization_members
            SET role = ?
            WHERE organization_id = ? AND user_id = ?
            "#,
        )
        .bind(role.as_str())
        .bind(organization_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get(organization_id, user_id)
            .await?
            .ok_or(DbError::NotFound)
    }

    async fn remove(&self, organization_id: Uuid, user_id: Uuid) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM organization_members
            WHERE organization_id = ? AND user_id = ?
            "#,
        )
        .bind(organization_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn count_for_org(&self, organization_id: Uuid) -> DbResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM organization_members WHERE organization_id = ?",
        )
        .bind(organization_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("count"))
    }
}
