use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::OrganizationRepo,
    },
    models::{CreateOrganization, Organization, OrgRole, UpdateOrganization},
};

pub struct SqliteOrganizationRepo {
    pool: SqlitePool,
}

impl SqliteOrganizationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_org(row: &sqlx::sqlite::SqliteRow) -> DbResult<Organization> {
    Ok(Organization {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        slug: row.get("slug"),
        name: row.get("name"),
        logo_url: row.get("logo_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl OrganizationRepo for SqliteOrganizationRepo {
    async fn create_with_owner(
        &self,
        input: CreateOrganization,
        owner_id: Uuid,
    ) -> DbResult<Organization> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO organizations (id, slug, name, logo_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&input.slug)
        .bind(&input.name)
        .bind(&input.logo_url)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DbError::Conflict(
                format!("Organization with slug '{}' already exists", input.slug),
            ),
            _ => DbError::from(e),
        })?;

        sqlx::query(
            r#"
            INSERT INTO organization_members (id, organization_id, user_id, role, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .bind(OrgRole::Owner.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // The creator lands in the new organization immediately.
        sqlx::query(
            r#"
            INSERT INTO user_preferences (user_id, current_organization_id, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE
            SET current_organization_id = excluded.current_organization_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(owner_id.to_string())
        .bind(id.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Organization {
            id,
            slug: input.slug,
            name: input.name,
            logo_url: input.logo_url,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Organization>> {
        let result = sqlx::query(
            r#"
            SELECT id, slug, name, logo_url, created_at, updated_at
            FROM organizations
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match result {
            Some(row) => Ok(Some(row_to_org(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Organization>> {
        let result = sqlx::query(
            r#"
            SELECT id, slug, name, logo_url, created_at, updated_at
            FROM organizations
            WHERE slug = ?
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        match result {
            Some(row) => Ok(Some(row_to_org(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<Organization>> {
        let rows = sqlx::query(
            r#"
            SELECT o.id, o.slug, o.name, o.logo_url, o.created_at, o.updated_at
            FROM organizations o
            JOIN organization_members m ON m.organization_id = o.id
            WHERE m.user_id = ?
            ORDER BY m.created_at DESC, o.id DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_org).collect()
    }

    async fn update(&self, id: Uuid, input: UpdateOrganization) -> DbResult<Organization> {
        if input.is_empty() {
            return Err(DbError::Validation("No fields to update".to_string()));
        }

        let now = chrono::Utc::now();
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = ?");
        }
        if input.slug.is_some() {
            sets.push("slug = ?");
        }
        if input.logo_url.is_some() {
            sets.push("logo_url = ?");
        }
        sets.push("updated_at = ?");

        let sql = format!("UPDATE organizations SET {} WHERE id = ?", sets.join(", "));

        let mut query = sqlx::query(&sql);
        if let Some(name) = &input.name {
            query = query.bind(name);
        }
        if let Some(slug) = &input.slug {
            query = query.bind(slug);
        }
        if let Some(logo_url) = &input.logo_url {
            query = query.bind(logo_url);
        }
        let result = query
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    DbError::Conflict("Organization with this slug already exists".to_string())
                }
                _ => DbError::from(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}
