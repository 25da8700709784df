use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::ProjectRepo,
    },
    models::{CreateProject, Project, UpdateProject},
};

pub struct SqliteProjectRepo {
    pool: SqlitePool,
}

impl SqliteProjectRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_project(row: &sqlx::sqlite::SqliteRow) -> DbResult<Project> {
    Ok(Project {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        organization_id: parse_uuid(&row.get::<String, _>("organization_id"))?,
        name: row.get("name"),
        description: row.get("description"),
        created_by: parse_uuid(&row.get::<String, _>("created_by"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl ProjectRepo for SqliteProjectRepo {
    async fn create(
        &self,
        organization_id: Uuid,
        created_by: Uuid,
        input: CreateProject,
    ) -> DbResult<Project> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        sqlx::query(
            r#"
            INSERT INTO projects
                (id, organization_id, name, description, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(organization_id.to_string())
        .bind(&input.name)
        .bind(&input.description)
        .bind(created_by.to_string())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Project {
            id,
            organization_id,
            name: input.name,
            description: input.description,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get(&self, organization_id: Uuid, id: Uuid) -> DbResult<Option<Project>> {
        let result = sqlx::query(
            r#"
            SELECT id, organization_id, name, description, created_by, created_at, updated_at
            FROM projects
            WHERE organization_id = ? AND id = ?
            "#,
        )
        .bind(organization_id.to_string())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match result {
            Some(row) => Ok(Some(row_to_project(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_for_org(&self, organization_id: Uuid) -> DbResult<Vec<Project>> {
        let rows = sqlx::query(
            r#"
            SELECT id, organization_id, name, description, created_by, created_at, updated_at
            FROM projects
            WHERE organization_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(organization_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_project).collect()
    }

    async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: UpdateProject,
    ) -> DbResult<Project> {
        if input.is_empty() {
            return Err(DbError::Validation("No fields to update".to_string()));
        }

        let now = chrono::Utc::now();
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = ?");
        }
        if input.description.is_some() {
            sets.push("description = ?");
        }
        sets.push("updated_at = ?");

        let sql = format!(
            "UPDATE projects SET {} WHERE organization_id = ? AND id = ?",
            sets.join(", ")
        );

        let mut query = sqlx::query(&sql);
        if let Some(name) = &input.name {
            query = query.bind(name);
        }
        if let Some(description) = &input.description {
            query = query.bind(description);
        }
        let result = query
            .bind(now)
            .bind(organization_id.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get(organization_id, id).await?.ok_or(DbError::NotFound)
    }

    async fn delete(&self, organization_id: Uuid, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE organization_id = ? AND id = ?")
            .bind(organization_id.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn count_for_org(&self, organization_id: Uuid) -> DbResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM projects WHERE organization_id = ?")
            .bind(organization_id.to_string())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("count"))
    }
}
