use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{DbError, DbPool, DbResult},
    models::{CreateProject, Project, UpdateProject},
};

#[derive(Clone)]
pub struct ProjectService {
    db: Arc<DbPool>,
}

impl ProjectService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        organization_id: Uuid,
        created_by: Uuid,
        input: CreateProject,
    ) -> DbResult<Project> {
        self.db
            .projects()
            .create(organization_id, created_by, input)
            .await
    }

    pub async fn get(&self, organization_id: Uuid, id: Uuid) -> DbResult<Project> {
        self.db
            .projects()
            .get(organization_id, id)
            .await?
            .ok_or(DbError::NotFound)
    }

    pub async fn list(&self, organization_id: Uuid) -> DbResult<Vec<Project>> {
        self.db.projects().list_for_org(organization_id).await
    }

    pub async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: UpdateProject,
    ) -> DbResult<Project> {
        if input.is_empty() {
            return Err(DbError::Validation("No fields to update".to_string()));
        }
        self.db.projects().update(organization_id, id, input).await
    }

    pub async fn delete(&self, organization_id: Uuid, id: Uuid) -> DbResult<()> {
        self.db.projects().delete(organization_id, id).await
    }
}
