use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{CreateProject, Project, UpdateProject},
};

/// All operations are scoped by organization so a caller can never reach
/// a project across tenant boundaries.
#[async_trait]
pub trait ProjectRepo: Send + Sync {
    async fn create(
        &self,
        organization_id: Uuid,
        created_by: Uuid,
        input: CreateProject,
    ) -> DbResult<Project>;

    async fn get(&self, organization_id: Uuid, id: Uuid) -> DbResult<Option<Project>>;

    /// Projects in an organization, newest first.
    async fn list_for_org(&self, organization_id: Uuid) -> DbResult<Vec<Project>>;

    async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: UpdateProject,
    ) -> DbResult<Project>;

    async fn delete(&self, organization_id: Uuid, id: Uuid) -> DbResult<()>;

    async fn count_for_org(&self, organization_id: Uuid) -> DbResult<i64>;
}
