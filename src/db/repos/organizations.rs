use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{CreateOrganization, Organization, UpdateOrganization},
};

#[async_trait]
pub trait OrganizationRepo: Send + Sync {
    /// Atomically create an organization, add `owner_id` as its owner, and
    /// point the owner's current-organization preference at it. Either all
    /// three writes land or none do.
    async fn create_with_owner(
        &self,
        input: CreateOrganization,
        owner_id: Uuid,
    ) -> DbResult<Organization>;

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Organization>>;

    async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Organization>>;

    /// Organizations the user is a member of, newest membership first.
    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<Organization>>;

    /// Partial update; fields left as `None` are untouched.
    async fn update(&self, id: Uuid, input: UpdateOrganization) -> DbResult<Organization>;

    /// Hard delete. Memberships, invitations, and projects go with it.
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}
