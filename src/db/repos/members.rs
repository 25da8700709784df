use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{AddMember, OrgMember, OrgMemberDetail, OrgRole},
};

#[async_trait]
pub trait MemberRepo: Send + Sync {
    /// Add a user to an organization. Fails with a conflict when a
    /// membership already exists.
    async fn add(&self, organization_id: Uuid, input: AddMember) -> DbResult<OrgMember>;

    async fn get(&self, organization_id: Uuid, user_id: Uuid) -> DbResult<Option<OrgMember>>;

    /// Members of an organization with their account emails, oldest first.
    async fn list_for_org(&self, organization_id: Uuid) -> DbResult<Vec<OrgMemberDetail>>;

    /// All memberships held by a user, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<OrgMember>>;

    async fn update_role(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> DbResult<OrgMember>;

    async fn remove(&self, organization_id: Uuid, user_id: Uuid) -> DbResult<()>;

    async fn count_for_org(&self, organization_id: Uuid) -> DbResult<i64>;
}
