use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{DbError, DbPool, DbResult},
    models::{CreateOrganization, Organization, OrgMember, OrgSummary, UpdateOrganization},
};

#[derive(Clone)]
pub struct OrganizationService {
    db: Arc<DbPool>,
}

impl OrganizationService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Create an organization with `owner_id` as its owner. One transaction
    /// covers the org row, the owner membership, and the owner's
    /// current-organization preference.
    pub async fn create(
        &self,
        input: CreateOrganization,
        owner_id: Uuid,
    ) -> DbResult<Organization> {
        self.db
            .organizations()
            .create_with_owner(input, owner_id)
            .await
    }

    pub async fn get(&self, id: Uuid) -> DbResult<Organization> {
        self.db
            .organizations()
            .get_by_id(id)
            .await?
            .ok_or(DbError::NotFound)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<Organization>> {
        self.db.organizations().list_for_user(user_id).await
    }

    /// Organization plus its headline counts, fetched concurrently.
    pub async fn summary(&self, id: Uuid) -> DbResult<OrgSummary> {
        let organization = self.get(id);
        let members = self.db.members();
        let projects = self.db.projects();
        let member_count = members.count_for_org(id);
        let project_count = projects.count_for_org(id);

        let (organization, member_count, project_count) =
            tokio::try_join!(organization, member_count, project_count)?;

        Ok(OrgSummary {
            organization,
            member_count,
            project_count,
        })
    }

    pub async fn update(&self, id: Uuid, input: UpdateOrganization) -> DbResult<Organization> {
        if input.is_empty() {
            return Err(DbError::Validation("No fields to update".to_string()));
        }
        self.db.organizations().update(id, input).await
    }

    /// Point the user's current organization at `organization_id`, after
    /// checking they actually belong to it. Safe to repeat.
    pub async fn switch(&self, user_id: Uuid, organization_id: Uuid) -> DbResult<OrgMember> {
        let membership = self
            .db
            .members()
            .get(organization_id, user_id)
            .await?
            .ok_or_else(|| {
                DbError::Validation("You are not a member of this organization".to_string())
            })?;

        self.db
            .preferences()
            .set_current_org(user_id, organization_id)
            .await?;

        Ok(membership)
    }

    /// Delete the organization; dependent rows cascade. Clearing the
    /// actor's preference afterwards is best effort and never fails the
    /// deletion itself.
    pub async fn delete(&self, id: Uuid, actor_id: Uuid) -> DbResult<()> {
        self.db.organizations().delete(id).await?;

        if let Err(e) = self.db.preferences().clear_if_current(actor_id, id).await {
            tracing::warn!(
                organization_id = %id,
                user_id = %actor_id,
                error = %e,
                "Failed to clear organization preference after deletion"
            );
        }

        Ok(())
    }
}
