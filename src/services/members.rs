use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{DbError, DbPool, DbResult},
    models::{AddMember, OrgMember, OrgMemberDetail, OrgRole},
};

#[derive(Clone)]
pub struct MemberService {
    db: Arc<DbPool>,
}

impl MemberService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn list(&self, organization_id: Uuid) -> DbResult<Vec<OrgMemberDetail>> {
        self.db.members().list_for_org(organization_id).await
    }

    /// Add an existing user directly. The owner role is reserved for the
    /// creation flow.
    pub async fn add(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> DbResult<OrgMember> {
        if role == OrgRole::Owner {
            return Err(DbError::Validation(
                "Cannot assign the owner role".to_string(),
            ));
        }
        self.db
            .members()
            .add(organization_id, AddMember { user_id, role })
            .await
    }

    pub async fn get(&self, organization_id: Uuid, user_id: Uuid) -> DbResult<Option<OrgMember>> {
        self.db.members().get(organization_id, user_id).await
    }

    /// Change a member's role. Owners cannot be demoted and the owner role
    /// cannot be granted here; ownership only moves through dedicated
    /// transfer flows.
    pub async fn update_role(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> DbResult<OrgMember> {
        if role == OrgRole::Owner {
            return Err(DbError::Validation(
                "Cannot assign the owner role".to_string(),
            ));
        }

        let member = self
            .db
            .members()
            .get(organization_id, user_id)
            .await?
            .ok_or(DbError::NotFound)?;
        if member.role == OrgRole::Owner {
            return Err(DbError::Validation(
                "The organization owner's role cannot be changed".to_string(),
            ));
        }

        self.db
            .members()
            .update_role(organization_id, user_id, role)
            .await
    }

    /// Remove a member. The owner stays.
    pub async fn remove(&self, organization_id: Uuid, user_id: Uuid) -> DbResult<()> {
        let member = self
            .db
            .members()
            .get(organization_id, user_id)
            .await?
            .ok_or(DbError::NotFound)?;
        if member.role == OrgRole::Owner {
            return Err(DbError::Validation(
                "The organization owner cannot be removed".to_string(),
            ));
        }

        self.db.members().remove(organization_id, user_id).await
    }
}
