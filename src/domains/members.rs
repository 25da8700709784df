//! Member domain: add, remove, and change roles within the active
//! organization. Every operation resolves tenant context first.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{
    action::{ActionError, ActionState, Outcome, RawInput, initial_state, normalize,
             parse_input, validate_input},
    registry::{FieldConfig, FieldKind, FormConfig, OperationConfig, SubmitConfig},
};
use crate::{
    auth::{SessionHandle, require_org_context},
    authz::{self, Permission},
    models::{OrgMember, OrgRole},
    services::Services,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberOperation {
    #[default]
    Add,
    Remove,
    UpdateRole,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MemberInput {
    pub operation: MemberOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<OrgRole>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberData {
    Added(OrgMember),
    Removed { user_id: Uuid },
    RoleUpdated(OrgMember),
}

const USER_ID_FIELD: FieldConfig =
    FieldConfig::text("user_id", "Member").with_kind(FieldKind::Hidden);
const ROLE_FIELD: FieldConfig = FieldConfig::text("role", "Role")
    .with_options(&["admin", "member", "viewer"]);

pub fn operation_config(operation: MemberOperation) -> OperationConfig {
    match operation {
        MemberOperation::Add => OperationConfig {
            label: "Add Member",
            description: "Add an existing user to this organization",
            fields: &[USER_ID_FIELD, ROLE_FIELD],
            submit: SubmitConfig {
                label: "Add Member",
                pending: "Adding...",
            },
            confirm_message: None,
        },
        MemberOperation::Remove => OperationConfig {
            label: "Remove Member",
            description: "Remove a member from this organization",
            fields: &[USER_ID_FIELD],
            submit: SubmitConfig {
                label: "Remove",
                pending: "Removing...",
            },
            confirm_message: Some("Are you sure you want to remove this member?"),
        },
        MemberOperation::UpdateRole => OperationConfig {
            label: "Change Role",
            description: "Change a member's role in this organization",
            fields: &[USER_ID_FIELD, ROLE_FIELD],
            submit: SubmitConfig {
                label: "Update Role",
                pending: "Updating...",
            },
            confirm_message: None,
        },
    }
}

pub fn form_config(operation: MemberOperation) -> FormConfig {
    operation_config(operation).form()
}

pub fn member_initial_state() -> ActionState<MemberData> {
    initial_state::<MemberData, MemberInput>()
}

/// Entry point for the member management form.
pub async fn action(
    services: &Services,
    handle: &mut SessionHandle,
    raw: RawInput,
) -> ActionState<MemberData> {
    let result = run(services, handle, &raw).await;
    normalize(result, &raw)
}

async fn run(
    services: &Services,
    handle: &mut SessionHandle,
    raw: &RawInput,
) -> Result<Outcome<MemberData>, ActionError> {
    let input: MemberInput = parse_input(raw)?;
    validate_input(&input)?;

    let context = require_org_context(handle).await?;

    let user_id = input
        .user_id
        .ok_or_else(|| ActionError::Invalid("User ID is required".to_string()))?;

    match input.operation {
        MemberOperation::Add => {
            require_permission(&context.role, Permission::MembersInvite)?;
            let role = input.role.unwrap_or(OrgRole::Member);
            let member = services.members.add(context.org_id, user_id, role).await?;
            Ok(Outcome::data("Member added", MemberData::Added(member)))
        }
        MemberOperation::Remove => {
            require_permission(&context.role, Permission::MembersRemove)?;
            services.members.remove(context.org_id, user_id).await?;
            Ok(Outcome::data(
                "Member removed",
                MemberData::Removed { user_id },
            ))
        }
        MemberOperation::UpdateRole => {
            require_permission(&context.role, Permission::MembersUpdateRole)?;
            let role = input
                .role
                .ok_or_else(|| ActionError::Invalid("Role is required".to_string()))?;
            let member = services
                .members
                .update_role(context.org_id, user_id, role)
                .await?;
            Ok(Outcome::data(
                "Member role updated",
                MemberData::RoleUpdated(member),
            ))
        }
    }
}

fn require_permission(role: &Option<OrgRole>, permission: Permission) -> Result<(), ActionError> {
    if !authz::has_permission(*role, permission) {
        return Err(ActionError::Forbidden(format!(
            "You do not have the {} permission in this organization",
            permission
        )));
    }
    Ok(())
}
