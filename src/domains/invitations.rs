//! Invitation domain: invite by email, accept a token, revoke a pending
//! invitation. Accepting is the one operation that runs without an
//! active organization, since the acceptor usually has none yet.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{
    action::{ActionError, ActionState, Outcome, RawInput, initial_state, normalize,
             parse_input, validate_input},
    org::refresh_claims_best_effort,
    registry::{FieldConfig, FieldKind, FormConfig, OperationConfig, SubmitConfig},
};
use crate::{
    auth::{SessionHandle, require_org_context},
    authz::{self, Permission},
    models::{Invitation, OrgRole},
    services::Services,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationOperation {
    #[default]
    Create,
    Accept,
    Revoke,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct InvitationInput {
    pub operation: InvitationOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<OrgRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationData {
    Sent(Invitation),
    Accepted { organization_id: Uuid, role: OrgRole },
    Revoked { id: Uuid },
}

const EMAIL_FIELD: FieldConfig = FieldConfig::text("email", "Email")
    .with_kind(FieldKind::Email)
    .with_placeholder("colleague@example.com");
const ROLE_FIELD: FieldConfig = FieldConfig::text("role", "Role")
    .with_options(&["admin", "member", "viewer"]);
const TOKEN_FIELD: FieldConfig =
    FieldConfig::text("token", "Invitation token").with_kind(FieldKind::Hidden);
const INVITATION_ID_FIELD: FieldConfig =
    FieldConfig::text("invitation_id", "Invitation").with_kind(FieldKind::Hidden);

pub fn operation_config(operation: InvitationOperation) -> OperationConfig {
    match operation {
        InvitationOperation::Create => OperationConfig {
            label: "Invite Member",
            description: "Send an invitation to join this organization",
            fields: &[EMAIL_FIELD, ROLE_FIELD],
            submit: SubmitConfig {
                label: "Send Invitation",
                pending: "Sending...",
            },
            confirm_message: None,
        },
        InvitationOperation::Accept => OperationConfig {
            label: "Accept Invitation",
            description: "Join the organization you were invited to",
            fields: &[TOKEN_FIELD],
            submit: SubmitConfig {
                label: "Accept",
                pending: "Joining...",
            },
            confirm_message: None,
        },
        InvitationOperation::Revoke => OperationConfig {
            label: "Revoke Invitation",
            description: "Revoke a pending invitation",
            fields: &[INVITATION_ID_FIELD],
            submit: SubmitConfig {
                label: "Revoke",
                pending: "Revoking...",
            },
            confirm_message: Some("Are you sure you want to revoke this invitation?"),
        },
    }
}

pub fn form_config(operation: InvitationOperation) -> FormConfig {
    operation_config(operation).form()
}

pub fn invitation_initial_state() -> ActionState<InvitationData> {
    initial_state::<InvitationData, InvitationInput>()
}

/// Entry point for the invitation form.
pub async fn action(
    services: &Services,
    handle: &mut SessionHandle,
    raw: RawInput,
) -> ActionState<InvitationData> {
    let result = run(services, handle, &raw).await;
    normalize(result, &raw)
}

async fn run(
    services: &Services,
    handle: &mut SessionHandle,
    raw: &RawInput,
) -> Result<Outcome<InvitationData>, ActionError> {
    let input: InvitationInput = parse_input(raw)?;
    validate_input(&input)?;

    match input.operation {
        InvitationOperation::Create => create(services, handle, input).await,
        InvitationOperation::Accept => accept(services, handle, input).await,
        InvitationOperation::Revoke => revoke(services, handle, input).await,
    }
}

async fn create(
    services: &Services,
    handle: &mut SessionHandle,
    input: InvitationInput,
) -> Result<Outcome<InvitationData>, ActionError> {
    let context = require_org_context(handle).await?;
    require_permission(&context.role, Permission::MembersInvite)?;

    let email = input
        .email
        .ok_or_else(|| ActionError::Invalid("Email is required".to_string()))?;
    let role = input.role.unwrap_or(OrgRole::Member);
    if role == OrgRole::Owner {
        return Err(ActionError::Invalid(
            "Cannot invite someone as the owner".to_string(),
        ));
    }

    let invitation = services
        .invitations
        .create(context.org_id, &email, role, context.user_id)
        .await?;

    Ok(Outcome::data("Invitation sent", InvitationData::Sent(invitation)))
}

async fn accept(
    services: &Services,
    handle: &mut SessionHandle,
    input: InvitationInput,
) -> Result<Outcome<InvitationData>, ActionError> {
    let token = input
        .token
        .ok_or_else(|| ActionError::Invalid("Invitation token is required".to_string()))?;

    let email = handle.email().to_string();
    let invitation = services
        .invitations
        .accept(token, handle.user_id(), &email)
        .await?;

    refresh_claims_best_effort(handle, "accept-invitation").await;

    Ok(Outcome::data(
        "Invitation accepted",
        InvitationData::Accepted {
            organization_id: invitation.organization_id,
            role: invitation.role,
        },
    ))
}

async fn revoke(
    services: &Services,
    handle: &mut SessionHandle,
    input: InvitationInput,
) -> Result<Outcome<InvitationData>, ActionError> {
    let context = require_org_context(handle).await?;
    require_permission(&context.role, Permission::MembersInvite)?;

    let id = input
        .invitation_id
        .ok_or_else(|| ActionError::Invalid("Invitation ID is required".to_string()))?;

    services.invitations.revoke(context.org_id, id).await?;

    Ok(Outcome::data("Invitation revoked", InvitationData::Revoked { id }))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_email_fails_validation_keyed_to_field() {
        let input = InvitationInput {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        match validate_input(&input) {
            Err(ActionError::Validation(errors)) => {
                assert_eq!(errors["email"], vec!["Invalid email address"]);
            }
            other => panic!("Expected validation error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_role_defaults_to_member() {
        let raw: RawInput = [("email".to_string(), "a@example.com".to_string())].into();
        let input: InvitationInput = parse_input(&raw).expect("Parse should succeed");
        assert_eq!(input.role, None);
        assert_eq!(input.role.unwrap_or(OrgRole::Member), OrgRole::Member);
    }

    #[test]
    fn test_malformed_token_is_rejected_at_parse() {
        let raw: RawInput = [
            ("operation".to_string(), "accept".to_string()),
            ("token".to_string(), "not-a-uuid".to_string()),
        ]
        .into();
        let result: Result<InvitationInput, _> = parse_input(&raw);
        assert!(matches!(result, Err(ActionError::Invalid(_))));
    }

    #[test]
    fn test_every_operation_has_a_form() {
        for operation in [
            InvitationOperation::Create,
            InvitationOperation::Accept,
            InvitationOperation::Revoke,
        ] {
            let form = form_config(operation);
            assert!(!form.fields.is_empty());
        }
    }
}
