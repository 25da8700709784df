//! Organization domain: create, update, switch, delete.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{
    action::{ActionError, ActionState, Outcome, RawInput, initial_state, normalize,
             parse_input, validate_input},
    registry::{FieldConfig, FieldKind, FormConfig, OperationConfig, SubmitConfig},
};
use crate::{
    authz::Permission,
    auth::SessionHandle,
    models::{
        CreateOrganization, Organization, OrgRole, UpdateOrganization,
        validators::{slugify, validate_display_name, validate_slug},
    },
    services::Services,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgOperation {
    #[default]
    Create,
    Update,
    Switch,
    Delete,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OrgInput {
    pub operation: OrgOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_display_name"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Invalid URL format"))]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgData {
    Created(Organization),
    Updated(Organization),
    Switched { org_id: Uuid, role: OrgRole },
    Deleted { org_id: Uuid },
}

const NAME_FIELD: FieldConfig = FieldConfig::text("name", "Organization Name")
    .with_placeholder("Acme Inc.");
const SLUG_FIELD: FieldConfig = FieldConfig::text("slug", "Slug (optional)")
    .with_placeholder("acme-inc");
const LOGO_FIELD: FieldConfig = FieldConfig::text("logo_url", "Logo URL")
    .with_kind(FieldKind::Url);
const ORG_ID_FIELD: FieldConfig =
    FieldConfig::text("org_id", "Organization").with_kind(FieldKind::Hidden);

pub fn operation_config(operation: OrgOperation) -> OperationConfig {
    match operation {
        OrgOperation::Create => OperationConfig {
            label: "Create Organization",
            description: "Create a new organization workspace",
            fields: &[NAME_FIELD, SLUG_FIELD, LOGO_FIELD],
            submit: SubmitConfig {
                label: "Create Organization",
                pending: "Creating...",
            },
            confirm_message: None,
        },
        OrgOperation::Update => OperationConfig {
            label: "Update Organization",
            description: "Update organization settings",
            fields: &[ORG_ID_FIELD, NAME_FIELD, SLUG_FIELD, LOGO_FIELD],
            submit: SubmitConfig {
                label: "Save Changes",
                pending: "Saving...",
            },
            confirm_message: None,
        },
        OrgOperation::Switch => OperationConfig {
            label: "Switch Organization",
            description: "Switch to a different organization",
            fields: &[ORG_ID_FIELD],
            submit: SubmitConfig {
                label: "Switch",
                pending: "Switching...",
            },
            confirm_message: None,
        },
        OrgOperation::Delete => OperationConfig {
            label: "Delete Organization",
            description: "Permanently delete this organization and all its data",
            fields: &[ORG_ID_FIELD],
            submit: SubmitConfig {
                label: "Delete Organization",
                pending: "Deleting...",
            },
            confirm_message: Some(
                "Are you sure you want to delete this organization? This action cannot be undone.",
            ),
        },
    }
}

pub fn form_config(operation: OrgOperation) -> FormConfig {
    operation_config(operation).form()
}

pub fn org_initial_state() -> ActionState<OrgData> {
    initial_state::<OrgData, OrgInput>()
}

/// Entry point for the organization form.
pub async fn action(
    services: &Services,
    handle: &mut SessionHandle,
    raw: RawInput,
) -> ActionState<OrgData> {
    let result = run(services, handle, &raw).await;
    normalize(result, &raw)
}

async fn run(
    services: &Services,
    handle: &mut SessionHandle,
    raw: &RawInput,
) -> Result<Outcome<OrgData>, ActionError> {
    let input: OrgInput = parse_input(raw)?;
    validate_input(&input)?;

    match input.operation {
        OrgOperation::Create => create(services, handle, input).await,
        OrgOperation::Update => update(services, handle, input).await,
        OrgOperation::Switch => switch(services, handle, input).await,
        OrgOperation::Delete => delete(services, handle, input).await,
    }
}

async fn create(
    services: &Services,
    handle: &mut SessionHandle,
    input: OrgInput,
) -> Result<Outcome<OrgData>, ActionError> {
    let name = input
        .name
        .ok_or_else(|| ActionError::Invalid("Organization name is required".to_string()))?;

    let slug = match input.slug {
        Some(slug) => slug,
        None => {
            let derived = slugify(&name);
            if derived.is_empty() {
                return Err(ActionError::Invalid(
                    "Could not derive a slug from the organization name".to_string(),
                ));
            }
            derived
        }
    };

    let org = services
        .organizations
        .create(
            CreateOrganization {
                name,
                slug,
                logo_url: input.logo_url,
            },
            handle.user_id(),
        )
        .await?;

    refresh_claims_best_effort(handle, "create").await;

    Ok(Outcome::data("Organization created", OrgData::Created(org)))
}

async fn update(
    services: &Services,
    handle: &mut SessionHandle,
    input: OrgInput,
) -> Result<Outcome<OrgData>, ActionError> {
    let org_id = require_org_id(input.org_id)?;
    require_org_permission(services, handle, org_id, Permission::OrgUpdate).await?;

    let org = services
        .organizations
        .update(
            org_id,
            UpdateOrganization {
                name: input.name,
                slug: input.slug,
                logo_url: input.logo_url,
            },
        )
        .await?;

    Ok(Outcome::data("Organization updated", OrgData::Updated(org)))
}

async fn switch(
    services: &Services,
    handle: &mut SessionHandle,
    input: OrgInput,
) -> Result<Outcome<OrgData>, ActionError> {
    let org_id = require_org_id(input.org_id)?;

    let membership = services
        .organizations
        .switch(handle.user_id(), org_id)
        .await?;

    refresh_claims_best_effort(handle, "switch").await;

    Ok(Outcome::data(
        "Switched organization",
        OrgData::Switched {
            org_id,
            role: membership.role,
        },
    ))
}

async fn delete(
    services: &Services,
    handle: &mut SessionHandle,
    input: OrgInput,
) -> Result<Outcome<OrgData>, ActionError> {
    let org_id = require_org_id(input.org_id)?;
    require_org_permission(services, handle, org_id, Permission::OrgDelete).await?;

    services
        .organizations
        .delete(org_id, handle.user_id())
        .await?;

    refresh_claims_best_effort(handle, "delete").await;

    Ok(Outcome::data("Organization deleted", OrgData::Deleted { org_id }))
}

fn require_org_id(org_id: Option<Uuid>) -> Result<Uuid, ActionError> {
    org_id.ok_or_else(|| ActionError::Invalid("Organization ID is required".to_string()))
}

/// Check the caller's membership role in `org_id` against the matrix.
async fn require_org_permission(
    services: &Services,
    handle: &SessionHandle,
    org_id: Uuid,
    permission: Permission,
) -> Result<(), ActionError> {
    let role = services
        .members
        .get(org_id, handle.user_id())
        .await?
        .map(|m| m.role);

    if !crate::authz::has_permission(role, permission) {
        return Err(ActionError::Forbidden(format!(
            "You do not have the {} permission in this organization",
            permission
        )));
    }
    Ok(())
}

/// Claims refreshes after tenant mutations are log-and-continue: the
/// mutation itself already committed.
pub(crate) async fn refresh_claims_best_effort(handle: &mut SessionHandle, operation: &str) {
    if let Err(e) = handle.refresh_claims().await {
        tracing::warn!(
            error = %e,
            operation,
            "Failed to refresh session claims after mutation"
        );
    }
}
