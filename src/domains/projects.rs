//! Project domain: CRUD scoped to the active organization.

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
    models::{CreateProject, OrgRole, Project, UpdateProject, validators::validate_display_name},
    services::Services,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectOperation {
    #[default]
    Create,
    Update,
    Delete,
    List,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProjectInput {
    pub operation: ProjectOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_display_name"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectData {
    Created(Project),
    Updated(Project),
    Deleted { id: Uuid },
    Listed(Vec<Project>),
}

const NAME_FIELD: FieldConfig = FieldConfig::text("name", "Project Name")
    .with_placeholder("My Project");
const DESCRIPTION_FIELD: FieldConfig =
    FieldConfig::text("description", "Description (optional)");
const PROJECT_ID_FIELD: FieldConfig =
    FieldConfig::text("project_id", "Project").with_kind(FieldKind::Hidden);

pub fn operation_config(operation: ProjectOperation) -> OperationConfig {
    match operation {
        ProjectOperation::Create => OperationConfig {
            label: "Create Project",
            description: "Create a new project in this organization",
            fields: &[NAME_FIELD, DESCRIPTION_FIELD],
            submit: SubmitConfig {
                label: "Create Project",
                pending: "Creating...",
            },
            confirm_message: None,
        },
        ProjectOperation::Update => OperationConfig {
            label: "Update Project",
            description: "Update project details",
            fields: &[PROJECT_ID_FIELD, NAME_FIELD, DESCRIPTION_FIELD],
            submit: SubmitConfig {
                label: "Save Changes",
                pending: "Saving...",
            },
            confirm_message: None,
        },
        ProjectOperation::Delete => OperationConfig {
            label: "Delete Project",
            description: "Permanently delete this project",
            fields: &[PROJECT_ID_FIELD],
            submit: SubmitConfig {
                label: "Delete Project",
                pending: "Deleting...",
            },
            confirm_message: Some(
                "Are you sure you want to delete this project? This action cannot be undone.",
            ),
        },
        ProjectOperation::List => OperationConfig {
            label: "Projects",
            description: "All projects in this organization",
            fields: &[],
            submit: SubmitConfig {
                label: "Refresh",
                pending: "Loading...",
            },
            confirm_message: None,
        },
    }
}

pub fn form_config(operation: ProjectOperation) -> FormConfig {
    operation_config(operation).form()
}

pub fn project_initial_state() -> ActionState<ProjectData> {
    initial_state::<ProjectData, ProjectInput>()
}

/// Entry point for the project form.
pub async fn action(
    services: &Services,
    handle: &mut SessionHandle,
    raw: RawInput,
) -> ActionState<ProjectData> {
    let result = run(services, handle, &raw).await;
    normalize(result, &raw)
}

async fn run(
    services: &Services,
    handle: &mut SessionHandle,
    raw: &RawInput,
) -> Result<Outcome<ProjectData>, ActionError> {
    let input: ProjectInput = parse_input(raw)?;
    validate_input(&input)?;

    let context = require_org_context(handle).await?;

    match input.operation {
        ProjectOperation::Create => {
            require_permission(&context.role, Permission::ProjectsCreate)?;
            let name = input
                .name
                .ok_or_else(|| ActionError::Invalid("Project name is required".to_string()))?;
            let project = services
                .projects
                .create(
                    context.org_id,
                    context.user_id,
                    CreateProject {
                        name,
                        description: input.description,
                    },
                )
                .await?;
            Ok(Outcome::data("Project created", ProjectData::Created(project)))
        }
        ProjectOperation::Update => {
            require_permission(&context.role, Permission::ProjectsUpdate)?;
            let id = require_project_id(input.project_id)?;
            let project = services
                .projects
                .update(
                    context.org_id,
                    id,
                    UpdateProject {
                        name: input.name,
                        description: input.description,
                    },
                )
                .await?;
            Ok(Outcome::data("Project updated", ProjectData::Updated(project)))
        }
        ProjectOperation::Delete => {
            require_permission(&context.role, Permission::ProjectsDelete)?;
            let id = require_project_id(input.project_id)?;
            services.projects.delete(context.org_id, id).await?;
            Ok(Outcome::data("Project deleted", ProjectData::Deleted { id }))
        }
        ProjectOperation::List => {
            require_permission(&context.role, Permission::ProjectsRead)?;
            let projects = services.projects.list(context.org_id).await?;
            Ok(Outcome::data("Projects loaded", ProjectData::Listed(projects)))
        }
    }
}

fn require_project_id(project_id: Option<Uuid>) -> Result<Uuid, ActionError> {
    project_id.ok_or_else(|| ActionError::Invalid("Project ID is required".to_string()))
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
    fn test_operation_defaults_to_create() {
        let raw: RawInput = [("name".to_string(), "My Project".to_string())].into();
        let input: ProjectInput = parse_input(&raw).expect("Parse should succeed");
        assert_eq!(input.operation, ProjectOperation::Create);
    }

    #[test]
    fn test_viewer_can_only_read() {
        let role = Some(OrgRole::Viewer);
        assert!(require_permission(&role, Permission::ProjectsRead).is_ok());
        assert!(require_permission(&role, Permission::ProjectsCreate).is_err());
        assert!(require_permission(&role, Permission::ProjectsUpdate).is_err());
        assert!(require_permission(&role, Permission::ProjectsDelete).is_err());
    }

    #[test]
    fn test_short_name_fails_validation() {
        let input = ProjectInput {
            name: Some("X".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate_input(&input),
            Err(ActionError::Validation(_))
        ));
    }
}
