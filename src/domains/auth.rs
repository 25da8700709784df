//! Auth domain: login, signup, magic link, logout.
//!
//! Unlike the tenant domains this one talks to the identity provider
//! directly and may run without a session. Validation is per operation,
//! so it is written out by hand instead of derived.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    action::{ActionError, ActionState, FieldErrors, Outcome, RawInput, initial_state,
             normalize, parse_input},
    registry::{FieldConfig, FieldKind, FormConfig, OperationConfig, SubmitConfig},
};
use crate::auth::{AuthError, IdentityProvider, Session, SessionHandle};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthOperation {
    #[default]
    Login,
    Signup,
    MagicLink,
    Logout,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthInput {
    pub operation: AuthOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm_password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthData {
    SignedIn(Session),
    MagicLinkSent,
}

const MIN_PASSWORD_LEN: usize = 8;

const EMAIL_FIELD: FieldConfig = FieldConfig::text("email", "Email")
    .with_kind(FieldKind::Email)
    .with_placeholder("you@example.com");
const PASSWORD_FIELD: FieldConfig =
    FieldConfig::text("password", "Password").with_kind(FieldKind::Password);
const CONFIRM_PASSWORD_FIELD: FieldConfig =
    FieldConfig::text("confirm_password", "Confirm Password").with_kind(FieldKind::Password);

pub fn operation_config(operation: AuthOperation) -> OperationConfig {
    match operation {
        AuthOperation::Login => OperationConfig {
            label: "Sign In",
            description: "Sign in to your account",
            fields: &[EMAIL_FIELD, PASSWORD_FIELD],
            submit: SubmitConfig {
                label: "Sign In",
                pending: "Signing in...",
            },
            confirm_message: None,
        },
        AuthOperation::Signup => OperationConfig {
            label: "Create Account",
            description: "Create a new account",
            fields: &[EMAIL_FIELD, PASSWORD_FIELD, CONFIRM_PASSWORD_FIELD],
            submit: SubmitConfig {
                label: "Sign Up",
                pending: "Creating account...",
            },
            confirm_message: None,
        },
        AuthOperation::MagicLink => OperationConfig {
            label: "Email me a link",
            description: "Sign in with a one-time link instead of a password",
            fields: &[EMAIL_FIELD],
            submit: SubmitConfig {
                label: "Send Magic Link",
                pending: "Sending...",
            },
            confirm_message: None,
        },
        AuthOperation::Logout => OperationConfig {
            label: "Sign Out",
            description: "Sign out of your account",
            fields: &[],
            submit: SubmitConfig {
                label: "Sign Out",
                pending: "Signing out...",
            },
            confirm_message: None,
        },
    }
}

pub fn form_config(operation: AuthOperation) -> FormConfig {
    operation_config(operation).form()
}

pub fn auth_initial_state() -> ActionState<AuthData> {
    initial_state::<AuthData, AuthInput>()
}

/// Entry point for the auth forms. `handle` is consumed on logout and
/// absent for the unauthenticated operations.
pub async fn action(
    provider: &Arc<dyn IdentityProvider>,
    handle: Option<SessionHandle>,
    raw: RawInput,
) -> ActionState<AuthData> {
    let result = run(provider, handle, &raw).await;
    normalize(result, &raw)
}

async fn run(
    provider: &Arc<dyn IdentityProvider>,
    handle: Option<SessionHandle>,
    raw: &RawInput,
) -> Result<Outcome<AuthData>, ActionError> {
    let input: AuthInput = parse_input(raw)?;
    validate(&input)?;

    match input.operation {
        AuthOperation::Login => {
            let email = input.email.unwrap_or_default();
            let password = input.password.unwrap_or_default();
            let session = provider.sign_in(&email, &password).await?;
            Ok(Outcome::data("Signed in", AuthData::SignedIn(session)))
        }
        AuthOperation::Signup => {
            let email = input.email.unwrap_or_default();
            let password = input.password.unwrap_or_default();
            let session = provider.sign_up(&email, &password).await?;
            Ok(Outcome::data("Account created", AuthData::SignedIn(session)))
        }
        AuthOperation::MagicLink => {
            let email = input.email.unwrap_or_default();
            provider.send_magic_link(&email).await?;
            Ok(Outcome::data(
                "Check your email for the magic link",
                AuthData::MagicLinkSent,
            ))
        }
        AuthOperation::Logout => {
            let handle = handle.ok_or(AuthError::NotAuthenticated)?;
            handle.sign_out().await?;
            Ok(Outcome::redirect("/login"))
        }
    }
}

/// Per-operation field checks, collected so the form can show all of
/// them at once.
fn validate(input: &AuthInput) -> Result<(), ActionError> {
    let mut errors = FieldErrors::new();

    let needs_email = !matches!(input.operation, AuthOperation::Logout);
    let needs_password = matches!(input.operation, AuthOperation::Login | AuthOperation::Signup);

    if needs_email {
        match &input.email {
            Some(email) if email.contains('@') => {}
            _ => {
                errors
                    .entry("email".to_string())
                    .or_default()
                    .push("Invalid email address".to_string());
            }
        }
    }

    if needs_password {
        match &input.password {
            Some(password) if password.chars().count() >= MIN_PASSWORD_LEN => {}
            _ => {
                errors
                    .entry("password".to_string())
                    .or_default()
                    .push("Password must be at least 8 characters".to_string());
            }
        }
    }

    if input.operation == AuthOperation::Signup && input.confirm_password != input.password {
        errors
            .entry("confirm_password".to_string())
            .or_default()
            .push("Passwords do not match".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ActionError::Validation(errors))
    }
}
