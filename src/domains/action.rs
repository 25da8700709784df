//! The uniform action contract: raw form input in, `ActionState` out.
//!
//! Every domain action runs the same pipeline: parse the string map into
//! a typed input, validate it, dispatch on the operation, and normalize
//! whatever came back. Handlers return `Result<Outcome, ActionError>`;
//! this module is the only place errors turn into presentation state.

use std::collections::HashMap;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use validator::Validate;

use crate::{auth::AuthError, db::DbError};

/// Submitted form data: field name to raw string value.
pub type RawInput = HashMap<String, String>;

/// Per-field validation messages, keyed by field name.
pub type FieldErrors = HashMap<String, Vec<String>>;

/// Presentation-facing result of one action invocation.
///
/// Redirect is a first-class variant, not an error: callers match on it
/// and navigate, the same way they match on Success.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ActionState<T> {
    Idle {
        default_values: serde_json::Value,
    },
    Success {
        message: String,
        data: Option<T>,
    },
    Error {
        message: String,
        field_errors: FieldErrors,
        /// The submitted values, echoed back so the form can re-render.
        default_values: serde_json::Value,
    },
    Redirect {
        to: String,
    },
}

impl<T> ActionState<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionState::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ActionState::Error { .. })
    }
}

/// What a handler produced before normalization.
#[derive(Debug)]
pub enum Outcome<T> {
    Data { message: String, data: Option<T> },
    Redirect(String),
}

impl<T> Outcome<T> {
    pub fn data(message: impl Into<String>, data: T) -> Self {
        Outcome::Data {
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Outcome::Data {
            message: message.into(),
            data: None,
        }
    }

    pub fn redirect(to: impl Into<String>) -> Self {
        Outcome::Redirect(to.into())
    }
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Please check your input.")]
    Validation(FieldErrors),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Store(#[source] DbError),
}

impl From<DbError> for ActionError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Conflict(msg) => ActionError::Conflict(msg),
            DbError::Validation(msg) => ActionError::Invalid(msg),
            DbError::NotFound => ActionError::Invalid("Not found".to_string()),
            other => ActionError::Store(other),
        }
    }
}

/// Deserialize raw form input into a typed input struct.
///
/// Empty strings are dropped first: an untouched HTML input submits ""
/// and must read as absent, not as an empty value.
pub(crate) fn parse_input<T: DeserializeOwned>(raw: &RawInput) -> Result<T, ActionError> {
    let object: serde_json::Map<String, serde_json::Value> = raw
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
        .collect();

    serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| ActionError::Invalid(format!("Invalid input: {}", e)))
}

pub(crate) fn validate_input<T: Validate>(input: &T) -> Result<(), ActionError> {
    input
        .validate()
        .map_err(|errors| ActionError::Validation(flatten_errors(errors)))
}

fn flatten_errors(errors: validator::ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            let messages = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .clone()
                        .map(|m| m.into_owned())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Turn a handler result into presentation state. Failures echo the
/// submitted values back; everything except validation errors is logged.
pub(crate) fn normalize<T>(result: Result<Outcome<T>, ActionError>, raw: &RawInput) -> ActionState<T> {
    match result {
        Ok(Outcome::Data { message, data }) => ActionState::Success { message, data },
        Ok(Outcome::Redirect(to)) => ActionState::Redirect { to },
        Err(ActionError::Validation(field_errors)) => ActionState::Error {
            message: "Please check your input.".to_string(),
            field_errors,
            default_values: raw_values(raw),
        },
        Err(error) => {
            tracing::error!(error = ?error, "Action failed");
            ActionState::Error {
                message: error.to_string(),
                field_errors: FieldErrors::new(),
                default_values: raw_values(raw),
            }
        }
    }
}

/// Idle state seeded with the schema's defaults.
pub(crate) fn initial_state<T, I: Serialize + Default>() -> ActionState<T> {
    ActionState::Idle {
        default_values: serde_json::to_value(I::default())
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new())),
    }
}

fn raw_values(raw: &RawInput) -> serde_json::Value {
    serde_json::to_value(raw).unwrap_or(serde_json::Value::Object(serde_json::Map::new()))
}
