//! Form-facing domains. Each submodule owns one form: its operation
//! enum, typed input, result data, declarative field config, and the
//! async `action` entry point that runs the shared pipeline.

mod action;
pub mod auth;
pub mod invitations;
pub mod members;
pub mod org;
pub mod projects;
pub mod registry;

pub use action::{ActionError, ActionState, FieldErrors, Outcome, RawInput};
pub use registry::{FieldConfig, FieldKind, FormConfig, OperationConfig, SubmitConfig};
