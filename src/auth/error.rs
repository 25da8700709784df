use thiserror::Error;

use crate::{db::DbError, services::MailerError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Generic by design, prevents account enumeration.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("No organization selected. Please select or create an organization first.")]
    NoOrgSelected,

    #[error("You are not a member of this organization")]
    NotAMember,

    #[error("Invalid or expired magic link")]
    InvalidMagicLink,

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Mail(#[from] MailerError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AuthResult<T> = Result<T, AuthError>;
