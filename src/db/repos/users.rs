use async_trait::async_trait;
use uuid::Uuid;

use crate::{db::error::DbResult, models::User};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    /// None for accounts created through a magic link.
    pub password_hash: Option<String>,
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Create a user account. Fails with a conflict when the email is taken.
    async fn create(&self, input: NewUser) -> DbResult<User>;

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<User>>;

    /// Lookup is case-insensitive; emails are stored lowercased.
    async fn get_by_email(&self, email: &str) -> DbResult<Option<User>>;
}
