mod error;
pub mod repos;
pub mod sqlite;


use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use repos::*;

use crate::config::DatabaseConfig;

/// Cached repository trait objects, created once at startup.
struct CachedRepos {
    users: Arc<dyn UserRepo>,
    organizations: Arc<dyn OrganizationRepo>,
    members: Arc<dyn MemberRepo>,
    invitations: Arc<dyn InvitationRepo>,
    projects: Arc<dyn ProjectRepo>,
    preferences: Arc<dyn PreferenceRepo>,
}

/// SQLite-backed database pool.
///
/// Repositories are cached at construction time to avoid allocation on each access.
pub struct DbPool {
    inner: sqlx::SqlitePool,
    repos: CachedRepos,
}

impl DbPool {
    /// Create a DbPool from an existing SQLite pool.
    /// Primarily useful for testing.
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        let repos = CachedRepos {
            users: Arc::new(sqlite::SqliteUserRepo::new(pool.clone())),
            organizations: Arc::new(sqlite::SqliteOrganizationRepo::new(pool.clone())),
            members: Arc::new(sqlite::SqliteMemberRepo::new(pool.clone())),
            invitations: Arc::new(sqlite::SqliteInvitationRepo::new(pool.clone())),
            projects: Arc::new(sqlite::SqliteProjectRepo::new(pool.clone())),
            preferences: Arc::new(sqlite::SqlitePreferenceRepo::new(pool.clone())),
        };
        DbPool { inner: pool, repos }
    }

    /// Create a database pool from configuration
    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(
                sqlx::sqlite::SqliteConnectOptions::new()
                    .filename(&config.path)
                    .create_if_missing(config.create_if_missing)
                    .foreign_keys(true),
            )
            .await?;

        Ok(Self::from_sqlite(pool))
    }

    /// Run database migrations using sqlx's migration runner.
    /// This automatically creates and manages a _sqlx_migrations table.
    pub async fn run_migrations(&self) -> DbResult<()> {
        tracing::info!("Running SQLite migrations");
        sqlx::migrate!("./migrations").run(&self.inner).await?;
        tracing::info!("SQLite migrations completed successfully");
        Ok(())
    }

    /// Get user repository
    pub fn users(&self) -> Arc<dyn UserRepo> {
        Arc::clone(&self.repos.users)
    }

    /// Get organization repository
    pub fn organizations(&self) -> Arc<dyn OrganizationRepo> {
        Arc::clone(&self.repos.organizations)
    }

    /// Get membership repository
    pub fn members(&self) -> Arc<dyn MemberRepo> {
        Arc::clone(&self.repos.members)
    }

    /// Get invitation repository
    pub fn invitations(&self) -> Arc<dyn InvitationRepo> {
        Arc::clone(&self.repos.invitations)
    }

    /// Get project repository
    pub fn projects(&self) -> Arc<dyn ProjectRepo> {
        Arc::clone(&self.repos.projects)
    }

    /// Get user preference repository
    pub fn preferences(&self) -> Arc<dyn PreferenceRepo> {
        Arc::clone(&self.repos.preferences)
    }

    /// Get a reference to the underlying pool.
    /// Useful for operations that need direct pool access.
    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.inner
    }

    /// Health check for database connectivity
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.inner).await?;
        Ok(())
    }
}
