//! Domain services: thin orchestration over the repository layer.

mod invitations;
mod mailer;
mod members;
mod organizations;
mod projects;

use std::sync::Arc;

pub use invitations::InvitationService;
pub use mailer::{Email, Mailer, MailerError, MemoryMailer, NoopMailer};
pub use members::MemberService;
pub use organizations::OrganizationService;
pub use projects::ProjectService;

use crate::{config::AuthConfig, db::DbPool};

/// Container wiring every service to the shared pool, handed to the
/// operation handlers as one unit.
pub struct Services {
    pub organizations: OrganizationService,
    pub members: MemberService,
    pub invitations: InvitationService,
    pub projects: ProjectService,
}

impl Services {
    pub fn new(db: Arc<DbPool>, mailer: Arc<dyn Mailer>, config: &AuthConfig) -> Self {
        Self {
            organizations: OrganizationService::new(Arc::clone(&db)),
            members: MemberService::new(Arc::clone(&db)),
            invitations: InvitationService::new(Arc::clone(&db), mailer, config),
            projects: ProjectService::new(db),
        }
    }
}
