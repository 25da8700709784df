mod common;
mod invitations;
mod members;
mod organizations;
mod preferences;
mod projects;
mod users;

pub use invitations::SqliteInvitationRepo;
pub use members::SqliteMemberRepo;
pub use organizations::SqliteOrganizationRepo;
pub use preferences::SqlitePreferenceRepo;
pub use projects::SqliteProjectRepo;
pub use users::SqliteUserRepo;
