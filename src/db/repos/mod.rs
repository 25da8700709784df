mod invitations;
mod members;
mod organizations;
mod preferences;
mod projects;
mod users;

pub use invitations::InvitationRepo;
pub use members::MemberRepo;
pub use organizations::OrganizationRepo;
pub use preferences::PreferenceRepo;
pub use projects::ProjectRepo;
pub use users::{NewUser, UserRepo};
