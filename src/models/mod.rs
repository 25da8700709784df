mod invitation;
mod member;
mod organization;
mod project;
mod user;
pub mod validators;

pub use invitation::*;
pub use member::*;
pub use organization::*;
pub use project::*;
pub use user::*;
