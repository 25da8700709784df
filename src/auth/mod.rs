//! Sessions, tenant claims, and organization context resolution.

mod claims;
mod context;
mod error;
mod identity;
mod session;

pub use claims::{AccessClaims, OrgClaims, decode_claims};
pub use context::{OrgContext, require_org_context};
pub use error::{AuthError, AuthResult};
pub use identity::{IdentityProvider, LocalIdentityProvider};
pub use session::{Session, SessionHandle};
