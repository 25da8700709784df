use std::str::FromStr;

use uuid::Uuid;

use crate::{
    db::error::{DbError, DbResult},
    models::{InvitationStatus, OrgRole},
};

/// Parse a UUID stored as TEXT, surfacing corruption as an internal error.
pub fn parse_uuid(s: &str) -> DbResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DbError::Internal(format!("Invalid UUID in database: {}", e)))
}

pub fn parse_role(s: &str) -> DbResult<OrgRole> {
    OrgRole::from_str(s).map_err(DbError::Internal)
}

pub fn parse_status(s: &str) -> DbResult<InvitationStatus> {
    InvitationStatus::from_str(s).map_err(DbError::Internal)
}
