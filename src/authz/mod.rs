//! Role-based access control for organization-scoped actions.
//!
//! The matrix below is the client-visible mirror of what the data store's
//! row-level policies enforce. It is used for UI gating and pre-flight
//! checks only; the store remains the authority on writes.

use std::{fmt, str::FromStr};

use crate::models::OrgRole;

/// A named capability, checked against a role via the permission matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    OrgUpdate,
    OrgDelete,
    OrgBilling,
    MembersInvite,
    MembersRemove,
    MembersUpdateRole,
    ProjectsCreate,
    ProjectsRead,
    ProjectsUpdate,
    ProjectsDelete,
}

impl Permission {
    pub const ALL: [Permission; 10] = [
        Permission::OrgUpdate,
        Permission::OrgDelete,
        Permission::OrgBilling,
        Permission::MembersInvite,
        Permission::MembersRemove,
        Permission::MembersUpdateRole,
        Permission::ProjectsCreate,
        Permission::ProjectsRead,
        Permission::ProjectsUpdate,
        Permission::ProjectsDelete,
    ];

    /// The two-part `resource.action` name used in policies and the UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::OrgUpdate => "org.update",
            Permission::OrgDelete => "org.delete",
            Permission::OrgBilling => "org.billing",
            Permission::MembersInvite => "members.invite",
            Permission::MembersRemove => "members.remove",
            Permission::MembersUpdateRole => "members.update_role",
            Permission::ProjectsCreate => "projects.create",
            Permission::ProjectsRead => "projects.read",
            Permission::ProjectsUpdate => "projects.update",
            Permission::ProjectsDelete => "projects.delete",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "org.update" => Ok(Permission::OrgUpdate),
            "org.delete" => Ok(Permission::OrgDelete),
            "org.billing" => Ok(Permission::OrgBilling),
            "members.invite" => Ok(Permission::MembersInvite),
            "members.remove" => Ok(Permission::MembersRemove),
            "members.update_role" => Ok(Permission::MembersUpdateRole),
            "projects.create" => Ok(Permission::ProjectsCreate),
            "projects.read" => Ok(Permission::ProjectsRead),
            "projects.update" => Ok(Permission::ProjectsUpdate),
            "projects.delete" => Ok(Permission::ProjectsDelete),
            other => Err(format!("Unknown permission: {}", other)),
        }
    }
}

/// Permissions granted to each role. Stored as an explicit table rather
/// than derived inheritance so the grant set stays auditable at a glance;
/// each role's slice must remain a superset of the next rank down.
pub fn role_permissions(role: OrgRole) -> &'static [Permission] {
    match role {
        OrgRole::Owner => &[
            Permission::OrgUpdate,
            Permission::OrgDelete,
            Permission::OrgBilling,
            Permission::MembersInvite,
            Permission::MembersRemove,
            Permission::MembersUpdateRole,
            Permission::ProjectsCreate,
            Permission::ProjectsRead,
            Permission::ProjectsUpdate,
            Permission::ProjectsDelete,
        ],
        OrgRole::Admin => &[
            Permission::OrgUpdate,
            Permission::MembersInvite,
            Permission::MembersRemove,
            Permission::MembersUpdateRole,
            Permission::ProjectsCreate,
            Permission::ProjectsRead,
            Permission::ProjectsUpdate,
            Permission::ProjectsDelete,
        ],
        OrgRole::Member => &[
            Permission::ProjectsCreate,
            Permission::ProjectsRead,
            Permission::ProjectsUpdate,
            Permission::ProjectsDelete,
        ],
        OrgRole::Viewer => &[Permission::ProjectsRead],
    }
}

/// Check whether `role` grants `permission`. A missing role (no current
/// organization, or not a member) never grants anything.
pub fn has_permission(role: Option<OrgRole>, permission: Permission) -> bool {
    match role {
        Some(role) => role_permissions(role).contains(&permission),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Permission::OrgUpdate)]
    #[case(Permission::OrgDelete)]
    #[case(Permission::OrgBilling)]
    #[case(Permission::MembersInvite)]
    #[case(Permission::MembersRemove)]
    #[case(Permission::MembersUpdateRole)]
    #[case(Permission::ProjectsCreate)]
    #[case(Permission::ProjectsRead)]
    #[case(Permission::ProjectsUpdate)]
    #[case(Permission::ProjectsDelete)]
    fn test_grants_are_monotone_by_rank(#[case] permission: Permission) {
        // If a lower rank holds a permission, every higher rank must too.
        for lower in OrgRole::ALL {
            for higher in OrgRole::ALL {
                if higher.rank() > lower.rank() && has_permission(Some(lower), permission) {
                    assert!(
                        has_permission(Some(higher), permission),
                        "{} grants {} but {} does not",
                        lower,
                        permission,
                        higher
                    );
                }
            }
        }
    }

    #[test]
    fn test_no_role_grants_nothing() {
        for permission in Permission::ALL {
            assert!(!has_permission(None, permission));
        }
    }

    #[test]
    fn test_owner_holds_every_permission() {
        for permission in Permission::ALL {
            assert!(has_permission(Some(OrgRole::Owner), permission));
        }
    }

    #[test]
    fn test_member_cannot_manage_members() {
        assert!(!has_permission(Some(OrgRole::Member), Permission::MembersInvite));
        assert!(!has_permission(Some(OrgRole::Member), Permission::MembersRemove));
        assert!(!has_permission(
            Some(OrgRole::Member),
            Permission::MembersUpdateRole
        ));
        assert!(has_permission(Some(OrgRole::Member), Permission::ProjectsCreate));
    }

    #[test]
    fn test_viewer_is_read_only() {
        assert!(has_permission(Some(OrgRole::Viewer), Permission::ProjectsRead));
        assert!(!has_permission(Some(OrgRole::Viewer), Permission::ProjectsCreate));
        assert!(!has_permission(Some(OrgRole::Viewer), Permission::OrgUpdate));
    }

    #[test]
    fn test_permission_name_round_trip() {
        for permission in Permission::ALL {
            assert_eq!(
                permission.as_str().parse::<Permission>().unwrap(),
                permission
            );
        }
        assert!("org.explode".parse::<Permission>().is_err());
    }
}
