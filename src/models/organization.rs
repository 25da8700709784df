use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateOrganization {
    /// Display name
    pub name: String,
    /// URL-friendly identifier; derived from the name when absent
    pub slug: String,
    /// Logo image URL
    pub logo_url: Option<String>,
}

/// Partial update: absent fields are left untouched, never nulled.
#[derive(Debug, Clone, Default)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub logo_url: Option<String>,
}

impl UpdateOrganization {
    /// True when no field is present, i.e. the update set is empty.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.slug.is_none() && self.logo_url.is_none()
    }
}

/// Aggregate counts shown on an organization's dashboard card.
#[derive(Debug, Clone, Serialize)]
pub struct OrgSummary {
    pub organization: Organization,
    pub member_count: i64,
    pub project_count: i64,
}
