use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

/// Metadata projection of an active extension, as supplied by the registry.
///
/// This is the unit of data the search subsystem indexes and ranks. It is a
/// transient snapshot, not an authoritative record: the registry re-emits it
/// whenever the underlying extension changes.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExtensionSnapshot {
    /// Stable extension identifier
    pub id: i64,

    /// Publishing namespace
    #[validate(length(min = 1, max = 255))]
    pub namespace: String,

    /// Extension name within its namespace
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Human-readable display name
    pub display_name: Option<String>,

    /// Short description
    pub description: Option<String>,

    /// Free-form tags, in publisher order
    pub tags: Vec<String>,

    /// Marketplace categories
    pub categories: Vec<String>,

    /// Average review rating in [0, 5], absent when unreviewed
    pub average_rating: Option<f64>,

    /// Total download count
    #[validate(range(min = 0))]
    pub download_count: i64,

    /// Publishing timestamp of the latest version
    pub timestamp: DateTime<Utc>,

    /// User who published the latest version, if known
    pub published_by: Option<String>,
}

impl ExtensionSnapshot {
    pub fn new(id: i64, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            namespace: namespace.into(),
            name: name.into(),
            display_name: None,
            description: None,
            tags: Vec::new(),
            categories: Vec::new(),
            average_rating: None,
            download_count: 0,
            timestamp: Utc::now(),
            published_by: None,
        }
    }

    /// Fully qualified identifier, `namespace.name`
    pub fn extension_id(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// Role a user holds within a namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    Owner,
    Contributor,
}

/// Membership of a user in a namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceMembership {
    pub namespace: String,
    pub user: String,
    pub role: MembershipRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_id_format() {
        let ext = ExtensionSnapshot::new(1, "redhat", "yaml");
        assert_eq!(ext.extension_id(), "redhat.yaml");
    }

    #[test]
    fn test_membership_role_parse() {
        assert_eq!("owner".parse::<MembershipRole>().unwrap(), MembershipRole::Owner);
        assert!("admin".parse::<MembershipRole>().is_err());
    }
}
