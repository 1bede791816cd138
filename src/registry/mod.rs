pub mod memory;

pub use memory::InMemoryRegistry;

use crate::error::Result;
use crate::models::ExtensionSnapshot;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read interface onto the authoritative extension store.
///
/// The search subsystem consumes extension data exclusively through this
/// trait; everything behind it (persistence, admin CRUD, version handling)
/// is an external collaborator. Only *active* extensions are ever surfaced:
/// an extension with no published, non-deactivated version does not exist
/// as far as search is concerned.
#[async_trait]
pub trait ExtensionRegistry: Send + Sync {
    /// Snapshot all active extensions
    async fn list_active_extensions(&self) -> Result<Vec<ExtensionSnapshot>>;

    /// Snapshot a single extension, `None` when inactive or unknown
    async fn find_active_extension(&self, id: i64) -> Result<Option<ExtensionSnapshot>>;

    /// Number of active reviews for an extension
    async fn count_active_reviews(&self, extension_id: i64) -> Result<i64>;

    /// Number of owner memberships in a namespace
    async fn count_owner_memberships(&self, namespace: &str) -> Result<i64>;

    /// Number of memberships (any role) a user holds in a namespace
    async fn count_memberships(&self, user: &str, namespace: &str) -> Result<i64>;

    /// Highest download count among active extensions
    async fn max_active_download_count(&self) -> Result<i64>;

    /// Latest-version timestamp of the oldest active extension
    async fn oldest_active_timestamp(&self) -> Result<Option<DateTime<Utc>>>;
}
