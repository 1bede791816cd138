use crate::error::{AppError, Result};
use crate::models::{ExtensionSnapshot, MembershipRole, NamespaceMembership};
use crate::registry::ExtensionRegistry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory extension registry.
///
/// Backs the collaborator interface for single-node deployments and tests.
/// Extensions are keyed by id; a deactivated extension stays stored but is
/// invisible through the [`ExtensionRegistry`] read interface.
#[derive(Clone)]
pub struct InMemoryRegistry {
    extensions: Arc<DashMap<i64, StoredExtension>>,
    memberships: Arc<DashMap<String, Vec<NamespaceMembership>>>,
    review_counts: Arc<DashMap<i64, i64>>,
}

#[derive(Debug, Clone)]
struct StoredExtension {
    snapshot: ExtensionSnapshot,
    active: bool,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            extensions: Arc::new(DashMap::new()),
            memberships: Arc::new(DashMap::new()),
            review_counts: Arc::new(DashMap::new()),
        }
    }

    /// Insert or replace an extension as active
    pub fn publish(&self, snapshot: ExtensionSnapshot) {
        tracing::debug!(extension_id = snapshot.id, "Extension published");
        self.extensions.insert(
            snapshot.id,
            StoredExtension {
                snapshot,
                active: true,
            },
        );
    }

    /// Mark an extension inactive; it disappears from all read methods
    pub fn deactivate(&self, id: i64) -> Result<()> {
        let mut entry = self
            .extensions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Extension {} not found", id)))?;
        entry.active = false;
        tracing::debug!(extension_id = id, "Extension deactivated");
        Ok(())
    }

    /// Remove an extension entirely
    pub fn remove(&self, id: i64) {
        self.extensions.remove(&id);
        self.review_counts.remove(&id);
        tracing::debug!(extension_id = id, "Extension removed");
    }

    pub fn set_download_count(&self, id: i64, count: i64) -> Result<()> {
        let mut entry = self
            .extensions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Extension {} not found", id)))?;
        entry.snapshot.download_count = count;
        Ok(())
    }

    pub fn set_rating(&self, id: i64, average_rating: Option<f64>, review_count: i64) -> Result<()> {
        let mut entry = self
            .extensions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Extension {} not found", id)))?;
        entry.snapshot.average_rating = average_rating;
        self.review_counts.insert(id, review_count);
        Ok(())
    }

    pub fn add_membership(&self, namespace: &str, user: &str, role: MembershipRole) {
        self.memberships
            .entry(namespace.to_string())
            .or_default()
            .push(NamespaceMembership {
                namespace: namespace.to_string(),
                user: user.to_string(),
                role,
            });
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtensionRegistry for InMemoryRegistry {
    async fn list_active_extensions(&self) -> Result<Vec<ExtensionSnapshot>> {
        let mut extensions: Vec<ExtensionSnapshot> = self
            .extensions
            .iter()
            .filter(|entry| entry.active)
            .map(|entry| entry.snapshot.clone())
            .collect();
        // DashMap iteration order is arbitrary; keep snapshots reproducible
        extensions.sort_by_key(|ext| ext.id);
        Ok(extensions)
    }

    async fn find_active_extension(&self, id: i64) -> Result<Option<ExtensionSnapshot>> {
        Ok(self
            .extensions
            .get(&id)
            .filter(|entry| entry.active)
            .map(|entry| entry.snapshot.clone()))
    }

    async fn count_active_reviews(&self, extension_id: i64) -> Result<i64> {
        Ok(self
            .review_counts
            .get(&extension_id)
            .map(|count| *count)
            .unwrap_or(0))
    }

    async fn count_owner_memberships(&self, namespace: &str) -> Result<i64> {
        Ok(self
            .memberships
            .get(namespace)
            .map(|members| {
                members
                    .iter()
                    .filter(|m| m.role == MembershipRole::Owner)
                    .count() as i64
            })
            .unwrap_or(0))
    }

    async fn count_memberships(&self, user: &str, namespace: &str) -> Result<i64> {
        Ok(self
            .memberships
            .get(namespace)
            .map(|members| members.iter().filter(|m| m.user == user).count() as i64)
            .unwrap_or(0))
    }

    async fn max_active_download_count(&self) -> Result<i64> {
        Ok(self
            .extensions
            .iter()
            .filter(|entry| entry.active)
            .map(|entry| entry.snapshot.download_count)
            .max()
            .unwrap_or(0))
    }

    async fn oldest_active_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .extensions
            .iter()
            .filter(|entry| entry.active)
            .map(|entry| entry.snapshot.timestamp)
            .min())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: i64, namespace: &str, name: &str, downloads: i64) -> ExtensionSnapshot {
        let mut ext = ExtensionSnapshot::new(id, namespace, name);
        ext.download_count = downloads;
        ext
    }

    #[tokio::test]
    async fn test_deactivated_extensions_are_invisible() {
        let registry = InMemoryRegistry::new();
        registry.publish(snapshot(1, "redhat", "yaml", 100));
        registry.publish(snapshot(2, "redhat", "java", 200));
        registry.deactivate(2).unwrap();

        let active = registry.list_active_extensions().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, 1);
        assert!(registry.find_active_extension(2).await.unwrap().is_none());
        assert_eq!(registry.max_active_download_count().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_membership_counts() {
        let registry = InMemoryRegistry::new();
        registry.add_membership("redhat", "alice", MembershipRole::Owner);
        registry.add_membership("redhat", "bob", MembershipRole::Contributor);

        assert_eq!(registry.count_owner_memberships("redhat").await.unwrap(), 1);
        assert_eq!(registry.count_memberships("bob", "redhat").await.unwrap(), 1);
        assert_eq!(registry.count_memberships("eve", "redhat").await.unwrap(), 0);
        assert_eq!(registry.count_owner_memberships("other").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_registry_stats() {
        let registry = InMemoryRegistry::new();
        assert_eq!(registry.max_active_download_count().await.unwrap(), 0);
        assert!(registry.oldest_active_timestamp().await.unwrap().is_none());
    }
}
