//! Composite relevance scoring
//!
//! The relevance of an extension blends three normalized components:
//! rating confidence (damped when only a handful of reviews exist),
//! download popularity relative to the most-downloaded active extension,
//! and publishing recency relative to the oldest active extension. Each
//! component is clamped to `[0, 1]` and weighted independently; the final
//! value is discounted for extensions whose publisher is not verified.

use crate::models::ExtensionSnapshot;
use crate::registry::ExtensionRegistry;
use crate::search::document::SearchEntry;
use crate::search::error::SearchResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relevance score weights
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RelevanceWeights {
    /// Weight of the rating component
    #[serde(default = "default_weight")]
    pub rating: f64,

    /// Weight of the download-count component
    #[serde(default = "default_weight")]
    pub downloads: f64,

    /// Weight of the recency component
    #[serde(default = "default_weight")]
    pub timestamp: f64,

    /// Multiplier applied to unverified extensions, below one
    #[serde(default = "default_unverified")]
    pub unverified: f64,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            rating: default_weight(),
            downloads: default_weight(),
            timestamp: default_weight(),
            unverified: default_unverified(),
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

fn default_unverified() -> f64 {
    0.5
}

/// Normalization references for one scoring batch.
///
/// Computed once per index rebuild, per single-entry upsert or per fallback
/// query, and discarded afterwards; using one instance for a whole batch is
/// what keeps the ranking internally consistent across that batch.
#[derive(Debug, Clone, Serialize)]
pub struct RelevanceStats {
    /// Download normalization reference
    pub download_ref: f64,

    /// Age normalization reference in seconds
    pub timestamp_ref: f64,

    /// Latest-version timestamp of the oldest active extension
    pub oldest: DateTime<Utc>,
}

impl RelevanceStats {
    /// Collect normalization references from the registry
    pub async fn collect(registry: &dyn ExtensionRegistry) -> SearchResult<Self> {
        let max_downloads = registry.max_active_download_count().await?;
        let oldest = registry.oldest_active_timestamp().await?;
        Ok(Self::compute(max_downloads, oldest, Utc::now()))
    }

    /// Compute references from explicit inputs
    pub fn compute(max_downloads: i64, oldest: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let oldest = oldest.unwrap_or(now);
        Self {
            download_ref: max_downloads as f64 * 1.5 + 100.0,
            timestamp_ref: (now - oldest).num_seconds() as f64 + 60.0,
            oldest,
        }
    }
}

/// Computes composite relevance scores
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    weights: RelevanceWeights,
}

impl RelevanceScorer {
    pub fn new(weights: RelevanceWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RelevanceWeights {
        &self.weights
    }

    /// Score one extension against a batch's normalization stats.
    ///
    /// Total over its inputs: degenerate stats can never surface a
    /// non-finite value. When one occurs it is logged and reset to zero so
    /// a single malformed entry cannot poison a rebuild.
    pub fn score(
        &self,
        ext: &ExtensionSnapshot,
        review_count: i64,
        verified: bool,
        stats: &RelevanceStats,
    ) -> f64 {
        let rating_value = match ext.average_rating {
            // Reduce the rating confidence when there are only few reviews
            Some(average_rating) => (average_rating / 5.0) * saturate(review_count as f64, 0.25),
            None => 0.0,
        };
        let downloads_value = ext.download_count as f64 / stats.download_ref;
        let timestamp_value =
            (ext.timestamp - stats.oldest).num_seconds() as f64 / stats.timestamp_ref;

        let mut relevance = self.weights.rating * limit(rating_value)
            + self.weights.downloads * limit(downloads_value)
            + self.weights.timestamp * limit(timestamp_value);

        if !verified {
            relevance *= self.weights.unverified;
        }

        if !relevance.is_finite() {
            tracing::error!(
                extension = %ext.extension_id(),
                stats = %serde_json::to_string(stats).unwrap_or_default(),
                "Invalid relevance for entry, resetting to zero"
            );
            relevance = 0.0;
        }
        relevance
    }

    /// An extension is verified when its namespace has at least one owner
    /// and the publisher of the latest version is a member of that
    /// namespace.
    pub async fn is_verified(
        &self,
        registry: &dyn ExtensionRegistry,
        ext: &ExtensionSnapshot,
    ) -> SearchResult<bool> {
        let user = match ext.published_by.as_deref() {
            Some(user) => user,
            None => return Ok(false),
        };
        Ok(registry.count_owner_memberships(&ext.namespace).await? > 0
            && registry.count_memberships(user, &ext.namespace).await? > 0)
    }

    /// Resolve review count and verification through the registry and
    /// produce a scored search entry
    pub async fn make_entry(
        &self,
        registry: &dyn ExtensionRegistry,
        ext: &ExtensionSnapshot,
        stats: &RelevanceStats,
    ) -> SearchResult<SearchEntry> {
        let review_count = if ext.average_rating.is_some() {
            registry.count_active_reviews(ext.id).await?
        } else {
            0
        };
        let verified = self.is_verified(registry, ext).await?;
        let relevance = self.score(ext, review_count, verified, stats);
        Ok(SearchEntry::from_snapshot(ext, relevance))
    }
}

/// Saturation curve: zero at zero, approaching one as `value` grows
fn saturate(value: f64, factor: f64) -> f64 {
    1.0 - 1.0 / (value * factor + 1.0)
}

/// Clamp to `[0, 1]`
fn limit(value: f64) -> f64 {
    if value < 0.0 {
        0.0
    } else if value > 1.0 {
        1.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(average_rating: Option<f64>, downloads: i64) -> ExtensionSnapshot {
        let mut ext = ExtensionSnapshot::new(1, "redhat", "yaml");
        ext.average_rating = average_rating;
        ext.download_count = downloads;
        ext.timestamp = Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap();
        ext
    }

    fn stats() -> RelevanceStats {
        let oldest = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2021, 12, 1, 0, 0, 0).unwrap();
        RelevanceStats::compute(10_000, Some(oldest), now)
    }

    #[test]
    fn test_saturation_monotone_and_bounded() {
        let mut previous = -1.0;
        for n in 0..1000 {
            let value = saturate(n as f64, 0.25);
            assert!(value > previous);
            assert!((0.0..1.0).contains(&value));
            previous = value;
        }
        assert_eq!(saturate(0.0, 0.25), 0.0);
    }

    #[test]
    fn test_zero_reviews_zero_rating_component() {
        let scorer = RelevanceScorer::new(RelevanceWeights {
            rating: 1.0,
            downloads: 0.0,
            timestamp: 0.0,
            unverified: 0.5,
        });
        // A perfect average rating counts for nothing without reviews
        let score = scorer.score(&snapshot(Some(5.0), 0), 0, true, &stats());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_rating_damped_by_review_count() {
        let scorer = RelevanceScorer::new(RelevanceWeights {
            rating: 1.0,
            downloads: 0.0,
            timestamp: 0.0,
            unverified: 0.5,
        });
        let few = scorer.score(&snapshot(Some(5.0), 0), 2, true, &stats());
        let many = scorer.score(&snapshot(Some(5.0), 0), 200, true, &stats());
        assert!(few < many);
        assert!(many < 1.0);
    }

    #[test]
    fn test_unverified_discount() {
        let scorer = RelevanceScorer::new(RelevanceWeights::default());
        let ext = snapshot(Some(4.0), 5000);
        let verified = scorer.score(&ext, 10, true, &stats());
        let unverified = scorer.score(&ext, 10, false, &stats());
        assert!(unverified <= verified);
        assert_eq!(unverified, verified * 0.5);
    }

    #[test]
    fn test_degenerate_stats_stay_finite() {
        let scorer = RelevanceScorer::new(RelevanceWeights::default());
        let oldest = Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap();
        let degenerate = RelevanceStats {
            download_ref: 0.0,
            timestamp_ref: 0.0,
            oldest,
        };
        for ext in [snapshot(Some(3.0), 0), snapshot(None, 100)] {
            let score = scorer.score(&ext, 3, false, &degenerate);
            assert!(score.is_finite());
            assert!(score >= 0.0);
        }
    }

    #[test]
    fn test_stats_references() {
        let oldest = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2021, 1, 1, 0, 1, 0).unwrap();
        let stats = RelevanceStats::compute(1000, Some(oldest), now);
        assert_eq!(stats.download_ref, 1600.0);
        assert_eq!(stats.timestamp_ref, 120.0);

        // No active extensions: "now" anchors both references
        let empty = RelevanceStats::compute(0, None, now);
        assert_eq!(empty.download_ref, 100.0);
        assert_eq!(empty.timestamp_ref, 60.0);
        assert_eq!(empty.oldest, now);
    }
}
