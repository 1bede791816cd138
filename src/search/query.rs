//! Search query value objects and shared result ordering

use crate::search::document::SearchEntry;
use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Sort direction for search results
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Field to sort search results by
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    Relevance,
    Timestamp,
    AverageRating,
    DownloadCount,
}

/// Immutable query options, constructed fresh per request.
///
/// Two instances with the same field values are interchangeable; there is
/// no identity beyond the values themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Free-text query, `None` to match everything
    pub query_string: Option<String>,

    /// Exact-match category filter
    pub category: Option<String>,

    /// Requested page size as given by the caller
    pub requested_size: usize,

    /// Requested offset as given by the caller
    pub requested_offset: usize,

    /// Sort direction
    pub sort_order: SortOrder,

    /// Sort field
    pub sort_by: SortBy,

    /// Whether the caller will hydrate all versions of each result
    pub include_all_versions: bool,
}

impl QueryOptions {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        query_string: Option<String>,
        category: Option<String>,
        requested_size: usize,
        requested_offset: usize,
        sort_order: SortOrder,
        sort_by: SortBy,
        include_all_versions: bool,
    ) -> Self {
        Self {
            query_string,
            category,
            requested_size,
            requested_offset,
            sort_order,
            sort_by,
            include_all_versions,
        }
    }

    /// Validate caller-supplied sizes
    pub fn validate(&self) -> SearchResult<()> {
        if self.requested_size == 0 {
            return Err(SearchError::InvalidQuery(
                "size parameter must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            query_string: None,
            category: None,
            requested_size: 18,
            requested_offset: 0,
            sort_order: SortOrder::default(),
            sort_by: SortBy::default(),
            include_all_versions: false,
        }
    }
}

/// A zero-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page index
    pub number: usize,

    /// Page size, at least one
    pub size: usize,
}

impl PageRequest {
    pub fn of(number: usize, size: usize) -> SearchResult<Self> {
        if size == 0 {
            return Err(SearchError::InvalidQuery(
                "page size must be at least one".to_string(),
            ));
        }
        Ok(Self { number, size })
    }
}

/// Result of a search query: an ordered page of extension ids plus the
/// total match count. Hydrating ids into full records is the caller's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub extension_ids: Vec<i64>,
    pub total_hits: u64,
}

/// A scored entry as produced by one of the backends.
///
/// `score` is the engine's text-match score; the fallback backend, which
/// does not score text matches, leaves it at zero for every entry so the
/// stored relevance value decides the ordering.
#[derive(Debug, Clone)]
pub(crate) struct RankedEntry {
    pub entry: SearchEntry,
    pub score: f32,
}

/// Order entries by the requested sort field.
///
/// Ties are always broken by ascending extension id, so repeated queries
/// over unchanged data paginate identically regardless of backend. Missing
/// field values compare as zero.
pub(crate) fn sort_entries(entries: &mut [RankedEntry], sort_by: SortBy, sort_order: SortOrder) {
    entries.sort_by(|a, b| {
        let primary = match sort_by {
            SortBy::Relevance => a
                .score
                .total_cmp(&b.score)
                .then_with(|| a.entry.relevance.total_cmp(&b.entry.relevance)),
            SortBy::Timestamp => a.entry.timestamp.cmp(&b.entry.timestamp),
            SortBy::AverageRating => a
                .entry
                .average_rating
                .unwrap_or(0.0)
                .total_cmp(&b.entry.average_rating.unwrap_or(0.0)),
            SortBy::DownloadCount => a.entry.download_count.cmp(&b.entry.download_count),
        };
        let primary = match sort_order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.entry.id.cmp(&b.entry.id))
    });
}

/// Slice one page of ids out of ordered entries
pub(crate) fn page_ids(entries: &[RankedEntry], page: &PageRequest) -> Vec<i64> {
    entries
        .iter()
        .skip(page.number * page.size)
        .take(page.size)
        .map(|ranked| ranked.entry.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(id: i64, relevance: f64, downloads: i64) -> RankedEntry {
        let mut entry = SearchEntry::empty(id);
        entry.relevance = relevance;
        entry.download_count = downloads;
        entry.timestamp = Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap();
        RankedEntry { entry, score: 0.0 }
    }

    #[test]
    fn test_sort_by_parse() {
        assert_eq!("relevance".parse::<SortBy>().unwrap(), SortBy::Relevance);
        assert_eq!(
            "averageRating".parse::<SortBy>().unwrap(),
            SortBy::AverageRating
        );
        assert_eq!(
            "downloadCount".parse::<SortBy>().unwrap(),
            SortBy::DownloadCount
        );
        assert!("rating".parse::<SortBy>().is_err());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("descending".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_options_value_equality() {
        let a = QueryOptions::new(
            Some("yaml".into()),
            None,
            18,
            0,
            SortOrder::Desc,
            SortBy::Relevance,
            false,
        );
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(PageRequest::of(0, 0).is_err());
        let mut options = QueryOptions::default();
        options.requested_size = 0;
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_download_sort_with_id_tiebreak() {
        let mut entries = vec![entry(3, 0.0, 100), entry(1, 0.0, 100), entry(2, 0.0, 500)];
        sort_entries(&mut entries, SortBy::DownloadCount, SortOrder::Desc);
        let ids: Vec<i64> = entries.iter().map(|r| r.entry.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_missing_rating_sorts_as_zero() {
        let mut a = entry(1, 0.0, 0);
        a.entry.average_rating = Some(2.5);
        let b = entry(2, 0.0, 0);
        let mut entries = vec![a, b];
        sort_entries(&mut entries, SortBy::AverageRating, SortOrder::Asc);
        let ids: Vec<i64> = entries.iter().map(|r| r.entry.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_page_slicing() {
        let entries: Vec<RankedEntry> = (0..7).map(|i| entry(i, 0.0, 0)).collect();
        let page = PageRequest::of(2, 2).unwrap();
        assert_eq!(page_ids(&entries, &page), vec![4, 5]);
        let beyond = PageRequest::of(4, 2).unwrap();
        assert!(page_ids(&entries, &beyond).is_empty());
    }
}
