use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::search::{PageRequest, QueryOptions, SearchResponse, SortBy, SortOrder};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Query parameters of the search endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub query: Option<String>,
    pub category: Option<String>,
    pub size: Option<usize>,
    pub offset: Option<usize>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub include_all_versions: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultJson {
    pub extension_ids: Vec<i64>,
    pub total_hits: u64,
    pub offset: usize,
    pub size: usize,
}

/// Search active extensions.
///
/// Returns an ordered page of extension ids plus the total match count;
/// hydrating the ids into full extension records is left to the caller.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResultJson>> {
    let size = params.size.unwrap_or(18);
    let offset = params.offset.unwrap_or(0);
    if size == 0 {
        return Err(AppError::Validation(
            "size parameter must be greater than zero".to_string(),
        ));
    }

    let sort_by = match params.sort_by.as_deref() {
        None => SortBy::Relevance,
        Some(value) => value.parse::<SortBy>().map_err(|_| {
            AppError::Validation(
                "sortBy parameter must be 'relevance', 'timestamp', 'averageRating' or 'downloadCount'"
                    .to_string(),
            )
        })?,
    };
    let sort_order = match params.sort_order.as_deref() {
        None => SortOrder::Desc,
        Some(value) => value.parse::<SortOrder>().map_err(|_| {
            AppError::Validation("sortOrder parameter must be either 'asc' or 'desc'".to_string())
        })?,
    };

    let options = QueryOptions::new(
        params.query,
        params.category,
        size,
        offset,
        sort_order,
        sort_by,
        params.include_all_versions.unwrap_or(false),
    );
    // The gallery pages by offset; offsets between page boundaries round
    // down to the containing page
    let page = PageRequest::of(offset / size, size).map_err(AppError::from)?;

    let SearchResponse {
        extension_ids,
        total_hits,
    } = state.search.search(&options, &page).await?;

    Ok(Json(SearchResultJson {
        extension_ids,
        total_hits,
        offset,
        size,
    }))
}

/// Parameters of the explicit rebuild trigger
#[derive(Debug, Deserialize)]
pub struct RebuildParams {
    /// Delete and recreate the index instead of repopulating it
    pub hard: Option<bool>,
}

/// Explicitly rebuild the search index
pub async fn rebuild_search_index(
    State(state): State<AppState>,
    Query(params): Query<RebuildParams>,
) -> Result<Json<serde_json::Value>> {
    if !state.search.is_enabled() {
        return Err(AppError::Validation(
            "search engine is not enabled".to_string(),
        ));
    }
    state.search.rebuild(params.hard.unwrap_or(false)).await?;
    Ok(Json(json!({ "status": "ok" })))
}
