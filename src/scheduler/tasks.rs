//! Predefined scheduled tasks

use super::config::SchedulerConfig;
use super::core::SchedulerService;
use super::error::SchedulerResult;
use crate::search::SearchService;
use std::sync::Arc;
use tracing::error;

/// Register the daily soft update of the search index.
///
/// Relevance scores decay with publishing age relative to "now", so a
/// populated index slowly drifts; the soft update re-scores the whole
/// catalog. The facade itself skips the run when the engine backend is not
/// active or the timestamp weight is negligible, and guarantees runs never
/// overlap.
pub async fn register_search_index_update(
    scheduler: &SchedulerService,
    config: &SchedulerConfig,
    search: Arc<SearchService>,
) -> SchedulerResult<()> {
    scheduler
        .add_job(
            "search-index-update",
            &config.search_update_schedule,
            move || {
                let search = search.clone();
                async move {
                    if let Err(e) = search.update_search_index().await {
                        error!(error = %e, "Scheduled search index update failed");
                    }
                }
            },
        )
        .await?;
    Ok(())
}
