pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::registry::InMemoryRegistry;
use crate::search::SearchService;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<InMemoryRegistry>,
    pub search: Arc<SearchService>,
}

impl AppState {
    pub fn new(registry: Arc<InMemoryRegistry>, search: Arc<SearchService>) -> Self {
        Self { registry, search }
    }
}
