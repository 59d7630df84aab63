use std::sync::Arc;

use crate::config::Config;
use crate::db::RowFetcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Row source for the candidate view. Postgres in production.
    pub fetcher: Arc<dyn RowFetcher>,
    pub config: Config,
}
