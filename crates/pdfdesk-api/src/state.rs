//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use pdfdesk_convert::Converter;
use pdfdesk_core::config::AppConfig;
use pdfdesk_core::operation::OperationCatalog;
use pdfdesk_core::result::AppResult;
use pdfdesk_service::TransformInvoker;
use pdfdesk_storage::ArtifactStore;

use crate::middleware::rate_limit::RateLimiter;
use crate::response::ResponseBuilder;

/// Shared application state, cloned into every handler.
///
/// Everything here is built once at startup and never mutated afterwards,
/// apart from the rate limiter's counters.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Effective configuration.
    pub config: Arc<AppConfig>,
    /// Operation → upload rules.
    pub catalog: Arc<OperationCatalog>,
    /// Artifact directories.
    pub store: ArtifactStore,
    /// Conversion provider chains.
    pub converter: Arc<Converter>,
    /// Job runner.
    pub invoker: Arc<TransformInvoker>,
    /// Success payload builder.
    pub responses: Arc<ResponseBuilder>,
    /// Per-client request budget for `/api`.
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Open the artifact store and build every shared component.
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let store = ArtifactStore::open(&config.storage).await?;
        let catalog = Arc::new(OperationCatalog::new(&config.storage));
        let converter = Arc::new(Converter::from_config(&config.converters));
        let invoker = Arc::new(TransformInvoker::new(store.clone(), Arc::clone(&converter)));
        let responses = Arc::new(ResponseBuilder::new(config.server.public_base_url.clone()));
        let rate_limiter = RateLimiter::from_config(&config.server.rate_limit);

        Ok(Self {
            config: Arc::new(config),
            catalog,
            store,
            converter,
            invoker,
            responses,
            rate_limiter,
        })
    }
}
