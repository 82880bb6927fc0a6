use std::sync::Arc;

use crate::config::Config;
use crate::generation::generator::GenerationOptions;
use crate::model_client::ChatModel;

/// Shared application state injected into all route handlers via Axum
/// extractors.
#[derive(Clone)]
pub struct AppState {
    /// The one shared model capability; stateless and safe to invoke
    /// concurrently up to the admission-gate bound.
    pub model: Arc<dyn ChatModel>,
    pub options: GenerationOptions,
    pub config: Config,
}
