pub mod auth;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod moderation;
pub mod profile;
pub mod support;

use std::sync::Arc;

use anyhow::anyhow;
use pokec_engine::{Engine, EngineError};
use pokec_gateway::dispatcher::Dispatcher;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub engine: Arc<Engine>,
    pub dispatcher: Dispatcher,
    pub jwt_secret: String,
}

/// Run a blocking engine call off the async runtime.
pub(crate) async fn run_engine<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError(EngineError::Persistence(anyhow!("engine task join error: {e}"))))?
        .map_err(ApiError)
}
