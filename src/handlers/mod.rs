mod features;
mod reads;
mod service_info;

pub use features::get_features;
pub use reads::get_reads;
pub use service_info::service_info;

use crate::engine::{CancelToken, EngineConfig};
use crate::storage::Storage;
use crate::{Config, Error, Result};
use axum::{Router, routing::get};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub engine: EngineConfig,
    pub default_budget: usize,
    pub default_frame: u64,
    pub query_timeout: Duration,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: &Config) -> Self {
        Self {
            storage,
            engine: config.engine_config(),
            default_budget: config.default_budget,
            default_frame: config.default_frame,
            query_timeout: Duration::from_secs(config.query_timeout_secs),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/reads/:id", get(get_reads))
        .route("/features/:id", get(get_features))
        .route("/", get(service_info))
        .route("/service-info", get(service_info))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Runs a file-backed query on the blocking pool. The query's token is
/// tripped when `timeout` elapses or the calling future is dropped.
async fn run_blocking<T, F>(timeout: Duration, query: F) -> Result<T>
where
    F: FnOnce(CancelToken) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let cancel = CancelToken::new();
    let _guard = cancel.drop_guard();
    let worker = cancel.clone();
    let task = tokio::task::spawn_blocking(move || query(worker));

    match tokio::time::timeout(timeout, task).await {
        Ok(joined) => joined.map_err(|e| Error::Internal(format!("query task failed: {}", e)))?,
        Err(_) => {
            cancel.cancel();
            tracing::warn!(timeout_secs = timeout.as_secs(), "query timed out");
            Err(Error::Timeout(timeout.as_secs()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_blocking_returns_result() {
        let value = run_blocking(Duration::from_secs(5), |_| Ok(42)).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_run_blocking_times_out_and_cancels() {
        let (tx, rx) = std::sync::mpsc::channel();
        let result: Result<()> = run_blocking(Duration::from_millis(50), move |cancel| {
            while !cancel.is_cancelled() {
                std::thread::sleep(Duration::from_millis(5));
            }
            let _ = tx.send(());
            cancel.check()
        })
        .await;

        assert!(matches!(result, Err(Error::Timeout(0))));
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}
