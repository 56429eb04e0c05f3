// Application state for HTTP handlers
use crate::presentation::chart_publisher::ChartPublisher;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub publisher: Arc<ChartPublisher>,
    /// Ends open chart streams so graceful shutdown can finish
    pub shutdown: watch::Receiver<()>,
}
