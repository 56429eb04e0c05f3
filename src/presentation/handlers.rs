// HTTP request handlers
use crate::infrastructure::chunked_json::stream_from_watch;
use crate::presentation::app_state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Latest rendered chart; 204 until the first successful load
pub async fn latest_chart(State(state): State<Arc<AppState>>) -> Response {
    match state.publisher.latest() {
        Some(payload) => Json(payload).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Stream every redraw as one JSON line
pub async fn stream_chart(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut shutdown = state.shutdown.clone();
    stream_from_watch(state.publisher.subscribe(), async move {
        let _ = shutdown.changed().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::normalizer::normalize;
    use crate::application::normalizer::tests::{sample_forecast, test_config};
    use crate::application::scheduler::ChartRenderer;
    use crate::presentation::chart_publisher::ChartPublisher;
    use chrono::Utc;

    fn state() -> Arc<AppState> {
        let (_tx, shutdown) = tokio::sync::watch::channel(());
        Arc::new(AppState {
            publisher: Arc::new(ChartPublisher::new("Forecast".to_string(), &test_config())),
            shutdown,
        })
    }

    #[tokio::test]
    async fn test_latest_chart_before_first_render() {
        let response = latest_chart(State(state())).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_latest_chart_after_render() {
        let state = state();
        let normalized = normalize(&sample_forecast(), &test_config()).unwrap();
        state.publisher.render(&normalized, Utc::now());

        let response = latest_chart(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stream_chart_headers() {
        let response = stream_chart(State(state())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/x-ndjson"
        );
    }
}
