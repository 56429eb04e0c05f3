// Chunked newline-delimited JSON streaming of chart updates
use crate::infrastructure::chart_mapper::ChartPayload;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use std::future::Future;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Create a chunked response with one JSON document per line
pub fn chunked_json_stream<S>(stream: S) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = ChartPayload> + Send + 'static,
{
    let byte_stream = stream.map(|payload| serialize_chunk(&payload));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

fn serialize_chunk(payload: &ChartPayload) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(payload).map_err(std::io::Error::other)?;

    let mut chunk = BytesMut::with_capacity(json.len() + 1);
    chunk.put_slice(&json);
    chunk.put_u8(b'\n');

    Ok(chunk.freeze())
}

/// Stream the current payload (if any) followed by every published update, until `until` resolves
pub fn stream_from_watch<F>(rx: watch::Receiver<Option<ChartPayload>>, until: F) -> impl IntoResponse
where
    F: Future<Output = ()> + Send + 'static,
{
    let stream = WatchStream::new(rx)
        .filter_map(|payload| async move { payload })
        .take_until(until);

    match chunked_json_stream(stream) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::normalizer::normalize;
    use crate::application::normalizer::tests::{sample_forecast, test_config};
    use crate::infrastructure::chart_mapper::chart_to_payload;
    use chrono::Utc;

    #[test]
    fn test_chunk_is_one_json_line() {
        let normalized = normalize(&sample_forecast(), &test_config()).unwrap();
        let payload = chart_to_payload(&normalized, "Forecast", Utc::now(), 1);

        let chunk = serialize_chunk(&payload).unwrap();
        assert_eq!(chunk.last(), Some(&b'\n'));
        assert_eq!(chunk.iter().filter(|b| **b == b'\n').count(), 1);

        let value: serde_json::Value = serde_json::from_slice(&chunk[..chunk.len() - 1]).unwrap();
        assert_eq!(value["title"], "Forecast");
    }

    #[tokio::test]
    async fn test_watch_stream_skips_empty_state() {
        let (tx, rx) = watch::channel(None);
        let mut stream = Box::pin(WatchStream::new(rx).filter_map(|payload| async move { payload }));

        let normalized = normalize(&sample_forecast(), &test_config()).unwrap();
        tx.send_replace(Some(chart_to_payload(&normalized, "Forecast", Utc::now(), 1)));

        let first = stream.next().await.unwrap();
        assert_eq!(first.labels.len(), 6);
    }
}
