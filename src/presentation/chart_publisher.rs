// Renderer that publishes chart payloads to HTTP subscribers
use crate::application::normalizer::NormalizerConfig;
use crate::application::scheduler::ChartRenderer;
use crate::domain::chart::NormalizedSeries;
use crate::infrastructure::chart_mapper::{chart_to_payload, ChartPayload};
use chrono::{DateTime, Utc};
use tokio::sync::watch;

pub struct ChartPublisher {
    title: String,
    decimal_places: u32,
    tx: watch::Sender<Option<ChartPayload>>,
}

impl ChartPublisher {
    /// Data labels round with the same settings the normalizer runs with.
    pub fn new(title: String, normalizer: &NormalizerConfig) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            title,
            decimal_places: normalizer.rounding_decimal_places,
            tx,
        }
    }

    /// Last rendered payload, `None` before the first render
    pub fn latest(&self) -> Option<ChartPayload> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ChartPayload>> {
        self.tx.subscribe()
    }
}

impl ChartRenderer for ChartPublisher {
    fn render(&self, series: &NormalizedSeries, updated_at: DateTime<Utc>) {
        let payload = chart_to_payload(series, &self.title, updated_at, self.decimal_places);
        tracing::debug!(
            "Rendering {} labels, updated at {}",
            payload.labels.len(),
            payload.updated_at
        );
        self.tx.send_replace(Some(payload));
    }
}
