// Scheduler - Fetch/retry cadence and the independent redraw timer
//
// Two timers run side by side on one task: the fetch chain, whose next delay
// depends on the previous outcome, and a fixed redraw interval that re-renders
// whatever dataset is cached.
use crate::application::forecast_source::{FetchError, ForecastSource};
use crate::application::normalizer::{normalize, NormalizerConfig};
use crate::domain::chart::NormalizedSeries;
use crate::domain::forecast::RawForecast;
use chrono::{DateTime, Utc};
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};

/// Draws a cached dataset. Invoked on every redraw tick and after the first load.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, series: &NormalizedSeries, updated_at: DateTime<Utc>);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleConfig {
    /// Steady fetch cadence and redraw period.
    pub update_interval: Duration,
    /// Fetch cadence until the first payload has been normalized.
    pub retry_delay: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_millis(10 * 60 * 1000),
            retry_delay: Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleState {
    /// Set once the first payload normalized successfully.
    pub loaded: bool,
    pub cached: Option<NormalizedSeries>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Pending fetch timer; `None` while a fetch is in flight or once fetching halted.
    pub next_fetch: Option<Instant>,
}

/// Delay before the next fetch, or `None` when the chain must stop.
///
/// `was_loaded` is the loaded flag as it stood before the settled cycle.
pub fn next_fetch_delay<T>(
    outcome: &Result<T, FetchError>,
    was_loaded: bool,
    config: &ScheduleConfig,
) -> Option<Duration> {
    if let Err(e) = outcome {
        if !e.is_retryable() {
            return None;
        }
    }
    Some(if was_loaded {
        config.update_interval
    } else {
        config.retry_delay
    })
}

pub struct Scheduler {
    source: Arc<dyn ForecastSource>,
    renderer: Arc<dyn ChartRenderer>,
    normalizer: NormalizerConfig,
    config: ScheduleConfig,
    state: ScheduleState,
}

impl Scheduler {
    pub fn new(
        source: Arc<dyn ForecastSource>,
        renderer: Arc<dyn ChartRenderer>,
        normalizer: NormalizerConfig,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            source,
            renderer,
            normalizer,
            config,
            state: ScheduleState::default(),
        }
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    /// Fold a settled fetch into the state and return the delay before the next one.
    pub fn on_fetch_settled(&mut self, outcome: Result<RawForecast, FetchError>) -> Option<Duration> {
        let was_loaded = self.state.loaded;
        let delay = next_fetch_delay(&outcome, was_loaded, &self.config);

        match outcome {
            Ok(raw) => self.accept_payload(&raw),
            Err(e @ FetchError::Authentication) | Err(e @ FetchError::Configuration(_)) => {
                tracing::error!("Forecast fetch failed: {}; not retrying", e);
            }
            Err(e) => {
                tracing::warn!("Forecast fetch failed: {}", e);
            }
        }

        if let Some(delay) = delay {
            tracing::debug!("Next forecast fetch in {:?}", delay);
        }
        delay
    }

    fn accept_payload(&mut self, raw: &RawForecast) {
        match normalize(raw, &self.normalizer) {
            Ok(series) => {
                let first_load = !self.state.loaded;
                tracing::info!(
                    "Normalized forecast for {} with {} samples",
                    raw.location_record()
                        .and_then(|r| r.name.as_deref())
                        .unwrap_or("unnamed location"),
                    series.len().saturating_sub(2)
                );
                self.state.cached = Some(series);
                self.state.updated_at = Some(Utc::now());
                self.state.loaded = true;
                if first_load {
                    self.redraw();
                }
            }
            // Keep showing the previous dataset
            Err(e) => tracing::error!("Discarding forecast payload: {}", e),
        }
    }

    pub fn redraw(&self) {
        match (&self.state.cached, self.state.updated_at) {
            (Some(series), Some(updated_at)) => self.renderer.render(series, updated_at),
            _ => tracing::debug!("Nothing cached yet, skipping redraw"),
        }
    }

    /// Drive both timers until `shutdown` fires.
    pub async fn run(mut self, mut shutdown: watch::Receiver<()>) {
        let start = Instant::now();
        let mut redraw = interval_at(start + self.config.update_interval, self.config.update_interval);
        redraw.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut in_flight: Option<JoinHandle<Result<RawForecast, FetchError>>> = None;
        self.state.next_fetch = Some(start);

        tracing::info!(
            "Scheduler started (update every {:?}, retry after {:?})",
            self.config.update_interval,
            self.config.retry_delay
        );

        loop {
            tokio::select! {
                _ = wait_until(self.state.next_fetch), if in_flight.is_none() => {
                    self.state.next_fetch = None;
                    let source = self.source.clone();
                    in_flight = Some(tokio::spawn(async move { source.fetch().await }));
                }
                joined = settle(&mut in_flight) => {
                    in_flight = None;
                    let outcome = joined.unwrap_or_else(|e| {
                        Err(FetchError::Transient(format!("fetch task failed: {}", e)))
                    });
                    self.state.next_fetch = self
                        .on_fetch_settled(outcome)
                        .map(|delay| Instant::now() + delay);
                }
                _ = redraw.tick() => {
                    self.redraw();
                }
                _ = shutdown.changed() => {
                    tracing::info!("Scheduler shutting down");
                    break;
                }
            }
        }

        if let Some(handle) = in_flight {
            handle.abort();
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

async fn settle<T>(handle: &mut Option<JoinHandle<T>>) -> Result<T, JoinError> {
    match handle {
        Some(handle) => handle.await,
        None => pending().await,
    }
}
