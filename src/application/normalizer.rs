// Series normalizer - Turns a raw forecast into a padded, chart-ready dataset
use crate::domain::chart::{AxisId, AxisRange, NamedSeries, NormalizedSeries, SeriesRole};
use crate::domain::forecast::{RawForecast, WeatherElement, TIMESTAMP_FORMAT};
use chrono::{NaiveDateTime, Timelike};
use std::collections::BTreeMap;
use std::sync::Arc;

const ICON_SERIES_NAME: &str = "Icons";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("unparsable timestamp: {0:?}")]
    UnparsableTimestamp(String),
}

type Result<T> = std::result::Result<T, NormalizeError>;

/// Maps an icon code and the day/night flag to an icon asset reference.
pub trait IconAssetResolver: Send + Sync {
    fn resolve(&self, code: &str, is_night: bool) -> String;
}

/// Element names bound to each role the normalizer reads.
#[derive(Debug, Clone)]
pub struct ElementRoles {
    /// Primary cadence; drives labels and carries the icon code.
    pub condition: String,
    /// Numeric series at the primary cadence.
    pub value: String,
    /// Numeric series at a coarser, integer-multiple cadence.
    pub coarse: String,
    /// Position of the icon code within a condition sample's values.
    pub icon_value_index: usize,
}

impl Default for ElementRoles {
    fn default() -> Self {
        Self {
            condition: "Wx".to_string(),
            value: "AT".to_string(),
            coarse: "PoP6h".to_string(),
            icon_value_index: 1,
        }
    }
}

#[derive(Clone)]
pub struct NormalizerConfig {
    pub sample_count: usize,
    pub icon_day_start: u32,
    pub icon_night_start: u32,
    pub rounding_decimal_places: u32,
    pub value_padding: f64,
    pub fixed_axis: AxisRange,
    pub coarse_axis: AxisId,
    pub roles: ElementRoles,
    pub icon_resolver: Arc<dyn IconAssetResolver>,
}

impl NormalizerConfig {
    pub fn new(icon_resolver: Arc<dyn IconAssetResolver>) -> Self {
        Self {
            sample_count: 24,
            icon_day_start: 6,
            icon_night_start: 18,
            rounding_decimal_places: 1,
            value_padding: 5.0,
            fixed_axis: AxisRange::new(-10.0, 200.0),
            coarse_axis: AxisId::Fixed,
            roles: ElementRoles::default(),
            icon_resolver,
        }
    }

    pub fn is_night(&self, hour: u32) -> bool {
        hour < self.icon_day_start || hour >= self.icon_night_start
    }
}

/// Build the padded multi-series dataset for the first location in `raw`.
pub fn normalize(raw: &RawForecast, config: &NormalizerConfig) -> Result<NormalizedSeries> {
    let record = raw
        .location_record()
        .ok_or_else(|| malformed("payload carries no location record"))?;

    let condition = required_element(record.element(&config.roles.condition), &config.roles.condition)?;
    let value = required_element(record.element(&config.roles.value), &config.roles.value)?;
    let coarse = required_element(record.element(&config.roles.coarse), &config.roles.coarse)?;

    let count = config.sample_count.min(condition.time.len());
    if count == 0 {
        return Err(malformed("no samples selected"));
    }
    // a single sample reads coarse index 0 whatever the cadence
    let ratio = if count > 1 { cadence_ratio(condition, coarse)? } else { 1 };
    if value.time.len() < count {
        return Err(malformed(format!(
            "`{}` has {} samples, expected at least {}",
            value.name,
            value.time.len(),
            count
        )));
    }
    let coarse_needed = (count - 1) / ratio + 1;
    if coarse.time.len() < coarse_needed {
        return Err(malformed(format!(
            "`{}` has {} samples, expected at least {}",
            coarse.name,
            coarse.time.len(),
            coarse_needed
        )));
    }

    // Sentinel slots on both ends keep edge points and icons off the axes
    let mut labels = vec![String::new()];
    let mut values = vec![f64::NAN];
    let mut coarse_values = vec![f64::NAN];
    let mut icon_assets = vec![None];

    for (i, sample) in condition.time.iter().take(count).enumerate() {
        let timestamp = parse_timestamp(&sample.start_time)?;
        let hour = timestamp.hour();

        labels.push(hour_label(&timestamp));
        values.push(numeric_value(value, i)?);
        coarse_values.push(numeric_value(coarse, i / ratio)?);

        let code = sample.value(config.roles.icon_value_index).ok_or_else(|| {
            malformed(format!(
                "`{}` sample {} has no icon code at position {}",
                condition.name, i, config.roles.icon_value_index
            ))
        })?;
        icon_assets.push(Some(
            config.icon_resolver.resolve(&code.value, config.is_night(hour)),
        ));
    }

    labels.push(String::new());
    values.push(f64::NAN);
    coarse_values.push(f64::NAN);
    icon_assets.push(None);

    let value_range = padded_range(&values[1..values.len() - 1], config.value_padding);

    let mut icon_line = vec![f64::NAN];
    icon_line.extend(std::iter::repeat(value_range.max - 1.0).take(count));
    icon_line.push(f64::NAN);

    let mut axis_ranges = BTreeMap::new();
    axis_ranges.insert(AxisId::Value, value_range);
    axis_ranges.insert(AxisId::Coarse, value_range);
    axis_ranges.insert(AxisId::Icon, value_range);
    axis_ranges.insert(AxisId::Fixed, config.fixed_axis);

    let series = vec![
        NamedSeries::new(value.name.clone(), SeriesRole::Value, AxisId::Value, values),
        NamedSeries::new(coarse.name.clone(), SeriesRole::Coarse, config.coarse_axis, coarse_values),
        NamedSeries::new(
            ICON_SERIES_NAME.to_string(),
            SeriesRole::IconOverlay,
            AxisId::Icon,
            icon_line,
        ),
    ];

    Ok(NormalizedSeries {
        labels,
        series,
        icon_assets,
        axis_ranges,
    })
}

/// Round half away from zero to `places` decimals and render the shortest text.
///
/// NaN sentinels render as an empty label.
pub fn format_value_label(value: f64, places: u32) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let scale = 10f64.powi(places as i32);
    let rounded = (value * scale).round() / scale;
    // avoid "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{}", rounded)
}

pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
        .map_err(|_| NormalizeError::UnparsableTimestamp(text.to_string()))
}

/// Two-digit hour of day. Not a date: rollover must be read from the timestamp.
pub fn hour_label(timestamp: &NaiveDateTime) -> String {
    format!("{:02}", timestamp.hour())
}

fn required_element<'a>(element: Option<&'a WeatherElement>, name: &str) -> Result<&'a WeatherElement> {
    match element {
        Some(e) if !e.time.is_empty() => Ok(e),
        Some(_) => Err(malformed(format!("element `{}` has no samples", name))),
        None => Err(malformed(format!("element `{}` is missing", name))),
    }
}

fn numeric_value(element: &WeatherElement, index: usize) -> Result<f64> {
    element
        .time
        .get(index)
        .and_then(|sample| sample.value(0))
        .and_then(|v| v.as_f64())
        .ok_or_else(|| malformed(format!("`{}` sample {} is not numeric", element.name, index)))
}

/// Width of one regular sample of `element`.
///
/// The first block is often cut short at the issue time, so the second sample is measured
/// first: its own bounds, else the gap to the third start. The first sample is the fallback.
fn sampling_interval(element: &WeatherElement) -> Result<i64> {
    let time = &element.time;
    let span = |from: &str, to: &str| -> Result<i64> {
        let from = parse_timestamp(from)?;
        Ok((parse_timestamp(to)? - from).num_seconds())
    };

    if let Some(second) = time.get(1) {
        if let Some(end) = &second.end_time {
            return span(&second.start_time, end);
        }
        if let Some(third) = time.get(2) {
            return span(&second.start_time, &third.start_time);
        }
    }
    let first = &time[0];
    match (&first.end_time, time.get(1)) {
        (Some(end), _) => span(&first.start_time, end),
        (None, Some(second)) => span(&first.start_time, &second.start_time),
        (None, None) => Err(malformed(format!(
            "cannot determine sampling interval of `{}`",
            element.name
        ))),
    }
}

/// How many primary samples one coarse sample covers.
fn cadence_ratio(primary: &WeatherElement, coarse: &WeatherElement) -> Result<usize> {
    let primary_secs = sampling_interval(primary)?;
    let coarse_secs = sampling_interval(coarse)?;
    if primary_secs <= 0 || coarse_secs < primary_secs || coarse_secs % primary_secs != 0 {
        return Err(malformed(format!(
            "`{}` interval {}s is not a whole multiple of `{}` interval {}s",
            coarse.name, coarse_secs, primary.name, primary_secs
        )));
    }
    Ok((coarse_secs / primary_secs) as usize)
}

fn padded_range(values: &[f64], padding: f64) -> AxisRange {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    AxisRange::new(min - padding, max + padding)
}

fn malformed(reason: impl Into<String>) -> NormalizeError {
    NormalizeError::MalformedPayload(reason.into())
}
