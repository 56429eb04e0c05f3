// Mapper from the normalized dataset to the renderer-facing payload
use crate::application::normalizer::format_value_label;
use crate::domain::chart::{AxisId, AxisRange, NamedSeries, NormalizedSeries, SeriesRole};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// NaN sentinels serialize as `null`, which the renderer treats as "no point".
#[derive(Debug, Clone, Serialize)]
pub struct ChartPayload {
    pub title: String,
    pub updated_at: DateTime<Utc>,
    pub labels: Vec<String>,
    pub datasets: Vec<DatasetPayload>,
    pub icons: Vec<Option<String>>,
    pub ranges: BTreeMap<AxisId, AxisRange>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetPayload {
    pub name: String,
    pub axis: AxisId,
    pub data: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_labels: Option<Vec<String>>,
}

pub fn chart_to_payload(
    series: &NormalizedSeries,
    title: &str,
    updated_at: DateTime<Utc>,
    decimal_places: u32,
) -> ChartPayload {
    let datasets = series
        .series
        .iter()
        .map(|s| dataset_to_payload(s, decimal_places))
        .collect();

    ChartPayload {
        title: title.to_string(),
        updated_at,
        labels: series.labels.clone(),
        datasets,
        icons: series.icon_assets.clone(),
        ranges: series.axis_ranges.clone(),
    }
}

fn dataset_to_payload(series: &NamedSeries, decimal_places: u32) -> DatasetPayload {
    // the icon overlay is positional only
    let data_labels = match series.role {
        SeriesRole::IconOverlay => None,
        SeriesRole::Value | SeriesRole::Coarse => Some(
            series
                .values
                .iter()
                .map(|v| format_value_label(*v, decimal_places))
                .collect(),
        ),
    };

    DatasetPayload {
        name: series.name.clone(),
        axis: series.axis,
        data: series.values.clone(),
        data_labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::normalizer::normalize;
    use crate::application::normalizer::tests::{sample_forecast, test_config};
    use serde_json::json;

    #[test]
    fn test_payload_json_shape() {
        let normalized = normalize(&sample_forecast(), &test_config()).unwrap();
        let updated_at = DateTime::parse_from_rfc3339("2026-10-16T08:05:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let payload = chart_to_payload(&normalized, "Forecast", updated_at, 1);
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["title"], "Forecast");
        assert_eq!(value["updated_at"], "2026-10-16T08:05:00Z");
        assert_eq!(value["labels"], json!(["", "08", "09", "10", "11", ""]));

        let temps = &value["datasets"][0];
        assert_eq!(temps["name"], "AT");
        assert_eq!(temps["axis"], "value");
        assert_eq!(temps["data"], json!([null, 20.0, 21.0, 19.0, 22.0, null]));
        assert_eq!(temps["data_labels"], json!(["", "20", "21", "19", "22", ""]));

        let icons = &value["datasets"][2];
        assert_eq!(icons["name"], "Icons");
        assert!(icons.get("data_labels").is_none());

        assert_eq!(value["icons"][0], json!(null));
        assert_eq!(value["icons"][1], "day/1");
        assert_eq!(value["ranges"]["value"], json!({ "min": 14.0, "max": 27.0 }));
        assert_eq!(value["ranges"]["fixed"], json!({ "min": -10.0, "max": 200.0 }));
    }

    #[test]
    fn test_labels_rounded_values_kept() {
        let mut normalized = normalize(&sample_forecast(), &test_config()).unwrap();
        normalized.series[0].values[1] = 20.46;
        let payload = chart_to_payload(&normalized, "Forecast", Utc::now(), 1);
        assert_eq!(payload.datasets[0].data[1], 20.46);
        assert_eq!(payload.datasets[0].data_labels.as_ref().unwrap()[1], "20.5");
    }
}
