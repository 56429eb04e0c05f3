use crate::application::forecast_source::FetchError;
use crate::application::normalizer::{ElementRoles, NormalizerConfig};
use crate::application::scheduler::ScheduleConfig;
use crate::domain::chart::{AxisId, AxisRange};
use crate::infrastructure::icon_assets::UrlIconResolver;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const ENV_PREFIX: &str = "WEATHER_CHART";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub chart: ChartSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub data_id: String,
    pub api_key: String,
    pub location_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub format: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://opendata.cwb.gov.tw/api/v1/rest/datastore/".to_string(),
            data_id: String::new(),
            api_key: String::new(),
            location_name: String::new(),
            latitude: None,
            longitude: None,
            format: "JSON".to_string(),
        }
    }
}

/// Where the forecast is requested for.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationSpec {
    Named(String),
    Coordinates { latitude: f64, longitude: f64 },
}

impl ApiSettings {
    pub fn location(&self) -> Result<LocationSpec, FetchError> {
        let name = self.location_name.trim();
        if !name.is_empty() {
            return Ok(LocationSpec::Named(name.to_string()));
        }
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Ok(LocationSpec::Coordinates {
                latitude,
                longitude,
            }),
            _ => Err(FetchError::Configuration(
                "location (location_name, or latitude and longitude) must be specified".to_string(),
            )),
        }
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        if self.api_key.trim().is_empty() {
            return Err(FetchError::Configuration("api_key must be specified".to_string()));
        }
        self.location().map(|_| ())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScheduleSettings {
    pub update_interval_ms: u64,
    pub retry_delay_ms: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            update_interval_ms: 10 * 60 * 1000,
            retry_delay_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartSettings {
    pub title: String,
    pub sample_count: usize,
    pub day_start_hour: u32,
    pub night_start_hour: u32,
    pub rounding_decimal_places: u32,
    pub icon_url_base: String,
    pub value_padding: f64,
    pub fixed_axis_min: f64,
    pub fixed_axis_max: f64,
    pub coarse_axis: AxisId,
    pub elements: ElementSettings,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            title: "Taiwan Weather Forecast".to_string(),
            sample_count: 24,
            day_start_hour: 6,
            night_start_hour: 18,
            rounding_decimal_places: 1,
            icon_url_base: "https://www.cwb.gov.tw/V8/assets/img/weather_icons/weathers/svg_icon/"
                .to_string(),
            value_padding: 5.0,
            fixed_axis_min: -10.0,
            fixed_axis_max: 200.0,
            // probability reads against the fixed -10..200 axis, as the widget has always drawn it
            coarse_axis: AxisId::Fixed,
            elements: ElementSettings::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ElementSettings {
    pub condition: String,
    pub value: String,
    pub coarse: String,
    pub icon_value_index: usize,
}

impl Default for ElementSettings {
    fn default() -> Self {
        let roles = ElementRoles::default();
        Self {
            condition: roles.condition,
            value: roles.value,
            coarse: roles.coarse,
            icon_value_index: roles.icon_value_index,
        }
    }
}

impl ElementSettings {
    /// Element names in the order they are requested from the API
    pub fn names(&self) -> Vec<String> {
        vec![self.condition.clone(), self.value.clone(), self.coarse.clone()]
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), FetchError> {
        self.api.validate()?;

        let chart = &self.chart;
        if chart.sample_count == 0 {
            return Err(FetchError::Configuration("sample_count must be at least 1".to_string()));
        }
        if chart.night_start_hour > 24 || chart.day_start_hour >= chart.night_start_hour {
            return Err(FetchError::Configuration(format!(
                "day/night hours must satisfy day_start_hour < night_start_hour <= 24, got {} and {}",
                chart.day_start_hour, chart.night_start_hour
            )));
        }
        if chart.fixed_axis_min >= chart.fixed_axis_max {
            return Err(FetchError::Configuration(
                "fixed_axis_min must be below fixed_axis_max".to_string(),
            ));
        }
        Ok(())
    }

    pub fn schedule_config(&self) -> ScheduleConfig {
        ScheduleConfig {
            update_interval: Duration::from_millis(self.schedule.update_interval_ms),
            retry_delay: Duration::from_millis(self.schedule.retry_delay_ms),
        }
    }

    pub fn normalizer_config(&self) -> NormalizerConfig {
        let chart = &self.chart;
        let mut config = NormalizerConfig::new(Arc::new(UrlIconResolver::new(&chart.icon_url_base)));
        config.sample_count = chart.sample_count;
        config.icon_day_start = chart.day_start_hour;
        config.icon_night_start = chart.night_start_hour;
        config.rounding_decimal_places = chart.rounding_decimal_places;
        config.value_padding = chart.value_padding;
        config.fixed_axis = AxisRange::new(chart.fixed_axis_min, chart.fixed_axis_max);
        config.coarse_axis = chart.coarse_axis;
        config.roles = ElementRoles {
            condition: chart.elements.condition.clone(),
            value: chart.elements.value.clone(),
            coarse: chart.elements.coarse.clone(),
            icon_value_index: chart.elements.icon_value_index,
        };
        config
    }
}

/// Load `config/widget.*` overlaid with `WEATHER_CHART__SECTION__KEY` variables
pub fn load_settings() -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/widget").required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Settings {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let settings = parse("[api]\napi_key = \"CWB-123\"\nlocation_name = \"Taipei\"\n");
        assert_eq!(settings.server.bind, "0.0.0.0:8080");
        assert_eq!(settings.api.format, "JSON");
        assert_eq!(settings.schedule.update_interval_ms, 600_000);
        assert_eq!(settings.schedule.retry_delay_ms, 5000);
        assert_eq!(settings.chart.sample_count, 24);
        assert_eq!(settings.chart.coarse_axis, AxisId::Fixed);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let settings = parse(
            r#"
            [api]
            api_key = "k"
            latitude = 25.03
            longitude = 121.56

            [schedule]
            update_interval_ms = 60000
            retry_delay_ms = 1000

            [chart]
            sample_count = 12
            rounding_decimal_places = 2
            coarse_axis = "coarse"

            [chart.elements]
            value = "T"
            "#,
        );

        assert_eq!(
            settings.api.location(),
            Ok(LocationSpec::Coordinates {
                latitude: 25.03,
                longitude: 121.56
            })
        );
        let schedule = settings.schedule_config();
        assert_eq!(schedule.update_interval, Duration::from_secs(60));
        assert_eq!(schedule.retry_delay, Duration::from_secs(1));

        let normalizer = settings.normalizer_config();
        assert_eq!(normalizer.sample_count, 12);
        assert_eq!(normalizer.rounding_decimal_places, 2);
        assert_eq!(normalizer.coarse_axis, AxisId::Coarse);
        assert_eq!(normalizer.roles.value, "T");
        assert_eq!(normalizer.roles.condition, "Wx");
        assert_eq!(settings.chart.elements.names(), vec!["Wx", "T", "PoP6h"]);
    }

    #[test]
    fn test_missing_api_key() {
        let settings = parse("[api]\nlocation_name = \"Taipei\"\n");
        assert_eq!(
            settings.validate(),
            Err(FetchError::Configuration("api_key must be specified".to_string()))
        );
    }

    #[test]
    fn test_missing_location() {
        let settings = parse("[api]\napi_key = \"k\"\nlatitude = 25.0\n");
        assert!(matches!(settings.validate(), Err(FetchError::Configuration(_))));
    }

    #[test]
    fn test_invalid_day_night_hours() {
        let mut settings = parse("[api]\napi_key = \"k\"\nlocation_name = \"Taipei\"\n");
        settings.chart.day_start_hour = 18;
        settings.chart.night_start_hour = 6;
        assert!(matches!(settings.validate(), Err(FetchError::Configuration(_))));
    }
}
