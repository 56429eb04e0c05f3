// Raw forecast payload as delivered by the open-data API
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Textual layout of every timestamp in the payload.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawForecast {
    #[serde(default)]
    pub records: Records,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Records {
    #[serde(default)]
    pub locations: Vec<LocationGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationGroup {
    #[serde(default)]
    pub location: Vec<LocationRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationRecord {
    #[serde(default, rename = "locationName")]
    pub name: Option<String>,
    #[serde(default, rename = "weatherElement")]
    pub weather_elements: Vec<WeatherElement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherElement {
    #[serde(rename = "elementName")]
    pub name: String,
    #[serde(default)]
    pub time: Vec<TimeSample>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeSample {
    #[serde(rename = "startTime", alias = "dataTime")]
    pub start_time: String,
    #[serde(default, rename = "endTime")]
    pub end_time: Option<String>,
    #[serde(default, rename = "elementValue")]
    pub values: Vec<ElementValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementValue {
    #[serde(deserialize_with = "value_as_text")]
    pub value: String,
}

impl RawForecast {
    /// The single location record the widget charts: first record of the first group.
    pub fn location_record(&self) -> Option<&LocationRecord> {
        self.records
            .locations
            .first()
            .and_then(|group| group.location.first())
    }
}

impl LocationRecord {
    pub fn element(&self, name: &str) -> Option<&WeatherElement> {
        self.weather_elements.iter().find(|e| e.name == name)
    }
}

impl TimeSample {
    pub fn value(&self, index: usize) -> Option<&ElementValue> {
        self.values.get(index)
    }
}

impl ElementValue {
    /// Numeric reading of the value; the API sends numbers as strings.
    pub fn as_f64(&self) -> Option<f64> {
        self.value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

// The API mixes "20" and 20 for the same field, keep both as text
fn value_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "unsupported element value: {}",
            other
        ))),
    }
}
