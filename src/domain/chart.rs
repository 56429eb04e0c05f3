// Chart-ready dataset produced from a raw forecast
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Logical value axes a series can be plotted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisId {
    /// Padded range of the primary value series.
    Value,
    /// Coarse-cadence series; shares the value range.
    Coarse,
    /// Synthetic icon overlay; shares the value range.
    Icon,
    /// Independent axis with a fixed range.
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesRole {
    Value,
    Coarse,
    IconOverlay,
}

#[derive(Debug, Clone)]
pub struct NamedSeries {
    pub name: String,
    pub role: SeriesRole,
    pub axis: AxisId,
    pub values: Vec<f64>,
}

impl NamedSeries {
    pub fn new(name: String, role: SeriesRole, axis: AxisId, values: Vec<f64>) -> Self {
        Self {
            name,
            role,
            axis,
            values,
        }
    }

    /// Values between the two sentinel slots.
    pub fn interior(&self) -> &[f64] {
        if self.values.len() < 2 {
            return &[];
        }
        &self.values[1..self.values.len() - 1]
    }
}

/// Labels, series and icons share one length; slot 0 and the last slot are sentinels.
#[derive(Debug, Clone)]
pub struct NormalizedSeries {
    pub labels: Vec<String>,
    pub series: Vec<NamedSeries>,
    pub icon_assets: Vec<Option<String>>,
    pub axis_ranges: BTreeMap<AxisId, AxisRange>,
}

impl NormalizedSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn series(&self, role: SeriesRole) -> Option<&NamedSeries> {
        self.series.iter().find(|s| s.role == role)
    }

    pub fn axis_range(&self, axis: AxisId) -> Option<AxisRange> {
        self.axis_ranges.get(&axis).copied()
    }
}
