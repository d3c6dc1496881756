//! Reading records and the metrics they describe.

use serde::{Deserialize, Serialize};

/// One row of a replay dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Series name as written in the dataset (e.g. `"living_room.co2"`)
    pub series: String,

    /// Timestamp string, kept verbatim
    pub timestamp: String,

    /// Measured value, always finite
    pub value: f64,
}

impl Reading {
    /// Creates a reading.
    pub fn new(series: impl Into<String>, timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            series: series.into(),
            timestamp: timestamp.into(),
            value,
        }
    }
}

/// An indoor air-quality quantity tracked by the twin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Fine particulate matter, µg/m³
    Pm25,

    /// Carbon dioxide, ppm
    Co2,

    /// Air temperature, °C
    Temperature,

    /// Relative humidity, %
    Humidity,
}

impl Metric {
    /// Number of tracked metrics.
    pub const COUNT: usize = 4;

    /// All metrics in arena order.
    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::Pm25,
        Metric::Co2,
        Metric::Temperature,
        Metric::Humidity,
    ];

    /// Dense index into per-metric arrays.
    pub fn index(self) -> usize {
        match self {
            Metric::Pm25 => 0,
            Metric::Co2 => 1,
            Metric::Temperature => 2,
            Metric::Humidity => 3,
        }
    }

    /// Machine name, as used in exports and logs.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Pm25 => "pm25",
            Metric::Co2 => "co2",
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Pm25 => "PM2.5",
            Metric::Co2 => "CO2",
            Metric::Temperature => "TEMPERATURE",
            Metric::Humidity => "HUMIDITY",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Pm25 => "µg/m³",
            Metric::Co2 => "ppm",
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
        }
    }

    /// Substring that selects this metric's rows from the mixed
    /// environmental dataset. PM2.5 has its own dataset and no key.
    pub fn series_key(self) -> Option<&'static str> {
        match self {
            Metric::Pm25 => None,
            Metric::Co2 => Some("co2"),
            Metric::Temperature => Some("temperature"),
            Metric::Humidity => Some("humidity"),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
