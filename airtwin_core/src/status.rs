//! Threshold tables mapping adjusted readings to a status and a color.

use crate::engine::{DisplaySink, MetricUpdate};
use crate::reading::Metric;
use chrono::{DateTime, NaiveDateTime};
use serde::{Serialize, Serializer};

/// RGB color of an indicator sphere / particle cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndicatorColor(pub u32);

impl IndicatorColor {
    pub const GREEN: IndicatorColor = IndicatorColor(0x00ff00);
    pub const ORANGE: IndicatorColor = IndicatorColor(0xffa500);
    pub const RED: IndicatorColor = IndicatorColor(0xff0000);
    pub const PURPLE: IndicatorColor = IndicatorColor(0x800080);
    pub const MAROON: IndicatorColor = IndicatorColor(0x7e0023);
    pub const BLUE: IndicatorColor = IndicatorColor(0x0000ff);
    pub const LIGHT_BLUE: IndicatorColor = IndicatorColor(0xadd8e6);
    pub const GREY: IndicatorColor = IndicatorColor(0x808080);

    /// Returns `[r, g, b]`.
    pub fn rgb(&self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }

    /// Returns `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:06x}", self.0 & 0x00ff_ffff)
    }
}

impl Serialize for IndicatorColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Result of classifying one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Status label, e.g. `"Moderate"`
    pub label: &'static str,

    /// Color name for the status dot next to the value
    pub dot: &'static str,

    /// Indicator color
    pub color: IndicatorColor,
}

impl Classification {
    /// Shown whenever a metric has nothing to display.
    pub const NO_DATA: Classification = Classification {
        label: "No Data",
        dot: "grey",
        color: IndicatorColor::GREY,
    };

    pub fn is_no_data(&self) -> bool {
        *self == Self::NO_DATA
    }
}

/// One band of a threshold table. A value belongs to the first band whose
/// upper bound it does not exceed.
struct Band {
    upper: f64,
    inclusive: bool,
    class: Classification,
}

impl Band {
    const fn below(upper: f64, label: &'static str, dot: &'static str, color: IndicatorColor) -> Self {
        Self {
            upper,
            inclusive: false,
            class: Classification { label, dot, color },
        }
    }

    const fn up_to(upper: f64, label: &'static str, dot: &'static str, color: IndicatorColor) -> Self {
        Self {
            upper,
            inclusive: true,
            class: Classification { label, dot, color },
        }
    }

    const fn rest(label: &'static str, dot: &'static str, color: IndicatorColor) -> Self {
        Self::up_to(f64::INFINITY, label, dot, color)
    }

    fn contains(&self, value: f64) -> bool {
        if self.inclusive {
            value <= self.upper
        } else {
            value < self.upper
        }
    }
}

const PM25_BANDS: &[Band] = &[
    Band::below(50.0, "Good", "green", IndicatorColor::GREEN),
    Band::below(100.0, "Moderate", "orange", IndicatorColor::ORANGE),
    Band::below(250.0, "Poor", "red", IndicatorColor::RED),
    Band::below(500.0, "Unhealthy", "purple", IndicatorColor::PURPLE),
    Band::rest("Very Poor", "#7e0023", IndicatorColor::MAROON),
];

const CO2_BANDS: &[Band] = &[
    Band::below(700.0, "Good", "green", IndicatorColor::GREEN),
    Band::below(800.0, "Moderate", "orange", IndicatorColor::ORANGE),
    Band::below(1000.0, "Poor", "red", IndicatorColor::RED),
    Band::rest("Very Poor", "#7e0023", IndicatorColor::MAROON),
];

const HUMIDITY_BANDS: &[Band] = &[
    Band::up_to(30.0, "Too Low", "red", IndicatorColor::RED),
    Band::up_to(40.0, "Low", "orange", IndicatorColor::ORANGE),
    Band::below(60.0, "Optimal", "green", IndicatorColor::GREEN),
    Band::below(70.0, "High", "blue", IndicatorColor::BLUE),
    Band::rest("Too High", "purple", IndicatorColor::PURPLE),
];

const TEMPERATURE_BANDS: &[Band] = &[
    Band::up_to(18.0, "Cold", "blue", IndicatorColor::BLUE),
    Band::up_to(21.0, "Cool", "lightblue", IndicatorColor::LIGHT_BLUE),
    Band::below(26.0, "Comfortable", "green", IndicatorColor::GREEN),
    Band::below(28.0, "Warm", "orange", IndicatorColor::ORANGE),
    Band::rest("Hot", "red", IndicatorColor::RED),
];

fn bands(metric: Metric) -> &'static [Band] {
    match metric {
        Metric::Pm25 => PM25_BANDS,
        Metric::Co2 => CO2_BANDS,
        Metric::Temperature => TEMPERATURE_BANDS,
        Metric::Humidity => HUMIDITY_BANDS,
    }
}

/// Classifies an adjusted value for `metric`.
pub fn classify(metric: Metric, value: Option<f64>) -> Classification {
    match value {
        Some(v) if v.is_finite() => bands(metric)
            .iter()
            .find(|band| band.contains(v))
            .map(|band| band.class)
            .unwrap_or(Classification::NO_DATA),
        _ => Classification::NO_DATA,
    }
}

/// Formats a value with one decimal, or `--`.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.1}"),
        _ => "--".to_string(),
    }
}

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders a dataset timestamp for display.
///
/// ISO-8601 timestamps (with or without an offset, `T` or space separated)
/// become `YYYY-MM-DD HH:MM:SS` in their own offset; anything else is shown
/// verbatim.
pub fn format_timestamp(timestamp: Option<&str>) -> String {
    let Some(raw) = timestamp else {
        return "--".to_string();
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.naive_local().format(DISPLAY_TIME_FORMAT).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format(DISPLAY_TIME_FORMAT).to_string();
        }
    }
    raw.to_string()
}

/// Latest displayed value of every metric, rendered as a single line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusBar {
    values: [Option<f64>; Metric::COUNT],
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, update: &MetricUpdate) {
        self.values[update.metric.index()] = update.value;
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.values[metric.index()]
    }
}

impl DisplaySink for StatusBar {
    fn render(&mut self, update: &MetricUpdate) {
        self.update(update);
    }
}

impl std::fmt::Display for StatusBar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = Metric::ALL
            .iter()
            .map(|m| format!("{} {}", m.label(), format_value(self.value(*m))))
            .collect();
        write!(f, "{}", parts.join(" | "))
    }
}
