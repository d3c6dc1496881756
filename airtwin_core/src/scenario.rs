//! Mitigation scenarios and the percentage adjustment they apply.

use crate::reading::Metric;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signed percentage delta per metric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioImpact {
    pub pm25: f64,
    pub co2: f64,
    pub temperature: f64,
    pub humidity: f64,
}

impl ScenarioImpact {
    /// The no-op impact.
    pub const ZERO: ScenarioImpact = ScenarioImpact {
        pm25: 0.0,
        co2: 0.0,
        temperature: 0.0,
        humidity: 0.0,
    };

    /// Returns the delta for one metric.
    pub fn for_metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Pm25 => self.pm25,
            Metric::Co2 => self.co2,
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
        }
    }
}

/// Rejected scenario selections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error("Unknown scenario: {0} (expected one of: none, air-purifier, plants, open-window, humidifier)")]
    Unknown(String),
}

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Baseline, readings shown as measured
    #[default]
    None,

    /// HEPA purifier running
    AirPurifier,

    /// Potted plants in the room
    Plants,

    /// Window opened to outside air
    OpenWindow,

    /// Humidifier running
    Humidifier,
}

impl Scenario {
    /// Returns a list of all scenarios, in selection-key order.
    pub fn all() -> Vec<Scenario> {
        vec![
            Scenario::None,
            Scenario::AirPurifier,
            Scenario::Plants,
            Scenario::OpenWindow,
            Scenario::Humidifier,
        ]
    }

    /// Returns the scenario identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Scenario::None => "none",
            Scenario::AirPurifier => "air-purifier",
            Scenario::Plants => "plants",
            Scenario::OpenWindow => "open-window",
            Scenario::Humidifier => "humidifier",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            Scenario::None => "No mitigation",
            Scenario::AirPurifier => "Air purifier: PM2.5 -50%, CO2 -5%, humidity -10%",
            Scenario::Plants => "Plants: PM2.5 -10%, CO2 -20%, humidity +10%",
            Scenario::OpenWindow => "Open window: PM2.5 -30%, CO2 -40%, temperature -10%, humidity +20%",
            Scenario::Humidifier => "Humidifier: humidity +30%",
        }
    }

    /// Returns the fixed impact table entry.
    pub fn impact(&self) -> ScenarioImpact {
        match self {
            Scenario::None => ScenarioImpact::ZERO,
            Scenario::AirPurifier => ScenarioImpact {
                pm25: -50.0,
                co2: -5.0,
                temperature: 0.0,
                humidity: -10.0,
            },
            Scenario::Plants => ScenarioImpact {
                pm25: -10.0,
                co2: -20.0,
                temperature: 0.0,
                humidity: 10.0,
            },
            Scenario::OpenWindow => ScenarioImpact {
                pm25: -30.0,
                co2: -40.0,
                temperature: -10.0,
                humidity: 20.0,
            },
            Scenario::Humidifier => ScenarioImpact {
                pm25: 0.0,
                co2: 0.0,
                temperature: 0.0,
                humidity: 30.0,
            },
        }
    }

    /// Maps a selection key (`'0'`..`'4'`) to a scenario.
    pub fn from_key(key: char) -> Option<Scenario> {
        let index = key.to_digit(10)? as usize;
        Scenario::all().get(index).copied()
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for Scenario {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Scenario::None),
            "air-purifier" => Ok(Scenario::AirPurifier),
            "plants" => Ok(Scenario::Plants),
            "open-window" => Ok(Scenario::OpenWindow),
            "humidifier" => Ok(Scenario::Humidifier),
            _ => Err(ScenarioError::Unknown(s.to_string())),
        }
    }
}

/// Scales `raw` by `impact_percent` and clamps at zero.
///
/// `None` and non-finite values pass through untouched.
pub fn apply_impact(raw: Option<f64>, impact_percent: f64) -> Option<f64> {
    match raw {
        Some(value) if value.is_finite() => {
            Some((value * (1.0 + impact_percent / 100.0)).max(0.0))
        }
        other => other,
    }
}
