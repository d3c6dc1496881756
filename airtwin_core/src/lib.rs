//! AirTwin Core - Indoor Air-Quality Digital Twin
//!
//! Replays recorded indoor air-quality readings (PM2.5, CO2, temperature,
//! humidity) and shows what they would look like under a mitigation
//! scenario:
//! 1. **Parsing**: semicolon-delimited datasets into ordered `Reading`s
//! 2. **Cycling**: one wrapping cursor per metric, advanced on a cadence
//! 3. **Adjustment**: the active scenario's percentage delta, clamped at zero
//! 4. **Classification**: fixed thresholds to status labels and colors

pub mod reading;
pub mod parser;
pub mod scenario;
pub mod cursor;
pub mod engine;
pub mod status;
pub mod schedule;
pub mod layout;

#[cfg(feature = "dashboard")]
pub mod dashboard;

// Re-export key types for convenience
pub use reading::{Metric, Reading};
pub use parser::{parse_readings, split_environmental, EnvironmentalStreams, ParseError};
pub use scenario::{apply_impact, Scenario, ScenarioError, ScenarioImpact};
pub use cursor::CursorState;
pub use engine::{DisplaySink, MetricUpdate, Tee, TwinSession};
pub use status::{classify, format_timestamp, format_value, Classification, IndicatorColor, StatusBar};
pub use schedule::{Cadence, Scheduler, Turn};
pub use layout::{IndicatorLayout, RoomBounds};
