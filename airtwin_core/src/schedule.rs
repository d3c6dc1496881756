//! Periodic cadences driving the cycle operation.
//!
//! The scheduler only does deadline arithmetic; sleeping is the caller's job,
//! which keeps it usable under both the real and the virtual clock.

use crate::reading::Metric;
use std::time::Duration;

/// Smallest accepted period. Guards against a zero period spinning forever.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A periodic timer driving a fixed set of metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Cadence {
    name: &'static str,
    period: Duration,
    metrics: Vec<Metric>,
    next_due: Duration,
}

impl Cadence {
    /// Creates a cadence first due one period after time zero.
    pub fn new(name: &'static str, period: Duration, metrics: Vec<Metric>) -> Self {
        let period = period.max(MIN_PERIOD);
        Self {
            name,
            period,
            metrics,
            next_due: period,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn next_due(&self) -> Duration {
        self.next_due
    }
}

/// One cadence firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub cadence: &'static str,
    pub metrics: Vec<Metric>,
}

/// Set of cadences on a shared clock.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    cadences: Vec<Cadence>,
}

impl Scheduler {
    pub fn new(cadences: Vec<Cadence>) -> Self {
        Self { cadences }
    }

    /// The two standard cadences: PM2.5 alone, then CO2 + temperature + humidity.
    pub fn standard(pm25_period: Duration, environment_period: Duration) -> Self {
        Self::new(vec![
            Cadence::new("pm25", pm25_period, vec![Metric::Pm25]),
            Cadence::new(
                "environment",
                environment_period,
                vec![Metric::Co2, Metric::Temperature, Metric::Humidity],
            ),
        ])
    }

    pub fn cadences(&self) -> &[Cadence] {
        &self.cadences
    }

    /// Earliest pending deadline, `None` when there are no cadences.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.cadences.iter().map(|c| c.next_due).min()
    }

    /// Returns every cadence due at `now`, in declaration order, and moves
    /// each past `now`. Several missed periods collapse into one turn.
    pub fn take_due(&mut self, now: Duration) -> Vec<Turn> {
        let mut turns = Vec::new();
        for cadence in &mut self.cadences {
            if cadence.next_due > now {
                continue;
            }
            let missed = (now - cadence.next_due).as_nanos() / cadence.period.as_nanos();
            let steps = u32::try_from(missed + 1).unwrap_or(u32::MAX);
            cadence.next_due += cadence.period * steps;
            turns.push(Turn {
                cadence: cadence.name,
                metrics: cadence.metrics.clone(),
            });
        }
        turns
    }
}
