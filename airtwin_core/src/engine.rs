//! The cycling adjustment engine.
//!
//! A [`TwinSession`] owns one [`CursorState`] per metric and the active
//! [`Scenario`]. Every timer turn, whichever cadence fires, goes through the
//! same [`TwinSession::cycle`] routine: read the current row, scale it by the
//! scenario's delta, advance, hand the result to a [`DisplaySink`].

use crate::cursor::CursorState;
use crate::parser::EnvironmentalStreams;
use crate::reading::{Metric, Reading};
use crate::scenario::{apply_impact, Scenario};
use crate::status::{classify, Classification};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// What a display collaborator receives for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricUpdate {
    pub metric: Metric,

    /// Adjusted value, `None` when the metric has no data
    pub value: Option<f64>,

    /// Timestamp of the underlying reading
    pub timestamp: Option<String>,

    /// Scenario the value was adjusted for
    pub scenario: Scenario,
}

impl MetricUpdate {
    /// The explicit no-data report for an empty cursor.
    pub fn no_data(metric: Metric, scenario: Scenario) -> Self {
        Self {
            metric,
            value: None,
            timestamp: None,
            scenario,
        }
    }

    fn adjusted(metric: Metric, reading: &Reading, scenario: Scenario) -> Self {
        let pct = scenario.impact().for_metric(metric);
        Self {
            metric,
            value: apply_impact(Some(reading.value), pct),
            timestamp: Some(reading.timestamp.clone()),
            scenario,
        }
    }

    pub fn has_data(&self) -> bool {
        self.value.is_some()
    }

    pub fn classification(&self) -> Classification {
        classify(self.metric, self.value)
    }
}

/// A display collaborator.
pub trait DisplaySink {
    /// Marks the start of a turn at clock reading `at`.
    ///
    /// Every update rendered until the next call belongs to that turn.
    fn begin_turn(&mut self, _at: Duration) {}

    /// Shows one metric update. Must handle the no-data case.
    fn render(&mut self, update: &MetricUpdate);
}

impl DisplaySink for Vec<MetricUpdate> {
    fn render(&mut self, update: &MetricUpdate) {
        self.push(update.clone());
    }
}

impl<S: DisplaySink + ?Sized> DisplaySink for &mut S {
    fn begin_turn(&mut self, at: Duration) {
        (**self).begin_turn(at);
    }

    fn render(&mut self, update: &MetricUpdate) {
        (**self).render(update);
    }
}

impl<S: DisplaySink + ?Sized> DisplaySink for Box<S> {
    fn begin_turn(&mut self, at: Duration) {
        (**self).begin_turn(at);
    }

    fn render(&mut self, update: &MetricUpdate) {
        (**self).render(update);
    }
}

impl<S: DisplaySink> DisplaySink for Option<S> {
    fn begin_turn(&mut self, at: Duration) {
        if let Some(sink) = self {
            sink.begin_turn(at);
        }
    }

    fn render(&mut self, update: &MetricUpdate) {
        if let Some(sink) = self {
            sink.render(update);
        }
    }
}

/// Fans one update out to two sinks.
pub struct Tee<A, B>(pub A, pub B);

impl<A: DisplaySink, B: DisplaySink> DisplaySink for Tee<A, B> {
    fn begin_turn(&mut self, at: Duration) {
        self.0.begin_turn(at);
        self.1.begin_turn(at);
    }

    fn render(&mut self, update: &MetricUpdate) {
        self.0.render(update);
        self.1.render(update);
    }
}

/// All mutable replay state: one cursor per metric plus the active scenario.
#[derive(Debug, Clone, Default)]
pub struct TwinSession {
    cursors: [CursorState; Metric::COUNT],
    scenario: Scenario,
}

impl TwinSession {
    /// Creates an empty session with the zero-impact scenario.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial scenario.
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = scenario;
        self
    }

    /// Installs the rows for one metric and rewinds its cursor.
    pub fn load(&mut self, metric: Metric, rows: Vec<Reading>) {
        debug!(metric = %metric, rows = rows.len(), "cursor loaded");
        self.cursors[metric.index()].replace(rows);
    }

    /// Installs all three environmental streams.
    pub fn load_environmental(&mut self, streams: EnvironmentalStreams) {
        let EnvironmentalStreams {
            co2,
            temperature,
            humidity,
        } = streams;
        self.load(Metric::Co2, co2);
        self.load(Metric::Temperature, temperature);
        self.load(Metric::Humidity, humidity);
    }

    pub fn cursor(&self, metric: Metric) -> &CursorState {
        &self.cursors[metric.index()]
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    /// Reads, adjusts and advances one metric, then renders the result.
    ///
    /// An empty cursor renders `(None, None)` and stays put.
    pub fn cycle<S: DisplaySink + ?Sized>(&mut self, metric: Metric, sink: &mut S) -> MetricUpdate {
        let scenario = self.scenario;
        let update = match self.cursors[metric.index()].read() {
            Some(reading) => MetricUpdate::adjusted(metric, &reading, scenario),
            None => {
                debug!(metric = %metric, "no data to cycle");
                MetricUpdate::no_data(metric, scenario)
            }
        };
        sink.render(&update);
        update
    }

    /// Cycles each metric in order.
    pub fn cycle_all<S: DisplaySink + ?Sized>(&mut self, metrics: &[Metric], sink: &mut S) {
        for metric in metrics {
            self.cycle(*metric, sink);
        }
    }

    /// The adjusted current reading, without advancing.
    pub fn peek(&self, metric: Metric) -> MetricUpdate {
        match self.cursors[metric.index()].current() {
            Some(reading) => MetricUpdate::adjusted(metric, reading, self.scenario),
            None => MetricUpdate::no_data(metric, self.scenario),
        }
    }

    /// Switches scenario and immediately re-renders every metric's current
    /// reading under it. No cursor moves.
    pub fn select_scenario<S: DisplaySink + ?Sized>(&mut self, scenario: Scenario, sink: &mut S) {
        info!(from = %self.scenario, to = %scenario, "scenario selected");
        self.scenario = scenario;
        for metric in Metric::ALL {
            let update = self.peek(metric);
            sink.render(&update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(metric: Metric, values: &[f64]) -> Vec<Reading> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Reading::new(metric.name(), format!("2024-01-01T00:00:0{i}"), *v))
            .collect()
    }

    fn loaded_session() -> TwinSession {
        let mut session = TwinSession::new();
        session.load(Metric::Pm25, series(Metric::Pm25, &[80.0, 120.0]));
        session.load(Metric::Co2, series(Metric::Co2, &[900.0, 1100.0, 650.0]));
        session.load(Metric::Temperature, series(Metric::Temperature, &[22.0]));
        session.load(Metric::Humidity, series(Metric::Humidity, &[50.0, 55.0]));
        session
    }

    #[derive(Default)]
    struct TurnLog(Vec<Duration>);

    impl DisplaySink for TurnLog {
        fn begin_turn(&mut self, at: Duration) {
            self.0.push(at);
        }

        fn render(&mut self, _update: &MetricUpdate) {}
    }

    #[test]
    fn test_turn_boundary_reaches_every_sink() {
        let mut first = TurnLog::default();
        let mut second = Some(TurnLog::default());
        let mut recorded: Vec<MetricUpdate> = Vec::new();
        {
            let mut sink = Tee(Tee(&mut first, &mut second), &mut recorded);
            sink.begin_turn(Duration::from_millis(1500));
            loaded_session().cycle(Metric::Pm25, &mut sink);
        }

        assert_eq!(first.0, vec![Duration::from_millis(1500)]);
        assert_eq!(second.unwrap().0, vec![Duration::from_millis(1500)]);
        assert_eq!(recorded.len(), 1);
    }

    #[test]
    fn test_cycle_reads_adjusts_and_advances() {
        let mut session = loaded_session().with_scenario(Scenario::AirPurifier);
        let mut sink: Vec<MetricUpdate> = Vec::new();

        let first = session.cycle(Metric::Pm25, &mut sink);
        assert_relative_eq!(first.value.unwrap(), 40.0);
        assert_eq!(first.timestamp.as_deref(), Some("2024-01-01T00:00:00"));
        assert_eq!(session.cursor(Metric::Pm25).index(), 1);

        let second = session.cycle(Metric::Pm25, &mut sink);
        assert_relative_eq!(second.value.unwrap(), 60.0);
        assert_eq!(session.cursor(Metric::Pm25).index(), 0);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_cursors_are_independent() {
        let mut session = loaded_session();
        let mut sink: Vec<MetricUpdate> = Vec::new();

        session.cycle_all(&[Metric::Co2, Metric::Co2], &mut sink);
        assert_eq!(session.cursor(Metric::Co2).index(), 2);
        assert_eq!(session.cursor(Metric::Pm25).index(), 0);
        assert_eq!(session.cursor(Metric::Humidity).index(), 0);
    }

    #[test]
    fn test_empty_cursor_reports_no_data() {
        let mut session = TwinSession::new();
        let mut sink: Vec<MetricUpdate> = Vec::new();

        for _ in 0..3 {
            let update = session.cycle(Metric::Temperature, &mut sink);
            assert_eq!(update.value, None);
            assert_eq!(update.timestamp, None);
            assert!(update.classification().is_no_data());
        }
        assert_eq!(sink.len(), 3);
        assert_eq!(session.cursor(Metric::Temperature).index(), 0);
    }

    #[test]
    fn test_scenario_change_readjusts_current_without_advancing() {
        let mut session = loaded_session();
        let mut sink: Vec<MetricUpdate> = Vec::new();

        session.cycle(Metric::Co2, &mut sink);
        let before: Vec<usize> = Metric::ALL.iter().map(|m| session.cursor(*m).index()).collect();
        sink.clear();

        session.select_scenario(Scenario::OpenWindow, &mut sink);

        let after: Vec<usize> = Metric::ALL.iter().map(|m| session.cursor(*m).index()).collect();
        assert_eq!(before, after);
        assert_eq!(sink.len(), Metric::COUNT);

        // CO2 already advanced past 900, so the re-render uses 1100.
        let co2 = sink.iter().find(|u| u.metric == Metric::Co2).unwrap();
        assert_relative_eq!(co2.value.unwrap(), 660.0);
        assert_eq!(co2.scenario, Scenario::OpenWindow);

        let humidity = sink.iter().find(|u| u.metric == Metric::Humidity).unwrap();
        assert_relative_eq!(humidity.value.unwrap(), 60.0);
    }

    #[test]
    fn test_scenario_change_with_empty_cursor() {
        let mut session = TwinSession::new();
        let mut sink: Vec<MetricUpdate> = Vec::new();

        session.select_scenario(Scenario::Plants, &mut sink);
        assert!(sink.iter().all(|u| !u.has_data()));
        assert_eq!(session.scenario(), Scenario::Plants);
    }

    #[test]
    fn test_peek_does_not_move() {
        let session = loaded_session().with_scenario(Scenario::Humidifier);
        let update = session.peek(Metric::Humidity);
        assert_relative_eq!(update.value.unwrap(), 65.0);
        assert_eq!(session.cursor(Metric::Humidity).index(), 0);
    }

    #[test]
    fn test_load_environmental() {
        let mut session = TwinSession::new();
        session.load_environmental(EnvironmentalStreams {
            co2: series(Metric::Co2, &[600.0]),
            temperature: Vec::new(),
            humidity: series(Metric::Humidity, &[40.0, 41.0]),
        });

        assert_eq!(session.cursor(Metric::Co2).len(), 1);
        assert!(session.cursor(Metric::Temperature).is_empty());
        assert_eq!(session.cursor(Metric::Humidity).len(), 2);
        assert!(session.cursor(Metric::Pm25).is_empty());
    }

    #[test]
    fn test_tee_renders_both() {
        let mut session = loaded_session();
        let mut a: Vec<MetricUpdate> = Vec::new();
        let mut b: Vec<MetricUpdate> = Vec::new();
        session.cycle(Metric::Pm25, &mut Tee(&mut a, &mut b));
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_absent_sink_is_skipped() {
        let mut session = loaded_session();
        let mut sink: Option<Vec<MetricUpdate>> = None;
        session.cycle(Metric::Pm25, &mut sink);
        assert_eq!(session.cursor(Metric::Pm25).index(), 1);
    }
}
