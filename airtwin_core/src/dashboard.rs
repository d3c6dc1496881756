//! AirTwin TUI Dashboard Module
//! =============================
//!
//! Terminal view of the replay: one panel per metric colored by its status,
//! a PM2.5 sparkline and the scenario picker. Uses Ratatui for rendering and
//! Crossbeam to receive updates from the replay loop.
//!
//! Enable with the `dashboard` feature flag.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossbeam::channel::{Receiver, Sender};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline},
    Frame, Terminal,
};

use crate::engine::{DisplaySink, MetricUpdate};
use crate::reading::Metric;
use crate::scenario::Scenario;
use crate::status::{format_timestamp, format_value, IndicatorColor, StatusBar};

const HISTORY_LEN: usize = 100;

/// Forwards updates from the replay loop to the dashboard thread.
pub struct ChannelSink {
    tx: Sender<MetricUpdate>,
}

impl ChannelSink {
    pub fn new(tx: Sender<MetricUpdate>) -> Self {
        Self { tx }
    }
}

impl DisplaySink for ChannelSink {
    fn render(&mut self, update: &MetricUpdate) {
        // Dashboard closed; the replay keeps going headless.
        let _ = self.tx.send(update.clone());
    }
}

/// Creates a connected sink / dashboard pair.
pub fn channel() -> (ChannelSink, TwinDashboard) {
    let (tx, rx) = crossbeam::channel::unbounded();
    (ChannelSink::new(tx), TwinDashboard::new(rx))
}

fn to_color(color: IndicatorColor) -> Color {
    let [r, g, b] = color.rgb();
    Color::Rgb(r, g, b)
}

// =============================================================================
// TWIN DASHBOARD
// =============================================================================

/// TUI dashboard for the indoor air-quality replay.
pub struct TwinDashboard {
    rx: Receiver<MetricUpdate>,
    latest: [Option<MetricUpdate>; Metric::COUNT],
    pm25_history: VecDeque<u64>,
    status_bar: StatusBar,
    scenario: Scenario,
}

impl TwinDashboard {
    /// Create a new dashboard with the update receiver channel.
    pub fn new(rx: Receiver<MetricUpdate>) -> Self {
        Self {
            rx,
            latest: Default::default(),
            pm25_history: VecDeque::with_capacity(HISTORY_LEN),
            status_bar: StatusBar::new(),
            scenario: Scenario::None,
        }
    }

    /// Applies one update to the dashboard state.
    pub fn ingest(&mut self, update: MetricUpdate) {
        self.scenario = update.scenario;
        self.status_bar.update(&update);
        if update.metric == Metric::Pm25 {
            if let Some(value) = update.value {
                self.pm25_history.push_back(value.round() as u64);
                if self.pm25_history.len() > HISTORY_LEN {
                    self.pm25_history.pop_front();
                }
            }
        }
        let slot = update.metric.index();
        self.latest[slot] = Some(update);
    }

    pub fn latest(&self, metric: Metric) -> Option<&MetricUpdate> {
        self.latest[metric.index()].as_ref()
    }

    /// Run the TUI main loop (blocks until 'q' pressed).
    ///
    /// Digit keys `0`..`4` pick a scenario and hand it to `on_select`.
    pub fn run<F>(&mut self, mut on_select: F) -> io::Result<()>
    where
        F: FnMut(Scenario),
    {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        loop {
            while let Ok(update) = self.rx.try_recv() {
                self.ingest(update);
            }

            terminal.draw(|f| self.ui(f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Char(c) => {
                            if let Some(scenario) = Scenario::from_key(c) {
                                on_select(scenario);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        Ok(())
    }

    fn metric_panel(&self, metric: Metric) -> Paragraph<'static> {
        let update = self.latest(metric);
        let class = update
            .map(|u| u.classification())
            .unwrap_or(crate::status::Classification::NO_DATA);
        let value = format_value(update.and_then(|u| u.value));
        let time = format_timestamp(update.and_then(|u| u.timestamp.as_deref()));

        Paragraph::new(vec![
            Line::from(vec![
                Span::styled(
                    format!("{value} {}", metric.unit()),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(format!("● {}", class.label), Style::default().fg(to_color(class.color))),
            ]),
            Line::from(Span::styled(time, Style::default().fg(Color::DarkGray))),
        ])
        .block(Block::default().title(metric.label()).borders(Borders::ALL))
    }

    fn ui(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(4), // Metric panels
                Constraint::Length(6), // Sparkline
                Constraint::Min(3),    // Scenario picker
                Constraint::Length(1), // Footer
            ])
            .split(f.area());

        let header = Paragraph::new(Line::from(vec![
            Span::styled("AirTwin Indoor Air Quality", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  |  "),
            Span::styled(self.status_bar.to_string(), Style::default().fg(Color::Cyan)),
        ]))
        .block(Block::default().borders(Borders::BOTTOM));
        f.render_widget(header, chunks[0]);

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25); Metric::COUNT])
            .split(chunks[1]);
        for (i, metric) in Metric::ALL.iter().enumerate() {
            f.render_widget(self.metric_panel(*metric), panels[i]);
        }

        let history: Vec<u64> = self.pm25_history.iter().cloned().collect();
        let sparkline = Sparkline::default()
            .block(Block::default().title("PM2.5 (last 100 readings)").borders(Borders::ALL))
            .data(&history)
            .style(Style::default().fg(Color::Cyan));
        f.render_widget(sparkline, chunks[2]);

        let picker: Vec<Line> = Scenario::all()
            .iter()
            .enumerate()
            .map(|(i, scenario)| {
                let style = if *scenario == self.scenario {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(format!("[{i}] {}", scenario.description()), style))
            })
            .collect();
        let picker = Paragraph::new(picker)
            .block(Block::default().title("Scenario").borders(Borders::ALL));
        f.render_widget(picker, chunks[3]);

        let footer = Paragraph::new("0-4 select scenario, 'q' to quit")
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(footer, chunks[4]);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn update(metric: Metric, value: Option<f64>, scenario: Scenario) -> MetricUpdate {
        MetricUpdate {
            metric,
            value,
            timestamp: value.map(|_| "2024-01-01T00:00:00".to_string()),
            scenario,
        }
    }

    #[test]
    fn test_channel_sink_forwards() {
        let (tx, rx) = crossbeam::channel::unbounded();
        let mut sink = ChannelSink::new(tx);
        sink.render(&update(Metric::Co2, Some(700.0), Scenario::None));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.metric, Metric::Co2);
    }

    #[test]
    fn test_channel_pair_connected() {
        let (mut sink, mut dashboard) = channel();
        sink.render(&update(Metric::Humidity, Some(55.0), Scenario::Humidifier));

        let received = dashboard.rx.try_recv().unwrap();
        dashboard.ingest(received);
        assert_eq!(dashboard.latest(Metric::Humidity).unwrap().value, Some(55.0));
    }

    #[test]
    fn test_ingest_tracks_latest_and_history() {
        let (_tx, rx) = crossbeam::channel::unbounded();
        let mut dashboard = TwinDashboard::new(rx);

        dashboard.ingest(update(Metric::Pm25, Some(42.4), Scenario::Plants));
        dashboard.ingest(update(Metric::Pm25, None, Scenario::Plants));

        assert_eq!(dashboard.pm25_history.len(), 1);
        assert_eq!(dashboard.pm25_history[0], 42);
        assert_eq!(dashboard.latest(Metric::Pm25).unwrap().value, None);
        assert_eq!(dashboard.scenario, Scenario::Plants);
    }
}
