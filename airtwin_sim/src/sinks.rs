//! Terminal display sinks.

use airtwin_core::{format_timestamp, format_value, DisplaySink, MetricUpdate, StatusBar};
use tracing::{debug, info, warn};

/// Logs every update as one line and keeps the status bar current.
#[derive(Debug, Default)]
pub struct LogSink {
    status_bar: StatusBar,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_bar(&self) -> &StatusBar {
        &self.status_bar
    }
}

impl DisplaySink for LogSink {
    fn render(&mut self, update: &MetricUpdate) {
        self.status_bar.update(update);
        let class = update.classification();

        if update.has_data() {
            info!(
                "{:<11} {:>7} {:<6} {:<11} {} [{}]",
                update.metric.label(),
                format_value(update.value),
                update.metric.unit(),
                class.label,
                format_timestamp(update.timestamp.as_deref()),
                update.scenario
            );
        } else {
            warn!("{:<11} {}", update.metric.label(), class.label);
        }
        debug!("status: {}", self.status_bar);
    }
}
