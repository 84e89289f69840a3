//! Application lifecycle hooks.

use log::info;

/// Fire-and-forget record of a lifecycle event.
pub trait LifecycleSink: Send + Sync {
    fn record(&self, message: &str);
}

/// Forwards lifecycle records to the `log` facade.
#[derive(Debug, Clone)]
pub struct LogSink {
    app: String,
}

impl LogSink {
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into() }
    }
}

impl LifecycleSink for LogSink {
    fn record(&self, message: &str) {
        info!(target: "lifecycle", "{}: {}", self.app, message);
    }
}

/// Called once when an application's first view appears.
pub fn on_appear(sink: &dyn LifecycleSink, message: &str) {
    sink.record(message);
}
