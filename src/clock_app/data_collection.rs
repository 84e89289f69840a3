use std::{fs::File, io::Write, time::Duration};

use agentic_clock::clock::{ClockSample, Subscriber};
use chrono::{DateTime, Utc};
use csv::Writer;
use parking_lot::Mutex;
use serde::Serialize;

use crate::configs::ClockAppConfig;

#[derive(Debug, Serialize, Clone, Copy)]
struct TickRecord {
    sequence: u64,
    timestamp_ms: i64,
    /// Observed time minus the tick's slot on the anchored schedule
    lateness_ms: i64,
}

/// Records every delivered sample for export after the run.
pub struct TickLog {
    anchor_ms: i64,
    interval_ms: i64,
    records: Mutex<Vec<TickRecord>>,
}

impl TickLog {
    pub fn new(anchor: DateTime<Utc>, interval: Duration) -> Self {
        TickLog {
            anchor_ms: anchor.timestamp_millis(),
            interval_ms: interval.as_millis() as i64,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn tick_count(&self) -> usize {
        self.records.lock().len()
    }

    pub fn to_csv(&self, file_path: &str) -> Result<(), std::io::Error> {
        let file = File::create(file_path)?;
        let mut writer = Writer::from_writer(file);
        for data in self.records.lock().iter() {
            writer.serialize(data)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Subscriber for TickLog {
    fn on_tick(&self, sample: ClockSample) {
        let timestamp_ms = sample.timestamp_millis();
        let due_ms = self.anchor_ms + sample.sequence() as i64 * self.interval_ms;
        self.records.lock().push(TickRecord {
            sequence: sample.sequence(),
            timestamp_ms,
            lateness_ms: timestamp_ms - due_ms,
        });
    }
}

pub fn save_summary(config: &ClockAppConfig, file_path: &str) -> Result<(), std::io::Error> {
    let config_json = serde_json::to_string_pretty(config)?;
    let mut summary_file = File::create(file_path)?;
    summary_file.write_all(config_json.as_bytes())?;
    summary_file.flush()?;
    Ok(())
}
