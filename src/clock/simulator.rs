//! Simulated wall clock with configurable drift and periodic resync.
//!
//! ## Units
//!
//! | Parameter    | Unit           | Description                                  |
//! |--------------|----------------|----------------------------------------------|
//! | Drift rate   | μs per second  | Clock gains (+) or loses (−) this many μs/s  |
//! | Sync freq    | Hz             | Resyncs per second (interval = 1/freq s)     |
//!
//! Elapsed time is measured with `tokio::time::Instant`, so the simulator
//! follows tokio's paused clock in tests.

use super::{config::SimulationConfig, source::TimeSource};
use chrono::{DateTime, TimeDelta, Utc};
use config::ConfigError;
use std::time::Duration;
use tokio::time::Instant;

/// Time source that starts at a fixed wall-clock reading and advances with
/// the runtime clock, plus drift.
pub struct SimulatedTimeSource {
    /// Wall-clock reading at `start_instant`
    anchor: DateTime<Utc>,
    /// Reference instant when the clock started
    start_instant: Instant,
    /// Simulated elapsed time (μs) at last sync
    base_offset: i64,
    /// Drift rate in μs per second (positive = fast, negative = slow)
    drift_rate: f64,
    /// How often to resync (derived from sync_freq)
    sync_interval: Duration,
    /// Last sync instant
    last_sync_time: Instant,
}

impl SimulatedTimeSource {
    /// Creates a simulated clock reading `anchor` right now.
    ///
    /// # Arguments
    /// * `anchor` - Wall-clock reading at construction
    /// * `drift` - Drift rate in μs per second
    /// * `sync_freq` - Sync frequency in Hz (interval in seconds = 1/sync_freq)
    pub fn new(anchor: DateTime<Utc>, drift: f64, sync_freq: f64) -> Self {
        assert!(sync_freq > 0.0, "sync_freq must be > 0.0");
        let sync_interval = Duration::from_secs_f64(1.0 / sync_freq);
        let now = Instant::now();

        Self {
            anchor,
            start_instant: now,
            base_offset: 0,
            drift_rate: drift,
            sync_interval,
            last_sync_time: now,
        }
    }

    /// Drift-free clock anchored at `anchor`.
    pub fn exact(anchor: DateTime<Utc>) -> Self {
        Self::new(anchor, 0.0, 1.0)
    }

    /// Builds a simulated clock from user config, rejecting parameters that
    /// [`SimulatedTimeSource::new`] would panic on.
    pub fn from_config(
        anchor: DateTime<Utc>,
        config: &SimulationConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(anchor, config.drift_rate, config.sync_freq))
    }

    /// Simulated time since construction in microseconds (μs).
    /// Each real second adds `1_000_000 + drift_rate` μs until the next resync.
    pub fn elapsed_micros(&mut self) -> i64 {
        let now = Instant::now();
        if now.duration_since(self.last_sync_time) >= self.sync_interval {
            self.synchronize(now);
        }

        let elapsed_us = now.duration_since(self.last_sync_time).as_micros() as f64;
        let drift_us = (elapsed_us / 1_000_000.0) * self.drift_rate;
        self.base_offset + (elapsed_us + drift_us) as i64
    }

    /// Resets the drifted offset to the true elapsed time since start.
    fn synchronize(&mut self, now: Instant) {
        self.base_offset = now.duration_since(self.start_instant).as_micros() as i64;
        self.last_sync_time = now;
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&mut self) -> DateTime<Utc> {
        self.anchor + TimeDelta::microseconds(self.elapsed_micros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 15, 12, 0, 0).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn exact_clock_follows_runtime_time() {
        let mut source = SimulatedTimeSource::exact(anchor());
        assert_eq!(source.now(), anchor());

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(source.now(), anchor() + TimeDelta::milliseconds(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn drift_accumulates_between_syncs() {
        // 100 ms/s fast, resync every 10 s
        let mut source = SimulatedTimeSource::new(anchor(), 100_000.0, 0.1);
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(source.elapsed_micros(), 2_200_000);
    }

    #[tokio::test(start_paused = true)]
    async fn resync_discards_accumulated_drift() {
        // 100 ms/s fast, resync every 500 ms
        let mut source = SimulatedTimeSource::new(anchor(), 100_000.0, 2.0);

        tokio::time::advance(Duration::from_millis(400)).await;
        let before_sync = source.elapsed_micros();
        assert_eq!(before_sync, 440_000);

        tokio::time::advance(Duration::from_millis(200)).await;
        let after_sync = source.elapsed_micros();
        assert_eq!(after_sync, 600_000);
    }

    #[test]
    fn from_config_rejects_unusable_sync_freq() {
        for sync_freq in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = SimulationConfig {
                drift_rate: 0.0,
                sync_freq,
            };
            let err = SimulatedTimeSource::from_config(anchor(), &config)
                .err()
                .expect("invalid sync_freq accepted");
            assert!(err.to_string().contains("sync_freq"), "{err}");
        }
    }

    #[test]
    fn from_config_rejects_non_finite_drift() {
        let config = SimulationConfig {
            drift_rate: f64::NAN,
            sync_freq: 1.0,
        };
        assert!(SimulatedTimeSource::from_config(anchor(), &config).is_err());
    }

    #[test]
    #[should_panic(expected = "sync_freq must be > 0.0")]
    fn zero_sync_frequency_panics() {
        let _ = SimulatedTimeSource::new(anchor(), 50.0, 0.0);
    }
}
