use chrono::{DateTime, Utc};

/// Supplies wall-clock readings to a controller.
///
/// Readings are not required to be monotonic: a system clock adjustment may
/// step them backwards. The controller is responsible for ordering what it
/// delivers.
pub trait TimeSource: Send + 'static {
    fn now(&mut self) -> DateTime<Utc>;
}

/// Host wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&mut self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F> TimeSource for F
where
    F: FnMut() -> DateTime<Utc> + Send + 'static,
{
    fn now(&mut self) -> DateTime<Utc> {
        self()
    }
}
