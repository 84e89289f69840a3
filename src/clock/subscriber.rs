use super::sample::ClockSample;
use tokio::sync::watch;

/// Receives every sample a running controller delivers.
///
/// Deliveries for one controller never overlap, and they arrive in sequence order.
pub trait Subscriber: Send + Sync {
    fn on_tick(&self, sample: ClockSample);
}

impl<F> Subscriber for F
where
    F: Fn(ClockSample) + Send + Sync,
{
    fn on_tick(&self, sample: ClockSample) {
        self(sample)
    }
}

/// Latest-value state cell for a display surface.
///
/// The controller writes into it; renderers hold a [`watch::Receiver`] and
/// redraw when it changes. Only the most recent sample is kept.
#[derive(Debug)]
pub struct DisplayCell {
    tx: watch::Sender<Option<ClockSample>>,
}

impl DisplayCell {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn watch(&self) -> watch::Receiver<Option<ClockSample>> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> Option<ClockSample> {
        *self.tx.borrow()
    }
}

impl Default for DisplayCell {
    fn default() -> Self {
        Self::new()
    }
}

impl Subscriber for DisplayCell {
    fn on_tick(&self, sample: ClockSample) {
        self.tx.send_replace(Some(sample));
    }
}
