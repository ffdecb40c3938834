//! Position source abstraction

use tokio::sync::mpsc;
use tracing::debug;

use super::mode::SampleOrigin;
use super::sample::PositionSample;

/// A sample together with the source that produced it
#[derive(Debug, Clone)]
pub struct PositionUpdate {
    pub origin: SampleOrigin,
    pub sample: PositionSample,
}

/// Sending half of the session's simulated sample queue
#[derive(Debug, Clone)]
pub struct PositionSink {
    tx: mpsc::Sender<PositionUpdate>,
}

impl PositionSink {
    pub fn new(tx: mpsc::Sender<PositionUpdate>) -> Self {
        Self { tx }
    }

    /// Queue a sample, waiting for room. Returns false once the session is gone.
    pub async fn send(&self, origin: SampleOrigin, sample: PositionSample) -> bool {
        self.tx.send(PositionUpdate { origin, sample }).await.is_ok()
    }
}

/// Start/stop control over a stream of position samples.
///
/// Simulated samples travel through a [`PositionSink`]; organic samples are
/// posted by the platform through `SessionHandle::submit_position`.
pub trait PositionSource: Send {
    fn start_updating(&mut self);
    fn stop_updating(&mut self);
}

/// Organic source for platforms that stream continuously and need no
/// start/stop control
#[derive(Debug, Default)]
pub struct PassiveSource;

impl PositionSource for PassiveSource {
    fn start_updating(&mut self) {
        debug!("organic updates requested");
    }

    fn stop_updating(&mut self) {
        debug!("organic updates released");
    }
}
