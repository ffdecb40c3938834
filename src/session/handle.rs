//! Cloneable command surface of a running session

use tokio::sync::{broadcast, mpsc, oneshot};

use crate::error::{NavError, Result};
use crate::events::NavigationEvent;
use crate::location::{PositionSample, SimulationMode};
use crate::route::TrackerEvent;

use super::{SessionInput, SessionStatus};

/// Handle to a [`NavigationSession`](super::NavigationSession).
///
/// Commands are processed in the order they are sent. The session ends once
/// every handle is dropped or [`SessionHandle::shutdown`] is called.
#[derive(Clone)]
pub struct SessionHandle {
    input_tx: mpsc::Sender<SessionInput>,
    event_tx: broadcast::Sender<NavigationEvent>,
}

impl SessionHandle {
    pub(crate) fn new(
        input_tx: mpsc::Sender<SessionInput>,
        event_tx: broadcast::Sender<NavigationEvent>,
    ) -> Self {
        Self { input_tx, event_tx }
    }

    async fn send(&self, input: SessionInput) -> Result<()> {
        self.input_tx
            .send(input)
            .await
            .map_err(|_| NavError::SessionClosed)
    }

    /// Start delivering positions to the route tracker
    pub async fn start(&self) -> Result<()> {
        self.send(SessionInput::Start).await
    }

    /// Stop both sources and end any simulation
    pub async fn stop(&self) -> Result<()> {
        self.send(SessionInput::Stop).await
    }

    /// Change when the session simulates positions
    pub async fn set_simulation_mode(&self, mode: SimulationMode) -> Result<()> {
        self.send(SessionInput::SetSimulationMode(mode)).await
    }

    /// Honored only in `Always` mode
    pub async fn set_simulation_speed_multiplier(&self, multiplier: f64) -> Result<()> {
        self.send(SessionInput::SetSpeedMultiplier(multiplier)).await
    }

    /// Deliver a sample from the organic (platform) source
    pub async fn submit_position(&self, sample: PositionSample) -> Result<()> {
        self.send(SessionInput::OrganicPosition(sample)).await
    }

    /// Non-async variant for platform callbacks; fails when the queue is full
    pub fn try_submit_position(&self, sample: PositionSample) -> Result<()> {
        self.input_tx
            .try_send(SessionInput::OrganicPosition(sample))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => NavError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => NavError::SessionClosed,
            })
    }

    /// Deliver a tracker notification raised outside a position update
    pub async fn tracker_event(&self, event: TrackerEvent) -> Result<()> {
        self.send(SessionInput::Tracker(event)).await
    }

    /// Get a snapshot of the session state
    pub async fn status(&self) -> Result<SessionStatus> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SessionInput::Status(reply_tx)).await?;
        reply_rx.await.map_err(|_| NavError::SessionClosed)
    }

    /// Effective multiplier; 1.0 outside `Always` mode
    pub async fn simulation_speed_multiplier(&self) -> Result<f64> {
        Ok(self.status().await?.speed_multiplier)
    }

    /// Subscribe to outward navigation events
    pub fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.event_tx.subscribe()
    }

    /// Stop the session loop; later commands fail with `SessionClosed`
    pub async fn shutdown(&self) -> Result<()> {
        self.send(SessionInput::Shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{AccuracyPolicy, Coordinate};

    fn sample() -> PositionSample {
        PositionSample::new(
            Coordinate::new(0.0, 0.0),
            0.0,
            0.0,
            5.0,
            5.0,
            &AccuracyPolicy::default(),
        )
    }

    #[tokio::test]
    async fn test_try_submit_reports_full_then_closed() {
        let (input_tx, input_rx) = mpsc::channel(1);
        let (event_tx, _) = broadcast::channel(1);
        let handle = SessionHandle::new(input_tx, event_tx);

        assert!(handle.try_submit_position(sample()).is_ok());
        assert!(matches!(
            handle.try_submit_position(sample()),
            Err(NavError::QueueFull)
        ));

        drop(input_rx);
        assert!(matches!(
            handle.try_submit_position(sample()),
            Err(NavError::SessionClosed)
        ));
        assert!(matches!(handle.start().await, Err(NavError::SessionClosed)));
    }
}
