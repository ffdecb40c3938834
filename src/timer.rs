//! Restartable one-shot countdown timer
//!
//! The timer never calls back into its owner directly. When the interval
//! elapses a background task posts a [`TimerTick`] tagged with the
//! generation of the `arm()` call that scheduled it. The owner drains the
//! tick on its own task and passes it to [`CountdownTimer::acknowledge`],
//! which accepts it only if that generation is still the armed one. Every
//! `arm()`/`disarm()` bumps the generation, so a tick already in flight
//! when the timer is disarmed is discarded instead of delivered late.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Timer state, owned exclusively by the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Disarmed,
    Armed { deadline: Instant },
    /// Accepted a tick; the owner is running its fire handler
    Fired,
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerState::Disarmed => write!(f, "disarmed"),
            TimerState::Armed { .. } => write!(f, "armed"),
            TimerState::Fired => write!(f, "fired"),
        }
    }
}

/// Expiry notice posted by the timer's background task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    pub generation: u64,
}

/// One-shot countdown driving the poor-signal fallback
pub struct CountdownTimer {
    interval: Duration,
    state: TimerState,
    generation: u64,
    task: Option<JoinHandle<()>>,
    tick_tx: mpsc::UnboundedSender<TimerTick>,
}

impl CountdownTimer {
    /// Create a disarmed timer that posts ticks to `tick_tx`
    pub fn new(interval: Duration, tick_tx: mpsc::UnboundedSender<TimerTick>) -> Self {
        Self {
            interval,
            state: TimerState::Disarmed,
            generation: 0,
            task: None,
            tick_tx,
        }
    }

    /// Get the current state
    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Whether no countdown is pending or unhandled
    pub fn is_disarmed(&self) -> bool {
        self.state == TimerState::Disarmed
    }

    /// Get the countdown length
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedule a tick after the interval, cancelling any pending one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(&mut self) {
        self.cancel_pending();

        let generation = self.generation;
        let deadline = Instant::now() + self.interval;
        let tick_tx = self.tick_tx.clone();

        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // Receiver gone means the owner has shut down
            let _ = tick_tx.send(TimerTick { generation });
        }));
        self.state = TimerState::Armed { deadline };

        debug!(generation, interval_ms = self.interval.as_millis() as u64, "timer armed");
    }

    /// Cancel any pending tick. Safe to call when already disarmed.
    pub fn disarm(&mut self) {
        let was_armed = matches!(self.state, TimerState::Armed { .. });
        self.cancel_pending();
        self.state = TimerState::Disarmed;

        if was_armed {
            debug!(generation = self.generation, "timer disarmed");
        }
    }

    /// Disarm, then arm
    pub fn reset(&mut self) {
        self.disarm();
        self.arm();
    }

    /// Accept a tick if it belongs to the currently armed generation.
    ///
    /// On `true` the timer is in [`TimerState::Fired`] and the owner should
    /// run its fire handler, then call [`CountdownTimer::settle`].
    pub fn acknowledge(&mut self, tick: TimerTick) -> bool {
        let current = matches!(self.state, TimerState::Armed { .. })
            && tick.generation == self.generation;

        if !current {
            trace!(
                tick = tick.generation,
                current = self.generation,
                "discarding stale timer tick"
            );
            return false;
        }

        self.task = None;
        self.state = TimerState::Fired;
        true
    }

    /// Return to Disarmed after a fire handler, unless the handler re-armed
    pub fn settle(&mut self) {
        if self.state == TimerState::Fired {
            self.state = TimerState::Disarmed;
        }
    }

    fn cancel_pending(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_timer(interval: Duration) -> (CountdownTimer, mpsc::UnboundedReceiver<TimerTick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (CountdownTimer::new(interval, tx), rx)
    }

    /// Drain pending ticks and count how many the timer accepts
    fn fire_count(timer: &mut CountdownTimer, rx: &mut mpsc::UnboundedReceiver<TimerTick>) -> usize {
        let mut fired = 0;
        while let Ok(tick) = rx.try_recv() {
            if timer.acknowledge(tick) {
                fired += 1;
                timer.settle();
            }
        }
        fired
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_interval() {
        let (mut timer, mut rx) = create_timer(Duration::from_millis(2500));
        timer.arm();
        assert!(matches!(timer.state(), TimerState::Armed { .. }));

        tokio::time::sleep(Duration::from_millis(2400)).await;
        assert_eq!(fire_count(&mut timer, &mut rx), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fire_count(&mut timer, &mut rx), 1);
        assert_eq!(timer.state(), TimerState::Disarmed);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fire_count(&mut timer, &mut rx), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_restarts_interval() {
        let (mut timer, mut rx) = create_timer(Duration::from_secs(2));
        timer.arm();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        timer.arm();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(fire_count(&mut timer, &mut rx), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(fire_count(&mut timer, &mut rx), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_prevents_fire() {
        let (mut timer, mut rx) = create_timer(Duration::from_secs(1));
        timer.arm();
        timer.disarm();
        timer.disarm();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fire_count(&mut timer, &mut rx), 0);
        assert!(timer.is_disarmed());
    }

    #[tokio::test]
    async fn test_zero_interval_disarm_race() {
        let (mut timer, mut rx) = create_timer(Duration::ZERO);
        for _ in 0..100 {
            timer.arm();
            tokio::task::yield_now().await;
            timer.disarm();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fire_count(&mut timer, &mut rx), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_in_flight_is_stale_after_reset() {
        let (mut timer, mut rx) = create_timer(Duration::from_millis(100));
        timer.arm();
        tokio::time::sleep(Duration::from_millis(150)).await;

        // Tick is queued but not yet processed by the owner
        timer.reset();
        assert_eq!(fire_count(&mut timer, &mut rx), 0);
        assert!(matches!(timer.state(), TimerState::Armed { .. }));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fire_count(&mut timer, &mut rx), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_keeps_rearm_from_handler() {
        let (mut timer, mut rx) = create_timer(Duration::from_millis(10));
        timer.arm();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let tick = rx.try_recv().unwrap();
        assert!(timer.acknowledge(tick));
        assert_eq!(timer.state(), TimerState::Fired);

        timer.arm();
        timer.settle();
        assert!(matches!(timer.state(), TimerState::Armed { .. }));
    }
}
