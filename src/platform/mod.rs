//! # Platform Module
//!
//! Trait abstractions over the host platform to enable testing.
//!
//! - [`Platform`]: hot-plug notifications and per-tick hardware snapshots
//! - [`FrameScheduler`]: the display-refresh style frame signal
//! - [`Timer`]: delays used by haptics
//!
//! The tokio-backed [`IntervalScheduler`] and [`TokioTimer`] are the
//! production implementations; [`evdev`] provides a Linux [`Platform`].

pub mod evdev;

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::controller::device::Device;

/// Connect/disconnect notification from the platform.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    /// A device appeared in a slot.
    Connected(Device),
    /// The device in this slot went away.
    Disconnected(usize),
}

/// Source of controller state.
pub trait Platform: Send {
    /// Notifications observed since the last call, oldest first.
    fn drain_events(&mut self) -> Vec<PlatformEvent>;

    /// Current readings of every connected device.
    fn connected_devices(&mut self) -> Vec<Device>;
}

/// Frame signal driving the polling loop.
#[async_trait]
pub trait FrameScheduler: Send {
    /// Wait for the next frame.
    async fn next_frame(&mut self);
}

/// Awaitable delay.
#[async_trait]
pub trait Timer: Send + Sync {
    /// Complete after `duration` has elapsed.
    async fn delay(&self, duration: Duration);
}

/// Fixed-rate frame scheduler backed by a tokio interval.
///
/// Missed frames are skipped rather than replayed in a burst.
pub struct IntervalScheduler {
    interval: Interval,
}

impl IntervalScheduler {
    /// Creates a scheduler ticking `frame_rate_hz` times per second.
    ///
    /// Must be called from within a tokio runtime. A rate of zero is
    /// treated as one frame per second.
    #[must_use]
    pub fn new(frame_rate_hz: u32) -> Self {
        Self::with_period(Duration::from_secs(1) / frame_rate_hz.max(1))
    }

    /// Creates a scheduler with an explicit frame period.
    #[must_use]
    pub fn with_period(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    /// Time between frames.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[async_trait]
impl FrameScheduler for IntervalScheduler {
    async fn next_frame(&mut self) {
        self.interval.tick().await;
    }
}

/// [`Timer`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl Timer for TokioTimer {
    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
