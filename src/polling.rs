//! # Polling Loop Module
//!
//! Drives change detection once per frame while any controller is connected.
//!
//! ## States
//!
//! ```text
//!          connect            registry empty at tick
//!   Idle ───────────▶ Running ──────────────────────▶ Idle
//! ```
//!
//! While `Idle` the loop only polls the platform for hot-plug notifications
//! on the discovery interval. While `Running` it waits for the next frame,
//! drains pending notifications, refreshes every tracked device from a
//! hardware snapshot and dispatches callbacks for whatever changed.
//!
//! The loop owns the device and listener registries outright, so callbacks
//! always run on the loop's task and never concurrently with a tick.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::controller::device::{Device, DeviceRegistry};
use crate::controller::listener::ListenerRegistry;
use crate::controller::mapper::ChangeDetector;
use crate::controller::profile::ProfileTable;
use crate::haptics::HapticController;
use crate::platform::{FrameScheduler, Platform, PlatformEvent, Timer};

/// Scheduling state of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No device connected; waiting for a connect.
    Idle,
    /// Ticking once per frame.
    Running,
}

/// Frame-driven polling loop over a [`Platform`].
///
/// # Examples
///
/// ```
/// use padlink::controller::device::Device;
/// use padlink::controller::profile::{controls, ProfileTable};
/// use padlink::platform::{Platform, PlatformEvent};
/// use padlink::polling::{LoopState, PollingLoop};
///
/// struct OnePad;
///
/// impl Platform for OnePad {
///     fn drain_events(&mut self) -> Vec<PlatformEvent> {
///         Vec::new()
///     }
///
///     fn connected_devices(&mut self) -> Vec<Device> {
///         let mut buttons = vec![0.0; 17];
///         buttons[0] = 1.0;
///         vec![Device::new(0, "Xbox Wireless Controller").with_buttons(buttons)]
///     }
/// }
///
/// let mut polling = PollingLoop::new(OnePad, ProfileTable::builtin());
/// polling.listeners_mut().on_press(controls::A, |value| println!("a = {}", value));
///
/// polling.deliver(PlatformEvent::Connected(Device::new(0, "Xbox Wireless Controller")));
/// assert_eq!(polling.tick(), 1);
/// assert_eq!(polling.state(), LoopState::Running);
/// ```
pub struct PollingLoop<P: Platform> {
    platform: P,
    devices: DeviceRegistry,
    listeners: ListenerRegistry,
    detector: ChangeDetector,
    inbox: VecDeque<PlatformEvent>,
    state: LoopState,
}

impl<P: Platform> PollingLoop<P> {
    /// Creates an idle loop with empty registries.
    pub fn new(platform: P, profiles: ProfileTable) -> Self {
        Self {
            platform,
            devices: DeviceRegistry::new(),
            listeners: ListenerRegistry::new(),
            detector: ChangeDetector::new(profiles),
            inbox: VecDeque::new(),
            state: LoopState::Idle,
        }
    }

    /// Current scheduling state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Connected devices.
    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    /// Registered listeners.
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Registered listeners, for registration and removal.
    pub fn listeners_mut(&mut self) -> &mut ListenerRegistry {
        &mut self.listeners
    }

    /// The underlying platform.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Haptics over the devices this loop tracks.
    pub fn haptics(&self, timer: Arc<dyn Timer>) -> HapticController {
        HapticController::new(self.devices.subscribe_actuators(), timer)
    }

    /// Queues a connect/disconnect notification for the next pump.
    pub fn deliver(&mut self, event: PlatformEvent) {
        self.inbox.push_back(event);
    }

    /// Applies queued and platform notifications.
    ///
    /// Moves the loop to `Running` when it was idle and a device is now
    /// connected. Returns the number of notifications applied.
    pub fn pump(&mut self) -> usize {
        let mut events: Vec<PlatformEvent> = self.inbox.drain(..).collect();
        events.extend(self.platform.drain_events());

        let applied = events.len();
        for event in events {
            match event {
                PlatformEvent::Connected(device) => self.connect(device),
                PlatformEvent::Disconnected(slot) => self.disconnect(slot),
            }
        }

        if self.state == LoopState::Idle && !self.devices.is_empty() {
            self.state = LoopState::Running;
            info!("Polling started with {} controller(s)", self.devices.len());
        }
        applied
    }

    /// Runs one frame: pump notifications, refresh devices, dispatch changes.
    ///
    /// Returns the number of input callbacks invoked. When no device is
    /// connected the loop goes idle without reading the hardware.
    pub fn tick(&mut self) -> usize {
        self.pump();

        if self.devices.is_empty() {
            if self.state == LoopState::Running {
                self.state = LoopState::Idle;
                info!("Polling stopped: no controllers connected");
            }
            return 0;
        }

        let snapshot = self.platform.connected_devices();
        self.detector
            .tick(self.devices.snapshot_all(snapshot), &mut self.listeners)
    }

    /// Drives the loop forever.
    ///
    /// While idle, polls for notifications every `discovery_interval`; while
    /// running, ticks once per `scheduler` frame.
    pub async fn run<S: FrameScheduler>(&mut self, scheduler: &mut S, discovery_interval: Duration) {
        let mut discovery = interval(discovery_interval);
        discovery.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            match self.state {
                LoopState::Idle => {
                    discovery.tick().await;
                    self.pump();
                }
                LoopState::Running => {
                    scheduler.next_frame().await;
                    self.tick();
                }
            }
        }
    }

    fn connect(&mut self, device: Device) {
        let slot = device.slot;
        self.devices.connect(device);
        if let Some(device) = self.devices.get(slot) {
            self.listeners.notify_connect(device);
        }
    }

    fn disconnect(&mut self, slot: usize) {
        match self.devices.disconnect(slot) {
            Some(device) => {
                self.listeners.notify_disconnect(&device);
            }
            None => debug!("No controller in slot {} to disconnect", slot),
        }
    }
}
