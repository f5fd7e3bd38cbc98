//! # Device Registry Module
//!
//! Tracks the controllers that are currently connected.
//!
//! A [`Device`] is created when the platform reports a connect, refreshed in
//! place from each tick's hardware snapshot, and removed on disconnect. The
//! [`DeviceRegistry`] keys devices by slot index and iterates them in
//! ascending slot order, which is the device order callbacks fire in.

use std::collections::BTreeMap;
use std::fmt;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::haptics::ActuatorHandle;

/// A connected controller and its latest raw readings.
///
/// # Examples
///
/// ```
/// use padlink::controller::device::Device;
///
/// let device = Device::new(0, "Joy-Con (L)")
///     .with_buttons(vec![0.0; 17])
///     .with_axes(vec![0.0; 4]);
/// assert_eq!(device.slot, 0);
/// assert!(!device.has_actuator());
/// ```
#[derive(Clone)]
pub struct Device {
    /// Stable slot index assigned by the platform for this connection.
    pub slot: usize,
    /// Free-form model identifier used for profile lookup.
    pub model: String,
    /// Raw button values, each in 0.0..=1.0.
    pub buttons: Vec<f32>,
    /// Raw axis values, each in -1.0..=1.0.
    pub axes: Vec<f32>,
    /// Rumble motor, when the hardware has one.
    pub actuator: Option<ActuatorHandle>,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("slot", &self.slot)
            .field("model", &self.model)
            .field("buttons", &self.buttons)
            .field("axes", &self.axes)
            .field("actuator", &self.actuator.is_some())
            .finish()
    }
}

impl Device {
    /// Creates a device with no buttons, axes or actuator.
    #[must_use]
    pub fn new(slot: usize, model: impl Into<String>) -> Self {
        Self {
            slot,
            model: model.into(),
            buttons: Vec::new(),
            axes: Vec::new(),
            actuator: None,
        }
    }

    /// Sets the raw button values.
    #[must_use]
    pub fn with_buttons(mut self, buttons: Vec<f32>) -> Self {
        self.buttons = buttons;
        self
    }

    /// Sets the raw axis values.
    #[must_use]
    pub fn with_axes(mut self, axes: Vec<f32>) -> Self {
        self.axes = axes;
        self
    }

    /// Attaches a rumble actuator.
    #[must_use]
    pub fn with_actuator(mut self, actuator: ActuatorHandle) -> Self {
        self.actuator = Some(actuator);
        self
    }

    /// Whether this device can vibrate.
    #[must_use]
    pub fn has_actuator(&self) -> bool {
        self.actuator.is_some()
    }
}

/// Connected devices keyed by slot index.
///
/// Besides the devices themselves, the registry publishes the current set of
/// actuators on a [`watch`] channel so a [`HapticController`] can command
/// them without borrowing the registry.
///
/// [`HapticController`]: crate::haptics::HapticController
pub struct DeviceRegistry {
    devices: BTreeMap<usize, Device>,
    actuators: watch::Sender<Vec<ActuatorHandle>>,
}

impl fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.devices)
            .finish_non_exhaustive()
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        let (actuators, _) = watch::channel(Vec::new());
        Self {
            devices: BTreeMap::new(),
            actuators,
        }
    }

    /// Inserts a device, overwriting any device already in its slot.
    ///
    /// Returns the device previously held by the slot.
    pub fn connect(&mut self, device: Device) -> Option<Device> {
        info!(
            "Controller connected in slot {}: {} ({} buttons, {} axes, rumble: {})",
            device.slot,
            device.model,
            device.buttons.len(),
            device.axes.len(),
            device.has_actuator()
        );

        let previous = self.devices.insert(device.slot, device);
        self.publish_actuators();
        previous
    }

    /// Removes the device in `slot`, returning its last known snapshot.
    ///
    /// Unknown slots are a no-op.
    pub fn disconnect(&mut self, slot: usize) -> Option<Device> {
        match self.devices.remove(&slot) {
            Some(device) => {
                info!("Controller disconnected from slot {}: {}", slot, device.model);
                self.publish_actuators();
                Some(device)
            }
            None => {
                debug!("Disconnect for untracked slot {} ignored", slot);
                None
            }
        }
    }

    /// Refreshes tracked devices in place from a hardware snapshot.
    ///
    /// Only raw readings are copied. Snapshot entries for slots that were
    /// never connected are ignored; devices only enter the registry through
    /// [`DeviceRegistry::connect`].
    pub fn refresh(&mut self, snapshot: Vec<Device>) {
        for reading in snapshot {
            match self.devices.get_mut(&reading.slot) {
                Some(device) => {
                    device.buttons = reading.buttons;
                    device.axes = reading.axes;
                }
                None => debug!("Snapshot for untracked slot {} ignored", reading.slot),
            }
        }
    }

    /// Refreshes from `snapshot` and returns every tracked device.
    pub fn snapshot_all(&mut self, snapshot: Vec<Device>) -> impl Iterator<Item = &Device> {
        self.refresh(snapshot);
        self.devices.values()
    }

    /// Tracked devices in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Returns the device in `slot`.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&Device> {
        self.devices.get(&slot)
    }

    /// Number of tracked devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no device is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Subscribes to the set of connected actuators.
    #[must_use]
    pub fn subscribe_actuators(&self) -> watch::Receiver<Vec<ActuatorHandle>> {
        self.actuators.subscribe()
    }

    fn publish_actuators(&self) {
        let actuators = self
            .devices
            .values()
            .filter_map(|device| device.actuator.clone())
            .collect();
        self.actuators.send_replace(actuators);
    }
}
