//! # evdev Platform Module
//!
//! Linux gamepad backend using the evdev interface.
//!
//! ## Discovery
//!
//! Every `/dev/input/event*` device reporting `BTN_SOUTH` is treated as a
//! gamepad. The device list is rescanned at most once per discovery interval
//! and diffed by device path: new paths connect in the lowest free slot,
//! vanished paths disconnect.
//!
//! ## Layout
//!
//! Readings are laid out in the standard gamepad order so the generic
//! profile applies:
//!
//! | Index | Source |
//! |-------|--------|
//! | 0-3 | `BTN_SOUTH`, `BTN_EAST`, `BTN_WEST`, `BTN_NORTH` |
//! | 4-5 | `BTN_TL`, `BTN_TR` |
//! | 6-7 | `BTN_TL2`/`ABS_Z`, `BTN_TR2`/`ABS_RZ` |
//! | 8-11 | `BTN_SELECT`, `BTN_START`, `BTN_THUMBL`, `BTN_THUMBR` |
//! | 12-15 | d-pad up/down/left/right from `ABS_HAT0*` or `BTN_DPAD_*` |
//! | 16 | `BTN_MODE` |
//!
//! Axes are `ABS_X`, `ABS_Y`, `ABS_RX`, `ABS_RY`, normalized to -1.0..=1.0
//! from each axis' reported range.
//!
//! ## Rumble
//!
//! Devices supporting `FF_RUMBLE` get an [`EvdevActuator`] holding a second
//! handle to the same node, so uploads never contend with state reads.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use evdev::{
    AbsoluteAxisType, Device as InputDevice, FFEffect, FFEffectData, FFEffectKind, FFEffectType,
    FFReplay, FFTrigger, Key,
};
use tracing::{debug, info, warn};

use super::{Platform, PlatformEvent};
use crate::controller::device::Device;
use crate::error::{PadlinkError, Result};
use crate::haptics::{Actuator, ActuatorHandle, EffectKind, EffectParams};

/// Number of buttons in the standard layout.
pub const STANDARD_BUTTON_COUNT: usize = 17;

/// Number of axes in the standard layout.
pub const STANDARD_AXIS_COUNT: usize = 4;

/// Digital buttons at indices 0-11, in layout order.
const FACE_AND_MENU_KEYS: [Key; 12] = [
    Key::BTN_SOUTH,
    Key::BTN_EAST,
    Key::BTN_WEST,
    Key::BTN_NORTH,
    Key::BTN_TL,
    Key::BTN_TR,
    Key::BTN_TL2,
    Key::BTN_TR2,
    Key::BTN_SELECT,
    Key::BTN_START,
    Key::BTN_THUMBL,
    Key::BTN_THUMBR,
];

/// Analog fallbacks for the triggers at indices 6 and 7.
const TRIGGER_AXES: [(usize, AbsoluteAxisType); 2] = [
    (6, AbsoluteAxisType::ABS_Z),
    (7, AbsoluteAxisType::ABS_RZ),
];

const DPAD_KEYS: [Key; 4] = [
    Key::BTN_DPAD_UP,
    Key::BTN_DPAD_DOWN,
    Key::BTN_DPAD_LEFT,
    Key::BTN_DPAD_RIGHT,
];

const STICK_AXES: [AbsoluteAxisType; STANDARD_AXIS_COUNT] = [
    AbsoluteAxisType::ABS_X,
    AbsoluteAxisType::ABS_Y,
    AbsoluteAxisType::ABS_RX,
    AbsoluteAxisType::ABS_RY,
];

/// Maps a raw absolute value to -1.0..=1.0 over `min..=max`.
///
/// A degenerate range reads as centered.
pub fn normalize_axis(value: i32, min: i32, max: i32) -> f32 {
    if max <= min {
        return 0.0;
    }
    let span = (i64::from(max) - i64::from(min)) as f32;
    let offset = (i64::from(value) - i64::from(min)) as f32;
    (offset / span * 2.0 - 1.0).clamp(-1.0, 1.0)
}

/// Maps a raw absolute value to 0.0..=1.0 over `min..=max`.
pub fn normalize_trigger(value: i32, min: i32, max: i32) -> f32 {
    if max <= min {
        return 0.0;
    }
    let span = (i64::from(max) - i64::from(min)) as f32;
    let offset = (i64::from(value) - i64::from(min)) as f32;
    (offset / span).clamp(0.0, 1.0)
}

/// D-pad `[up, down, left, right]` from hat axis values.
pub fn hat_to_dpad(hat_x: i32, hat_y: i32) -> [f32; 4] {
    let pressed = |on: bool| if on { 1.0 } else { 0.0 };
    [
        pressed(hat_y < 0),
        pressed(hat_y > 0),
        pressed(hat_x < 0),
        pressed(hat_x > 0),
    ]
}

fn is_gamepad(device: &InputDevice) -> bool {
    device
        .supported_keys()
        .map_or(false, |keys| keys.contains(Key::BTN_SOUTH))
}

fn supports_axis(device: &InputDevice, axis: AbsoluteAxisType) -> bool {
    device
        .supported_absolute_axes()
        .map_or(false, |axes| axes.contains(axis))
}

/// One opened gamepad node.
struct EvdevPad {
    path: PathBuf,
    device: InputDevice,
    model: String,
    actuator: Option<ActuatorHandle>,
}

impl EvdevPad {
    fn new(path: PathBuf, device: InputDevice) -> Self {
        let model = device.name().unwrap_or("Unknown Gamepad").to_string();
        let actuator = EvdevActuator::open(&path, &device).map(|a| Arc::new(a) as ActuatorHandle);

        Self {
            path,
            device,
            model,
            actuator,
        }
    }

    /// Reads current key and axis state in the standard layout.
    fn read(&self, slot: usize) -> Result<Device> {
        let keys = self
            .device
            .get_key_state()
            .map_err(|e| PadlinkError::Device(format!("Failed to read keys of {}: {}", self.path.display(), e)))?;
        let abs = self
            .device
            .get_abs_state()
            .map_err(|e| PadlinkError::Device(format!("Failed to read axes of {}: {}", self.path.display(), e)))?;

        let pressed = |key: Key| if keys.contains(key) { 1.0 } else { 0.0 };

        let mut buttons: Vec<f32> = FACE_AND_MENU_KEYS.iter().map(|key| pressed(*key)).collect();

        for (index, axis) in TRIGGER_AXES {
            if buttons[index] == 0.0 && supports_axis(&self.device, axis) {
                let info = &abs[axis.0 as usize];
                buttons[index] = normalize_trigger(info.value, info.minimum, info.maximum);
            }
        }

        if supports_axis(&self.device, AbsoluteAxisType::ABS_HAT0X) {
            let hat_x = abs[AbsoluteAxisType::ABS_HAT0X.0 as usize].value;
            let hat_y = abs[AbsoluteAxisType::ABS_HAT0Y.0 as usize].value;
            buttons.extend(hat_to_dpad(hat_x, hat_y));
        } else {
            buttons.extend(DPAD_KEYS.iter().map(|key| pressed(*key)));
        }

        buttons.push(pressed(Key::BTN_MODE));

        let axes = STICK_AXES
            .iter()
            .map(|axis| {
                if supports_axis(&self.device, *axis) {
                    let info = &abs[axis.0 as usize];
                    normalize_axis(info.value, info.minimum, info.maximum)
                } else {
                    0.0
                }
            })
            .collect();

        let mut reading = Device::new(slot, self.model.clone())
            .with_buttons(buttons)
            .with_axes(axes);
        reading.actuator = self.actuator.clone();
        Ok(reading)
    }
}

/// evdev-backed [`Platform`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use padlink::platform::Platform;
/// use padlink::platform::evdev::EvdevPlatform;
///
/// let mut platform = EvdevPlatform::new(Duration::from_millis(500));
/// for event in platform.drain_events() {
///     println!("{:?}", event);
/// }
/// ```
pub struct EvdevPlatform {
    pads: BTreeMap<usize, EvdevPad>,
    rescan_interval: Duration,
    last_scan: Option<Instant>,
}

impl fmt::Debug for EvdevPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<_> = self.pads.values().map(|pad| pad.path.display().to_string()).collect();
        f.debug_struct("EvdevPlatform")
            .field("pads", &paths)
            .field("rescan_interval", &self.rescan_interval)
            .finish()
    }
}

impl EvdevPlatform {
    /// Creates a platform that rescans for devices at most every
    /// `rescan_interval`. The first [`Platform::drain_events`] scans
    /// immediately.
    #[must_use]
    pub fn new(rescan_interval: Duration) -> Self {
        Self {
            pads: BTreeMap::new(),
            rescan_interval,
            last_scan: None,
        }
    }

    /// Number of open gamepads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pads.len()
    }

    /// Whether no gamepad is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pads.is_empty()
    }

    fn free_slot(&self) -> usize {
        (0..self.pads.len())
            .find(|slot| !self.pads.contains_key(slot))
            .unwrap_or(self.pads.len())
    }

    fn rescan(&mut self) -> Vec<PlatformEvent> {
        let mut found: Vec<(PathBuf, InputDevice)> = evdev::enumerate()
            .filter(|(path, device)| {
                let gamepad = is_gamepad(device);
                if !gamepad {
                    debug!("Skipping non-gamepad input device: {}", path.display());
                }
                gamepad
            })
            .collect();

        // Deterministic slot assignment when several pads appear at once
        found.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut events = Vec::new();

        let gone: Vec<usize> = self
            .pads
            .iter()
            .filter(|(_, pad)| !found.iter().any(|(path, _)| *path == pad.path))
            .map(|(slot, _)| *slot)
            .collect();

        for slot in gone {
            if let Some(pad) = self.pads.remove(&slot) {
                info!("Gamepad removed: {} ({})", pad.model, pad.path.display());
                events.push(PlatformEvent::Disconnected(slot));
            }
        }

        for (path, device) in found {
            if self.pads.values().any(|pad| pad.path == path) {
                continue;
            }

            let slot = self.free_slot();
            let pad = EvdevPad::new(path, device);
            info!("Gamepad found at {}: {}", pad.path.display(), pad.model);

            let reading = match pad.read(slot) {
                Ok(reading) => reading,
                Err(e) => {
                    warn!("{}", e);
                    let mut reading = Device::new(slot, pad.model.clone());
                    reading.actuator = pad.actuator.clone();
                    reading
                }
            };

            self.pads.insert(slot, pad);
            events.push(PlatformEvent::Connected(reading));
        }

        events
    }
}

impl Platform for EvdevPlatform {
    fn drain_events(&mut self) -> Vec<PlatformEvent> {
        if let Some(last) = self.last_scan {
            if last.elapsed() < self.rescan_interval {
                return Vec::new();
            }
        }
        self.last_scan = Some(Instant::now());
        self.rescan()
    }

    fn connected_devices(&mut self) -> Vec<Device> {
        self.pads
            .iter()
            .filter_map(|(slot, pad)| match pad.read(*slot) {
                Ok(reading) => Some(reading),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            })
            .collect()
    }
}

/// Rumble motor of an evdev gamepad.
pub struct EvdevActuator {
    path: PathBuf,
    state: Mutex<RumbleState>,
}

struct RumbleState {
    device: InputDevice,
    effect: Option<FFEffect>,
}

impl fmt::Debug for EvdevActuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvdevActuator")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl EvdevActuator {
    /// Opens a force-feedback handle when `device` supports `FF_RUMBLE`.
    fn open(path: &Path, device: &InputDevice) -> Option<Self> {
        let rumble = device
            .supported_ff()
            .map_or(false, |effects| effects.contains(FFEffectType::FF_RUMBLE));
        if !rumble {
            debug!("No rumble support on {}", path.display());
            return None;
        }

        match InputDevice::open(path) {
            Ok(handle) => Some(Self {
                path: path.to_path_buf(),
                state: Mutex::new(RumbleState {
                    device: handle,
                    effect: None,
                }),
            }),
            Err(e) => {
                warn!("Could not open {} for rumble: {}", path.display(), e);
                None
            }
        }
    }
}

/// Scales 0.0..=1.0 to the full u16 magnitude range.
pub fn magnitude_to_u16(magnitude: f32) -> u16 {
    if magnitude.is_nan() {
        return 0;
    }
    (magnitude.clamp(0.0, 1.0) * f32::from(u16::MAX)).round() as u16
}

/// Effect length in milliseconds, saturating at u16::MAX.
pub fn duration_to_ms(duration: Duration) -> u16 {
    u16::try_from(duration.as_millis()).unwrap_or(u16::MAX)
}

/// Force-feedback payload for a rumble command.
pub fn rumble_effect(params: &EffectParams) -> FFEffectData {
    FFEffectData {
        direction: 0,
        trigger: FFTrigger {
            button: 0,
            interval: 0,
        },
        replay: FFReplay {
            length: duration_to_ms(params.duration),
            delay: 0,
        },
        kind: FFEffectKind::Rumble {
            strong_magnitude: magnitude_to_u16(params.strong_magnitude),
            weak_magnitude: magnitude_to_u16(params.weak_magnitude),
        },
    }
}

impl Actuator for EvdevActuator {
    fn play_effect(&self, kind: EffectKind, params: EffectParams) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => {
                warn!("Rumble state of {} poisoned, dropping {}", self.path.display(), kind.as_str());
                return;
            }
        };

        // Erase the previous effect so the kernel slot is free
        state.effect = None;

        let data = match kind {
            EffectKind::DualRumble => rumble_effect(&params),
        };

        match state.device.upload_ff_effect(data) {
            Ok(mut effect) => {
                if let Err(e) = effect.play(1) {
                    warn!("Failed to play rumble on {}: {}", self.path.display(), e);
                }
                state.effect = Some(effect);
            }
            Err(e) => warn!("Failed to upload rumble to {}: {}", self.path.display(), e),
        }
    }
}
