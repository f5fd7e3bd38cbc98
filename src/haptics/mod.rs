//! # Haptics Module
//!
//! Best-effort rumble across every connected controller.
//!
//! ## Presets
//!
//! | Preset | Strong motor | Mild motor |
//! |--------|--------------|------------|
//! | `mild` | 0.0 | 0.07 |
//! | `medium` | 0.0 | 0.14 |
//! | `strong` | 1.0 | 1.0 |
//!
//! A vibration is either one of these presets or explicit intensities.
//! [`HapticController::vibrate`] sends a `dual-rumble` effect to every
//! connected device that has an actuator, then completes once the requested
//! duration has elapsed on the timer. It never waits for the hardware.
//!
//! Concurrent vibrations are not coordinated: whichever command reaches an
//! actuator last decides what the motor does, while every caller still waits
//! out its own duration.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use padlink::controller::profile::ProfileTable;
//! use padlink::haptics::Intensity;
//! use padlink::platform::evdev::EvdevPlatform;
//! use padlink::platform::TokioTimer;
//! use padlink::polling::PollingLoop;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let platform = EvdevPlatform::new(Duration::from_millis(500));
//!     let polling = PollingLoop::new(platform, ProfileTable::builtin());
//!     let haptics = polling.haptics(Arc::new(TokioTimer));
//!
//!     haptics.vibrate(Intensity::preset("strong")?, Duration::from_millis(200)).await;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::error::{PadlinkError, Result};
use crate::platform::Timer;

/// Kind of effect sent to an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Two-motor rumble (one strong, one weak motor).
    DualRumble,
}

impl EffectKind {
    /// Conventional effect name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::DualRumble => "dual-rumble",
        }
    }
}

/// Parameters of one actuator command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    /// How long the motors run.
    pub duration: Duration,
    /// Strong (low-frequency) motor magnitude, 0.0..=1.0.
    pub strong_magnitude: f32,
    /// Weak (high-frequency) motor magnitude, 0.0..=1.0.
    pub weak_magnitude: f32,
}

/// Rumble motor of one device.
///
/// Commands are fire-and-forget: implementations report failures through
/// logging only.
#[cfg_attr(test, mockall::automock)]
pub trait Actuator: Send + Sync {
    /// Starts `kind` with `params`, replacing whatever the motor was doing.
    fn play_effect(&self, kind: EffectKind, params: EffectParams);
}

/// Shared handle to a device's actuator.
pub type ActuatorHandle = Arc<dyn Actuator>;

/// Named vibration intensities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VibrationPreset {
    /// Light buzz on the mild motor.
    Mild,
    /// Firmer buzz on the mild motor.
    Medium,
    /// Both motors at full power.
    Strong,
}

impl VibrationPreset {
    /// Every preset, weakest first.
    pub const ALL: [VibrationPreset; 3] = [
        VibrationPreset::Mild,
        VibrationPreset::Medium,
        VibrationPreset::Strong,
    ];

    /// Preset name as accepted by [`FromStr`].
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            VibrationPreset::Mild => "mild",
            VibrationPreset::Medium => "medium",
            VibrationPreset::Strong => "strong",
        }
    }

    /// Strong motor intensity.
    #[must_use]
    pub fn strong_motor_intensity(&self) -> f32 {
        match self {
            VibrationPreset::Mild | VibrationPreset::Medium => 0.0,
            VibrationPreset::Strong => 1.0,
        }
    }

    /// Mild motor intensity.
    #[must_use]
    pub fn mild_motor_intensity(&self) -> f32 {
        match self {
            VibrationPreset::Mild => 0.07,
            VibrationPreset::Medium => 0.14,
            VibrationPreset::Strong => 1.0,
        }
    }
}

impl FromStr for VibrationPreset {
    type Err = PadlinkError;

    fn from_str(s: &str) -> Result<Self> {
        VibrationPreset::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| PadlinkError::UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for VibrationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to vibrate with: a preset or explicit motor intensities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intensity {
    /// One of the named presets.
    Preset(VibrationPreset),
    /// Explicit intensities, clamped to 0.0..=1.0 on resolution.
    Explicit {
        /// Strong motor intensity.
        strong_motor_intensity: f32,
        /// Mild motor intensity.
        mild_motor_intensity: f32,
    },
}

impl Intensity {
    /// Looks up a preset by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreset` when `name` is not `mild`, `medium` or
    /// `strong`.
    ///
    /// # Examples
    ///
    /// ```
    /// use padlink::haptics::{Intensity, VibrationPreset};
    ///
    /// assert_eq!(Intensity::preset("medium")?, Intensity::Preset(VibrationPreset::Medium));
    /// assert!(Intensity::preset("earthquake").is_err());
    /// # Ok::<(), padlink::error::PadlinkError>(())
    /// ```
    pub fn preset(name: &str) -> Result<Self> {
        name.parse().map(Intensity::Preset)
    }

    /// Explicit motor intensities.
    #[must_use]
    pub fn explicit(strong_motor_intensity: f32, mild_motor_intensity: f32) -> Self {
        Intensity::Explicit {
            strong_motor_intensity,
            mild_motor_intensity,
        }
    }
}

impl From<VibrationPreset> for Intensity {
    fn from(preset: VibrationPreset) -> Self {
        Intensity::Preset(preset)
    }
}

/// Fully resolved vibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VibrationRequest {
    /// Strong motor intensity, 0.0..=1.0.
    pub strong_motor_intensity: f32,
    /// Mild motor intensity, 0.0..=1.0.
    pub mild_motor_intensity: f32,
    /// How long the vibration lasts.
    pub duration: Duration,
}

impl VibrationRequest {
    /// Resolves an intensity into motor values.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use padlink::haptics::{Intensity, VibrationPreset, VibrationRequest};
    ///
    /// let request = VibrationRequest::resolve(VibrationPreset::Strong.into(), Duration::from_millis(200));
    /// assert_eq!(request.strong_motor_intensity, 1.0);
    /// assert_eq!(request.mild_motor_intensity, 1.0);
    /// ```
    #[must_use]
    pub fn resolve(intensity: Intensity, duration: Duration) -> Self {
        let (strong, mild) = match intensity {
            Intensity::Preset(preset) => {
                (preset.strong_motor_intensity(), preset.mild_motor_intensity())
            }
            Intensity::Explicit {
                strong_motor_intensity,
                mild_motor_intensity,
            } => (strong_motor_intensity, mild_motor_intensity),
        };

        Self {
            strong_motor_intensity: clamp_unit(strong),
            mild_motor_intensity: clamp_unit(mild),
            duration,
        }
    }

    /// Actuator parameters for this request.
    #[must_use]
    pub fn effect_params(&self) -> EffectParams {
        EffectParams {
            duration: self.duration,
            strong_magnitude: self.strong_motor_intensity,
            weak_magnitude: self.mild_motor_intensity,
        }
    }
}

/// Clamps to 0.0..=1.0, mapping NaN to 0.0.
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Drives the actuators of all connected devices.
///
/// Cheap to clone; clones see the same set of connected actuators.
#[derive(Clone)]
pub struct HapticController {
    actuators: watch::Receiver<Vec<ActuatorHandle>>,
    timer: Arc<dyn Timer>,
}

impl fmt::Debug for HapticController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HapticController")
            .field("actuators", &self.actuator_count())
            .finish_non_exhaustive()
    }
}

impl HapticController {
    /// Creates a controller over a published actuator set.
    #[must_use]
    pub fn new(actuators: watch::Receiver<Vec<ActuatorHandle>>, timer: Arc<dyn Timer>) -> Self {
        Self { actuators, timer }
    }

    /// Number of connected actuators.
    #[must_use]
    pub fn actuator_count(&self) -> usize {
        self.actuators.borrow().len()
    }

    /// Sends `request` to every connected actuator without waiting.
    ///
    /// Returns the number of actuators commanded.
    pub fn command(&self, request: &VibrationRequest) -> usize {
        let actuators: Vec<ActuatorHandle> = self.actuators.borrow().clone();
        let params = request.effect_params();

        for actuator in &actuators {
            actuator.play_effect(EffectKind::DualRumble, params);
        }

        debug!(
            "Rumble strong={} mild={} for {:?} on {} actuator(s)",
            request.strong_motor_intensity,
            request.mild_motor_intensity,
            request.duration,
            actuators.len()
        );
        actuators.len()
    }

    /// Vibrates every connected device and waits out `duration`.
    ///
    /// Devices without an actuator are skipped. Completion means the timer
    /// fired, not that the hardware acknowledged anything.
    pub async fn vibrate(&self, intensity: Intensity, duration: Duration) {
        let request = VibrationRequest::resolve(intensity, duration);
        self.command(&request);
        self.timer.delay(duration).await;
    }

    /// Vibrates with a preset given by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreset` before touching any actuator when `preset` is
    /// not a known preset name.
    pub async fn vibrate_preset(&self, preset: &str, duration: Duration) -> Result<()> {
        let intensity = Intensity::preset(preset)?;
        self.vibrate(intensity, duration).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::device::{Device, DeviceRegistry};
    use crate::platform::TokioTimer;
    use tokio::time::Instant;
    use tokio_test::{assert_pending, assert_ready};

    fn controller_for(registry: &DeviceRegistry) -> HapticController {
        HapticController::new(registry.subscribe_actuators(), Arc::new(TokioTimer))
    }

    fn expect_rumble(strong: f32, weak: f32, duration: Duration) -> MockActuator {
        let mut actuator = MockActuator::new();
        actuator
            .expect_play_effect()
            .withf(move |kind, params| {
                *kind == EffectKind::DualRumble
                    && params.strong_magnitude == strong
                    && params.weak_magnitude == weak
                    && params.duration == duration
            })
            .times(1)
            .return_const(());
        actuator
    }

    // ==================== Preset Tests ====================

    #[test]
    fn test_preset_table() {
        assert_eq!(VibrationPreset::Mild.strong_motor_intensity(), 0.0);
        assert_eq!(VibrationPreset::Mild.mild_motor_intensity(), 0.07);
        assert_eq!(VibrationPreset::Medium.strong_motor_intensity(), 0.0);
        assert_eq!(VibrationPreset::Medium.mild_motor_intensity(), 0.14);
        assert_eq!(VibrationPreset::Strong.strong_motor_intensity(), 1.0);
        assert_eq!(VibrationPreset::Strong.mild_motor_intensity(), 1.0);
    }

    #[test]
    fn test_preset_names_round_trip() {
        for preset in VibrationPreset::ALL {
            assert_eq!(preset.name().parse::<VibrationPreset>().ok(), Some(preset));
            assert_eq!(preset.to_string(), preset.name());
        }
    }

    #[test]
    fn test_unknown_preset_is_error() {
        match "Strong".parse::<VibrationPreset>() {
            Err(PadlinkError::UnknownPreset(name)) => assert_eq!(name, "Strong"),
            other => panic!("Expected UnknownPreset, got: {:?}", other),
        }
        assert!(Intensity::preset("").is_err());
    }

    #[test]
    fn test_effect_kind_name() {
        assert_eq!(EffectKind::DualRumble.as_str(), "dual-rumble");
    }

    // ==================== Resolution Tests ====================

    #[test]
    fn test_resolve_strong_preset() {
        let request = VibrationRequest::resolve(
            Intensity::preset("strong").unwrap(),
            Duration::from_millis(200),
        );
        assert_eq!(
            request,
            VibrationRequest {
                strong_motor_intensity: 1.0,
                mild_motor_intensity: 1.0,
                duration: Duration::from_millis(200),
            }
        );
    }

    #[test]
    fn test_resolve_explicit_clamps() {
        let request = VibrationRequest::resolve(Intensity::explicit(1.5, -0.2), Duration::ZERO);
        assert_eq!(request.strong_motor_intensity, 1.0);
        assert_eq!(request.mild_motor_intensity, 0.0);

        let request = VibrationRequest::resolve(Intensity::explicit(f32::NAN, 0.3), Duration::ZERO);
        assert_eq!(request.strong_motor_intensity, 0.0);
        assert_eq!(request.mild_motor_intensity, 0.3);
    }

    #[test]
    fn test_effect_params_mapping() {
        let request = VibrationRequest::resolve(Intensity::explicit(0.25, 0.5), Duration::from_millis(80));
        let params = request.effect_params();
        assert_eq!(params.strong_magnitude, 0.25);
        assert_eq!(params.weak_magnitude, 0.5);
        assert_eq!(params.duration, Duration::from_millis(80));
    }

    // ==================== Controller Tests ====================

    #[test]
    fn test_command_skips_devices_without_actuator() {
        let duration = Duration::from_millis(100);
        let mut registry = DeviceRegistry::new();
        registry.connect(Device::new(0, "pad").with_actuator(Arc::new(expect_rumble(0.0, 0.14, duration))));
        registry.connect(Device::new(1, "no motor"));
        registry.connect(Device::new(2, "pad").with_actuator(Arc::new(expect_rumble(0.0, 0.14, duration))));

        let haptics = HapticController::new(registry.subscribe_actuators(), Arc::new(TokioTimer));
        let request = VibrationRequest::resolve(VibrationPreset::Medium.into(), duration);
        assert_eq!(haptics.command(&request), 2);
    }

    #[test]
    fn test_command_with_no_devices() {
        let registry = DeviceRegistry::new();
        let haptics = controller_for(&registry);
        let request = VibrationRequest::resolve(VibrationPreset::Mild.into(), Duration::from_millis(10));
        assert_eq!(haptics.command(&request), 0);
        assert_eq!(haptics.actuator_count(), 0);
    }

    #[test]
    fn test_controller_sees_later_connections() {
        let mut registry = DeviceRegistry::new();
        let haptics = controller_for(&registry);
        assert_eq!(haptics.actuator_count(), 0);

        registry.connect(Device::new(0, "pad").with_actuator(Arc::new(MockActuator::new())));
        assert_eq!(haptics.clone().actuator_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vibrate_strong_waits_for_duration() {
        let duration = Duration::from_millis(200);
        let mut registry = DeviceRegistry::new();
        registry.connect(Device::new(0, "pad").with_actuator(Arc::new(expect_rumble(1.0, 1.0, duration))));
        let haptics = controller_for(&registry);

        let start = Instant::now();
        haptics.vibrate(Intensity::preset("strong").unwrap(), duration).await;
        assert!(start.elapsed() >= duration);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vibrate_pending_until_timer_fires() {
        let duration = Duration::from_millis(200);
        let mut registry = DeviceRegistry::new();
        registry.connect(Device::new(0, "pad").with_actuator(Arc::new(expect_rumble(0.0, 0.07, duration))));
        let haptics = controller_for(&registry);

        let mut task = tokio_test::task::spawn(haptics.vibrate(VibrationPreset::Mild.into(), duration));
        assert_pending!(task.poll());

        tokio::time::advance(Duration::from_millis(199)).await;
        assert_pending!(task.poll());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_ready!(task.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_vibrate_preset_unknown_touches_nothing() {
        let mut registry = DeviceRegistry::new();
        // No expectations: any play_effect call would panic
        registry.connect(Device::new(0, "pad").with_actuator(Arc::new(MockActuator::new())));
        let haptics = controller_for(&registry);

        let result = haptics.vibrate_preset("rumble", Duration::from_millis(50)).await;
        assert!(matches!(result, Err(PadlinkError::UnknownPreset(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_vibrations_each_wait() {
        let mut actuator = MockActuator::new();
        actuator.expect_play_effect().times(2).return_const(());
        let mut registry = DeviceRegistry::new();
        registry.connect(Device::new(0, "pad").with_actuator(Arc::new(actuator)));
        let haptics = controller_for(&registry);

        let start = Instant::now();
        tokio::join!(
            haptics.vibrate(VibrationPreset::Strong.into(), Duration::from_millis(300)),
            haptics.vibrate(VibrationPreset::Mild.into(), Duration::from_millis(100)),
        );
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
