//! # Change Detection Module
//!
//! Decodes raw device readings into named controls and dispatches listeners
//! whose value changed since the last dispatch.
//!
//! ## Decode Pipeline
//!
//! For each device, in ascending slot order:
//!
//! 1. Resolve the [`DeviceProfile`] from the device's model identifier.
//! 2. **Buttons**: each raw index with a mapped name yields `(name, value)`.
//! 3. **Axes**: each raw index is routed through the profile's axis binding
//!    (with axis aliasing applied) into a `(composite, component)` slot.
//!    Components are written in raw order, so when two raw indices feed the
//!    same component the higher index wins. A component nothing feeds reads
//!    as 0.0.
//! 4. Sign flips from the profile negate components of every composite.
//! 5. Each decoded value is offered to its listener, which fires only when
//!    the value differs from the last one it dispatched.
//!
//! Unmapped raw indices are ignored. A composite that no raw index feeds is
//! never produced, so its listener never fires for that device.
//!
//! ## Usage
//!
//! ```
//! use padlink::controller::device::Device;
//! use padlink::controller::listener::ListenerRegistry;
//! use padlink::controller::mapper::ChangeDetector;
//! use padlink::controller::profile::ProfileTable;
//!
//! let detector = ChangeDetector::new(ProfileTable::builtin());
//! let mut listeners = ListenerRegistry::new();
//! listeners.on_press("dpad-left", |value| assert_eq!(value, 1.0));
//!
//! let device = Device::new(0, "Joy-Con (L)").with_buttons(vec![1.0]);
//! assert_eq!(detector.tick([&device], &mut listeners), 1);
//! assert_eq!(detector.tick([&device], &mut listeners), 0);
//! ```

use tracing::trace;

use super::device::Device;
use super::listener::{ListenerRegistry, Vec2};
use super::profile::{AxisComponent, DeviceProfile, ProfileTable};

/// Decoded, named view of one device's raw readings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedState {
    /// Button values in raw index order.
    pub buttons: Vec<(&'static str, f32)>,
    /// Composite values in order of first appearance.
    pub composites: Vec<(&'static str, Vec2)>,
}

/// Maps raw button values to named values. Unmapped indices are skipped.
pub fn decode_buttons<'a>(
    profile: &'a DeviceProfile,
    buttons: &'a [f32],
) -> impl Iterator<Item = (&'static str, f32)> + 'a {
    buttons
        .iter()
        .enumerate()
        .filter_map(move |(index, value)| profile.button_name(index).map(|name| (name, *value)))
}

/// Groups raw axis values into composites and applies the profile's quirks.
pub fn decode_axes(profile: &DeviceProfile, axes: &[f32]) -> Vec<(&'static str, Vec2)> {
    let mut composites: Vec<(&'static str, Vec2)> = Vec::new();

    for (index, &value) in axes.iter().enumerate() {
        let Some(binding) = profile.axis_binding(index) else {
            continue;
        };

        let existing = composites
            .iter()
            .position(|(name, _)| *name == binding.composite);
        let position = match existing {
            Some(position) => position,
            None => {
                composites.push((binding.composite, Vec2::default()));
                composites.len() - 1
            }
        };

        let vector = &mut composites[position].1;
        match binding.component {
            AxisComponent::X => vector.x = value,
            AxisComponent::Y => vector.y = value,
        }
    }

    for component in profile.sign_flips() {
        for (_, vector) in composites.iter_mut() {
            match component {
                AxisComponent::X => vector.x = negate(vector.x),
                AxisComponent::Y => vector.y = negate(vector.y),
            }
        }
    }

    composites
}

/// Negation that keeps a resting axis at +0.0.
fn negate(value: f32) -> f32 {
    if value == 0.0 {
        0.0
    } else {
        -value
    }
}

/// Decodes one device with `profile`.
#[must_use]
pub fn decode(profile: &DeviceProfile, device: &Device) -> DecodedState {
    DecodedState {
        buttons: decode_buttons(profile, &device.buttons).collect(),
        composites: decode_axes(profile, &device.axes),
    }
}

/// Per-tick change detection across all connected devices.
///
/// Holds only the immutable profile table; listener caches live in the
/// [`ListenerRegistry`] passed to [`ChangeDetector::tick`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector {
    profiles: ProfileTable,
}

impl ChangeDetector {
    /// Creates a detector over `profiles`.
    #[must_use]
    pub fn new(profiles: ProfileTable) -> Self {
        Self { profiles }
    }

    /// The profile table used for lookups.
    #[must_use]
    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    /// Decodes `device` with its resolved profile.
    #[must_use]
    pub fn decode(&self, device: &Device) -> DecodedState {
        decode(self.profiles.profile_for(&device.model), device)
    }

    /// Runs one change-detection pass.
    ///
    /// Callbacks fire in device order, then button order, then composite
    /// order. Returns the number of callbacks invoked.
    pub fn tick<'a, I>(&self, devices: I, listeners: &mut ListenerRegistry) -> usize
    where
        I: IntoIterator<Item = &'a Device>,
    {
        let mut dispatched = 0;

        for device in devices {
            let profile = self.profiles.profile_for(&device.model);

            for (name, value) in decode_buttons(profile, &device.buttons) {
                if listeners.dispatch_press(name, value) {
                    dispatched += 1;
                }
            }

            for (composite, vector) in decode_axes(profile, &device.axes) {
                if listeners.dispatch_move(composite, vector) {
                    dispatched += 1;
                }
            }
        }

        if dispatched > 0 {
            trace!("Tick dispatched {} callbacks", dispatched);
        }
        dispatched
    }
}
