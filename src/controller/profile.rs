//! # Device Profile Module
//!
//! Static tables that turn positional raw indices into named controls.
//!
//! Every controller reports its buttons and axes as plain arrays. A
//! [`DeviceProfile`] says which raw index is which semantic control for one
//! controller model, and carries the quirk rules needed when a model reports
//! logically identical controls differently (the split Joy-Con halves).
//!
//! ## Built-in Profiles
//!
//! | Model prefix | Layout | Quirks |
//! |--------------|--------|--------|
//! | *(generic)* | Standard 18-button layout | none |
//! | `Xbox Wireless Controller` | Standard 18-button layout | none |
//! | `Joy-Con (L)` | D-pad on face indices, left-half subset | X component negated |
//! | `Joy-Con (R)` | Face buttons reordered, right-half subset | Axes 0/1 read as axes 2/3 |
//!
//! All built-in profiles share the same composite axis map:
//!
//! | Raw axis | Component | Composite |
//! |----------|-----------|-----------|
//! | 0 | x | `left-joystick` |
//! | 1 | y | `left-joystick` |
//! | 2 | x | `right-joystick` |
//! | 3 | y | `right-joystick` |
//!
//! ## Usage
//!
//! ```
//! use padlink::controller::profile::{controls, ProfileTable};
//!
//! let table = ProfileTable::builtin();
//! let profile = table.profile_for("Joy-Con (L) (STANDARD GAMEPAD Vendor: 057e Product: 2006)");
//! assert_eq!(profile.button_name(0), Some(controls::DPAD_LEFT));
//!
//! // Unknown hardware falls back to the generic layout
//! let generic = table.profile_for("Some Arcade Stick");
//! assert_eq!(generic.button_name(0), Some(controls::A));
//! ```

/// Semantic control names.
///
/// Button names double as press-listener keys. Composite names are the
/// prefix of move-listener keys (`left-joystick` → `left-joystick-move`).
pub mod controls {
    pub const A: &str = "a";
    pub const B: &str = "b";
    pub const X: &str = "x";
    pub const Y: &str = "y";
    pub const LEFT_SHOULDER: &str = "left-shoulder";
    pub const RIGHT_SHOULDER: &str = "right-shoulder";
    pub const LEFT_TRIGGER: &str = "left-trigger";
    pub const RIGHT_TRIGGER: &str = "right-trigger";
    pub const SELECT: &str = "select";
    pub const START: &str = "start";
    /// Left stick click, and the left stick composite.
    pub const LEFT_JOYSTICK: &str = "left-joystick";
    /// Right stick click, and the right stick composite.
    pub const RIGHT_JOYSTICK: &str = "right-joystick";
    pub const DPAD_UP: &str = "dpad-up";
    pub const DPAD_DOWN: &str = "dpad-down";
    pub const DPAD_LEFT: &str = "dpad-left";
    pub const DPAD_RIGHT: &str = "dpad-right";
    pub const HOME: &str = "home";
    pub const SHARE: &str = "share";
    /// SL rail button on a single Joy-Con.
    pub const SIDE_LEFT_SHOULDER: &str = "side-left-shoulder";
    /// SR rail button on a single Joy-Con.
    pub const SIDE_RIGHT_SHOULDER: &str = "side-right-shoulder";

    /// Every button name used by the built-in profiles.
    pub const BUTTONS: &[&str] = &[
        A,
        B,
        X,
        Y,
        LEFT_SHOULDER,
        RIGHT_SHOULDER,
        LEFT_TRIGGER,
        RIGHT_TRIGGER,
        SELECT,
        START,
        LEFT_JOYSTICK,
        RIGHT_JOYSTICK,
        DPAD_UP,
        DPAD_DOWN,
        DPAD_LEFT,
        DPAD_RIGHT,
        HOME,
        SHARE,
        SIDE_LEFT_SHOULDER,
        SIDE_RIGHT_SHOULDER,
    ];

    /// Every composite (two-axis) control used by the built-in profiles.
    pub const COMPOSITES: &[&str] = &[LEFT_JOYSTICK, RIGHT_JOYSTICK];
}

/// One component of a two-axis composite control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisComponent {
    /// Horizontal component.
    X,
    /// Vertical component.
    Y,
}

/// Where a raw axis lands: which component of which composite control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisBinding {
    /// Component the raw value is written to.
    pub component: AxisComponent,
    /// Composite control name (without the `-move` suffix).
    pub composite: &'static str,
}

impl AxisBinding {
    /// Binds a raw axis to a composite component.
    #[must_use]
    pub const fn new(component: AxisComponent, composite: &'static str) -> Self {
        Self {
            component,
            composite,
        }
    }
}

/// Model-specific correction applied around composite decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quirk {
    /// Raw axis `target` is decoded with the binding of raw axis `source`.
    ///
    /// Applied before decode.
    AliasAxis {
        /// Raw index whose binding is replaced.
        target: usize,
        /// Raw index whose binding is borrowed.
        source: usize,
    },
    /// Negate one component of every decoded composite.
    ///
    /// Applied after decode.
    FlipSign(AxisComponent),
}

/// Immutable raw-index → semantic-control mapping for one controller model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Human-readable profile name (used in logs).
    pub name: &'static str,
    /// Raw button index → button name. Missing indices are unmapped.
    pub buttons: &'static [(usize, &'static str)],
    /// Raw axis index → composite binding. Missing indices are unmapped.
    pub axes: &'static [(usize, AxisBinding)],
    /// Quirk rules for this model.
    pub quirks: &'static [Quirk],
}

impl DeviceProfile {
    /// Returns the semantic name of raw button `index`, if mapped.
    #[must_use]
    pub fn button_name(&self, index: usize) -> Option<&'static str> {
        self.buttons
            .iter()
            .find(|(raw, _)| *raw == index)
            .map(|(_, name)| *name)
    }

    /// Returns the binding that raw axis `index` feeds, after axis aliasing.
    #[must_use]
    pub fn axis_binding(&self, index: usize) -> Option<AxisBinding> {
        let source = self
            .quirks
            .iter()
            .find_map(|quirk| match *quirk {
                Quirk::AliasAxis { target, source } if target == index => Some(source),
                _ => None,
            })
            .unwrap_or(index);

        self.axes
            .iter()
            .find(|(raw, _)| *raw == source)
            .map(|(_, binding)| *binding)
    }

    /// Components negated after decode.
    pub fn sign_flips(&self) -> impl Iterator<Item = AxisComponent> + '_ {
        self.quirks.iter().filter_map(|quirk| match *quirk {
            Quirk::FlipSign(component) => Some(component),
            Quirk::AliasAxis { .. } => None,
        })
    }
}

/// Standard layout shared by the generic and Xbox profiles.
const STANDARD_BUTTONS: &[(usize, &str)] = &[
    (0, controls::A),
    (1, controls::B),
    (2, controls::X),
    (3, controls::Y),
    (4, controls::LEFT_SHOULDER),
    (5, controls::RIGHT_SHOULDER),
    (6, controls::LEFT_TRIGGER),
    (7, controls::RIGHT_TRIGGER),
    (8, controls::SELECT),
    (9, controls::START),
    (10, controls::LEFT_JOYSTICK),
    (11, controls::RIGHT_JOYSTICK),
    (12, controls::DPAD_UP),
    (13, controls::DPAD_DOWN),
    (14, controls::DPAD_LEFT),
    (15, controls::DPAD_RIGHT),
    (16, controls::HOME),
    (17, controls::SHARE),
];

const JOYCON_LEFT_BUTTONS: &[(usize, &str)] = &[
    (0, controls::DPAD_LEFT),
    (1, controls::DPAD_DOWN),
    (2, controls::DPAD_UP),
    (3, controls::DPAD_RIGHT),
    (4, controls::SIDE_LEFT_SHOULDER),
    (5, controls::SIDE_RIGHT_SHOULDER),
    (6, controls::LEFT_TRIGGER),
    (8, controls::LEFT_SHOULDER),
    (9, controls::SELECT),
    (10, controls::LEFT_JOYSTICK),
    (16, controls::SHARE),
];

const JOYCON_RIGHT_BUTTONS: &[(usize, &str)] = &[
    (0, controls::A),
    (1, controls::X),
    (2, controls::B),
    (3, controls::Y),
    (4, controls::SIDE_LEFT_SHOULDER),
    (5, controls::SIDE_RIGHT_SHOULDER),
    (7, controls::RIGHT_TRIGGER),
    (8, controls::RIGHT_SHOULDER),
    (9, controls::START),
    (10, controls::RIGHT_JOYSTICK),
    (16, controls::HOME),
];

const STANDARD_AXES: &[(usize, AxisBinding)] = &[
    (0, AxisBinding::new(AxisComponent::X, controls::LEFT_JOYSTICK)),
    (1, AxisBinding::new(AxisComponent::Y, controls::LEFT_JOYSTICK)),
    (2, AxisBinding::new(AxisComponent::X, controls::RIGHT_JOYSTICK)),
    (3, AxisBinding::new(AxisComponent::Y, controls::RIGHT_JOYSTICK)),
];

/// Fallback profile for hardware with no matching prefix.
pub const GENERIC_PROFILE: DeviceProfile = DeviceProfile {
    name: "generic",
    buttons: STANDARD_BUTTONS,
    axes: STANDARD_AXES,
    quirks: &[],
};

/// Xbox Wireless Controller.
pub const XBOX_WIRELESS_PROFILE: DeviceProfile = DeviceProfile {
    name: "xbox-wireless",
    buttons: STANDARD_BUTTONS,
    axes: STANDARD_AXES,
    quirks: &[],
};

/// Left Joy-Con held on its own. Its stick reports X inverted.
pub const JOYCON_LEFT_PROFILE: DeviceProfile = DeviceProfile {
    name: "joycon-left",
    buttons: JOYCON_LEFT_BUTTONS,
    axes: STANDARD_AXES,
    quirks: &[Quirk::FlipSign(AxisComponent::X)],
};

/// Right Joy-Con held on its own. Its stick is fed from axes 2/3.
pub const JOYCON_RIGHT_PROFILE: DeviceProfile = DeviceProfile {
    name: "joycon-right",
    buttons: JOYCON_RIGHT_BUTTONS,
    axes: STANDARD_AXES,
    quirks: &[
        Quirk::AliasAxis { target: 0, source: 2 },
        Quirk::AliasAxis { target: 1, source: 3 },
    ],
};

const BUILTIN_PREFIXES: &[(&str, DeviceProfile)] = &[
    ("Xbox Wireless Controller", XBOX_WIRELESS_PROFILE),
    ("Joy-Con (L)", JOYCON_LEFT_PROFILE),
    ("Joy-Con (R)", JOYCON_RIGHT_PROFILE),
];

/// Prefix-keyed set of profiles with a generic fallback.
///
/// Lookup is pure: the same model identifier always yields the same profile.
#[derive(Debug, Clone, Copy)]
pub struct ProfileTable {
    generic: DeviceProfile,
    by_prefix: &'static [(&'static str, DeviceProfile)],
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProfileTable {
    /// Creates a table from a fallback profile and prefix-keyed profiles.
    #[must_use]
    pub const fn new(
        generic: DeviceProfile,
        by_prefix: &'static [(&'static str, DeviceProfile)],
    ) -> Self {
        Self { generic, by_prefix }
    }

    /// The built-in table (generic, Xbox, Joy-Con halves).
    #[must_use]
    pub const fn builtin() -> Self {
        Self::new(GENERIC_PROFILE, BUILTIN_PREFIXES)
    }

    /// Resolves the profile for a model identifier.
    ///
    /// The longest known prefix of `model` wins. Identifiers matching no
    /// prefix get the generic profile; there is no failure case.
    ///
    /// # Examples
    ///
    /// ```
    /// use padlink::controller::profile::{ProfileTable, JOYCON_RIGHT_PROFILE};
    ///
    /// let table = ProfileTable::builtin();
    /// assert_eq!(*table.profile_for("Joy-Con (R)"), JOYCON_RIGHT_PROFILE);
    /// assert_eq!(table.profile_for("").name, "generic");
    /// ```
    #[must_use]
    pub fn profile_for(&self, model: &str) -> &DeviceProfile {
        self.by_prefix
            .iter()
            .filter(|(prefix, _)| model.starts_with(prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, profile)| profile)
            .unwrap_or(&self.generic)
    }

    /// The fallback profile.
    #[must_use]
    pub fn generic(&self) -> &DeviceProfile {
        &self.generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_gets_generic() {
        let table = ProfileTable::builtin();
        for model in ["", "Wireless Controller", "8BitDo Pro 2", "joy-con (l)"] {
            assert_eq!(table.profile_for(model).name, "generic", "model {:?}", model);
        }
    }

    #[test]
    fn test_browser_style_identifiers_match_prefix() {
        let table = ProfileTable::builtin();
        let left = table.profile_for("Joy-Con (L) (STANDARD GAMEPAD Vendor: 057e Product: 2006)");
        let right = table.profile_for("Joy-Con (R) (STANDARD GAMEPAD Vendor: 057e Product: 2007)");
        let xbox = table.profile_for("Xbox Wireless Controller (STANDARD GAMEPAD)");

        assert_eq!(*left, JOYCON_LEFT_PROFILE);
        assert_eq!(*right, JOYCON_RIGHT_PROFILE);
        assert_eq!(*xbox, XBOX_WIRELESS_PROFILE);
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let table = ProfileTable::builtin();
        let first = *table.profile_for("Joy-Con (L)");
        for _ in 0..10 {
            assert_eq!(*table.profile_for("Joy-Con (L)"), first);
        }
    }

    #[test]
    fn test_longest_prefix_wins() {
        const SPECIFIC: DeviceProfile = DeviceProfile {
            name: "specific",
            buttons: &[(0, controls::HOME)],
            axes: &[],
            quirks: &[],
        };
        const BROAD: DeviceProfile = DeviceProfile {
            name: "broad",
            buttons: &[(0, controls::START)],
            axes: &[],
            quirks: &[],
        };
        const PREFIXES: &[(&str, DeviceProfile)] = &[("Pad", BROAD), ("Pad Pro", SPECIFIC)];

        let table = ProfileTable::new(GENERIC_PROFILE, PREFIXES);
        assert_eq!(table.profile_for("Pad Pro 2").name, "specific");
        assert_eq!(table.profile_for("Pad Lite").name, "broad");
        assert_eq!(table.profile_for("Other").name, "generic");
    }

    #[test]
    fn test_generic_button_layout() {
        let profile = GENERIC_PROFILE;
        assert_eq!(profile.button_name(0), Some(controls::A));
        assert_eq!(profile.button_name(12), Some(controls::DPAD_UP));
        assert_eq!(profile.button_name(17), Some(controls::SHARE));
        assert_eq!(profile.button_name(18), None);
    }

    #[test]
    fn test_joycon_left_has_gaps() {
        let profile = JOYCON_LEFT_PROFILE;
        assert_eq!(profile.button_name(0), Some(controls::DPAD_LEFT));
        assert_eq!(profile.button_name(7), None);
        assert_eq!(profile.button_name(11), None);
        assert_eq!(profile.button_name(16), Some(controls::SHARE));
    }

    #[test]
    fn test_joycon_right_face_buttons() {
        let profile = JOYCON_RIGHT_PROFILE;
        assert_eq!(profile.button_name(1), Some(controls::X));
        assert_eq!(profile.button_name(2), Some(controls::B));
        assert_eq!(profile.button_name(6), None);
    }

    #[test]
    fn test_axis_binding_without_quirks() {
        let profile = GENERIC_PROFILE;
        assert_eq!(
            profile.axis_binding(0),
            Some(AxisBinding::new(AxisComponent::X, controls::LEFT_JOYSTICK))
        );
        assert_eq!(
            profile.axis_binding(3),
            Some(AxisBinding::new(AxisComponent::Y, controls::RIGHT_JOYSTICK))
        );
        assert_eq!(profile.axis_binding(4), None);
    }

    #[test]
    fn test_axis_alias_on_right_joycon() {
        let profile = JOYCON_RIGHT_PROFILE;
        assert_eq!(
            profile.axis_binding(0),
            Some(AxisBinding::new(AxisComponent::X, controls::RIGHT_JOYSTICK))
        );
        assert_eq!(
            profile.axis_binding(1),
            Some(AxisBinding::new(AxisComponent::Y, controls::RIGHT_JOYSTICK))
        );
        // Aliased sources keep their own binding
        assert_eq!(
            profile.axis_binding(2),
            Some(AxisBinding::new(AxisComponent::X, controls::RIGHT_JOYSTICK))
        );
        assert_eq!(profile.sign_flips().count(), 0);
    }

    #[test]
    fn test_sign_flip_on_left_joycon() {
        let flips: Vec<_> = JOYCON_LEFT_PROFILE.sign_flips().collect();
        assert_eq!(flips, vec![AxisComponent::X]);
        assert_eq!(
            JOYCON_LEFT_PROFILE.axis_binding(0),
            Some(AxisBinding::new(AxisComponent::X, controls::LEFT_JOYSTICK))
        );
    }

    #[test]
    fn test_profile_names_are_known_controls() {
        for (_, profile) in BUILTIN_PREFIXES.iter().chain([("", GENERIC_PROFILE)].iter()) {
            for (_, name) in profile.buttons {
                assert!(controls::BUTTONS.contains(name), "{} missing from BUTTONS", name);
            }
            for (_, binding) in profile.axes {
                assert!(controls::COMPOSITES.contains(&binding.composite));
            }
        }
    }
}
