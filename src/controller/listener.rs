//! # Listener Registry Module
//!
//! Callbacks keyed by event, plus the last value dispatched to each.
//!
//! ## Event Keys
//!
//! | Key | Registered with | Callback receives |
//! |-----|-----------------|-------------------|
//! | `<button>` (e.g. `a`, `dpad-up`) | [`ListenerRegistry::on_press`] | `f32` in 0.0..=1.0 |
//! | `<composite>-move` (e.g. `left-joystick-move`) | [`ListenerRegistry::on_move`] | [`Vec2`] |
//! | `connect` | [`ListenerRegistry::on_connect`] | `&Device` |
//! | `disconnect` | [`ListenerRegistry::on_disconnect`] | `&Device` (last snapshot) |
//!
//! Registering for a key that already has a listener replaces it. Names are
//! not validated: a listener for a control no profile produces never fires.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use tracing::trace;

use super::device::Device;

/// Suffix that turns a composite name into its move-listener key.
pub const MOVE_SUFFIX: &str = "-move";

/// Callback for button value changes.
pub type PressCallback = Box<dyn FnMut(f32) + Send>;
/// Callback for composite (stick) value changes.
pub type MoveCallback = Box<dyn FnMut(Vec2) + Send>;
/// Callback for connect and disconnect notifications.
pub type DeviceCallback = Box<dyn FnMut(&Device) + Send>;

/// Value of a two-axis composite control.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    /// Horizontal component, -1.0..=1.0.
    pub x: f32,
    /// Vertical component, -1.0..=1.0.
    pub y: f32,
}

impl Vec2 {
    /// Creates a vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Identifies one listener slot.
///
/// # Examples
///
/// ```
/// use padlink::controller::listener::EventKey;
///
/// assert_eq!(EventKey::from("a"), EventKey::Press("a".to_string()));
/// assert_eq!(
///     EventKey::from("left-joystick-move"),
///     EventKey::Move("left-joystick".to_string())
/// );
/// assert_eq!(EventKey::Move("right-joystick".to_string()).to_string(), "right-joystick-move");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// Button listener, keyed by button name.
    Press(String),
    /// Composite listener, keyed by composite name (no suffix).
    Move(String),
    /// Device connected.
    Connect,
    /// Device disconnected.
    Disconnect,
}

impl EventKey {
    /// Parses the string form of a key.
    ///
    /// `connect` / `disconnect` (and `controller-connect` /
    /// `controller-disconnect`) name the device keys, a `-move` suffix names
    /// a composite key, anything else is a button key.
    #[must_use]
    pub fn parse(key: &str) -> Self {
        match key {
            "connect" | "controller-connect" => EventKey::Connect,
            "disconnect" | "controller-disconnect" => EventKey::Disconnect,
            _ => match key.strip_suffix(MOVE_SUFFIX) {
                Some(composite) if !composite.is_empty() => EventKey::Move(composite.to_string()),
                _ => EventKey::Press(key.to_string()),
            },
        }
    }
}

impl FromStr for EventKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for EventKey {
    fn from(key: &str) -> Self {
        Self::parse(key)
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKey::Press(name) => f.write_str(name),
            EventKey::Move(composite) => write!(f, "{}{}", composite, MOVE_SUFFIX),
            EventKey::Connect => f.write_str("connect"),
            EventKey::Disconnect => f.write_str("disconnect"),
        }
    }
}

struct PressListener {
    callback: PressCallback,
    last: f32,
}

struct MoveListener {
    callback: MoveCallback,
    last: Vec2,
}

/// Registered callbacks with per-key change suppression.
///
/// # Examples
///
/// ```
/// use padlink::controller::listener::ListenerRegistry;
///
/// let mut listeners = ListenerRegistry::new();
/// listeners.on_press("a", |value| println!("a = {}", value));
/// listeners.on_move("left-joystick", |v| println!("stick = ({}, {})", v.x, v.y));
///
/// assert!(listeners.contains(&"left-joystick-move".into()));
/// assert!(listeners.remove_listener("a"));
/// ```
#[derive(Default)]
pub struct ListenerRegistry {
    presses: HashMap<String, PressListener>,
    moves: HashMap<String, MoveListener>,
    connect: Option<DeviceCallback>,
    disconnect: Option<DeviceCallback>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("presses", &self.presses.keys().collect::<Vec<_>>())
            .field("moves", &self.moves.keys().collect::<Vec<_>>())
            .field("connect", &self.connect.is_some())
            .field("disconnect", &self.disconnect.is_some())
            .finish()
    }
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Listens for value changes of button `name`.
    ///
    /// The cached value starts at 0.0, so a button resting at 0.0 never
    /// produces an initial callback.
    pub fn on_press<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: FnMut(f32) + Send + 'static,
    {
        self.presses.insert(
            name.into(),
            PressListener {
                callback: Box::new(callback),
                last: 0.0,
            },
        );
    }

    /// Listens for value changes of composite control `composite`.
    ///
    /// Registered under the key `<composite>-move`. The cached value starts
    /// at (0.0, 0.0).
    pub fn on_move<F>(&mut self, composite: impl Into<String>, callback: F)
    where
        F: FnMut(Vec2) + Send + 'static,
    {
        self.moves.insert(
            composite.into(),
            MoveListener {
                callback: Box::new(callback),
                last: Vec2::default(),
            },
        );
    }

    /// Listens for device connections.
    pub fn on_connect<F>(&mut self, callback: F)
    where
        F: FnMut(&Device) + Send + 'static,
    {
        self.connect = Some(Box::new(callback));
    }

    /// Listens for device disconnections.
    pub fn on_disconnect<F>(&mut self, callback: F)
    where
        F: FnMut(&Device) + Send + 'static,
    {
        self.disconnect = Some(Box::new(callback));
    }

    /// Removes the listener for `key`. Returns whether one was registered.
    pub fn remove_listener(&mut self, key: impl Into<EventKey>) -> bool {
        match key.into() {
            EventKey::Press(name) => self.presses.remove(&name).is_some(),
            EventKey::Move(composite) => self.moves.remove(&composite).is_some(),
            EventKey::Connect => self.connect.take().is_some(),
            EventKey::Disconnect => self.disconnect.take().is_some(),
        }
    }

    /// Whether a listener is registered for `key`.
    #[must_use]
    pub fn contains(&self, key: &EventKey) -> bool {
        match key {
            EventKey::Press(name) => self.presses.contains_key(name),
            EventKey::Move(composite) => self.moves.contains_key(composite),
            EventKey::Connect => self.connect.is_some(),
            EventKey::Disconnect => self.disconnect.is_some(),
        }
    }

    /// Last value dispatched to the press listener for `name`.
    #[must_use]
    pub fn last_press(&self, name: &str) -> Option<f32> {
        self.presses.get(name).map(|listener| listener.last)
    }

    /// Last value dispatched to the move listener for `composite`.
    #[must_use]
    pub fn last_move(&self, composite: &str) -> Option<Vec2> {
        self.moves.get(composite).map(|listener| listener.last)
    }

    /// Delivers a decoded button value if it differs from the cached one.
    ///
    /// Returns whether the callback ran.
    pub fn dispatch_press(&mut self, name: &str, value: f32) -> bool {
        let Some(listener) = self.presses.get_mut(name) else {
            return false;
        };
        if value == listener.last {
            return false;
        }

        listener.last = value;
        trace!("{} -> {}", name, value);
        (listener.callback)(value);
        true
    }

    /// Delivers a decoded composite value if either component differs from
    /// the cached one.
    ///
    /// Returns whether the callback ran.
    pub fn dispatch_move(&mut self, composite: &str, value: Vec2) -> bool {
        let Some(listener) = self.moves.get_mut(composite) else {
            return false;
        };
        if value.x == listener.last.x && value.y == listener.last.y {
            return false;
        }

        listener.last = value;
        trace!("{}{} -> ({}, {})", composite, MOVE_SUFFIX, value.x, value.y);
        (listener.callback)(value);
        true
    }

    /// Invokes the connect listener, if any.
    pub fn notify_connect(&mut self, device: &Device) -> bool {
        match self.connect.as_mut() {
            Some(callback) => {
                callback(device);
                true
            }
            None => false,
        }
    }

    /// Invokes the disconnect listener, if any.
    pub fn notify_disconnect(&mut self, device: &Device) -> bool {
        match self.disconnect.as_mut() {
            Some(callback) => {
                callback(device);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl FnMut(T) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |value: T| sink.lock().unwrap().push(value))
    }

    // ==================== EventKey Tests ====================

    #[test]
    fn test_parse_press_key() {
        assert_eq!(EventKey::parse("dpad-up"), EventKey::Press("dpad-up".to_string()));
        assert_eq!(EventKey::parse("left-joystick"), EventKey::Press("left-joystick".to_string()));
    }

    #[test]
    fn test_parse_move_key() {
        assert_eq!(
            EventKey::parse("right-joystick-move"),
            EventKey::Move("right-joystick".to_string())
        );
        // A bare suffix has no composite name to strip down to
        assert_eq!(EventKey::parse("-move"), EventKey::Press("-move".to_string()));
    }

    #[test]
    fn test_parse_device_keys() {
        assert_eq!(EventKey::parse("connect"), EventKey::Connect);
        assert_eq!(EventKey::parse("controller-connect"), EventKey::Connect);
        assert_eq!(EventKey::parse("disconnect"), EventKey::Disconnect);
        assert_eq!(EventKey::parse("controller-disconnect"), EventKey::Disconnect);
        assert_eq!("connect".parse::<EventKey>(), Ok(EventKey::Connect));
    }

    #[test]
    fn test_display_matches_registration_key() {
        for key in ["a", "left-joystick-move", "connect", "disconnect"] {
            assert_eq!(EventKey::parse(key).to_string(), key);
        }
    }

    // ==================== Registration Tests ====================

    #[test]
    fn test_registration_sets_defaults() {
        let mut listeners = ListenerRegistry::new();
        listeners.on_press("a", |_| {});
        listeners.on_move("left-joystick", |_| {});

        assert_eq!(listeners.last_press("a"), Some(0.0));
        assert_eq!(listeners.last_move("left-joystick"), Some(Vec2::default()));
        assert_eq!(listeners.last_press("b"), None);
    }

    #[test]
    fn test_register_replaces_existing() {
        let (first, first_cb) = recorder::<f32>();
        let (second, second_cb) = recorder::<f32>();

        let mut listeners = ListenerRegistry::new();
        listeners.on_press("a", first_cb);
        assert!(listeners.dispatch_press("a", 1.0));

        listeners.on_press("a", second_cb);
        // Replacement starts from the default cache again
        assert_eq!(listeners.last_press("a"), Some(0.0));
        assert!(listeners.dispatch_press("a", 1.0));

        assert_eq!(*first.lock().unwrap(), vec![1.0]);
        assert_eq!(*second.lock().unwrap(), vec![1.0]);
    }

    #[test]
    fn test_remove_listener_by_string_and_key() {
        let mut listeners = ListenerRegistry::new();
        listeners.on_press("a", |_| {});
        listeners.on_move("left-joystick", |_| {});
        listeners.on_connect(|_| {});
        listeners.on_disconnect(|_| {});

        assert!(listeners.remove_listener("a"));
        assert!(listeners.remove_listener("left-joystick-move"));
        assert!(listeners.remove_listener(EventKey::Connect));
        assert!(listeners.remove_listener("disconnect"));

        assert!(!listeners.remove_listener("a"));
        assert!(!listeners.contains(&EventKey::Press("a".to_string())));
        assert!(!listeners.contains(&EventKey::Move("left-joystick".to_string())));
        assert!(!listeners.contains(&EventKey::Connect));
        assert!(!listeners.contains(&EventKey::Disconnect));
    }

    #[test]
    fn test_press_and_move_keys_are_independent() {
        let mut listeners = ListenerRegistry::new();
        listeners.on_press("left-joystick", |_| {});
        listeners.on_move("left-joystick", |_| {});

        assert!(listeners.remove_listener("left-joystick-move"));
        assert!(listeners.contains(&EventKey::Press("left-joystick".to_string())));
    }

    // ==================== Dispatch Tests ====================

    #[test]
    fn test_dispatch_press_only_on_change() {
        let (seen, callback) = recorder::<f32>();
        let mut listeners = ListenerRegistry::new();
        listeners.on_press("a", callback);

        assert!(!listeners.dispatch_press("a", 0.0)); // idle default
        assert!(listeners.dispatch_press("a", 1.0));
        assert!(!listeners.dispatch_press("a", 1.0));
        assert!(listeners.dispatch_press("a", 0.5));
        assert!(listeners.dispatch_press("a", 0.0));

        assert_eq!(*seen.lock().unwrap(), vec![1.0, 0.5, 0.0]);
        assert_eq!(listeners.last_press("a"), Some(0.0));
    }

    #[test]
    fn test_dispatch_press_unregistered() {
        let mut listeners = ListenerRegistry::new();
        assert!(!listeners.dispatch_press("a", 1.0));
    }

    #[test]
    fn test_dispatch_move_any_component() {
        let (seen, callback) = recorder::<Vec2>();
        let mut listeners = ListenerRegistry::new();
        listeners.on_move("left-joystick", callback);

        assert!(!listeners.dispatch_move("left-joystick", Vec2::new(0.0, 0.0)));
        assert!(listeners.dispatch_move("left-joystick", Vec2::new(0.25, 0.0)));
        assert!(listeners.dispatch_move("left-joystick", Vec2::new(0.25, -0.5)));
        assert!(!listeners.dispatch_move("left-joystick", Vec2::new(0.25, -0.5)));

        // Both components are always delivered
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Vec2::new(0.25, 0.0), Vec2::new(0.25, -0.5)]
        );
    }

    #[test]
    fn test_device_notifications() {
        let (seen, mut sink) = recorder::<usize>();
        let mut listeners = ListenerRegistry::new();
        let device = Device::new(3, "Joy-Con (R)");

        assert!(!listeners.notify_connect(&device));

        listeners.on_connect(move |d| sink(d.slot));
        assert!(listeners.notify_connect(&device));
        assert!(!listeners.notify_disconnect(&device));

        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }
}
