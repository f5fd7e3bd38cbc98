//! # padlink
//!
//! Normalized gamepad input for heterogeneous controllers.
//!
//! Raw button and axis readings are mapped through per-model profiles to
//! stable control names (`a`, `dpad-left`, `left-joystick`), with quirk
//! correction for controllers such as the Joy-Con halves. A frame-driven
//! polling loop delivers only the values that changed to registered
//! listeners. Rumble is available across all connected controllers through
//! named presets.

pub mod config;
pub mod error;
pub mod controller;
pub mod haptics;
pub mod platform;
pub mod polling;
