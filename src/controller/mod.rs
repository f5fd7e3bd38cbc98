//! # Controller Module
//!
//! Device-input normalization core.
//!
//! This module handles:
//! - Per-model profiles mapping raw indices to named controls
//! - Quirk correction for controllers that report differently (Joy-Con halves)
//! - Tracking connected devices by slot
//! - Listener registration with per-key change suppression
//! - Decoding raw readings and dispatching callbacks on change

pub mod device;
pub mod listener;
pub mod mapper;
pub mod profile;
