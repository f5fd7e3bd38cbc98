//! # padlink
//!
//! Logs normalized gamepad input from every connected controller.
//!
//! Loads configuration, watches `/dev/input` for gamepads, logs every press
//! and stick movement by control name and rumbles controllers as they
//! connect.
//!
//! ```bash
//! padlink [config.toml]
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use padlink::config::{Config, LoggingConfig};
use padlink::controller::listener::MOVE_SUFFIX;
use padlink::controller::profile::{controls, ProfileTable};
use padlink::platform::evdev::EvdevPlatform;
use padlink::platform::{IntervalScheduler, TokioTimer};
use padlink::polling::PollingLoop;

/// Configuration used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Loads the configuration file
///
/// An explicit path must exist. Without one, the default path is used if
/// present, otherwise built-in defaults.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                Config::load(default_path)
                    .with_context(|| format!("Failed to load configuration from {}", DEFAULT_CONFIG_PATH))
            } else {
                Ok(Config::default())
            }
        }
    }
}

/// Installs the global tracing subscriber
///
/// `RUST_LOG` overrides the configured level. The returned guard must be held
/// until exit so buffered file output is flushed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.log_dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        None
    } else {
        let appender = tracing_appender::rolling::daily(&config.log_dir, "padlink.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref().map(Path::new))?;
    let _log_guard = init_logging(&config.logging);

    info!("padlink v{} starting...", env!("CARGO_PKG_VERSION"));

    let platform = EvdevPlatform::new(config.input.discovery_interval());
    let mut polling = PollingLoop::new(platform, ProfileTable::builtin());
    let haptics = polling.haptics(Arc::new(TokioTimer));

    let listeners = polling.listeners_mut();
    for &name in controls::BUTTONS {
        listeners.on_press(name, move |value| info!("{} = {:.2}", name, value));
    }
    for &composite in controls::COMPOSITES {
        listeners.on_move(composite, move |v| {
            info!("{}{} = ({:.2}, {:.2})", composite, MOVE_SUFFIX, v.x, v.y)
        });
    }

    let rumble_on_connect = config.haptics.enabled;
    let preset = config.haptics.preset()?;
    let duration = config.haptics.connect_duration();
    listeners.on_connect(move |device| {
        info!("Controller ready in slot {}: {}", device.slot, device.model);
        if rumble_on_connect && device.has_actuator() {
            let haptics = haptics.clone();
            tokio::spawn(async move { haptics.vibrate(preset.into(), duration).await });
        }
    });
    listeners.on_disconnect(|device| {
        info!("Controller gone from slot {}: {}", device.slot, device.model);
    });

    let mut scheduler = IntervalScheduler::new(config.input.frame_rate_hz);
    info!(
        "Polling at {}Hz, discovery every {}ms",
        config.input.frame_rate_hz, config.input.discovery_interval_ms
    );
    info!("Press Ctrl+C to exit");

    tokio::select! {
        _ = polling.run(&mut scheduler, config.input.discovery_interval()) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("padlink.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_config_explicit_path() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.input.frame_rate_hz, 60);
    }

    #[test]
    fn test_load_config_without_path() {
        assert!(load_config(None).is_ok());
    }
}
