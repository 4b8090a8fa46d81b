//! Runtime configuration.
//!
//! Loaded from a JSON file; every field has a default so a missing or partial
//! file still yields a runnable setup. Timing defaults mirror the original
//! installation's hardware tuning.

use crate::{GameError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Wire-protocol variant spoken by the actuator board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVariant {
    /// One raw byte per command; LED-only addressing plus a shared pump channel
    Compact,
    /// Newline-terminated `<DOMAIN>_<ON|OFF> <index>` text commands
    #[default]
    Text,
}

/// Phase durations and polling intervals, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Button polling interval inside all phase loops
    pub poll_ms: u64,
    /// Per-LED dwell of the CODE-state marquee animation
    pub marquee_ms: u64,
    /// Length of the WAITING player-count sampling window
    pub waiting_window_ms: u64,
    /// How long each step's channels stay on during PREVIEW
    pub preview_on_ms: u64,
    /// Pause between PREVIEW steps
    pub preview_gap_ms: u64,
    /// Half-period of the wrong-press penalty flash
    pub wrong_flash_ms: u64,
    /// Number of penalty flashes
    pub wrong_flash_count: u32,
    /// Pause after a step completes before its channels clear
    pub step_advance_ms: u64,
    /// Length of the WIN celebration window
    pub win_window_ms: u64,
    /// Half-period of the WIN all-channel flash
    pub win_flash_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            poll_ms: 50,
            marquee_ms: 150,
            waiting_window_ms: 2_000,
            preview_on_ms: 1_000,
            preview_gap_ms: 700,
            wrong_flash_ms: 200,
            wrong_flash_count: 5,
            step_advance_ms: 500,
            win_window_ms: 10_000,
            win_flash_ms: 500,
        }
    }
}

impl Timing {
    /// Button polling interval
    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    /// Marquee per-LED dwell
    pub fn marquee(&self) -> Duration {
        Duration::from_millis(self.marquee_ms)
    }

    /// WAITING sampling window
    pub fn waiting_window(&self) -> Duration {
        Duration::from_millis(self.waiting_window_ms)
    }

    /// PREVIEW on-time per step
    pub fn preview_on(&self) -> Duration {
        Duration::from_millis(self.preview_on_ms)
    }

    /// PREVIEW inter-step pause
    pub fn preview_gap(&self) -> Duration {
        Duration::from_millis(self.preview_gap_ms)
    }

    /// Penalty flash half-period
    pub fn wrong_flash(&self) -> Duration {
        Duration::from_millis(self.wrong_flash_ms)
    }

    /// Post-step pause before clearing channels
    pub fn step_advance(&self) -> Duration {
        Duration::from_millis(self.step_advance_ms)
    }

    /// WIN celebration window
    pub fn win_window(&self) -> Duration {
        Duration::from_millis(self.win_window_ms)
    }

    /// WIN flash half-period
    pub fn win_flash(&self) -> Duration {
        Duration::from_millis(self.win_flash_ms)
    }

    /// Timings collapsed to (near) zero so state-machine tests run instantly
    #[cfg(test)]
    pub(crate) fn instant() -> Self {
        Timing {
            poll_ms: 0,
            marquee_ms: 0,
            waiting_window_ms: 0,
            preview_on_ms: 0,
            preview_gap_ms: 0,
            wrong_flash_ms: 0,
            wrong_flash_count: 1,
            step_advance_ms: 0,
            win_window_ms: 0,
            win_flash_ms: 0,
        }
    }
}

/// Top-level configuration for one deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Serial device path of the actuator controller
    pub serial_port: String,
    /// Serial baud rate
    pub baud_rate: u32,
    /// Wire-protocol variant of the actuator firmware
    pub protocol: ProtocolVariant,
    /// Settle delay after opening the serial port, before the first command.
    /// The controller resets on connect and needs this long to boot.
    pub settle_ms: u64,
    /// Directory holding the audio cue files (`p1.wav` … `p8.wav`)
    pub asset_dir: PathBuf,
    /// Fixed RNG seed for reproducible sequences; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Phase timing table
    pub timing: Timing,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            serial_port: "/dev/ttyUSB0".to_owned(),
            baud_rate: 9_600,
            protocol: ProtocolVariant::default(),
            settle_ms: 2_000,
            asset_dir: PathBuf::from("allure"),
            seed: None,
            timing: Timing::default(),
        }
    }
}

impl GameConfig {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GameError::Config(format!("reading {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| GameError::Config(format!("parsing {}: {}", path.display(), e)))
    }

    /// Load a configuration file, falling back to defaults when it is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Settle delay after opening the serial port
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_complete() {
        let config = GameConfig::default();
        assert_eq!(config.baud_rate, 9_600);
        assert_eq!(config.protocol, ProtocolVariant::Text);
        assert_eq!(config.timing.waiting_window_ms, 2_000);
    }

    #[test]
    fn partial_file_fills_from_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{ "serial_port": "/dev/ttyACM1", "protocol": "compact" }}"#
        )
        .expect("write config");

        let config = GameConfig::load(file.path()).expect("load config");
        assert_eq!(config.serial_port, "/dev/ttyACM1");
        assert_eq!(config.protocol, ProtocolVariant::Compact);
        assert_eq!(config.baud_rate, 9_600);
        assert_eq!(config.timing.win_window_ms, 10_000);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "not json").expect("write config");
        assert!(matches!(
            GameConfig::load(file.path()),
            Err(crate::GameError::Config(_))
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = GameConfig::load_or_default(Path::new("/nonexistent/aquastep.json"))
            .expect("defaults");
        assert_eq!(config.serial_port, "/dev/ttyUSB0");
    }
}
