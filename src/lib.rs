//! Controller core for an eight-button water-fountain floor game.
//!
//! Players step on floor buttons; a generated sequence of target patterns must
//! be reproduced collectively, with LEDs and water pumps on an external
//! actuator board (reached over a serial link) and asynchronous audio cues
//! providing feedback.
//!
//! # Components
//! - Game state machine: CODE → WAITING → GENERATE → (PREVIEW ⇄ PLAY) → WIN,
//!   looping forever (`game`)
//! - Actuator gateway with two wire-protocol variants, compact single-byte and
//!   newline-terminated text (`actuator`)
//! - Non-blocking audio engine; a new cue always preempts the current one
//!   (`audio`)
//! - Player-count-driven sequence generator (`sequence`)
//! - Abstract button input boundary (`input`)
//!
//! # Quick start
//! ```no_run
//! use aquastep::{actuator, AudioEngine, ButtonSet, FnSource, Game, GameConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::sync::{atomic::AtomicBool, Arc};
//!
//! # fn main() -> aquastep::Result<()> {
//! let config = GameConfig::default();
//! let gateway = actuator::open(&config)?;
//! let audio = AudioEngine::new(config.asset_dir.clone());
//! let source = FnSource(ButtonSet::empty); // real deployments read hardware
//! let stop = Arc::new(AtomicBool::new(false));
//! let mut game = Game::new(
//!     config.timing,
//!     source,
//!     gateway,
//!     audio,
//!     StdRng::from_entropy(),
//!     stop,
//! );
//! game.run()
//! # }
//! ```

#![warn(missing_docs)]

pub mod actuator;
pub mod audio;
pub mod buttons;
pub mod config;
pub mod game;
pub mod input;
pub mod sequence;

/// Error types for the game's fallible subsystems
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    /// The serial device could not be opened at startup. Fatal: the game
    /// cannot run without actuator feedback.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// A command write to the actuator link failed. Callers log and drop the
    /// command; a stalled board degrades feedback, never the round.
    #[error("actuator I/O error: {0}")]
    ActuatorIo(#[from] std::io::Error),

    /// A channel index outside the addressable range was requested
    #[error("invalid channel index {0}")]
    InvalidChannel(u8),

    /// Cue playback failed (missing file, decode error, device busy)
    #[error("audio playback error: {0}")]
    Audio(String),

    /// Configuration file malformed or unreadable
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The shutdown flag was observed inside a phase's polling loop
    #[error("interrupted by shutdown signal")]
    Interrupted,
}

/// Result type alias using [`GameError`]
pub type Result<T> = std::result::Result<T, GameError>;

pub use actuator::ActuatorGateway;
pub use audio::AudioEngine;
pub use buttons::{ButtonSet, CHANNEL_COUNT, INDICATOR_COUNT};
pub use config::{GameConfig, ProtocolVariant, Timing};
pub use game::{Game, PlayOutcome, Round};
pub use input::{ButtonSource, FnSource, Sampler};
pub use sequence::{generate, Sequence, StepPlan};
