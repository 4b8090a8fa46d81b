//! Game runner.
//!
//! Loads configuration, opens the actuator serial link (fatal when absent)
//! and drives the state machine. The floor buttons themselves are hardware
//! outside this crate; the runner ships a keyboard simulator so the game can
//! be exercised on a bench without the floor.

use anyhow::Context;
use aquastep::{actuator, AudioEngine, ButtonSet, ButtonSource, Game, GameConfig};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use log::warn;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const USAGE: &str = "\
usage: aquastep [CONFIG]

  CONFIG  path to a JSON configuration file (default: config.json)

Simulator keys: 1-8 toggle a floor button, r releases all, q or Esc quits.";

/// Keyboard stand-in for the floor buttons. Tapping a digit toggles the held
/// state of that channel, since key-release events are not available on plain
/// terminals.
struct KeyboardButtons {
    held: ButtonSet,
    stop: Arc<AtomicBool>,
}

impl KeyboardButtons {
    fn new(stop: Arc<AtomicBool>) -> anyhow::Result<Self> {
        // Raw mode also swallows the terminal's SIGINT, so Ctrl-C is handled
        // as a key below.
        terminal::enable_raw_mode().context("enabling raw terminal mode")?;
        Ok(KeyboardButtons {
            held: ButtonSet::empty(),
            stop,
        })
    }
}

impl Drop for KeyboardButtons {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl ButtonSource for KeyboardButtons {
    fn pressed(&mut self) -> ButtonSet {
        while matches!(event::poll(Duration::ZERO), Ok(true)) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char(c @ '1'..='8') => {
                        self.held ^= ButtonSet::single(c as u8 - b'1');
                    }
                    KeyCode::Char('r') => self.held = ButtonSet::empty(),
                    KeyCode::Char('q') | KeyCode::Esc => {
                        self.stop.store(true, Ordering::Relaxed);
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        self.stop.store(true, Ordering::Relaxed);
                    }
                    _ => {}
                },
                Ok(_) => {}
                Err(e) => {
                    warn!("keyboard read failed: {}", e);
                    break;
                }
            }
        }
        self.held
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut config_path = "config.json".to_owned();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ => config_path = arg,
        }
    }

    let config = GameConfig::load_or_default(Path::new(&config_path))?;
    let gateway = actuator::open(&config)
        .with_context(|| format!("opening actuator link on {}", config.serial_port))?;
    let audio = AudioEngine::new(config.asset_dir.clone());
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .context("installing shutdown handler")?;
    }

    println!("{}", USAGE);
    let source = KeyboardButtons::new(Arc::clone(&stop))?;

    let mut game = Game::new(config.timing, source, gateway, audio, rng, stop);
    // run() clears every actuator channel and silences audio on its way out
    game.run()?;
    Ok(())
}
