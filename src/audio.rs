//! Asynchronous audio cue playback.
//!
//! `play` returns immediately so cue loading can never stall button polling.
//! At most one cue is audible at a time: a new trigger stops whatever is
//! playing before starting, and a single mutex serializes every
//! stop/load/start transition so near-simultaneous triggers cannot interleave
//! into a corrupted player state. Playback failures are logged and swallowed;
//! gameplay timing never depends on audio.

use crate::{GameError, Result};
use log::warn;
use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Default)]
struct PlayerState {
    sink: Option<Sink>,
    current: Option<String>,
}

/// Fire-and-forget cue player over a fixed asset directory
pub struct AudioEngine {
    asset_dir: PathBuf,
    handle: Option<OutputStreamHandle>,
    // Keeps the output device alive; playback dies with the engine.
    _stream: Option<OutputStream>,
    state: Arc<Mutex<PlayerState>>,
    // Trigger counter: a worker only installs its sink while it is still the
    // newest trigger, so the latest of two rapid plays is the one heard.
    generation: Arc<AtomicU64>,
}

impl AudioEngine {
    /// Create an engine over the default output device. When no device exists
    /// the engine degrades to an inert one rather than failing: audio is a
    /// secondary feedback channel.
    pub fn new(asset_dir: PathBuf) -> Self {
        match OutputStream::try_default() {
            Ok((stream, handle)) => Self::build(asset_dir, Some(handle), Some(stream)),
            Err(e) => {
                warn!("no audio output device, cues disabled: {}", e);
                Self::build(asset_dir, None, None)
            }
        }
    }

    /// Create an engine that never touches an audio device. Used headless and
    /// in tests; cue bookkeeping still works.
    pub fn disabled(asset_dir: PathBuf) -> Self {
        Self::build(asset_dir, None, None)
    }

    fn build(
        asset_dir: PathBuf,
        handle: Option<OutputStreamHandle>,
        stream: Option<OutputStream>,
    ) -> Self {
        AudioEngine {
            asset_dir,
            handle,
            _stream: stream,
            state: Arc::new(Mutex::new(PlayerState::default())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start `cue` asynchronously, preempting any cue already playing.
    /// Returns immediately; failures are logged by the worker.
    pub fn play(&self, cue: &str) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cue = cue.to_owned();

        let Some(handle) = self.handle.clone() else {
            let mut state = self.state.lock();
            state.sink = None;
            state.current = Some(cue);
            return;
        };

        let path = self.asset_dir.join(&cue);
        let state = Arc::clone(&self.state);
        let latest = Arc::clone(&self.generation);
        let spawned = thread::Builder::new()
            .name("audio-cue".into())
            .spawn(move || {
                let mut state = state.lock();
                // A newer trigger or a stop superseded this one while it was
                // waiting on the lock.
                if latest.load(Ordering::SeqCst) != generation {
                    return;
                }
                if let Some(old) = state.sink.take() {
                    old.stop();
                }
                match start_cue(&handle, &path) {
                    Ok(sink) => {
                        state.sink = Some(sink);
                        state.current = Some(cue);
                    }
                    Err(e) => {
                        state.current = None;
                        warn!("cue '{}' failed: {}", cue, e);
                    }
                }
            });
        if let Err(e) = spawned {
            warn!("could not spawn audio worker: {}", e);
        }
    }

    /// Forcibly silence any active cue
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        if let Some(sink) = state.sink.take() {
            sink.stop();
        }
        state.current = None;
    }

    /// Name of the most recently started cue, if any. Observability hook for
    /// tests and diagnostics.
    pub fn current_cue(&self) -> Option<String> {
        self.state.lock().current.clone()
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn start_cue(handle: &OutputStreamHandle, path: &Path) -> Result<Sink> {
    let file = File::open(path)
        .map_err(|e| GameError::Audio(format!("open {}: {}", path.display(), e)))?;
    let source = Decoder::new(BufReader::new(file))
        .map_err(|e| GameError::Audio(format!("decode {}: {}", path.display(), e)))?;
    let sink =
        Sink::try_new(handle).map_err(|e| GameError::Audio(format!("output sink: {}", e)))?;
    sink.append(source);
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_trigger_wins() {
        let engine = AudioEngine::disabled(PathBuf::from("allure"));
        engine.play("p1.wav");
        engine.play("p2.wav");
        assert_eq!(engine.current_cue().as_deref(), Some("p2.wav"));
    }

    #[test]
    fn stop_clears_the_current_cue() {
        let engine = AudioEngine::disabled(PathBuf::from("allure"));
        engine.play("p3.wav");
        engine.stop();
        assert_eq!(engine.current_cue(), None);
        // Stopping an idle engine is harmless
        engine.stop();
    }
}
