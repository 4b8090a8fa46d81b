//! Button input boundary.
//!
//! Raw digital sampling of the physical floor buttons lives outside this
//! crate; anything that can report an instantaneous pressed snapshot
//! implements [`ButtonSource`]. Debounce is assumed to happen at the physical
//! layer, so a snapshot is taken at face value.

use crate::{ButtonSet, GameError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Capability providing the instantaneous pressed/released state of the
/// buttons
pub trait ButtonSource {
    /// Snapshot of the currently pressed channel indices
    fn pressed(&mut self) -> ButtonSet;
}

/// Button source backed by a closure; used for scripted inputs in tests and
/// for simple adapters
pub struct FnSource<F: FnMut() -> ButtonSet>(
    /// Closure producing each snapshot
    pub F,
);

impl<F: FnMut() -> ButtonSet> ButtonSource for FnSource<F> {
    fn pressed(&mut self) -> ButtonSet {
        (self.0)()
    }
}

/// Polls a [`ButtonSource`] at a fixed interval
pub struct Sampler<B: ButtonSource> {
    source: B,
    poll: Duration,
}

impl<B: ButtonSource> Sampler<B> {
    /// Wrap `source`, polling at `poll` intervals in blocking waits
    pub fn new(source: B, poll: Duration) -> Self {
        Sampler { source, poll }
    }

    /// Snapshot of the currently pressed channels
    pub fn pressed(&mut self) -> ButtonSet {
        self.source.pressed()
    }

    /// Block until every button is released, so a lingering press cannot
    /// re-trigger an edge in the next phase. Observes the shutdown flag.
    pub fn wait_for_release(&mut self, stop: &AtomicBool) -> Result<()> {
        loop {
            if stop.load(Ordering::Relaxed) {
                return Err(GameError::Interrupted);
            }
            if self.source.pressed().is_empty() {
                return Ok(());
            }
            std::thread::sleep(self.poll);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_for_release_returns_once_clear() {
        let mut remaining = 3u32;
        let mut sampler = Sampler::new(
            FnSource(move || {
                if remaining > 0 {
                    remaining -= 1;
                    ButtonSet::single(2)
                } else {
                    ButtonSet::empty()
                }
            }),
            Duration::ZERO,
        );
        let stop = AtomicBool::new(false);
        assert!(sampler.wait_for_release(&stop).is_ok());
    }

    #[test]
    fn wait_for_release_observes_shutdown() {
        let mut sampler = Sampler::new(FnSource(|| ButtonSet::single(0)), Duration::ZERO);
        let stop = AtomicBool::new(true);
        assert!(matches!(
            sampler.wait_for_release(&stop),
            Err(GameError::Interrupted)
        ));
    }
}
