//! The six-phase game state machine.
//!
//! CODE → WAITING → GENERATE → (PREVIEW ⇄ PLAY) → WIN, looping forever. The
//! machine runs on one thread and polls cooperatively; the only suspensions
//! inside a phase are fixed-duration sleeps. All windows are measured against
//! a monotonic clock, not iteration counts, so they stay correct under
//! scheduling jitter. Actuator faults are logged and dropped at the call
//! site — the logical game state never desyncs from the physical buttons even
//! when feedback channels are degraded.

use crate::actuator::ActuatorGateway;
use crate::audio::AudioEngine;
use crate::config::Timing;
use crate::input::{ButtonSource, Sampler};
use crate::sequence::{self, Sequence};
use crate::{ButtonSet, GameError, Result, CHANNEL_COUNT, INDICATOR_COUNT};
use log::{debug, info, warn};
use rand::Rng;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cue played on entering WIN; the final cue of the asset set
const WIN_CUE: &str = "p8.wav";

/// Result of one PLAY attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Every step was reproduced without a wrong press
    Complete,
    /// An out-of-target press ended the attempt; the round retries from
    /// PREVIEW with the same sequence
    WrongPress,
}

/// Aggregate state of one round: fixed player count plus the immutable
/// sequence. Progress inside a step lives on the PLAY stack and dies with the
/// attempt.
#[derive(Debug, Clone)]
pub struct Round {
    /// Player count fixed when WAITING completed
    pub player_count: usize,
    /// Target patterns generated for this round
    pub sequence: Sequence,
}

/// The game state machine and its collaborators
pub struct Game<B: ButtonSource, W: Write, R: Rng> {
    timing: Timing,
    sampler: Sampler<B>,
    gateway: ActuatorGateway<W>,
    audio: AudioEngine,
    rng: R,
    stop: Arc<AtomicBool>,
}

impl<B: ButtonSource, W: Write, R: Rng> Game<B, W, R> {
    /// Assemble the machine from its collaborators. `stop` is the shutdown
    /// flag observed inside every polling loop.
    pub fn new(
        timing: Timing,
        source: B,
        gateway: ActuatorGateway<W>,
        audio: AudioEngine,
        rng: R,
        stop: Arc<AtomicBool>,
    ) -> Self {
        let sampler = Sampler::new(source, timing.poll());
        Game {
            timing,
            sampler,
            gateway,
            audio,
            rng,
            stop,
        }
    }

    /// Run rounds until the shutdown flag is raised, then silence audio and
    /// clear every actuator channel before returning.
    pub fn run(&mut self) -> Result<()> {
        let outcome = loop {
            match self.run_round() {
                Ok(()) => {}
                Err(GameError::Interrupted) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        self.shutdown();
        outcome
    }

    /// One complete round: CODE through WIN. PLAY failures replay PREVIEW with
    /// the same sequence; there is no retry limit.
    pub fn run_round(&mut self) -> Result<()> {
        self.code_phase()?;
        let player_count = self.waiting_phase()?;
        let round = self.generate_round(player_count);
        loop {
            self.preview_phase(&round.sequence)?;
            match self.play_phase(&round.sequence)? {
                PlayOutcome::Complete => break,
                PlayOutcome::WrongPress => {
                    info!("attempt failed, replaying preview with the same sequence");
                }
            }
        }
        self.win_phase()
    }

    /// Stop audio and de-energize everything. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.audio.stop();
        if let Err(e) = self.gateway.all_off() {
            warn!("clearing actuators at shutdown failed: {}", e);
        }
        let dropped = self.gateway.dropped_commands();
        if dropped > 0 {
            warn!("{} actuator commands were dropped this session", dropped);
        }
        info!("shutdown complete");
    }

    /// CODE: marquee the game LEDs one at a time until the first rising edge
    /// of any button, then extinguish and wait for full release.
    fn code_phase(&mut self) -> Result<()> {
        info!("CODE: attract marquee, waiting for first press");
        let mut prev = !self.sampler.pressed().is_empty();
        loop {
            for i in 0..CHANNEL_COUNT {
                self.checkpoint()?;
                self.led(i, true);
                self.pause(self.timing.marquee());
                self.led(i, false);

                let cur = !self.sampler.pressed().is_empty();
                if cur && !prev {
                    if let Err(e) = self.gateway.leds_off(0..CHANNEL_COUNT) {
                        warn!("extinguishing marquee failed: {}", e);
                    }
                    self.sampler.wait_for_release(&self.stop)?;
                    return Ok(());
                }
                prev = cur;
            }
        }
    }

    /// WAITING: sample the live press count for a fixed window, mirroring it
    /// on the indicator bank. The count observed last wins.
    fn waiting_phase(&mut self) -> Result<usize> {
        info!("WAITING: sampling player count");
        let mut player_count = 1usize;
        let window = self.timing.waiting_window();
        let start = Instant::now();

        while start.elapsed() < window {
            self.checkpoint()?;
            let live = self.sampler.pressed().len().max(1);
            if live != player_count {
                player_count = live;
                for i in 0..INDICATOR_COUNT {
                    self.indicator(i, (i as usize) < player_count);
                }
            }
            self.pause(self.timing.poll());
        }

        for i in 0..INDICATOR_COUNT {
            self.indicator(i, false);
        }
        self.sampler.wait_for_release(&self.stop)?;
        info!("players detected: {}", player_count);
        Ok(player_count)
    }

    /// GENERATE: derive the step plan from the player count and draw a fresh
    /// sequence.
    fn generate_round(&mut self, player_count: usize) -> Round {
        let sequence = sequence::generate(&mut self.rng, player_count);
        info!("round: {} players, sequence {}", player_count, sequence);
        Round {
            player_count,
            sequence,
        }
    }

    /// PREVIEW: demonstrate each step by energizing its channels; no input is
    /// read.
    fn preview_phase(&mut self, sequence: &Sequence) -> Result<()> {
        info!("PREVIEW: demonstrating {} steps", sequence.len());
        for &targets in sequence.steps() {
            self.checkpoint()?;
            for i in targets.indices() {
                self.led(i, true);
                self.pump(i, true);
            }
            self.pause(self.timing.preview_on());
            for i in targets.indices() {
                self.led(i, false);
                self.pump(i, false);
            }
            self.pause(self.timing.preview_gap());
        }
        Ok(())
    }

    /// PLAY: reproduce every step. The first out-of-target press fails the
    /// attempt; the sequence itself survives for the retry.
    fn play_phase(&mut self, sequence: &Sequence) -> Result<PlayOutcome> {
        for (n, &targets) in sequence.steps().iter().enumerate() {
            let stage = n + 1;
            info!("PLAY step {} of {}: targets {}", stage, sequence.len(), targets);

            // A press carried over from the previous step must not
            // auto-complete this one.
            self.sampler.wait_for_release(&self.stop)?;

            let mut achieved = ButtonSet::empty();
            loop {
                self.checkpoint()?;
                let pressed = self.sampler.pressed();

                let wrong = pressed.difference(targets);
                if !wrong.is_empty() {
                    self.fail_attempt(wrong);
                    return Ok(PlayOutcome::WrongPress);
                }

                let newly = pressed.intersection(targets).difference(achieved);
                for i in newly.indices() {
                    debug!("button {} achieved", i + 1);
                    self.led(i, true);
                    self.pump(i, true);
                }
                achieved |= newly;

                if achieved == targets {
                    self.audio.play(&format!("p{}.wav", stage));
                    self.pause(self.timing.step_advance());
                    for i in targets.indices() {
                        self.led(i, false);
                        self.pump(i, false);
                    }
                    break;
                }

                self.pause(self.timing.poll());
            }
        }
        Ok(PlayOutcome::Complete)
    }

    /// Penalty feedback for a wrong press: flash the offending channels, then
    /// clear everything and silence the cue.
    fn fail_attempt(&mut self, wrong: ButtonSet) {
        info!("wrong press: {}", wrong);
        let half = self.timing.wrong_flash();
        for _ in 0..self.timing.wrong_flash_count {
            if let Err(e) = self.gateway.leds_on(wrong.indices()) {
                warn!("penalty flash dropped: {}", e);
            }
            self.pause(half);
            if let Err(e) = self.gateway.leds_off(wrong.indices()) {
                warn!("penalty flash dropped: {}", e);
            }
            self.pause(half);
        }
        for i in 0..CHANNEL_COUNT {
            self.led(i, false);
            self.pump(i, false);
        }
        self.audio.stop();
    }

    /// WIN: celebration cue plus alternating all-channel bursts for a fixed
    /// window, then everything off.
    fn win_phase(&mut self) -> Result<()> {
        info!("WIN");
        self.audio.play(WIN_CUE);
        let window = self.timing.win_window();
        let half = self.timing.win_flash();
        let start = Instant::now();

        while start.elapsed() < window {
            self.checkpoint()?;
            for i in 0..CHANNEL_COUNT {
                self.led(i, true);
                self.pump(i, true);
            }
            self.pause(half);
            for i in 0..CHANNEL_COUNT {
                self.led(i, false);
                self.pump(i, false);
            }
            self.pause(half);
        }

        if let Err(e) = self.gateway.all_off() {
            warn!("clearing actuators after WIN failed: {}", e);
        }
        self.audio.stop();
        Ok(())
    }

    fn checkpoint(&self) -> Result<()> {
        if self.stop.load(Ordering::Relaxed) {
            Err(GameError::Interrupted)
        } else {
            Ok(())
        }
    }

    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }

    // Actuator faults degrade feedback only; log and keep the round moving.

    fn led(&mut self, index: u8, on: bool) {
        if let Err(e) = self.gateway.set_led(index, on) {
            warn!("led {} command dropped: {}", index, e);
        }
    }

    fn pump(&mut self, index: u8, on: bool) {
        if let Err(e) = self.gateway.set_pump(index, on) {
            warn!("pump {} command dropped: {}", index, e);
        }
    }

    fn indicator(&mut self, index: u8, on: bool) {
        if let Err(e) = self.gateway.set_indicator(index, on) {
            warn!("indicator {} command dropped: {}", index, e);
        }
    }
}
