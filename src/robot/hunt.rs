//! Treasure hunt: drive the crawler by keyboard until the camera sees the
//! announced colour up close, then announce a new one.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use super::keyboard::{Command, Key};
use super::speech::Speaker;
use super::Crawler;
use crate::detect::{ColorDetector, ColorTarget, DetectionResult, Detector};
use crate::frame::RgbFrame;

pub const MANUAL: &str = "
Press keys on keyboard to control the crawler!
    w: Forward
    a: Turn left
    s: Backward
    d: Turn right
    space: Say the target again
    Ctrl^C: Quit
";

#[derive(Clone, Debug)]
pub struct HuntConfig {
    pub speed: u8,
    pub steps: u32,
    pub poll: Duration,
    /// Largest blob must be wider than this to count as found.
    pub min_width: u32,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            speed: 80,
            steps: 1,
            poll: Duration::from_millis(50),
            min_width: 100,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Quit,
}

pub struct TreasureHunt<C, S> {
    crawler: C,
    speaker: S,
    detector: ColorDetector,
    config: HuntConfig,
    rng: StdRng,
    found: usize,
}

impl<C: Crawler, S: Speaker> TreasureHunt<C, S> {
    pub fn new(crawler: C, speaker: S, config: HuntConfig) -> Self {
        Self::with_rng(crawler, speaker, config, StdRng::from_entropy())
    }

    pub fn with_rng(crawler: C, speaker: S, config: HuntConfig, rng: StdRng) -> Self {
        Self {
            crawler,
            speaker,
            detector: ColorDetector::new(ColorTarget::Red),
            config,
            rng,
            found: 0,
        }
    }

    pub fn target(&self) -> ColorTarget {
        self.detector.target()
    }

    /// Targets found so far.
    pub fn found(&self) -> usize {
        self.found
    }

    pub fn crawler(&self) -> &C {
        &self.crawler
    }

    pub fn speaker(&self) -> &S {
        &self.speaker
    }

    pub fn start(&mut self) -> Result<()> {
        self.speak("game start");
        self.renew_target();
        Ok(())
    }

    /// One control step: check the frame, then act on the key.
    pub fn tick(&mut self, frame: Option<&RgbFrame>, key: Option<Key>) -> Result<TickOutcome> {
        if let Some(frame) = frame {
            let result = self.detector.detect(frame)?;
            if self.is_found(&result) {
                self.found += 1;
                log::info!("found {} (width {})", self.target(), result.width());
                self.speak("well done");
                self.renew_target();
            }
        }

        match key.and_then(Command::from_key) {
            Some(Command::Move(action)) => {
                if let Err(err) =
                    self.crawler
                        .do_action(action, self.config.steps, self.config.speed)
                {
                    log::warn!("crawler {} failed: {:#}", action, err);
                }
            }
            Some(Command::RepeatTarget) => self.announce_target(),
            Some(Command::Quit) => return Ok(TickOutcome::Quit),
            None => {}
        }
        Ok(TickOutcome::Continue)
    }

    /// Run until a quit key arrives or the key channel closes.
    pub fn run<F>(&mut self, mut next_frame: F, keys: &Receiver<Key>) -> Result<()>
    where
        F: FnMut() -> Result<RgbFrame>,
    {
        self.start()?;
        loop {
            let frame = match next_frame() {
                Ok(frame) => Some(frame),
                Err(err) => {
                    log::warn!("capture failed: {:#}", err);
                    None
                }
            };
            let (key, closed) = newest_key(keys);
            if self.tick(frame.as_ref(), key)? == TickOutcome::Quit {
                break;
            }
            if closed {
                log::info!("keyboard input closed");
                break;
            }
            std::thread::sleep(self.config.poll);
        }
        Ok(())
    }

    fn is_found(&self, result: &DetectionResult) -> bool {
        result.is_target_reached(self.config.min_width)
    }

    fn renew_target(&mut self) {
        let target = ColorTarget::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(ColorTarget::Red);
        self.detector.set_target(target);
        self.announce_target();
    }

    fn announce_target(&mut self) {
        let phrase = format!("Look for {}", self.target());
        self.speak(&phrase);
    }

    fn speak(&mut self, text: &str) {
        if let Err(err) = self.speaker.say(text) {
            log::warn!("speech failed ({}): {:#}", text, err);
        }
    }
}

/// Drain pending keys and keep the newest. Also reports whether the sender is gone.
pub fn newest_key(keys: &Receiver<Key>) -> (Option<Key>, bool) {
    let mut newest = None;
    loop {
        match keys.try_recv() {
            Ok(key) => newest = Some(key),
            Err(TryRecvError::Empty) => return (newest, false),
            Err(TryRecvError::Disconnected) => return (newest, true),
        }
    }
}
