//! Crawler robot control.
//!
//! The robot itself is driven through the `Crawler` trait: `CommandCrawler`
//! shells out to the vendor movement program, `DryRunCrawler` only records.
//! Keyboard input and speech live in their own modules; `hunt` ties them to
//! the colour detector.

pub mod hunt;
pub mod keyboard;
pub mod speech;

use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::process::Command as ProcessCommand;

pub use hunt::{HuntConfig, TreasureHunt, MANUAL};
pub use keyboard::{decode_key, spawn_key_reader, Command, Key, RawTerminal};
pub use speech::{EspeakSpeaker, LogSpeaker, Speaker};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Forward => "forward",
            Action::Backward => "backward",
            Action::TurnLeft => "turn_left",
            Action::TurnRight => "turn_right",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait Crawler {
    /// Perform `action` `steps` times at `speed` (0..=100). Blocks until done.
    fn do_action(&mut self, action: Action, steps: u32, speed: u8) -> Result<()>;
}

impl<T: Crawler + ?Sized> Crawler for Box<T> {
    fn do_action(&mut self, action: Action, steps: u32, speed: u8) -> Result<()> {
        (**self).do_action(action, steps, speed)
    }
}

/// Records actions instead of moving.
#[derive(Debug, Default)]
pub struct DryRunCrawler {
    actions: Vec<(Action, u32, u8)>,
}

impl DryRunCrawler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> &[(Action, u32, u8)] {
        &self.actions
    }
}

impl Crawler for DryRunCrawler {
    fn do_action(&mut self, action: Action, steps: u32, speed: u8) -> Result<()> {
        log::info!("crawler (dry run): {} x{} speed {}", action, steps, speed);
        self.actions.push((action, steps, speed));
        Ok(())
    }
}

/// Runs `<program> <action> <steps> <speed>` for every action.
#[derive(Debug, Clone)]
pub struct CommandCrawler {
    program: PathBuf,
}

impl CommandCrawler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Crawler for CommandCrawler {
    fn do_action(&mut self, action: Action, steps: u32, speed: u8) -> Result<()> {
        let status = ProcessCommand::new(&self.program)
            .arg(action.as_str())
            .arg(steps.to_string())
            .arg(speed.to_string())
            .status()
            .with_context(|| format!("run crawler command {}", self.program.display()))?;
        if !status.success() {
            return Err(anyhow!(
                "crawler command {} failed for {}: {}",
                self.program.display(),
                action,
                status
            ));
        }
        Ok(())
    }
}
