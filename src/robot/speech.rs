use anyhow::{anyhow, Context, Result};
use std::process::Command;

pub trait Speaker {
    fn say(&mut self, text: &str) -> Result<()>;
}

impl<T: Speaker + ?Sized> Speaker for Box<T> {
    fn say(&mut self, text: &str) -> Result<()> {
        (**self).say(text)
    }
}

/// Text-to-speech through the `espeak` program.
#[derive(Debug, Clone)]
pub struct EspeakSpeaker {
    program: String,
}

impl EspeakSpeaker {
    pub fn new() -> Self {
        Self {
            program: "espeak".to_string(),
        }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for EspeakSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

impl Speaker for EspeakSpeaker {
    fn say(&mut self, text: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .arg(text)
            .status()
            .with_context(|| format!("run {}", self.program))?;
        if !status.success() {
            return Err(anyhow!("{} exited with {}", self.program, status));
        }
        Ok(())
    }
}

/// Logs phrases instead of speaking them.
#[derive(Debug, Default)]
pub struct LogSpeaker {
    spoken: Vec<String>,
}

impl LogSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> &[String] {
        &self.spoken
    }
}

impl Speaker for LogSpeaker {
    fn say(&mut self, text: &str) -> Result<()> {
        log::info!("say: {}", text);
        self.spoken.push(text.to_string());
        Ok(())
    }
}
