use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::cell::Cell;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

impl UiMode {
    pub fn parse(flag: &str) -> Self {
        match flag {
            "plain" => UiMode::Plain,
            "pretty" => UiMode::Pretty,
            _ => UiMode::Auto,
        }
    }
}

/// Stage reporting on stderr: spinners on a terminal, `[n/N]` lines otherwise.
#[derive(Debug)]
pub struct Ui {
    pretty: bool,
    total: usize,
    current: Cell<usize>,
}

impl Ui {
    /// `quiet_stdout` is set when stdout is piped; Auto then stays plain.
    pub fn new(mode: UiMode, stderr_is_tty: bool, quiet_stdout: bool, total: usize) -> Self {
        let pretty = stderr_is_tty
            && match mode {
                UiMode::Pretty => true,
                UiMode::Auto => !quiet_stdout,
                UiMode::Plain => false,
            };
        Self {
            pretty,
            total,
            current: Cell::new(0),
        }
    }

    pub fn stage(&self, name: &str) -> Stage {
        let n = self.current.get() + 1;
        self.current.set(n);
        let label = format!("[{}/{}] {}", n, self.total, name);

        if !self.pretty {
            eprintln!("==> {}", label);
            return Stage::new(label, None);
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_draw_target(ProgressDrawTarget::stderr());
        spinner.enable_steady_tick(Duration::from_millis(120));
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(label.clone());
        Stage::new(label, Some(spinner))
    }
}

pub struct Stage {
    label: String,
    start: Instant,
    spinner: Option<ProgressBar>,
}

impl Stage {
    fn new(label: String, spinner: Option<ProgressBar>) -> Self {
        Self {
            label,
            start: Instant::now(),
            spinner,
        }
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        let done = format!("✔ {} ({})", self.label, short_duration(self.start.elapsed()));
        match &self.spinner {
            Some(spinner) => spinner.finish_with_message(done),
            None => eprintln!("{done}"),
        }
    }
}

fn short_duration(elapsed: Duration) -> String {
    if elapsed < Duration::from_secs(1) {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}
