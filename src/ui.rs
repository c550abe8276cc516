use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

/// How stage progress is drawn on stderr.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    /// Spinners on an interactive terminal unless stdout is piped.
    Auto,
    Plain,
    Pretty,
}

impl UiMode {
    fn parse(flag: &str) -> Self {
        match flag.trim().to_ascii_lowercase().as_str() {
            "plain" => Self::Plain,
            "pretty" => Self::Pretty,
            _ => Self::Auto,
        }
    }
}

/// Progress reporting for the binaries. Results go to stdout, progress to
/// stderr.
#[derive(Clone, Copy, Debug)]
pub struct Ui {
    animated: bool,
}

impl Ui {
    /// `piped` is true when stdout is redirected; `auto` then stays plain.
    pub fn from_args(flag: &str, stderr_is_tty: bool, piped: bool) -> Self {
        let animated = stderr_is_tty
            && match UiMode::parse(flag) {
                UiMode::Pretty => true,
                UiMode::Auto => !piped,
                UiMode::Plain => false,
            };
        Self { animated }
    }

    /// Announce a pipeline step; its timing is printed when the guard drops.
    pub fn stage(&self, label: &str) -> Stage {
        let spinner = if self.animated {
            let spinner = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
            spinner.set_style(
                ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message(label.to_string());
            spinner.enable_steady_tick(Duration::from_millis(100));
            Some(spinner)
        } else {
            eprintln!("-- {label}");
            None
        };
        Stage {
            label: label.to_string(),
            started: Instant::now(),
            spinner,
        }
    }

    /// Counter for per-frame work; hidden in plain mode.
    pub fn frames(&self, total: usize) -> ProgressBar {
        if !self.animated {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
        let style = ProgressStyle::with_template("{bar:30} {pos}/{len} frames {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar
    }
}

pub struct Stage {
    label: String,
    started: Instant,
    spinner: Option<ProgressBar>,
}

impl Drop for Stage {
    fn drop(&mut self) {
        let took = human_elapsed(self.started.elapsed());
        match self.spinner.take() {
            Some(spinner) => spinner.finish_with_message(format!("{} done in {took}", self.label)),
            None => eprintln!("   {} done in {took}", self.label),
        }
    }
}

fn human_elapsed(elapsed: Duration) -> String {
    match elapsed.as_millis() {
        ms if ms < 1_000 => format!("{ms}ms"),
        ms if ms < 60_000 => format!("{:.1}s", elapsed.as_secs_f64()),
        _ => {
            let secs = elapsed.as_secs();
            format!("{}m{:02}s", secs / 60, secs % 60)
        }
    }
}
