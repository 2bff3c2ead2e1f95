use crate::client::constants::PROGRESS_TICK_INTERVAL_MS;
use chrono::Local;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Live output of the ping loop: one line per sample plus a spinner that
/// carries the running min/avg/max.
pub struct PingProgress {
    pb: ProgressBar,
    quiet: bool,
    min_ms: f64,
    max_ms: f64,
    sum_ms: f64,
    count: usize,
}

impl PingProgress {
    pub fn new(quiet: bool) -> Self {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            let style = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            pb.set_style(style);
            pb.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_INTERVAL_MS));
            pb
        };

        Self {
            pb,
            quiet,
            min_ms: f64::INFINITY,
            max_ms: f64::NEG_INFINITY,
            sum_ms: 0.0,
            count: 0,
        }
    }

    /// Record one sample and print its line.
    pub fn record(&mut self, latency_ms: f64) {
        self.count += 1;
        self.sum_ms += latency_ms;
        self.min_ms = self.min_ms.min(latency_ms);
        self.max_ms = self.max_ms.max(latency_ms);

        if self.quiet {
            return;
        }

        let line = Self::sample_line(&Local::now().format("%H:%M:%S").to_string(), latency_ms);
        if self.pb.is_hidden() {
            // Not a terminal: the spinner draws nothing, print plainly.
            println!("{}", line);
        } else {
            self.pb.println(line);
        }
        self.pb.set_message(self.live_message());
    }

    /// Per-sample line, e.g. `[12:00:01] Latency: 0.123 ms`.
    pub fn sample_line(time: &str, latency_ms: f64) -> String {
        format!("[{}] Latency: {:.3} ms", time, latency_ms)
    }

    fn live_message(&self) -> String {
        let avg = self.sum_ms / self.count as f64;
        format!(
            "{} pings | min {} / avg {} / max {} ms",
            self.count,
            format!("{:.3}", self.min_ms).green(),
            format!("{:.3}", avg).cyan(),
            format!("{:.3}", self.max_ms).red()
        )
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}
