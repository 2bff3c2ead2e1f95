use crate::client::constants::{PLOT_HEIGHT, PLOT_WIDTH};
use crate::client::sink::LatencySink;
use colored::*;
use thiserror::Error;
use tracing::{info, warn};

const POINT: &str = "•";
const AVERAGE_MARK: &str = "┈";
const AXIS_LABEL_WIDTH: usize = 9;

#[derive(Debug, Error, PartialEq)]
pub enum PlotError {
    #[error("no samples to plot")]
    NoData,

    #[error("sample {index} is not a finite latency: {value}")]
    InvalidSample { index: usize, value: f64 },
}

/// Terminal line plot of latency over time with a dotted average marker.
///
/// When there are more samples than columns, consecutive samples are
/// averaged into one column.
#[derive(Debug, Clone)]
pub struct LatencyPlot {
    height: usize,
    width: usize,
}

impl Default for LatencyPlot {
    fn default() -> Self {
        Self::new(PLOT_HEIGHT, PLOT_WIDTH)
    }
}

impl LatencyPlot {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height: height.max(2),
            width: width.max(1),
        }
    }

    /// Plot title; one sample per second makes the sample count a duration.
    pub fn title(samples: &[f64]) -> String {
        format!("Latency Plot ({} minutes)", samples.len() / 60)
    }

    pub fn render(&self, samples: &[f64]) -> Result<String, PlotError> {
        if samples.is_empty() {
            return Err(PlotError::NoData);
        }
        if let Some((index, &value)) = samples
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(PlotError::InvalidSample { index, value });
        }

        let columns = self.columns(samples);
        let max = columns.iter().fold(0.0f64, |a, &b| a.max(b));
        let scale = if max > 0.0 { max } else { 1.0 };
        let average = samples.iter().sum::<f64>() / samples.len() as f64;

        let level = |value: f64| ((value / scale) * self.height as f64).round() as usize;
        let average_level = level(average).max(1);

        let mut lines = Vec::with_capacity(self.height + 3);
        lines.push(Self::title(samples).bold().to_string());

        for row in (1..=self.height).rev() {
            let label = if row == self.height {
                format!("{:>width$.3}", scale, width = AXIS_LABEL_WIDTH)
            } else if row == average_level {
                format!("{:>width$.3}", average, width = AXIS_LABEL_WIDTH)
            } else {
                " ".repeat(AXIS_LABEL_WIDTH)
            };

            let mut line = format!("{} ┤", label);
            for &value in &columns {
                let cell = if level(value).max(1) == row {
                    POINT.red().to_string()
                } else if row == average_level {
                    AVERAGE_MARK.yellow().to_string()
                } else {
                    " ".to_string()
                };
                line.push_str(&cell);
            }
            lines.push(line);
        }

        lines.push(format!(
            "{:>width$} └{}",
            "0",
            "─".repeat(columns.len()),
            width = AXIS_LABEL_WIDTH
        ));
        lines.push(format!(
            "{:>width$}  Time (s) → {} samples | Latency (ms) ↑ | avg {:.3} ms",
            "",
            samples.len(),
            average,
            width = AXIS_LABEL_WIDTH
        ));

        Ok(lines.join("\n"))
    }

    fn columns(&self, samples: &[f64]) -> Vec<f64> {
        if samples.len() <= self.width {
            return samples.to_vec();
        }
        let chunk = samples.len().div_ceil(self.width);
        samples
            .chunks(chunk)
            .map(|c| c.iter().sum::<f64>() / c.len() as f64)
            .collect()
    }
}

impl LatencySink for LatencyPlot {
    fn consume(&self, samples: &[f64]) {
        match self.render(samples) {
            Ok(plot) => {
                println!("\n{}\n", plot);
                info!("Results plotted to graph.");
            }
            Err(e) => warn!("Error while plotting results: {}", e),
        }
    }
}
