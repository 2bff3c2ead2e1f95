use crate::client::session::PingReport;
use colored::*;
use tracing::{info, warn};

/// Reporter for printing ping session results
pub struct Reporter;

impl Reporter {
    /// Human-readable summary of a ping session.
    pub fn render_summary(report: &PingReport) -> String {
        let mut lines = vec![
            "******* PING DATA *******".cyan().bold().to_string(),
            format!("Duration: {}", report.duration),
        ];

        match &report.statistics {
            Some(stats) => {
                lines.push(format!("Pings: {}", stats.count()));
                lines.push(format!("Average latency: {:.3} ms", stats.mean()));
                lines.push(format!("Minimum ping: {:.3} ms", stats.min()));
                lines.push(format!("Maximum ping: {:.3} ms", stats.max()));
                lines.push(format!("Median latency: {:.3} ms", stats.percentile(0.5)));
                lines.push(format!("P99 latency: {:.3} ms", stats.percentile(0.99)));
            }
            None => lines.push("No latency samples recorded.".red().to_string()),
        }

        lines.join("\n")
    }

    /// Print the summary and log its figures.
    pub fn print_summary(report: &PingReport) {
        println!("\n{}\n", Self::render_summary(report));

        match &report.statistics {
            Some(stats) => info!(
                samples = stats.count(),
                duration = %report.duration,
                avg_ms = stats.mean(),
                min_ms = stats.min(),
                max_ms = stats.max(),
                "Ping session summary"
            ),
            None => warn!(duration = %report.duration, "Ping session ended without samples"),
        }
    }
}
