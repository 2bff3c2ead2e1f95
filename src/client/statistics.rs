use crate::client::constants::*;
use crate::client::error::{ClientError, Result};
use hdrhistogram::Histogram;
use tracing::{debug, warn};

/// Aggregate of a ping session's latency samples, in milliseconds.
///
/// Minimum, maximum and mean are exact. Percentiles come from an HDR
/// histogram recorded at microsecond resolution.
#[derive(Debug, Clone)]
pub struct PingStatistics {
    hist: Histogram<u64>,
    min_ms: f64,
    max_ms: f64,
    mean_ms: f64,
    count: usize,
    clamped_count: usize,
}

impl PingStatistics {
    /// Compute statistics over `samples`; `None` when there are no samples.
    pub fn from_samples(samples: &[f64]) -> Result<Option<Self>> {
        if samples.is_empty() {
            return Ok(None);
        }
        debug!(sample_count = samples.len(), "Computing ping statistics");

        let mut hist = Histogram::<u64>::new_with_bounds(
            HISTOGRAM_LOW_BOUND_US,
            HISTOGRAM_HIGH_BOUND_US,
            HISTOGRAM_SIGNIFICANT_DIGITS,
        )
        .map_err(|e| ClientError::Statistics(format!("Failed to create histogram: {}", e)))?;

        let mut min_ms = f64::INFINITY;
        let mut max_ms = f64::NEG_INFINITY;
        let mut sum_ms = 0.0;
        let mut clamped_count = 0;

        for &sample in samples {
            min_ms = min_ms.min(sample);
            max_ms = max_ms.max(sample);
            sum_ms += sample;

            let micros = (sample * 1000.0).round().max(0.0) as u64;
            let clamped = micros.clamp(HISTOGRAM_LOW_BOUND_US, HISTOGRAM_HIGH_BOUND_US);
            if micros != clamped {
                clamped_count += 1;
            }
            hist.record(clamped).map_err(|e| {
                ClientError::Statistics(format!("Failed to record latency {}: {}", sample, e))
            })?;
        }

        if clamped_count > 0 {
            warn!(
                clamped_count = clamped_count,
                total_count = samples.len(),
                "Some latency values were clamped to histogram bounds"
            );
        }

        Ok(Some(Self {
            hist,
            min_ms,
            max_ms,
            mean_ms: sum_ms / samples.len() as f64,
            count: samples.len(),
            clamped_count,
        }))
    }

    pub fn min(&self) -> f64 {
        self.min_ms
    }

    pub fn max(&self) -> f64 {
        self.max_ms
    }

    pub fn mean(&self) -> f64 {
        self.mean_ms
    }

    /// Latency at `quantile` (0.0 to 1.0) in milliseconds
    pub fn percentile(&self, quantile: f64) -> f64 {
        self.hist.value_at_quantile(quantile) as f64 / 1000.0
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of samples outside the histogram bounds (affects percentiles only)
    pub fn clamped_count(&self) -> usize {
        self.clamped_count
    }
}
