//! Usage-rate summary statistics.

use serde::Serialize;

use crate::models::UsageSample;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageRateStats {
    pub max: f64,
    pub min: f64,
    /// Rate of the last sample
    pub current: f64,
    pub average: f64,
    /// Time label of the first sample reaching `max`; empty without samples
    pub peak_time: String,
}

/// Summarize usage-rate samples. Empty input yields all zeros.
pub fn aggregate_usage_rate(samples: &[UsageSample]) -> UsageRateStats {
    let Some(last) = samples.last() else {
        return UsageRateStats::default();
    };

    let mut peak = &samples[0];
    let mut min = samples[0].usage_rate;
    let mut sum = 0.0;
    for sample in samples {
        // Strict comparison keeps the first occurrence on ties
        if sample.usage_rate > peak.usage_rate {
            peak = sample;
        }
        min = min.min(sample.usage_rate);
        sum += sample.usage_rate;
    }

    UsageRateStats {
        max: peak.usage_rate,
        min,
        current: last.usage_rate,
        average: sum / samples.len() as f64,
        peak_time: peak.time.clone(),
    }
}
