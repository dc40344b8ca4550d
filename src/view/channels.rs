//! Channel status table ordering and summary.

use serde::Serialize;

use crate::models::ChannelSnapshot;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub online: usize,
    pub offline: usize,
    /// Mean EWMA latency of online channels; 0 when none are online
    pub mean_online_latency_ms: f64,
}

/// Alive channels by ascending EWMA latency, then offline channels by alias.
pub fn rank_channels(snapshots: &[ChannelSnapshot]) -> Vec<ChannelSnapshot> {
    let mut ranked = snapshots.to_vec();
    ranked.sort_by(|a, b| {
        b.alive
            .cmp(&a.alive)
            .then_with(|| {
                if a.alive {
                    a.ewma_latency_ms.total_cmp(&b.ewma_latency_ms)
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .then_with(|| a.alias.cmp(&b.alias))
    });
    ranked
}

pub fn summarize_channels(snapshots: &[ChannelSnapshot]) -> ChannelSummary {
    let online: Vec<&ChannelSnapshot> = snapshots.iter().filter(|c| c.alive).collect();
    let mean_online_latency_ms = if online.is_empty() {
        0.0
    } else {
        online.iter().map(|c| c.ewma_latency_ms).sum::<f64>() / online.len() as f64
    };

    ChannelSummary {
        online: online.len(),
        offline: snapshots.len() - online.len(),
        mean_online_latency_ms,
    }
}
