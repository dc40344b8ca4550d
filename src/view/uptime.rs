//! 24h availability bars.
//!
//! Health records are folded into a fixed grid of [`UPTIME_BUCKETS`] bars
//! (24h of 15-minute slots). Each bar shows the worst status seen in its
//! slice; missing history is padded with `unknown` bars at the oldest end so
//! the newest data is always the last bar.

use serde::Serialize;

use crate::models::{HealthRecord, HealthStatus};

/// Number of bars in the 24h grid.
pub const UPTIME_BUCKETS: usize = 96;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UptimeBucket {
    pub status: HealthStatus,
    pub record_count: usize,
    /// `"HH:MM"` or `"HH:MM - HH:MM"` in UTC; empty for padding
    pub time_range_label: String,
}

impl UptimeBucket {
    fn unknown() -> Self {
        Self {
            status: HealthStatus::Unknown,
            record_count: 0,
            time_range_label: String::new(),
        }
    }
}

/// Fold health records, in any order, into exactly [`UPTIME_BUCKETS`] bars.
pub fn bucket_uptime(records: &[HealthRecord]) -> Vec<UptimeBucket> {
    let mut sorted: Vec<&HealthRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.time);

    let group_size = sorted.len().div_ceil(UPTIME_BUCKETS).max(1);
    let filled: Vec<UptimeBucket> = sorted.chunks(group_size).map(fold_group).collect();

    let padding = UPTIME_BUCKETS.saturating_sub(filled.len());
    let mut buckets = Vec::with_capacity(UPTIME_BUCKETS);
    buckets.extend(std::iter::repeat_with(UptimeBucket::unknown).take(padding));
    buckets.extend(filled);

    // Chunking never yields more than UPTIME_BUCKETS groups; keep the newest if it ever did
    if buckets.len() > UPTIME_BUCKETS {
        buckets.drain(..buckets.len() - UPTIME_BUCKETS);
    }

    buckets
}

fn fold_group(group: &[&HealthRecord]) -> UptimeBucket {
    let status = group
        .iter()
        .map(|r| r.status)
        .max_by_key(|s| s.severity())
        .unwrap_or(HealthStatus::Unknown);

    let label = match (group.first(), group.last()) {
        (Some(first), Some(last)) if first.time == last.time => first.time.format("%H:%M").to_string(),
        (Some(first), Some(last)) => format!(
            "{} - {}",
            first.time.format("%H:%M"),
            last.time.format("%H:%M")
        ),
        _ => String::new(),
    };

    UptimeBucket {
        status,
        record_count: group.len(),
        time_range_label: label,
    }
}

/// Percentage of records that were not `unavailable`; 0 for no records.
pub fn availability_percent(records: &[HealthRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let up = records
        .iter()
        .filter(|r| matches!(r.status, HealthStatus::Available | HealthStatus::Degraded))
        .count();
    up as f64 * 100.0 / records.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn records(statuses: &[HealthStatus]) -> Vec<HealthRecord> {
        let start = Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap();
        statuses
            .iter()
            .enumerate()
            .map(|(i, s)| HealthRecord {
                time: start + Duration::minutes(i as i64),
                status: *s,
            })
            .collect()
    }

    #[test]
    fn test_always_96_buckets() {
        for n in [0usize, 1, 95, 96, 97, 191, 192, 193, 5000] {
            let recs = records(&vec![HealthStatus::Available; n]);
            let buckets = bucket_uptime(&recs);
            assert_eq!(buckets.len(), UPTIME_BUCKETS, "n = {}", n);
            let counted: usize = buckets.iter().map(|b| b.record_count).sum();
            assert_eq!(counted, n, "n = {}", n);
        }
    }

    #[test]
    fn test_empty_input_is_all_unknown() {
        let buckets = bucket_uptime(&[]);
        assert!(buckets.iter().all(|b| b.status == HealthStatus::Unknown && b.record_count == 0));
    }

    #[test]
    fn test_worst_status_wins() {
        // 192 records -> groups of 2
        let mut statuses = vec![HealthStatus::Available; 192];
        statuses[0] = HealthStatus::Unavailable;
        statuses[3] = HealthStatus::Degraded;
        statuses[4] = HealthStatus::Degraded;
        statuses[5] = HealthStatus::Unavailable;
        let buckets = bucket_uptime(&records(&statuses));

        assert_eq!(buckets[0].status, HealthStatus::Unavailable);
        assert_eq!(buckets[1].status, HealthStatus::Degraded);
        assert_eq!(buckets[2].status, HealthStatus::Unavailable);
        assert_eq!(buckets[3].status, HealthStatus::Available);
        assert_eq!(buckets[0].time_range_label, "00:00 - 00:01");
    }

    #[test]
    fn test_unsorted_input_padded_at_oldest_end() {
        let mut recs = records(&[
            HealthStatus::Available,
            HealthStatus::Degraded,
            HealthStatus::Unavailable,
        ]);
        recs.reverse();
        let buckets = bucket_uptime(&recs);

        assert!(buckets[..93].iter().all(|b| b.status == HealthStatus::Unknown));
        assert_eq!(buckets[93].status, HealthStatus::Available);
        assert_eq!(buckets[94].status, HealthStatus::Degraded);
        assert_eq!(buckets[95].status, HealthStatus::Unavailable);
        assert_eq!(buckets[95].time_range_label, "00:02");
    }

    #[test]
    fn test_availability_percent() {
        assert_eq!(availability_percent(&[]), 0.0);
        let recs = records(&[
            HealthStatus::Available,
            HealthStatus::Degraded,
            HealthStatus::Unavailable,
            HealthStatus::Available,
        ]);
        assert_eq!(availability_percent(&recs), 75.0);
    }
}
