//! Realtime latency chart series.
//!
//! The backend sends one flat JSON object per timestamp, keyed
//! `"<alias>_latency"` / `"<alias>_available"`. A latency is only plotted when
//! the channel was available at that timestamp and the value is a positive
//! number.
//!
//! Latency keys are tried in order: `<Alias>_latency`,
//! `<alias lower-cased>_latency`, then bare `<Alias>`.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::ChannelSnapshot;

/// One raw time point as sent by the backend.
pub type RawTimePoint = Map<String, Value>;

/// Chart-ready point: only channels with a plottable latency are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyPoint {
    pub time: String,
    pub latency: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencySeries {
    pub points: Vec<LatencyPoint>,
    pub aliases: Vec<String>,
    /// Most recent plotted latency per alias; `None` when never plotted
    pub latest_by_alias: HashMap<String, Option<f64>>,
    /// Order for the channel cards
    pub card_order: Vec<String>,
}

/// Build the realtime chart series from raw points and the known channels.
pub fn build_latency_series(raw: &[RawTimePoint], channels: &[ChannelSnapshot]) -> LatencySeries {
    let aliases: Vec<String> = channels.iter().map(|c| c.alias.clone()).collect();

    let points: Vec<LatencyPoint> = raw
        .iter()
        .map(|point| LatencyPoint {
            time: time_label(point),
            latency: aliases
                .iter()
                .filter_map(|alias| resolve_latency(point, alias).map(|v| (alias.clone(), v)))
                .collect(),
        })
        .collect();

    let latest_by_alias: HashMap<String, Option<f64>> = aliases
        .iter()
        .map(|alias| {
            let latest = points
                .iter()
                .rev()
                .find_map(|p| p.latency.get(alias).copied());
            (alias.clone(), latest)
        })
        .collect();

    let card_order = card_order(channels, &latest_by_alias);

    tracing::debug!(
        "Built latency series: {} points, {} channels",
        points.len(),
        aliases.len()
    );

    LatencySeries {
        points,
        aliases,
        latest_by_alias,
        card_order,
    }
}

/// Plottable latency of `alias` at `point`, if any.
pub fn resolve_latency(point: &RawTimePoint, alias: &str) -> Option<f64> {
    if !is_available(point, alias) {
        return None;
    }

    let lower = alias.to_lowercase();
    [format!("{}_latency", alias), format!("{}_latency", lower), alias.to_string()]
        .iter()
        .find_map(|key| positive_number(point.get(key)))
}

fn is_available(point: &RawTimePoint, alias: &str) -> bool {
    let flag = point
        .get(&format!("{}_available", alias))
        .or_else(|| point.get(&format!("{}_available", alias.to_lowercase())));
    matches!(flag, Some(Value::Bool(true)))
}

fn positive_number(value: Option<&Value>) -> Option<f64> {
    value
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite() && *v > 0.0)
}

fn time_label(point: &RawTimePoint) -> String {
    match point.get("time") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Online channels by ascending latest latency, then offline ones by name.
fn card_order(channels: &[ChannelSnapshot], latest: &HashMap<String, Option<f64>>) -> Vec<String> {
    let mut ordered: Vec<&ChannelSnapshot> = channels.iter().collect();
    ordered.sort_by(|a, b| {
        let la = latest.get(&a.alias).copied().flatten();
        let lb = latest.get(&b.alias).copied().flatten();
        match (a.alive, b.alive) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => a.alias.cmp(&b.alias),
            (true, true) => match (la, lb) {
                (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.alias.cmp(&b.alias)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.alias.cmp(&b.alias),
            },
        }
    });
    ordered.into_iter().map(|c| c.alias.clone()).collect()
}

/// Display text for a latest latency value.
pub fn format_latency(latest: Option<f64>) -> String {
    match latest {
        Some(ms) => format!("{:.0}ms", ms),
        None => "--".to_string(),
    }
}
