//! Registration decision — pure comparison of current count vs baseline.

use serde::Serialize;

use floodgate_core::{FloodgateConfig, MissingBaseline, Sample};

/// Where the baseline sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    /// Youngest sample older than the full window.
    Window,
    /// The history is younger than the window; its oldest sample was used.
    PartialWindow,
    /// The history is empty.
    Missing,
}

/// Thresholds the decision is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionPolicy {
    pub max_per_hour: u64,
    pub on_missing_baseline: MissingBaseline,
}

impl DecisionPolicy {
    pub fn from_config(config: &FloodgateConfig) -> Self {
        Self {
            max_per_hour: config.max_per_hour,
            on_missing_baseline: config.on_missing_baseline,
        }
    }
}

/// The outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether registrations should be open.
    pub open: bool,
    pub current: u64,
    pub baseline: Option<Sample>,
    pub source: BaselineSource,
    /// `current - baseline.value`, when there is a baseline.
    pub delta: Option<i64>,
}

/// Decide whether registrations should be open.
///
/// `open` holds iff `current - baseline <= max_per_hour`. Without a
/// full-window baseline the oldest sample stands in; with no samples at
/// all the policy's `on_missing_baseline` answers.
pub fn decide(
    current: u64,
    baseline: Option<Sample>,
    oldest: Option<Sample>,
    policy: &DecisionPolicy,
) -> Decision {
    let (baseline, source) = match (baseline, oldest) {
        (Some(b), _) => (Some(b), BaselineSource::Window),
        (None, Some(o)) => (Some(o), BaselineSource::PartialWindow),
        (None, None) => (None, BaselineSource::Missing),
    };

    match baseline {
        Some(b) => Decision {
            open: current <= b.value.saturating_add(policy.max_per_hour),
            current,
            baseline: Some(b),
            source,
            delta: Some(signed_delta(current, b.value)),
        },
        None => Decision {
            open: policy.on_missing_baseline == MissingBaseline::Open,
            current,
            baseline: None,
            source,
            delta: None,
        },
    }
}

/// `current - baseline`, saturating at the bounds of `i64`.
fn signed_delta(current: u64, baseline: u64) -> i64 {
    let delta = i128::from(current) - i128::from(baseline);
    i64::try_from(delta).unwrap_or(if delta < 0 { i64::MIN } else { i64::MAX })
}
