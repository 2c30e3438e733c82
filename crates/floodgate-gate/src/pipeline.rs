//! Floodgate — one sample → record → decide → actuate pass.
//!
//! The pipeline is generic over where the user count comes from and what
//! flips the switch, so the same code runs against the real instance and
//! against in-process fakes.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use floodgate_core::{
    CountSource, FloodgateConfig, FloodgateError, FloodgateResult, RegistrationSwitch, Sample,
};
use floodgate_history::HistoryLog;

use crate::decision::{BaselineSource, Decision, DecisionPolicy, decide};

/// What one run observed and did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Wall-clock time of the run, seconds since the epoch.
    pub time: u64,
    pub decision: Decision,
    /// Age of the baseline the decision looked for, in seconds.
    pub window_secs: u64,
    /// Whether the fetched count was appended to the history.
    pub recorded: bool,
    /// Samples dropped by retention compaction.
    pub compacted: usize,
    /// Whether actuation was skipped (dry run).
    pub dry_run: bool,
}

impl RunReport {
    /// Status lines for operators, one per line.
    pub fn lines(&self) -> Vec<String> {
        let d = &self.decision;
        let mut lines = vec![format!("Current:  {} users", d.current)];
        match d.baseline {
            Some(b) => lines.push(format!(
                "Historic: {} users as of {} sec ago",
                b.value,
                b.age(self.time)
            )),
            None => lines.push("Historic: no samples yet".to_string()),
        }
        match d.delta {
            Some(delta) => lines.push(format!(
                "Open reg: {} ({} delta: {delta})",
                d.open,
                window_label(self.window_secs)
            )),
            None => lines.push(format!("Open reg: {} (no baseline)", d.open)),
        }
        lines
    }
}

/// "1-hour", "30-minute", "90-second".
fn window_label(secs: u64) -> String {
    if secs > 0 && secs % 3600 == 0 {
        format!("{}-hour", secs / 3600)
    } else if secs > 0 && secs % 60 == 0 {
        format!("{}-minute", secs / 60)
    } else {
        format!("{secs}-second")
    }
}

pub struct Floodgate<S, W> {
    source: S,
    switch: W,
    history: HistoryLog,
    policy: DecisionPolicy,
    window: Duration,
    retention: Option<Duration>,
    dry_run: bool,
}

impl<S: CountSource, W: RegistrationSwitch> Floodgate<S, W> {
    pub fn new(source: S, switch: W, history: HistoryLog, policy: DecisionPolicy) -> Self {
        Self {
            source,
            switch,
            history,
            policy,
            window: Duration::from_secs(3600),
            retention: None,
            dry_run: false,
        }
    }

    /// Build a pipeline with window, retention and thresholds from config.
    pub fn from_config(source: S, switch: W, config: &FloodgateConfig) -> FloodgateResult<Self> {
        Ok(Self::new(
            source,
            switch,
            HistoryLog::new(&config.history.path),
            DecisionPolicy::from_config(config),
        )
        .with_window(config.window()?)
        .with_retention(config.retention()?))
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_retention(mut self, retention: Option<Duration>) -> Self {
        self.retention = retention;
        self
    }

    /// Evaluate but never actuate.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Run one pass at wall-clock time `now`.
    ///
    /// A response without a user count fails the run before anything is
    /// written or actuated.
    pub fn run(&self, now: u64) -> FloodgateResult<RunReport> {
        let current = self
            .source
            .fetch_user_count()?
            .ok_or(FloodgateError::MissingUserCount)?;

        let latest = self.history.latest()?;
        let baseline = self.history.lookup_at_age(now, self.window.as_secs())?;
        let oldest = self.history.oldest()?;

        let recorded = latest.is_none_or(|s| s.value != current);
        if recorded {
            self.history.append(Sample::new(now, current))?;
        } else {
            debug!(current, "count unchanged, not recording");
        }

        let decision = decide(current, baseline, oldest, &self.policy);
        match decision.source {
            BaselineSource::Window => {}
            BaselineSource::PartialWindow => warn!(
                window_secs = self.window.as_secs(),
                "history shorter than window, using oldest sample as baseline"
            ),
            BaselineSource::Missing => warn!(
                policy = ?self.policy.on_missing_baseline,
                "no history yet, applying missing-baseline policy"
            ),
        }
        info!(
            current,
            baseline = decision.baseline.map(|b| b.value),
            delta = decision.delta,
            max_per_hour = self.policy.max_per_hour,
            open = decision.open,
            "registration decision"
        );

        if self.dry_run {
            info!(open = decision.open, "dry run, admin command skipped");
        } else {
            self.switch.set_registrations(decision.open)?;
        }

        let compacted = match self.retention {
            Some(retention) => self.history.compact(now.saturating_sub(retention.as_secs()))?,
            None => 0,
        };

        Ok(RunReport {
            time: now,
            decision,
            window_secs: self.window.as_secs(),
            recorded,
            compacted,
            dry_run: self.dry_run,
        })
    }
}
