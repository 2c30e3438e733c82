use std::path::Path;

use anyhow::Context;
use floodgate_core::{FloodgateResult, Sample, epoch_secs};
use floodgate_history::HistoryLog;

use super::load_config;

pub fn show(config_path: &Path, limit: usize) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let log = HistoryLog::new(&config.history.path);
    let now = epoch_secs();

    let samples = recent(&log, limit)?;
    if samples.is_empty() {
        println!("No samples recorded in {}", log.path().display());
        return Ok(());
    }
    for sample in samples {
        println!(
            "{}  {:>8} users  {:>6}s ago",
            sample.time,
            sample.value,
            sample.age(now)
        );
    }
    Ok(())
}

pub fn compact(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let retention = config
        .retention()?
        .context("[history] retention is not set, nothing to compact")?;
    let log = HistoryLog::new(&config.history.path);

    let cutoff = epoch_secs().saturating_sub(retention.as_secs());
    let dropped = log
        .compact(cutoff)
        .with_context(|| format!("compacting {}", log.path().display()))?;

    println!("✓ Dropped {dropped} samples from {}", log.path().display());
    Ok(())
}

/// The last `limit` samples in log order.
fn recent(log: &HistoryLog, limit: usize) -> FloodgateResult<Vec<Sample>> {
    let samples = log.samples()?;
    let skip = samples.len().saturating_sub(limit);
    Ok(samples.into_iter().skip(skip).collect())
}
