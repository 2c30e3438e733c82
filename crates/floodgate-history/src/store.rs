//! HistoryLog — plain-text persistence for user-count samples.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use floodgate_core::{FloodgateError, FloodgateResult, Sample};

/// Append-only `timestamp value` log on local storage.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one sample, creating the log if it does not exist yet.
    pub fn append(&self, sample: Sample) -> FloodgateResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{} {}", sample.time, sample.value)?;
        debug!(path = ?self.path, time = sample.time, value = sample.value, "sample appended");
        Ok(())
    }

    /// Read every sample in insertion order. A missing log is empty.
    pub fn samples(&self) -> FloodgateResult<Vec<Sample>> {
        let mut samples = Vec::new();
        self.scan(|sample| samples.push(sample))?;
        Ok(samples)
    }

    /// The youngest sample strictly older than `now - age_secs`.
    ///
    /// Samples sharing a timestamp resolve to the first one in the log.
    pub fn lookup_at_age(&self, now: u64, age_secs: u64) -> FloodgateResult<Option<Sample>> {
        let threshold = now.saturating_sub(age_secs);
        let mut best: Option<Sample> = None;
        self.scan(|sample| {
            if sample.time < threshold && best.is_none_or(|b| sample.time > b.time) {
                best = Some(sample);
            }
        })?;
        Ok(best)
    }

    /// The sample with the greatest timestamp.
    pub fn latest(&self) -> FloodgateResult<Option<Sample>> {
        let mut best: Option<Sample> = None;
        self.scan(|sample| {
            if best.is_none_or(|b| sample.time > b.time) {
                best = Some(sample);
            }
        })?;
        Ok(best)
    }

    /// The sample with the smallest timestamp.
    pub fn oldest(&self) -> FloodgateResult<Option<Sample>> {
        let mut best: Option<Sample> = None;
        self.scan(|sample| {
            if best.is_none_or(|b| sample.time < b.time) {
                best = Some(sample);
            }
        })?;
        Ok(best)
    }

    /// Drop samples older than `cutoff`, keeping the youngest of them as an
    /// anchor so that lookups reaching back to `cutoff` still resolve.
    ///
    /// Returns the number of samples dropped. The file is only rewritten
    /// when something is dropped.
    pub fn compact(&self, cutoff: u64) -> FloodgateResult<usize> {
        let samples = self.samples()?;

        let mut anchor: Option<(usize, Sample)> = None;
        for (idx, sample) in samples.iter().enumerate() {
            if sample.time < cutoff && anchor.is_none_or(|(_, a)| sample.time > a.time) {
                anchor = Some((idx, *sample));
            }
        }
        let anchor_idx = anchor.map(|(idx, _)| idx);

        let kept: Vec<Sample> = samples
            .iter()
            .enumerate()
            .filter(|(idx, sample)| sample.time >= cutoff || Some(*idx) == anchor_idx)
            .map(|(_, sample)| *sample)
            .collect();

        let dropped = samples.len() - kept.len();
        if dropped == 0 {
            return Ok(0);
        }

        let tmp_path = self.compaction_path();
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            for sample in &kept {
                writeln!(writer, "{} {}", sample.time, sample.value)?;
            }
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        debug!(path = ?self.path, cutoff, dropped, kept = kept.len(), "history compacted");
        Ok(dropped)
    }

    /// Sibling path used while rewriting the log.
    fn compaction_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("floodgate"));
        name.push(".compact");
        self.path.with_file_name(name)
    }

    /// Feed every record to `visit`, in file order.
    fn scan(&self, mut visit: impl FnMut(Sample)) -> FloodgateResult<()> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?self.path, "history log absent, treating as empty");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let sample = parse_record(trimmed).ok_or_else(|| FloodgateError::Corrupt {
                line: idx + 1,
                content: line.clone(),
            })?;
            visit(sample);
        }
        Ok(())
    }
}

fn parse_record(line: &str) -> Option<Sample> {
    let mut fields = line.split_whitespace();
    let time = fields.next()?.parse().ok()?;
    let value = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(Sample::new(time, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn log_with(samples: &[(u64, u64)]) -> (tempfile::TempDir, HistoryLog) {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("floodgate.dat"));
        for &(time, value) in samples {
            log.append(Sample::new(time, value)).unwrap();
        }
        (dir, log)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (_dir, log) = log_with(&[]);
        assert!(!log.path().exists());
        assert!(log.samples().unwrap().is_empty());
        assert_eq!(log.latest().unwrap(), None);
        assert_eq!(log.oldest().unwrap(), None);
        assert_eq!(log.lookup_at_age(NOW, 3600).unwrap(), None);
    }

    #[test]
    fn append_writes_one_line_per_sample() {
        let (_dir, log) = log_with(&[(NOW - 10, 4), (NOW - 5, 6)]);
        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content, format!("{} 4\n{} 6\n", NOW - 10, NOW - 5));
        assert_eq!(
            log.samples().unwrap(),
            vec![Sample::new(NOW - 10, 4), Sample::new(NOW - 5, 6)]
        );
    }

    #[test]
    fn lookup_at_zero_age_returns_latest() {
        let (_dir, log) = log_with(&[(NOW - 300, 1), (NOW - 100, 3), (NOW - 200, 2)]);
        assert_eq!(log.lookup_at_age(NOW, 0).unwrap(), Some(Sample::new(NOW - 100, 3)));
        assert_eq!(log.latest().unwrap(), Some(Sample::new(NOW - 100, 3)));
        assert_eq!(log.oldest().unwrap(), Some(Sample::new(NOW - 300, 1)));
    }

    #[test]
    fn lookup_picks_youngest_sample_older_than_age() {
        let (_dir, log) = log_with(&[(NOW - 7200, 10), (NOW - 3700, 12), (NOW - 600, 13)]);
        assert_eq!(
            log.lookup_at_age(NOW, 3600).unwrap(),
            Some(Sample::new(NOW - 3700, 12))
        );
    }

    #[test]
    fn lookup_never_returns_sample_at_or_after_threshold() {
        let (_dir, log) = log_with(&[(NOW - 3600, 5), (NOW - 3599, 6), (NOW, 7)]);
        assert_eq!(log.lookup_at_age(NOW, 3600).unwrap(), None);
        for age in [0, 1, 60, 3599, 3600, 3601, 10_000] {
            if let Some(sample) = log.lookup_at_age(NOW, age).unwrap() {
                assert!(sample.time < NOW - age, "age {age} returned {sample:?}");
            }
        }
    }

    #[test]
    fn lookup_with_age_beyond_epoch_finds_nothing() {
        let (_dir, log) = log_with(&[(5, 1)]);
        assert_eq!(log.lookup_at_age(100, 1_000).unwrap(), None);
    }

    #[test]
    fn equal_timestamps_resolve_to_first_record() {
        let (_dir, log) = log_with(&[(NOW - 10, 1), (NOW - 10, 2)]);
        assert_eq!(log.latest().unwrap(), Some(Sample::new(NOW - 10, 1)));
        assert_eq!(log.lookup_at_age(NOW, 0).unwrap(), Some(Sample::new(NOW - 10, 1)));
    }

    #[test]
    fn unreadable_log_is_an_io_error_not_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path());
        assert!(matches!(log.latest(), Err(FloodgateError::Io(_))));
        assert!(matches!(log.samples(), Err(FloodgateError::Io(_))));
        assert!(matches!(log.lookup_at_age(NOW, 3600), Err(FloodgateError::Io(_))));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let (_dir, log) = log_with(&[]);
        fs::write(log.path(), "100 1\n\n200 2\n").unwrap();
        assert_eq!(log.samples().unwrap().len(), 2);
    }

    #[test]
    fn corrupt_line_is_reported_with_its_number() {
        let (_dir, log) = log_with(&[]);
        fs::write(log.path(), "100 1\n200 None\n").unwrap();
        match log.latest() {
            Err(FloodgateError::Corrupt { line, content }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "200 None");
            }
            other => panic!("expected corrupt error, got {other:?}"),
        }
    }

    #[test]
    fn extra_fields_are_corrupt() {
        assert_eq!(parse_record("1 2 3"), None);
        assert_eq!(parse_record("1"), None);
        assert_eq!(parse_record("1\t2"), Some(Sample::new(1, 2)));
    }

    #[test]
    fn compact_keeps_anchor_and_recent_samples() {
        let (_dir, log) = log_with(&[
            (NOW - 90_000, 1),
            (NOW - 88_000, 2),
            (NOW - 87_000, 3),
            (NOW - 3700, 4),
            (NOW - 60, 5),
        ]);
        let dropped = log.compact(NOW - 86_400).unwrap();
        assert_eq!(dropped, 2);
        assert_eq!(
            log.samples().unwrap(),
            vec![
                Sample::new(NOW - 87_000, 3),
                Sample::new(NOW - 3700, 4),
                Sample::new(NOW - 60, 5),
            ]
        );
        assert!(!log.compaction_path().exists());
    }

    #[test]
    fn compact_preserves_baseline_lookups() {
        let (_dir, log) = log_with(&[(NOW - 9000, 1), (NOW - 8000, 2), (NOW - 100, 3)]);
        let before = log.lookup_at_age(NOW, 3600).unwrap();
        log.compact(NOW - 7200).unwrap();
        assert_eq!(log.lookup_at_age(NOW, 3600).unwrap(), before);
    }

    #[test]
    fn compact_without_anything_to_drop_leaves_file_alone() {
        let (_dir, log) = log_with(&[(NOW - 100, 1), (NOW - 50, 2)]);
        let before = fs::metadata(log.path()).unwrap().modified().unwrap();
        assert_eq!(log.compact(NOW - 86_400).unwrap(), 0);
        assert_eq!(fs::metadata(log.path()).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn compact_missing_log_is_noop() {
        let (_dir, log) = log_with(&[]);
        assert_eq!(log.compact(NOW).unwrap(), 0);
        assert!(!log.path().exists());
    }
}
