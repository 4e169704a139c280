// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per epoch next to the checkpoints.
//
// Output file: <checkpoint dir>/metrics.csv
//
//   epoch,train_loss,train_acc,dev_loss,dev_acc
//   1,1.702114,0.312500,1.731902,0.250000
//   2,1.514330,0.437500,,
//
// Dev columns are left empty when validation is off. Opening the
// logger rewrites the file from the history the run starts with, so
// a run resumed at epoch k drops any rows for epochs k and later
// left behind by an earlier run.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::history::{EpochRecord, History};

const HEADER: &str = "epoch,train_loss,train_acc,dev_loss,dev_acc";

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the directory and write the header plus one row per
    /// record in `history`.
    pub fn new(dir: &Path, history: &History) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "{HEADER}")?;
        for r in history.records() {
            write_row(&mut f, r)?;
        }
        tracing::debug!(
            "Started metrics CSV '{}' with {} rows",
            csv_path.display(),
            history.len()
        );

        Ok(Self { csv_path })
    }

    pub fn log(&self, r: &EpochRecord) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        write_row(&mut f, r)
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

fn write_row(out: &mut impl Write, r: &EpochRecord) -> Result<()> {
    let opt = |v: Option<f64>| v.map(|v| format!("{v:.6}")).unwrap_or_default();
    writeln!(
        out,
        "{},{:.6},{:.6},{},{}",
        r.epoch,
        r.train_loss,
        r.train_acc,
        opt(r.dev_loss),
        opt(r.dev_acc),
    )?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn rec(epoch: usize, dev: Option<f64>) -> EpochRecord {
        EpochRecord {
            epoch,
            train_loss: 1.5,
            train_acc:  0.25,
            dev_loss:   dev,
            dev_acc:    dev,
        }
    }

    #[test]
    fn test_rows_follow_single_header() {
        let tmp    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path(), &History::new()).unwrap();
        logger.log(&rec(1, Some(0.5))).unwrap();
        logger.log(&rec(2, None)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![
            HEADER,
            "1,1.500000,0.250000,0.500000,0.500000",
            "2,1.500000,0.250000,,",
        ]);
    }

    #[test]
    fn test_reopening_keeps_only_restored_history() {
        let tmp    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path(), &History::new()).unwrap();
        for epoch in 1..=3 {
            logger.log(&rec(epoch, None)).unwrap();
        }

        // resume at epoch 2 from the epoch-1 checkpoint
        let mut restored = History::new();
        restored.push(rec(1, None));
        let logger = MetricsLogger::new(tmp.path(), &restored).unwrap();
        logger.log(&rec(2, Some(0.5))).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![
            HEADER,
            "1,1.500000,0.250000,,",
            "2,1.500000,0.250000,0.500000,0.500000",
        ]);
    }
}
