// ============================================================
// Layer 3 — Training History
// ============================================================
// Ordered per-epoch metric snapshots. Append-only: one record
// is pushed after each epoch's evaluation, and the whole list is
// stored in every checkpoint.

use serde::{Deserialize, Serialize};

/// Metrics gathered at the end of one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// 1-based epoch index
    pub epoch: usize,

    pub train_loss: f64,
    pub train_acc:  f64,

    /// Only set when the validation pass is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_acc:  Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    records: Vec<EpochRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EpochRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&EpochRecord> {
        self.records.last()
    }

    pub fn records(&self) -> &[EpochRecord] {
        &self.records
    }

    /// True when records are numbered 1, 2, 3, ... with no gaps
    pub fn is_contiguous(&self) -> bool {
        self.records
            .iter()
            .enumerate()
            .all(|(i, r)| r.epoch == i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(epoch: usize) -> EpochRecord {
        EpochRecord { epoch, train_loss: 1.0, train_acc: 0.5, dev_loss: None, dev_acc: None }
    }

    #[test]
    fn test_contiguity() {
        let mut hist = History::new();
        assert!(hist.is_contiguous());
        hist.push(record(1));
        hist.push(record(2));
        assert!(hist.is_contiguous());
        hist.push(record(4));
        assert!(!hist.is_contiguous());
    }

    #[test]
    fn test_dev_fields_omitted_when_absent() {
        let json = serde_json::to_string(&record(1)).unwrap();
        assert!(!json.contains("dev_loss"));

        let mut with_dev = record(1);
        with_dev.dev_loss = Some(0.7);
        with_dev.dev_acc  = Some(0.25);
        let json = serde_json::to_string(&with_dev).unwrap();
        let back: EpochRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, with_dev);
    }
}
