// ============================================================
// Layer 4 — Clip Loader
// ============================================================
// Reads a dataset directory laid out as:
//
//   <dataset_dir>/
//     dataset.json   ← DatasetMeta (clip shape, class count, labels)
//     train.jsonl    ← one Clip per line
//     dev.jsonl      ← one Clip per line
//
// Every clip is checked against the declared shape as it is read;
// the first bad line aborts the load with its line number.
//
// Reference: Rust Book §9 (Error Handling), §12 (I/O)

use anyhow::{Context, Result};
use std::{
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::domain::{
    clip::Clip,
    traits::{ClipSource, DatasetMeta, Split},
};
use crate::error::TrainError;

pub const META_FILE: &str = "dataset.json";

/// Loads clips from a dataset directory on disk.
pub struct ClipLoader {
    dir: PathBuf,
}

impl ClipLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn split_path(&self, split: Split) -> PathBuf {
        self.dir.join(format!("{}.jsonl", split.name()))
    }

    fn open(path: &Path) -> Result<fs::File> {
        if !path.exists() {
            return Err(TrainError::MissingDataset { path: path.to_path_buf() }.into());
        }
        fs::File::open(path).with_context(|| format!("Cannot open '{}'", path.display()))
    }
}

impl ClipSource for ClipLoader {
    fn meta(&self) -> Result<DatasetMeta> {
        let path = self.dir.join(META_FILE);
        let file = Self::open(&path)?;
        let meta: DatasetMeta = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Cannot parse '{}'", path.display()))?;
        if meta.num_classes == 0 {
            return Err(TrainError::Config(format!(
                "'{}' declares zero classes",
                path.display()
            ))
            .into());
        }
        Ok(meta)
    }

    fn load_split(&self, split: Split, with_flow: bool) -> Result<Vec<Clip>> {
        let meta = self.meta()?;
        let path = self.split_path(split);
        let file = Self::open(&path)?;

        let mut clips = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Cannot read '{}'", path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            let malformed = |reason: String| TrainError::MalformedSample {
                path: path.clone(),
                line: idx + 1,
                reason,
            };
            let clip: Clip = serde_json::from_str(&line).map_err(|e| malformed(e.to_string()))?;
            clip.check(&meta.shape, meta.num_classes, with_flow)
                .map_err(malformed)?;
            clips.push(clip);
        }

        tracing::debug!("Read {} clips from '{}'", clips.len(), path.display());
        Ok(clips)
    }
}
