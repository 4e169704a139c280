use burn::data::dataset::Dataset;

use crate::domain::clip::Clip;

/// In-memory clip collection handed to Burn's DataLoader.
pub struct ClipDataset {
    clips: Vec<Clip>,
}

impl ClipDataset {
    pub fn new(clips: Vec<Clip>) -> Self { Self { clips } }

    pub fn clip_count(&self) -> usize { self.clips.len() }
}

impl Dataset<Clip> for ClipDataset {
    fn get(&self, index: usize) -> Option<Clip> {
        self.clips.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.clips.len()
    }
}
