// ============================================================
// Layer 4 — Clip Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<Clip> into the
// tensors the models consume.
//
// How batching works here:
//   Input:  N clips of shape (D, H, W) [+ flow (D-1, H, W) × 2]
//   Output: frames [N, 1, D, H, W]
//           flow   [N, 2, D-1, H, W]   (x channel then y channel)
//           labels [N]
//
// Every clip already matches the dataset shape (checked by the
// loader), so flattening and reshaping is all that is needed.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::clip::{Clip, ClipShape};

// ─── ClipBatch ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ClipBatch<B: Backend> {
    /// Stacked frames, shape: [batch_size, 1, frames, height, width]
    pub frames: Tensor<B, 5>,

    /// Optical flow, shape: [batch_size, 2, frames - 1, height, width]
    pub flow: Option<Tensor<B, 5>>,

    /// Ground-truth class per clip, shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

// ─── ClipBatcher ──────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ClipBatcher<B: Backend> {
    pub device:    B::Device,
    pub shape:     ClipShape,
    /// Collate the flow channels as well (two-stream model)
    pub with_flow: bool,
}

impl<B: Backend> ClipBatcher<B> {
    pub fn new(device: B::Device, shape: ClipShape, with_flow: bool) -> Self {
        Self { device, shape, with_flow }
    }
}

impl<B: Backend> Batcher<Clip, ClipBatch<B>> for ClipBatcher<B> {
    fn batch(&self, items: Vec<Clip>) -> ClipBatch<B> {
        let batch_size = items.len();
        let ClipShape { frames, height, width } = self.shape;

        let frames_flat: Vec<f32> = items
            .iter()
            .flat_map(|c| c.frames.iter().copied())
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|c| c.label as i32)
            .collect();

        let frames_t = Tensor::<B, 1>::from_floats(
            frames_flat.as_slice(), &self.device
        ).reshape([batch_size, 1, frames, height, width]);

        // Per clip: all x values, then all y values → channel-major
        let flow = (self.with_flow && items.iter().all(|c| c.flow.is_some())).then(|| {
            let flow_flat: Vec<f32> = items
                .iter()
                .filter_map(|c| c.flow.as_ref())
                .flat_map(|f| f.x.iter().chain(f.y.iter()).copied())
                .collect();
            Tensor::<B, 1>::from_floats(flow_flat.as_slice(), &self.device)
                .reshape([batch_size, 2, self.shape.flow_depth(), height, width])
        });

        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ClipBatch { frames: frames_t, flow, labels }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clip::FlowField;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_batch_shapes() {
        let shape = ClipShape::new(3, 2, 2);
        let flow  = || Some(FlowField { x: vec![1.0; 8], y: vec![2.0; 8] });
        let items = vec![
            Clip::new(0, vec![0.0; 12], flow()),
            Clip::new(4, vec![1.0; 12], flow()),
        ];
        let batcher = ClipBatcher::<TestBackend>::new(Default::default(), shape, true);
        let batch   = batcher.batch(items);

        assert_eq!(batch.frames.dims(), [2, 1, 3, 2, 2]);
        assert_eq!(batch.flow.as_ref().map(|f| f.dims()), Some([2, 2, 2, 2, 2]));
        let labels: Vec<i64> = batch.labels.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(labels, vec![0, 4]);
    }

    #[test]
    fn test_flow_channels_are_x_then_y() {
        let shape = ClipShape::new(2, 1, 1);
        let items = vec![Clip::new(
            0,
            vec![0.0; 2],
            Some(FlowField { x: vec![1.0], y: vec![2.0] }),
        )];
        let batch = ClipBatcher::<TestBackend>::new(Default::default(), shape, true).batch(items);
        let flow: Vec<f32> = batch.flow.unwrap().into_data().to_vec().unwrap();
        assert_eq!(flow, vec![1.0, 2.0]);
    }

    #[test]
    fn test_frame_only_batcher_skips_flow() {
        let shape = ClipShape::new(2, 1, 1);
        let items = vec![Clip::new(
            1,
            vec![0.5; 2],
            Some(FlowField { x: vec![1.0], y: vec![2.0] }),
        )];
        let batch = ClipBatcher::<TestBackend>::new(Default::default(), shape, false).batch(items);
        assert!(batch.flow.is_none());
    }
}
