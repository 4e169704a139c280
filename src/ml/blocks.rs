// ============================================================
// Layer 5 — Convolutional Building Blocks
// ============================================================
// ConvBlock:  Conv3d(k=3) → BatchNorm → ReLU → MaxPool3d(2) → Dropout
// ConvTower:  two ConvBlocks, C_in → C1 → C2
//
// Both models are built from towers: the frame-only model has one,
// the two-stream model has one per stream.

use burn::{
    nn::{
        conv::{Conv3d, Conv3dConfig},
        BatchNorm, BatchNormConfig,
        Dropout, DropoutConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::error::TrainError;
use crate::ml::pool::MaxPool3d;

pub const KERNEL: usize = 3;
pub const POOL:   usize = 2;

/// Extent after one valid convolution and one pooling step,
/// or None when the input cannot survive the stage.
fn stage_extent(extent: usize) -> Option<usize> {
    extent
        .checked_sub(KERNEL - 1)
        .map(|e| e / POOL)
        .filter(|&e| e > 0)
}

/// Output extent of a two-block tower along one axis
pub fn tower_extent(axis: &'static str, extent: usize) -> Result<usize, TrainError> {
    stage_extent(extent)
        .and_then(stage_extent)
        .ok_or(TrainError::InputTooSmall { axis, extent })
}

#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv:    Conv3d<B>,
    pub norm:    BatchNorm<B, 3>,
    pub pool:    MaxPool3d,
    pub dropout: Dropout,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(channels_in: usize, channels_out: usize, dropout: f64, device: &B::Device) -> Self {
        Self {
            conv:    Conv3dConfig::new([channels_in, channels_out], [KERNEL; 3]).init(device),
            norm:    BatchNormConfig::new(channels_out).init(device),
            pool:    MaxPool3d::new(POOL),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 5>) -> Tensor<B, 5> {
        let x = self.conv.forward(x);
        let x = relu(self.norm.forward(x));
        self.dropout.forward(self.pool.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct ConvTower<B: Backend> {
    pub block1: ConvBlock<B>,
    pub block2: ConvBlock<B>,
}

impl<B: Backend> ConvTower<B> {
    pub fn new(channels: [usize; 3], dropout: f64, device: &B::Device) -> Self {
        let [c_in, c1, c2] = channels;
        Self {
            block1: ConvBlock::new(c_in, c1, dropout, device),
            block2: ConvBlock::new(c1, c2, dropout, device),
        }
    }

    /// [N, C_in, D, H, W] → [N, C2 * D' * H' * W']
    pub fn forward(&self, x: Tensor<B, 5>) -> Tensor<B, 2> {
        self.block2.forward(self.block1.forward(x)).flatten(1, 4)
    }
}

/// Flattened feature count of a tower for the given input volume
pub fn tower_features(out_channels: usize, depth: usize, height: usize, width: usize) -> Result<usize, TrainError> {
    Ok(out_channels
        * tower_extent("depth", depth)?
        * tower_extent("height", height)?
        * tower_extent("width", width)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_tower_extent() {
        assert_eq!(tower_extent("depth", 15).unwrap(), 2);
        assert_eq!(tower_extent("height", 60).unwrap(), 13);
        assert_eq!(tower_extent("width", 80).unwrap(), 18);
        assert_eq!(tower_extent("depth", 10).unwrap(), 1);
        assert!(matches!(
            tower_extent("depth", 9),
            Err(TrainError::InputTooSmall { axis: "depth", extent: 9 })
        ));
    }

    #[test]
    fn test_tower_output_matches_feature_count() {
        let device = Default::default();
        let tower  = ConvTower::<TestBackend>::new([2, 3, 4], 0.5, &device);
        let x      = Tensor::<TestBackend, 5>::zeros([2, 2, 11, 10, 12], &device);
        let out    = tower.forward(x);
        assert_eq!(out.dims(), [2, tower_features(4, 11, 10, 12).unwrap()]);
    }
}
