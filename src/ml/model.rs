use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

use crate::error::TrainError;
use crate::ml::blocks::{tower_features, ConvTower};

/// Anything that maps a clip batch to per-class logits.
/// Implemented by both architectures, for training and inference backends alike.
pub trait ActionClassifier<B: Backend> {
    /// frames: [N, 1, D, H, W], flow: [N, 2, D-1, H, W] → logits: [N, num_classes]
    fn classify(&self, frames: Tensor<B, 5>, flow: Option<Tensor<B, 5>>) -> Tensor<B, 2>;
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct BlockFrameConvNetConfig {
    pub num_classes: usize,
    #[config(default = 15)]
    pub frames: usize,
    #[config(default = 60)]
    pub height: usize,
    #[config(default = 80)]
    pub width: usize,
    #[config(default = 32)]
    pub conv1_channels: usize,
    #[config(default = 64)]
    pub conv2_channels: usize,
    #[config(default = 128)]
    pub hidden: usize,
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl BlockFrameConvNetConfig {
    /// Length of the flattened feature vector entering fc1
    pub fn features(&self) -> Result<usize, TrainError> {
        tower_features(self.conv2_channels, self.frames, self.height, self.width)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<BlockFrameConvNet<B>, TrainError> {
        let features = self.features()?;
        Ok(BlockFrameConvNet {
            tower:   ConvTower::new([1, self.conv1_channels, self.conv2_channels], self.dropout, device),
            fc1:     LinearConfig::new(features, self.hidden).init(device),
            fc2:     LinearConfig::new(self.hidden, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        })
    }
}

/// Frame-only 3D ConvNet: two conv-pool blocks, then two fully connected layers.
#[derive(Module, Debug)]
pub struct BlockFrameConvNet<B: Backend> {
    pub tower:   ConvTower<B>,
    pub fc1:     Linear<B>,
    pub fc2:     Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> BlockFrameConvNet<B> {
    /// frames: [batch, 1, frames, height, width] → logits: [batch, num_classes]
    pub fn forward(&self, frames: Tensor<B, 5>) -> Tensor<B, 2> {
        let x = self.tower.forward(frames);
        let x = self.dropout.forward(relu(self.fc1.forward(x)));
        self.fc2.forward(x)
    }
}

impl<B: Backend> ActionClassifier<B> for BlockFrameConvNet<B> {
    fn classify(&self, frames: Tensor<B, 5>, _flow: Option<Tensor<B, 5>>) -> Tensor<B, 2> {
        self.forward(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_default_feature_count() {
        // 15 frames of 60x80 → 64 × 2 × 13 × 18
        let cfg = BlockFrameConvNetConfig::new(6);
        assert_eq!(cfg.features().unwrap(), 29952);
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let cfg = BlockFrameConvNetConfig::new(6)
            .with_frames(10)
            .with_height(10)
            .with_width(12)
            .with_conv1_channels(2)
            .with_conv2_channels(4)
            .with_hidden(8);
        let model: BlockFrameConvNet<TestBackend> = cfg.init(&device).unwrap();
        let frames = Tensor::<TestBackend, 5>::ones([3, 1, 10, 10, 12], &device);
        assert_eq!(model.classify(frames, None).dims(), [3, 6]);
    }

    #[test]
    fn test_rejects_small_input() {
        let cfg = BlockFrameConvNetConfig::new(6).with_height(8);
        let err = cfg.init::<TestBackend>(&Default::default()).unwrap_err();
        assert!(matches!(err, TrainError::InputTooSmall { axis: "height", extent: 8 }));
    }

    #[test]
    fn test_config_survives_json() {
        let cfg  = BlockFrameConvNetConfig::new(4).with_frames(12);
        let json = serde_json::to_value(&cfg).unwrap();
        let back: BlockFrameConvNetConfig = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(serde_json::to_value(&back).unwrap(), json);
    }
}
