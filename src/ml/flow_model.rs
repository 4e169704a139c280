// ============================================================
// Layer 5 — Two-Stream Model (frames + optical flow)
// ============================================================
// One conv tower per stream:
//   frame tower: 1 channel,  D   frames
//   flow tower:  2 channels, D-1 flow fields (x, y)
// Flattened features are concatenated and fed through the same
// fully connected head as the frame-only model.

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

use crate::error::TrainError;
use crate::ml::blocks::{tower_features, ConvTower};
use crate::ml::model::ActionClassifier;

pub const FLOW_CHANNELS: usize = 2;

#[derive(Config, Debug)]
pub struct BlockFrameFlowConvNetConfig {
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

impl BlockFrameFlowConvNetConfig {
    /// (frame features, flow features)
    pub fn features(&self) -> Result<(usize, usize), TrainError> {
        let frame = tower_features(self.conv2_channels, self.frames, self.height, self.width)?;
        let flow  = tower_features(
            self.conv2_channels,
            self.frames.saturating_sub(1),
            self.height,
            self.width,
        )?;
        Ok((frame, flow))
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<BlockFrameFlowConvNet<B>, TrainError> {
        let (frame_features, flow_features) = self.features()?;
        let channels = |c_in| [c_in, self.conv1_channels, self.conv2_channels];
        Ok(BlockFrameFlowConvNet {
            frame_tower: ConvTower::new(channels(1), self.dropout, device),
            flow_tower:  ConvTower::new(channels(FLOW_CHANNELS), self.dropout, device),
            fc1:         LinearConfig::new(frame_features + flow_features, self.hidden).init(device),
            fc2:         LinearConfig::new(self.hidden, self.num_classes).init(device),
            dropout:     DropoutConfig::new(self.dropout).init(),
            flow_features,
        })
    }
}

#[derive(Module, Debug)]
pub struct BlockFrameFlowConvNet<B: Backend> {
    pub frame_tower:   ConvTower<B>,
    pub flow_tower:    ConvTower<B>,
    pub fc1:           Linear<B>,
    pub fc2:           Linear<B>,
    pub dropout:       Dropout,
    pub flow_features: usize,
}

impl<B: Backend> BlockFrameFlowConvNet<B> {
    pub fn forward(&self, frames: Tensor<B, 5>, flow: Tensor<B, 5>) -> Tensor<B, 2> {
        let x = Tensor::cat(
            vec![self.frame_tower.forward(frames), self.flow_tower.forward(flow)],
            1,
        );
        self.head(x)
    }

    fn head(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.dropout.forward(relu(self.fc1.forward(x)));
        self.fc2.forward(x)
    }
}

impl<B: Backend> ActionClassifier<B> for BlockFrameFlowConvNet<B> {
    fn classify(&self, frames: Tensor<B, 5>, flow: Option<Tensor<B, 5>>) -> Tensor<B, 2> {
        match flow {
            Some(flow) => self.forward(frames, flow),
            // Batches without flow contribute a zero flow embedding
            None => {
                let frame = self.frame_tower.forward(frames);
                let [n, _] = frame.dims();
                let zeros  = Tensor::zeros([n, self.flow_features], &frame.device());
                self.head(Tensor::cat(vec![frame, zeros], 1))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn small() -> BlockFrameFlowConvNetConfig {
        BlockFrameFlowConvNetConfig::new(5)
            .with_frames(11)
            .with_height(10)
            .with_width(10)
            .with_conv1_channels(2)
            .with_conv2_channels(3)
            .with_hidden(8)
    }

    #[test]
    fn test_default_features_per_stream() {
        let (frame, flow) = BlockFrameFlowConvNetConfig::new(6).features().unwrap();
        assert_eq!(frame, 29952);
        // 14 flow fields → depth 2 after both stages
        assert_eq!(flow, 29952);
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model: BlockFrameFlowConvNet<TestBackend> = small().init(&device).unwrap();
        let frames = Tensor::<TestBackend, 5>::ones([2, 1, 11, 10, 10], &device);
        let flow   = Tensor::<TestBackend, 5>::ones([2, 2, 10, 10, 10], &device);
        assert_eq!(model.classify(frames.clone(), Some(flow)).dims(), [2, 5]);
        assert_eq!(model.classify(frames, None).dims(), [2, 5]);
    }

    #[test]
    fn test_flow_stream_needs_enough_frames() {
        // 10 frames leave only 9 flow fields
        let cfg = small().with_frames(10);
        assert!(matches!(
            cfg.init::<TestBackend>(&Default::default()),
            Err(TrainError::InputTooSmall { axis: "depth", extent: 9 })
        ));
    }
}
