// ============================================================
// Layer 5 — 3D Max Pooling
// ============================================================
// Burn ships 1D/2D pooling only. Volumetric max pooling with a
// cubic kernel and stride equal to the kernel is split in two:
//
//   [N, C, D, H, W]
//     → crop depth to a multiple of k
//     → max_pool2d over H, W on [N, C*D, H, W]
//     → reshape to [N, C, D/k, k, H/k * W/k], move the k axis last
//     → max over the last axis
//     → reshape to [N, C, D/k, H/k, W/k]
//
// Every reduction runs over the last axis and stays within five
// dimensions, which the NdArray backend needs for its backward pass.
// Trailing elements that do not fill a window are dropped
// (floor semantics).

use burn::{prelude::*, tensor::module::max_pool2d};

#[derive(Module, Clone, Debug)]
pub struct MaxPool3d {
    pub kernel: usize,
}

impl MaxPool3d {
    pub fn new(kernel: usize) -> Self {
        Self { kernel: kernel.max(1) }
    }

    /// Output extent along one axis
    pub fn extent(&self, input: usize) -> usize {
        input / self.kernel
    }

    pub fn forward<B: Backend>(&self, x: Tensor<B, 5>) -> Tensor<B, 5> {
        let [n, c, d, h, w] = x.dims();
        let k = self.kernel;
        let (od, oh, ow) = (d / k, h / k, w / k);

        // ── Height and width ──
        let planes = x
            .slice([0..n, 0..c, 0..od * k, 0..h, 0..w])
            .reshape([n, c * od * k, h, w]);
        let planes = max_pool2d(planes, [k, k], [k, k], [0, 0], [1, 1]);

        // ── Depth ──
        planes
            .reshape([n, c, od, k, oh * ow])
            .swap_dims(3, 4)
            .max_dim(4)
            .reshape([n, c, od, oh, ow])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = NdArray<f32>;
    type TrainBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_picks_window_maximum() {
        let device = Default::default();
        // [1, 1, 2, 2, 4] with values 0..16
        let values: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let x = Tensor::<TestBackend, 1>::from_floats(values.as_slice(), &device)
            .reshape([1, 1, 2, 2, 4]);

        let out = MaxPool3d::new(2).forward(x);
        assert_eq!(out.dims(), [1, 1, 1, 1, 2]);
        let got: Vec<f32> = out.into_data().to_vec().unwrap();
        assert_eq!(got, vec![13.0, 15.0]);
    }

    #[test]
    fn test_odd_extent_floors() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 5>::ones([2, 3, 5, 7, 4], &device);
        let out = MaxPool3d::new(2).forward(x);
        assert_eq!(out.dims(), [2, 3, 2, 3, 2]);
    }

    #[test]
    fn test_gradient_flows_to_window_maxima() {
        let device = Default::default();
        let values: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let x = Tensor::<TrainBackend, 1>::from_floats(values.as_slice(), &device)
            .reshape([1, 1, 2, 2, 4])
            .require_grad();

        let grads = MaxPool3d::new(2).forward(x.clone()).sum().backward();
        let grad: Vec<f32> = x.grad(&grads).unwrap().into_data().to_vec().unwrap();

        let mut expected = vec![0.0; 16];
        expected[13] = 1.0;
        expected[15] = 1.0;
        assert_eq!(grad, expected);
    }

    #[test]
    fn test_backward_on_odd_extent() {
        let device = Default::default();
        let x = Tensor::<TrainBackend, 5>::random([2, 3, 5, 7, 4], burn::tensor::Distribution::Default, &device)
            .require_grad();
        let grads = MaxPool3d::new(2).forward(x.clone()).sum().backward();
        assert_eq!(x.grad(&grads).unwrap().dims(), [2, 3, 5, 7, 4]);
    }
}
