// ============================================================
// Layer 4 — Zero-Centering
// ============================================================
// Subtracts a per-channel mean from every clip. The mean is
// computed once from the training split and applied unchanged to
// both the training and the dev split.
//
// Channels:
//   - frames  (the single grayscale channel)
//   - flow_x  (horizontal optical flow, two-stream data only)
//   - flow_y  (vertical optical flow, two-stream data only)
//
// The mean is stored in every checkpoint so a resumed run or a
// later `evaluate` applies exactly the same shift.

use serde::{Deserialize, Serialize};

use crate::domain::clip::Clip;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelMean {
    pub frames: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<[f32; 2]>,
}

impl ChannelMean {
    /// Mean of every channel over all clips.
    /// Flow means are only produced when every clip carries flow.
    pub fn compute(clips: &[Clip]) -> Self {
        let mut frame_sum   = 0.0f64;
        let mut frame_count = 0usize;
        let mut flow_sum    = [0.0f64; 2];
        let mut flow_count  = 0usize;
        let all_flow        = !clips.is_empty() && clips.iter().all(|c| c.flow.is_some());

        for clip in clips {
            frame_sum   += clip.frames.iter().map(|&v| v as f64).sum::<f64>();
            frame_count += clip.frames.len();

            if let (true, Some(flow)) = (all_flow, &clip.flow) {
                flow_sum[0] += flow.x.iter().map(|&v| v as f64).sum::<f64>();
                flow_sum[1] += flow.y.iter().map(|&v| v as f64).sum::<f64>();
                flow_count  += flow.x.len();
            }
        }

        let mean = |sum: f64, count: usize| {
            if count > 0 { (sum / count as f64) as f32 } else { 0.0 }
        };

        Self {
            frames: mean(frame_sum, frame_count),
            flow:   all_flow.then(|| [mean(flow_sum[0], flow_count), mean(flow_sum[1], flow_count)]),
        }
    }

    /// Subtract this mean from every clip in place.
    pub fn apply(&self, clips: &mut [Clip]) {
        for clip in clips.iter_mut() {
            clip.frames.iter_mut().for_each(|v| *v -= self.frames);

            if let (Some([mx, my]), Some(flow)) = (self.flow, clip.flow.as_mut()) {
                flow.x.iter_mut().for_each(|v| *v -= mx);
                flow.y.iter_mut().for_each(|v| *v -= my);
            }
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clip::FlowField;

    fn flow(x: f32, y: f32) -> Option<FlowField> {
        Some(FlowField { x: vec![x; 2], y: vec![y; 2] })
    }

    #[test]
    fn test_frame_mean() {
        let clips = vec![
            Clip::new(0, vec![1.0, 3.0], None),
            Clip::new(1, vec![5.0, 7.0], None),
        ];
        let mean = ChannelMean::compute(&clips);
        assert!((mean.frames - 4.0).abs() < 1e-6);
        assert_eq!(mean.flow, None);
    }

    #[test]
    fn test_flow_mean_and_apply() {
        let mut clips = vec![
            Clip::new(0, vec![1.0, 1.0], flow(2.0, -1.0)),
            Clip::new(1, vec![3.0, 3.0], flow(4.0, -3.0)),
        ];
        let mean = ChannelMean::compute(&clips);
        assert_eq!(mean.flow, Some([3.0, -2.0]));

        mean.apply(&mut clips);
        let centred = ChannelMean::compute(&clips);
        assert!(centred.frames.abs() < 1e-6);
        let [mx, my] = centred.flow.unwrap();
        assert!(mx.abs() < 1e-6 && my.abs() < 1e-6);
    }

    #[test]
    fn test_partial_flow_yields_no_flow_mean() {
        let clips = vec![
            Clip::new(0, vec![0.0, 0.0], flow(1.0, 1.0)),
            Clip::new(1, vec![0.0, 0.0], None),
        ];
        assert_eq!(ChannelMean::compute(&clips).flow, None);
    }

    #[test]
    fn test_empty_input() {
        let mean = ChannelMean::compute(&[]);
        assert_eq!(mean.frames, 0.0);
        assert_eq!(mean.flow, None);
    }
}
