// ============================================================
// Layer 3 — Clip Domain Type
// ============================================================
// One labelled sample: a block of stacked grayscale frames and,
// for the two-stream model, the optical flow between consecutive
// frames.
//
// Tensors are stored flat, row-major in (depth, height, width)
// order. A clip with D frames carries D-1 flow fields per axis.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// Spatio-temporal extent of one clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipShape {
    /// Number of stacked frames (the depth axis of the 3D convolution)
    pub frames: usize,
    pub height: usize,
    pub width:  usize,
}

impl ClipShape {
    pub fn new(frames: usize, height: usize, width: usize) -> Self {
        Self { frames, height, width }
    }

    /// Values in the frame block: frames × height × width
    pub fn frame_len(&self) -> usize {
        self.frames * self.height * self.width
    }

    /// Depth of the flow block: one field between each frame pair
    pub fn flow_depth(&self) -> usize {
        self.frames.saturating_sub(1)
    }

    /// Values in one flow axis: (frames - 1) × height × width
    pub fn flow_len(&self) -> usize {
        self.flow_depth() * self.height * self.width
    }
}

/// Horizontal and vertical optical flow for a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowField {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
}

/// A labelled clip as stored on disk (one JSON line per clip).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub label: usize,

    pub frames: Vec<f32>,

    /// Present only in datasets prepared for the two-stream model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<FlowField>,
}

impl Clip {
    pub fn new(label: usize, frames: Vec<f32>, flow: Option<FlowField>) -> Self {
        Self { label, frames, flow }
    }

    /// Check this clip against the declared dataset shape.
    /// Returns a human-readable reason on mismatch.
    pub fn check(&self, shape: &ClipShape, num_classes: usize, require_flow: bool) -> Result<(), String> {
        if self.label >= num_classes {
            return Err(format!("label {} out of range for {} classes", self.label, num_classes));
        }
        if self.frames.len() != shape.frame_len() {
            return Err(format!(
                "expected {} frame values, found {}",
                shape.frame_len(),
                self.frames.len()
            ));
        }
        match &self.flow {
            Some(flow) => {
                if flow.x.len() != shape.flow_len() || flow.y.len() != shape.flow_len() {
                    return Err(format!(
                        "expected {} flow values per axis, found x={} y={}",
                        shape.flow_len(),
                        flow.x.len(),
                        flow.y.len()
                    ));
                }
            }
            None if require_flow => return Err("missing optical flow".to_string()),
            None => {}
        }
        Ok(())
    }
}
