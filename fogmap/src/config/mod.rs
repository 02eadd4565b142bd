//! Tracker configuration.
//!
//! `TrackerConfig` bundles every knob the reveal pipeline recognizes: buffer
//! radius and shape, the overlap policy, and the render colors forwarded on
//! add-region commands. Policy lives here rather than in the coverage index
//! so the index stays pure mechanism.

use crate::buffer::{BufferShape, BufferSpec};
use crate::coverage::OverlapPolicy;

/// Default buffer radius in meters.
pub const DEFAULT_RADIUS_METERS: f64 = 15.0;

/// Default polygon fill color (ARGB).
pub const DEFAULT_FILL_COLOR: u32 = 0xffaa_0000;

/// Default polygon stroke color (ARGB, fully transparent).
pub const DEFAULT_STROKE_COLOR: u32 = 0x0000_0000;

/// Configuration for the reveal tracker pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    /// Buffer generation parameters (radius + shape).
    pub buffer: BufferSpec,

    /// Overlap policy applied to each proposed region.
    pub policy: OverlapPolicy,

    /// Fill color forwarded on add-region render commands (ARGB).
    pub fill_color: u32,

    /// Stroke color forwarded on add-region render commands (ARGB).
    pub stroke_color: u32,

    /// Emit a debug marker command for every accepted fix.
    pub debug_markers: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            buffer: BufferSpec::new(DEFAULT_RADIUS_METERS, BufferShape::Square),
            policy: OverlapPolicy::default(),
            fill_color: DEFAULT_FILL_COLOR,
            stroke_color: DEFAULT_STROKE_COLOR,
            debug_markers: false,
        }
    }
}

impl TrackerConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the buffer radius in meters.
    pub fn with_radius_meters(mut self, radius_meters: f64) -> Self {
        self.buffer.radius_meters = radius_meters;
        self
    }

    /// Set the buffer shape.
    pub fn with_shape(mut self, shape: BufferShape) -> Self {
        self.buffer.shape = shape;
        self
    }

    /// Set the overlap policy.
    pub fn with_policy(mut self, policy: OverlapPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the render colors (fill, stroke).
    pub fn with_colors(mut self, fill_color: u32, stroke_color: u32) -> Self {
        self.fill_color = fill_color;
        self.stroke_color = stroke_color;
        self
    }

    /// Enable or disable debug marker emission.
    pub fn with_debug_markers(mut self, enabled: bool) -> Self {
        self.debug_markers = enabled;
        self
    }
}
