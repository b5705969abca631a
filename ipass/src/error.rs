//! Error types for the ipass crate.

use crate::GridKey;
use derive_more::Display;
use thiserror::Error;

/// Pipeline stage that produced a non-finite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    /// Envelope (SLEFE) computation.
    #[display("SLEFE bounds")]
    Slefe,
    /// World-space bounding box construction.
    #[display("world boxes")]
    WorldBoxes,
}

/// Main error type for ipass operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Subdivision count outside the supported range.
    #[error("Invalid number of divisions {divisions} (supported: {min}..={max})")]
    Configuration {
        divisions: usize,
        min: usize,
        max: usize,
    },

    /// Viewport with a zero dimension.
    #[error("Invalid viewport {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },

    /// Active patch range reaching past the end of the mesh.
    #[error("Patch range {start}+{count} exceeds patch count {patches}")]
    InvalidPatchRange {
        start: usize,
        count: usize,
        patches: usize,
    },

    /// Tessellation level limits that are negative or inverted.
    #[error("Invalid tessellation level limits [{min}, {max}]")]
    InvalidLevelLimits { min: f32, max: f32 },

    /// `NaN` or infinity in derived geometry.
    #[error("Non-finite value in {stage} at {key}")]
    NumericAnomaly { key: GridKey, stage: Stage },

    /// Index out of bounds.
    #[error("Index {index} out of bounds (max: {max})")]
    IndexOutOfBounds { index: usize, max: usize },

    /// Invalid buffer size.
    #[error("Invalid buffer size: expected a multiple of {expected}, got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
