//#![warn(missing_docs)]
//! # Pixel-Accurate Adaptive Surface Subdivision
//!
//! Estimates per-patch GPU tessellation levels for a bicubic Bézier patch
//! model so that tessellated triangle edges stay close to a target size in
//! pixels, independent of camera distance and angle.
//!
//! The pipeline runs once per frame:
//!
//! 1. [`slefe`] – *Subdivision-Level Error-Function Envelopes*, piecewise
//!    bilinear lower/upper bounds enclosing each patch on a
//!    `divisions × divisions` parameter grid.
//! 2. [`bounds`] – a world-space box per grid point of the envelope.
//! 3. [`projection`] – those boxes projected to window pixels under the
//!    current camera.
//! 4. [`tess_level`] – the largest on-screen envelope width over visible
//!    tiles, turned into a tessellation level and written to the five
//!    level slots of the patch.
//!
//! Steps 1 and 2 only depend on the control points and the number of
//! divisions and are cached; [`dirty`] tracks when they are stale. Step 3
//! and 4 run every frame. [`TessellationEstimatorState`] owns all of it.
//!
//! ```
//! use ipass::{
//!     camera::OrbitCamera, mesh::PatchMesh, projection::Viewport, EstimatorOptions,
//!     TessellationEstimatorState,
//! };
//!
//! let mesh = PatchMesh::lattice(2, 1.0, |_, _| 0.0).unwrap();
//! let mut state = TessellationEstimatorState::new(mesh, EstimatorOptions::default()).unwrap();
//!
//! let viewport = Viewport::new(800, 600).unwrap();
//! let frame = OrbitCamera::default().frame_input(viewport);
//! let stats = state.update(&frame).unwrap();
//!
//! assert_eq!(state.levels().len(), state.mesh().vertices_len());
//! assert!(stats.max_level >= 1.0);
//! ```
//!
//! ## Features
#![doc = document_features::document_features!()]

pub mod animation;
pub mod bezier;
pub mod bounds;
pub mod camera;
pub mod dirty;
pub mod error;
pub mod estimator;
pub mod grid;
pub mod mesh;
pub mod projection;
pub mod slefe;
pub mod tess_level;

pub use error::{Error, Result};
pub use estimator::{EstimatorOptions, FrameInput, FrameStats, PatchRange, TessellationEstimatorState};

use derive_more::{Display, From, Into};

/// Smallest supported number of divisions per parametric axis.
pub const MIN_DIVISIONS: usize = 2;

/// Largest supported number of divisions per parametric axis.
pub const MAX_DIVISIONS: usize = 9;

/// A vertex index into the global control point array.
///
/// # Examples
///
/// ```
/// use ipass::Index;
///
/// let idx = Index::from(42u32);
/// assert_eq!(idx.0, 42);
///
/// let value: u32 = idx.into();
/// assert_eq!(value, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
#[repr(transparent)]
pub struct Index(pub u32);

impl From<usize> for Index {
    fn from(value: usize) -> Self {
        Index(value as u32)
    }
}

impl From<Index> for usize {
    fn from(index: Index) -> Self {
        index.0 as usize
    }
}

/// Addresses one envelope grid point of one patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("patch {patch} ({u}, {v})")]
pub struct GridKey {
    pub patch: usize,
    pub u: usize,
    pub v: usize,
}

impl GridKey {
    pub fn new(patch: usize, u: usize, v: usize) -> Self {
        Self { patch, u, v }
    }
}

#[cfg(doctest)]
#[doc = include_str!("../README.md")]
pub struct ReadmeDoctests;
