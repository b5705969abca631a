//! # Patch Mesh
//!
//! The immutable input model: a global vertex array and a list of bicubic
//! patches, each a 4×4 grid of indices into that array.

use crate::{Error, Index, Result};
use slice_of_array::prelude::*;
use ultraviolet::Vec3;

/// Number of control points of a bicubic patch.
pub const CONTROL_POINTS_PER_PATCH: usize = 16;

/// A bicubic Bézier patch.
///
/// Control point `(row, col)` sits at slot `row * 4 + col`; `row` runs along
/// the `u` parameter, `col` along `v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Patch {
    control_points: [Index; CONTROL_POINTS_PER_PATCH],
}

impl Patch {
    pub fn new(control_points: [Index; CONTROL_POINTS_PER_PATCH]) -> Self {
        Self { control_points }
    }

    pub fn control_point(&self, row: usize, col: usize) -> Index {
        self.control_points[row * 4 + col]
    }

    pub fn control_points(&self) -> &[Index; CONTROL_POINTS_PER_PATCH] {
        &self.control_points
    }
}

/// Vertex positions plus the patches referencing them.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchMesh {
    positions: Vec<Vec3>,
    patches: Vec<Patch>,
}

impl PatchMesh {
    /// Create a mesh, checking every patch index against the vertex count.
    ///
    /// `patch_indices` holds 16 indices per patch in row-major order.
    pub fn new(positions: &[[f32; 3]], patch_indices: &[u32]) -> Result<Self> {
        if patch_indices.len() % CONTROL_POINTS_PER_PATCH != 0 {
            return Err(Error::InvalidBufferSize {
                expected: CONTROL_POINTS_PER_PATCH,
                actual: patch_indices.len(),
            });
        }

        if let Some(&index) = patch_indices
            .iter()
            .find(|&&index| positions.len() <= index as usize)
        {
            return Err(Error::IndexOutOfBounds {
                index: index as usize,
                max: positions.len().saturating_sub(1),
            });
        }

        let patches = patch_indices
            .nest::<[_; CONTROL_POINTS_PER_PATCH]>()
            .iter()
            .map(|indices| Patch::new((*indices).map(Index::from)))
            .collect();

        Ok(Self {
            positions: positions.iter().map(|&p| Vec3::from(p)).collect(),
            patches,
        })
    }

    /// Create a mesh from a flat `x, y, z, x, y, z, …` vertex buffer.
    pub fn from_flat(vertices: &[f32], patch_indices: &[u32]) -> Result<Self> {
        if vertices.len() % 3 != 0 {
            return Err(Error::InvalidBufferSize {
                expected: 3,
                actual: vertices.len(),
            });
        }
        Self::new(vertices.nest::<[_; 3]>(), patch_indices)
    }

    /// A C⁰ grid of `patches_per_side²` patches over a shared control lattice
    /// spanning `[-extent, extent]²` in `x`/`y`, with `z = height(x, y)`.
    ///
    /// Neighboring patches share their boundary control points.
    pub fn lattice(
        patches_per_side: usize,
        extent: f32,
        height: impl Fn(f32, f32) -> f32,
    ) -> Result<Self> {
        if patches_per_side == 0 {
            return Self::new(&[], &[]);
        }
        let side = 3 * patches_per_side + 1;
        let step = 2.0 * extent / (side - 1) as f32;

        let mut positions = Vec::with_capacity(side * side);
        for row in 0..side {
            for col in 0..side {
                let x = -extent + col as f32 * step;
                let y = -extent + row as f32 * step;
                positions.push([x, y, height(x, y)]);
            }
        }

        let mut indices = Vec::with_capacity(patches_per_side * patches_per_side * 16);
        for patch_row in 0..patches_per_side {
            for patch_col in 0..patches_per_side {
                for row in 0..4 {
                    for col in 0..4 {
                        let lattice_row = 3 * patch_row + row;
                        let lattice_col = 3 * patch_col + col;
                        indices.push((lattice_row * side + lattice_col) as u32);
                    }
                }
            }
        }

        Self::new(&positions, &indices)
    }

    pub fn vertices_len(&self) -> usize {
        self.positions.len()
    }

    pub fn patches_len(&self) -> usize {
        self.patches.len()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn patch(&self, index: usize) -> Option<&Patch> {
        self.patches.get(index)
    }

    /// Gather the control point positions of a patch, row-major.
    pub fn control_points(&self, patch: &Patch) -> [Vec3; CONTROL_POINTS_PER_PATCH] {
        patch
            .control_points
            .map(|index| self.positions[usize::from(index)])
    }

    /// Mean of all vertex positions.
    pub fn centroid(&self) -> Vec3 {
        if self.positions.is_empty() {
            return Vec3::zero();
        }
        self.positions.iter().fold(Vec3::zero(), |sum, &p| sum + p)
            / self.positions.len() as f32
    }
}
