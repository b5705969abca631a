//! Tessellation levels from projected envelope boxes.
//!
//! A patch's level is `divisions × sqrt(max_screen_edge)`, where
//! `max_screen_edge` is the longest window-space side over all visible
//! tiles, measured as selected by [`EdgeMetric`]. The formula is an
//! empirically tuned policy, not a derived bound; [`LEVEL_SCALE`] is the
//! tuning constant.

use crate::{
    grid::Grid,
    mesh::Patch,
    projection::{ScreenAabb, ScreenBoxes, Viewport},
    Error, Result,
};
use itertools::iproduct;

/// Multiplier applied to `divisions × sqrt(max_screen_edge)`.
pub const LEVEL_SCALE: f32 = 1.0;

/// `(row, col)` of the control points carrying the outer (edge) levels.
pub const EDGE_SLOTS: [(usize, usize); 4] = [(0, 2), (2, 3), (3, 1), (1, 0)];

/// `(row, col)` of the control point carrying the inner level.
pub const CENTER_SLOT: (usize, usize) = (1, 1);

/// What a visible tile reports as its screen edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EdgeMetric {
    /// The longest side of the grid point envelope boxes at the tile's
    /// corners. These only span the envelope width, so the edge measures
    /// how far the surface departs from its bilinear tiling on screen.
    #[default]
    Cell,
    /// The longest side of the merged tile box, i.e. the projected tile
    /// size.
    Tile,
}

/// Lower and upper limits applied before levels reach the tessellator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelLimits {
    min: f32,
    max: f32,
}

impl Default for LevelLimits {
    /// `[1, 64]`; 64 is the smallest `GL_MAX_TESS_GEN_LEVEL` an implementation
    /// may report.
    fn default() -> Self {
        Self { min: 1.0, max: 64.0 }
    }
}

impl LevelLimits {
    pub fn new(min: f32, max: f32) -> Result<Self> {
        if min.is_finite() && max.is_finite() && 0.0 < min && min <= max {
            Ok(Self { min, max })
        } else {
            Err(Error::InvalidLevelLimits { min, max })
        }
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn clamp(&self, level: f32) -> f32 {
        level.clamp(self.min, self.max)
    }
}

/// Level for a maximum screen edge, before clamping.
pub fn level_from_edge(divisions: usize, max_screen_edge: f32, fractional: bool) -> f32 {
    let level = LEVEL_SCALE * divisions as f32 * max_screen_edge.max(0.0).sqrt();
    if fractional {
        level
    } else {
        level.ceil()
    }
}

fn corner_boxes(
    screen: &ScreenBoxes,
    u: usize,
    v: usize,
) -> impl Iterator<Item = &ScreenAabb> + '_ {
    [(u, v), (u, v + 1), (u + 1, v), (u + 1, v + 1)]
        .into_iter()
        .filter_map(|(a, b)| screen.get(a, b))
}

/// Merged screen box of tile `(u, v)`: the union of the boxes at its four
/// corner grid points. Corners that did not project are skipped.
pub fn tile_box(screen: &ScreenBoxes, u: usize, v: usize) -> Option<ScreenAabb> {
    corner_boxes(screen, u, v).fold(None, |acc: Option<ScreenAabb>, aabb| {
        Some(acc.map_or(*aabb, |acc| acc.union(aabb)))
    })
}

/// Longest side of the projected corner grid point boxes of tile `(u, v)`.
pub fn cell_edge(screen: &ScreenBoxes, u: usize, v: usize) -> f32 {
    corner_boxes(screen, u, v)
        .map(ScreenAabb::max_edge)
        .fold(0.0, f32::max)
}

/// Per-patch result of the level estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchEstimate {
    /// Screen edge of every tile; `None` for culled tiles.
    pub tile_edges: Grid<Option<f32>>,
    /// Longest edge over the visible tiles, `0` if none is visible.
    pub max_screen_edge: f32,
    /// Unclamped level.
    pub level: f32,
}

impl PatchEstimate {
    pub fn visible_tiles(&self) -> usize {
        self.tile_edges.as_slice().iter().flatten().count()
    }

    pub fn is_culled(&self) -> bool {
        self.visible_tiles() == 0
    }
}

/// Estimate the tessellation level of one patch from its screen boxes.
///
/// Tiles are culled against `viewport` by their merged box in either
/// metric.
pub fn estimate(
    screen: &ScreenBoxes,
    viewport: Viewport,
    fractional: bool,
    metric: EdgeMetric,
) -> PatchEstimate {
    let n = screen.divisions();
    let mut tile_edges = Grid::filled(n, None);
    let mut max_screen_edge = 0.0_f32;

    for (u, v) in iproduct!(0..n, 0..n) {
        let Some(tile) = tile_box(screen, u, v) else {
            continue;
        };
        if tile.is_outside(viewport) {
            continue;
        }
        let edge = match metric {
            EdgeMetric::Cell => cell_edge(screen, u, v),
            EdgeMetric::Tile => tile.max_edge(),
        };
        tile_edges[(u, v)] = Some(edge);
        max_screen_edge = max_screen_edge.max(edge);
    }

    PatchEstimate {
        tile_edges,
        max_screen_edge,
        level: level_from_edge(n, max_screen_edge, fractional),
    }
}

/// One tessellation level per global vertex, uploaded as a vertex attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexTessLevels {
    levels: Vec<f32>,
}

impl VertexTessLevels {
    pub fn new(vertices_len: usize) -> Self {
        Self {
            levels: vec![0.0; vertices_len],
        }
    }

    /// Write `level` into the five level slots of `patch`.
    ///
    /// A vertex shared by several patches keeps the largest level written to
    /// it, so both sides of a shared edge tessellate identically.
    pub fn write_patch(&mut self, patch: &Patch, level: f32) {
        for &(row, col) in EDGE_SLOTS.iter().chain(std::iter::once(&CENTER_SLOT)) {
            let slot = &mut self.levels[usize::from(patch.control_point(row, col))];
            *slot = slot.max(level);
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.levels
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.levels)
    }
}
