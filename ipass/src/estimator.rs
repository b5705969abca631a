//! # Tessellation Estimator
//!
//! [`TessellationEstimatorState`] owns the mesh, the options, every cached
//! pipeline stage and the per-vertex level buffer. [`update`] runs the
//! pipeline for one frame:
//!
//! 1. envelopes of the active patches, if stale;
//! 2. world boxes, if stale;
//! 3. screen boxes and levels, always.
//!
//! A failing frame leaves the previous frame's levels in place so the caller
//! can report the error and keep drawing.
//!
//! [`update`]: TessellationEstimatorState::update

use crate::{
    bounds::{self, WorldBoxes},
    dirty::DirtyState,
    error::Stage,
    mesh::PatchMesh,
    projection::{Projector, ScreenBoxes, Viewport},
    slefe::{self, Envelope, SlefeBounds},
    tess_level::{self, EdgeMetric, LevelLimits, PatchEstimate, VertexTessLevels},
    Error, GridKey, Result,
};
use log::{debug, warn};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::ops::Range;
use ultraviolet::Mat4;

/// The patches the estimator works on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchRange {
    pub start: usize,
    /// Number of patches, `None` for all remaining ones.
    pub count: Option<usize>,
}

impl PatchRange {
    pub fn new(start: usize, count: usize) -> Self {
        Self {
            start,
            count: Some(count),
        }
    }

    /// Resolve against a mesh with `patches` patches.
    pub fn resolve(&self, patches: usize) -> Result<Range<usize>> {
        let end = match self.count {
            Some(count) => self.start.checked_add(count),
            None => Some(patches.max(self.start)),
        };
        match end {
            Some(end) if end <= patches => Ok(self.start..end),
            _ => Err(Error::InvalidPatchRange {
                start: self.start,
                count: self.count.unwrap_or(0),
                patches,
            }),
        }
    }
}

/// Options of a [`TessellationEstimatorState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorOptions {
    /// Envelope subdivisions per parametric axis,
    /// `MIN_DIVISIONS..=MAX_DIVISIONS`. Default: `3`.
    pub divisions: usize,
    /// Keep fractional levels instead of rounding them up. Default: `true`.
    pub fractional: bool,
    /// Limits applied to every level written to the vertex buffer.
    pub limits: LevelLimits,
    /// Patches to estimate; levels of all others stay `0`.
    pub active_patches: PatchRange,
    /// Envelope routine.
    pub envelope: Envelope,
    /// How a tile's screen edge is measured. Default: [`EdgeMetric::Cell`].
    pub edge_metric: EdgeMetric,
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            divisions: 3,
            fractional: true,
            limits: LevelLimits::default(),
            active_patches: PatchRange::default(),
            envelope: Envelope::default(),
            edge_metric: EdgeMetric::default(),
        }
    }
}

/// Camera and window state of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub model_view: Mat4,
    pub projection: Mat4,
    pub viewport: Viewport,
}

/// Summary of one [`update`](TessellationEstimatorState::update).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Active patches with at least one visible tile.
    pub visible_patches: usize,
    /// Active patches with every tile culled.
    pub culled_patches: usize,
    /// Largest clamped level written this frame.
    pub max_level: f32,
    /// Envelopes computed this frame.
    pub slefe_recomputations: usize,
    /// World box grids built this frame.
    pub box_rebuilds: usize,
}

/// The estimator pipeline state, updated once per frame.
#[derive(Debug, Clone)]
pub struct TessellationEstimatorState {
    mesh: PatchMesh,
    options: EstimatorOptions,
    dirty: DirtyState,
    slefe_generation: u64,
    slefes: Vec<Option<SlefeBounds>>,
    world_boxes: Vec<Option<WorldBoxes>>,
    screen_boxes: Vec<Option<ScreenBoxes>>,
    estimates: Vec<Option<PatchEstimate>>,
    levels: VertexTessLevels,
    tile_consumer: bool,
}

impl TessellationEstimatorState {
    pub fn new(mesh: PatchMesh, options: EstimatorOptions) -> Result<Self> {
        slefe::validate_divisions(options.divisions)?;
        options.active_patches.resolve(mesh.patches_len())?;

        let patches = mesh.patches_len();
        Ok(Self {
            levels: VertexTessLevels::new(mesh.vertices_len()),
            mesh,
            options,
            dirty: DirtyState::default(),
            slefe_generation: 0,
            slefes: vec![None; patches],
            world_boxes: vec![None; patches],
            screen_boxes: vec![None; patches],
            estimates: vec![None; patches],
            tile_consumer: false,
        })
    }

    pub fn mesh(&self) -> &PatchMesh {
        &self.mesh
    }

    pub fn options(&self) -> &EstimatorOptions {
        &self.options
    }

    pub fn dirty_state(&self) -> DirtyState {
        self.dirty
    }

    /// Incremented every time a batch of envelopes is computed.
    pub fn slefe_generation(&self) -> u64 {
        self.slefe_generation
    }

    /// Change the number of divisions. Setting the current value again keeps
    /// every cache.
    pub fn set_divisions(&mut self, divisions: usize) -> Result<()> {
        let divisions = slefe::validate_divisions(divisions)?;
        if divisions == self.options.divisions {
            return Ok(());
        }
        debug!(
            "Divisions {} -> {}, invalidating envelopes",
            self.options.divisions, divisions
        );
        self.options.divisions = divisions;
        self.invalidate_slefes();
        Ok(())
    }

    pub fn set_envelope(&mut self, envelope: Envelope) {
        if envelope != self.options.envelope {
            self.options.envelope = envelope;
            self.invalidate_slefes();
        }
    }

    pub fn set_fractional(&mut self, fractional: bool) {
        self.options.fractional = fractional;
    }

    pub fn set_limits(&mut self, limits: LevelLimits) {
        self.options.limits = limits;
    }

    pub fn set_edge_metric(&mut self, edge_metric: EdgeMetric) {
        self.options.edge_metric = edge_metric;
    }

    /// Restrict the estimator to a range of patches. Patches entering the
    /// range without a current envelope get one on the next update.
    pub fn set_active_patches(&mut self, range: PatchRange) -> Result<()> {
        let patches = range.resolve(self.mesh.patches_len())?;
        self.options.active_patches = range;
        if self.slefes[patches].iter().any(Option::is_none) {
            self.dirty.invalidate_slefes();
        }
        Ok(())
    }

    /// Register whether a debug collaborator renders tile outlines and will
    /// call [`take_tiles_dirty`](Self::take_tiles_dirty).
    pub fn set_tile_consumer(&mut self, tile_consumer: bool) {
        self.tile_consumer = tile_consumer;
    }

    /// `true` once after the world boxes changed; the tile outlines should be
    /// rebuilt.
    pub fn take_tiles_dirty(&mut self) -> bool {
        self.dirty.tiles_consumed()
    }

    fn invalidate_slefes(&mut self) {
        self.slefes.iter_mut().for_each(|s| *s = None);
        self.world_boxes.iter_mut().for_each(|b| *b = None);
        self.dirty.invalidate_slefes();
    }

    /// Run the pipeline for one frame.
    pub fn update(&mut self, frame: &FrameInput) -> Result<FrameStats> {
        let result = self.try_update(frame);
        if let Err(error) = &result {
            warn!("Keeping previous tessellation levels: {error}");
        }
        result
    }

    fn try_update(&mut self, frame: &FrameInput) -> Result<FrameStats> {
        let active = self
            .options
            .active_patches
            .resolve(self.mesh.patches_len())?;
        let mut stats = FrameStats::default();

        if self.dirty.needs_slefes() {
            stats.slefe_recomputations = self.compute_slefes(active.clone())?;
            self.dirty.slefes_computed();
        }

        if self.dirty.needs_boxes() {
            stats.box_rebuilds = self.build_world_boxes(active.clone())?;
            self.dirty.boxes_built();
        }

        if !self.tile_consumer {
            self.dirty.tiles_consumed();
        }

        let projector = Projector::new(frame.model_view, frame.projection, frame.viewport);
        let mut levels = VertexTessLevels::new(self.mesh.vertices_len());
        let mut screen_boxes = vec![None; self.mesh.patches_len()];
        let mut estimates = vec![None; self.mesh.patches_len()];

        for index in active {
            let Some(world) = self.world_boxes[index].as_ref() else {
                continue;
            };
            let screen = projector.project_boxes(world);
            let estimate = tess_level::estimate(
                &screen,
                frame.viewport,
                self.options.fractional,
                self.options.edge_metric,
            );

            if estimate.is_culled() {
                stats.culled_patches += 1;
            } else {
                stats.visible_patches += 1;
            }

            let level = self.options.limits.clamp(estimate.level);
            stats.max_level = stats.max_level.max(level);
            levels.write_patch(&self.mesh.patches()[index], level);

            screen_boxes[index] = Some(screen);
            estimates[index] = Some(estimate);
        }

        self.levels = levels;
        self.screen_boxes = screen_boxes;
        self.estimates = estimates;
        Ok(stats)
    }

    /// Compute the missing envelopes of `active`. Nothing is stored unless
    /// all of them succeed.
    fn compute_slefes(&mut self, active: Range<usize>) -> Result<usize> {
        let missing: Vec<usize> = active.filter(|&i| self.slefes[i].is_none()).collect();
        let divisions = self.options.divisions;
        let envelope = self.options.envelope;
        let mesh = &self.mesh;

        let compute = |&index: &usize| -> Result<(usize, SlefeBounds)> {
            let points = mesh.control_points(&mesh.patches()[index]);
            let bounds = slefe::compute(&points, divisions, &envelope)?;
            match bounds.first_non_finite() {
                Some((u, v)) => Err(Error::NumericAnomaly {
                    key: GridKey::new(index, u, v),
                    stage: Stage::Slefe,
                }),
                None => Ok((index, bounds)),
            }
        };

        #[cfg(feature = "rayon")]
        let computed = missing.par_iter().map(compute).collect::<Result<Vec<_>>>()?;
        #[cfg(not(feature = "rayon"))]
        let computed = missing.iter().map(compute).collect::<Result<Vec<_>>>()?;

        debug!(
            "Computed {} envelopes with {} divisions",
            computed.len(),
            divisions
        );
        let count = computed.len();
        for (index, bounds) in computed {
            self.slefes[index] = Some(bounds);
            self.world_boxes[index] = None;
        }
        self.slefe_generation += 1;
        Ok(count)
    }

    /// Build the missing world boxes of `active`.
    fn build_world_boxes(&mut self, active: Range<usize>) -> Result<usize> {
        let mut built = Vec::new();
        for index in active {
            if self.world_boxes[index].is_some() {
                continue;
            }
            let Some(slefe) = self.slefes[index].as_ref() else {
                continue;
            };
            let boxes = bounds::build(slefe);
            if let Some((u, v)) = boxes.first_non_finite() {
                return Err(Error::NumericAnomaly {
                    key: GridKey::new(index, u, v),
                    stage: Stage::WorldBoxes,
                });
            }
            built.push((index, boxes));
        }

        let count = built.len();
        for (index, boxes) in built {
            self.world_boxes[index] = Some(boxes);
        }
        Ok(count)
    }

    /// One level per vertex, for upload as a vertex attribute.
    pub fn levels(&self) -> &[f32] {
        self.levels.as_slice()
    }

    pub fn levels_bytes(&self) -> &[u8] {
        self.levels.as_bytes()
    }

    pub fn slefe_bounds(&self, patch: usize) -> Option<&SlefeBounds> {
        self.slefes.get(patch)?.as_ref()
    }

    pub fn world_boxes(&self, patch: usize) -> Option<&WorldBoxes> {
        self.world_boxes.get(patch)?.as_ref()
    }

    /// Screen boxes of the last successful frame.
    pub fn screen_boxes(&self, patch: usize) -> Option<&ScreenBoxes> {
        self.screen_boxes.get(patch)?.as_ref()
    }

    /// Level estimate of the last successful frame.
    pub fn patch_estimate(&self, patch: usize) -> Option<&PatchEstimate> {
        self.estimates.get(patch)?.as_ref()
    }
}
