//! # Subdivision-Level Error-Function Envelopes
//!
//! A SLEFE is a pair of piecewise bilinear functions over a
//! `divisions × divisions` parameter grid, one below and one above a patch.
//! On every tile `[i/n, (i+1)/n] × [j/n, (j+1)/n]` the patch lies between
//! the bilinear interpolants of the tile's four corner bounds. The bounds are
//! stored per grid point, so a grid of `(n + 1) × (n + 1)` lower and upper
//! points describes the whole envelope.
//!
//! The scalar bounding primitive is pluggable through [`EnvelopeBounds`];
//! [`compute`] runs it once per coordinate and assembles 3D grids.

use crate::{
    bezier::{self, nan_max, nan_min, Coefficients},
    grid::Grid,
    Error, Result, MAX_DIVISIONS, MIN_DIVISIONS,
};
use itertools::iproduct;
use ultraviolet::Vec3;

/// Reject subdivision counts outside `MIN_DIVISIONS..=MAX_DIVISIONS`.
pub fn validate_divisions(divisions: usize) -> Result<usize> {
    if (MIN_DIVISIONS..=MAX_DIVISIONS).contains(&divisions) {
        Ok(divisions)
    } else {
        Err(Error::Configuration {
            divisions,
            min: MIN_DIVISIONS,
            max: MAX_DIVISIONS,
        })
    }
}

/// Lower and upper bounds of one coordinate, per grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarEnvelope {
    pub lower: Grid<f32>,
    pub upper: Grid<f32>,
}

/// A tensor-product bounding routine for scalar bicubic patches.
///
/// Implementations must return `(divisions + 1)²` bounds such that, on every
/// tile, the patch lies between the bilinear interpolants of the lower and of
/// the upper corner values. `divisions` has already been validated.
pub trait EnvelopeBounds {
    fn bound(&self, coefficients: &Coefficients, divisions: usize) -> ScalarEnvelope;
}

/// Bernstein coefficients of every tile of the grid, row-major.
fn tiles(c: &Coefficients, divisions: usize) -> Grid<Coefficients> {
    let h = 1.0 / divisions as f32;
    Grid::from_fn(divisions, |i, j| {
        bezier::restrict(
            c,
            (i as f32 * h, (i + 1) as f32 * h),
            (j as f32 * h, (j + 1) as f32 * h),
        )
    })
}

/// Apply `f` to each of the four grid points at the corners of tile `(i, j)`.
fn for_each_corner(i: usize, j: usize, mut f: impl FnMut(usize, usize)) {
    for (a, b) in iproduct!(0..2, 0..2) {
        f(i + a, j + b);
    }
}

/// The envelope `patch ± offset`, where the offset bounds how far each tile
/// departs from the bilinear interpolant of its corners.
///
/// The difference between a tile and its corner interpolant is again a
/// bicubic with Bernstein coefficients `c_kl - bilinear_kl`, so their min and
/// max bound it over the tile. Each grid point takes the most extreme offset
/// of the tiles around it. The width of the envelope shrinks quadratically
/// with the tile size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BilinearSlefe;

impl EnvelopeBounds for BilinearSlefe {
    fn bound(&self, c: &Coefficients, divisions: usize) -> ScalarEnvelope {
        let side = divisions + 1;
        let mut below = Grid::filled(side, 0.0_f32);
        let mut above = Grid::filled(side, 0.0_f32);

        for ((i, j), tile) in tiles(c, divisions).iter() {
            let bilinear = bezier::bilinear_coefficients(tile);
            let (mut low, mut high) = (0.0_f32, 0.0_f32);
            for (k, l) in iproduct!(0..4, 0..4) {
                let d = tile[k][l] - bilinear[k][l];
                low = nan_min(low, d);
                high = nan_max(high, d);
            }

            for_each_corner(i, j, |u, v| {
                below[(u, v)] = nan_min(below[(u, v)], low);
                above[(u, v)] = nan_max(above[(u, v)], high);
            });
        }

        let h = 1.0 / divisions as f32;
        let value = Grid::from_fn(side, |u, v| bezier::evaluate(c, u as f32 * h, v as f32 * h));

        ScalarEnvelope {
            lower: Grid::from_fn(side, |u, v| value[(u, v)] + below[(u, v)]),
            upper: Grid::from_fn(side, |u, v| value[(u, v)] + above[(u, v)]),
        }
    }
}

/// The range of each tile's Bernstein coefficients, spread to its corners.
///
/// Looser than [`BilinearSlefe`] (the width shrinks only linearly with the
/// tile size) but needs no corner interpolation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlHullBounds;

impl EnvelopeBounds for ControlHullBounds {
    fn bound(&self, c: &Coefficients, divisions: usize) -> ScalarEnvelope {
        let side = divisions + 1;
        let mut lower = Grid::filled(side, f32::INFINITY);
        let mut upper = Grid::filled(side, f32::NEG_INFINITY);

        for ((i, j), tile) in tiles(c, divisions).iter() {
            let (low, high) = tile
                .iter()
                .flatten()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(low, high), &x| {
                    (nan_min(low, x), nan_max(high, x))
                });

            for_each_corner(i, j, |u, v| {
                lower[(u, v)] = nan_min(lower[(u, v)], low);
                upper[(u, v)] = nan_max(upper[(u, v)], high);
            });
        }

        ScalarEnvelope { lower, upper }
    }
}

/// Selects the envelope routine used by the estimator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Envelope {
    /// See [`BilinearSlefe`].
    #[default]
    BilinearSlefe,
    /// See [`ControlHullBounds`].
    ControlHull,
}

impl EnvelopeBounds for Envelope {
    fn bound(&self, c: &Coefficients, divisions: usize) -> ScalarEnvelope {
        match self {
            Envelope::BilinearSlefe => BilinearSlefe.bound(c, divisions),
            Envelope::ControlHull => ControlHullBounds.bound(c, divisions),
        }
    }
}

/// Lower and upper envelope points of one patch.
#[derive(Debug, Clone, PartialEq)]
pub struct SlefeBounds {
    divisions: usize,
    lower: Grid<Vec3>,
    upper: Grid<Vec3>,
}

impl SlefeBounds {
    pub fn divisions(&self) -> usize {
        self.divisions
    }

    pub fn lower(&self) -> &Grid<Vec3> {
        &self.lower
    }

    pub fn upper(&self) -> &Grid<Vec3> {
        &self.upper
    }

    /// The `(lower, upper)` pair at grid point `(u, v)`.
    pub fn pair(&self, u: usize, v: usize) -> Option<(Vec3, Vec3)> {
        Some((*self.lower.get(u, v)?, *self.upper.get(u, v)?))
    }

    /// The first grid point holding a `NaN` or infinite coordinate.
    pub fn first_non_finite(&self) -> Option<(usize, usize)> {
        let finite = |p: &Vec3| p.x.is_finite() && p.y.is_finite() && p.z.is_finite();
        self.lower
            .iter()
            .zip(self.upper.iter())
            .find(|((_, low), (_, high))| !finite(low) || !finite(high))
            .map(|((uv, _), _)| uv)
    }
}

/// Compute the envelope of a patch given its row-major 4×4 control points.
pub fn compute(
    control_points: &[Vec3; 16],
    divisions: usize,
    envelope: &impl EnvelopeBounds,
) -> Result<SlefeBounds> {
    let divisions = validate_divisions(divisions)?;

    let [x, y, z] = [0, 1, 2]
        .map(|axis| envelope.bound(&bezier::coefficients(control_points, axis), divisions));

    let side = divisions + 1;
    Ok(SlefeBounds {
        divisions,
        lower: Grid::from_fn(side, |u, v| {
            Vec3::new(x.lower[(u, v)], y.lower[(u, v)], z.lower[(u, v)])
        }),
        upper: Grid::from_fn(side, |u, v| {
            Vec3::new(x.upper[(u, v)], y.upper[(u, v)], z.upper[(u, v)])
        }),
    })
}
