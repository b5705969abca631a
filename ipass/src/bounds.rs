//! World-space boxes around the envelope grid points.

use crate::{grid::Grid, slefe::SlefeBounds};
use ultraviolet::Vec3;

/// Corner index pairs of the 12 box edges, for wireframe rendering.
///
/// Corner `k` takes its `x` from `max` if bit 0 of `k` is set, `y` if bit 1
/// and `z` if bit 2; corner 0 is `min`, corner 7 is `max`.
pub const BOX_EDGES: [[u32; 2]; 12] = [
    [0, 1],
    [2, 3],
    [4, 5],
    [6, 7],
    [0, 2],
    [1, 3],
    [4, 6],
    [5, 7],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// An axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldAabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl WorldAabb {
    /// The box spanned by an envelope's lower and upper point.
    pub fn from_bounds(lower: Vec3, upper: Vec3) -> Self {
        let center = (lower + upper) * 0.5;
        let half_size = (upper - lower) * 0.5;
        Self {
            min: center - half_size,
            max: center + half_size,
        }
    }

    /// The 8 corners, ordered as documented on [`BOX_EDGES`].
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|k| {
            Vec3::new(
                if k & 1 != 0 { self.max.x } else { self.min.x },
                if k & 2 != 0 { self.max.y } else { self.min.y },
                if k & 4 != 0 { self.max.z } else { self.min.z },
            )
        })
    }

    pub fn contains(&self, point: Vec3, epsilon: f32) -> bool {
        point.x >= self.min.x - epsilon
            && point.y >= self.min.y - epsilon
            && point.z >= self.min.z - epsilon
            && point.x <= self.max.x + epsilon
            && point.y <= self.max.y + epsilon
            && point.z <= self.max.z + epsilon
    }

    pub fn is_finite(&self) -> bool {
        [self.min, self.max]
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
    }

    /// The smallest box containing both.
    pub fn union(&self, other: &WorldAabb) -> WorldAabb {
        WorldAabb {
            min: self.min.min_by_component(other.min),
            max: self.max.max_by_component(other.max),
        }
    }
}

/// The world boxes of one patch, one per envelope grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldBoxes {
    divisions: usize,
    boxes: Grid<WorldAabb>,
}

impl WorldBoxes {
    pub fn divisions(&self) -> usize {
        self.divisions
    }

    pub fn boxes(&self) -> &Grid<WorldAabb> {
        &self.boxes
    }

    pub fn get(&self, u: usize, v: usize) -> Option<&WorldAabb> {
        self.boxes.get(u, v)
    }

    /// The first grid point whose box is not finite.
    pub fn first_non_finite(&self) -> Option<(usize, usize)> {
        self.boxes
            .iter()
            .find(|(_, aabb)| !aabb.is_finite())
            .map(|(uv, _)| uv)
    }

    /// The union of the four grid point boxes around tile `(u, v)`.
    pub fn tile(&self, u: usize, v: usize) -> Option<WorldAabb> {
        let corners = [(u, v), (u, v + 1), (u + 1, v), (u + 1, v + 1)];
        let mut boxes = corners.iter().map(|&(a, b)| self.boxes.get(a, b));
        let first = *boxes.next()??;
        boxes.try_fold(first, |acc, aabb| Some(acc.union(aabb?)))
    }

    /// Flat corner positions of every box, 8 per grid point.
    pub fn corner_vertices(&self) -> Vec<[f32; 3]> {
        self.boxes
            .as_slice()
            .iter()
            .flat_map(|aabb| aabb.corners())
            .map(|p| [p.x, p.y, p.z])
            .collect()
    }

    /// Line list indices into [`corner_vertices`](Self::corner_vertices).
    pub fn wireframe_indices(&self) -> Vec<u32> {
        (0..self.boxes.len() as u32)
            .flat_map(|b| BOX_EDGES.iter().flat_map(move |&[i, j]| [8 * b + i, 8 * b + j]))
            .collect()
    }
}

/// Build the world boxes of a patch from its envelope.
pub fn build(slefe: &SlefeBounds) -> WorldBoxes {
    let side = slefe.divisions() + 1;
    WorldBoxes {
        divisions: slefe.divisions(),
        boxes: Grid::from_fn(side, |u, v| {
            WorldAabb::from_bounds(slefe.lower()[(u, v)], slefe.upper()[(u, v)])
        }),
    }
}
