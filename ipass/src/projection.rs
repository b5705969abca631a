//! Projection of world boxes into window pixels.
//!
//! Clip space is `projection × model_view × (p, 1)`. After the perspective
//! divide, NDC `(-1, -1)` maps to pixel `(0, 0)` and `(1, 1)` to
//! `(width, height)`: the origin is the lower left corner and `y` points up,
//! as in OpenGL window coordinates. Depth maps from NDC `[-1, 1]` to `[0, 1]`
//! (the default depth range).
//!
//! Corners with `w` at or behind the eye plane cannot be divided through;
//! they are left out of the screen box instead of producing infinities.

use crate::{bounds::WorldAabb, bounds::WorldBoxes, grid::Grid, Error, Result};
use log::trace;
use ultraviolet::{Mat4, Vec2, Vec3};

/// Smallest clip-space `w` still considered in front of the eye.
pub const MIN_CLIP_W: f32 = 1e-6;

/// Window size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            Err(Error::InvalidViewport { width, height })
        } else {
            Ok(Self { width, height })
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn half_size(&self) -> Vec2 {
        Vec2::new(self.width as f32 * 0.5, self.height as f32 * 0.5)
    }

    /// Map normalized device coordinates to window pixels and depth.
    pub fn to_window(&self, ndc: Vec3) -> Vec3 {
        let half = self.half_size();
        Vec3::new(
            half.x + ndc.x * half.x,
            half.y + ndc.y * half.y,
            0.5 + 0.5 * ndc.z,
        )
    }
}

/// An axis-aligned box in window pixels (`x`, `y`) and depth (`z`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenAabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl ScreenAabb {
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// The longer of the two window-space sides.
    pub fn max_edge(&self) -> f32 {
        self.width().max(self.height())
    }

    pub fn extend(&mut self, p: Vec3) {
        self.min = self.min.min_by_component(p);
        self.max = self.max.max_by_component(p);
    }

    pub fn union(&self, other: &ScreenAabb) -> ScreenAabb {
        ScreenAabb {
            min: self.min.min_by_component(other.min),
            max: self.max.max_by_component(other.max),
        }
    }

    /// `true` if the box lies entirely outside the window rectangle or the
    /// `[0, 1]` depth range.
    pub fn is_outside(&self, viewport: Viewport) -> bool {
        self.min.x > viewport.width as f32
            || self.min.y > viewport.height as f32
            || self.min.z > 1.0
            || self.max.x < 0.0
            || self.max.y < 0.0
            || self.max.z < 0.0
    }
}

/// Screen boxes of one patch for the current frame.
///
/// A grid point whose box has no corner in front of the eye is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenBoxes {
    divisions: usize,
    boxes: Grid<Option<ScreenAabb>>,
}

impl ScreenBoxes {
    pub(crate) fn new(divisions: usize, boxes: Grid<Option<ScreenAabb>>) -> Self {
        Self { divisions, boxes }
    }

    pub fn divisions(&self) -> usize {
        self.divisions
    }

    pub fn boxes(&self) -> &Grid<Option<ScreenAabb>> {
        &self.boxes
    }

    pub fn get(&self, u: usize, v: usize) -> Option<&ScreenAabb> {
        self.boxes.get(u, v)?.as_ref()
    }
}

/// Projects world-space geometry with one camera and window.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    model_view_projection: Mat4,
    viewport: Viewport,
}

impl Projector {
    pub fn new(model_view: Mat4, projection: Mat4, viewport: Viewport) -> Self {
        Self {
            model_view_projection: projection * model_view,
            viewport,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Window position of a world point, or `None` if it does not lie in
    /// front of the eye.
    pub fn project_point(&self, p: Vec3) -> Option<Vec3> {
        let clip = self.model_view_projection * p.into_homogeneous_point();
        if clip.w > MIN_CLIP_W {
            Some(self.viewport.to_window(clip.xyz() / clip.w))
        } else {
            None
        }
    }

    /// The window box of the box's projected corners.
    pub fn project_box(&self, aabb: &WorldAabb) -> Option<ScreenAabb> {
        let mut screen: Option<ScreenAabb> = None;
        for corner in aabb.corners() {
            match self.project_point(corner) {
                Some(p) => match screen.as_mut() {
                    Some(s) => s.extend(p),
                    None => screen = Some(ScreenAabb::from_point(p)),
                },
                None => trace!("Excluding box corner {corner:?} behind the eye"),
            }
        }
        screen
    }

    pub fn project_boxes(&self, world: &WorldBoxes) -> ScreenBoxes {
        ScreenBoxes::new(
            world.divisions(),
            world.boxes().map(|aabb| self.project_box(aabb)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ultraviolet::projection::{orthographic_gl, perspective_gl};

    const EPSILON: f32 = 1e-3;

    fn viewport() -> Viewport {
        Viewport::new(800, 600).unwrap()
    }

    #[test]
    fn zero_sized_viewport_is_rejected() {
        assert_eq!(
            Viewport::new(0, 600),
            Err(Error::InvalidViewport {
                width: 0,
                height: 600
            })
        );
        assert!(Viewport::new(800, 0).is_err());
    }

    #[test]
    fn ndc_corners_map_to_window_corners() {
        let v = viewport();
        let low = v.to_window(Vec3::new(-1.0, -1.0, -1.0));
        let high = v.to_window(Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(low, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(high, Vec3::new(800.0, 600.0, 1.0));
    }

    #[test]
    fn orthographic_box_projection() {
        // 100 pixels per world unit, origin at the window center.
        let projection = orthographic_gl(-4.0, 4.0, -3.0, 3.0, -1.0, 1.0);
        let projector = Projector::new(Mat4::identity(), projection, viewport());

        let aabb = WorldAabb {
            min: Vec3::new(-1.0, 0.0, 0.0),
            max: Vec3::new(1.0, 0.5, 0.0),
        };
        let screen = projector.project_box(&aabb).unwrap();
        assert!((screen.min.x - 300.0).abs() < EPSILON);
        assert!((screen.max.x - 500.0).abs() < EPSILON);
        assert!((screen.min.y - 300.0).abs() < EPSILON);
        assert!((screen.max.y - 350.0).abs() < EPSILON);
        assert!((screen.max_edge() - 200.0).abs() < EPSILON);
        assert!((screen.min.z - 0.5).abs() < EPSILON);
    }

    #[test]
    fn corners_behind_the_eye_are_excluded() {
        let projection = perspective_gl(70_f32.to_radians(), viewport().aspect_ratio(), 0.1, 100.0);
        let projector = Projector::new(Mat4::identity(), projection, viewport());

        // Straddles the eye plane: the z > 0 half is behind the camera.
        let straddling = WorldAabb {
            min: Vec3::new(-0.5, -0.5, -2.0),
            max: Vec3::new(0.5, 0.5, 1.0),
        };
        let screen = projector.project_box(&straddling).unwrap();
        assert!(screen.min.x.is_finite() && screen.max.x.is_finite());
        assert!(screen.min.y.is_finite() && screen.max.y.is_finite());
        assert!(screen.min.z.is_finite() && screen.max.z.is_finite());

        let behind = WorldAabb {
            min: Vec3::new(-0.5, -0.5, 1.0),
            max: Vec3::new(0.5, 0.5, 2.0),
        };
        assert!(projector.project_box(&behind).is_none());

        // Exactly on the eye plane.
        assert!(projector.project_point(Vec3::new(0.3, 0.0, 0.0)).is_none());
    }

    #[test]
    fn outside_test_uses_viewport_and_depth() {
        let v = viewport();
        let inside = ScreenAabb {
            min: Vec3::new(10.0, 10.0, 0.2),
            max: Vec3::new(20.0, 20.0, 0.3),
        };
        assert!(!inside.is_outside(v));

        let right = ScreenAabb {
            min: Vec3::new(801.0, 10.0, 0.2),
            max: Vec3::new(900.0, 20.0, 0.3),
        };
        assert!(right.is_outside(v));

        let beyond_far = ScreenAabb {
            min: Vec3::new(10.0, 10.0, 1.2),
            max: Vec3::new(20.0, 20.0, 1.3),
        };
        assert!(beyond_far.is_outside(v));

        // Touching the border still counts as visible.
        let touching = ScreenAabb {
            min: Vec3::new(-10.0, -10.0, 0.0),
            max: Vec3::new(0.0, 0.0, 1.0),
        };
        assert!(!touching.is_outside(v));
    }
}
