//! An orbit camera around the model, producing per-frame matrices.

use crate::{estimator::FrameInput, projection::Viewport};
use ultraviolet::{
    projection::{orthographic_gl, perspective_gl},
    Mat4, Vec3,
};

const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

/// Looks down `-z` at the model from `distance`, after rotating the model by
/// `azimuth` around `y` and then `elevation` around `x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    /// Model translation in view space.
    pub model_position: Vec3,
    /// Distance from the eye to the model origin.
    pub distance: f32,
    /// Rotation around `y`, in degrees.
    pub azimuth: f32,
    /// Rotation around `x`, in degrees.
    pub elevation: f32,
    /// Perspective projection if `true`, orthographic `[-1, 1]³` otherwise.
    pub perspective: bool,
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            model_position: Vec3::zero(),
            distance: 1.0,
            azimuth: 0.0,
            elevation: 0.0,
            perspective: true,
            field_of_view: 70.0,
        }
    }
}

impl OrbitCamera {
    pub fn model_view(&self) -> Mat4 {
        Mat4::from_translation(self.model_position - Vec3::new(0.0, 0.0, self.distance))
            * Mat4::from_rotation_x(self.elevation.to_radians())
            * Mat4::from_rotation_y(self.azimuth.to_radians())
    }

    pub fn projection(&self, viewport: Viewport) -> Mat4 {
        if self.perspective {
            perspective_gl(
                self.field_of_view.to_radians(),
                viewport.aspect_ratio(),
                Z_NEAR,
                Z_FAR,
            )
        } else {
            orthographic_gl(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0)
        }
    }

    pub fn frame_input(&self, viewport: Viewport) -> FrameInput {
        FrameInput {
            model_view: self.model_view(),
            projection: self.projection(viewport),
            viewport,
        }
    }
}
