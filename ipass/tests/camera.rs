//! Orbit camera matrices checked against `glam`.


use ipass::{animation::AnimationCurve, camera::OrbitCamera, projection::Viewport};
use ultraviolet::Vec4;

const EPSILON: f32 = 1e-4;

fn reference(camera: &OrbitCamera, viewport: Viewport) -> glam::Mat4 {
    let p = camera.model_position;
    let model_view = glam::Mat4::from_translation(glam::Vec3::new(p.x, p.y, p.z - camera.distance))
        * glam::Mat4::from_rotation_x(camera.elevation.to_radians())
        * glam::Mat4::from_rotation_y(camera.azimuth.to_radians());
    let projection = if camera.perspective {
        glam::Mat4::perspective_rh_gl(
            camera.field_of_view.to_radians(),
            viewport.aspect_ratio(),
            0.1,
            100.0,
        )
    } else {
        glam::Mat4::orthographic_rh_gl(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0)
    };
    projection * model_view
}

fn assert_same_transform(camera: &OrbitCamera) {
    let viewport = test_utils::viewport();
    let frame = camera.frame_input(viewport);
    let ours = frame.projection * frame.model_view;
    let theirs = reference(camera, viewport);

    for [x, y, z] in [
        [0.0, 0.0, 0.0],
        [1.0, 0.5, -0.25],
        [-0.3, 0.8, 0.6],
        [0.2, -0.7, 0.1],
    ] {
        let a = ours * Vec4::new(x, y, z, 1.0);
        let b = theirs * glam::Vec4::new(x, y, z, 1.0);
        for (a, b) in [(a.x, b.x), (a.y, b.y), (a.z, b.z), (a.w, b.w)] {
            assert!((a - b).abs() < EPSILON, "{camera:?}: {a} != {b}");
        }
    }
}

#[test]
fn perspective_orbit_matches_glam() {
    assert_same_transform(&OrbitCamera {
        model_position: ultraviolet::Vec3::new(0.1, -0.2, 0.0),
        distance: 4.0,
        azimuth: 35.0,
        elevation: -20.0,
        ..Default::default()
    });
}

#[test]
fn orthographic_orbit_matches_glam() {
    assert_same_transform(&OrbitCamera {
        distance: 0.5,
        azimuth: -110.0,
        elevation: 45.0,
        perspective: false,
        ..Default::default()
    });
}

#[test]
fn animated_distance_follows_curve() {
    let curve = AnimationCurve::new(2.0, 6.0, 0.5, 0.0);
    let mut camera = OrbitCamera::default();
    for frame in 0..60 {
        camera.distance = curve.sample(frame as f32 / 30.0);
        assert!((2.0 - EPSILON..=6.0 + EPSILON).contains(&camera.distance));
        assert_same_transform(&camera);
    }
}
