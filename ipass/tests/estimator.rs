//! End-to-end tests of the per-frame level estimation.


use anyhow::Result;
use ipass::{
    camera::OrbitCamera,
    dirty::DirtyState,
    mesh::PatchMesh,
    slefe::Envelope,
    tess_level::{self, EdgeMetric, LevelLimits},
    EstimatorOptions, FrameInput, TessellationEstimatorState,
};
use itertools::iproduct;
use test_utils::*;
use ultraviolet::{projection::perspective_gl, Mat4, Vec3};

fn estimator(mesh: PatchMesh) -> Result<TessellationEstimatorState> {
    estimator_with(mesh, EdgeMetric::default())
}

fn estimator_with(mesh: PatchMesh, edge_metric: EdgeMetric) -> Result<TessellationEstimatorState> {
    Ok(TessellationEstimatorState::new(
        mesh,
        EstimatorOptions {
            edge_metric,
            ..Default::default()
        },
    )?)
}

/// Limits that leave every positive level untouched.
fn unclamped() -> Result<LevelLimits> {
    Ok(LevelLimits::new(1.0e-3, 1.0e6)?)
}

fn center_level(state: &TessellationEstimatorState, patch: usize) -> f32 {
    let patch = state.mesh().patches()[patch];
    state.levels()[usize::from(patch.control_point(1, 1))]
}

#[test]
fn flat_patch_tile_edges_at_100_pixels_per_unit() -> Result<()> {
    init_logger();
    let mut state = estimator_with(flat_patch(3.0), EdgeMetric::Tile)?;
    let stats = state.update(&orthographic_frame(100.0))?;

    // Three divisions over three units: one unit, 100 pixels, per tile.
    let estimate = state.patch_estimate(0).expect("patch is active");
    assert!((estimate.max_screen_edge - 100.0).abs() < 0.1);
    assert!((estimate.level - 30.0).abs() < 0.05);
    assert!((stats.max_level - 30.0).abs() < 0.05);
    assert_eq!(stats.visible_patches, 1);

    let patch = state.mesh().patches()[0];
    for (row, col) in [(0, 2), (2, 3), (3, 1), (1, 0), (1, 1)] {
        let level = state.levels()[usize::from(patch.control_point(row, col))];
        assert!((level - 30.0).abs() < 0.05, "slot ({row}, {col}) = {level}");
    }
    for (row, col) in [(0, 0), (0, 3), (3, 0), (3, 3), (2, 2)] {
        assert_eq!(state.levels()[usize::from(patch.control_point(row, col))], 0.0);
    }
    Ok(())
}

#[test]
fn flat_patch_cell_edges_give_minimum_level() -> Result<()> {
    let mut state = estimator(flat_patch(3.0))?;
    let stats = state.update(&orthographic_frame(100.0))?;

    // A planar patch is its own bilinear tiling: the envelope has no width.
    let estimate = state.patch_estimate(0).expect("patch is active");
    assert_eq!(estimate.visible_tiles(), 9);
    assert!(estimate.max_screen_edge < 1e-3);
    assert!(estimate.level < 0.1);
    assert_eq!(stats.visible_patches, 1);
    assert_eq!(stats.max_level, 1.0);
    assert_eq!(center_level(&state, 0), 1.0);
    Ok(())
}

#[test]
fn integer_levels_round_up() -> Result<()> {
    let mut state = estimator_with(flat_patch(3.0), EdgeMetric::Tile)?;
    state.set_fractional(false);
    state.update(&orthographic_frame(90.0))?;
    // 3 · √90 ≈ 28.46
    assert_eq!(center_level(&state, 0), 29.0);
    Ok(())
}

/// An orthographic frame looking at the lattice from 60° above it, so the
/// envelope width along `z` shows on screen.
fn tilted_frame(pixels_per_unit: f32) -> FrameInput {
    orthographic_frame_with(
        Mat4::from_rotation_x(-60.0_f32.to_radians()),
        pixels_per_unit,
    )
}

#[test]
fn levels_grow_with_orthographic_scale() -> Result<()> {
    for edge_metric in [EdgeMetric::Cell, EdgeMetric::Tile] {
        let mut state = estimator_with(wavy_lattice(2), edge_metric)?;
        state.set_limits(unclamped()?);

        let mut previous = 0.0;
        for pixels_per_unit in [20.0, 40.0, 80.0, 160.0] {
            let stats = state.update(&tilted_frame(pixels_per_unit))?;
            assert!(stats.max_level > previous, "{edge_metric:?}");
            previous = stats.max_level;
        }
    }
    Ok(())
}

#[test]
fn tile_edges_grow_as_the_camera_approaches() -> Result<()> {
    let mesh = wavy_lattice(2);
    let patches = mesh.patches_len();
    let mut state = estimator(mesh)?;
    let viewport = viewport();
    let (width, height) = (viewport.width() as f32, viewport.height() as f32);

    let mut camera = OrbitCamera::default();
    let mut previous: Option<Vec<Option<f32>>> = None;
    let mut grown = 0;

    for step in 0..10 {
        camera.distance = 6.0 - 0.35 * step as f32;
        state.update(&camera.frame_input(viewport))?;

        // Edge of every tile whose merged box lies fully inside the window.
        let mut edges = Vec::new();
        for patch in 0..patches {
            let screen = state.screen_boxes(patch).expect("patch was projected");
            let estimate = state.patch_estimate(patch).expect("patch is active");
            let n = screen.divisions();
            for (u, v) in iproduct!(0..n, 0..n) {
                let inside = tess_level::tile_box(screen, u, v).filter(|tile| {
                    0.0 <= tile.min.x
                        && tile.max.x <= width
                        && 0.0 <= tile.min.y
                        && tile.max.y <= height
                        && 0.0 <= tile.min.z
                        && tile.max.z <= 1.0
                });
                edges.push(inside.and(estimate.tile_edges[(u, v)]));
            }
        }

        if let Some(previous) = &previous {
            for (before, after) in previous.iter().zip(&edges) {
                if let (Some(before), Some(after)) = (before, after) {
                    assert!(
                        *after >= *before * (1.0 - 1e-4) - 1e-3,
                        "distance {}: {after} < {before}",
                        camera.distance
                    );
                    if after > before {
                        grown += 1;
                    }
                }
            }
        }
        previous = Some(edges);
    }

    assert!(grown > 0);
    Ok(())
}

#[test]
fn levels_are_clamped_to_limits() -> Result<()> {
    let mut state = estimator_with(flat_patch(3.0), EdgeMetric::Tile)?;
    let stats = state.update(&orthographic_frame(1000.0))?;
    assert_eq!(stats.max_level, 64.0);

    state.set_limits(LevelLimits::new(2.0, 16.0)?);
    state.update(&orthographic_frame(1000.0))?;
    assert_eq!(center_level(&state, 0), 16.0);

    state.update(&orthographic_frame(0.001))?;
    assert_eq!(center_level(&state, 0), 2.0);
    Ok(())
}

#[test]
fn off_screen_patch_gets_minimum_level() -> Result<()> {
    let mut state = estimator(flat_patch(3.0))?;
    let frame = orthographic_frame_with(
        Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0)),
        100.0,
    );
    let stats = state.update(&frame)?;

    assert_eq!(stats.visible_patches, 0);
    assert_eq!(stats.culled_patches, 1);
    assert!(state.patch_estimate(0).expect("patch is active").is_culled());
    assert_eq!(center_level(&state, 0), 1.0);
    Ok(())
}

#[test]
fn refining_divisions_never_lowers_tile_levels() -> Result<()> {
    let mut state = estimator_with(wavy_lattice(3), EdgeMetric::Tile)?;
    state.set_limits(unclamped()?);
    let frame = orthographic_frame(150.0);

    state.update(&frame)?;
    let coarse = state.levels().to_vec();

    state.set_divisions(9)?;
    let stats = state.update(&frame)?;
    assert_eq!(stats.slefe_recomputations, 9);

    for (fine, coarse) in state.levels().iter().zip(&coarse) {
        assert!(*fine >= *coarse - 1e-3, "{fine} < {coarse}");
    }
    Ok(())
}

#[test]
fn refining_divisions_keeps_cell_levels_stable() -> Result<()> {
    let mut state = estimator(wavy_lattice(3))?;
    state.set_limits(unclamped()?);
    let frame = tilted_frame(150.0);

    state.update(&frame)?;
    let coarse = state.levels().to_vec();

    state.set_divisions(9)?;
    state.update(&frame)?;

    // The envelope width shrinks with the square of the tile size, so
    // `divisions · √width` stays roughly put instead of growing with `n`.
    for (fine, coarse) in state.levels().iter().zip(&coarse) {
        assert!(*fine >= 0.5 * *coarse, "{fine} < {coarse} / 2");
        assert!(*fine <= 2.0 * *coarse, "{fine} > 2 · {coarse}");
    }
    Ok(())
}

#[test]
fn unchanged_divisions_do_not_recompute() -> Result<()> {
    let mut state = estimator(wavy_lattice(2))?;
    state.update(&orthographic_frame(100.0))?;
    let generation = state.slefe_generation();

    state.set_divisions(state.options().divisions)?;
    let stats = state.update(&orthographic_frame(100.0))?;
    assert_eq!(stats.slefe_recomputations, 0);
    assert_eq!(state.slefe_generation(), generation);
    assert_eq!(state.dirty_state(), DirtyState::Clean);
    Ok(())
}

#[test]
fn switching_envelope_recomputes() -> Result<()> {
    let mut state = estimator(wavy_lattice(2))?;
    let frame = orthographic_frame(100.0);
    let slefe = state.update(&frame)?;

    state.set_envelope(Envelope::ControlHull);
    let hull = state.update(&frame)?;
    assert_eq!(slefe.slefe_recomputations, 4);
    assert_eq!(hull.slefe_recomputations, 4);
    assert_eq!(hull.visible_patches, 4);

    state.set_envelope(Envelope::ControlHull);
    assert_eq!(state.update(&frame)?.slefe_recomputations, 0);
    Ok(())
}

#[test]
fn patches_behind_the_eye_are_safe() -> Result<()> {
    init_logger();
    let mut state = estimator(wavy_lattice(4))?;

    // The eye sits inside the lattice looking along it, so part of every
    // frame lies behind the camera plane.
    let frame = FrameInput {
        model_view: Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2)
            * Mat4::from_translation(Vec3::new(0.0, 0.0, -0.05)),
        projection: perspective_gl(1.2, 800.0 / 600.0, 0.1, 100.0),
        viewport: viewport(),
    };
    let stats = state.update(&frame)?;

    assert_eq!(stats.visible_patches + stats.culled_patches, 16);
    assert!(state.levels().iter().all(|l| l.is_finite()));
    assert!(state
        .levels()
        .iter()
        .all(|&l| l == 0.0 || (1.0..=64.0).contains(&l)));
    Ok(())
}

#[test]
fn orbit_camera_drives_the_estimator() -> Result<()> {
    let mut state = estimator(wavy_lattice(2))?;
    state.set_limits(unclamped()?);
    let mut camera = OrbitCamera {
        elevation: -30.0,
        ..Default::default()
    };

    camera.distance = 8.0;
    let far = state.update(&camera.frame_input(viewport()))?;
    camera.distance = 3.0;
    let near = state.update(&camera.frame_input(viewport()))?;

    assert!(near.max_level > far.max_level);
    assert_eq!(near.slefe_recomputations, 0);
    Ok(())
}

#[test]
fn levels_buffer_is_uploadable() -> Result<()> {
    let mut state = estimator(wavy_lattice(2))?;
    state.update(&orthographic_frame(100.0))?;
    assert_eq!(
        state.levels_bytes().len(),
        state.mesh().vertices_len() * std::mem::size_of::<f32>()
    );
    Ok(())
}
