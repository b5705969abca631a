//! Headless estimator demo.
//!
//! Builds a wavy lattice of bicubic patches, flies an orbit camera towards
//! and away from it and logs the tessellation levels picked every frame.
//!
//! Run with `RUST_LOG=info` (or `debug` to see cache invalidation).

use ipass::{
    animation::AnimationCurve, camera::OrbitCamera, mesh::PatchMesh, projection::Viewport,
    slefe::Envelope, tess_level::EdgeMetric, EstimatorOptions, TessellationEstimatorState,
};

#[derive(Debug, structopt::StructOpt)]
#[structopt(name = "ipass-demo", about = "Adaptive tessellation level estimator demo")]
struct CommandLineOptions {
    /// Patches per side of the synthetic lattice.
    #[structopt(short = "p", long = "patches", default_value = "4")]
    patches: usize,

    /// Envelope divisions per parametric axis.
    #[structopt(short = "n", long = "divisions", default_value = "3")]
    divisions: usize,

    #[structopt(short = "f", long = "frames", default_value = "120")]
    frames: usize,

    #[structopt(long = "width", default_value = "1280")]
    width: u32,

    #[structopt(long = "height", default_value = "720")]
    height: u32,

    /// Round levels up to integers.
    #[structopt(long = "integer")]
    integer: bool,

    /// Bound patches by their control hull instead of the SLEFE.
    #[structopt(long = "control-hull")]
    control_hull: bool,

    /// Measure projected tile size instead of envelope width.
    #[structopt(long = "tile-metric")]
    tile_metric: bool,

    /// Switch to this many divisions halfway through.
    #[structopt(long = "refine-to")]
    refine_to: Option<usize>,
}

fn main() {
    pretty_env_logger::init();

    let command_line = {
        use structopt::StructOpt;
        CommandLineOptions::from_args()
    };

    if let Err(error) = run(&command_line) {
        log::error!("{error}");
        std::process::exit(1);
    }
}

fn run(command_line: &CommandLineOptions) -> ipass::Result<()> {
    let mesh = PatchMesh::lattice(command_line.patches, 1.0, |x, y| {
        0.15 * (3.0 * x).sin() * (2.0 * y).cos()
    })?;
    log::info!(
        "Lattice with {} patches over {} control points",
        mesh.patches_len(),
        mesh.vertices_len()
    );

    let centroid = mesh.centroid();
    let options = EstimatorOptions {
        divisions: command_line.divisions,
        fractional: !command_line.integer,
        envelope: if command_line.control_hull {
            Envelope::ControlHull
        } else {
            Envelope::BilinearSlefe
        },
        edge_metric: if command_line.tile_metric {
            EdgeMetric::Tile
        } else {
            EdgeMetric::Cell
        },
        ..Default::default()
    };
    let mut state = TessellationEstimatorState::new(mesh, options)?;

    let viewport = Viewport::new(command_line.width, command_line.height)?;
    let distance = AnimationCurve::new(1.5, 8.0, 0.8, 0.0);
    let azimuth = AnimationCurve::new(-30.0, 30.0, 0.3, 0.0);
    let mut camera = OrbitCamera {
        model_position: -centroid,
        elevation: -35.0,
        ..Default::default()
    };

    for frame in 0..command_line.frames {
        if frame == command_line.frames / 2 {
            if let Some(divisions) = command_line.refine_to {
                state.set_divisions(divisions)?;
            }
        }

        let t = frame as f32 / 30.0;
        camera.distance = distance.sample(t);
        camera.azimuth = azimuth.sample(t);

        let stats = state.update(&camera.frame_input(viewport))?;
        log::info!(
            "frame {frame:4} distance {:5.2}: {} visible, {} culled, max level {:.2}",
            camera.distance,
            stats.visible_patches,
            stats.culled_patches,
            stats.max_level
        );
        if stats.slefe_recomputations > 0 || stats.box_rebuilds > 0 {
            log::debug!(
                "recomputed {} envelopes, rebuilt {} box grids",
                stats.slefe_recomputations,
                stats.box_rebuilds
            );
        }
    }

    Ok(())
}
