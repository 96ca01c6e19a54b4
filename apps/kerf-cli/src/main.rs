//! Kerf headless simulator
//!
//! Carves a block of stock along a pose program and optionally saves the
//! resulting voxel grid.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p kerf-cli -- [OPTIONS]
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod params;

use std::time::Duration;

use anyhow::{bail, Context};
use kerf_sim::{
    parse_pose_program, SegmentedToolpath, SimConfig, SimEvent, SimState, Simulation,
    DEFAULT_MIN_STEP,
};
use kerf_stock::{GridConfig, VoxelGrid};
use kerf_tool::{Bit, ToolLibrary, ToolShape};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::params::Params;

/// Poll interval for worker events.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Cutter used when nothing else names one: a 60 degree V bit.
const DEFAULT_TOOL: ToolShape = ToolShape::VMill {
    length: 1.0,
    radius: 0.0625,
    included_angle: 60.0,
};

fn main() -> anyhow::Result<()> {
    let params = Params::from_args(std::env::args().skip(1))?;
    if params.help {
        print_help();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    run(&params)
}

fn run(params: &Params) -> anyhow::Result<()> {
    let toolpath = match &params.toolpath {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading toolpath {}", path.display()))?;
            parse_pose_program(&text, DEFAULT_MIN_STEP)
                .with_context(|| format!("parsing toolpath {}", path.display()))?
        }
        None => SegmentedToolpath::default(),
    };
    info!(
        segments = toolpath.segments().len(),
        poses = toolpath.pose_count(),
        "toolpath loaded"
    );

    let grid = build_grid(params, &toolpath)?;
    let bit = Bit::from_shape(&select_tool(params, &toolpath)?);

    let config = SimConfig::default()
        .with_burst_budget(params.burst_budget)
        .with_stop_after_segment(false);
    let handle = Simulation::new(grid, bit, toolpath, config).spawn()?;

    loop {
        match handle.wait_event(POLL_INTERVAL) {
            Some(SimEvent::StateChanged(SimState::Paused)) => handle.resume(),
            Some(SimEvent::StateChanged(state)) if state.is_finished() => break,
            Some(SimEvent::BurstFinished(report)) => {
                let tiles = handle.surface().take_uploads(|_, _| {});
                let plot = handle.backplot();
                let plot = plot.read();
                debug!(
                    steps = plot.steps(),
                    total = plot.len(),
                    removed = report.removed,
                    tiles,
                    "progress"
                );
            }
            Some(SimEvent::StateChanged(_)) | None => {}
        }
    }

    let outcome = handle.join()?;
    info!(
        state = %outcome.state,
        steps = outcome.stats.steps,
        removed = outcome.stats.removed,
        bursts = outcome.stats.bursts,
        triangles = outcome.grid.surface().triangle_count(),
        "simulation finished"
    );

    if let Some(path) = &params.save_grid {
        if outcome.state == SimState::Done {
            outcome
                .grid
                .save(path)
                .with_context(|| format!("saving grid to {}", path.display()))?;
        }
    }
    Ok(())
}

/// Grid from `--load-grid`, else the program's stock, else the CLI box.
fn build_grid(params: &Params, toolpath: &SegmentedToolpath) -> anyhow::Result<VoxelGrid> {
    if let Some(path) = &params.load_grid {
        return VoxelGrid::load(path, params.flip)
            .with_context(|| format!("loading grid from {}", path.display()));
    }
    let config = match toolpath.stock() {
        Some(stock) if !params.explicit_size => stock.grid_config(params.resolution),
        _ => GridConfig::new(params.start, params.size, params.resolution),
    };
    Ok(VoxelGrid::new(config)?)
}

/// Tool from `--tool`, the tool table, the program, or the default V bit.
fn select_tool(params: &Params, toolpath: &SegmentedToolpath) -> anyhow::Result<ToolShape> {
    if let Some(directive) = &params.tool {
        return directive
            .parse()
            .with_context(|| format!("invalid tool '{directive}'"));
    }
    if let Some(file) = &params.tool_file {
        let library = ToolLibrary::load(file)
            .with_context(|| format!("loading tool table {}", file.display()))?;
        info!(tools = library.len(), "tool table loaded");
        let Some(number) = params.tool_number else {
            bail!("--tool-file needs --tool-number");
        };
        return Ok(library.shape(number)?);
    }
    Ok(toolpath.initial_tool().unwrap_or(DEFAULT_TOOL))
}

fn print_help() {
    eprintln!(
        "Kerf headless stock-removal simulator

USAGE:
    cargo run -p kerf-cli -- [OPTIONS]

STOCK OPTIONS:
    -x, -y, -z <N>          Grid origin (default: 0)
    -X, -Y, -Z <N>          Stock size; overrides a RectSolid in the program
                            (default: 1)
    -r, --resolution <N>    Voxel edge length (default: 0.01)
    --load-grid <FILE>      Load the stock from a saved grid instead
    --flip                  Mirror a loaded grid about its Y midplane

TOOLPATH OPTIONS:
    -p, --toolpath <FILE>   Pose program: one 'X Y Z [A]' per line,
                            '(...)' comments carry tool directives
    --burst-ms <N>          Simulation burst length in ms (default: 500)

TOOL OPTIONS:
    -t, --tool <DIRECTIVE>  Tool shape, e.g. \"BallMill 20 1.5\"
    --tool-file <CSV>       Tool table, used with --tool-number
    --tool-number <N>       Tool to take from the table

OUTPUT:
    --save-grid <FILE>      Save the grid when the simulation is done

OTHER:
    -h, --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log level (e.g., info, debug, trace)"
    );
}
