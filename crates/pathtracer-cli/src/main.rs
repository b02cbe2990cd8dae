mod output;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use itertools::Itertools;
use output::{FileOutput, QuarterOutput, StreamingOutputs, TevStreaming};
use pathtracer::{
    camera::Camera,
    controller::{RenderController, RenderOptions},
    cpu::CpuDevice,
    output::run_headless,
    scene::SceneBuilder,
    utils::{counter::report_counters, timer::timed_scope_log},
};
use utils::{AvailableOutput, AvailableScene, Dimensions};

#[derive(Parser, Debug)]
#[command(name = "pathtracer", about = "Progressive triangle path tracer")]
pub struct Args {
    #[arg(short, long)]
    /// Render without a window and save the result to this file
    file: Option<PathBuf>,

    #[arg(short = 's', long, default_value_t = 4)]
    /// Samples per pixel for each launch
    launch_samples: u32,

    #[arg(long)]
    /// Display through a host copy instead of writing into the locked display texture
    no_gl_interop: bool,

    #[arg(long, default_value = "768x768")]
    /// Screen dimension in format `width`x`height`
    dim: Dimensions,

    #[arg(long, value_enum, default_value_t)]
    /// Scene selector
    scene: AvailableScene,

    #[arg(long)]
    /// OBJ mesh used by the showcase scene
    mesh: Option<PathBuf>,

    #[arg(long, default_value_t = 6)]
    /// Maximum number of bounces
    depth: u32,

    #[arg(short, long, value_enum)]
    output: Vec<AvailableOutput>,

    #[arg(long)]
    tev_hostname: Option<String>,

    #[arg(long)]
    tev_path: Option<String>,

    #[arg(long, default_value = "quarters")]
    /// Where the quarters output writes its files
    quarter_dir: PathBuf,

    #[arg(long, default_value_t = 1)]
    /// Number of launches accumulated before saving, with --file
    frames: u32,

    #[arg(long, default_value_t)]
    /// Seed to use for all the random stuff.
    /// Given a seed, the rendering is deterministic.
    seed: u64,
}

impl Args {
    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            samples_per_launch: self.launch_samples,
            max_depth: self.depth,
            seed: self.seed,
        }
    }

    fn streaming_outputs(&self) -> Result<StreamingOutputs> {
        let mut outputs = StreamingOutputs::default();
        for o in self.output.iter().copied().unique() {
            match o {
                AvailableOutput::Tev => outputs.push(
                    "tev",
                    Box::new(TevStreaming::new(
                        self.dim,
                        self.tev_path.clone(),
                        self.tev_hostname.clone(),
                    )?),
                ),
                AvailableOutput::Quarters => outputs.push(
                    "quarters",
                    Box::new(QuarterOutput::new(&self.quarter_dir)?),
                ),
            }
        }
        Ok(outputs)
    }
}

#[cfg(feature = "window")]
fn run_window(
    args: &Args,
    controller: &mut RenderController,
    device: &mut CpuDevice,
    scene: &pathtracer::scene::Scene<pathtracer::cpu::CpuTraversable>,
    stream: &mut StreamingOutputs,
) -> Result<()> {
    let output::SdlWindow {
        mut display,
        mut events,
    } = output::SdlWindow::new("pathtracer", args.dim, !args.no_gl_interop)?;
    let mut snapshot = FileOutput::new(args.file.clone().unwrap_or("output.png".into()));

    pathtracer::output::run_interactive(
        controller,
        device,
        scene,
        &mut events,
        &mut display,
        stream,
        &mut snapshot,
    )
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if !cfg!(feature = "window") && args.file.is_none() {
        anyhow::bail!("Built without the window feature: an output file is needed (--file)");
    }

    log::info!("loading scene {:?}", args.scene);
    let mut builder = SceneBuilder::new();
    args.scene.insert_into(&mut builder, args.mesh.clone())?;
    log::info!(
        "{} triangles, {} materials, {} lights",
        builder.triangle_count(),
        builder.materials().len(),
        builder.lights().len()
    );

    let mut device = CpuDevice::new();
    let scene = builder.build(&mut device)?;

    let mut stream = args.streaming_outputs()?;
    log::debug!("{} streaming outputs", stream.len());
    if args.no_gl_interop && args.file.is_some() {
        log::warn!("--no-gl-interop has no effect without a window");
    }
    let mut controller = RenderController::new(
        Camera::default(),
        args.dim.width,
        args.dim.height,
        args.render_options(),
    );

    match args.file {
        Some(ref path) => {
            let mut file = FileOutput::new(path);
            timed_scope_log("render", || {
                run_headless(
                    &mut controller,
                    &mut device,
                    &scene,
                    args.frames,
                    &mut stream,
                    &mut file,
                )
            })
            .res?;
        }
        None => {
            #[cfg(feature = "window")]
            run_window(&args, &mut controller, &mut device, &scene, &mut stream)?;
        }
    }

    report_counters();
    Ok(())
}
