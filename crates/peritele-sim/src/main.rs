use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use peritele_core::{FALLBACK_REFRESH_HZ, RigSlot, Scalar, SessionConfig};
use peritele_predict::PredictiveRestrictor;
use peritele_restrictor::{
    CameraIntrinsics, EyeImages, FramePipeline, RecordingBackend, RenderBackend, RestrictorController, SceneRenderer,
    ViewLog,
};
use tracing::{info, warn};

mod camera;
mod script;
mod trace;

use script::{Scenario, ScriptedLocomotion};
use trace::{FrameRecord, Trace};

#[derive(Parser, Debug)]
#[command(name = "peritele-sim", version, about = "Drive the peripheral teleportation restrictor with scripted locomotion")]
struct Opts {
    /// Session config (TOML). Defaults apply to anything missing.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated session length, seconds
    #[arg(long, default_value_t = 5.0)]
    seconds: Scalar,

    /// Frame rate (default: display.refresh_rate from the config)
    #[arg(long)]
    fps: Option<Scalar>,

    #[arg(long, value_enum, default_value_t = Scenario::Walk)]
    scenario: Scenario,

    /// Postural sway amplitude of the synthetic head, metres
    #[arg(long, default_value_t = 0.01)]
    sway: Scalar,

    /// Eye target resolution
    #[arg(long, default_value_t = 1440)]
    width: u32,
    #[arg(long, default_value_t = 1600)]
    height: u32,

    /// Write a per-frame JSON trace here
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Pretty-print the trace
    #[arg(long, action = ArgAction::SetTrue)]
    pretty: bool,

    /// Run the kernel on a real adapter instead of the recording backend
    #[cfg(feature = "gpu")]
    #[arg(long, action = ArgAction::SetTrue)]
    gpu: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
}

/// Everything one run needs besides the backend.
struct SimRun<'a> {
    cfg: &'a SessionConfig,
    camera: CameraIntrinsics,
    script: ScriptedLocomotion,
    fps: Scalar,
    frames: u64,
}

fn run<B, R>(s: &mut SimRun<'_>, backend: &mut B, renderer: &mut R, trace: &mut Trace) -> Result<()>
where
    B: RenderBackend,
    R: SceneRenderer<B>,
{
    let pt = PredictiveRestrictor::new(&s.cfg.prediction, &s.script).context("prediction setup")?;
    let mut ctl: RestrictorController<B, PredictiveRestrictor<B::Target>> =
        RestrictorController::new(s.cfg, pt).context("restrictor setup")?;

    let desc = backend.eye_target_desc();
    let src = [backend.create_target(&desc, "eye-left"), backend.create_target(&desc, "eye-right")];
    let out = [backend.create_target(&desc, "out-left"), backend.create_target(&desc, "out-right")];
    let eyes = EyeImages { source: [&src[0], &src[1]], output: [&out[0], &out[1]] };

    let mut pipe = FramePipeline::new(s.camera);
    let dt = 1.0 / s.fps;
    for _ in 0..s.frames {
        let frame = s.script.step(dt, true);
        pipe.run_frame(&mut ctl, backend, renderer, &frame, &eyes).context("frame setup")?;
        trace.frames.push(FrameRecord::capture(&ctl, frame.rig.pos));
    }

    let pt = ctl.technique();
    info!(
        frames = ctl.core().session.frame,
        cycles = pt.cycle().cycles,
        sway_stops = pt.sway().stops,
        predicted = ?pt.rig(RigSlot::Predicted).pose.pos,
        "session finished"
    );
    ctl.teardown(backend);
    for t in src.into_iter().chain(out) { backend.release(t); }
    Ok(())
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    init_tracing(opts.verbose);

    let cfg = match &opts.config {
        Some(p) => SessionConfig::load(p).with_context(|| format!("load {}", p.display()))?,
        None => SessionConfig::default(),
    };
    let fps = opts.fps.unwrap_or(cfg.display.refresh_rate);
    let fps = if fps > 0.0 { fps } else { FALLBACK_REFRESH_HZ };
    if opts.pretty && opts.trace.is_none() {
        warn!("--pretty has no effect without --trace");
    }

    let mut session = SimRun {
        cfg: &cfg,
        camera: camera::headset_camera(opts.width, opts.height, 0.064),
        script: ScriptedLocomotion::new(opts.scenario, cfg.locomotion.clone(), opts.sway),
        fps,
        frames: (opts.seconds.max(0.0) * fps).round() as u64,
    };
    info!(scenario = ?opts.scenario, fps, frames = session.frames, "starting");
    let mut trace = Trace::new(opts.scenario, fps);

    #[cfg(feature = "gpu")]
    if opts.gpu {
        let mut backend = peritele_gpu::GpuCompositor::new(opts.width, opts.height)?;
        let mut renderer = peritele_gpu::ClearRenderer::default();
        run(&mut session, &mut backend, &mut renderer, &mut trace)?;
        backend.wait_idle();
        info!(views = renderer.rendered, "gpu run complete");
        return finish(&opts, &trace);
    }

    let mut backend = RecordingBackend::counting(opts.width, opts.height);
    let mut renderer = ViewLog::counting();
    run(&mut session, &mut backend, &mut renderer, &mut trace)?;
    info!(dispatches = backend.dispatch_count(), views = renderer.drawn, "recording run complete");
    finish(&opts, &trace)
}

fn finish(opts: &Opts, trace: &Trace) -> Result<()> {
    if let Some(path) = &opts.trace {
        trace.write(path, opts.pretty)?;
        info!(path = %path.display(), frames = trace.frames.len(), "trace written");
    }
    Ok(())
}
