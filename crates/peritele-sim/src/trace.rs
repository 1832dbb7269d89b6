use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use peritele_core::{RigSlot, Scalar};
use peritele_predict::PredictiveRestrictor;
use peritele_restrictor::{RenderBackend, RestrictorController};
use serde::Serialize;

use crate::script::Scenario;

/// One frame of controller state as uploaded to the kernel.
#[derive(Clone, Debug, Serialize)]
pub struct FrameRecord {
    pub frame: u64,
    pub t: Scalar,
    pub is_moving: bool,
    pub is_turning: bool,
    pub motion: String,
    pub fov_lerp: Scalar,
    pub radius: Scalar,
    pub shift: Scalar,
    pub transition: Scalar,
    pub blend: Scalar,
    pub cycles: u64,
    pub rig_pos: [Scalar; 3],
    pub current_pos: [Scalar; 3],
    pub predicted_pos: [Scalar; 3],
}

impl FrameRecord {
    pub fn capture<B: RenderBackend>(ctl: &RestrictorController<B, PredictiveRestrictor<B::Target>>, rig_pos: glam::Vec3) -> Self {
        let core = ctl.core();
        let st = core.state();
        let p = &core.params;
        let pt = ctl.technique();
        Self {
            frame: core.session.frame,
            t: core.session.elapsed,
            is_moving: st.is_moving,
            is_turning: st.is_turning,
            motion: format!("{:?}", st.motion.class),
            fov_lerp: st.fov_lerp,
            radius: p.radius,
            shift: p.shift,
            transition: p.transition,
            blend: p.lerp,
            cycles: pt.cycle().cycles,
            rig_pos: rig_pos.to_array(),
            current_pos: pt.rig(RigSlot::Current).pose.pos.to_array(),
            predicted_pos: pt.rig(RigSlot::Predicted).pose.pos.to_array(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Trace {
    pub scenario: Scenario,
    pub fps: Scalar,
    pub frames: Vec<FrameRecord>,
}

impl Trace {
    pub fn new(scenario: Scenario, fps: Scalar) -> Self { Self { scenario, fps, frames: Vec::new() } }

    pub fn write(&self, path: &Path, pretty: bool) -> Result<()> {
        let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let w = BufWriter::new(f);
        if pretty { serde_json::to_writer_pretty(w, self)?; } else { serde_json::to_writer(w, self)?; }
        Ok(())
    }
}
