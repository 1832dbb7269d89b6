//! Headless backend that records every GPU-side call. Drives tests and the
//! simulator when no adapter is available.
use std::fmt;

use peritele_core::{Eye, Pose, RigSlot};

use crate::{DispatchGrid, KernelBindings, KernelParams, OffscreenView, RenderBackend, SceneRenderer, TargetDesc};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TargetId(pub u32);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "tex#{}", self.0) }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BackendEvent {
    Created { id: TargetId, desc: TargetDesc, label: String },
    Acquired { id: TargetId, desc: TargetDesc },
    Released(TargetId),
    Dispatched {
        params: KernelParams,
        result: TargetId,
        moving_cam: TargetId,
        current: Option<TargetId>,
        predicted: Option<TargetId>,
        grid: DispatchGrid,
    },
    Blit { src: TargetId, dst: TargetId },
}

pub struct RecordingBackend {
    eye: TargetDesc,
    next: u32,
    scratch: Vec<TargetId>,
    keep_events: bool,
    dispatched: u64,
    pub events: Vec<BackendEvent>,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: TargetDesc::new(width, height),
            next: 0,
            scratch: Vec::new(),
            keep_events: true,
            dispatched: 0,
            events: Vec::new(),
        }
    }

    /// Keeps counters only; `events` stays empty. For long headless runs.
    pub fn counting(width: u32, height: u32) -> Self {
        Self { keep_events: false, ..Self::new(width, height) }
    }

    fn record(&mut self, event: BackendEvent) {
        if self.keep_events { self.events.push(event); }
    }

    /// Kernel dispatches issued so far, recorded or not.
    #[inline] pub fn dispatch_count(&self) -> u64 { self.dispatched }

    fn alloc(&mut self) -> TargetId {
        let id = TargetId(self.next);
        self.next += 1;
        id
    }

    /// Eye-sized target standing in for an engine-owned image (eye source or display output).
    pub fn target(&mut self, label: &str) -> TargetId {
        let desc = self.eye;
        self.create_target(&desc, label)
    }

    /// Scratch targets acquired but not yet released.
    pub fn live_scratch(&self) -> usize { self.scratch.len() }

    pub fn dispatches(&self) -> impl Iterator<Item = &KernelParams> + '_ {
        self.events.iter().filter_map(|e| match e {
            BackendEvent::Dispatched { params, .. } => Some(params),
            _ => None,
        })
    }
}

impl RenderBackend for RecordingBackend {
    type Target = TargetId;

    fn eye_target_desc(&self) -> TargetDesc { self.eye }

    fn create_target(&mut self, desc: &TargetDesc, label: &str) -> TargetId {
        let id = self.alloc();
        self.record(BackendEvent::Created { id, desc: *desc, label: label.to_owned() });
        id
    }

    fn acquire_scratch(&mut self, desc: &TargetDesc) -> TargetId {
        let id = self.alloc();
        self.scratch.push(id);
        self.record(BackendEvent::Acquired { id, desc: *desc });
        id
    }

    fn release(&mut self, target: TargetId) {
        self.scratch.retain(|t| *t != target);
        self.record(BackendEvent::Released(target));
    }

    fn dispatch(&mut self, params: &KernelParams, b: &KernelBindings<'_, TargetId>, grid: DispatchGrid) {
        self.dispatched += 1;
        self.record(BackendEvent::Dispatched {
            params: *params,
            result: *b.result,
            moving_cam: *b.moving_cam,
            current: b.current.copied(),
            predicted: b.predicted.copied(),
            grid,
        });
    }

    fn blit(&mut self, src: &TargetId, dst: &TargetId) {
        self.record(BackendEvent::Blit { src: *src, dst: *dst });
    }
}

/// One recorded off-screen render.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewRecord {
    pub slot: RigSlot,
    pub eye: Eye,
    pub pose: Pose,
    pub target: TargetId,
    pub depth: i32,
}

/// Scene renderer that only logs which views were drawn, in order.
pub struct ViewLog {
    pub views: Vec<ViewRecord>,
    pub drawn: u64,
    keep: bool,
}

impl Default for ViewLog {
    fn default() -> Self { Self { views: Vec::new(), drawn: 0, keep: true } }
}

impl ViewLog {
    /// Counts views without keeping them.
    pub fn counting() -> Self { Self { keep: false, ..Self::default() } }
}

impl SceneRenderer<RecordingBackend> for ViewLog {
    fn render(&mut self, _backend: &mut RecordingBackend, v: &OffscreenView<'_, TargetId>) {
        self.drawn += 1;
        if self.keep {
            self.views.push(ViewRecord { slot: v.slot, eye: v.eye, pose: v.pose, target: *v.target, depth: v.depth });
        }
    }
}
