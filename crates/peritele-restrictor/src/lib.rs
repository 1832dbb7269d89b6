//! FOV restrictor: decides how much of the periphery to occlude each frame and
//! feeds the compositing kernel.
//!
//! A locomotion technique plugs in through [`Technique`]; the controller owns
//! the motion state machine, stereo projection bookkeeping and the per-eye
//! compositing hook.
pub mod motion;
pub mod kernel;
pub mod projection;
pub mod backend;
pub mod technique;
pub mod controller;
pub mod pipeline;
pub mod recording;

pub use motion::{MotionClass, MotionSample, MotionThresholds, is_stationary, rotate_direction, translate_direction};
pub use kernel::{KernelParams, DispatchGrid, KERNEL_GROUP_SIZE, STEREO_EYES};
pub use projection::{CameraIntrinsics, EyeProjections, off_axis_lh};
pub use backend::{RenderBackend, SceneRenderer, TargetDesc, KernelBindings, OffscreenView};
pub use technique::{Technique, MovingUpdate};
pub use controller::{RestrictorController, RestrictorCore, RestrictorState, EASE_GUARD};
pub use pipeline::{FramePipeline, EyeImages};
pub use recording::{RecordingBackend, BackendEvent, TargetId, ViewLog, ViewRecord};
