pub mod scalar;
pub mod ids;
pub mod types;
pub mod frame;
pub mod session;
pub mod schedule;
pub mod config;
pub mod error;
pub mod locomotion;

pub use scalar::{Scalar, FALLBACK_REFRESH_HZ};
pub use ids::{Eye, RigSlot};
pub use types::{Pose, vec3, pose, ground_dir, project_on_plane, sign_or_one};
pub use frame::FrameInput;
pub use session::Session;
pub use schedule::{FrameStage, is_ordered};
pub use config::{
    SessionConfig, RestrictorConfig, PredictionConfig, LocomotionConfig, DisplayConfig, GraphicsApi,
};
pub use error::SetupError;
pub use locomotion::LocomotionSource;
pub use glam::{Mat4, Quat, Vec3};
