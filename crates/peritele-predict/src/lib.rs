//! Peripheral teleportation technique.
//!
//! Two auxiliary rigs ("current" and "predicted") are re-posed once per
//! teleport interval; the periphery crossfades from the current rig's image
//! to the predicted rig's image over the interval.
pub mod vectors;
pub mod aux_rig;
pub mod cycle;
pub mod sway;
pub mod predictive;

pub use vectors::{PredictionVectors, Forecast};
pub use aux_rig::{AuxRig, AuxEyeCamera};
pub use cycle::{TeleportCycle, BlendOverride, repeat};
pub use sway::{SwayDetector, axis_stationary};
pub use predictive::PredictiveRestrictor;
