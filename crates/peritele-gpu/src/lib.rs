//! wgpu implementation of the compositor seam.
pub mod error;
pub mod compositor;
pub mod clear;

pub use error::GpuError;
pub use compositor::{GpuCompositor, GpuTarget, texture_format, texture_usage};
pub use clear::{ClearRenderer, clear_color};

/// The compositing kernel, also checked by tests.
pub const PERIPHERAL_WGSL: &str = include_str!("wgsl/peripheral.wgsl");
