use thiserror::Error;

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("no compatible GPU adapter")]
    NoAdapter,

    #[error("GPU device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("eye target has zero size ({width}x{height})")]
    ZeroExtent { width: u32, height: u32 },
}
