//! Error types for the particle backdrop.
//!
//! The backdrop is decorative, so most of these never reach the user: the
//! component logs them and degrades to "no backdrop visible".

use thiserror::Error;

/// Errors that can occur while creating the GPU surface.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("Failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("No compatible GPU adapter found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    /// Failed to create GPU device.
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reported no usable texture format.
    #[error("GPU surface reports no supported texture formats")]
    NoSurfaceFormat,
}

/// Errors returned by a single frame's render.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The surface was lost or went out of date and must be reconfigured.
    #[error("Render surface lost or outdated")]
    Lost,
    /// Acquiring the next frame timed out; the frame is skipped.
    #[error("Timed out acquiring the next frame")]
    Timeout,
    /// The GPU ran out of memory.
    #[error("GPU out of memory")]
    OutOfMemory,
    /// The surface was already torn down.
    #[error("Render surface already released")]
    Released,
    /// Any other backend failure.
    #[error("Render failed: {0}")]
    Other(String),
}

impl RenderError {
    /// Whether the component can keep running after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RenderError::Lost | RenderError::Timeout)
    }
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(e: wgpu::SurfaceError) -> Self {
        match e {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => RenderError::Lost,
            wgpu::SurfaceError::Timeout => RenderError::Timeout,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            other => RenderError::Other(other.to_string()),
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),
    /// The TOML could not be parsed.
    #[error("Config parse error: {0}")]
    Parse(String),
    /// A value is out of range.
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Errors that can occur when mounting or running the backdrop.
#[derive(Error, Debug)]
pub enum BackdropError {
    /// The host container went away before the surface could be attached.
    #[error("Host container is not available")]
    HostUnavailable,
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Invalid configuration.
    #[error("{0}")]
    Config(#[from] ConfigError),
    /// Failed to create event loop.
    #[error("Failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}
