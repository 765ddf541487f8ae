//! Error types for lifeview.
//!
//! Frame-level errors ([`ViewError`]) never stop the render loop: the session
//! logs them and keeps showing the previous image. Host-level errors
//! ([`GpuError`], [`ViewerError`]) abort viewer startup.

use thiserror::Error;

/// Errors raised while decoding a snapshot into a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// A snapshot's shape disagrees with what it declares or with the
    /// buffer it is being drawn into.
    #[error("shape mismatch in {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Which dimension disagreed.
        what: &'static str,
        /// The declared or required size.
        expected: usize,
        /// The size actually found.
        got: usize,
    },

    /// A packed unit has more significant bits than the configured width.
    #[error("packed unit {value:#x} does not fit in {width} bits")]
    UnitOverflow {
        /// The offending packed value.
        value: u64,
        /// The configured unit width.
        width: u32,
    },

    /// A unit width outside `1..=64` was asked for when packing cells.
    #[error("unit width {0} is outside 1..=64")]
    UnitWidth(u32),

    /// A 3D cell held something other than 0 or 1.
    #[error("cell value {0} is not 0 or 1")]
    InvalidCell(u8),
}

impl ViewError {
    pub(crate) fn shape(what: &'static str, expected: usize, got: usize) -> Self {
        ViewError::ShapeMismatch { what, expected, got }
    }
}

/// Errors that can occur while loading or validating a [`ViewConfig`](crate::ViewConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid JSON for [`ViewConfig`](crate::ViewConfig).
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    /// A field holds a value the viewer cannot work with.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors that can occur while loading recorded frames.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read the recording.
    #[error("failed to read frames: {0}")]
    Io(#[from] std::io::Error),
    /// The recording is not a JSON list of frames.
    #[error("failed to parse frames: {0}")]
    Json(#[from] serde_json::Error),
    /// The recording holds no frames.
    #[error("recording contains no frames")]
    Empty,
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; ensure your system supports WebGPU/Vulkan/Metal/DX12")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reported no usable texture formats.
    #[error("surface has no supported texture format")]
    NoSurfaceFormat,
}

/// Errors that can occur when running the viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// No state source provided.
    #[error("no state source provided; use .with_source() to set one")]
    NoSource,
    /// The configuration was rejected.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// The state source could not be opened.
    #[error("state source error: {0}")]
    Source(#[from] SourceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_message_names_dimension() {
        let err = ViewError::shape("row width", 16, 24);
        assert_eq!(
            err.to_string(),
            "shape mismatch in row width: expected 16, got 24"
        );
    }

    #[test]
    fn viewer_error_wraps_gpu_error() {
        let err: ViewerError = GpuError::NoAdapter.into();
        assert!(matches!(err, ViewerError::Gpu(GpuError::NoAdapter)));
    }
}
