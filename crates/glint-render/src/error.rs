use crate::features::GpuFeatures;
use crate::strategy::{DrawKind, SubpixelStrategy};

/// Errors raised while creating a [`GraphicsContext`](crate::GraphicsContext).
#[derive(Debug, Clone)]
pub enum GraphicsError {
    /// No adapter matched the requested backends and power preference.
    NoAdapter(String),

    /// The adapter refused to create a device.
    DeviceCreationFailed(String),

    /// Features marked as required are not offered by the adapter.
    MissingRequiredFeatures {
        missing: GpuFeatures,
        adapter: String,
    },
}

impl std::fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphicsError::NoAdapter(msg) => write!(f, "Failed to find a suitable GPU adapter: {}", msg),
            GraphicsError::DeviceCreationFailed(msg) => {
                write!(f, "Failed to create device: {}", msg)
            }
            GraphicsError::MissingRequiredFeatures { missing, adapter } => write!(
                f,
                "Required GPU features {:?} are not supported by adapter {}",
                missing, adapter
            ),
        }
    }
}

impl std::error::Error for GraphicsError {}

impl From<wgpu::RequestAdapterError> for GraphicsError {
    fn from(err: wgpu::RequestAdapterError) -> Self {
        GraphicsError::NoAdapter(err.to_string())
    }
}

impl From<wgpu::RequestDeviceError> for GraphicsError {
    fn from(err: wgpu::RequestDeviceError) -> Self {
        GraphicsError::DeviceCreationFailed(err.to_string())
    }
}

/// Errors raised by the compositor while building pipelines or drawing.
#[derive(Debug, Clone)]
pub enum RenderError {
    /// A display list referenced an atlas the host did not provide.
    MissingAtlas { atlas_index: usize },

    /// No pipeline was built for the draw kind.
    ///
    /// Pipelines are only created for the kinds the selected strategy uses.
    MissingPipeline(DrawKind),

    /// The strategy needs device features that are not all enabled.
    UnsupportedStrategy {
        strategy: SubpixelStrategy,
        required: wgpu::Features,
    },

    /// The render target has a zero dimension.
    EmptyTarget { width: u32, height: u32 },

    /// Copying a target back to the CPU failed.
    Readback(String),

    /// Context creation failed.
    Graphics(GraphicsError),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::MissingAtlas { atlas_index } => {
                write!(f, "No bind group for atlas {}", atlas_index)
            }
            RenderError::MissingPipeline(kind) => {
                write!(f, "No pipeline built for draw kind {:?}", kind)
            }
            RenderError::UnsupportedStrategy { strategy, required } => write!(
                f,
                "Subpixel strategy {:?} requires device features {:?}",
                strategy, required
            ),
            RenderError::EmptyTarget { width, height } => {
                write!(f, "Render target is empty: {}x{}", width, height)
            }
            RenderError::Readback(msg) => write!(f, "Readback failed: {}", msg),
            RenderError::Graphics(err) => write!(f, "Graphics error: {}", err),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Graphics(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GraphicsError> for RenderError {
    fn from(err: GraphicsError) -> Self {
        RenderError::Graphics(err)
    }
}

/// Result type for compositor operations.
pub type RenderResult<T> = Result<T, RenderError>;
