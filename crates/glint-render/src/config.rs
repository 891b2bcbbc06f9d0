use crate::color::Color;
use crate::depth::DEFAULT_DEPTH_FORMAT;
use crate::strategy::{PassOrdering, StrategyPreference};

/// Configuration for [`SubpixelRenderer`](crate::SubpixelRenderer) and
/// [`CompositorPipelines`](crate::CompositorPipelines).
///
/// # Example
///
/// ```
/// use glint_render::{CompositorConfig, PassOrdering, StrategyPreference};
///
/// let config = CompositorConfig::new()
///     .with_target_format(wgpu::TextureFormat::Rgba8Unorm)
///     .with_strategy(StrategyPreference::ThreePass)
///     .with_pass_ordering(PassOrdering::DepthPlanes);
/// assert_eq!(config.strategy, StrategyPreference::ThreePass);
/// ```
#[derive(Clone, Debug)]
pub struct CompositorConfig {
    /// Format of the color target the pipelines render into.
    /// Default: `Bgra8Unorm` (linear, so blending happens on encoded values)
    pub target_format: wgpu::TextureFormat,
    /// Default: `Depth32Float`
    pub depth_format: wgpu::TextureFormat,
    pub strategy: StrategyPreference,
    /// Default: `Submission`
    pub pass_ordering: PassOrdering,
    /// Color the target is cleared to by [`Frame::encode`](crate::Frame::encode).
    /// Default: white
    pub clear_color: Color,
    /// Filtering of the atlas sampler. Default: `Linear`
    pub filter: wgpu::FilterMode,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            target_format: wgpu::TextureFormat::Bgra8Unorm,
            depth_format: DEFAULT_DEPTH_FORMAT,
            strategy: StrategyPreference::Auto,
            pass_ordering: PassOrdering::Submission,
            clear_color: Color::WHITE,
            filter: wgpu::FilterMode::Linear,
        }
    }
}

impl CompositorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.target_format = format;
        self
    }

    pub fn with_depth_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.depth_format = format;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyPreference) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_pass_ordering(mut self, ordering: PassOrdering) -> Self {
        self.pass_ordering = ordering;
        self
    }

    pub fn with_clear_color(mut self, color: impl Into<Color>) -> Self {
        self.clear_color = color.into();
        self
    }

    /// Nearest filtering keeps coverage texels unblended when glyph quads are
    /// pixel-aligned.
    pub fn with_filter(mut self, filter: wgpu::FilterMode) -> Self {
        self.filter = filter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompositorConfig::default();
        assert_eq!(config.depth_format, wgpu::TextureFormat::Depth32Float);
        assert_eq!(config.strategy, StrategyPreference::Auto);
        assert_eq!(config.pass_ordering, PassOrdering::Submission);
        assert_eq!(config.clear_color, Color::WHITE);
    }

    #[test]
    fn test_builder_overrides() {
        let config = CompositorConfig::new()
            .with_clear_color([0.0, 0.0, 0.0, 1.0])
            .with_filter(wgpu::FilterMode::Nearest);
        assert_eq!(config.clear_color, Color::BLACK);
        assert_eq!(config.filter, wgpu::FilterMode::Nearest);
    }
}
