//! The device features the compositor reacts to.

use bitflags::bitflags;

bitflags! {
    /// Device features a [`GraphicsContext`](crate::GraphicsContext) can
    /// request or require.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GpuFeatures: u32 {
        /// Two fragment outputs feeding `Src1` blend factors.
        /// Enables the exact single-draw subpixel strategy.
        const DUAL_SOURCE_BLENDING = 1 << 0;
    }
}

const WGPU_FEATURES: [(GpuFeatures, wgpu::Features); 1] = [(
    GpuFeatures::DUAL_SOURCE_BLENDING,
    wgpu::Features::DUAL_SOURCE_BLENDING,
)];

impl GpuFeatures {
    /// Features the compositor asks for when the host does not say otherwise.
    pub fn compositor_defaults() -> Self {
        GpuFeatures::DUAL_SOURCE_BLENDING
    }

    pub fn to_wgpu(self) -> wgpu::Features {
        WGPU_FEATURES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .fold(wgpu::Features::empty(), |acc, (_, wgpu)| acc | *wgpu)
    }

    /// Flags for the features present in `features`; anything else is ignored.
    pub fn from_wgpu(features: wgpu::Features) -> Self {
        WGPU_FEATURES
            .iter()
            .filter(|(_, wgpu)| features.contains(*wgpu))
            .fold(GpuFeatures::empty(), |acc, (flag, _)| acc | *flag)
    }

    /// Features in `self` the adapter does not offer.
    pub fn missing_on(self, adapter: &wgpu::Adapter) -> GpuFeatures {
        self - GpuFeatures::from_wgpu(adapter.features())
    }
}

impl Default for GpuFeatures {
    fn default() -> Self {
        GpuFeatures::empty()
    }
}
