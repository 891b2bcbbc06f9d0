//! Render pipelines for every [`DrawKind`] a strategy issues.

use ahash::AHashMap;
use glint_core::profiling::{profile_function, profile_scope};

use crate::config::CompositorConfig;
use crate::error::{RenderError, RenderResult};
use crate::shaders::{COMPOSITOR_SHADER, DUAL_SOURCE_SHADER};
use crate::strategy::{
    BackendCapabilities, DrawKind, FlatBlend, PassOrdering, SubpixelStrategy, select_strategy,
};
use crate::vertex::Vertex;

/// Kinds a strategy needs: both flat kinds plus its subpixel passes.
pub fn required_draw_kinds(strategy: SubpixelStrategy) -> Vec<DrawKind> {
    let mut kinds = vec![
        DrawKind::Flat(FlatBlend::Opaque),
        DrawKind::Flat(FlatBlend::Transparent),
    ];
    kinds.extend_from_slice(strategy.draw_kinds());
    kinds
}

/// Bind group layouts, the atlas sampler and one pipeline per required
/// [`DrawKind`].
pub struct CompositorPipelines {
    strategy: SubpixelStrategy,
    ordering: PassOrdering,
    camera_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    pipelines: AHashMap<DrawKind, wgpu::RenderPipeline>,
}

impl CompositorPipelines {
    /// Select a strategy for `capabilities` and build its pipelines.
    ///
    /// Fails with [`RenderError::UnsupportedStrategy`] when the selected
    /// strategy needs features the device was not created with.
    pub fn new(
        device: &wgpu::Device,
        config: &CompositorConfig,
        capabilities: BackendCapabilities,
    ) -> RenderResult<Self> {
        profile_function!();

        let strategy = select_strategy(capabilities, config.strategy);
        let required = strategy.required_features();
        if !device.features().contains(required) {
            return Err(RenderError::UnsupportedStrategy {
                strategy,
                required,
            });
        }

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Compositor Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Compositor Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Compositor Atlas Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: config.filter,
            min_filter: config.filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Compositor Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Compositor Shader"),
            source: wgpu::ShaderSource::Wgsl(COMPOSITOR_SHADER.into()),
        });
        let kinds = required_draw_kinds(strategy);
        let needs_dual_source = kinds.iter().any(|kind| kind.blend_mode().uses_dual_source());
        let dual_source_shader = needs_dual_source.then(|| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Compositor Dual Source Shader"),
                source: wgpu::ShaderSource::Wgsl(DUAL_SOURCE_SHADER.into()),
            })
        });

        let mut pipelines = AHashMap::new();
        for kind in kinds {
            profile_scope!("create_pipeline");
            let module = if kind.blend_mode().uses_dual_source() {
                dual_source_shader
                    .as_ref()
                    .ok_or(RenderError::MissingPipeline(kind))?
            } else {
                &shader
            };
            let pipeline = create_pipeline(device, &pipeline_layout, module, kind, config);
            pipelines.insert(kind, pipeline);
        }

        tracing::debug!(
            "Created {} compositor pipelines for {:?} ({:?})",
            pipelines.len(),
            strategy,
            config.pass_ordering
        );

        Ok(Self {
            strategy,
            ordering: config.pass_ordering,
            camera_layout,
            texture_layout,
            sampler,
            pipelines,
        })
    }

    pub fn strategy(&self) -> SubpixelStrategy {
        self.strategy
    }

    pub fn pass_ordering(&self) -> PassOrdering {
        self.ordering
    }

    pub fn get(&self, kind: DrawKind) -> RenderResult<&wgpu::RenderPipeline> {
        self.pipelines
            .get(&kind)
            .ok_or(RenderError::MissingPipeline(kind))
    }

    pub fn contains(&self, kind: DrawKind) -> bool {
        self.pipelines.contains_key(&kind)
    }

    pub fn camera_layout(&self) -> &wgpu::BindGroupLayout {
        &self.camera_layout
    }

    pub fn texture_layout(&self) -> &wgpu::BindGroupLayout {
        &self.texture_layout
    }

    /// Bind group 1 for an atlas or image texture, using the shared sampler.
    pub fn create_texture_bind_group(
        &self,
        device: &wgpu::Device,
        view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Compositor Texture Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    pub(crate) fn create_camera_bind_group(
        &self,
        device: &wgpu::Device,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Compositor Camera Bind Group"),
            layout: &self.camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    kind: DrawKind,
    config: &CompositorConfig,
) -> wgpu::RenderPipeline {
    let ordering = config.pass_ordering;
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(kind.label()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some(kind.vertex_variant(ordering).entry_point()),
            buffers: &[Vertex::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(kind.fragment_entry()),
            targets: &[Some(
                kind.blend_mode()
                    .to_color_target_state(config.target_format, kind.write_mask()),
            )],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(kind.depth_stencil(config.depth_format)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
