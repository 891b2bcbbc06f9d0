//! Recording a display list into render passes.

use glint_core::profiling::{profile_function, profile_scope};

use crate::camera::CameraUniform;
use crate::compositor::{Command, DisplayList, PipelineKind};
use crate::error::{RenderError, RenderResult};
use crate::renderer::{AtlasBindings, SubpixelRenderer};
use crate::strategy::{DrawKind, FlatBlend};

/// Statistics for a rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub passes: usize,
    pub draw_calls: usize,
    /// Draw calls issued for subpixel batches, after strategy expansion.
    pub subpixel_draw_calls: usize,
}

/// One frame of drawing, borrowed from a [`SubpixelRenderer`].
///
/// Created by [`SubpixelRenderer::begin_frame`]. Statistics are handed back to
/// the renderer when the frame is dropped or [finished](Self::finish).
pub struct Frame<'a> {
    renderer: &'a mut SubpixelRenderer,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    camera: CameraUniform,
    stats: FrameStats,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(
        renderer: &'a mut SubpixelRenderer,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        camera: CameraUniform,
    ) -> Self {
        Self {
            renderer,
            device,
            queue,
            camera,
            stats: FrameStats::default(),
        }
    }

    pub fn camera(&self) -> &CameraUniform {
        &self.camera
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Clear `target` and the depth attachment, then draw `list`.
    ///
    /// The depth attachment is resized to the target's texture first, so a
    /// host that never called [`SubpixelRenderer::resize`] still gets a
    /// matching pass. A zero-sized target fails with
    /// [`RenderError::EmptyTarget`].
    pub fn encode(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        list: &DisplayList,
        atlases: &(impl AtlasBindings + ?Sized),
    ) -> RenderResult<()> {
        profile_function!();

        let size = target.texture().size();
        self.renderer.resize(self.device, size.width, size.height)?;

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Compositor Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.renderer.config.clear_color.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(self.renderer.depth.attachment()),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.stats.passes += 1;

        self.draw(&mut pass, list, atlases)
    }

    /// Record `list` into a pass the caller began.
    ///
    /// The pass must target the configured color format and use
    /// [`SubpixelRenderer::depth`] as its depth attachment. Each `Subpixel`
    /// draw is issued once per pass of the active strategy, in pass order.
    pub fn draw(
        &mut self,
        pass: &mut wgpu::RenderPass<'_>,
        list: &DisplayList,
        atlases: &(impl AtlasBindings + ?Sized),
    ) -> RenderResult<()> {
        profile_function!();

        validate_atlases(list, atlases)?;
        if list.is_empty() {
            return Ok(());
        }

        let renderer = &mut *self.renderer;
        let vertex_slice = {
            profile_scope!("upload_vertices");
            renderer
                .vertices
                .write(self.device, self.queue, bytemuck::cast_slice(list.vertices()))
        };
        let index_slice = {
            profile_scope!("upload_indices");
            renderer
                .indices
                .write(self.device, self.queue, bytemuck::cast_slice(list.indices()))
        };

        pass.set_bind_group(0, &renderer.camera_bind_group, &[]);
        pass.set_bind_group(1, &renderer.fallback_bind_group, &[]);
        pass.set_vertex_buffer(
            0,
            renderer
                .vertices
                .buffer()
                .slice(vertex_slice.offset..vertex_slice.offset + vertex_slice.size),
        );
        pass.set_index_buffer(
            renderer
                .indices
                .buffer()
                .slice(index_slice.offset..index_slice.offset + index_slice.size),
            wgpu::IndexFormat::Uint32,
        );

        let pipelines = &renderer.pipelines;
        let passes = pipelines.strategy().passes(pipelines.pass_ordering());
        let mut current = None;

        for command in list.commands() {
            match *command {
                Command::BindPipeline(kind) => {
                    current = Some(kind);
                    match kind {
                        PipelineKind::Opaque => {
                            pass.set_pipeline(pipelines.get(DrawKind::Flat(FlatBlend::Opaque))?)
                        }
                        PipelineKind::Transparent => pass
                            .set_pipeline(pipelines.get(DrawKind::Flat(FlatBlend::Transparent))?),
                        // Set per draw, once for each strategy pass.
                        PipelineKind::Subpixel => {}
                    }
                }
                Command::BindTexture(atlas_index) => {
                    let group = atlases
                        .bind_group(atlas_index)
                        .ok_or(RenderError::MissingAtlas { atlas_index })?;
                    pass.set_bind_group(1, group, &[]);
                }
                Command::Draw { start, count } => {
                    let range = start..start + count;
                    match current {
                        Some(PipelineKind::Subpixel) => {
                            for descriptor in &passes {
                                pass.set_pipeline(pipelines.get(descriptor.kind)?);
                                pass.draw_indexed(range.clone(), 0, 0..1);
                                self.stats.draw_calls += 1;
                                self.stats.subpixel_draw_calls += 1;
                            }
                        }
                        Some(_) => {
                            pass.draw_indexed(range, 0, 0..1);
                            self.stats.draw_calls += 1;
                        }
                        None => {
                            tracing::warn!("Draw command before any pipeline was bound; skipped");
                        }
                    }
                }
            }
        }

        tracing::trace!(
            "Recorded {} draw calls ({} subpixel)",
            self.stats.draw_calls,
            self.stats.subpixel_draw_calls
        );
        Ok(())
    }

    /// End the frame and return its statistics.
    pub fn finish(self) -> FrameStats {
        self.stats
    }
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        self.renderer.last_stats = self.stats;
    }
}

/// Fail before recording anything if the list names an atlas the host lacks.
fn validate_atlases(list: &DisplayList, atlases: &(impl AtlasBindings + ?Sized)) -> RenderResult<()> {
    for command in list.commands() {
        if let Command::BindTexture(atlas_index) = *command
            && atlases.bind_group(atlas_index).is_none()
        {
            tracing::warn!("Display list references missing atlas {}", atlas_index);
            return Err(RenderError::MissingAtlas { atlas_index });
        }
    }
    Ok(())
}
