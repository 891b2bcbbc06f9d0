//! Blocking copy of an offscreen target back to the CPU.

use glint_core::profiling::profile_function;

use crate::error::{RenderError, RenderResult};

/// Read a 4-byte-per-texel 2D texture (e.g. `Rgba8Unorm`) into tightly
/// packed rows.
///
/// The texture needs `COPY_SRC` usage. Blocks until the GPU has finished.
pub fn read_texture_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
) -> RenderResult<Vec<u8>> {
    profile_function!();

    let format = texture.format();
    if format.block_copy_size(None) != Some(4) {
        return Err(RenderError::Readback(format!(
            "unsupported format {:?}",
            format
        )));
    }

    let size = texture.size();
    let (width, height) = (size.width, size.height);
    let unpadded_bytes_per_row = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: (bytes_per_row * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .map_err(|err| RenderError::Readback(err.to_string()))?;

    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => return Err(RenderError::Readback(err.to_string())),
        Err(err) => return Err(RenderError::Readback(err.to_string())),
    }

    let data = slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
    for row in data.chunks(bytes_per_row as usize) {
        pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
    }
    drop(data);
    buffer.unmap();

    tracing::trace!("Read back {}x{} texels", width, height);
    Ok(pixels)
}
