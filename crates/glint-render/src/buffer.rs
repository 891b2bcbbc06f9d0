//! Per-frame streaming of display list geometry.
//!
//! A [`StreamBuffer`] is written front to back during a frame and rewound by
//! [`StreamBuffer::next_frame`]. When a write does not fit, a larger buffer
//! replaces the current one; passes already recorded keep referencing the old
//! buffer, so their data stays valid until submission.

use glint_core::profiling::profile_function;

/// Smallest buffer ever allocated, in bytes.
const MIN_CAPACITY: u64 = 4096;

/// A region written into a [`StreamBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSlice {
    pub offset: u64,
    pub size: u64,
}

/// A GPU buffer reused across frames and grown on demand.
pub struct StreamBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: wgpu::Buffer,
    capacity: u64,
    offset: u64,
}

impl StreamBuffer {
    pub fn new(
        device: &wgpu::Device,
        label: &'static str,
        usage: wgpu::BufferUsages,
        capacity: u64,
    ) -> Self {
        let capacity = grown_capacity(0, capacity);
        let buffer = create_buffer(device, label, usage, capacity);
        Self {
            label,
            usage,
            buffer,
            capacity,
            offset: 0,
        }
    }

    /// Append `data`, growing the buffer first if needed.
    ///
    /// `data` must be a multiple of `wgpu::COPY_BUFFER_ALIGNMENT` bytes long.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[u8]) -> StreamSlice {
        profile_function!();
        let size = data.len() as u64;

        if self.offset + size > self.capacity {
            let capacity = grown_capacity(self.capacity, self.offset + size);
            tracing::debug!(
                "Growing {} from {} to {} bytes",
                self.label,
                self.capacity,
                capacity
            );
            self.buffer = create_buffer(device, self.label, self.usage, capacity);
            self.capacity = capacity;
            self.offset = 0;
        }

        let slice = StreamSlice {
            offset: self.offset,
            size,
        };
        if size > 0 {
            queue.write_buffer(&self.buffer, slice.offset, data);
        }
        self.offset += size;
        tracing::trace!("Wrote {} bytes to {} at {}", size, self.label, slice.offset);
        slice
    }

    /// Rewind to the start of the buffer.
    pub fn next_frame(&mut self) {
        self.offset = 0;
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn remaining(&self) -> u64 {
        self.capacity - self.offset
    }
}

/// Next capacity able to hold `required` bytes: doubles the current one and
/// keeps the result aligned for `write_buffer`.
pub(crate) fn grown_capacity(current: u64, required: u64) -> u64 {
    let target = required.max(current.saturating_mul(2)).max(MIN_CAPACITY);
    target.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
}

fn create_buffer(
    device: &wgpu::Device,
    label: &'static str,
    usage: wgpu::BufferUsages,
    size: u64,
) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
