//! CPU-side batching of rectangles, images and subpixel glyphs into a
//! [`DisplayList`].
//!
//! Geometry is grouped into opaque, transparent and subpixel batches. Within a
//! group, batches are keyed by the atlas they sample; untextured rectangles
//! join any batch of their group since they never read the bound texture.

use glint_core::profiling::profile_function;

use crate::color::Color;
use crate::vertex::Vertex;

/// Rectangle with floating point coordinates, in the camera's units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<[f32; 4]> for Rect {
    fn from([x, y, width, height]: [f32; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<(f32, f32, f32, f32)> for Rect {
    fn from((x, y, width, height): (f32, f32, f32, f32)) -> Self {
        Self::new(x, y, width, height)
    }
}

/// Where an image or glyph lives inside a texture atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureLocation {
    pub atlas_index: usize,
    /// Normalized top-left UV.
    pub min: [f32; 2],
    /// Normalized bottom-right UV.
    pub max: [f32; 2],
}

impl TextureLocation {
    pub fn new(atlas_index: usize, min: [f32; 2], max: [f32; 2]) -> Self {
        Self {
            atlas_index,
            min,
            max,
        }
    }

    /// The whole atlas.
    pub fn full(atlas_index: usize) -> Self {
        Self::new(atlas_index, [0.0, 0.0], [1.0, 1.0])
    }
}

/// Pipelines a display list switches between.
///
/// `Subpixel` is expanded into the active strategy's passes at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Opaque,
    Transparent,
    Subpixel,
}

/// Command in a display list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Switch to the specified pipeline.
    BindPipeline(PipelineKind),
    /// Bind the atlas with this index at group 1.
    BindTexture(usize),
    /// Draw the specified range of indexed triangles.
    Draw { start: u32, count: u32 },
}

/// Geometry and commands for drawing one composition.
#[derive(Debug, Default, Clone)]
pub struct DisplayList {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    commands: Vec<Command>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.commands.clear();
    }
}

#[derive(Debug, Default)]
struct Batch {
    atlas_index: Option<usize>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Batch {
    fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.atlas_index = None;
    }

    fn accepts(&self, atlas_index: Option<usize>) -> bool {
        match (atlas_index, self.atlas_index) {
            (Some(wanted), Some(bound)) => wanted == bound,
            _ => true,
        }
    }

    fn add_rect(&mut self, rect: Rect, depth: f32, color: Color, location: Option<TextureLocation>) {
        let Rect {
            x,
            y,
            width: w,
            height: h,
        } = rect;

        let verts = match location {
            Some(location) => {
                // An untextured batch adopts the first atlas it is handed.
                self.atlas_index = Some(location.atlas_index);
                let [l, t] = location.min;
                let [r, b] = location.max;
                [
                    Vertex::textured([x, y, depth], color, [l, t]),
                    Vertex::textured([x, y + h, depth], color, [l, b]),
                    Vertex::textured([x + w, y + h, depth], color, [r, b]),
                    Vertex::textured([x + w, y, depth], color, [r, t]),
                ]
            }
            None => [
                Vertex::flat([x, y, depth], color),
                Vertex::flat([x, y + h, depth], color),
                Vertex::flat([x + w, y + h, depth], color),
                Vertex::flat([x + w, y, depth], color),
            ],
        };

        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&verts);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    fn build_display_list(&self, list: &mut DisplayList) {
        let first_vertex = list.vertices.len() as u32;
        let first_index = list.indices.len() as u32;
        list.vertices.extend_from_slice(&self.vertices);
        list.indices
            .extend(self.indices.iter().map(|i| *i + first_vertex));
        if let Some(atlas_index) = self.atlas_index {
            list.commands.push(Command::BindTexture(atlas_index));
        }
        list.commands.push(Command::Draw {
            start: first_index,
            count: self.indices.len() as u32,
        });
    }
}

/// Collects geometry for a frame and turns it into a [`DisplayList`].
///
/// ```
/// use glint_render::{Color, Compositor, TextureLocation};
///
/// let mut compositor = Compositor::new();
/// compositor.begin();
/// compositor.draw_rect([0.0, 0.0, 100.0, 20.0], 0.9, Color::WHITE);
/// compositor.add_subpixel_rect([4.0, 4.0, 8.0, 12.0], 0.5, Color::BLACK, TextureLocation::full(0));
/// let list = compositor.build_display_list();
/// assert_eq!(list.indices().len(), 12);
/// ```
#[derive(Debug, Default)]
pub struct Compositor {
    empty_batches: Vec<Batch>,
    opaque_batches: Vec<Batch>,
    transparent_batches: Vec<Batch>,
    subpixel_batches: Vec<Batch>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new composition, recycling every batch of the previous one.
    pub fn begin(&mut self) {
        self.empty_batches.append(&mut self.opaque_batches);
        self.empty_batches.append(&mut self.transparent_batches);
        self.empty_batches.append(&mut self.subpixel_batches);
        self.empty_batches.iter_mut().for_each(Batch::clear);
    }

    /// A flat-colored rectangle. Fully opaque colors go to the opaque group.
    pub fn draw_rect(&mut self, rect: impl Into<Rect>, depth: f32, color: Color) {
        let kind = if color.is_opaque() {
            PipelineKind::Opaque
        } else {
            PipelineKind::Transparent
        };
        self.batch_for(kind, None)
            .add_rect(rect.into(), depth, color, None);
    }

    /// An image from an atlas, modulated by `color`.
    pub fn add_image_rect(
        &mut self,
        rect: impl Into<Rect>,
        depth: f32,
        color: Color,
        location: TextureLocation,
    ) {
        self.batch_for(PipelineKind::Transparent, Some(location.atlas_index))
            .add_rect(rect.into(), depth, color, Some(location));
    }

    /// A glyph whose atlas texels hold per-subpixel coverage.
    pub fn add_subpixel_rect(
        &mut self,
        rect: impl Into<Rect>,
        depth: f32,
        color: Color,
        location: TextureLocation,
    ) {
        self.batch_for(PipelineKind::Subpixel, Some(location.atlas_index))
            .add_rect(rect.into(), depth, color, Some(location));
    }

    fn group_mut(&mut self, kind: PipelineKind) -> &mut Vec<Batch> {
        match kind {
            PipelineKind::Opaque => &mut self.opaque_batches,
            PipelineKind::Transparent => &mut self.transparent_batches,
            PipelineKind::Subpixel => &mut self.subpixel_batches,
        }
    }

    fn batch_for(&mut self, kind: PipelineKind, atlas_index: Option<usize>) -> &mut Batch {
        let position = self
            .group_mut(kind)
            .iter()
            .position(|batch| batch.accepts(atlas_index));

        let index = match position {
            Some(index) => index,
            None => {
                let batch = self.empty_batches.pop().unwrap_or_default();
                let group = self.group_mut(kind);
                group.push(batch);
                group.len() - 1
            }
        };
        &mut self.group_mut(kind)[index]
    }

    /// Flatten all batches: opaque first, then transparent, then subpixel.
    pub fn build_display_list(&self) -> DisplayList {
        let mut list = DisplayList::new();
        self.build_display_list_into(&mut list);
        list
    }

    /// Like [`build_display_list`](Self::build_display_list), reusing `list`'s
    /// allocations.
    pub fn build_display_list_into(&self, list: &mut DisplayList) {
        profile_function!();
        list.clear();

        let groups = [
            (PipelineKind::Opaque, &self.opaque_batches),
            (PipelineKind::Transparent, &self.transparent_batches),
            (PipelineKind::Subpixel, &self.subpixel_batches),
        ];
        for (kind, batches) in groups {
            let mut bound = false;
            for batch in batches.iter().filter(|batch| !batch.vertices.is_empty()) {
                if !bound {
                    list.commands.push(Command::BindPipeline(kind));
                    bound = true;
                }
                batch.build_display_list(list);
            }
        }
    }
}
