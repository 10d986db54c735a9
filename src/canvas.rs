//! Drawing surfaces the maze painter can target.
//!
//! The painter works in logical pixels. A canvas owns the physical surface
//! and a stack of transforms that map logical rectangles onto it.

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const GOLD: Color = Color([255, 215, 0, 255]);
}

impl From<Color> for [f32; 4] {
    fn from(color: Color) -> Self {
        let [r, g, b, a] = color.0;
        [
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        ]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Axis aligned rectangle in logical pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn pixel(x: i32, y: i32) -> Self {
        Self::new(x, y, 1, 1)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Uniform scale followed by a translation, logical to physical.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SurfaceTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for SurfaceTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl SurfaceTransform {
    pub const IDENTITY: SurfaceTransform = SurfaceTransform {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Maps `source` into `dest`, keeping the aspect ratio and centering
    /// the leftover space.
    pub fn fit(source: RectF, dest: RectF) -> Self {
        if source.width <= 0.0 || source.height <= 0.0 {
            return Self::IDENTITY;
        }

        let scale = (dest.width / source.width).min(dest.height / source.height);
        let offset_x = dest.x + (dest.width - source.width * scale) / 2.0 - source.x * scale;
        let offset_y = dest.y + (dest.height - source.height * scale) / 2.0 - source.y * scale;

        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    /// `self` applied after `inner`.
    pub fn compose(&self, inner: &SurfaceTransform) -> Self {
        Self {
            scale: self.scale * inner.scale,
            offset_x: self.offset_x + inner.offset_x * self.scale,
            offset_y: self.offset_y + inner.offset_y * self.scale,
        }
    }

    pub fn apply(&self, rect: Rect) -> RectF {
        RectF::new(
            self.offset_x + rect.x as f32 * self.scale,
            self.offset_y + rect.y as f32 * self.scale,
            rect.width as f32 * self.scale,
            rect.height as f32 * self.scale,
        )
    }
}

pub trait Canvas {
    /// Physical size of the surface.
    fn size(&self) -> SurfaceSize;

    fn clear(&mut self, color: Color);

    fn fill_rect(&mut self, color: Color, rect: Rect);

    /// Composes `transform` onto the current one until the matching
    /// [`pop_transform`](Canvas::pop_transform).
    fn push_transform(&mut self, transform: SurfaceTransform);

    fn pop_transform(&mut self);

    fn transform(&self) -> SurfaceTransform;
}

// Shared by both canvases, the bottom of the stack is the identity and is
// never popped.
#[derive(Debug, Clone)]
struct TransformStack {
    stack: Vec<SurfaceTransform>,
}

impl TransformStack {
    fn new() -> Self {
        Self {
            stack: vec![SurfaceTransform::IDENTITY],
        }
    }

    fn top(&self) -> SurfaceTransform {
        *self.stack.last().unwrap_or(&SurfaceTransform::IDENTITY)
    }

    fn push(&mut self, transform: SurfaceTransform) {
        let composed = self.top().compose(&transform);
        self.stack.push(composed);
    }

    fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }
}

/// RGBA raster of the physical surface.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    size: SurfaceSize,
    pixels: Vec<Color>,
    transforms: TransformStack,
}

impl PixelBuffer {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            pixels: vec![Color::BLACK; size.width as usize * size.height as usize],
            size,
            transforms: TransformStack::new(),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.size.width + x) as usize]
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn count(&self, color: Color) -> usize {
        self.pixels.iter().filter(|p| **p == color).count()
    }

    /// Coordinates of every pixel of `color`, row major.
    pub fn positions_of(&self, color: Color) -> Vec<(u32, u32)> {
        let width = self.size.width;
        self.pixels
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == color)
            .map(|(i, _)| (i as u32 % width, i as u32 / width))
            .collect()
    }

    // pixel i covers [i, i + 1), it is filled when its center is inside
    fn span(start: f32, end: f32, limit: u32) -> (u32, u32) {
        let first = (start - 0.5).ceil().max(0.0).min(limit as f32) as u32;
        let last = (end - 0.5).ceil().max(0.0).min(limit as f32) as u32;
        (first, last)
    }
}

impl Canvas for PixelBuffer {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.pixels.iter_mut().for_each(|p| *p = color);
    }

    fn fill_rect(&mut self, color: Color, rect: Rect) {
        let area = self.transforms.top().apply(rect);
        let (x0, x1) = Self::span(area.x, area.right(), self.size.width);
        let (y0, y1) = Self::span(area.y, area.bottom(), self.size.height);

        for y in y0..y1 {
            let row = (y * self.size.width) as usize;
            for x in x0..x1 {
                self.pixels[row + x as usize] = color;
            }
        }
    }

    fn push_transform(&mut self, transform: SurfaceTransform) {
        self.transforms.push(transform);
    }

    fn pop_transform(&mut self) {
        self.transforms.pop();
    }

    fn transform(&self) -> SurfaceTransform {
        self.transforms.top()
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

/// Collects filled rectangles as triangles in normalized device
/// coordinates, ready to be uploaded as a vertex buffer.
pub struct VertexCanvas {
    size: SurfaceSize,
    clear_color: Color,
    verts: Vec<Vertex>,
    transforms: TransformStack,
}

impl VertexCanvas {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            clear_color: Color::BLACK,
            verts: Vec::new(),
            transforms: TransformStack::new(),
        }
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.verts
    }

    fn to_ndc(&self, x: f32, y: f32) -> [f32; 2] {
        let width = self.size.width.max(1) as f32;
        let height = self.size.height.max(1) as f32;
        [(2.0 * x / width) - 1.0, 1.0 - (2.0 * y / height)]
    }
}

impl Canvas for VertexCanvas {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.clear_color = color;
        self.verts.clear();
    }

    fn fill_rect(&mut self, color: Color, rect: Rect) {
        let area = self.transforms.top().apply(rect);
        let [low_x, low_y] = self.to_ndc(area.x, area.bottom());
        let [up_x, up_y] = self.to_ndc(area.right(), area.y);
        let color: [f32; 4] = color.into();

        self.verts.extend_from_slice(&[
            // lower left triangle
            Vertex {
                position: [low_x, low_y],
                color,
            },
            Vertex {
                position: [up_x, low_y],
                color,
            },
            Vertex {
                position: [low_x, up_y],
                color,
            },
            // upper right triangle
            Vertex {
                position: [low_x, up_y],
                color,
            },
            Vertex {
                position: [up_x, low_y],
                color,
            },
            Vertex {
                position: [up_x, up_y],
                color,
            },
        ]);
    }

    fn push_transform(&mut self, transform: SurfaceTransform) {
        self.transforms.push(transform);
    }

    fn pop_transform(&mut self) {
        self.transforms.pop();
    }

    fn transform(&self) -> SurfaceTransform {
        self.transforms.top()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_preserves_aspect_and_centers() {
        let source = RectF::new(0.0, 0.0, 10.0, 5.0);
        let dest = RectF::new(0.0, 0.0, 100.0, 100.0);

        let transform = SurfaceTransform::fit(source, dest);

        assert_eq!(transform.scale, 10.0);
        assert_eq!(transform.offset_x, 0.0);
        assert_eq!(transform.offset_y, 25.0);
        assert_eq!(
            transform.apply(Rect::new(9, 4, 1, 1)),
            RectF::new(90.0, 65.0, 10.0, 10.0)
        );
    }

    #[test]
    fn pixel_buffer_fills_covered_pixels() {
        let mut buffer = PixelBuffer::new(SurfaceSize::new(4, 3));

        buffer.fill_rect(Color::WHITE, Rect::new(1, 1, 2, 1));

        assert_eq!(buffer.positions_of(Color::WHITE), vec![(1, 1), (2, 1)]);
    }

    #[test]
    fn pixel_buffer_clips_to_the_surface() {
        let mut buffer = PixelBuffer::new(SurfaceSize::new(2, 2));

        buffer.fill_rect(Color::WHITE, Rect::new(-3, 1, 10, 4));

        assert_eq!(buffer.positions_of(Color::WHITE), vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn transforms_scale_and_restore() {
        let mut buffer = PixelBuffer::new(SurfaceSize::new(6, 6));

        buffer.push_transform(SurfaceTransform::fit(
            RectF::new(0.0, 0.0, 3.0, 3.0),
            RectF::new(0.0, 0.0, 6.0, 6.0),
        ));
        buffer.fill_rect(Color::WHITE, Rect::pixel(1, 1));
        buffer.pop_transform();
        buffer.fill_rect(Color::GOLD, Rect::pixel(0, 0));
        buffer.pop_transform();

        assert_eq!(
            buffer.positions_of(Color::WHITE),
            vec![(2, 2), (3, 2), (2, 3), (3, 3)]
        );
        assert_eq!(buffer.positions_of(Color::GOLD), vec![(0, 0)]);
        assert_eq!(buffer.transform(), SurfaceTransform::IDENTITY);
    }

    #[test]
    fn vertex_canvas_emits_two_triangles_in_ndc() {
        let mut canvas = VertexCanvas::new(SurfaceSize::new(2, 2));

        canvas.fill_rect(Color::WHITE, Rect::pixel(0, 0));

        let verts = canvas.vertices();
        assert_eq!(verts.len(), 6);
        assert_eq!(verts[0].position, [-1.0, 0.0]);
        assert_eq!(verts[5].position, [0.0, 1.0]);
        assert_eq!(verts[0].color, [1.0, 1.0, 1.0, 1.0]);

        canvas.clear(Color::GOLD);
        assert!(canvas.vertices().is_empty());
        assert_eq!(canvas.clear_color(), Color::GOLD);
    }
}
