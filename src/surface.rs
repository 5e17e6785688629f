//! Drawing surfaces.
//!
//! The engine never talks to a graphics API directly. Everything it draws
//! goes through the small immediate-mode [`Surface`] trait, so a host can
//! back it with a canvas, a GPU batcher, or one of the two surfaces shipped
//! here:
//!
//! - [`RecordingSurface`] keeps a log of [`DrawCommand`]s. Tests assert on it.
//! - [`RasterSurface`] rasterizes onto an [`image::RgbaImage`] on the CPU and
//!   can save PNG frames.

use glam::Vec2;
use image::{ImageResult, Rgba, RgbaImage};
use std::path::Path;

/// Straight (non-premultiplied) RGBA color, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with alpha multiplied by `alpha` (clamped to `[0, 1]`).
    #[inline]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (self.a * alpha).clamp(0.0, 1.0),
            ..self
        }
    }

    fn to_rgba8(self) -> Rgba<u8> {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([q(self.r), q(self.g), q(self.b), q(self.a)])
    }
}

/// Axis-aligned rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.size.x.max(0.0) * self.size.y.max(0.0)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Whether the rectangle overlaps the `[0, extent]` box.
    pub fn intersects_extent(&self, extent: Vec2) -> bool {
        let max = self.max();
        max.x > 0.0 && max.y > 0.0 && self.min.x < extent.x && self.min.y < extent.y
    }
}

/// Immediate-mode drawing target.
pub trait Surface {
    /// Drawable size in pixels.
    fn size(&self) -> Vec2;

    /// Fill everything with `color`.
    fn clear(&mut self, color: Color);

    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Full-width horizontal band centred on `center_y`: `color` at the
    /// centre, fading linearly to transparent `half_height` above and below.
    fn vertical_gradient(&mut self, center_y: f32, half_height: f32, color: Color);

    /// Text centred on `position`, rotated by `rotation` radians.
    fn text(&mut self, text: &str, position: Vec2, font_size: f32, rotation: f32, color: Color);

    /// Bitmap centred on `center`, scaled to `size` and rotated by `rotation`.
    fn image(&mut self, image: &RgbaImage, center: Vec2, size: Vec2, rotation: f32, opacity: f32);
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Line { from: Vec2, to: Vec2, width: f32, color: Color },
    FillCircle { center: Vec2, radius: f32, color: Color },
    StrokeCircle { center: Vec2, radius: f32, width: f32, color: Color },
    FillRect { rect: Rect, color: Color },
    VerticalGradient { center_y: f32, half_height: f32, color: Color },
    Text { text: String, position: Vec2, font_size: f32, rotation: f32, color: Color },
    Image { center: Vec2, size: Vec2, rotation: f32, opacity: f32 },
}

/// Surface that records draw calls instead of drawing.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Vec2,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drop everything recorded so far.
    pub fn reset(&mut self) {
        self.commands.clear();
    }

    /// Number of recorded commands matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    pub fn images(&self) -> usize {
        self.count(|c| matches!(c, DrawCommand::Image { .. }))
    }

    pub fn texts(&self) -> usize {
        self.count(|c| matches!(c, DrawCommand::Text { .. }))
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        self.commands.push(DrawCommand::Line { from, to, width, color });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::FillCircle { center, radius, color });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color) {
        self.commands.push(DrawCommand::StrokeCircle {
            center,
            radius,
            width,
            color,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn vertical_gradient(&mut self, center_y: f32, half_height: f32, color: Color) {
        self.commands.push(DrawCommand::VerticalGradient {
            center_y,
            half_height,
            color,
        });
    }

    fn text(&mut self, text: &str, position: Vec2, font_size: f32, rotation: f32, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            position,
            font_size,
            rotation,
            color,
        });
    }

    fn image(&mut self, _image: &RgbaImage, center: Vec2, size: Vec2, rotation: f32, opacity: f32) {
        self.commands.push(DrawCommand::Image {
            center,
            size,
            rotation,
            opacity,
        });
    }
}

/// CPU rasterizer onto an RGBA image.
///
/// Shapes are drawn with simple coverage tests, no anti-aliasing. There is
/// no font rasterizer: text is approximated by a soft dot of the glyph's
/// size, which is close enough for faint background symbols.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width.max(1), height.max(1)),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Write the current frame as a PNG.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.pixels.save_with_format(path, image::ImageFormat::Png)
    }

    /// Source-over blend one pixel. Out-of-bounds coordinates are ignored.
    fn blend(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.pixels.width() as i64 || y >= self.pixels.height() as i64 {
            return;
        }
        let a = color.a.clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
        let [dr, dg, db, da] = dst.0.map(|c| c as f32 / 255.0);
        let out_a = a + da * (1.0 - a);
        let mix = |s: f32, d: f32| {
            if out_a > 0.0 {
                (s * a + d * da * (1.0 - a)) / out_a
            } else {
                0.0
            }
        };
        *dst = Color::rgba(mix(color.r, dr), mix(color.g, dg), mix(color.b, db), out_a).to_rgba8();
    }

    fn bounds(&self, min: Vec2, max: Vec2) -> (i64, i64, i64, i64) {
        let w = self.pixels.width() as i64;
        let h = self.pixels.height() as i64;
        (
            (min.x.floor() as i64).clamp(0, w),
            (min.y.floor() as i64).clamp(0, h),
            (max.x.ceil() as i64).clamp(0, w),
            (max.y.ceil() as i64).clamp(0, h),
        )
    }

    /// Blend every pixel in the box whose centre satisfies `inside`.
    fn fill_where(&mut self, min: Vec2, max: Vec2, color: Color, inside: impl Fn(Vec2) -> bool) {
        let (x0, y0, x1, y1) = self.bounds(min, max);
        for y in y0..y1 {
            for x in x0..x1 {
                if inside(Vec2::new(x as f32 + 0.5, y as f32 + 0.5)) {
                    self.blend(x, y, color);
                }
            }
        }
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> Vec2 {
        Vec2::new(self.pixels.width() as f32, self.pixels.height() as f32)
    }

    fn clear(&mut self, color: Color) {
        let px = color.to_rgba8();
        for p in self.pixels.pixels_mut() {
            *p = px;
        }
    }

    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        let half = (width * 0.5).max(0.5);
        let pad = Vec2::splat(half + 1.0);
        let segment = to - from;
        let len_sq = segment.length_squared();
        self.fill_where(from.min(to) - pad, from.max(to) + pad, color, |p| {
            let t = if len_sq > 0.0 {
                ((p - from).dot(segment) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            p.distance(from + segment * t) <= half
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        let r = radius.max(0.5);
        self.fill_where(center - Vec2::splat(r), center + Vec2::splat(r), color, |p| {
            p.distance_squared(center) <= r * r
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Color) {
        let half = (width * 0.5).max(0.5);
        let outer = radius + half;
        self.fill_where(center - Vec2::splat(outer), center + Vec2::splat(outer), color, |p| {
            (p.distance(center) - radius).abs() <= half
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.fill_where(rect.min, rect.max(), color, |_| true);
    }

    fn vertical_gradient(&mut self, center_y: f32, half_height: f32, color: Color) {
        if half_height <= 0.0 {
            return;
        }
        let (_, y0, _, y1) = self.bounds(
            Vec2::new(0.0, center_y - half_height),
            Vec2::new(0.0, center_y + half_height),
        );
        let width = self.pixels.width() as i64;
        for y in y0..y1 {
            let k = 1.0 - ((y as f32 + 0.5 - center_y).abs() / half_height);
            if k <= 0.0 {
                continue;
            }
            let row = color.with_alpha(k);
            for x in 0..width {
                self.blend(x, y, row);
            }
        }
    }

    fn text(&mut self, _text: &str, position: Vec2, font_size: f32, _rotation: f32, color: Color) {
        let r = font_size * 0.3;
        self.fill_where(position - Vec2::splat(r), position + Vec2::splat(r), color, |p| {
            p.distance_squared(position) <= r * r
        });
    }

    fn image(&mut self, image: &RgbaImage, center: Vec2, size: Vec2, rotation: f32, opacity: f32) {
        if image.width() == 0 || image.height() == 0 || size.x <= 0.0 || size.y <= 0.0 {
            return;
        }
        // Bounding box of the rotated quad
        let half = size * 0.5;
        let (sin, cos) = rotation.sin_cos();
        let extent = Vec2::new(
            half.x * cos.abs() + half.y * sin.abs(),
            half.x * sin.abs() + half.y * cos.abs(),
        );
        let (x0, y0, x1, y1) = self.bounds(center - extent, center + extent);
        let unrotate = Vec2::from_angle(-rotation);
        let texel = Vec2::new(image.width() as f32, image.height() as f32) / size;

        for y in y0..y1 {
            for x in x0..x1 {
                let local = unrotate.rotate(Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center) + half;
                if local.x < 0.0 || local.y < 0.0 || local.x >= size.x || local.y >= size.y {
                    continue;
                }
                let uv = local * texel;
                let src = image.get_pixel(
                    (uv.x as u32).min(image.width() - 1),
                    (uv.y as u32).min(image.height() - 1),
                );
                let [r, g, b, a] = src.0.map(|c| c as f32 / 255.0);
                self.blend(x, y, Color::rgba(r, g, b, a * opacity));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_surface_logs_calls() {
        let mut surface = RecordingSurface::new(100.0, 50.0);
        surface.clear(Color::BLACK);
        surface.fill_circle(Vec2::new(5.0, 5.0), 2.0, Color::WHITE);
        surface.text("π", Vec2::ZERO, 14.0, 0.0, Color::WHITE);
        assert_eq!(surface.commands().len(), 3);
        assert_eq!(surface.texts(), 1);
        assert_eq!(surface.size(), Vec2::new(100.0, 50.0));
        surface.reset();
        assert!(surface.commands().is_empty());
    }

    #[test]
    fn test_raster_fill_circle_blends() {
        let mut surface = RasterSurface::new(20, 20);
        surface.clear(Color::BLACK);
        surface.fill_circle(Vec2::new(10.0, 10.0), 4.0, Color::WHITE.with_alpha(0.5));
        let center = surface.pixels().get_pixel(10, 10).0;
        assert!(center[0] > 100 && center[0] < 160);
        assert_eq!(center[3], 255);
        assert_eq!(surface.pixels().get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_raster_ignores_out_of_bounds() {
        let mut surface = RasterSurface::new(8, 8);
        surface.line(Vec2::new(-50.0, -50.0), Vec2::new(-10.0, -10.0), 2.0, Color::WHITE);
        surface.fill_circle(Vec2::new(100.0, 100.0), 5.0, Color::WHITE);
        assert!(surface.pixels().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_raster_draws_image() {
        let mut source = RgbaImage::new(4, 4);
        for p in source.pixels_mut() {
            *p = Rgba([255, 0, 0, 255]);
        }
        let mut surface = RasterSurface::new(16, 16);
        surface.image(&source, Vec2::new(8.0, 8.0), Vec2::new(8.0, 8.0), 0.3, 1.0);
        assert_eq!(surface.pixels().get_pixel(8, 8).0, [255, 0, 0, 255]);
        assert_eq!(surface.pixels().get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_rect_geometry() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.center(), Vec2::new(25.0, 40.0));
        assert_eq!(rect.area(), 1200.0);
        assert!(rect.intersects_extent(Vec2::new(100.0, 100.0)));
        assert!(!Rect::new(-50.0, 0.0, 40.0, 10.0).intersects_extent(Vec2::new(100.0, 100.0)));
    }
}
