//! Background lattice, torch and scanline.
//!
//! The grid is a fixed lattice of vertical and horizontal lines at
//! `pitch` spacing. Each line is drawn as a polyline of sample points so that
//! click effects can displace it; each segment's opacity follows the unified
//! intensity at its midpoint:
//!
//! ```text
//! intensity = torch + scanline + click effects + spectacle boost   (capped at 1)
//! alpha     = base_alpha + highlight_alpha * intensity
//! ```
//!
//! Lattice intersections whose intensity exceeds the threshold are drawn as
//! small bright dots.

use crate::config::{EffectConfig, GridConfig, PointerConfig};
use crate::effects::EffectStack;
use crate::input::Viewport;
use crate::interactions::{falloff, illumination};
use crate::surface::{Color, Surface};
use glam::Vec2;

/// Line color of the lattice.
pub const GRID_COLOR: Color = Color::rgb(0.55, 0.7, 1.0);

/// Screen-space y of the scanline.
///
/// The line sweeps the whole page, not just the viewport, so it is only
/// visible while it passes the scrolled-to region.
pub fn scanline_y(elapsed_ms: f64, viewport: &Viewport, config: &GridConfig) -> f32 {
    let page_height = viewport.page_height.max(1.0) as f64;
    let page_y = (elapsed_ms * config.scanline_speed as f64).rem_euclid(page_height);
    page_y as f32 - viewport.scroll
}

/// Everything that brightens the grid this frame.
#[derive(Debug, Clone, Copy)]
pub struct GridLighting<'a> {
    /// Torch centre. `None` unless fun mode and the torch are both on.
    pub torch: Option<Vec2>,
    /// Screen-space y of the scanline.
    pub scanline: f32,
    pub effects: &'a EffectStack,
    /// Extra uniform intensity from the spectacle, `[0, 1]`.
    pub boost: f32,
}

impl GridLighting<'_> {
    /// Unified intensity at an undistorted sample point.
    pub fn intensity(
        &self,
        point: Vec2,
        grid: &GridConfig,
        pointer: &PointerConfig,
        effects: &EffectConfig,
    ) -> f32 {
        let torch = illumination(point, self.torch, pointer);
        let scan = falloff((point.y - self.scanline).abs(), grid.scanline_band, grid.scanline_exponent);
        let (_, ripple) = self.effects.apply(point, effects);
        (torch + scan + ripple + self.boost).clamp(0.0, 1.0)
    }
}

/// Draw the lattice, intersections and the scanline band.
pub fn draw_grid(
    surface: &mut dyn Surface,
    lighting: &GridLighting<'_>,
    grid: &GridConfig,
    pointer: &PointerConfig,
    effects: &EffectConfig,
) {
    let size = surface.size();
    let pitch = grid.pitch.max(4.0);
    let step = pitch / grid.subdivisions.max(1) as f32;
    let columns = (size.x / pitch).ceil() as u32;
    let rows = (size.y / pitch).ceil() as u32;

    for i in 0..=columns {
        let x = i as f32 * pitch;
        draw_line(surface, lighting, grid, pointer, effects, Vec2::new(x, 0.0), Vec2::Y, size.y, step);
    }
    for j in 0..=rows {
        let y = j as f32 * pitch;
        draw_line(surface, lighting, grid, pointer, effects, Vec2::new(0.0, y), Vec2::X, size.x, step);
    }

    for i in 0..=columns {
        for j in 0..=rows {
            let point = Vec2::new(i as f32 * pitch, j as f32 * pitch);
            let intensity = lighting.intensity(point, grid, pointer, effects);
            if intensity > grid.intersection_threshold {
                let (at, _) = lighting.effects.apply(point, effects);
                let alpha = grid.base_alpha + grid.highlight_alpha * intensity;
                surface.fill_circle(at, 1.0 + 1.5 * intensity, GRID_COLOR.with_alpha(alpha));
            }
        }
    }

    let band = grid.scanline_band;
    if lighting.scanline > -band && lighting.scanline < size.y + band {
        surface.vertical_gradient(lighting.scanline, band * 0.5, GRID_COLOR.with_alpha(grid.scanline_glow));
        surface.line(
            Vec2::new(0.0, lighting.scanline),
            Vec2::new(size.x, lighting.scanline),
            1.0,
            GRID_COLOR.with_alpha(grid.scanline_glow * 3.0),
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_line(
    surface: &mut dyn Surface,
    lighting: &GridLighting<'_>,
    grid: &GridConfig,
    pointer: &PointerConfig,
    effects: &EffectConfig,
    start: Vec2,
    direction: Vec2,
    length: f32,
    step: f32,
) {
    let samples = (length / step).ceil() as u32;
    let mut prev = start;
    let mut prev_drawn = lighting.effects.apply(start, effects).0;
    for k in 1..=samples {
        let point = start + direction * (k as f32 * step).min(length);
        let drawn = lighting.effects.apply(point, effects).0;
        let intensity = lighting.intensity((prev + point) * 0.5, grid, pointer, effects);
        let alpha = grid.base_alpha + grid.highlight_alpha * intensity;
        surface.line(prev_drawn, drawn, 1.0, GRID_COLOR.with_alpha(alpha));
        prev = point;
        prev_drawn = drawn;
    }
}
