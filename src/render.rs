//! Particle and spectacle drawing.

use crate::config::{EngineConfig, PointerConfig};
use crate::effects::EffectStack;
use crate::equations::EquationCache;
use crate::gravity::Overlay;
use crate::interactions::illumination;
use crate::particle::{Particle, ParticleKind};
use crate::surface::{Color, Rect, Surface};
use glam::Vec2;

/// Page background.
pub const BACKGROUND: Color = Color::rgb(0.02, 0.025, 0.05);
/// Dots and glyphs.
pub const INK: Color = Color::rgb(0.82, 0.87, 1.0);

/// Draw every particle.
///
/// Torch light adds a glow term to the drawn opacity without touching the
/// particle's own opacity. Equations draw only once their image is loaded.
pub fn draw_particles(
    surface: &mut dyn Surface,
    particles: &[Particle],
    cache: &EquationCache,
    torch: Option<Vec2>,
    config: &PointerConfig,
) {
    for p in particles {
        let glow = illumination(p.position, torch, config) * config.particle_glow;
        let alpha = (p.opacity + glow).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            continue;
        }
        match &p.kind {
            ParticleKind::Dot => surface.fill_circle(p.position, p.radius, INK.with_alpha(alpha)),
            ParticleKind::Glyph { symbol, font_size } => {
                surface.text(symbol, p.position, *font_size, p.rotation, INK.with_alpha(alpha))
            }
            ParticleKind::Equation {
                asset, width, height, ..
            } => {
                if let Some(image) = asset.and_then(|h| cache.image(h)) {
                    surface.image(&image.pixels, p.position, Vec2::new(*width, *height), p.rotation, alpha);
                }
            }
        }
    }
}

/// Draw active pulse rings.
pub fn draw_pulses(surface: &mut dyn Surface, effects: &EffectStack, config: &EngineConfig) {
    for effect in effects.iter() {
        if let Some((radius, alpha)) = effect.pulse_ring(&config.effects) {
            surface.stroke_circle(effect.origin, radius, 2.0, INK.with_alpha(alpha * 0.6));
        }
    }
}

/// Draw the spectacle's cosmetic layer on top of everything else.
pub fn draw_overlay(surface: &mut dyn Surface, overlay: &Overlay) {
    let size = surface.size();

    if overlay.blackout > 0.0 {
        surface.fill_rect(Rect::new(0.0, 0.0, size.x, size.y), Color::BLACK.with_alpha(overlay.blackout));
    }

    for ring in &overlay.lensing {
        surface.stroke_circle(overlay.center, ring.radius, 1.5, INK.with_alpha(ring.alpha));
    }

    if overlay.disc_radius > 0.0 {
        surface.fill_circle(overlay.center, overlay.disc_radius, Color::BLACK.with_alpha(overlay.disc_alpha));
        surface.stroke_circle(
            overlay.center,
            overlay.disc_radius,
            2.0,
            INK.with_alpha(overlay.disc_alpha * 0.5),
        );
    }

    if let Some(message) = &overlay.message {
        if message.alpha > 0.0 {
            surface.text(&message.text, overlay.center, 28.0, 0.0, Color::WHITE.with_alpha(message.alpha));
        }
    }

    if overlay.flash > 0.0 {
        surface.fill_rect(Rect::new(0.0, 0.0, size.x, size.y), Color::WHITE.with_alpha(overlay.flash));
    }

    if let Some(ring) = &overlay.shock {
        surface.stroke_circle(overlay.center, ring.radius, 4.0, Color::WHITE.with_alpha(ring.alpha));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface};

    #[test]
    fn test_equation_without_image_draws_nothing() {
        let config = EngineConfig::default();
        let cache = EquationCache::empty();
        let particles = vec![
            Particle::dot(Vec2::new(10.0, 10.0), Vec2::ZERO, 2.0, 0.4),
            Particle::equation(Vec2::new(50.0, 50.0), Vec2::ZERO, Some(0), Vec2::new(80.0, 20.0), 1.0, 1.0, 0.4),
        ];
        let mut surface = RecordingSurface::new(200.0, 200.0);
        draw_particles(&mut surface, &particles, &cache, None, &config.pointer);
        assert_eq!(surface.images(), 0);
        assert_eq!(surface.commands().len(), 1);
    }

    #[test]
    fn test_torch_adds_glow_to_drawn_opacity() {
        let config = EngineConfig::default();
        let cache = EquationCache::empty();
        let particles = vec![Particle::dot(Vec2::new(10.0, 10.0), Vec2::ZERO, 2.0, 0.2)];
        let mut surface = RecordingSurface::new(200.0, 200.0);
        draw_particles(&mut surface, &particles, &cache, Some(Vec2::new(10.0, 10.0)), &config.pointer);
        match &surface.commands()[0] {
            DrawCommand::FillCircle { color, .. } => {
                assert!((color.a - (0.2 + config.pointer.particle_glow)).abs() < 1e-5)
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(particles[0].opacity, 0.2);
    }
}
