//! Particle spawning and recycling.
//!
//! The pool never grows or shrinks. A particle that drifts out of the
//! viewport (plus margin) is brought back instead of destroyed:
//!
//! | Kind | Leaves the area | Replacement |
//! |------|-----------------|-------------|
//! | `Dot`, `Glyph` | centre past viewport ± margin | teleported to the opposite edge with a fresh velocity |
//! | `Equation` | centre outside the viewport and moving further out | fades out, then respawns at a random edge with a new asset |
//!
//! An equation whose centre is already past the margin is replaced at once,
//! without waiting for the fade.

use crate::config::EngineConfig;
use crate::equations::{EquationCache, EquationHandle};
use crate::input::Viewport;
use crate::particle::{FadeState, KindTag, Particle, ParticleKind};
use crate::spawn::{Edge, SpawnContext};
use glam::Vec2;
use std::f32::consts::FRAC_PI_3;

/// Size used for equations when the manifest has nothing to draw.
const FALLBACK_EQUATION_SIZE: Vec2 = Vec2::new(160.0, 40.0);

/// Symbol for glyphs when the configured set is empty.
const FALLBACK_GLYPH: &str = "·";

/// Where a new particle appears.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Anywhere inside the viewport, moving in a random direction.
    Scatter,
    /// Just outside `edge`, moving inward.
    Edge(Edge),
}

/// What the recycler did to a particle this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recycle {
    Kept,
    /// Dot or glyph moved to the opposite edge.
    Teleported,
    /// Equation started fading out.
    FadingOut,
    /// Equation replaced by a fresh one.
    Replaced,
}

/// Create a particle of `kind`.
///
/// For equations an asset is picked (avoiding `exclude`) and its load is
/// requested; the particle draws nothing until the cache resolves it.
pub fn spawn_particle(
    kind: KindTag,
    config: &EngineConfig,
    viewport: &Viewport,
    spawn: &mut SpawnContext,
    cache: &mut EquationCache,
    placement: Placement,
    exclude: Option<EquationHandle>,
) -> Particle {
    let limits = config.limits(kind);
    let look = &config.appearance;
    let speed = spawn.random_range(limits.min_speed.max(limits.max_speed * 0.2), limits.max_speed * 0.7);
    let opacity = spawn.random_in(limits.opacity);

    let (position, velocity) = match placement {
        Placement::Scatter => (spawn.random_in_rect(viewport.size), spawn.random_direction() * speed),
        Placement::Edge(edge) => {
            let inset = match kind {
                KindTag::Equation => config.motion.margin * 0.5,
                _ => config.appearance.dot_radius,
            };
            (
                spawn.point_on_edge(edge, viewport.size, inset),
                spawn.inward_velocity(edge, speed, FRAC_PI_3),
            )
        }
    };

    let mut particle = match kind {
        KindTag::Dot => Particle::dot(position, velocity, look.dot_radius, opacity),
        KindTag::Glyph => {
            let symbol = match look.glyph_symbols.len() {
                0 => FALLBACK_GLYPH.to_string(),
                n => look.glyph_symbols[spawn.random_index(n)].clone(),
            };
            let font_size = spawn.random_in(look.glyph_font_size);
            Particle::glyph(position, velocity, symbol, font_size, opacity)
        }
        KindTag::Equation => {
            let asset = cache.pick(spawn, exclude);
            if let Some(handle) = asset {
                cache.request(handle);
            }
            let scale = spawn.random_in(look.equation_scale);
            let natural = asset.and_then(|h| cache.size(h)).unwrap_or(FALLBACK_EQUATION_SIZE) * scale;
            let size = Vec2::new(
                natural.x.min(look.equation_max_width),
                natural.y.min(look.equation_max_height),
            );
            Particle::equation(position, velocity, asset, size, scale, look.equation_max_rotation, opacity)
        }
    };

    if limits.min_rotation_speed > 0.0 {
        let max = config.motion.max_rotation_speed * 0.5;
        particle.rotation = spawn.random_range(-0.3, 0.3);
        particle.rotation_speed = spawn.random_sign() * spawn.random_range(limits.min_rotation_speed, max);
    }
    particle
}

/// Apply the lifecycle rule to one particle.
pub fn recycle(
    particle: &mut Particle,
    config: &EngineConfig,
    viewport: &Viewport,
    spawn: &mut SpawnContext,
    cache: &mut EquationCache,
) -> Recycle {
    let margin = config.motion.margin;
    match particle.kind {
        ParticleKind::Dot | ParticleKind::Glyph { .. } => {
            if viewport.contains_with_margin(particle.position, margin) {
                return Recycle::Kept;
            }
            teleport(particle, config, viewport, spawn);
            Recycle::Teleported
        }
        ParticleKind::Equation { asset, .. } => {
            let beyond_margin = !viewport.contains_with_margin(particle.position, margin);
            let faded = particle.fade == FadeState::Out && particle.opacity <= 0.0;
            if beyond_margin || faded {
                let edge = spawn.random_edge();
                *particle = spawn_particle(
                    KindTag::Equation,
                    config,
                    viewport,
                    spawn,
                    cache,
                    Placement::Edge(edge),
                    asset,
                );
                log::trace!("Equation replaced (beyond margin: {})", beyond_margin);
                return Recycle::Replaced;
            }
            if particle.fade != FadeState::Out && is_leaving(particle, viewport) {
                particle.fade = FadeState::Out;
                return Recycle::FadingOut;
            }
            Recycle::Kept
        }
    }
}

/// Outside the viewport proper on some axis and still moving outward on it.
fn is_leaving(particle: &Particle, viewport: &Viewport) -> bool {
    let p = particle.position;
    let v = particle.velocity;
    (p.x < 0.0 && v.x < 0.0)
        || (p.x > viewport.size.x && v.x > 0.0)
        || (p.y < 0.0 && v.y < 0.0)
        || (p.y > viewport.size.y && v.y > 0.0)
}

/// Move a dot or glyph that crossed the margin to the opposite edge.
fn teleport(particle: &mut Particle, config: &EngineConfig, viewport: &Viewport, spawn: &mut SpawnContext) {
    let margin = config.motion.margin;
    let size = viewport.size;
    let p = particle.position;

    let exit = if p.x > size.x + margin {
        Edge::Right
    } else if p.x < -margin {
        Edge::Left
    } else if p.y > size.y + margin {
        Edge::Bottom
    } else {
        Edge::Top
    };
    let entry = exit.opposite();

    particle.position = spawn.point_on_edge(entry, size, margin);
    let limits = config.limits(particle.tag());
    let speed = spawn.random_range(limits.min_speed, limits.max_speed * 0.7);
    particle.velocity = spawn.inward_velocity(entry, speed, FRAC_PI_3);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (EngineConfig, Viewport, SpawnContext, EquationCache) {
        (
            EngineConfig::default(),
            Viewport::new(1000.0, 800.0),
            SpawnContext::new(Some(11)),
            EquationCache::empty(),
        )
    }

    #[test]
    fn test_glyph_spawn_with_no_symbols_uses_fallback() {
        let (mut config, vp, mut spawn, mut cache) = setup();
        config.appearance.glyph_symbols.clear();
        let p = spawn_particle(KindTag::Glyph, &config, &vp, &mut spawn, &mut cache, Placement::Scatter, None);
        match p.kind {
            ParticleKind::Glyph { ref symbol, .. } => assert_eq!(symbol, FALLBACK_GLYPH),
            ref other => panic!("expected a glyph, got {other:?}"),
        }
    }

    #[test]
    fn test_dot_past_right_margin_wraps_to_left() {
        let (config, vp, mut spawn, mut cache) = setup();
        let mut p = Particle::dot(Vec2::new(1101.0, 500.0), Vec2::new(5.0, 0.0), 2.0, 0.3);
        assert_eq!(recycle(&mut p, &config, &vp, &mut spawn, &mut cache), Recycle::Teleported);
        assert_eq!(p.position.x, -100.0);
        assert!((0.0..800.0).contains(&p.position.y));
        assert!(p.velocity.x > 0.0);
    }

    #[test]
    fn test_glyph_past_top_wraps_to_bottom() {
        let (config, vp, mut spawn, mut cache) = setup();
        let mut p = Particle::glyph(Vec2::new(300.0, -150.0), Vec2::new(0.0, -1.0), "∑".into(), 14.0, 0.3);
        recycle(&mut p, &config, &vp, &mut spawn, &mut cache);
        assert_eq!(p.position.y, 900.0);
        assert!(p.velocity.y < 0.0);
    }

    #[test]
    fn test_particle_inside_is_kept() {
        let (config, vp, mut spawn, mut cache) = setup();
        let mut p = Particle::dot(Vec2::new(1050.0, 500.0), Vec2::new(1.0, 0.0), 2.0, 0.3);
        assert_eq!(recycle(&mut p, &config, &vp, &mut spawn, &mut cache), Recycle::Kept);
        assert_eq!(p.position.x, 1050.0);
    }

    #[test]
    fn test_equation_fades_then_replaced() {
        let (config, vp, mut spawn, mut cache) = setup();
        let mut p = Particle::equation(
            Vec2::new(1010.0, 400.0),
            Vec2::new(0.3, 0.0),
            None,
            Vec2::new(120.0, 30.0),
            1.0,
            1.0,
            0.3,
        );
        p.fade = FadeState::Stable;
        p.opacity = 0.3;
        assert_eq!(recycle(&mut p, &config, &vp, &mut spawn, &mut cache), Recycle::FadingOut);

        p.opacity = 0.0;
        assert_eq!(recycle(&mut p, &config, &vp, &mut spawn, &mut cache), Recycle::Replaced);
        assert_eq!(p.fade, FadeState::In);
        assert!(vp.contains_with_margin(p.position, config.motion.margin));
    }

    #[test]
    fn test_equation_beyond_margin_replaced_immediately() {
        let (config, vp, mut spawn, mut cache) = setup();
        let mut p = Particle::equation(Vec2::new(-400.0, 10.0), Vec2::ZERO, None, Vec2::new(80.0, 20.0), 1.0, 1.0, 0.3);
        assert_eq!(recycle(&mut p, &config, &vp, &mut spawn, &mut cache), Recycle::Replaced);
        assert!(p.is_equation());
    }

    #[test]
    fn test_edge_spawned_equation_is_not_leaving() {
        let (config, vp, mut spawn, mut cache) = setup();
        for edge in Edge::ALL {
            let mut p = spawn_particle(
                KindTag::Equation,
                &config,
                &vp,
                &mut spawn,
                &mut cache,
                Placement::Edge(edge),
                None,
            );
            assert_eq!(recycle(&mut p, &config, &vp, &mut spawn, &mut cache), Recycle::Kept);
        }
    }

    #[test]
    fn test_equation_size_is_capped() {
        let (mut config, vp, mut spawn, mut cache) = setup();
        config.appearance.equation_scale = [4.0, 4.0];
        let p = spawn_particle(KindTag::Equation, &config, &vp, &mut spawn, &mut cache, Placement::Scatter, None);
        match p.kind {
            ParticleKind::Equation { width, height, .. } => {
                assert!(width <= config.appearance.equation_max_width);
                assert!(height <= config.appearance.equation_max_height);
            }
            _ => panic!("expected an equation"),
        }
    }
}
