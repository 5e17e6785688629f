//! Pointer collision and illumination.
//!
//! The pointer behaves like a small moving disc rather than a rigid body.
//! Each particle near it gets one of three responses:
//!
//! | Distance | Response |
//! |----------|----------|
//! | `d < r` | collision: bounce + drag + a bit of raw pointer velocity, pushed out of overlap; equations also pick up spin |
//! | `r ≤ d < r + field_band` | weak exponentially decaying repulsion |
//! | farther | nothing |
//!
//! where `r` is the particle radius plus its kind's interaction padding.
//! Particles beyond the pre-filter distance are skipped without computing
//! anything else. Velocity is clamped to the kind maximum after the impulse.

use crate::config::{KindLimits, PointerConfig};
use crate::input::PointerState;
use crate::particle::Particle;
use crate::spawn::SpawnContext;
use glam::Vec2;

/// Outcome of [`collide`] for one particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    None,
    /// Inside the soft repulsion band.
    Field,
    /// Overlapping the pointer.
    Hit,
}

/// Apply the pointer's influence to one particle.
pub fn collide(
    particle: &mut Particle,
    pointer: &PointerState,
    config: &PointerConfig,
    limits: &KindLimits,
    max_rotation_speed: f32,
    spawn: &mut SpawnContext,
) -> Contact {
    let Some(origin) = pointer.position() else {
        return Contact::None;
    };
    let offset = particle.position - origin;
    if offset.length_squared() > config.prefilter_distance * config.prefilter_distance {
        return Contact::None;
    }

    let d = offset.length();
    let r = particle.radius + limits.interaction_padding;
    let normal = if d > 1e-4 { offset / d } else { spawn.random_direction() };

    let contact = if d < r {
        let pointer_velocity = pointer.velocity();
        let relative = particle.velocity - pointer_velocity;
        let closing = relative.dot(normal);
        if closing < 0.0 {
            let tangent = normal.perp();
            let impact = -closing;
            let tangential = pointer_velocity.dot(tangent);
            particle.velocity += normal * impact * config.bounce
                + tangent * tangential * config.drag
                + pointer_velocity * config.direct;

            if particle.is_equation() {
                let spin = pointer_velocity.perp_dot(normal) * config.spin;
                particle.rotation_speed =
                    (particle.rotation_speed + spin).clamp(-max_rotation_speed, max_rotation_speed);
            }
        }
        particle.position += normal * (r - d);
        particle.target_opacity = (particle.target_opacity + config.strike_boost).min(1.0);
        Contact::Hit
    } else if d < r + config.field_band {
        let push = config.field_strength * (-(d - r) / config.field_decay.max(1e-3)).exp();
        particle.velocity += normal * push;
        Contact::Field
    } else {
        Contact::None
    };

    if contact != Contact::None {
        particle.velocity = particle.velocity.clamp_length_max(limits.max_speed);
    }
    contact
}

/// Falloff `(1 - d / radius)^exponent` inside `radius`, zero outside.
#[inline]
pub fn falloff(distance: f32, radius: f32, exponent: f32) -> f32 {
    if radius <= 0.0 || distance >= radius {
        0.0
    } else {
        (1.0 - distance / radius).powf(exponent)
    }
}

/// Torch light reaching `point`, in `[0, 1]`. Zero without a torch.
#[inline]
pub fn illumination(point: Vec2, torch: Option<Vec2>, config: &PointerConfig) -> f32 {
    match torch {
        Some(center) => falloff(point.distance(center), config.torch_radius, config.torch_exponent),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn pointer_moving(from: Vec2, to: Vec2) -> PointerState {
        let mut pointer = PointerState::new();
        pointer.move_to(from);
        pointer.end_frame();
        pointer.move_to(to);
        pointer
    }

    #[test]
    fn test_far_particle_untouched() {
        let config = EngineConfig::default();
        let mut spawn = SpawnContext::new(Some(1));
        let pointer = pointer_moving(Vec2::ZERO, Vec2::new(5.0, 0.0));
        let mut p = Particle::dot(Vec2::new(600.0, 0.0), Vec2::new(0.1, 0.0), 2.0, 0.3);
        let before = p.clone();
        let contact = collide(&mut p, &pointer, &config.pointer, &config.dot, 0.05, &mut spawn);
        assert_eq!(contact, Contact::None);
        assert_eq!(p, before);
    }

    #[test]
    fn test_hit_pushes_out_of_overlap_and_brightens() {
        let config = EngineConfig::default();
        let mut spawn = SpawnContext::new(Some(1));
        let pointer = pointer_moving(Vec2::new(-5.0, 0.0), Vec2::ZERO);
        let mut p = Particle::dot(Vec2::new(3.0, 0.0), Vec2::ZERO, 2.0, 0.3);
        let contact = collide(&mut p, &pointer, &config.pointer, &config.dot, 0.05, &mut spawn);
        assert_eq!(contact, Contact::Hit);
        let r = 2.0 + config.dot.interaction_padding;
        assert!((p.position.x - r).abs() < 1e-4);
        assert!(p.velocity.x > 0.0);
        assert!(p.target_opacity > 0.3);
    }

    #[test]
    fn test_clamp_applies_for_any_pointer_speed() {
        let config = EngineConfig::default();
        let mut spawn = SpawnContext::new(Some(1));
        for speed in [1.0, 50.0, 5_000.0, 1e7] {
            let pointer = pointer_moving(Vec2::new(-speed, 0.0), Vec2::ZERO);
            let mut p = Particle::glyph(Vec2::new(4.0, 1.0), Vec2::ZERO, "∫".into(), 16.0, 0.3);
            collide(&mut p, &pointer, &config.pointer, &config.glyph, 0.05, &mut spawn);
            assert!(p.speed() <= config.glyph.max_speed + 1e-4);
        }
    }

    #[test]
    fn test_glancing_hit_spins_equation_within_bound() {
        let config = EngineConfig::default();
        let mut spawn = SpawnContext::new(Some(1));
        // Pointer sweeps steeply upward, clipping the equation's left side
        let pointer = pointer_moving(Vec2::new(-60.0, 400.0), Vec2::new(-20.0, 0.0));
        let mut p = Particle::equation(Vec2::ZERO, Vec2::ZERO, None, Vec2::new(80.0, 20.0), 1.0, 1.0, 0.3);
        collide(&mut p, &pointer, &config.pointer, &config.equation, 0.05, &mut spawn);
        assert!(p.rotation_speed != 0.0);
        assert!(p.rotation_speed.abs() <= 0.05);
    }

    #[test]
    fn test_receding_pointer_does_not_transfer_momentum() {
        let config = EngineConfig::default();
        let mut spawn = SpawnContext::new(Some(1));
        // Pointer moving away from the particle
        let pointer = pointer_moving(Vec2::new(2.0, 0.0), Vec2::ZERO);
        let mut p = Particle::dot(Vec2::new(3.0, 0.0), Vec2::ZERO, 2.0, 0.3);
        collide(&mut p, &pointer, &config.pointer, &config.dot, 0.05, &mut spawn);
        assert_eq!(p.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_field_repels_softly() {
        let config = EngineConfig::default();
        let mut spawn = SpawnContext::new(Some(1));
        let mut pointer = PointerState::new();
        pointer.move_to(Vec2::ZERO);
        let r = 2.0 + config.dot.interaction_padding;
        let mut p = Particle::dot(Vec2::new(r + 2.0, 0.0), Vec2::ZERO, 2.0, 0.3);
        assert_eq!(
            collide(&mut p, &pointer, &config.pointer, &config.dot, 0.05, &mut spawn),
            Contact::Field
        );
        assert!(p.velocity.x > 0.0 && p.velocity.x < config.pointer.field_strength);
    }

    #[test]
    fn test_falloff_shape() {
        assert_eq!(falloff(0.0, 100.0, 2.0), 1.0);
        assert!((falloff(50.0, 100.0, 2.0) - 0.25).abs() < 1e-6);
        assert_eq!(falloff(100.0, 100.0, 2.0), 0.0);
        assert_eq!(falloff(150.0, 100.0, 2.0), 0.0);
    }
}
