//! Transient click effects on the background grid.
//!
//! A click in fun mode drops an epicenter that distorts nearby grid sample
//! points for one second. Each distortion is a deterministic function of the
//! sample point, the epicenter and the effect's progress, scaled by a local
//! influence:
//!
//! ```text
//! influence = (1 - distance / radius) * (1 - progress)    inside radius
//!           = 0                                            otherwise, or once progress >= 1
//! ```
//!
//! [`EffectKind::Pulse`] is the exception: it only draws an expanding ring
//! and is used to confirm a torch toggle.

use crate::config::EffectConfig;
use crate::spawn::SpawnContext;
use glam::Vec2;
use std::f32::consts::TAU;

/// Shape of a click effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Radial sine displacement travelling outward.
    Ripple,
    /// Twist around the epicenter.
    Rotate,
    /// Horizontal shear proportional to vertical offset.
    Shear,
    /// Stretch horizontally, squash vertically.
    Scale,
    /// Vertical sine wave along x.
    Wave,
    /// Hash-driven jitter.
    Dissolve,
    /// Expanding ring, no distortion.
    Pulse,
}

impl EffectKind {
    /// Kinds a click may spawn.
    pub const DISTORTIONS: [EffectKind; 6] = [
        EffectKind::Ripple,
        EffectKind::Rotate,
        EffectKind::Shear,
        EffectKind::Scale,
        EffectKind::Wave,
        EffectKind::Dissolve,
    ];

    pub fn random(spawn: &mut SpawnContext) -> Self {
        Self::DISTORTIONS[spawn.random_index(Self::DISTORTIONS.len())]
    }
}

/// One active effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickEffect {
    pub origin: Vec2,
    pub kind: EffectKind,
    /// Simulation time the effect started.
    pub started_ms: f64,
    /// Linear progress through the effect's lifetime, `[0, 1]`.
    pub progress: f32,
}

impl ClickEffect {
    pub fn new(origin: Vec2, kind: EffectKind, started_ms: f64) -> Self {
        Self {
            origin,
            kind,
            started_ms,
            progress: 0.0,
        }
    }

    /// Recompute progress from the clock.
    pub fn advance(&mut self, now_ms: f64, duration_ms: f64) {
        self.progress = ((now_ms - self.started_ms) / duration_ms).clamp(0.0, 1.0) as f32;
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.progress >= 1.0
    }

    /// Local influence on `point`.
    pub fn influence(&self, point: Vec2, radius: f32) -> f32 {
        if self.progress >= 1.0 || self.kind == EffectKind::Pulse {
            return 0.0;
        }
        let d = point.distance(self.origin);
        if d >= radius {
            return 0.0;
        }
        (1.0 - d / radius) * (1.0 - self.progress)
    }

    /// Where `point` is drawn while this effect is active.
    pub fn distort(&self, point: Vec2, config: &EffectConfig) -> Vec2 {
        let k = self.influence(point, config.radius);
        if k <= 0.0 {
            return point;
        }
        let offset = point - self.origin;
        let t = self.progress;
        match self.kind {
            EffectKind::Ripple => {
                let d = offset.length();
                if d < 1e-4 {
                    return point;
                }
                let phase = d / config.ripple_wavelength * TAU - t * TAU * 2.0;
                point + offset / d * phase.sin() * config.ripple_amplitude * k
            }
            EffectKind::Rotate => self.origin + Vec2::from_angle(config.rotate_angle * k).rotate(offset),
            EffectKind::Shear => point + Vec2::new(offset.y * config.shear * k, 0.0),
            EffectKind::Scale => {
                self.origin + offset * Vec2::new(1.0 + config.scale * k, 1.0 - config.scale * k)
            }
            EffectKind::Wave => {
                let phase = point.x / config.wave_wavelength * TAU + t * TAU * 2.0;
                point + Vec2::new(0.0, phase.sin() * config.wave_amplitude * k)
            }
            EffectKind::Dissolve => {
                // Re-rolled ~20 times over the effect's life so the jitter flickers
                let bucket = (t * 20.0).floor();
                let jitter = Vec2::new(hash(point, bucket) - 0.5, hash(point, bucket + 97.0) - 0.5);
                point + jitter * 2.0 * config.dissolve_amplitude * k
            }
            EffectKind::Pulse => point,
        }
    }

    /// Ring radius and alpha for a pulse, `None` for other kinds.
    pub fn pulse_ring(&self, config: &EffectConfig) -> Option<(f32, f32)> {
        (self.kind == EffectKind::Pulse && self.progress < 1.0)
            .then(|| (config.pulse_radius * self.progress, 1.0 - self.progress))
    }
}

/// Cheap deterministic hash of a point into `[0, 1)`.
fn hash(p: Vec2, salt: f32) -> f32 {
    let h = (p.x * 12.9898 + p.y * 78.233 + salt * 37.719).sin() * 43_758.547;
    h - h.floor()
}

/// The set of active click effects.
#[derive(Debug, Clone, Default)]
pub struct EffectStack {
    effects: Vec<ClickEffect>,
}

impl EffectStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect, dropping the oldest beyond `max_active`.
    pub fn push(&mut self, effect: ClickEffect, max_active: usize) {
        self.effects.push(effect);
        if self.effects.len() > max_active.max(1) {
            let excess = self.effects.len() - max_active.max(1);
            self.effects.drain(..excess);
        }
    }

    /// Advance every effect and drop the expired ones.
    pub fn update(&mut self, now_ms: f64, duration_ms: f64) {
        for effect in &mut self.effects {
            effect.advance(now_ms, duration_ms);
        }
        self.effects.retain(|e| !e.is_expired());
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClickEffect> {
        self.effects.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Apply every distortion to `point` in order and return the displaced
    /// point together with the summed influence (capped at 1).
    pub fn apply(&self, point: Vec2, config: &EffectConfig) -> (Vec2, f32) {
        let mut displaced = point;
        let mut intensity = 0.0;
        for effect in &self.effects {
            intensity += effect.influence(point, config.radius);
            displaced = effect.distort(displaced, config);
        }
        (displaced, intensity.min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_influence_zero_outside_radius() {
        let effect = ClickEffect::new(Vec2::ZERO, EffectKind::Ripple, 0.0);
        assert_eq!(effect.influence(Vec2::new(220.0, 0.0), 220.0), 0.0);
        assert_eq!(effect.influence(Vec2::new(500.0, 0.0), 220.0), 0.0);
        assert!((effect.influence(Vec2::new(110.0, 0.0), 220.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_influence_zero_when_complete() {
        let mut effect = ClickEffect::new(Vec2::ZERO, EffectKind::Wave, 0.0);
        effect.advance(1000.0, 1000.0);
        assert_eq!(effect.progress, 1.0);
        assert_eq!(effect.influence(Vec2::new(1.0, 1.0), 220.0), 0.0);
        let config = EffectConfig::default();
        assert_eq!(effect.distort(Vec2::new(1.0, 1.0), &config), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_every_distortion_is_identity_outside_radius() {
        let config = EffectConfig::default();
        let far = Vec2::new(1000.0, 1000.0);
        for kind in EffectKind::DISTORTIONS {
            let effect = ClickEffect::new(Vec2::ZERO, kind, 0.0);
            assert_eq!(effect.distort(far, &config), far);
        }
    }

    #[test]
    fn test_distortions_are_deterministic() {
        let config = EffectConfig::default();
        let p = Vec2::new(30.0, -40.0);
        for kind in EffectKind::DISTORTIONS {
            let mut effect = ClickEffect::new(Vec2::ZERO, kind, 0.0);
            effect.advance(250.0, 1000.0);
            assert_eq!(effect.distort(p, &config), effect.distort(p, &config));
        }
    }

    #[test]
    fn test_rotate_preserves_distance() {
        let config = EffectConfig::default();
        let effect = ClickEffect::new(Vec2::new(10.0, 10.0), EffectKind::Rotate, 0.0);
        let p = Vec2::new(60.0, 10.0);
        let q = effect.distort(p, &config);
        assert!((q.distance(effect.origin) - 50.0).abs() < 1e-3);
        assert!(q != p);
    }

    #[test]
    fn test_pulse_never_distorts() {
        let config = EffectConfig::default();
        let mut effect = ClickEffect::new(Vec2::ZERO, EffectKind::Pulse, 0.0);
        effect.advance(400.0, 1000.0);
        assert_eq!(effect.distort(Vec2::new(5.0, 5.0), &config), Vec2::new(5.0, 5.0));
        let (radius, alpha) = effect.pulse_ring(&config).unwrap();
        assert!((radius - config.pulse_radius * 0.4).abs() < 1e-3);
        assert!((alpha - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_stack_expires_and_caps() {
        let mut stack = EffectStack::new();
        for i in 0..5 {
            stack.push(ClickEffect::new(Vec2::ZERO, EffectKind::Shear, i as f64 * 100.0), 3);
        }
        assert_eq!(stack.len(), 3);
        stack.update(1300.0, 1000.0);
        // Started at 200, 300, 400: the first is done
        assert_eq!(stack.len(), 2);
        stack.update(5000.0, 1000.0);
        assert!(stack.is_empty());
    }
}
