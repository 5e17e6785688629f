//! Particle records.
//!
//! All three particle kinds share one record: the kinematics and fade
//! lifecycle are common, and the kind-specific payload lives in
//! [`ParticleKind`]. Code that needs to treat kinds differently matches on
//! it once (renderer, lifecycle manager) instead of going through a trait
//! hierarchy.

use crate::equations::EquationHandle;
use glam::Vec2;
use std::f32::consts::TAU;

/// Opacity lifecycle, independent of motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeState {
    /// Rising toward the target opacity.
    In,
    /// Tracking the target opacity.
    Stable,
    /// Falling toward zero, pending replacement.
    Out,
}

/// Kind discriminator without payload, for counting and config lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindTag {
    Dot,
    Glyph,
    Equation,
}

impl KindTag {
    pub const ALL: [KindTag; 3] = [KindTag::Dot, KindTag::Glyph, KindTag::Equation];
}

/// Kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticleKind {
    /// Plain dot. Fixed size, never rotates, never fades.
    Dot,
    /// Short text symbol.
    Glyph { symbol: String, font_size: f32 },
    /// Pre-rendered equation image.
    Equation {
        /// Asset to draw. `None` when the manifest is empty.
        asset: Option<EquationHandle>,
        /// Rendered width, capped independently of height.
        width: f32,
        /// Rendered height, capped independently of width.
        height: f32,
        scale: f32,
        /// Nominal rotation swing. Informational: rotation is wrapped, not clamped.
        max_rotation: f32,
    },
}

/// A single background particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Centre, screen pixels.
    pub position: Vec2,
    /// Pixels per frame.
    pub velocity: Vec2,
    /// Collision and culling radius.
    pub radius: f32,
    pub opacity: f32,
    pub target_opacity: f32,
    /// Resting opacity the target relaxes back to after a strike.
    pub base_opacity: f32,
    /// Radians.
    pub rotation: f32,
    /// Radians per frame.
    pub rotation_speed: f32,
    pub fade: FadeState,
    pub kind: ParticleKind,
}

impl Particle {
    /// A dot at full resting opacity.
    pub fn dot(position: Vec2, velocity: Vec2, radius: f32, opacity: f32) -> Self {
        Self {
            position,
            velocity,
            radius,
            opacity,
            target_opacity: opacity,
            base_opacity: opacity,
            rotation: 0.0,
            rotation_speed: 0.0,
            fade: FadeState::Stable,
            kind: ParticleKind::Dot,
        }
    }

    /// A glyph fading in from transparent.
    pub fn glyph(position: Vec2, velocity: Vec2, symbol: String, font_size: f32, opacity: f32) -> Self {
        Self {
            position,
            velocity,
            radius: font_size * 0.5,
            opacity: 0.0,
            target_opacity: opacity,
            base_opacity: opacity,
            rotation: 0.0,
            rotation_speed: 0.0,
            fade: FadeState::In,
            kind: ParticleKind::Glyph { symbol, font_size },
        }
    }

    /// An equation fading in from transparent.
    pub fn equation(
        position: Vec2,
        velocity: Vec2,
        asset: Option<EquationHandle>,
        size: Vec2,
        scale: f32,
        max_rotation: f32,
        opacity: f32,
    ) -> Self {
        Self {
            position,
            velocity,
            // Geometric mean keeps wide equations from colliding at their far corners.
            radius: 0.5 * (size.x * size.y).sqrt(),
            opacity: 0.0,
            target_opacity: opacity,
            base_opacity: opacity,
            rotation: 0.0,
            rotation_speed: 0.0,
            fade: FadeState::In,
            kind: ParticleKind::Equation {
                asset,
                width: size.x,
                height: size.y,
                scale,
                max_rotation,
            },
        }
    }

    #[inline]
    pub fn tag(&self) -> KindTag {
        match self.kind {
            ParticleKind::Dot => KindTag::Dot,
            ParticleKind::Glyph { .. } => KindTag::Glyph,
            ParticleKind::Equation { .. } => KindTag::Equation,
        }
    }

    #[inline]
    pub fn is_equation(&self) -> bool {
        matches!(self.kind, ParticleKind::Equation { .. })
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Advance one fade step. Opacity never leaves `[0, 1]`.
    pub fn step_fade(&mut self, step: f32, relax: f32) {
        match self.fade {
            FadeState::In => {
                self.opacity += step;
                if self.opacity >= self.target_opacity {
                    self.opacity = self.target_opacity;
                    self.fade = FadeState::Stable;
                }
            }
            FadeState::Stable => {
                self.target_opacity += (self.base_opacity - self.target_opacity) * relax;
                let diff = self.target_opacity - self.opacity;
                self.opacity += diff.clamp(-step, step);
            }
            FadeState::Out => {
                self.opacity -= step;
            }
        }
        self.opacity = self.opacity.clamp(0.0, 1.0);
        self.target_opacity = self.target_opacity.clamp(0.0, 1.0);
    }

    /// Fold rotation back into `(-2π, 2π)`. Keeps the sign, never snaps to
    /// the nominal swing bound.
    #[inline]
    pub fn wrap_rotation(&mut self) {
        if self.rotation.abs() > TAU {
            self.rotation %= TAU;
        }
    }
}
