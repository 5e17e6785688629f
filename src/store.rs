//! Particle store and per-frame integrator.
//!
//! The store owns the fixed pool. [`ParticleStore::step`] advances every
//! particle by one frame in this order:
//!
//! 1. `position += velocity`
//! 2. `rotation += rotation_speed` (periodically folded modulo 2π)
//! 3. fade transition
//! 4. lifecycle recycling (see [`lifecycle`](crate::lifecycle))
//! 5. damping with a speed floor, then the per-kind speed clamp

use crate::config::{EngineConfig, KindLimits, MotionConfig};
use crate::equations::EquationCache;
use crate::input::Viewport;
use crate::lifecycle::{self, Placement, Recycle};
use crate::particle::{KindTag, Particle, ParticleKind};
use crate::spawn::SpawnContext;

/// What happened during one [`ParticleStore::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub teleported: usize,
    pub fading_out: usize,
    pub replaced: usize,
}

/// Fixed-size pool of background particles.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
    frame: u64,
}

impl ParticleStore {
    /// Build the pool described by `config.counts`, scattered over the viewport.
    pub fn populate(
        config: &EngineConfig,
        viewport: &Viewport,
        spawn: &mut SpawnContext,
        cache: &mut EquationCache,
    ) -> Self {
        let mut particles = Vec::with_capacity(config.counts.total());
        for kind in KindTag::ALL {
            for _ in 0..config.counts.of(kind) {
                particles.push(lifecycle::spawn_particle(
                    kind,
                    config,
                    viewport,
                    spawn,
                    cache,
                    Placement::Scatter,
                    None,
                ));
            }
        }
        log::debug!(
            "Populated {} particles ({} dots, {} glyphs, {} equations)",
            particles.len(),
            config.counts.dots,
            config.counts.glyphs,
            config.counts.equations
        );
        Self { particles, frame: 0 }
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Frames stepped so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of particles of one kind.
    pub fn count(&self, kind: KindTag) -> usize {
        self.particles.iter().filter(|p| p.tag() == kind).count()
    }

    /// Advance every particle by one frame.
    pub fn step(
        &mut self,
        config: &EngineConfig,
        viewport: &Viewport,
        spawn: &mut SpawnContext,
        cache: &mut EquationCache,
    ) -> StepReport {
        self.frame += 1;
        let wrap = config.motion.wrap_interval > 0 && self.frame % config.motion.wrap_interval == 0;
        let mut report = StepReport::default();

        for p in &mut self.particles {
            p.position += p.velocity;
            p.rotation += p.rotation_speed;
            if wrap {
                p.wrap_rotation();
            }

            p.step_fade(config.motion.fade_step, config.motion.opacity_relax);

            match lifecycle::recycle(p, config, viewport, spawn, cache) {
                Recycle::Kept => {}
                Recycle::Teleported => report.teleported += 1,
                Recycle::FadingOut => report.fading_out += 1,
                Recycle::Replaced => report.replaced += 1,
            }

            damp(p, config.limits(p.tag()), &config.motion, spawn);
        }

        if report.teleported + report.replaced > 0 {
            log::trace!(
                "Frame {}: {} teleported, {} replaced",
                self.frame,
                report.teleported,
                report.replaced
            );
        }
        report
    }
}

/// Damp velocity and spin, re-inject the kind's floor, clamp to its ceiling.
pub fn damp(p: &mut Particle, limits: &KindLimits, motion: &MotionConfig, spawn: &mut SpawnContext) {
    p.velocity *= motion.velocity_damping;
    let speed = p.velocity.length();
    if speed < limits.min_speed {
        let direction = if speed > 1e-6 {
            p.velocity / speed
        } else {
            spawn.random_direction()
        };
        p.velocity = spawn.perturb(direction, motion.floor_jitter) * limits.min_speed;
    }
    p.velocity = p.velocity.clamp_length_max(limits.max_speed);

    if matches!(p.kind, ParticleKind::Dot) {
        p.rotation_speed = 0.0;
        return;
    }

    p.rotation_speed *= motion.rotation_damping;
    let spin = p.rotation_speed.abs();
    if spin < limits.min_rotation_speed {
        let sign = if spin > 0.0 {
            p.rotation_speed.signum()
        } else {
            spawn.random_sign()
        };
        p.rotation_speed = sign * limits.min_rotation_speed * spawn.random_range(1.0, 1.3);
    }
    p.rotation_speed = p
        .rotation_speed
        .clamp(-motion.max_rotation_speed, motion.max_rotation_speed);
}
