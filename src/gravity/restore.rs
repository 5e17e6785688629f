//! Supernova launch and the staggered return to the snapshot.
//!
//! Every body is flung outward from where it was last seen, its `captured`
//! flag cleared. After the supernova flight each body, in index order with a
//! small stagger, gets a host transition and its snapshot `transform` and
//! `opacity` values; once that transition has had time to run the whole
//! snapshot (including `transition` and `pointer-events`) is written back.

use crate::config::GravityConfig;
use crate::gravity::capture::{DomParticle, FRAME_MS};
use crate::gravity::style::StyleProperty;
use crate::spawn::SpawnContext;
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Schedule {
    ease_at_ms: f64,
    done_at_ms: f64,
    easing: bool,
    done: bool,
}

/// Restoration bookkeeping, one schedule per body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Restoration {
    schedule: Vec<Schedule>,
    launched_at_ms: f64,
}

impl Restoration {
    /// Launch every body outward and schedule its return.
    ///
    /// Launch speed falls off with the body's last distance from the
    /// singularity and with its mass.
    pub fn launch(
        bodies: &mut [DomParticle],
        singularity: Vec2,
        now_ms: f64,
        config: &GravityConfig,
        spawn: &mut SpawnContext,
    ) -> Self {
        let flight_ms = config.durations.supernova;
        let schedule = bodies
            .iter_mut()
            .enumerate()
            .map(|(index, body)| {
                if body.captured {
                    body.position = singularity;
                }
                let distance = body.last_distance.max(config.horizon_radius);
                let speed = config.launch_speed / (distance * body.mass.max(1.0).sqrt());
                body.velocity = spawn.random_direction() * speed;
                body.captured = false;

                body.element.set(StyleProperty::Transition, "none");
                body.element.reset(StyleProperty::Opacity);
                body.write_transform(0.0, Vec2::ONE);

                let ease_at_ms = now_ms + flight_ms + index as f64 * config.stagger_ms;
                Schedule {
                    ease_at_ms,
                    done_at_ms: ease_at_ms + config.restore_ms,
                    easing: false,
                    done: false,
                }
            })
            .collect();
        log::debug!("Supernova: launched {} bodies", bodies.len());
        Self {
            schedule,
            launched_at_ms: now_ms,
        }
    }

    /// Clock time the bodies were flung out.
    #[inline]
    pub fn launched_at_ms(&self) -> f64 {
        self.launched_at_ms
    }

    /// Advance flights and start or finish eases that are due.
    pub fn step(&mut self, bodies: &mut [DomParticle], dt_ms: f64, now_ms: f64, config: &GravityConfig) {
        let dt = dt_ms as f32 / FRAME_MS;
        for (slot, body) in self.schedule.iter_mut().zip(bodies.iter_mut()) {
            if slot.done {
                continue;
            }
            if now_ms >= slot.done_at_ms {
                body.element.restore();
                slot.done = true;
            } else if now_ms >= slot.ease_at_ms {
                if !slot.easing {
                    let transition = format!(
                        "transform {ms:.0}ms cubic-bezier(0.22, 1, 0.36, 1), opacity {ms:.0}ms ease-out",
                        ms = config.restore_ms
                    );
                    body.element.set(StyleProperty::Transition, &transition);
                    body.element.reset(StyleProperty::Transform);
                    body.element.reset(StyleProperty::Opacity);
                    slot.easing = true;
                }
            } else {
                body.position += body.velocity * dt;
                body.velocity *= config.launch_damping.powf(dt);
                body.write_transform(0.0, Vec2::ONE);
            }
        }
    }

    /// Whether every body has its snapshot back.
    pub fn is_complete(&self) -> bool {
        self.schedule.iter().all(|s| s.done)
    }

    /// Bodies still animating.
    pub fn remaining(&self) -> usize {
        self.schedule.iter().filter(|s| !s.done).count()
    }
}
