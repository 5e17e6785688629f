//! The gravitational-collapse spectacle.
//!
//! A [`Spectacle`] is idle until a long click burst triggers it. It then runs
//! the whole phase table without early cancel:
//!
//! | Phase | Entry action | Per tick |
//! |-------|--------------|----------|
//! | `Sucking` | capture visible page elements | gravity step |
//! | `Message` | record the milestone, notify the host | |
//! | `Supernova` | launch every body outward | flight |
//! | `Restoring` | | eases; held open until every body is restored |
//! | `Idle` | release all leases | |
//!
//! Everything else is cosmetic and only shows up in the [`Overlay`].

use crate::config::GravityConfig;
use crate::gravity::capture::CaptureEngine;
use crate::gravity::phase::{Phase, Timeline};
use crate::gravity::restore::Restoration;
use crate::gravity::style::PageElement;
use crate::spawn::SpawnContext;
use glam::Vec2;
use std::f32::consts::TAU;

/// The page the spectacle operates on.
pub trait PageHost {
    /// Visible elements matching any of `selectors`.
    fn query_visible(&mut self, selectors: &[String]) -> Vec<Box<dyn PageElement>>;

    /// Called once per session when the spectacle reaches its message.
    fn milestone_reached(&mut self) {}
}

/// Host with no page elements. The spectacle still plays its cosmetic phases.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPage;

impl PageHost for NoPage {
    fn query_visible(&mut self, _selectors: &[String]) -> Vec<Box<dyn PageElement>> {
        Vec::new()
    }
}

/// A ring drawn around the singularity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    pub radius: f32,
    pub alpha: f32,
}

/// Centred text.
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    pub alpha: f32,
}

/// What the spectacle wants drawn this frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub center: Vec2,
    /// Extra grid intensity, `[0, 1]`.
    pub grid_boost: f32,
    pub disc_radius: f32,
    pub disc_alpha: f32,
    pub lensing: Vec<Ring>,
    /// Black fill over the page, `[0, 1]`.
    pub blackout: f32,
    pub message: Option<Caption>,
    /// White flash, `[0, 1]`.
    pub flash: f32,
    pub shock: Option<Ring>,
}

impl Overlay {
    pub fn is_empty(&self) -> bool {
        *self
            == Overlay {
                center: self.center,
                ..Default::default()
            }
    }
}

/// State machine of the spectacle.
#[derive(Debug, Default)]
pub struct Spectacle {
    timeline: Timeline,
    engine: CaptureEngine,
    restoration: Option<Restoration>,
    milestone: bool,
    clock_ms: f64,
    center: Vec2,
}

impl Spectacle {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.timeline.phase()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        !self.timeline.phase().is_idle()
    }

    #[inline]
    pub fn milestone_recorded(&self) -> bool {
        self.milestone
    }

    /// Treat the milestone as already reached; the spectacle no longer triggers.
    pub fn mark_milestone_recorded(&mut self) {
        self.milestone = true;
    }

    pub fn engine(&self) -> &CaptureEngine {
        &self.engine
    }

    pub fn restoration(&self) -> Option<&Restoration> {
        self.restoration.as_ref()
    }

    /// Start the spectacle centred on `center`.
    ///
    /// Ignored while a run is in progress or once the milestone is recorded.
    pub fn trigger(&mut self, center: Vec2) -> bool {
        if self.milestone {
            log::debug!("Spectacle trigger ignored: milestone already recorded");
            return false;
        }
        if !self.timeline.start() {
            log::debug!("Spectacle trigger ignored: already running ({:?})", self.phase());
            return false;
        }
        self.center = center;
        self.clock_ms = 0.0;
        log::info!("Spectacle triggered");
        true
    }

    /// Advance by `dt_ms`.
    pub fn tick<H: PageHost + ?Sized>(
        &mut self,
        dt_ms: f64,
        host: &mut H,
        config: &GravityConfig,
        spawn: &mut SpawnContext,
    ) {
        if !self.is_active() {
            return;
        }
        self.clock_ms += dt_ms;
        self.timeline.accumulate(dt_ms);

        loop {
            let hold = self.restoration.as_ref().is_some_and(|r| !r.is_complete());
            let Some(entered) = self.timeline.poll(&config.durations, hold) else {
                break;
            };
            log::debug!("Spectacle phase -> {:?}", entered);
            self.enter(entered, host, config, spawn);
        }

        match self.phase() {
            Phase::Sucking => self.engine.step(dt_ms, self.clock_ms, config),
            Phase::Supernova | Phase::Restoring => {
                if let Some(restoration) = &mut self.restoration {
                    restoration.step(self.engine.bodies_mut(), dt_ms, self.clock_ms, config);
                }
                // Eases may finish between frames; close the phase as soon as they do
                if self.phase() == Phase::Restoring
                    && self.restoration.as_ref().is_some_and(Restoration::is_complete)
                    && self.timeline.poll(&config.durations, false).is_some()
                {
                    self.enter(Phase::Idle, host, config, spawn);
                }
            }
            _ => {}
        }
    }

    fn enter<H: PageHost + ?Sized>(
        &mut self,
        phase: Phase,
        host: &mut H,
        config: &GravityConfig,
        spawn: &mut SpawnContext,
    ) {
        match phase {
            Phase::Sucking => {
                let elements = host.query_visible(&config.selectors);
                self.engine.capture(elements, self.center, config);
            }
            Phase::Message => {
                if !self.milestone {
                    self.milestone = true;
                    log::info!("Spectacle milestone reached");
                    host.milestone_reached();
                }
            }
            Phase::Supernova => {
                let center = self.engine.singularity();
                // A long tick may have run past the phase boundary
                let entered_at = self.clock_ms - self.timeline.elapsed_ms();
                self.restoration = Some(Restoration::launch(
                    self.engine.bodies_mut(),
                    center,
                    entered_at,
                    config,
                    spawn,
                ));
            }
            Phase::Idle => {
                self.engine.release();
                self.restoration = None;
                log::info!("Spectacle complete");
            }
            _ => {}
        }
    }

    /// Cosmetic layer for the current phase.
    pub fn overlay(&self, config: &GravityConfig, extent: Vec2) -> Overlay {
        let t = self.timeline.progress(&config.durations);
        let h = config.horizon_radius;
        let mut overlay = Overlay {
            center: self.center,
            ..Default::default()
        };
        let lensing = |strength: f32| -> Vec<Ring> {
            (0..3)
                .map(|k| {
                    let phase = (self.clock_ms as f32 / 900.0 + k as f32 / 3.0).fract();
                    Ring {
                        radius: h * (1.4 + 2.5 * phase),
                        alpha: 0.35 * strength * (1.0 - phase),
                    }
                })
                .collect()
        };

        match self.phase() {
            Phase::Idle => {}
            Phase::Triggered => overlay.grid_boost = 0.3 * t,
            Phase::GridBrighten => overlay.grid_boost = 0.3 + 0.7 * t,
            Phase::Forming => {
                overlay.grid_boost = 1.0;
                overlay.disc_radius = h * t;
                overlay.disc_alpha = t;
            }
            Phase::Warping => {
                overlay.grid_boost = 1.0;
                overlay.disc_radius = h * (1.0 + 0.05 * (t * TAU * 3.0).sin());
                overlay.disc_alpha = 1.0;
                overlay.lensing = lensing(t);
            }
            Phase::Sucking => {
                overlay.grid_boost = 1.0 - 0.5 * t;
                overlay.disc_radius = h;
                overlay.disc_alpha = 1.0;
                overlay.lensing = lensing(1.0);
                overlay.blackout = 0.6 * t;
            }
            Phase::FullyBlack => {
                overlay.disc_radius = h;
                overlay.disc_alpha = 1.0;
                overlay.blackout = 0.6 + 0.4 * t;
            }
            Phase::Message => {
                overlay.blackout = 1.0;
                overlay.message = Some(Caption {
                    text: config.message.clone(),
                    alpha: (4.0 * t).min(4.0 * (1.0 - t)).clamp(0.0, 1.0),
                });
            }
            Phase::Supernova => {
                overlay.blackout = 1.0 - t;
                overlay.flash = (1.0 - t) * (1.0 - t);
                overlay.shock = Some(Ring {
                    radius: extent.length() * t,
                    alpha: 1.0 - t,
                });
            }
            Phase::Restoring => overlay.grid_boost = 0.3 * (1.0 - t),
        }
        overlay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_idle(spectacle: &mut Spectacle, host: &mut impl PageHost, config: &GravityConfig) -> Vec<Phase> {
        let mut spawn = SpawnContext::new(Some(2));
        let mut seen = vec![spectacle.phase()];
        for _ in 0..5000 {
            spectacle.tick(16.0, host, config, &mut spawn);
            if seen.last() != Some(&spectacle.phase()) {
                seen.push(spectacle.phase());
            }
            if !spectacle.is_active() {
                break;
            }
        }
        seen
    }

    #[test]
    fn test_empty_page_plays_every_phase() {
        let config = GravityConfig::default();
        let mut spectacle = Spectacle::new();
        assert!(spectacle.trigger(Vec2::new(400.0, 300.0)));
        let seen = run_to_idle(&mut spectacle, &mut NoPage, &config);
        assert_eq!(seen.first(), Some(&Phase::Triggered));
        assert_eq!(seen.last(), Some(&Phase::Idle));
        assert!(seen.contains(&Phase::Sucking));
        assert!(seen.contains(&Phase::Message));
        assert!(seen.contains(&Phase::Restoring));
        assert!(spectacle.milestone_recorded());
    }

    #[test]
    fn test_retrigger_ignored() {
        let mut spectacle = Spectacle::new();
        assert!(spectacle.trigger(Vec2::ZERO));
        assert!(!spectacle.trigger(Vec2::ZERO));

        let mut done = Spectacle::new();
        done.mark_milestone_recorded();
        assert!(!done.trigger(Vec2::ZERO));
        assert_eq!(done.phase(), Phase::Idle);
    }

    #[test]
    fn test_overlay_blacks_out_before_message() {
        let config = GravityConfig::default();
        let mut spectacle = Spectacle::new();
        let mut spawn = SpawnContext::new(Some(2));
        spectacle.trigger(Vec2::new(100.0, 100.0));
        assert!(spectacle.overlay(&config, Vec2::splat(200.0)).lensing.is_empty());
        let d = config.durations;
        let until_message = d.triggered + d.grid_brighten + d.forming + d.warping + d.sucking + d.fully_black;
        spectacle.tick(until_message + 1.0, &mut NoPage, &config, &mut spawn);
        assert_eq!(spectacle.phase(), Phase::Message);
        let overlay = spectacle.overlay(&config, Vec2::splat(200.0));
        assert_eq!(overlay.blackout, 1.0);
        assert_eq!(overlay.message.map(|m| m.text), Some(config.message.clone()));
        assert!(Overlay::default().is_empty());
    }

    #[test]
    fn test_launch_uses_phase_entry_time_on_long_tick() {
        let config = GravityConfig::default();
        let mut spectacle = Spectacle::new();
        let mut spawn = SpawnContext::new(Some(2));
        spectacle.trigger(Vec2::new(100.0, 100.0));
        let d = config.durations;
        let until_supernova =
            d.triggered + d.grid_brighten + d.forming + d.warping + d.sucking + d.fully_black + d.message;
        spectacle.tick(until_supernova + 50.0, &mut NoPage, &config, &mut spawn);
        assert_eq!(spectacle.phase(), Phase::Supernova);
        let launched = spectacle.restoration().map(Restoration::launched_at_ms);
        assert!(launched.is_some_and(|t| (t - until_supernova).abs() < 1e-6), "{launched:?}");
    }
}
