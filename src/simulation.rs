//! Simulation builder and frame driver.
//!
//! [`Simulation`] ties every subsystem together. Build it with method
//! chaining, feed it [`InputEvent`]s as they arrive and call
//! [`frame`](Simulation::frame) once per display frame:
//!
//! ```ignore
//! let mut sim = Simulation::new(EngineConfig::default())
//!     .with_viewport(Vec2::new(1280.0, 800.0))
//!     .with_equations(cache)
//!     .with_host(page);
//!
//! sim.handle(InputEvent::PointerMoved(Vec2::new(300.0, 200.0)));
//! sim.frame(16.0, Some(&mut surface));
//! ```

use crate::config::EngineConfig;
use crate::effects::{ClickEffect, EffectKind, EffectStack};
use crate::equations::EquationCache;
use crate::gravity::{NoPage, PageHost, Phase, Spectacle};
use crate::grid::{self, GridLighting};
use crate::input::{ClickBurst, InputEvent, PointerState, Viewport};
use crate::interactions::collide;
use crate::particle::Particle;
use crate::render;
use crate::spawn::SpawnContext;
use crate::store::ParticleStore;
use crate::surface::Surface;
use glam::Vec2;

/// Shared per-frame state written by input and read by the integrator and
/// renderer.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    pointer: PointerState,
    viewport: Viewport,
    fun_mode: bool,
    torch: bool,
    effects: EffectStack,
    bursts: ClickBurst,
    clock_ms: f64,
}

impl SimulationContext {
    pub fn new(viewport: Viewport, burst_gap_ms: f64) -> Self {
        Self {
            pointer: PointerState::new(),
            viewport,
            fun_mode: false,
            torch: false,
            effects: EffectStack::new(),
            bursts: ClickBurst::new(burst_gap_ms),
            clock_ms: 0.0,
        }
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn fun_mode(&self) -> bool {
        self.fun_mode
    }

    pub fn torch(&self) -> bool {
        self.torch
    }

    pub fn effects(&self) -> &EffectStack {
        &self.effects
    }

    pub fn bursts(&self) -> &ClickBurst {
        &self.bursts
    }

    /// Simulated time since start.
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Where the torch shines, if fun mode and the torch are both on and the
    /// pointer is over the page.
    pub fn torch_center(&self) -> Option<Vec2> {
        if self.fun_mode && self.torch {
            self.pointer.position()
        } else {
            None
        }
    }

    pub fn set_pointer(&mut self, position: Option<Vec2>) {
        match position {
            Some(p) => self.pointer.move_to(p),
            None => self.pointer.leave(),
        }
    }

    pub fn set_viewport_size(&mut self, size: Vec2) {
        self.viewport.resize(size);
    }

    pub fn set_scroll(&mut self, offset: f32, page_height: f32) {
        self.viewport.set_scroll(offset, page_height);
    }

    pub fn set_fun_mode(&mut self, enabled: bool) {
        self.fun_mode = enabled;
        if !enabled {
            self.bursts.reset();
        }
    }

    /// Returns `true` if the torch actually changed.
    pub fn set_torch(&mut self, enabled: bool) -> bool {
        let changed = self.torch != enabled;
        self.torch = enabled;
        changed
    }
}

/// The particle background and its spectacle.
pub struct Simulation<H: PageHost = NoPage> {
    config: EngineConfig,
    context: SimulationContext,
    store: ParticleStore,
    cache: EquationCache,
    spawn: SpawnContext,
    spectacle: Spectacle,
    host: H,
}

impl Simulation<NoPage> {
    /// Create a simulation over the default viewport with no equations and
    /// no page host.
    ///
    /// A config that fails [`EngineConfig::validate`] is replaced by the
    /// defaults (keeping its seed) and a warning is logged.
    pub fn new(config: EngineConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                log::warn!("Invalid engine config, using defaults: {}", e);
                EngineConfig {
                    seed: config.seed,
                    ..EngineConfig::default()
                }
            }
        };
        let mut spawn = SpawnContext::new(config.seed);
        let mut cache = EquationCache::empty();
        let viewport = Viewport::default();
        let store = ParticleStore::populate(&config, &viewport, &mut spawn, &mut cache);
        let context = SimulationContext::new(viewport, config.effects.burst_gap_ms);
        Self {
            config,
            context,
            store,
            cache,
            spawn,
            spectacle: Spectacle::new(),
            host: NoPage,
        }
    }
}

impl<H: PageHost> Simulation<H> {
    /// Set the viewport size and re-scatter the particles over it.
    pub fn with_viewport(mut self, size: Vec2) -> Self {
        self.context.set_viewport_size(size);
        self.repopulate();
        self
    }

    /// Use `cache` for equation images and respawn the pool so equation
    /// particles pick from it.
    pub fn with_equations(mut self, cache: EquationCache) -> Self {
        self.cache = cache;
        self.repopulate();
        self
    }

    /// Attach the page the spectacle captures elements from.
    pub fn with_host<H2: PageHost>(self, host: H2) -> Simulation<H2> {
        let Simulation {
            config,
            context,
            store,
            cache,
            spawn,
            spectacle,
            host: _,
        } = self;
        Simulation {
            config,
            context,
            store,
            cache,
            spawn,
            spectacle,
            host,
        }
    }

    fn repopulate(&mut self) {
        self.store = ParticleStore::populate(&self.config, &self.context.viewport, &mut self.spawn, &mut self.cache);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    pub fn particles(&self) -> &[Particle] {
        self.store.particles()
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn cache(&self) -> &EquationCache {
        &self.cache
    }

    pub fn spectacle(&self) -> &Spectacle {
        &self.spectacle
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.spectacle.phase()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Tell the engine the milestone was already reached in an earlier
    /// session. The spectacle will not trigger again.
    pub fn mark_milestone_recorded(&mut self) {
        self.spectacle.mark_milestone_recorded();
    }

    /// Apply one input event.
    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMoved(p) => self.context.set_pointer(Some(p)),
            InputEvent::PointerLeft => self.context.set_pointer(None),
            InputEvent::Click(p) => self.click(p),
            InputEvent::Scrolled { offset, page_height } => self.context.set_scroll(offset, page_height),
            InputEvent::Resized(size) => self.context.set_viewport_size(size),
            InputEvent::FunMode(enabled) => self.context.set_fun_mode(enabled),
            InputEvent::Torch(enabled) => {
                if self.context.set_torch(enabled) && self.context.fun_mode {
                    if let Some(at) = self.context.pointer.position() {
                        self.push_effect(ClickEffect::new(at, EffectKind::Pulse, self.context.clock_ms));
                    }
                }
            }
        }
    }

    fn click(&mut self, at: Vec2) {
        if !self.context.fun_mode {
            return;
        }
        let now = self.context.clock_ms;
        let kind = EffectKind::random(&mut self.spawn);
        self.push_effect(ClickEffect::new(at, kind, now));

        let burst = self.context.bursts.register(now);
        if burst >= self.config.effects.burst_threshold {
            log::debug!("Click burst of {}", burst);
            if self.spectacle.trigger(self.context.viewport.center()) {
                self.context.bursts.reset();
            }
        }
    }

    fn push_effect(&mut self, effect: ClickEffect) {
        self.context.effects.push(effect, self.config.effects.max_active);
    }

    /// Advance the simulation by `dt_ms` without drawing.
    ///
    /// A zero delta (paused clock) changes nothing.
    pub fn step(&mut self, dt_ms: f32) {
        if dt_ms <= 0.0 {
            return;
        }
        let dt = dt_ms as f64;
        self.context.clock_ms += dt;

        self.cache.pump();
        self.store
            .step(&self.config, &self.context.viewport, &mut self.spawn, &mut self.cache);

        if self.context.pointer.is_present() {
            for p in self.store.particles_mut() {
                collide(
                    p,
                    &self.context.pointer,
                    &self.config.pointer,
                    self.config.limits(p.tag()),
                    self.config.motion.max_rotation_speed,
                    &mut self.spawn,
                );
            }
        }

        self.context
            .effects
            .update(self.context.clock_ms, self.config.effects.duration_ms);
        self.spectacle
            .tick(dt, &mut self.host, &self.config.gravity, &mut self.spawn);
        self.context.pointer.end_frame();
    }

    /// Draw the current state.
    pub fn render(&self, surface: &mut dyn Surface) {
        surface.clear(render::BACKGROUND);

        let overlay = self.spectacle.overlay(&self.config.gravity, surface.size());
        let lighting = GridLighting {
            torch: self.context.torch_center(),
            scanline: grid::scanline_y(self.context.clock_ms, &self.context.viewport, &self.config.grid),
            effects: &self.context.effects,
            boost: overlay.grid_boost,
        };
        grid::draw_grid(surface, &lighting, &self.config.grid, &self.config.pointer, &self.config.effects);
        render::draw_pulses(surface, &self.context.effects, &self.config);
        render::draw_particles(
            surface,
            self.store.particles(),
            &self.cache,
            lighting.torch,
            &self.config.pointer,
        );
        if !overlay.is_empty() {
            render::draw_overlay(surface, &overlay);
        }
    }

    /// Step and draw one frame. Without a surface nothing happens and
    /// `false` is returned.
    pub fn frame(&mut self, dt_ms: f32, surface: Option<&mut dyn Surface>) -> bool {
        let Some(surface) = surface else {
            log::trace!("No surface, frame skipped");
            return false;
        };
        self.step(dt_ms);
        self.render(surface);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;
    use crate::particle::KindTag;
    use crate::surface::RecordingSurface;

    fn seeded() -> Simulation {
        let mut config = EngineConfig::default();
        config.seed = Some(21);
        Simulation::new(config).with_viewport(Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let mut config = EngineConfig::default();
        config.seed = Some(4);
        config.counts.glyphs = 12;
        config.appearance.glyph_symbols.clear();
        let mut sim = Simulation::new(config).with_viewport(Vec2::new(800.0, 600.0));

        assert!(sim.config().validate().is_ok());
        assert_eq!(sim.config().seed, Some(4));
        assert!(!sim.config().appearance.glyph_symbols.is_empty());
        assert_eq!(sim.store().count(KindTag::Glyph), sim.config().counts.glyphs);
        for _ in 0..10 {
            sim.step(16.0);
        }
    }

    #[test]
    fn test_frame_without_surface_is_noop() {
        let mut sim = seeded();
        let before = sim.particles().to_vec();
        assert!(!sim.frame(16.0, None));
        assert_eq!(sim.particles(), &before[..]);
        assert_eq!(sim.context().clock_ms(), 0.0);
    }

    #[test]
    fn test_frame_draws_and_advances() {
        let mut sim = seeded();
        let mut surface = RecordingSurface::new(800.0, 600.0);
        assert!(sim.frame(16.0, Some(&mut surface)));
        assert_eq!(sim.context().clock_ms(), 16.0);
        assert!(!surface.commands().is_empty());
        assert_eq!(sim.store().count(KindTag::Dot), sim.config().counts.dots);
    }

    #[test]
    fn test_clicks_ignored_outside_fun_mode() {
        let mut sim = seeded();
        sim.handle(InputEvent::Click(Vec2::new(100.0, 100.0)));
        assert!(sim.context().effects().is_empty());
        assert_eq!(sim.context().bursts().count(), 0);
    }

    #[test]
    fn test_burst_triggers_spectacle() {
        let mut sim = seeded();
        sim.handle(InputEvent::FunMode(true));
        for _ in 0..6 {
            sim.handle(InputEvent::Click(Vec2::new(100.0, 100.0)));
            sim.step(50.0);
        }
        assert!(sim.spectacle().is_active());
        assert_eq!(sim.context().bursts().count(), 0);
    }

    #[test]
    fn test_torch_toggle_spawns_pulse() {
        let mut sim = seeded();
        sim.handle(InputEvent::FunMode(true));
        sim.handle(InputEvent::PointerMoved(Vec2::new(200.0, 200.0)));
        sim.handle(InputEvent::Torch(true));
        assert_eq!(sim.context().effects().len(), 1);
        assert!(sim.context().effects().iter().all(|e| e.kind == EffectKind::Pulse));
        assert_eq!(sim.context().torch_center(), Some(Vec2::new(200.0, 200.0)));

        // Same state again is not a toggle
        sim.handle(InputEvent::Torch(true));
        assert_eq!(sim.context().effects().len(), 1);
    }

    #[test]
    fn test_torch_needs_fun_mode() {
        let mut sim = seeded();
        sim.handle(InputEvent::PointerMoved(Vec2::new(200.0, 200.0)));
        sim.handle(InputEvent::Torch(true));
        assert_eq!(sim.context().torch_center(), None);
        assert!(sim.context().effects().is_empty());
    }

    #[test]
    fn test_resize_recycles_outside_particles() {
        let mut sim = seeded();
        sim.handle(InputEvent::Resized(Vec2::new(300.0, 200.0)));
        sim.step(16.0);
        let vp = *sim.context().viewport();
        let margin = sim.config().motion.margin;
        for p in sim.particles().iter().filter(|p| !p.is_equation()) {
            assert!(vp.contains_with_margin(p.position, margin + 1.0));
        }
    }
}
