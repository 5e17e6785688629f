//! # glyphfall
//!
//! A decorative particle background: drifting dots, math glyphs and rendered
//! equations over a pointer-lit grid, plus a rare "gravitational collapse"
//! that pulls the live page layout into a singularity and puts it back.
//!
//! glyphfall is a frame-driven engine. It owns no window and no DOM: the host
//! feeds it input events, hands it a [`Surface`] to draw on, and optionally a
//! [`PageHost`] whose elements the spectacle may move.
//!
//! ## Quick Start
//!
//! ```ignore
//! use glyphfall::prelude::*;
//!
//! let mut sim = Simulation::new(EngineConfig::default())
//!     .with_viewport(Vec2::new(1280.0, 800.0));
//!
//! let mut surface = RasterSurface::new(1280, 800);
//! sim.handle(InputEvent::PointerMoved(Vec2::new(640.0, 400.0)));
//! sim.frame(16.0, Some(&mut surface));
//! surface.save_png("frame.png")?;
//! ```
//!
//! ## Core Concepts
//!
//! ### Particles
//!
//! The pool is fixed at start. Every particle is one [`Particle`] record with
//! a [`ParticleKind`]:
//!
//! | Kind | Draws | Leaves the viewport |
//! |------|-------|---------------------|
//! | `Dot` | small filled circle | teleports to the opposite edge |
//! | `Glyph` | text symbol, slowly spinning | teleports to the opposite edge |
//! | `Equation` | pre-rendered bitmap from the [`EquationCache`] | fades out, replaced at a random edge |
//!
//! Units are per frame: velocities in pixels per frame, rotation speeds in
//! radians per frame. Timers (effects, spectacle phases) run on the
//! millisecond clock passed to [`Simulation::frame`].
//!
//! ### Pointer
//!
//! The pointer bounces particles it runs into and gently repels those close
//! by. In fun mode, clicks distort the grid and the torch lights the grid and
//! particles around the pointer.
//!
//! ### The spectacle
//!
//! Six quick clicks in fun mode start a one-time sequence of
//! [`Phase`]s. Visible page elements are leased through
//! [`StyledElement`], fall into the singularity, get flung back out and are
//! restored to exactly the inline style they had before.
//!
//! ## Configuration
//!
//! Every tunable lives in [`EngineConfig`], which deserializes from JSON
//! with defaults for anything left out. See [`config`].
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and never installs a logger.

pub mod config;
pub mod effects;
pub mod equations;
pub mod error;
pub mod gravity;
pub mod grid;
pub mod input;
pub mod interactions;
pub mod lifecycle;
pub mod particle;
pub mod render;
pub mod runner;
pub mod simulation;
pub mod spawn;
pub mod store;
pub mod surface;
pub mod time;

pub use config::EngineConfig;
pub use effects::{ClickEffect, EffectKind, EffectStack};
pub use equations::{AssetSource, DirectorySource, EquationCache, EquationManifest, MemorySource};
pub use error::{AssetError, ConfigError};
pub use glam::Vec2;
pub use gravity::{NoPage, PageElement, PageHost, Phase, StyleProperty, StyledElement};
pub use input::{InputEvent, Viewport};
pub use particle::{FadeState, KindTag, Particle, ParticleKind};
pub use runner::{FrameLoop, FrameScheduler};
pub use simulation::{Simulation, SimulationContext};
pub use spawn::SpawnContext;
pub use surface::{Color, DrawCommand, RasterSurface, RecordingSurface, Rect, Surface};
pub use time::Time;

#[cfg(feature = "winit")]
pub use input::translate_window_event;

/// Everything needed to embed the engine.
///
/// ```ignore
/// use glyphfall::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::equations::{DirectorySource, EquationCache, EquationManifest, MemorySource};
    pub use crate::gravity::{NoPage, PageElement, PageHost, Phase, StyleProperty};
    pub use crate::input::InputEvent;
    pub use crate::runner::{FrameLoop, FrameScheduler};
    pub use crate::simulation::Simulation;
    pub use crate::surface::{Color, RasterSurface, RecordingSurface, Rect, Surface};
    pub use crate::time::Time;
    pub use glam::Vec2;
}
