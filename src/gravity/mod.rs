//! DOM-gravity spectacle.
//!
//! A rare gesture turns the live page into a set of bodies falling into a
//! singularity at the centre of the viewport, blacks the screen out, shows a
//! message and then flings everything back into place.
//!
//! The engine never owns page elements: the host hands out [`PageElement`]
//! handles, and the spectacle only touches their inline `transform`,
//! `opacity`, `transition` and `pointer-events` through a [`StyledElement`]
//! lease that writes the original values back when the run ends (or when the
//! lease is dropped).
//!
//! - [`style`] - leases, snapshots, CSS transforms
//! - [`phase`] - phase enum and the accumulated-time timeline
//! - [`capture`] - gravity step and horizon capture
//! - [`restore`] - supernova launch and staggered restoration
//! - [`spectacle`] - the state machine tying them together

pub mod capture;
pub mod phase;
pub mod restore;
pub mod spectacle;
pub mod style;

pub use capture::{CaptureEngine, DomParticle};
pub use phase::{Phase, Timeline};
pub use restore::Restoration;
pub use spectacle::{Caption, NoPage, Overlay, PageHost, Ring, Spectacle};
pub use style::{PageElement, StyleProperty, StyleSnapshot, StyledElement, Transform2d};
