//! Host frame loop.
//!
//! The engine does not own an event loop. A host exposes its frame callback
//! mechanism (`requestAnimationFrame`, a winit redraw request, a test
//! harness) as a [`FrameScheduler`], and [`FrameLoop`] keeps exactly one
//! request outstanding while mounted:
//!
//! ```ignore
//! let mut frames = FrameLoop::new(scheduler, simulation);
//! frames.mount();
//!
//! // From the host's frame callback:
//! frames.on_frame(timestamp_ms, Some(&mut surface));
//!
//! // When the component goes away (or just drop `frames`):
//! frames.unmount();
//! ```

use crate::gravity::{NoPage, PageHost};
use crate::simulation::Simulation;
use crate::surface::Surface;
use crate::time::Time;

/// Something that can schedule and cancel frame callbacks.
pub trait FrameScheduler {
    /// Identifies a pending request.
    type Handle;

    fn request_frame(&mut self) -> Self::Handle;

    fn cancel_frame(&mut self, handle: Self::Handle);
}

/// Drives a [`Simulation`] from host frame callbacks.
pub struct FrameLoop<S: FrameScheduler, H: PageHost = NoPage> {
    scheduler: S,
    simulation: Simulation<H>,
    time: Time,
    pending: Option<S::Handle>,
    last_timestamp: Option<f64>,
    mounted: bool,
}

impl<S: FrameScheduler, H: PageHost> FrameLoop<S, H> {
    pub fn new(scheduler: S, simulation: Simulation<H>) -> Self {
        Self {
            scheduler,
            simulation,
            time: Time::new(),
            pending: None,
            last_timestamp: None,
            mounted: false,
        }
    }

    /// Start requesting frames.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        self.last_timestamp = None;
        self.pending = Some(self.scheduler.request_frame());
        log::debug!("Frame loop mounted");
    }

    /// Cancel the outstanding request and stop.
    pub fn unmount(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
        if self.mounted {
            self.mounted = false;
            log::debug!("Frame loop unmounted");
        }
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Handle a frame callback at host time `timestamp_ms`.
    ///
    /// Frames without a surface are skipped, but the next frame is still
    /// requested. Returns whether a frame was drawn.
    pub fn on_frame(&mut self, timestamp_ms: f64, surface: Option<&mut dyn Surface>) -> bool {
        self.pending = None;
        if !self.mounted {
            return false;
        }

        let raw = match self.last_timestamp {
            Some(last) => (timestamp_ms - last).max(0.0) as f32,
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp_ms);

        let drawn = match surface {
            Some(surface) => {
                let dt = self.time.advance(raw);
                self.simulation.frame(dt, Some(surface))
            }
            None => false,
        };
        self.pending = Some(self.scheduler.request_frame());
        drawn
    }

    /// Stop advancing (host hidden). Frames keep drawing the frozen state.
    pub fn pause(&mut self) {
        self.time.pause();
    }

    pub fn resume(&mut self) {
        self.time.resume();
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn time_mut(&mut self) -> &mut Time {
        &mut self.time
    }

    pub fn simulation(&self) -> &Simulation<H> {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation<H> {
        &mut self.simulation
    }
}

impl<S: FrameScheduler, H: PageHost> Drop for FrameLoop<S, H> {
    fn drop(&mut self) {
        self.unmount();
    }
}
