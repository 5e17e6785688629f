//! Spectacle phases and their timeline.

use crate::config::PhaseDurations;

/// Stage of the DOM-gravity spectacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    Triggered,
    GridBrighten,
    Forming,
    Warping,
    Sucking,
    FullyBlack,
    Message,
    Supernova,
    Restoring,
}

impl Phase {
    /// The phase that follows this one. `Restoring` wraps back to `Idle`.
    pub fn next(self) -> Phase {
        match self {
            Phase::Idle => Phase::Idle,
            Phase::Triggered => Phase::GridBrighten,
            Phase::GridBrighten => Phase::Forming,
            Phase::Forming => Phase::Warping,
            Phase::Warping => Phase::Sucking,
            Phase::Sucking => Phase::FullyBlack,
            Phase::FullyBlack => Phase::Message,
            Phase::Message => Phase::Supernova,
            Phase::Supernova => Phase::Restoring,
            Phase::Restoring => Phase::Idle,
        }
    }

    /// Time spent in this phase before moving on. `None` for `Idle`.
    pub fn duration(self, durations: &PhaseDurations) -> Option<f64> {
        match self {
            Phase::Idle => None,
            Phase::Triggered => Some(durations.triggered),
            Phase::GridBrighten => Some(durations.grid_brighten),
            Phase::Forming => Some(durations.forming),
            Phase::Warping => Some(durations.warping),
            Phase::Sucking => Some(durations.sucking),
            Phase::FullyBlack => Some(durations.fully_black),
            Phase::Message => Some(durations.message),
            Phase::Supernova => Some(durations.supernova),
            Phase::Restoring => Some(durations.restoring),
        }
    }

    #[inline]
    pub fn is_idle(self) -> bool {
        self == Phase::Idle
    }
}

/// Accumulated-time driver over the phase table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timeline {
    phase: Phase,
    /// Time spent in the current phase.
    elapsed_ms: f64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Progress through the current phase, `[0, 1]`. Zero while idle.
    pub fn progress(&self, durations: &PhaseDurations) -> f32 {
        match self.phase.duration(durations) {
            Some(d) if d > 0.0 => (self.elapsed_ms / d).clamp(0.0, 1.0) as f32,
            Some(_) => 1.0,
            None => 0.0,
        }
    }

    /// Leave `Idle`. Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        if !self.phase.is_idle() {
            return false;
        }
        self.phase = Phase::Triggered;
        self.elapsed_ms = 0.0;
        true
    }

    /// Accumulate frame time. Call [`poll`](Self::poll) afterwards.
    pub fn accumulate(&mut self, dt_ms: f64) {
        if !self.phase.is_idle() {
            self.elapsed_ms += dt_ms.max(0.0);
        }
    }

    /// Move to the next phase if the current one is used up, carrying the
    /// surplus over. Returns the phase entered.
    ///
    /// `hold` keeps `Restoring` open past its minimum duration.
    pub fn poll(&mut self, durations: &PhaseDurations, hold: bool) -> Option<Phase> {
        let duration = self.phase.duration(durations)?;
        if self.elapsed_ms < duration || (self.phase == Phase::Restoring && hold) {
            return None;
        }
        self.elapsed_ms -= duration;
        self.phase = self.phase.next();
        if self.phase.is_idle() {
            self.elapsed_ms = 0.0;
        }
        Some(self.phase)
    }
}
