//! Input state fed in by the host page.
//!
//! The host forwards raw events as [`InputEvent`]s through
//! [`Simulation::handle`](crate::Simulation::handle). This module only keeps
//! the plain state those events mutate: the pointer, the viewport and scroll
//! position, and the click-burst detector that recognizes the spectacle
//! gesture.
//!
//! With the `winit` feature, [`translate_window_event`] turns window events
//! into `InputEvent`s for native hosts.

use glam::Vec2;

/// A raw event from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer moved to a screen position.
    PointerMoved(Vec2),
    /// Pointer left the page.
    PointerLeft,
    /// Primary button activation at a screen position.
    Click(Vec2),
    /// Scroll offset and total scrollable page height changed.
    Scrolled { offset: f32, page_height: f32 },
    /// Viewport resized.
    Resized(Vec2),
    /// Enhanced-interaction ("fun") mode switched.
    FunMode(bool),
    /// Pointer torch switched.
    Torch(bool),
}

/// Pointer position with frame-to-frame velocity.
///
/// `previous` is the position at the end of the last frame, so the velocity
/// is the movement accumulated over one frame no matter how many move events
/// arrived in between.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    position: Vec2,
    previous: Vec2,
    present: bool,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a move. The first move after entering carries no velocity.
    pub fn move_to(&mut self, position: Vec2) {
        if !self.present {
            self.previous = position;
            self.present = true;
        }
        self.position = position;
    }

    /// Pointer left the page.
    pub fn leave(&mut self) {
        self.present = false;
    }

    /// Close the frame: the next velocity is measured from here.
    pub fn end_frame(&mut self) {
        self.previous = self.position;
    }

    /// Current position, if the pointer is over the page.
    #[inline]
    pub fn position(&self) -> Option<Vec2> {
        self.present.then_some(self.position)
    }

    #[inline]
    pub fn previous(&self) -> Vec2 {
        self.previous
    }

    /// Movement since the end of the last frame.
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        if self.present {
            self.position - self.previous
        } else {
            Vec2::ZERO
        }
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        self.present
    }
}

/// Viewport size plus scroll position within the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub size: Vec2,
    /// Vertical scroll offset of the page.
    pub scroll: f32,
    /// Total scrollable page height. Never less than the viewport height.
    pub page_height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            scroll: 0.0,
            page_height: height,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.size * 0.5
    }

    /// Whether `p` lies inside the viewport grown by `margin` on every side.
    #[inline]
    pub fn contains_with_margin(&self, p: Vec2, margin: f32) -> bool {
        p.x >= -margin && p.x <= self.size.x + margin && p.y >= -margin && p.y <= self.size.y + margin
    }

    pub(crate) fn set_scroll(&mut self, offset: f32, page_height: f32) {
        self.scroll = offset.max(0.0);
        self.page_height = page_height.max(self.size.y);
    }

    pub(crate) fn resize(&mut self, size: Vec2) {
        self.size = size.max(Vec2::ONE);
        self.page_height = self.page_height.max(self.size.y);
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

/// Groups rapid activations into bursts.
///
/// An activation joins the current burst when it comes within `gap_ms` of
/// the previous one; otherwise it starts a new burst of one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickBurst {
    gap_ms: f64,
    last_ms: Option<f64>,
    count: usize,
}

impl ClickBurst {
    pub fn new(gap_ms: f64) -> Self {
        Self {
            gap_ms,
            last_ms: None,
            count: 0,
        }
    }

    /// Register an activation at `now_ms`. Returns the length of the burst
    /// it belongs to.
    pub fn register(&mut self, now_ms: f64) -> usize {
        match self.last_ms {
            Some(last) if now_ms - last <= self.gap_ms => self.count += 1,
            _ => self.count = 1,
        }
        self.last_ms = Some(now_ms);
        self.count
    }

    /// Length of the current burst.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Forget the current burst.
    pub fn reset(&mut self) {
        self.last_ms = None;
        self.count = 0;
    }
}

/// Translate a winit window event into an [`InputEvent`].
///
/// Only pointer, click and resize events map; everything else is `None`.
/// Clicks are reported at the last known cursor position, which the caller
/// tracks from the preceding `CursorMoved` events.
#[cfg(feature = "winit")]
pub fn translate_window_event(event: &winit::event::WindowEvent, cursor: Vec2) -> Option<InputEvent> {
    use winit::event::{ElementState, MouseButton, WindowEvent};

    match event {
        WindowEvent::CursorMoved { position, .. } => {
            Some(InputEvent::PointerMoved(Vec2::new(position.x as f32, position.y as f32)))
        }
        WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeft),
        WindowEvent::MouseInput {
            state: ElementState::Pressed,
            button: MouseButton::Left,
            ..
        } => Some(InputEvent::Click(cursor)),
        WindowEvent::Resized(size) => Some(InputEvent::Resized(Vec2::new(size.width as f32, size.height as f32))),
        _ => None,
    }
}
