//! Inline-style leases on host page elements.
//!
//! The spectacle is allowed to touch exactly four inline style properties of
//! an element, and must hand every one of them back verbatim. A
//! [`StyledElement`] enforces that: it snapshots the four values when it is
//! created, all writes go through it, and [`StyledElement::restore`] (or
//! dropping it) writes the snapshot back.

use crate::surface::Rect;
use glam::Vec2;
use std::fmt;

/// The inline style properties the spectacle may mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    Transform,
    Opacity,
    Transition,
    PointerEvents,
}

impl StyleProperty {
    pub const ALL: [StyleProperty; 4] = [
        StyleProperty::Transform,
        StyleProperty::Opacity,
        StyleProperty::Transition,
        StyleProperty::PointerEvents,
    ];

    /// CSS property name.
    pub fn css_name(self) -> &'static str {
        match self {
            StyleProperty::Transform => "transform",
            StyleProperty::Opacity => "opacity",
            StyleProperty::Transition => "transition",
            StyleProperty::PointerEvents => "pointer-events",
        }
    }

    fn index(self) -> usize {
        match self {
            StyleProperty::Transform => 0,
            StyleProperty::Opacity => 1,
            StyleProperty::Transition => 2,
            StyleProperty::PointerEvents => 3,
        }
    }
}

/// A rendered page element the host lets the engine move around.
///
/// Style values are the element's *inline* values; `None` means the
/// property is not set inline.
pub trait PageElement {
    /// Layout box in viewport coordinates, before any engine transform.
    fn rect(&self) -> Rect;

    fn style(&self, property: StyleProperty) -> Option<String>;

    /// Set (`Some`) or remove (`None`) an inline property.
    fn set_style(&mut self, property: StyleProperty, value: Option<&str>);
}

/// Inline values of the four properties at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSnapshot {
    values: [Option<String>; 4],
}

impl StyleSnapshot {
    pub fn capture(element: &dyn PageElement) -> Self {
        Self {
            values: StyleProperty::ALL.map(|p| element.style(p)),
        }
    }

    pub fn get(&self, property: StyleProperty) -> Option<&str> {
        self.values[property.index()].as_deref()
    }

    /// Write every value back onto `element`.
    pub fn apply(&self, element: &mut dyn PageElement) {
        for property in StyleProperty::ALL {
            element.set_style(property, self.get(property));
        }
    }
}

/// Exclusive lease on a page element's inline style.
pub struct StyledElement {
    element: Box<dyn PageElement>,
    snapshot: StyleSnapshot,
    dirty: bool,
}

impl StyledElement {
    /// Take the lease. The snapshot is taken before anything is written.
    pub fn lease(element: Box<dyn PageElement>) -> Self {
        let snapshot = StyleSnapshot::capture(element.as_ref());
        Self {
            element,
            snapshot,
            dirty: false,
        }
    }

    pub fn snapshot(&self) -> &StyleSnapshot {
        &self.snapshot
    }

    pub fn rect(&self) -> Rect {
        self.element.rect()
    }

    pub fn style(&self, property: StyleProperty) -> Option<String> {
        self.element.style(property)
    }

    pub fn set(&mut self, property: StyleProperty, value: &str) {
        self.dirty = true;
        self.element.set_style(property, Some(value));
    }

    /// Set `property` back to its snapshot value, leaving the others alone.
    pub fn reset(&mut self, property: StyleProperty) {
        self.dirty = true;
        let value = self.snapshot.get(property).map(str::to_owned);
        self.element.set_style(property, value.as_deref());
    }

    /// Write the whole snapshot back.
    pub fn restore(&mut self) {
        if self.dirty {
            self.snapshot.apply(self.element.as_mut());
            self.dirty = false;
        }
    }

    #[inline]
    pub fn is_restored(&self) -> bool {
        !self.dirty
    }
}

impl Drop for StyledElement {
    fn drop(&mut self) {
        if self.dirty {
            log::debug!("Restoring element style on drop");
            self.restore();
        }
    }
}

impl fmt::Debug for StyledElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyledElement")
            .field("rect", &self.element.rect())
            .field("snapshot", &self.snapshot)
            .field("dirty", &self.dirty)
            .finish()
    }
}

/// A 2D CSS transform: translate, then rotate, then scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2d {
    pub translate: Vec2,
    /// Radians.
    pub rotate: f32,
    pub scale: Vec2,
}

impl Default for Transform2d {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            rotate: 0.0,
            scale: Vec2::ONE,
        }
    }
}

impl Transform2d {
    pub fn to_css(&self) -> String {
        format!(
            "translate({:.2}px, {:.2}px) rotate({:.4}rad) scale({:.4}, {:.4})",
            self.translate.x, self.translate.y, self.rotate, self.scale.x, self.scale.y
        )
    }
}
