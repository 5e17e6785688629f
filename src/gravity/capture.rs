//! Page elements as bodies falling into the singularity.
//!
//! Capture happens once, on entering `Sucking`. From then on every tick is a
//! single (not sub-stepped) Euler step per body:
//!
//! - inside the horizon the body is marked captured and handed a scripted
//!   fall-in (a host transition to the centre, scale 0, spin, opacity 0);
//! - otherwise it accelerates toward the singularity with `a = GM / d²`
//!   plus a tangential spiral term, and is drawn stretched along its heading.
//!
//! Only the four leased inline properties are ever written.

use crate::config::GravityConfig;
use crate::gravity::style::{PageElement, StyleProperty, StyledElement, Transform2d};
use glam::Vec2;

/// Milliseconds per simulation frame, the unit body velocities are kept in.
pub(crate) const FRAME_MS: f32 = 1000.0 / 60.0;

/// A leased page element treated as a physical body.
#[derive(Debug)]
pub struct DomParticle {
    pub element: StyledElement,
    /// Layout centre at capture time.
    pub origin: Vec2,
    /// Simulated centre.
    pub position: Vec2,
    /// Pixels per frame.
    pub velocity: Vec2,
    /// Proportional to rendered area.
    pub mass: f32,
    pub captured: bool,
    /// Clock time the body crossed the horizon.
    pub capture_time: Option<f64>,
    /// Distance to the singularity at the last physics step.
    pub last_distance: f32,
}

impl DomParticle {
    /// Lease `element` and start it at rest at its layout centre.
    pub fn new(element: Box<dyn PageElement>, singularity: Vec2, config: &GravityConfig) -> Self {
        let element = StyledElement::lease(element);
        let rect = element.rect();
        let origin = rect.center();
        Self {
            element,
            origin,
            position: origin,
            velocity: Vec2::ZERO,
            mass: (rect.area() * config.mass_per_area).max(f32::EPSILON),
            captured: false,
            capture_time: None,
            last_distance: origin.distance(singularity),
        }
    }

    /// Write `transform` relative to the layout position.
    pub fn write_transform(&mut self, rotate: f32, scale: Vec2) {
        let css = Transform2d {
            translate: self.position - self.origin,
            rotate,
            scale,
        }
        .to_css();
        self.element.set(StyleProperty::Transform, &css);
    }
}

/// The set of captured bodies and the singularity they fall toward.
#[derive(Debug, Default)]
pub struct CaptureEngine {
    bodies: Vec<DomParticle>,
    singularity: Vec2,
}

impl CaptureEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lease `elements` and disable their pointer interactivity.
    ///
    /// Every element is leased before any of them is touched, so a host that
    /// hands back the same element twice still gets two clean snapshots.
    pub fn capture(&mut self, elements: Vec<Box<dyn PageElement>>, singularity: Vec2, config: &GravityConfig) {
        self.singularity = singularity;
        self.bodies = elements
            .into_iter()
            .map(|element| DomParticle::new(element, singularity, config))
            .collect();
        for body in &mut self.bodies {
            body.element.set(StyleProperty::PointerEvents, "none");
            body.element.set(StyleProperty::Transition, "none");
        }
        log::debug!("Captured {} page elements", self.bodies.len());
    }

    #[inline]
    pub fn singularity(&self) -> Vec2 {
        self.singularity
    }

    pub fn bodies(&self) -> &[DomParticle] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [DomParticle] {
        &mut self.bodies
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn captured_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.captured).count()
    }

    /// One physics step for every free body.
    pub fn step(&mut self, dt_ms: f64, now_ms: f64, config: &GravityConfig) {
        let dt = dt_ms as f32 / FRAME_MS;
        let singularity = self.singularity;
        for body in &mut self.bodies {
            if !body.captured {
                step_body(body, singularity, dt, now_ms, config);
            }
        }
    }

    /// Release every lease. Styles are restored as the leases drop.
    pub fn release(&mut self) {
        self.bodies.clear();
    }
}

fn step_body(body: &mut DomParticle, singularity: Vec2, dt: f32, now_ms: f64, config: &GravityConfig) {
    let horizon = config.horizon_radius;
    let offset = singularity - body.position;
    let d = offset.length();
    body.last_distance = d;

    if d < horizon {
        fall_in(body, singularity, now_ms, config);
        return;
    }

    let inward = offset / d;
    let accel = config.gm / (d * d);
    // Spiral grows as the body closes in; heavy bodies swing less
    let closeness = (horizon * config.stretch_range / d).min(1.0);
    let swirl = config.spiral * closeness / body.mass.max(1.0).sqrt();
    body.velocity += (inward + inward.perp() * swirl) * accel * dt;
    body.velocity *= config.drag.powf(dt);

    let previous = body.position;
    body.position += body.velocity * dt;
    if segment_distance(previous, body.position, singularity) < horizon {
        fall_in(body, singularity, now_ms, config);
        return;
    }

    let stretch = stretch_at(d, config);
    let heading = body.velocity.y.atan2(body.velocity.x);
    body.write_transform(heading, Vec2::new(stretch, 1.0 / stretch));

    let opacity = opacity_at(d, config);
    if opacity < 1.0 {
        body.element.set(StyleProperty::Opacity, &format!("{opacity:.3}"));
    }
}

fn fall_in(body: &mut DomParticle, singularity: Vec2, now_ms: f64, config: &GravityConfig) {
    body.captured = true;
    body.capture_time = Some(now_ms);
    body.position = singularity;
    body.velocity = Vec2::ZERO;
    let transition = format!(
        "transform {ms:.0}ms ease-in, opacity {ms:.0}ms ease-in",
        ms = config.fall_in_ms
    );
    body.element.set(StyleProperty::Transition, &transition);
    body.write_transform(std::f32::consts::TAU * 2.0, Vec2::ZERO);
    body.element.set(StyleProperty::Opacity, "0");
}

/// Closest approach of the segment `a → b` to `p`.
fn segment_distance(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a.distance(p);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Spaghettification factor at distance `d`: 1 far away, `max_stretch` at
/// the horizon.
pub fn stretch_at(d: f32, config: &GravityConfig) -> f32 {
    let h = config.horizon_radius;
    let span = (config.stretch_range - 1.0).max(f32::EPSILON) * h;
    let t = ((config.stretch_range * h - d) / span).clamp(0.0, 1.0);
    1.0 + (config.max_stretch - 1.0) * t
}

/// Opacity at distance `d`: 1 beyond `fade_multiple` horizons, falling
/// linearly to 0 at the horizon.
pub fn opacity_at(d: f32, config: &GravityConfig) -> f32 {
    let h = config.horizon_radius;
    let span = (config.fade_multiple - 1.0).max(f32::EPSILON) * h;
    ((d - h) / span).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Rect;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    type Styles = Rc<RefCell<HashMap<StyleProperty, String>>>;

    struct Card {
        rect: Rect,
        styles: Styles,
    }

    impl PageElement for Card {
        fn rect(&self) -> Rect {
            self.rect
        }

        fn style(&self, property: StyleProperty) -> Option<String> {
            self.styles.borrow().get(&property).cloned()
        }

        fn set_style(&mut self, property: StyleProperty, value: Option<&str>) {
            let mut styles = self.styles.borrow_mut();
            match value {
                Some(v) => styles.insert(property, v.to_owned()),
                None => styles.remove(&property),
            };
        }
    }

    fn card(x: f32, y: f32) -> (Box<dyn PageElement>, Styles) {
        let styles = Styles::default();
        let element = Card {
            rect: Rect::new(x, y, 100.0, 40.0),
            styles: styles.clone(),
        };
        (Box::new(element), styles)
    }

    #[test]
    fn test_capture_disables_pointer_events() {
        let config = GravityConfig::default();
        let (element, styles) = card(10.0, 10.0);
        let mut engine = CaptureEngine::new();
        engine.capture(vec![element], Vec2::new(500.0, 400.0), &config);
        assert_eq!(engine.len(), 1);
        assert_eq!(styles.borrow().get(&StyleProperty::PointerEvents).map(String::as_str), Some("none"));
        let body = &engine.bodies()[0];
        assert!((body.mass - 4000.0 * config.mass_per_area).abs() < 1e-6);
        assert_eq!(body.origin, Vec2::new(60.0, 30.0));
    }

    #[test]
    fn test_bodies_fall_in_and_get_captured() {
        let config = GravityConfig::default();
        let singularity = Vec2::new(500.0, 400.0);
        let (a, _) = card(0.0, 0.0);
        let (b, _) = card(800.0, 700.0);
        let mut engine = CaptureEngine::new();
        engine.capture(vec![a, b], singularity, &config);
        let mut now = 0.0;
        for _ in 0..600 {
            now += 16.0;
            engine.step(16.0, now, &config);
        }
        assert_eq!(engine.captured_count(), 2);
        for body in engine.bodies() {
            assert!(body.capture_time.is_some());
            assert_eq!(body.element.style(StyleProperty::Opacity).as_deref(), Some("0"));
        }
    }

    #[test]
    fn test_release_restores_styles() {
        let config = GravityConfig::default();
        let (element, styles) = card(0.0, 0.0);
        styles.borrow_mut().insert(StyleProperty::Opacity, "0.8".into());
        let before = styles.borrow().clone();
        let mut engine = CaptureEngine::new();
        engine.capture(vec![element], Vec2::new(300.0, 300.0), &config);
        engine.step(16.0, 16.0, &config);
        engine.release();
        assert_eq!(*styles.borrow(), before);
    }

    #[test]
    fn test_stretch_and_fade_profiles() {
        let config = GravityConfig::default();
        let h = config.horizon_radius;
        assert_eq!(stretch_at(h * 10.0, &config), 1.0);
        assert!((stretch_at(h, &config) - config.max_stretch).abs() < 1e-5);
        assert_eq!(opacity_at(h * 5.0, &config), 1.0);
        assert_eq!(opacity_at(h, &config), 0.0);
        assert!((opacity_at(h * 2.0, &config) - 0.5).abs() < 1e-5);
    }
}
