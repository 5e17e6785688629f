//! Integration tests for the gravity spectacle.
//!
//! These drive a full [`Simulation`] through the click gesture and the whole
//! phase table against an in-memory page, and check that every element ends
//! up with exactly the inline style it started with.

use glyphfall::config::EngineConfig;
use glyphfall::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

type Styles = Rc<RefCell<HashMap<StyleProperty, String>>>;

// ============================================================================
// In-memory page
// ============================================================================

struct Element {
    rect: Rect,
    styles: Styles,
}

impl PageElement for Element {
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

#[derive(Default)]
struct Page {
    elements: Vec<(Rect, Styles)>,
    queries: usize,
    milestones: usize,
}

impl Page {
    fn with_elements() -> Self {
        let mut page = Page::default();
        for i in 0..6 {
            let styles = Styles::default();
            // A mix of untouched elements and ones with inline styles of their own
            if i % 2 == 0 {
                styles.borrow_mut().insert(StyleProperty::Transform, "rotate(2deg)".into());
                styles.borrow_mut().insert(StyleProperty::Opacity, "0.85".into());
            }
            if i == 3 {
                styles.borrow_mut().insert(StyleProperty::Transition, "color 200ms".into());
                styles.borrow_mut().insert(StyleProperty::PointerEvents, "auto".into());
            }
            let rect = Rect::new(30.0 + (i % 3) as f32 * 250.0, 40.0 + (i / 3) as f32 * 380.0, 180.0, 90.0);
            page.elements.push((rect, styles));
        }
        page
    }

    fn snapshot(&self) -> Vec<HashMap<StyleProperty, String>> {
        self.elements.iter().map(|(_, s)| s.borrow().clone()).collect()
    }
}

impl PageHost for Page {
    fn query_visible(&mut self, _selectors: &[String]) -> Vec<Box<dyn PageElement>> {
        self.queries += 1;
        self.elements
            .iter()
            .map(|(rect, styles)| {
                Box::new(Element {
                    rect: *rect,
                    styles: styles.clone(),
                }) as Box<dyn PageElement>
            })
            .collect()
    }

    fn milestone_reached(&mut self) {
        self.milestones += 1;
    }
}

/// A page whose selectors overlap, so one element comes back twice.
struct OverlappingPage {
    styles: Styles,
}

impl PageHost for OverlappingPage {
    fn query_visible(&mut self, _selectors: &[String]) -> Vec<Box<dyn PageElement>> {
        let rect = Rect::new(200.0, 150.0, 160.0, 60.0);
        (0..2)
            .map(|_| {
                Box::new(Element {
                    rect,
                    styles: self.styles.clone(),
                }) as Box<dyn PageElement>
            })
            .collect()
    }
}

fn simulation<H: PageHost>(host: H) -> Simulation<H> {
    let mut config = EngineConfig::default();
    config.seed = Some(99);
    Simulation::new(config)
        .with_viewport(Vec2::new(800.0, 600.0))
        .with_host(host)
}

fn trigger<H: PageHost>(sim: &mut Simulation<H>) {
    sim.handle(InputEvent::FunMode(true));
    for _ in 0..6 {
        sim.handle(InputEvent::Click(Vec2::new(400.0, 300.0)));
        sim.step(40.0);
    }
}

/// Step until idle, returning the phases seen in order.
fn run_to_idle<H: PageHost>(sim: &mut Simulation<H>, mut each: impl FnMut(&Simulation<H>)) -> Vec<Phase> {
    let mut phases = vec![sim.phase()];
    for _ in 0..10_000 {
        sim.step(16.0);
        each(sim);
        if phases.last() != Some(&sim.phase()) {
            phases.push(sim.phase());
        }
        if sim.phase() == Phase::Idle {
            break;
        }
    }
    phases
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_styles_identical_after_full_run() {
    let page = Page::with_elements();
    let before = page.snapshot();
    let mut sim = simulation(page);

    trigger(&mut sim);
    assert_ne!(sim.phase(), Phase::Idle);

    let mut saw_capture = false;
    let phases = run_to_idle(&mut sim, |sim| {
        if sim.phase() == Phase::Sucking {
            let all_inert = sim.host().elements.iter().all(|(_, s)| {
                s.borrow().get(&StyleProperty::PointerEvents).map(String::as_str) == Some("none")
            });
            saw_capture |= all_inert;
        }
    });

    assert!(saw_capture, "elements were never made inert while sucking");
    assert_eq!(phases.last(), Some(&Phase::Idle));
    assert!(phases.contains(&Phase::Supernova));
    assert_eq!(sim.host().snapshot(), before);
    assert_eq!(sim.host().queries, 1);
    assert_eq!(sim.host().milestones, 1);
}

#[test]
fn test_zero_elements_still_returns_to_idle() {
    let mut sim = simulation(NoPage);
    trigger(&mut sim);
    let phases = run_to_idle(&mut sim, |_| {});
    assert_eq!(
        phases,
        vec![
            Phase::Triggered,
            Phase::GridBrighten,
            Phase::Forming,
            Phase::Warping,
            Phase::Sucking,
            Phase::FullyBlack,
            Phase::Message,
            Phase::Supernova,
            Phase::Restoring,
            Phase::Idle,
        ]
    );
    assert!(sim.spectacle().milestone_recorded());
}

#[test]
fn test_retrigger_ignored_while_running_and_after_milestone() {
    let mut sim = simulation(Page::with_elements());
    trigger(&mut sim);
    let first = sim.phase();
    trigger(&mut sim);
    // Still the same run, not restarted
    assert_ne!(sim.phase(), Phase::Idle);
    assert_ne!(sim.phase(), Phase::Triggered, "{first:?} restarted");

    run_to_idle(&mut sim, |_| {});
    trigger(&mut sim);
    assert_eq!(sim.phase(), Phase::Idle);
    assert_eq!(sim.host().queries, 1);
}

#[test]
fn test_dropping_mid_spectacle_restores_styles() {
    let page = Page::with_elements();
    let before = page.snapshot();
    let handles: Vec<Styles> = page.elements.iter().map(|(_, s)| s.clone()).collect();

    {
        let mut sim = simulation(page);
        trigger(&mut sim);
        for _ in 0..2000 {
            sim.step(16.0);
            if sim.phase() == Phase::FullyBlack {
                break;
            }
        }
        assert_eq!(sim.phase(), Phase::FullyBlack);
        assert!(handles.iter().any(|s| s.borrow().get(&StyleProperty::Opacity).is_some_and(|v| v == "0")));
    }

    let after: Vec<_> = handles.iter().map(|s| s.borrow().clone()).collect();
    assert_eq!(after, before);
}

#[test]
fn test_overlay_drawn_during_blackout() {
    let mut sim = simulation(NoPage);
    trigger(&mut sim);
    while sim.phase() != Phase::Message {
        sim.step(16.0);
    }
    // Let the caption fade in a little
    sim.step(100.0);
    let mut surface = RecordingSurface::new(800.0, 600.0);
    sim.render(&mut surface);
    let texts: Vec<_> = surface
        .commands()
        .iter()
        .filter_map(|c| match c {
            glyphfall::DrawCommand::Text { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect();
    assert!(texts.contains(&sim.config().gravity.message));
}

#[test]
fn test_element_returned_twice_is_restored() {
    let styles = Styles::default();
    styles.borrow_mut().insert(StyleProperty::Opacity, "0.9".into());
    let before = styles.borrow().clone();

    let mut sim = simulation(OverlappingPage { styles: styles.clone() });
    trigger(&mut sim);
    let phases = run_to_idle(&mut sim, |_| {});

    assert_eq!(phases.last(), Some(&Phase::Idle));
    assert_eq!(*styles.borrow(), before);
}
