//! # Headless Demo
//!
//! Renders the background to PNG frames without a window, then plays the
//! gravity spectacle against a fake page of a few cards.
//!
//! Run with: `RUST_LOG=glyphfall=debug cargo run --example headless -- [out_dir]`

use glyphfall::prelude::*;
use image::{ImageFormat, Rgba, RgbaImage};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;
use std::rc::Rc;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 400;

/// A page element whose inline styles live in a shared map.
struct Card {
    rect: Rect,
    styles: Rc<RefCell<HashMap<StyleProperty, String>>>,
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

struct FakePage {
    cards: Vec<(Rect, Rc<RefCell<HashMap<StyleProperty, String>>>)>,
}

impl PageHost for FakePage {
    fn query_visible(&mut self, selectors: &[String]) -> Vec<Box<dyn PageElement>> {
        println!("Page queried for {:?}", selectors);
        self.cards
            .iter()
            .map(|(rect, styles)| {
                Box::new(Card {
                    rect: *rect,
                    styles: styles.clone(),
                }) as Box<dyn PageElement>
            })
            .collect()
    }

    fn milestone_reached(&mut self) {
        println!("Milestone reached");
    }
}

fn bar_png(width: u32, height: u32) -> Result<Vec<u8>, image::ImageError> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        let a = if x % 12 < 8 { 220 } else { 0 };
        Rgba([230, 235, 255, a])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let out_dir = std::env::args().nth(1).unwrap_or_else(|| "frames".to_string());
    std::fs::create_dir_all(&out_dir)?;

    let manifest = EquationManifest::from_json(
        r#"{ "equations": [
            { "id": "gauss", "path": "gauss.png", "width": 220, "height": 48, "complexity": "medium" },
            { "id": "euler", "path": "euler.png", "width": 140, "height": 36, "complexity": "simple" }
        ] }"#,
    )?;
    let mut source = MemorySource::new();
    source.insert("gauss.png", bar_png(220, 48)?);
    source.insert("euler.png", bar_png(140, 36)?);

    let cards: Vec<_> = (0..4)
        .map(|i| {
            let rect = Rect::new(40.0 + i as f32 * 150.0, 60.0 + (i % 2) as f32 * 180.0, 120.0, 80.0);
            (rect, Rc::new(RefCell::new(HashMap::new())))
        })
        .collect();

    let mut config = EngineConfig::default();
    config.seed = Some(7);
    let mut sim = Simulation::new(config)
        .with_viewport(Vec2::new(WIDTH as f32, HEIGHT as f32))
        .with_equations(EquationCache::new(manifest, source).with_loads_per_frame(2))
        .with_host(FakePage { cards: cards.clone() });

    let mut time = Time::new();
    time.set_fixed_delta(Some(16.0));
    let mut surface = RasterSurface::new(WIDTH, HEIGHT);

    // Drift with the pointer sweeping across and the torch on
    sim.handle(InputEvent::FunMode(true));
    sim.handle(InputEvent::Torch(true));
    for frame in 0..120u32 {
        let x = 40.0 + frame as f32 * 4.5;
        sim.handle(InputEvent::PointerMoved(Vec2::new(x, 200.0 + (frame as f32 * 0.1).sin() * 80.0)));
        if frame == 60 {
            sim.handle(InputEvent::Click(Vec2::new(x, 200.0)));
        }
        let dt = time.advance(16.0);
        sim.frame(dt, Some(&mut surface));
        if frame % 20 == 0 {
            surface.save_png(format!("{}/drift_{:03}.png", out_dir, frame))?;
        }
    }

    // Six quick clicks start the spectacle
    for _ in 0..6 {
        sim.handle(InputEvent::Click(Vec2::new(320.0, 200.0)));
        let dt = time.advance(16.0);
        sim.frame(dt, Some(&mut surface));
    }

    let mut frame = 0u32;
    let mut last_phase = sim.phase();
    while sim.phase() != Phase::Idle {
        let dt = time.advance(16.0);
        sim.frame(dt, Some(&mut surface));
        if sim.phase() != last_phase || frame % 15 == 0 {
            surface.save_png(format!("{}/spectacle_{:04}_{:?}.png", out_dir, frame, sim.phase()))?;
            last_phase = sim.phase();
        }
        frame += 1;
    }

    let restored = cards.iter().all(|(_, styles)| styles.borrow().is_empty());
    println!(
        "Spectacle finished after {} frames ({:.1}s simulated), styles restored: {}",
        frame,
        time.elapsed_ms() / 1000.0,
        restored
    );
    Ok(())
}
