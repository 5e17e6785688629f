//! Randomness for spawning and perturbing particles.
//!
//! Every random decision the engine makes goes through one [`SpawnContext`]
//! so a fixed seed replays a session exactly.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// One side of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom];

    /// The edge across the viewport.
    pub fn opposite(self) -> Edge {
        match self {
            Edge::Left => Edge::Right,
            Edge::Right => Edge::Left,
            Edge::Top => Edge::Bottom,
            Edge::Bottom => Edge::Top,
        }
    }

    /// Unit vector pointing from this edge into the viewport.
    pub fn inward(self) -> Vec2 {
        match self {
            Edge::Left => Vec2::X,
            Edge::Right => Vec2::NEG_X,
            Edge::Top => Vec2::Y,
            Edge::Bottom => Vec2::NEG_Y,
        }
    }
}

/// Seeded random source with helpers for common spawn patterns.
pub struct SpawnContext {
    rng: SmallRng,
}

impl SpawnContext {
    /// Create a context. `None` seeds from the system clock.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42)
        });
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    // ========== Random primitives ==========

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`. Returns `min` for an empty range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    /// Random value inside a `[lo, hi]` config pair.
    #[inline]
    pub fn random_in(&mut self, range: [f32; 2]) -> f32 {
        self.random_range(range[0], range[1])
    }

    /// Random index below `len`. `len` must be non-zero.
    #[inline]
    pub fn random_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// True with the given probability.
    #[inline]
    pub fn chance(&mut self, probability: f32) -> bool {
        self.random() < probability
    }

    /// Random sign, -1.0 or 1.0.
    #[inline]
    pub fn random_sign(&mut self) -> f32 {
        if self.rng.gen::<bool>() {
            1.0
        } else {
            -1.0
        }
    }

    // ========== Geometry helpers ==========

    /// Random unit vector.
    pub fn random_direction(&mut self) -> Vec2 {
        Vec2::from_angle(self.rng.gen_range(0.0..TAU))
    }

    /// Random point inside `[0, size)`.
    pub fn random_in_rect(&mut self, size: Vec2) -> Vec2 {
        Vec2::new(self.random_range(0.0, size.x), self.random_range(0.0, size.y))
    }

    /// Random edge of the viewport.
    pub fn random_edge(&mut self) -> Edge {
        Edge::ALL[self.random_index(Edge::ALL.len())]
    }

    /// Point on `edge`, `inset` pixels outside the viewport, at a random
    /// position along the edge.
    pub fn point_on_edge(&mut self, edge: Edge, size: Vec2, inset: f32) -> Vec2 {
        match edge {
            Edge::Left => Vec2::new(-inset, self.random_range(0.0, size.y)),
            Edge::Right => Vec2::new(size.x + inset, self.random_range(0.0, size.y)),
            Edge::Top => Vec2::new(self.random_range(0.0, size.x), -inset),
            Edge::Bottom => Vec2::new(self.random_range(0.0, size.x), size.y + inset),
        }
    }

    /// Velocity of the given speed pointing into the viewport from `edge`,
    /// rotated by up to `spread` radians either way.
    pub fn inward_velocity(&mut self, edge: Edge, speed: f32, spread: f32) -> Vec2 {
        let angle = self.random_range(-spread, spread);
        Vec2::from_angle(angle).rotate(edge.inward()) * speed
    }

    /// `direction` rotated by up to `max_angle` either way.
    pub fn perturb(&mut self, direction: Vec2, max_angle: f32) -> Vec2 {
        let angle = self.random_range(-max_angle, max_angle);
        Vec2::from_angle(angle).rotate(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SpawnContext::new(Some(9));
        let mut b = SpawnContext::new(Some(9));
        for _ in 0..10 {
            assert_eq!(a.random(), b.random());
        }
    }

    #[test]
    fn test_random_direction_is_unit() {
        let mut ctx = SpawnContext::new(Some(1));
        for _ in 0..100 {
            assert!((ctx.random_direction().length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_point_on_edge_is_outside() {
        let mut ctx = SpawnContext::new(Some(2));
        let size = Vec2::new(800.0, 600.0);
        let p = ctx.point_on_edge(Edge::Left, size, 50.0);
        assert_eq!(p.x, -50.0);
        assert!((0.0..600.0).contains(&p.y));
        let p = ctx.point_on_edge(Edge::Bottom, size, 50.0);
        assert_eq!(p.y, 650.0);
    }

    #[test]
    fn test_inward_velocity_points_inward() {
        let mut ctx = SpawnContext::new(Some(3));
        for edge in Edge::ALL {
            let v = ctx.inward_velocity(edge, 1.0, 0.5);
            assert!(v.dot(edge.inward()) > 0.8);
        }
    }

    #[test]
    fn test_empty_range_returns_min() {
        let mut ctx = SpawnContext::new(Some(4));
        assert_eq!(ctx.random_range(2.0, 2.0), 2.0);
    }

    #[test]
    fn test_opposite_edges() {
        for edge in Edge::ALL {
            assert_eq!(edge.opposite().opposite(), edge);
            assert_ne!(edge.opposite(), edge);
        }
    }
}
