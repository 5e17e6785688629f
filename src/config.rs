//! Engine configuration.
//!
//! Every tunable of the simulation lives here, grouped by the subsystem that
//! reads it. All sections implement `Default` with the hand-tuned values the
//! engine ships with, and the whole tree is serde-(de)serializable so a host
//! can override a handful of values from JSON:
//!
//! ```ignore
//! let config = EngineConfig::from_json(r#"{ "counts": { "dots": 120 } }"#)?;
//! let sim = Simulation::new(config);
//! ```
//!
//! Units: distances are screen pixels, velocities are pixels per frame,
//! rotation speeds are radians per frame, durations are milliseconds.

use crate::error::ConfigError;
use crate::particle::KindTag;
use serde::{Deserialize, Deserializer, Serialize};
use std::f32::consts::PI;

/// Top-level configuration for a [`Simulation`](crate::Simulation).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pool size per particle kind.
    pub counts: ParticleCounts,
    /// Motion limits for dots.
    #[serde(deserialize_with = "dot_limits")]
    pub dot: KindLimits,
    /// Motion limits for text glyphs.
    #[serde(deserialize_with = "glyph_limits")]
    pub glyph: KindLimits,
    /// Motion limits for equation images.
    #[serde(deserialize_with = "equation_limits")]
    pub equation: KindLimits,
    /// Kind-specific visual parameters.
    pub appearance: Appearance,
    /// Integrator constants.
    pub motion: MotionConfig,
    /// Pointer collision and torch parameters.
    pub pointer: PointerConfig,
    /// Background lattice and scanline.
    pub grid: GridConfig,
    /// Click effects and burst detection.
    pub effects: EffectConfig,
    /// DOM-gravity spectacle.
    pub gravity: GravityConfig,
    /// Fixed RNG seed. `None` seeds from the system clock.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            counts: ParticleCounts::default(),
            dot: KindLimits::dot(),
            glyph: KindLimits::glyph(),
            equation: KindLimits::equation(),
            appearance: Appearance::default(),
            motion: MotionConfig::default(),
            pointer: PointerConfig::default(),
            grid: GridConfig::default(),
            effects: EffectConfig::default(),
            gravity: GravityConfig::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Limits for the given particle kind.
    pub fn limits(&self, kind: KindTag) -> &KindLimits {
        match kind {
            KindTag::Dot => &self.dot,
            KindTag::Glyph => &self.glyph,
            KindTag::Equation => &self.equation,
        }
    }

    /// Check every value the integrator relies on being in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, limits) in [("dot", &self.dot), ("glyph", &self.glyph), ("equation", &self.equation)] {
            if !(limits.max_speed > 0.0) {
                return Err(invalid(format!("{name}.max_speed must be positive")));
            }
            if limits.min_speed < 0.0 || limits.min_speed > limits.max_speed {
                return Err(invalid(format!("{name}.min_speed must be within [0, max_speed]")));
            }
            if limits.min_rotation_speed < 0.0 || limits.min_rotation_speed > self.motion.max_rotation_speed {
                return Err(invalid(format!(
                    "{name}.min_rotation_speed must be within [0, motion.max_rotation_speed]"
                )));
            }
            let [lo, hi] = limits.opacity;
            if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo > hi {
                return Err(invalid(format!("{name}.opacity must be an ordered range inside [0, 1]")));
            }
        }
        for (name, factor) in [
            ("motion.velocity_damping", self.motion.velocity_damping),
            ("motion.rotation_damping", self.motion.rotation_damping),
        ] {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(invalid(format!("{name} must be within (0, 1]")));
            }
        }
        if !(self.motion.fade_step > 0.0) {
            return Err(invalid("motion.fade_step must be positive".into()));
        }
        if self.motion.margin < 0.0 {
            return Err(invalid("motion.margin must not be negative".into()));
        }
        if !(self.grid.pitch >= 4.0) {
            return Err(invalid("grid.pitch must be at least 4 pixels".into()));
        }
        if self.grid.subdivisions == 0 {
            return Err(invalid("grid.subdivisions must be at least 1".into()));
        }
        if !(self.effects.duration_ms > 0.0) || !(self.effects.radius > 0.0) {
            return Err(invalid("effects.duration_ms and effects.radius must be positive".into()));
        }
        if self.effects.burst_threshold == 0 {
            return Err(invalid("effects.burst_threshold must be at least 1".into()));
        }
        if !(self.gravity.horizon_radius > 0.0) {
            return Err(invalid("gravity.horizon_radius must be positive".into()));
        }
        if self.appearance.glyph_symbols.is_empty() {
            return Err(invalid("appearance.glyph_symbols must not be empty".into()));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::Invalid(msg)
}

/// Number of particles of each kind. Fixed for the engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleCounts {
    pub dots: usize,
    pub glyphs: usize,
    pub equations: usize,
}

impl Default for ParticleCounts {
    fn default() -> Self {
        Self {
            dots: 70,
            glyphs: 36,
            equations: 8,
        }
    }
}

impl ParticleCounts {
    /// Count for one kind.
    pub fn of(&self, kind: KindTag) -> usize {
        match kind {
            KindTag::Dot => self.dots,
            KindTag::Glyph => self.glyphs,
            KindTag::Equation => self.equations,
        }
    }

    /// Total pool size.
    pub fn total(&self) -> usize {
        self.dots + self.glyphs + self.equations
    }
}

/// Per-kind motion bounds.
///
/// Each kind ships its own tuned values. In JSON, a kind section only needs
/// the fields it changes; the rest come from that kind's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindLimits {
    /// Hard cap on speed, applied after every impulse.
    pub max_speed: f32,
    /// Speed floor re-injected after damping.
    pub min_speed: f32,
    /// Rotation speed floor re-injected after damping. Zero disables spin.
    pub min_rotation_speed: f32,
    /// How far beyond the visual radius the pointer still collides.
    pub interaction_padding: f32,
    /// Range the resting opacity is drawn from.
    pub opacity: [f32; 2],
}

impl KindLimits {
    pub fn dot() -> Self {
        Self {
            max_speed: 0.6,
            min_speed: 0.08,
            min_rotation_speed: 0.0,
            interaction_padding: 8.0,
            opacity: [0.15, 0.45],
        }
    }

    pub fn glyph() -> Self {
        Self {
            max_speed: 0.9,
            min_speed: 0.1,
            min_rotation_speed: 0.002,
            interaction_padding: 6.0,
            opacity: [0.12, 0.35],
        }
    }

    pub fn equation() -> Self {
        Self {
            max_speed: 0.5,
            min_speed: 0.06,
            min_rotation_speed: 0.0008,
            interaction_padding: 4.0,
            opacity: [0.18, 0.4],
        }
    }
}

impl Default for KindLimits {
    fn default() -> Self {
        Self::dot()
    }
}

/// A partial [`KindLimits`] as it appears in JSON.
#[derive(Deserialize)]
struct KindLimitsOverride {
    max_speed: Option<f32>,
    min_speed: Option<f32>,
    min_rotation_speed: Option<f32>,
    interaction_padding: Option<f32>,
    opacity: Option<[f32; 2]>,
}

impl KindLimitsOverride {
    fn over(self, base: KindLimits) -> KindLimits {
        KindLimits {
            max_speed: self.max_speed.unwrap_or(base.max_speed),
            min_speed: self.min_speed.unwrap_or(base.min_speed),
            min_rotation_speed: self.min_rotation_speed.unwrap_or(base.min_rotation_speed),
            interaction_padding: self.interaction_padding.unwrap_or(base.interaction_padding),
            opacity: self.opacity.unwrap_or(base.opacity),
        }
    }
}

fn dot_limits<'de, D: Deserializer<'de>>(deserializer: D) -> Result<KindLimits, D::Error> {
    KindLimitsOverride::deserialize(deserializer).map(|o| o.over(KindLimits::dot()))
}

fn glyph_limits<'de, D: Deserializer<'de>>(deserializer: D) -> Result<KindLimits, D::Error> {
    KindLimitsOverride::deserialize(deserializer).map(|o| o.over(KindLimits::glyph()))
}

fn equation_limits<'de, D: Deserializer<'de>>(deserializer: D) -> Result<KindLimits, D::Error> {
    KindLimitsOverride::deserialize(deserializer).map(|o| o.over(KindLimits::equation()))
}

/// Kind-specific visual parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Appearance {
    /// Radius of a dot.
    pub dot_radius: f32,
    /// Font size range for glyphs.
    pub glyph_font_size: [f32; 2],
    /// Symbols glyph particles are drawn from.
    pub glyph_symbols: Vec<String>,
    /// Rendered width cap for equations.
    pub equation_max_width: f32,
    /// Rendered height cap for equations.
    pub equation_max_height: f32,
    /// Scale range applied to an equation's manifest size.
    pub equation_scale: [f32; 2],
    /// Nominal rotation swing for equations (radians).
    pub equation_max_rotation: f32,
}

impl Default for Appearance {
    fn default() -> Self {
        let symbols = [
            "∑", "∫", "∂", "∇", "∞", "π", "λ", "θ", "φ", "Δ", "Ω", "√", "≈", "≠", "∈", "⊗", "ℏ", "ψ",
            "∮", "∀", "∃", "ε", "μ", "σ",
        ];
        Self {
            dot_radius: 1.6,
            glyph_font_size: [12.0, 22.0],
            glyph_symbols: symbols.iter().map(|s| s.to_string()).collect(),
            equation_max_width: 260.0,
            equation_max_height: 90.0,
            equation_scale: [0.55, 0.9],
            equation_max_rotation: PI / 3.0,
        }
    }
}

/// Integrator constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Velocity multiplier applied every frame.
    pub velocity_damping: f32,
    /// Rotation speed multiplier applied every frame.
    pub rotation_damping: f32,
    /// Global cap on rotation speed.
    pub max_rotation_speed: f32,
    /// Opacity change per frame while fading.
    pub fade_step: f32,
    /// Rate at which a struck particle's target opacity relaxes to its base.
    pub opacity_relax: f32,
    /// Off-screen margin before a particle is recycled.
    pub margin: f32,
    /// Max angle (radians) a re-injected floor velocity is perturbed by.
    pub floor_jitter: f32,
    /// Frames between equation rotation normalizations.
    pub wrap_interval: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            velocity_damping: 0.996,
            rotation_damping: 0.985,
            max_rotation_speed: 0.05,
            fade_step: 0.012,
            opacity_relax: 0.02,
            margin: 100.0,
            floor_jitter: 0.35,
            wrap_interval: 120,
        }
    }
}

/// Pointer collision, soft field and torch parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Particles farther than this from the pointer are skipped entirely.
    pub prefilter_distance: f32,
    /// Fraction of impact speed returned along the normal.
    pub bounce: f32,
    /// Fraction of the pointer's tangential speed transferred.
    pub drag: f32,
    /// Fraction of raw pointer velocity added on a hit.
    pub direct: f32,
    /// Spin imparted per unit of `cross(pointer_velocity, normal)`.
    pub spin: f32,
    /// Width of the soft repulsion band outside the collision radius.
    pub field_band: f32,
    /// Peak soft repulsion, at the collision radius.
    pub field_strength: f32,
    /// Exponential decay length of the soft repulsion.
    pub field_decay: f32,
    /// Target opacity boost after a strike.
    pub strike_boost: f32,
    /// Torch radius.
    pub torch_radius: f32,
    /// Torch falloff exponent.
    pub torch_exponent: f32,
    /// How much the torch brightens particles it covers.
    pub particle_glow: f32,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            prefilter_distance: 220.0,
            bounce: 0.55,
            drag: 0.2,
            direct: 0.06,
            spin: 0.0015,
            field_band: 18.0,
            field_strength: 0.12,
            field_decay: 6.0,
            strike_boost: 0.3,
            torch_radius: 180.0,
            torch_exponent: 2.0,
            particle_glow: 0.4,
        }
    }
}

/// Background lattice and scanline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Distance between grid lines.
    pub pitch: f32,
    /// Samples per grid cell along each line.
    pub subdivisions: u32,
    /// Resting line opacity.
    pub base_alpha: f32,
    /// Extra opacity at full intensity.
    pub highlight_alpha: f32,
    /// Intensity above which intersections are emphasized.
    pub intersection_threshold: f32,
    /// Half height of the scanline's influence band.
    pub scanline_band: f32,
    /// Scanline falloff exponent.
    pub scanline_exponent: f32,
    /// Scanline speed through the page (pixels per millisecond).
    pub scanline_speed: f32,
    /// Peak opacity of the scanline's gradient band.
    pub scanline_glow: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            pitch: 48.0,
            subdivisions: 4,
            base_alpha: 0.035,
            highlight_alpha: 0.4,
            intersection_threshold: 0.08,
            scanline_band: 90.0,
            scanline_exponent: 2.0,
            scanline_speed: 0.12,
            scanline_glow: 0.06,
        }
    }
}

/// Click effects and burst detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Lifetime of a click effect.
    pub duration_ms: f64,
    /// Radius of a click effect's influence.
    pub radius: f32,
    /// Maximum simultaneously active effects; the oldest is dropped.
    pub max_active: usize,
    pub ripple_amplitude: f32,
    pub ripple_wavelength: f32,
    /// Rotation at full influence (radians).
    pub rotate_angle: f32,
    pub shear: f32,
    pub scale: f32,
    pub wave_amplitude: f32,
    pub wave_wavelength: f32,
    pub dissolve_amplitude: f32,
    /// Final radius of a pulse ring.
    pub pulse_radius: f32,
    /// Max gap between two clicks of one burst.
    pub burst_gap_ms: f64,
    /// Burst length that triggers the spectacle.
    pub burst_threshold: usize,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            duration_ms: 1000.0,
            radius: 220.0,
            max_active: 12,
            ripple_amplitude: 14.0,
            ripple_wavelength: 38.0,
            rotate_angle: 0.6,
            shear: 0.45,
            scale: 0.35,
            wave_amplitude: 12.0,
            wave_wavelength: 64.0,
            dissolve_amplitude: 9.0,
            pulse_radius: 160.0,
            burst_gap_ms: 300.0,
            burst_threshold: 6,
        }
    }
}

/// Durations of the timed spectacle phases.
///
/// `restoring` is a minimum: the phase also waits for every element's
/// restoration animation to finish.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseDurations {
    pub triggered: f64,
    pub grid_brighten: f64,
    pub forming: f64,
    pub warping: f64,
    pub sucking: f64,
    pub fully_black: f64,
    pub message: f64,
    pub supernova: f64,
    pub restoring: f64,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            triggered: 150.0,
            grid_brighten: 900.0,
            forming: 1600.0,
            warping: 1400.0,
            sucking: 4200.0,
            fully_black: 900.0,
            message: 3200.0,
            supernova: 700.0,
            restoring: 600.0,
        }
    }
}

/// DOM-gravity spectacle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConfig {
    /// Gravitational constant times singularity mass.
    pub gm: f32,
    /// Event horizon radius.
    pub horizon_radius: f32,
    /// Spiral (tangential) acceleration relative to the radial one.
    pub spiral: f32,
    /// Peak spaghettification stretch.
    pub max_stretch: f32,
    /// Stretch starts at this multiple of the horizon radius.
    pub stretch_range: f32,
    /// Opacity fades below this multiple of the horizon radius.
    pub fade_multiple: f32,
    /// Mass per square pixel of element area.
    pub mass_per_area: f32,
    /// Length of the scripted fall-in once inside the horizon.
    pub fall_in_ms: f64,
    /// Outward launch speed scale (divided by distance).
    pub launch_speed: f32,
    /// Per-frame velocity retention while falling in.
    pub drag: f32,
    /// Per-frame damping of the outward launch.
    pub launch_damping: f32,
    /// Duration of each element's easing back to its snapshot.
    pub restore_ms: f64,
    /// Extra delay per element index.
    pub stagger_ms: f64,
    /// Structural selectors the host is asked for.
    pub selectors: Vec<String>,
    /// Text shown during the message phase.
    pub message: String,
    /// Phase timeline.
    pub durations: PhaseDurations,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            gm: 90_000.0,
            horizon_radius: 70.0,
            spiral: 0.35,
            max_stretch: 2.6,
            stretch_range: 6.0,
            fade_multiple: 3.0,
            mass_per_area: 1e-4,
            fall_in_ms: 700.0,
            launch_speed: 9_000.0,
            drag: 0.985,
            launch_damping: 0.9,
            restore_ms: 1200.0,
            stagger_ms: 18.0,
            selectors: ["header", "nav", "h1", "h2", "p", "section > *", "footer", "img", "a.button"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            message: "everything falls eventually".into(),
            durations: PhaseDurations::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "counts": { "dots": 3 }, "seed": 7 }"#).unwrap();
        assert_eq!(config.counts.dots, 3);
        assert_eq!(config.counts.glyphs, ParticleCounts::default().glyphs);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.grid.pitch, GridConfig::default().pitch);
    }

    #[test]
    fn test_rejects_inverted_speed_range() {
        let mut config = EngineConfig::default();
        config.glyph.min_speed = 5.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_damping_above_one() {
        let mut config = EngineConfig::default();
        config.motion.velocity_damping = 1.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_kind_override_keeps_kind_defaults() {
        let config = EngineConfig::from_json(
            r#"{ "glyph": { "max_speed": 1.2 }, "equation": { "opacity": [0.2, 0.3] } }"#,
        )
        .unwrap();
        let defaults = EngineConfig::default();

        assert_eq!(config.glyph.max_speed, 1.2);
        assert_eq!(config.glyph.min_rotation_speed, defaults.glyph.min_rotation_speed);
        assert_eq!(config.glyph.interaction_padding, defaults.glyph.interaction_padding);
        assert_eq!(config.glyph.opacity, defaults.glyph.opacity);

        assert_eq!(config.equation.opacity, [0.2, 0.3]);
        assert_eq!(config.equation.min_rotation_speed, 0.0008);
        assert_eq!(config.equation.max_speed, defaults.equation.max_speed);

        assert_eq!(config.dot, defaults.dot);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let mut config = EngineConfig::default();
        config.glyph.min_speed = 0.2;
        let json = serde_json::to_string(&config).unwrap();
        let back = EngineConfig::from_json(&json).unwrap();
        assert_eq!(back.glyph, config.glyph);
        assert_eq!(back.equation, config.equation);
    }

    #[test]
    fn test_limits_lookup() {
        let config = EngineConfig::default();
        assert_eq!(config.limits(KindTag::Equation).max_speed, config.equation.max_speed);
        assert_eq!(config.counts.of(KindTag::Glyph), config.counts.glyphs);
    }
}
