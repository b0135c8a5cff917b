//! Audio-reactive particle field
//!
//! Particles rise from an anchor line near the bottom of the chat panel,
//! faster when the microphone is loud, and are respawned on the anchor once
//! they pass the ceiling. The count never changes after construction.

use egui::ecolor::Hsva;
use egui::Color32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub count: usize,
    /// Height at which a particle is respawned (world units)
    pub ceiling: f32,
    /// Width of the spawn box along x
    pub spread_x: f32,
    /// Depth of the spawn box along z
    pub spread_z: f32,
    pub min_velocity: f32,
    pub velocity_jitter: f32,
    /// Amplitude at which particles rise five times faster
    pub amplitude_scale: f32,
    pub drift: f32,
    /// Rendered point diameter (world units)
    pub point_size: f32,
    pub opacity: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 600,
            ceiling: 5.0,
            spread_x: 6.0,
            spread_z: 1.0,
            min_velocity: 0.02,
            velocity_jitter: 0.02,
            amplitude_scale: 80.0,
            drift: 0.002,
            point_size: 0.15,
            opacity: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: [f32; 3],
    pub velocity: f32,
    pub color: Color32,
}

/// World-space y of the anchor for a panel whose bottom edge sits at
/// `panel_bottom` in a viewport `viewport_height` tall
pub fn anchor_from_panel(panel_bottom: f32, viewport_height: f32) -> f32 {
    if viewport_height <= 0.0 {
        return -2.5;
    }
    (panel_bottom / viewport_height) * 5.0 - 2.5
}

pub struct ParticleField {
    config: ParticleConfig,
    particles: Vec<Particle>,
    anchor_y: f32,
    rng: StdRng,
}

impl ParticleField {
    pub fn new(config: ParticleConfig, anchor_y: f32) -> Self {
        Self::with_rng(config, anchor_y, StdRng::from_entropy())
    }

    pub fn with_rng(config: ParticleConfig, anchor_y: f32, rng: StdRng) -> Self {
        let mut field = Self {
            particles: Vec::with_capacity(config.count),
            anchor_y: anchor_y.min(config.ceiling),
            config,
            rng,
        };

        for _ in 0..field.config.count {
            let velocity = field.config.min_velocity + field.rng.gen::<f32>() * field.config.velocity_jitter;
            let hue = field.rng.gen::<f32>();
            let position = field.spawn_position();
            field.particles.push(Particle {
                position,
                velocity,
                color: Hsva::new(hue, 1.0, 1.0, 1.0).into(),
            });
        }

        field
    }

    fn spawn_position(&mut self) -> [f32; 3] {
        let x = (self.rng.gen::<f32>() - 0.5) * self.config.spread_x;
        let z = (self.rng.gen::<f32>() - 0.5) * self.config.spread_z;
        [x, self.anchor_y, z]
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn anchor_y(&self) -> f32 {
        self.anchor_y
    }

    /// Move the respawn line, e.g. after the chat panel was laid out
    pub fn set_anchor(&mut self, anchor_y: f32) {
        self.anchor_y = anchor_y.min(self.config.ceiling);
    }

    /// Advance one frame
    ///
    /// `amplitude` is the current mean spectrum byte (0..=255) and `time_secs`
    /// wall-clock seconds, used for the sideways drift.
    pub fn advance(&mut self, amplitude: f32, time_secs: f64) {
        let scale = self.config.amplitude_scale;
        let amp = if scale.is_finite() && scale > 0.0 {
            amplitude.max(0.0) / scale
        } else {
            0.0
        };
        let boost = 1.0 + amp * 4.0;
        let drift = self.config.drift;
        let ceiling = self.config.ceiling;

        for i in 0..self.particles.len() {
            // Per-particle phase keeps neighbours from drifting in lockstep
            let phase = time_secs + (i * 3) as f64;
            let particle = &mut self.particles[i];
            particle.position[1] += particle.velocity * boost;
            particle.position[0] += phase.sin() as f32 * drift;
            particle.position[2] += phase.cos() as f32 * drift;

            if particle.position[1] > ceiling {
                let position = self.spawn_position();
                self.particles[i].position = position;
            }
        }
    }
}
