pub mod particles;

pub use particles::{anchor_from_panel, Particle, ParticleConfig, ParticleField};
