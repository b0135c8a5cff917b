//! Particle canvas
//!
//! Paints a `ParticleField` with a perspective camera on the z axis looking
//! at the origin.

use crate::visual::ParticleField;
use egui::{Pos2, Rect};

const CAMERA_Z: f32 = 10.0;
const FOV_Y_DEGREES: f32 = 50.0;

/// Screen position and radius of a world-space point, `None` behind the camera
pub fn project(position: [f32; 3], point_size: f32, rect: Rect) -> Option<(Pos2, f32)> {
    let depth = CAMERA_Z - position[2];
    if depth <= 0.0 || rect.height() <= 0.0 {
        return None;
    }

    let half_extent = depth * (FOV_Y_DEGREES.to_radians() / 2.0).tan();
    let aspect = rect.width() / rect.height();
    let ndc_x = position[0] / (half_extent * aspect);
    let ndc_y = position[1] / half_extent;

    let center = rect.center();
    let screen = Pos2::new(
        center.x + ndc_x * rect.width() / 2.0,
        center.y - ndc_y * rect.height() / 2.0,
    );
    let radius = (point_size / half_extent * rect.height() / 4.0).max(0.5);

    Some((screen, radius))
}

pub struct ParticleCanvas<'a> {
    field: &'a ParticleField,
}

impl<'a> ParticleCanvas<'a> {
    pub fn new(field: &'a ParticleField) -> Self {
        Self { field }
    }

    pub fn paint(self, painter: &egui::Painter, rect: Rect) {
        let config = self.field.config();

        for particle in self.field.iter() {
            if let Some((pos, radius)) = project(particle.position, config.point_size, rect) {
                if rect.expand(radius).contains(pos) {
                    painter.circle_filled(pos, radius, particle.color.gamma_multiply(config.opacity));
                }
            }
        }
    }
}
