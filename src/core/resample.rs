//! Arc-Length-Resampling: gleichmäßig verteilte Punkte entlang des Pfads.
//!
//! Jedes Segment wird in feste Schritte unterteilt; die seit dem letzten
//! Ausgabepunkt zurückgelegte Distanz wird aufsummiert und beim Erreichen des
//! Abstands um den Überschuss zurückkorrigiert.

use glam::Vec3;

use super::BezierPath;
use crate::shared::bezier::cubic_segment;
use crate::shared::options::{MIN_RESOLUTION, MIN_SPACING, SUBDIVISIONS_PER_UNIT};

/// Relative Toleranz (Anteil des Abstands), mit der ein Ausgabepunkt als erreicht gilt.
///
/// Fängt f32-Rundung in der aufsummierten Distanz ab, sonst fehlt z.B. der
/// Endpunkt einer exakt teilbaren Geraden.
const SPACING_TOLERANCE: f32 = 1e-3;

/// Ein gleichmäßig verteilter Punkt samt Orientierung.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpacedPoint {
    /// Weltposition
    pub position: Vec3,
    /// Interpolierte Ankernormale
    pub normal: Vec3,
    /// Segment, in dem der Punkt ausgegeben wurde
    pub segment: usize,
    /// Lokaler Kurvenparameter im Segment
    pub t: f32,
}

impl BezierPath {
    /// Günstige Längenschätzung eines Segments: Sehne plus halbes Kontrollpolygon.
    pub fn estimated_segment_length(&self, segment_index: usize) -> f32 {
        let Some([a0, c1, c2, a3]) = self.segment_points(segment_index) else {
            return 0.0;
        };
        let control_net = a0.distance(c1) + c1.distance(c2) + c2.distance(a3);
        a0.distance(a3) + control_net * 0.5
    }

    /// Punkte im Abstand `spacing` entlang des Pfads, mit interpolierten Normalen.
    ///
    /// `spacing` wird auf mindestens 0.1, `resolution` auf mindestens 1 geklemmt.
    /// Der erste Anker wird immer ausgegeben; Punkte auf deaktivierten Segmenten
    /// werden übersprungen, zählen aber für die Distanz weiter.
    pub fn spaced_points(&self, spacing: f32, resolution: f32) -> Vec<SpacedPoint> {
        if self.point_count() == 0 {
            return Vec::new();
        }
        let spacing = spacing.max(MIN_SPACING);
        let resolution = resolution.max(MIN_RESOLUTION);
        let threshold = spacing * (1.0 - SPACING_TOLERANCE);
        let anchor_count = self.anchor_count();

        let first = self.point(0);
        let mut result = vec![SpacedPoint {
            position: first,
            normal: self.anchor_normal(0),
            segment: 0,
            t: 0.0,
        }];
        let mut previous = first;
        let mut distance_since_last = 0.0f32;

        for segment in 0..self.segment_count() {
            let Some(window) = self.segment_points(segment) else {
                continue;
            };
            let disabled = self.is_segment_disabled(segment);
            let normal_start = self.anchor_normal(segment);
            let normal_end = self.anchor_normal((segment + 1) % anchor_count);

            let divisions = (self.estimated_segment_length(segment)
                * resolution
                * SUBDIVISIONS_PER_UNIT)
                .ceil()
                .max(1.0) as usize;
            log::trace!("Segment {}: {} Unterteilungen", segment, divisions);

            for step in 1..=divisions {
                let t = step as f32 / divisions as f32;
                let on_curve = cubic_segment(&window, t);
                distance_since_last += previous.distance(on_curve);

                while distance_since_last >= threshold {
                    let overshoot = (distance_since_last - spacing).max(0.0);
                    let corrected =
                        on_curve + (previous - on_curve).normalize_or_zero() * overshoot;
                    if !disabled {
                        result.push(SpacedPoint {
                            position: corrected,
                            normal: normal_start.lerp(normal_end, t).normalize_or(Vec3::Y),
                            segment,
                            t,
                        });
                    }
                    distance_since_last = overshoot;
                    previous = corrected;
                }
                previous = on_curve;
            }
        }

        result
    }
}

/// Nur die Positionen einer Spaced-Point-Liste.
pub fn positions(points: &[SpacedPoint]) -> Vec<Vec3> {
    points.iter().map(|p| p.position).collect()
}
