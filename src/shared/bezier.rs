//! Reine Bezier-Auswertung (linear, quadratisch, kubisch) nach De Casteljau.
//!
//! Layer-neutral und zustandslos: wird von `core::resample`, `core::bezier_path`
//! und den Tests gleichermaßen genutzt. `t` wird nicht geklemmt, Aufrufer
//! klemmen bei Bedarf selbst.

use glam::Vec3;

/// Lineare Interpolation zwischen `a` und `b`.
#[inline]
pub fn linear(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a.lerp(b, t)
}

/// Quadratische Bezier-Kurve über drei Punkte.
#[inline]
pub fn quadratic(a: Vec3, b: Vec3, c: Vec3, t: f32) -> Vec3 {
    linear(a, b, t).lerp(linear(b, c, t), t)
}

/// Kubische Bezier-Kurve über vier Punkte (Anker, Kontrolle, Kontrolle, Anker).
#[inline]
pub fn cubic(a: Vec3, b: Vec3, c: Vec3, d: Vec3, t: f32) -> Vec3 {
    quadratic(a, b, c, t).lerp(quadratic(b, c, d, t), t)
}

/// Kubische Kurve für ein Segment-Fenster `[a0, c1, c2, a3]`.
#[inline]
pub fn cubic_segment(points: &[Vec3; 4], t: f32) -> Vec3 {
    cubic(points[0], points[1], points[2], points[3], t)
}

/// Approximierte Länge einer Polyline.
pub fn polyline_length(points: &[Vec3]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Kürzeste Distanz von `point` zur Strecke `a`–`b`.
pub fn distance_to_line_segment(point: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}
