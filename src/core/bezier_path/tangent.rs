//! Automatische Tangenten: Kontrollpunkte aus den Nachbarankern ableiten.
//!
//! Richtung am Anker `a`: `normalize(normalize(prev - a) - normalize(next - a))`.
//! Jeder Kontrollpunkt liegt auf dieser Geraden im halben Abstand zum
//! jeweiligen Nachbaranker. Fehlende Nachbarn (offenes Pfadende) entfallen.

use glam::Vec3;

use super::BezierPath;

impl BezierPath {
    /// Löst alle Anker neu und korrigiert danach die offenen Enden.
    pub fn recalculate_all(&mut self) {
        if !self.is_valid() {
            return;
        }
        for anchor in (0..self.points.len()).step_by(3) {
            self.solve_anchor_controls(anchor);
        }
        self.fix_open_ends();
    }

    /// Löst Anker `anchor_index` und seine beiden Nachbaranker neu.
    pub fn recalculate_around(&mut self, anchor_index: usize) {
        if !self.is_valid() {
            return;
        }
        let count = self.points.len() as isize;
        let center = (anchor_index * 3) as isize;
        for i in [center - 3, center, center + 3] {
            if (0..count).contains(&i) || self.looped {
                let anchor = self.loop_index(i);
                self.solve_anchor_controls(anchor);
            }
        }
        self.fix_open_ends();
    }

    /// Setzt die zwei Kontrollpunkte des Ankers am Punktindex `anchor`.
    pub(super) fn solve_anchor_controls(&mut self, anchor: usize) {
        let count = self.points.len() as isize;
        let a = anchor as isize;
        let anchor_pos = self.points[anchor];

        let mut direction = Vec3::ZERO;
        // [vorheriger Nachbar, nächster Nachbar]; nächster mit negativem Vorzeichen
        let mut distances = [0.0f32; 2];

        if a - 3 >= 0 || self.looped {
            let offset = self.points[self.loop_index(a - 3)] - anchor_pos;
            direction += offset.normalize_or_zero();
            distances[0] = offset.length();
        }
        if a + 3 < count || self.looped {
            let offset = self.points[self.loop_index(a + 3)] - anchor_pos;
            direction -= offset.normalize_or_zero();
            distances[1] = -offset.length();
        }

        let direction = direction.normalize_or_zero();
        for (side, distance) in distances.into_iter().enumerate() {
            let control = a + side as isize * 2 - 1;
            if (0..count).contains(&control) || self.looped {
                let index = self.loop_index(control);
                self.points[index] = anchor_pos + direction * distance * 0.5;
            }
        }
    }

    /// Offene Enden: erster/letzter Kontrollpunkt mittig zwischen Endanker und Nachbarkontrolle.
    pub(super) fn fix_open_ends(&mut self) {
        if self.looped || self.points.len() < 4 {
            return;
        }
        let n = self.points.len();
        self.points[1] = (self.points[0] + self.points[2]) * 0.5;
        self.points[n - 2] = (self.points[n - 1] + self.points[n - 3]) * 0.5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_anchor_path() -> BezierPath {
        let mut path = BezierPath::empty();
        path.add_segment(Vec3::ZERO);
        path.add_segment(Vec3::new(10.0, 0.0, 0.0));
        path.add_segment(Vec3::new(10.0, 0.0, 10.0));
        path
    }

    #[test]
    fn test_collinear_anchors_get_controls_on_line() {
        let mut path = BezierPath::empty();
        path.add_segment(Vec3::ZERO);
        path.add_segment(Vec3::new(10.0, 0.0, 0.0));
        path.add_segment(Vec3::new(30.0, 0.0, 0.0));
        path.set_auto_tangent(true);

        // Mittlerer Anker bei x=10: Kontrollen im halben Nachbarabstand
        assert!(path.point(2).abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-5));
        assert!(path.point(4).abs_diff_eq(Vec3::new(20.0, 0.0, 0.0), 1e-5));
        // Offene Enden: Mittelpunkt zwischen Endanker und Nachbarkontrolle
        assert!(path.point(1).abs_diff_eq(Vec3::new(2.5, 0.0, 0.0), 1e-5));
        assert!(path.point(5).abs_diff_eq(Vec3::new(25.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_corner_tangent_bisects_angle() {
        let mut path = three_anchor_path();
        path.set_auto_tangent(true);

        let anchor = path.point(3);
        let before = path.point(2) - anchor;
        let after = path.point(4) - anchor;

        // Kollinear durch den Anker, entgegengesetzt
        assert!(before.cross(after).length() < 1e-4);
        assert!(before.dot(after) < 0.0);
        // Richtung (-1, 0, -1)/√2 und halbe Nachbarabstände
        let dir = Vec3::new(-1.0, 0.0, -1.0).normalize();
        assert!(before.normalize().abs_diff_eq(dir, 1e-5));
        assert!((before.length() - 5.0).abs() < 1e-4);
        assert!((after.length() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_recalculate_around_only_touches_neighbourhood() {
        let mut path = BezierPath::empty();
        for x in [0.0, 10.0, 20.0, 30.0, 40.0, 50.0] {
            path.add_segment(Vec3::new(x, 0.0, 0.0));
        }
        let untouched = path.point(13);
        path.points[6] = Vec3::new(20.0, 0.0, 5.0);
        path.recalculate_around(1);

        // Nur Anker 0..=2 werden gelöst, Anker 4 bleibt unberührt
        assert_eq!(path.point(13), untouched);
        assert_ne!(path.point(5), Vec3::new(15.0, 0.0, 0.0));
    }

    #[test]
    fn test_looped_solves_across_wrap() {
        let mut path = three_anchor_path();
        assert!(path.set_looped(true));
        path.set_auto_tangent(true);

        let anchor = path.point(0);
        let before = path.point(path.point_count() - 1) - anchor;
        let after = path.point(1) - anchor;
        assert!(before.cross(after).length() < 1e-4);
        assert!(before.dot(after) < 0.0);
    }

    #[test]
    fn test_fix_open_ends_skipped_when_looped() {
        let mut path = three_anchor_path();
        path.set_looped(true);
        let before = path.points.clone();
        path.fix_open_ends();
        assert_eq!(path.points, before);
    }
}
