//! Schnittstelle zur Boden-Abfrage des Hosts (Raycast gegen Oberflächen).
//!
//! Der Pfad fragt pro Anker einmal nach oben und einmal nach unten und
//! übernimmt die Normale des näheren Treffers. Ohne Treffer gilt `Vec3::Y`.

use glam::Vec3;

/// Bitmaske der Oberflächen, die eine Boden-Abfrage treffen darf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceFilter(pub u32);

impl SurfaceFilter {
    /// Trifft alle Oberflächen.
    pub const ALL: Self = Self(u32::MAX);
    /// Trifft keine Oberfläche.
    pub const NONE: Self = Self(0);

    /// Prüft, ob eine Oberfläche der Ebene `layer` (0..32) getroffen werden darf.
    pub fn accepts(self, layer: u32) -> bool {
        layer < 32 && self.0 & (1 << layer) != 0
    }
}

impl Default for SurfaceFilter {
    fn default() -> Self {
        Self::ALL
    }
}

/// Treffer einer Boden-Abfrage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    /// Distanz vom Strahlursprung zum Treffer
    pub distance: f32,
    /// Oberflächennormale am Trefferpunkt (normalisiert)
    pub normal: Vec3,
}

/// Vom Host bereitgestellte Boden-/Oberflächenabfrage.
///
/// Blockierender Aufruf; wird nur bei veraltetem Normalen-Cache oder beim
/// Verschieben eines einzelnen Ankers ausgeführt.
pub trait GroundQuery: Send + Sync {
    /// Schießt einen Strahl von `origin` in `direction` (normalisiert) und
    /// liefert den ersten Treffer innerhalb von `max_distance`.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: SurfaceFilter,
    ) -> Option<GroundHit>;
}

/// Parameter, mit denen der Pfad den Boden abfragt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundProbe {
    /// Strahllänge in beide Richtungen
    pub max_distance: f32,
    /// Oberflächenfilter
    pub filter: SurfaceFilter,
}

impl Default for GroundProbe {
    fn default() -> Self {
        Self {
            max_distance: crate::shared::options::GROUND_PROBE_DISTANCE,
            filter: SurfaceFilter::ALL,
        }
    }
}

/// Ermittelt die Bodennormale an `point`.
///
/// Fragt nach oben und unten; der nähere Treffer gewinnt, ohne Treffer
/// wird `Vec3::Y` zurückgegeben.
pub fn ground_normal(ground: &dyn GroundQuery, point: Vec3, probe: GroundProbe) -> Vec3 {
    let up = ground.raycast(point, Vec3::Y, probe.max_distance, probe.filter);
    let down = ground.raycast(point, Vec3::NEG_Y, probe.max_distance, probe.filter);

    let nearest = match (up, down) {
        (Some(u), Some(d)) => Some(if u.distance < d.distance { u } else { d }),
        (hit @ Some(_), None) | (None, hit @ Some(_)) => hit,
        (None, None) => None,
    };

    nearest
        .map(|hit| hit.normal.normalize_or(Vec3::Y))
        .unwrap_or(Vec3::Y)
}

/// Boden ohne jede Oberfläche: Abfragen treffen nie.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGround;

impl GroundQuery for NoGround {
    fn raycast(&self, _: Vec3, _: Vec3, _: f32, _: SurfaceFilter) -> Option<GroundHit> {
        None
    }
}

/// Unendliche Ebene durch `point` mit Normale `normal` auf Oberflächenebene `layer`.
#[derive(Debug, Clone, Copy)]
pub struct PlaneGround {
    /// Ein Punkt auf der Ebene
    pub point: Vec3,
    /// Ebenennormale (normalisiert)
    pub normal: Vec3,
    /// Oberflächenebene für den `SurfaceFilter`
    pub layer: u32,
}

impl PlaneGround {
    /// Horizontale Ebene auf Höhe `height`.
    pub fn horizontal(height: f32) -> Self {
        Self {
            point: Vec3::new(0.0, height, 0.0),
            normal: Vec3::Y,
            layer: 0,
        }
    }

    /// Ebene durch `point` mit beliebiger Normale.
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.normalize_or(Vec3::Y),
            layer: 0,
        }
    }
}

impl GroundQuery for PlaneGround {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: SurfaceFilter,
    ) -> Option<GroundHit> {
        if !filter.accepts(self.layer) {
            return None;
        }
        let denom = self.normal.dot(direction);
        if denom.abs() < f32::EPSILON {
            return None;
        }
        let distance = self.normal.dot(self.point - origin) / denom;
        if !(0.0..=max_distance).contains(&distance) {
            return None;
        }
        Some(GroundHit {
            distance,
            normal: self.normal,
        })
    }
}
