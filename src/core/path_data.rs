//! Versioniertes Persistenz-Schema eines Pfads.
//!
//! Das Modell serialisiert sich nicht selbst; ein Aufrufer wandelt über
//! [`BezierPath::to_data`] / [`BezierPath::from_data`] und speichert das
//! Ergebnis im Format seiner Wahl (serde).

use anyhow::{bail, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::BezierPath;

/// Aktuelle Schema-Version.
pub const PATH_DATA_VERSION: u32 = 1;

fn default_version() -> u32 {
    PATH_DATA_VERSION
}

/// Serialisierbarer Zustand eines Pfads (ohne Normalen-Cache und Boden-Anbindung).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathData {
    /// Schema-Version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Anker und Kontrollpunkte in Pfadreihenfolge
    pub points: Vec<Vec3>,
    /// Geschlossene Topologie
    #[serde(default)]
    pub looped: bool,
    /// Automatische Tangenten
    #[serde(default)]
    pub auto_tangent: bool,
    /// Deaktivierte Segmente (aufsteigend)
    #[serde(default)]
    pub disabled_segments: Vec<usize>,
}

impl BezierPath {
    /// Erfasst den persistenten Zustand.
    pub fn to_data(&self) -> PathData {
        PathData {
            version: PATH_DATA_VERSION,
            points: self.points().to_vec(),
            looped: self.is_looped(),
            auto_tangent: self.is_auto_tangent(),
            disabled_segments: self.disabled_segments().collect(),
        }
    }

    /// Stellt einen Pfad aus gespeicherten Daten wieder her.
    ///
    /// Die Punkte werden unverändert übernommen; bei aktiven Auto-Tangenten
    /// werden die Kontrollpunkte anschließend neu gelöst. Deaktivierte
    /// Segmente außerhalb des Pfads werden verworfen.
    pub fn from_data(data: PathData) -> Result<Self> {
        if data.version != PATH_DATA_VERSION {
            bail!(
                "Unbekannte Pfad-Version {} (erwartet {})",
                data.version,
                PATH_DATA_VERSION
            );
        }

        let mut path = Self::from_points(data.points, data.looped)?;
        path.set_auto_tangent(data.auto_tangent);

        let segment_count = path.segment_count();
        for segment in data.disabled_segments {
            if segment < segment_count {
                path.disable_segment(segment);
            } else {
                log::warn!(
                    "Deaktiviertes Segment {} verworfen: Pfad hat {} Segmente",
                    segment,
                    segment_count
                );
            }
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_path() -> BezierPath {
        let mut path = BezierPath::empty();
        path.add_segment(Vec3::ZERO);
        path.add_segment(Vec3::new(10.0, 0.0, 0.0));
        path.add_segment(Vec3::new(10.0, 2.0, 10.0));
        path.set_point(2, Vec3::new(8.0, 0.0, -2.0));
        path.disable_segment(1);
        path
    }

    #[test]
    fn test_json_roundtrip_restores_path() {
        let path = sample_path();
        let json = serde_json::to_string(&path.to_data()).expect("Serialisierung");
        let data: PathData = serde_json::from_str(&json).expect("Deserialisierung");
        let restored = BezierPath::from_data(data).expect("gültige Daten");

        assert_eq!(restored.points(), path.points());
        assert_eq!(restored.is_looped(), path.is_looped());
        assert!(restored.is_segment_disabled(1));
        assert!(!restored.is_segment_disabled(0));
        assert_eq!(restored.anchor_normals().len(), restored.anchor_count());
    }

    #[test]
    fn test_wrong_version_is_rejected() {
        let mut data = sample_path().to_data();
        data.version = 99;
        assert!(BezierPath::from_data(data).is_err());
    }

    #[test]
    fn test_invalid_point_count_is_rejected() {
        let mut data = sample_path().to_data();
        data.points.pop();
        assert!(BezierPath::from_data(data).is_err());
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = r#"{ "points": [[0,0,0],[1,0,0],[2,0,0],[3,0,0]] }"#;
        let data: PathData = serde_json::from_str(json).expect("Deserialisierung");
        assert_eq!(data.version, PATH_DATA_VERSION);
        assert!(!data.looped);
        assert!(data.disabled_segments.is_empty());

        let path = BezierPath::from_data(data).expect("gültige Daten");
        assert_eq!(path.segment_count(), 1);
    }

    #[test]
    fn test_out_of_range_disabled_segment_is_dropped() {
        let mut data = sample_path().to_data();
        data.disabled_segments.push(17);
        let path = BezierPath::from_data(data).expect("gültige Daten");
        assert_eq!(path.disabled_segments().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_auto_tangent_flag_resolves_controls() {
        let mut data = sample_path().to_data();
        data.auto_tangent = true;
        let path = BezierPath::from_data(data).expect("gültige Daten");

        assert!(path.is_auto_tangent());
        let anchor = path.anchor_point(1);
        let before = path[2] - anchor;
        let after = path[4] - anchor;
        assert!(before.cross(after).length() < 1e-4);
    }
}
