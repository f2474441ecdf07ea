//! Zentrale Konfiguration für Pfad-Sampling, Ribbon-Mesh und Boden-Abfragen.
//!
//! `PathOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use serde::{Deserialize, Serialize};

use crate::core::ground::{GroundProbe, SurfaceFilter};

// ── Sampling ────────────────────────────────────────────────────────

/// Standard-Abstand zwischen zwei Spaced Points (Welteinheiten).
pub const DEFAULT_SPACING: f32 = 1.0;
/// Kleinster erlaubter Abstand; kleinere Werte werden hochgeklemmt.
pub const MIN_SPACING: f32 = 0.1;
/// Standard-Auflösung der Segment-Unterteilung.
pub const DEFAULT_RESOLUTION: f32 = 1.0;
/// Kleinste erlaubte Auflösung.
pub const MIN_RESOLUTION: f32 = 1.0;
/// Unterteilungen pro Einheit geschätzter Segmentlänge (bei Auflösung 1).
pub const SUBDIVISIONS_PER_UNIT: f32 = 10.0;

// ── Ribbon-Mesh ─────────────────────────────────────────────────────

/// Standard-Breite des Ribbon-Meshes in Welteinheiten.
pub const DEFAULT_RIBBON_WIDTH: f32 = 2.0;
/// Standard-Texturwiederholung entlang des Pfads.
pub const DEFAULT_TILING: f32 = 1.0;
/// Skalierung der V-Koordinate pro Pfadlänge (Punkte × Abstand).
pub const UV_LENGTH_SCALE: f32 = 0.05;

// ── Pfad ────────────────────────────────────────────────────────────

/// Halbe Ausdehnung des Standard-Segments um den Ursprung.
pub const DEFAULT_SEGMENT_HALF_EXTENT: f32 = 1.0;
/// Mindestanzahl Segmente, damit auf offenem Pfad gelöscht werden darf.
pub const MIN_SEGMENTS_FOR_REMOVAL_OPEN: usize = 2;
/// Mindestanzahl Segmente, damit auf geschlossenem Pfad gelöscht werden darf.
pub const MIN_SEGMENTS_FOR_REMOVAL_LOOPED: usize = 3;

// ── Boden ───────────────────────────────────────────────────────────

/// Maximale Strahllänge der Boden-Abfrage (nach oben und unten).
pub const GROUND_PROBE_DISTANCE: f32 = 1000.0;

/// Alle zur Laufzeit änderbaren Pfad-Optionen.
/// Wird vom Host als TOML-Datei gespeichert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathOptions {
    // ── Sampling ────────────────────────────────────────────────
    /// Abstand zwischen Spaced Points
    pub spacing: f32,
    /// Auflösung der Segment-Unterteilung
    pub resolution: f32,

    // ── Ribbon ──────────────────────────────────────────────────
    /// Breite des Ribbon-Meshes
    pub ribbon_width: f32,
    /// Texturwiederholung entlang des Pfads
    pub tiling: f32,

    // ── Pfad ────────────────────────────────────────────────────
    /// Neue Pfade mit automatischen Tangenten anlegen
    #[serde(default)]
    pub auto_tangent: bool,
    /// Halbe Ausdehnung des Standard-Segments
    #[serde(default = "default_segment_half_extent")]
    pub segment_half_extent: f32,

    // ── Boden ───────────────────────────────────────────────────
    /// Strahllänge der Boden-Abfrage
    #[serde(default = "default_ground_probe_distance")]
    pub ground_probe_distance: f32,
    /// Bitmaske der Oberflächen, die von der Boden-Abfrage getroffen werden
    #[serde(default = "default_ground_layer_mask")]
    pub ground_layer_mask: u32,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_SPACING,
            resolution: DEFAULT_RESOLUTION,
            ribbon_width: DEFAULT_RIBBON_WIDTH,
            tiling: DEFAULT_TILING,
            auto_tangent: false,
            segment_half_extent: DEFAULT_SEGMENT_HALF_EXTENT,
            ground_probe_distance: GROUND_PROBE_DISTANCE,
            ground_layer_mask: SurfaceFilter::ALL.0,
        }
    }
}

/// Serde-Default für `segment_half_extent` (Abwärtskompatibilität bestehender TOML-Dateien).
fn default_segment_half_extent() -> f32 {
    DEFAULT_SEGMENT_HALF_EXTENT
}

/// Serde-Default für `ground_probe_distance`.
fn default_ground_probe_distance() -> f32 {
    GROUND_PROBE_DISTANCE
}

/// Serde-Default für `ground_layer_mask`.
fn default_ground_layer_mask() -> u32 {
    SurfaceFilter::ALL.0
}

impl PathOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Pfad-Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Pfad-Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Boden-Abfrage-Parameter für `BezierPath::with_ground`.
    pub fn ground_probe(&self) -> GroundProbe {
        GroundProbe {
            max_distance: self.ground_probe_distance,
            filter: SurfaceFilter(self.ground_layer_mask),
        }
    }
}
