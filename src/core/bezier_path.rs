//! Der stückweise kubische Bezier-Pfad: Punktpuffer, Topologie und Mutationen.
//!
//! Punktlayout: jeder dritte Punkt (`i % 3 == 0`) ist ein Anker, die zwei
//! Punkte dazwischen sind seine Kontrollpunkte. Segment `i` ist das Fenster
//! `[3i, 3i+1, 3i+2, 3i+3]`; auf geschlossenen Pfaden wird der letzte Index
//! über [`loop_index`] umgebrochen.
//!
//! Offen: `3n + 1` Punkte für `n` Segmente. Geschlossen: `3n` Punkte.

mod tangent;

use std::cmp::Ordering;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use anyhow::{bail, Result};
use glam::Vec3;
use indexmap::IndexSet;

use super::ground::{ground_normal, GroundProbe, GroundQuery, NoGround};
use crate::shared::bezier::{cubic_segment, distance_to_line_segment};
use crate::shared::options::{
    PathOptions, DEFAULT_SEGMENT_HALF_EXTENT, MIN_SEGMENTS_FOR_REMOVAL_LOOPED,
    MIN_SEGMENTS_FOR_REMOVAL_OPEN,
};

/// Abtastpunkte pro Segment für die Distanzabfrage in `closest_segment`.
const SEGMENT_PICK_SAMPLES: usize = 32;

/// Bricht einen (auch negativen) Index in `[0, count)` um.
///
/// Einzige Stelle, an der sich geschlossene und offene Topologie
/// unterscheiden: Aufrufer prüfen die Existenz eines Nachbarn auf offenen
/// Pfaden selbst und lassen den Index nur hier umbrechen.
pub fn loop_index(index: isize, count: usize) -> usize {
    debug_assert!(count > 0, "loop_index auf leerem Punktpuffer");
    index.rem_euclid(count as isize) as usize
}

/// Stückweise kubischer Bezier-Pfad mit optionalen Auto-Tangenten.
#[derive(Clone)]
pub struct BezierPath {
    /// Anker und Kontrollpunkte in Pfadreihenfolge
    points: Vec<Vec3>,
    /// Geschlossene Topologie
    looped: bool,
    /// Kontrollpunkte werden aus den Nachbarankern berechnet
    auto_tangent: bool,
    /// Vom Sampling/Meshing ausgeschlossene Segmente
    disabled_segments: IndexSet<usize>,
    /// Eine Bodennormale pro Anker
    anchor_normals: Vec<Vec3>,
    /// Punktanzahl beim letzten Normalen-Refresh (`None` = nie berechnet)
    normals_point_count: Option<usize>,
    /// Boden-Abfrage des Hosts
    ground: Arc<dyn GroundQuery>,
    /// Strahllänge und Filter der Boden-Abfrage
    probe: GroundProbe,
}

impl BezierPath {
    /// Erstellt einen leeren Pfad ohne Punkte.
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            looped: false,
            auto_tangent: false,
            disabled_segments: IndexSet::new(),
            anchor_normals: Vec::new(),
            normals_point_count: None,
            ground: Arc::new(NoGround),
            probe: GroundProbe::default(),
        }
    }

    /// Erstellt einen Pfad mit einem Standard-Segment zentriert um `origin`.
    pub fn new(origin: Vec3) -> Self {
        Self::with_half_extent(origin, DEFAULT_SEGMENT_HALF_EXTENT)
    }

    /// Standard-Segment entlang X mit S-förmigen Kontrollpunkten in der XZ-Ebene.
    pub fn with_half_extent(origin: Vec3, half_extent: f32) -> Self {
        let left = Vec3::NEG_X * half_extent;
        let right = Vec3::X * half_extent;
        let forward = Vec3::Z * half_extent;

        let mut path = Self::empty();
        path.points = vec![
            origin + left,
            origin + (left + forward) * 0.5,
            origin + (right - forward) * 0.5,
            origin + right,
        ];
        path.refresh_anchor_normals();
        path
    }

    /// Erstellt den Standard-Pfad gemäß `options` (Ausdehnung, Auto-Tangenten, Boden-Filter).
    pub fn from_options(origin: Vec3, options: &PathOptions) -> Self {
        let mut path = Self::with_half_extent(origin, options.segment_half_extent);
        path.probe = options.ground_probe();
        path.set_auto_tangent(options.auto_tangent);
        path.refresh_anchor_normals();
        path
    }

    /// Übernimmt einen fertigen Punktpuffer (manuelle Tangenten).
    ///
    /// Offene Pfade brauchen `3n + 1` Punkte, geschlossene `3n` mit `n >= 2`.
    pub fn from_points(points: Vec<Vec3>, looped: bool) -> Result<Self> {
        let len = points.len();
        if looped {
            if len % 3 != 0 || len < 6 {
                bail!("Geschlossener Pfad braucht 3n Punkte (n >= 2), erhalten {len}");
            }
        } else if len > 1 && len % 3 != 1 {
            bail!("Offener Pfad braucht 3n + 1 Punkte, erhalten {len}");
        }

        let mut path = Self::empty();
        path.points = points;
        path.looped = looped;
        path.refresh_anchor_normals();
        Ok(path)
    }

    /// Setzt die Boden-Abfrage und berechnet alle Ankernormalen neu.
    pub fn with_ground(mut self, ground: Arc<dyn GroundQuery>, probe: GroundProbe) -> Self {
        self.ground = ground;
        self.probe = probe;
        self.refresh_anchor_normals();
        self
    }

    // ── Zählung & Topologie ─────────────────────────────────────────

    /// Ein Pfad ist gültig, sobald er mindestens ein Segment besitzt.
    pub fn is_valid(&self) -> bool {
        self.segment_count() >= 1
    }

    /// Anzahl aller Punkte (Anker + Kontrollpunkte).
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Anzahl der kubischen Segmente.
    pub fn segment_count(&self) -> usize {
        self.points.len() / 3
    }

    /// Anzahl der Anker.
    pub fn anchor_count(&self) -> usize {
        match (self.points.len(), self.looped) {
            (0, _) => 0,
            (n, true) => n / 3,
            (n, false) => n / 3 + 1,
        }
    }

    /// Gibt `true` zurück, wenn der Punktindex ein Anker ist.
    pub fn is_anchor_point(index: usize) -> bool {
        index % 3 == 0
    }

    /// Bricht einen Punktindex in `[0, point_count())` um.
    pub fn loop_index(&self, index: isize) -> usize {
        loop_index(index, self.points.len())
    }

    /// Geschlossene Topologie?
    pub fn is_looped(&self) -> bool {
        self.looped
    }

    /// Automatische Tangenten aktiv?
    pub fn is_auto_tangent(&self) -> bool {
        self.auto_tangent
    }

    /// Read-only Zugriff auf den Punktpuffer.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    // ── Punktzugriff ────────────────────────────────────────────────

    /// Die 4 Punkte von Segment `index`; `None` ohne Segmente oder außerhalb.
    pub fn segment_points(&self, index: usize) -> Option<[Vec3; 4]> {
        if index >= self.segment_count() {
            return None;
        }
        let base = index * 3;
        Some([
            self.points[base],
            self.points[base + 1],
            self.points[base + 2],
            self.points[self.loop_index(base as isize + 3)],
        ])
    }

    /// Roher Punkt am Index. Panikt außerhalb des Puffers.
    pub fn point(&self, index: usize) -> Vec3 {
        self.points[index]
    }

    /// Setzt einen Punkt wie ein Editor-Handle.
    ///
    /// - Anker: delegiert an [`Self::set_anchor`].
    /// - Kontrollpunkt mit Auto-Tangenten: abgelehnt (`false`).
    /// - Kontrollpunkt manuell: gesetzt, der gegenüberliegende Kontrollpunkt
    ///   wird kollinear gespiegelt und behält seinen Abstand zum Anker.
    pub fn set_point(&mut self, index: usize, value: Vec3) -> bool {
        if Self::is_anchor_point(index) {
            self.set_anchor(index / 3, value);
            return true;
        }
        if self.auto_tangent {
            log::trace!("Kontrollpunkt {} ignoriert: Auto-Tangenten aktiv", index);
            return false;
        }

        self.points[index] = value;
        self.mirror_control(index);
        true
    }

    /// Spiegelt den Kontrollpunkt auf der anderen Seite des nächsten Ankers.
    fn mirror_control(&mut self, moved: usize) {
        let count = self.points.len() as isize;
        let i = moved as isize;
        let (mirrored, anchor) = if (moved + 1) % 3 == 0 {
            (i + 2, i + 1)
        } else {
            (i - 2, i - 1)
        };
        if !self.looped && !(0..count).contains(&mirrored) {
            return;
        }

        let anchor = self.loop_index(anchor);
        let mirrored = self.loop_index(mirrored);
        let anchor_pos = self.points[anchor];
        let distance = anchor_pos.distance(self.points[mirrored]);
        let direction = (anchor_pos - self.points[moved]).normalize_or_zero();
        self.points[mirrored] = anchor_pos + direction * distance;
    }

    /// Verschiebt Anker `anchor_index` (Punkt `anchor_index * 3`, umgebrochen).
    ///
    /// Manuell werden die angrenzenden Kontrollpunkte starr mitverschoben,
    /// mit Auto-Tangenten werden Anker und Nachbarn neu gelöst. Auf offenen
    /// Pfaden muss `anchor_index < anchor_count()` gelten.
    pub fn set_anchor(&mut self, anchor_index: usize, value: Vec3) {
        if self.points.is_empty() {
            return;
        }
        self.debug_assert_anchor(anchor_index);
        let i = self.loop_index((anchor_index * 3) as isize);
        let delta = value - self.points[i];
        self.points[i] = value;

        if self.normals_stale() {
            self.refresh_anchor_normals();
        } else {
            self.update_anchor_normal(i / 3);
        }

        if self.auto_tangent {
            self.recalculate_around(i / 3);
            return;
        }

        let count = self.points.len();
        if i + 1 < count || self.looped {
            let next = self.loop_index(i as isize + 1);
            self.points[next] += delta;
        }
        if i >= 1 || self.looped {
            let prev = self.loop_index(i as isize - 1);
            self.points[prev] += delta;
        }
    }

    /// Position von Anker `anchor_index` (nur auf geschlossenen Pfaden umgebrochen).
    pub fn anchor_point(&self, anchor_index: usize) -> Vec3 {
        self.debug_assert_anchor(anchor_index);
        self.points[self.loop_index((anchor_index * 3) as isize)]
    }

    /// Offene Pfade brechen Ankernummern nicht um, sonst landet man auf einem Kontrollpunkt.
    fn debug_assert_anchor(&self, anchor_index: usize) {
        debug_assert!(
            self.looped || anchor_index < self.anchor_count(),
            "Anker {} außerhalb des offenen Pfads ({} Anker)",
            anchor_index,
            self.anchor_count()
        );
    }

    /// Bodennormale von Anker `anchor_index`; `Vec3::Y` solange keine vorliegt.
    pub fn anchor_normal(&self, anchor_index: usize) -> Vec3 {
        let len = self.anchor_normals.len();
        if len == 0 {
            return Vec3::Y;
        }
        let index = if self.looped {
            anchor_index % len
        } else {
            anchor_index
        };
        self.anchor_normals.get(index).copied().unwrap_or(Vec3::Y)
    }

    /// Alle gecachten Ankernormalen.
    pub fn anchor_normals(&self) -> &[Vec3] {
        &self.anchor_normals
    }

    // ── Strukturelle Mutationen ─────────────────────────────────────

    /// Hängt einen neuen Anker an.
    ///
    /// Erster Aufruf: nur der Anker. Zweiter: zwei Kontrollpunkte als
    /// Mittelpunkte Richtung neuem Anker. Danach: gespiegelte Austrittstangente
    /// des letzten Segments plus Mittelpunkt Richtung neuem Anker.
    /// Auf geschlossenen Pfaden wird der Anker ins Schließsegment eingefügt.
    pub fn add_segment(&mut self, point: Vec3) {
        if self.looped {
            let closing = self.segment_count() - 1;
            self.split_segment(point, closing);
            return;
        }

        match self.points.len() {
            0 => self.points.push(point),
            1 => {
                let first = self.points[0];
                let c1 = first.lerp(point, 0.5);
                let c2 = c1.lerp(point, 0.5);
                self.points.extend([c1, c2, point]);
            }
            n => {
                let entering = self.points[n - 1] * 2.0 - self.points[n - 2];
                let exiting = entering.lerp(point, 0.5);
                self.points.extend([entering, exiting, point]);
            }
        }
        log::debug!(
            "Segment angehängt: {} Punkte, {} Segmente",
            self.points.len(),
            self.segment_count()
        );

        if self.auto_tangent && self.is_valid() {
            self.recalculate_around(self.anchor_count() - 1);
        }
        self.refresh_normals_if_stale();
    }

    /// Teilt Segment `segment_index` mit einem neuen Anker an `point`.
    ///
    /// Gibt `false` zurück, wenn das Segment nicht existiert.
    pub fn split_segment(&mut self, point: Vec3, segment_index: usize) -> bool {
        if segment_index >= self.segment_count() {
            log::warn!(
                "Split abgelehnt: Segment {} existiert nicht ({} Segmente)",
                segment_index,
                self.segment_count()
            );
            return false;
        }

        let at = segment_index * 3 + 2;
        self.points.splice(at..at, [Vec3::ZERO, point, Vec3::ZERO]);
        let new_anchor = segment_index + 1;

        let split_disabled = self.disabled_segments.contains(&segment_index);
        self.remap_disabled(|s| Some(if s > segment_index { s + 1 } else { s }));
        if split_disabled {
            self.disabled_segments.insert(new_anchor);
            self.disabled_segments.sort_unstable();
        }

        if self.auto_tangent {
            self.recalculate_around(new_anchor);
        } else {
            self.solve_anchor_controls(new_anchor * 3);
        }
        log::debug!("Segment {} geteilt bei {:?}", segment_index, point);

        self.refresh_normals_if_stale();
        true
    }

    /// Entfernt den Anker `anchor_index` samt seiner zwei Kontrollpunkte.
    ///
    /// Das zusammengelegte Segment übernimmt den Deaktiviert-Status des
    /// Segments vor dem Anker.
    ///
    /// Gibt `false` zurück (ohne Änderung), wenn der Pfad dafür zu wenige
    /// Segmente hat (offen < 2, geschlossen < 3) oder der Anker nicht existiert.
    pub fn remove_segment(&mut self, anchor_index: usize) -> bool {
        let segment_count = self.segment_count();
        let minimum = if self.looped {
            MIN_SEGMENTS_FOR_REMOVAL_LOOPED
        } else {
            MIN_SEGMENTS_FOR_REMOVAL_OPEN
        };
        if segment_count < minimum {
            log::warn!(
                "Entfernen abgelehnt: {} Segmente, mindestens {} nötig",
                segment_count,
                minimum
            );
            return false;
        }
        if anchor_index >= self.anchor_count() {
            log::warn!("Entfernen abgelehnt: Anker {} existiert nicht", anchor_index);
            return false;
        }

        let i = anchor_index * 3;
        let count = self.points.len();
        let dropped_segment = if i == 0 {
            if self.looped {
                self.points[count - 1] = self.points[2];
            }
            self.points.drain(0..3);
            0
        } else if i == count - 1 && !self.looped {
            self.points.drain(i - 2..=i);
            segment_count - 1
        } else {
            self.points.drain(i - 1..=i + 1);
            anchor_index
        };

        self.remap_disabled(|s| match s.cmp(&dropped_segment) {
            Ordering::Less => Some(s),
            Ordering::Equal => None,
            Ordering::Greater => Some(s - 1),
        });

        if self.auto_tangent {
            self.recalculate_all();
        }
        log::debug!(
            "Anker {} entfernt: {} Segmente verbleiben",
            anchor_index,
            self.segment_count()
        );

        self.refresh_normals_if_stale();
        true
    }

    /// Öffnet oder schließt den Pfad.
    ///
    /// Schließen hängt zwei gespiegelte Kontrollpunkte an, Öffnen entfernt sie
    /// wieder. Gibt `false` zurück, wenn der Pfad dafür zu wenige Segmente hat.
    pub fn set_looped(&mut self, looped: bool) -> bool {
        if self.looped == looped {
            return true;
        }
        if !self.is_valid() {
            log::warn!("Schließen/Öffnen abgelehnt: Pfad ohne Segment");
            return false;
        }

        if looped {
            let n = self.points.len();
            let entering = self.points[n - 1] * 2.0 - self.points[n - 2];
            let closing = self.points[0] * 2.0 - self.points[1];
            self.points.extend([entering, closing]);
            self.looped = true;

            if self.auto_tangent {
                let last_anchor = self.points.len() - 3;
                self.solve_anchor_controls(0);
                self.solve_anchor_controls(last_anchor);
            }
        } else {
            let segment_count = self.segment_count();
            if segment_count < 2 {
                log::warn!("Öffnen abgelehnt: geschlossener Pfad mit nur einem Segment");
                return false;
            }
            self.points.truncate(self.points.len() - 2);
            self.looped = false;
            self.disabled_segments.shift_remove(&(segment_count - 1));

            if self.auto_tangent {
                self.fix_open_ends();
            }
        }
        log::debug!("Pfad {}", if looped { "geschlossen" } else { "geöffnet" });

        self.refresh_normals_if_stale();
        true
    }

    /// Schaltet automatische Tangenten um; beim Einschalten wird alles neu gelöst.
    pub fn set_auto_tangent(&mut self, auto_tangent: bool) {
        self.auto_tangent = auto_tangent;
        if auto_tangent {
            self.recalculate_all();
        }
    }

    // ── Deaktivierte Segmente ───────────────────────────────────────

    /// Ist Segment `index` vom Sampling/Meshing ausgeschlossen?
    pub fn is_segment_disabled(&self, index: usize) -> bool {
        self.disabled_segments.contains(&index)
    }

    /// Nimmt Segment `index` wieder ins Sampling/Meshing auf.
    pub fn enable_segment(&mut self, index: usize) {
        self.disabled_segments.shift_remove(&index);
    }

    /// Schließt Segment `index` vom Sampling/Meshing aus.
    pub fn disable_segment(&mut self, index: usize) {
        if self.disabled_segments.insert(index) {
            self.disabled_segments.sort_unstable();
        }
    }

    /// Aufsteigender Iterator über alle deaktivierten Segmentindizes.
    pub fn disabled_segments(&self) -> impl Iterator<Item = usize> + '_ {
        self.disabled_segments.iter().copied()
    }

    /// Baut das Set neu auf; `None` aus `map` entfernt den Eintrag.
    fn remap_disabled(&mut self, map: impl Fn(usize) -> Option<usize>) {
        let mut remapped: Vec<usize> = self
            .disabled_segments
            .iter()
            .filter_map(|&s| map(s))
            .collect();
        remapped.sort_unstable();
        self.disabled_segments = remapped.into_iter().collect();
    }

    // ── Abfragen ────────────────────────────────────────────────────

    /// Nächster Anker zu `position` innerhalb von `max_distance`.
    pub fn closest_anchor_point(&self, position: Vec3, max_distance: f32) -> Option<usize> {
        (0..self.anchor_count())
            .map(|a| (a, self.anchor_point(a).distance(position)))
            .filter(|&(_, d)| d <= max_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(a, _)| a)
    }

    /// Nächstes Segment zu `position` innerhalb von `max_distance`.
    ///
    /// Die Distanz wird gegen eine aus der Kurve abgetastete Polyline gemessen.
    pub fn closest_segment(&self, position: Vec3, max_distance: f32) -> Option<usize> {
        (0..self.segment_count())
            .filter_map(|s| {
                let seg = self.segment_points(s)?;
                let mut prev = seg[0];
                let mut best = f32::INFINITY;
                for step in 1..=SEGMENT_PICK_SAMPLES {
                    let p = cubic_segment(&seg, step as f32 / SEGMENT_PICK_SAMPLES as f32);
                    best = best.min(distance_to_line_segment(position, prev, p));
                    prev = p;
                }
                Some((s, best))
            })
            .filter(|&(_, d)| d <= max_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(s, _)| s)
    }

    // ── Normalen-Cache ──────────────────────────────────────────────

    /// Berechnet alle Ankernormalen über die Boden-Abfrage neu.
    pub fn refresh_anchor_normals(&mut self) {
        let normals: Vec<Vec3> = (0..self.anchor_count())
            .map(|a| ground_normal(self.ground.as_ref(), self.anchor_point(a), self.probe))
            .collect();
        log::trace!("Ankernormalen neu berechnet: {}", normals.len());
        self.anchor_normals = normals;
        self.normals_point_count = Some(self.points.len());
    }

    fn normals_stale(&self) -> bool {
        self.normals_point_count != Some(self.points.len())
    }

    fn refresh_normals_if_stale(&mut self) {
        if self.normals_stale() {
            self.refresh_anchor_normals();
        }
    }

    fn update_anchor_normal(&mut self, anchor_index: usize) {
        let position = self.anchor_point(anchor_index);
        let normal = ground_normal(self.ground.as_ref(), position, self.probe);
        if let Some(slot) = self.anchor_normals.get_mut(anchor_index) {
            *slot = normal;
        }
    }
}

impl Default for BezierPath {
    fn default() -> Self {
        Self::empty()
    }
}

impl Index<usize> for BezierPath {
    type Output = Vec3;

    fn index(&self, index: usize) -> &Vec3 {
        &self.points[index]
    }
}

impl fmt::Debug for BezierPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BezierPath")
            .field("points", &self.points)
            .field("looped", &self.looped)
            .field("auto_tangent", &self.auto_tangent)
            .field("disabled_segments", &self.disabled_segments)
            .field("anchor_normals", &self.anchor_normals)
            .field("probe", &self.probe)
            .finish_non_exhaustive()
    }
}
