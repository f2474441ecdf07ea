//! Ribbon-Mesh aus den gleichmäßig verteilten Pfadpunkten.
//!
//! Pro Abtastpunkt entstehen zwei Vertices (linke/rechte Kante, `u = 0/1`),
//! je zwei aufeinanderfolgende Paare bilden ein Quad aus zwei Dreiecken.
//! Über deaktivierte Segmente hinweg bleibt eine Lücke.

use glam::{Vec2, Vec3};

use super::types::RibbonMesh;
use crate::core::{BezierPath, SpacedPoint};
use crate::shared::options::{PathOptions, MIN_SPACING, UV_LENGTH_SCALE};

/// Erzeugt das Ribbon-Mesh eines Pfads.
///
/// Weniger als zwei Abtastpunkte ergeben ein leeres Mesh.
pub fn create_ribbon_mesh(
    path: &BezierPath,
    width: f32,
    spacing: f32,
    resolution: f32,
    tiling: f32,
) -> RibbonMesh {
    let points = path.spaced_points(spacing, resolution);
    if points.len() < 2 {
        log::debug!("Ribbon-Mesh leer: {} Abtastpunkte", points.len());
        return RibbonMesh::empty();
    }

    let spacing = spacing.max(MIN_SPACING);
    let count = points.len();
    let looped = path.is_looped();
    let half_width = width * 0.5;
    let v_scale = count as f32 * spacing * UV_LENGTH_SCALE * tiling;

    let mut mesh = RibbonMesh {
        vertices: Vec::with_capacity(count * 2),
        uvs: Vec::with_capacity(count * 2),
        triangles: Vec::with_capacity(count * 6),
    };

    for (i, point) in points.iter().enumerate() {
        let forward = forward_direction(path, &points, i);
        let side = point
            .normal
            .cross(forward)
            .try_normalize()
            .unwrap_or_else(|| forward.any_orthonormal_vector());

        let along = i as f32 / (count - 1) as f32;
        let v = (1.0 - (2.0 * along - 1.0).abs()) * v_scale;

        mesh.vertices.push(point.position - side * half_width);
        mesh.vertices.push(point.position + side * half_width);
        mesh.uvs.push(Vec2::new(0.0, v));
        mesh.uvs.push(Vec2::new(1.0, v));

        let next = if i + 1 < count {
            i + 1
        } else if looped {
            0
        } else {
            continue;
        };

        let gap = point.position.distance(points[next].position);
        if gap > 2.0 * spacing && link_crosses_disabled(path, point, &points[next]) {
            log::trace!("Lücke zwischen Abtastpunkt {} und {}", i, next);
            continue;
        }

        let (a, b) = (2 * i as u32, 2 * next as u32);
        mesh.triangles.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
    }

    log::debug!(
        "Ribbon-Mesh erzeugt: {} Vertices, {} Dreiecke",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    mesh
}

/// Wie [`create_ribbon_mesh`], Parameter aus den Pfad-Optionen.
pub fn create_ribbon_mesh_with_options(path: &BezierPath, options: &PathOptions) -> RibbonMesh {
    create_ribbon_mesh(
        path,
        options.ribbon_width,
        options.spacing,
        options.resolution,
        options.tiling,
    )
}

/// Laufrichtung an Abtastpunkt `i` aus den Nachbarn, ohne Verbindungen über deaktivierte Segmente.
fn forward_direction(path: &BezierPath, points: &[SpacedPoint], i: usize) -> Vec3 {
    let count = points.len();
    let looped = path.is_looped();
    let current = &points[i];

    let next = if i + 1 < count {
        Some(&points[i + 1])
    } else if looped {
        Some(&points[0])
    } else {
        None
    };
    let previous = if i > 0 {
        Some(&points[i - 1])
    } else if looped {
        Some(&points[count - 1])
    } else {
        None
    };

    let mut filtered = Vec3::ZERO;
    let mut unfiltered = Vec3::ZERO;
    if let Some(next) = next {
        let offset = next.position - current.position;
        unfiltered += offset;
        if !link_crosses_disabled(path, current, next) {
            filtered += offset;
        }
    }
    if let Some(previous) = previous {
        let offset = current.position - previous.position;
        unfiltered += offset;
        if !link_crosses_disabled(path, previous, current) {
            filtered += offset;
        }
    }

    filtered
        .try_normalize()
        .or_else(|| unfiltered.try_normalize())
        .unwrap_or(Vec3::Z)
}

/// Prüft, ob zwischen zwei Abtastpunkten (in Pfadrichtung) ein deaktiviertes Segment liegt.
///
/// Betrachtet werden alle Segmente von `from.segment` bis `to.segment`
/// einschließlich, auf geschlossenen Pfaden über das Ende hinweg.
fn link_crosses_disabled(path: &BezierPath, from: &SpacedPoint, to: &SpacedPoint) -> bool {
    let segment_count = path.segment_count();
    if segment_count == 0 {
        return false;
    }

    let mut segment = from.segment;
    for _ in 0..segment_count {
        if path.is_segment_disabled(segment) {
            return true;
        }
        if segment == to.segment {
            break;
        }
        segment = (segment + 1) % segment_count;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn straight_path(anchor_count: usize) -> BezierPath {
        let mut path = BezierPath::empty();
        for i in 0..anchor_count {
            path.add_segment(Vec3::new(i as f32 * 10.0, 0.0, 0.0));
        }
        path
    }

    #[test]
    fn test_straight_ribbon_counts() {
        let path = straight_path(2);
        let mesh = create_ribbon_mesh(&path, 2.0, 1.0, 1.0, 1.0);

        assert_eq!(mesh.vertex_count(), 22);
        assert_eq!(mesh.uvs.len(), 22);
        assert_eq!(mesh.triangle_count(), 20);
    }

    #[test]
    fn test_ribbon_edges_are_offset_by_half_width() {
        let path = straight_path(2);
        let mesh = create_ribbon_mesh(&path, 3.0, 1.0, 1.0, 1.0);

        for pair in mesh.vertices.chunks(2) {
            assert_abs_diff_eq!(pair[0].distance(pair[1]), 3.0, epsilon = 1e-4);
            assert_abs_diff_eq!(pair[0].y, 0.0, epsilon = 1e-5);
            assert_abs_diff_eq!(pair[0].x, pair[1].x, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_triangles_face_along_normal() {
        let path = straight_path(2);
        let mesh = create_ribbon_mesh(&path, 2.0, 1.0, 1.0, 1.0);

        for tri in mesh.triangles.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| mesh.vertices[tri[k] as usize]);
            let face = (b - a).cross(c - a);
            assert!(face.y > 0.0, "Dreieck {tri:?} zeigt nach unten");
        }
    }

    #[test]
    fn test_uv_tent_profile() {
        let path = straight_path(2);
        let mesh = create_ribbon_mesh(&path, 2.0, 1.0, 1.0, 2.0);

        // 11 Punkte: Spitze in der Mitte = 11 * 1 * 0.05 * 2
        assert_eq!(mesh.uvs[0], Vec2::new(0.0, 0.0));
        assert_eq!(mesh.uvs[1], Vec2::new(1.0, 0.0));
        assert_abs_diff_eq!(mesh.uvs[10].y, 1.1, epsilon = 1e-5);
        assert_abs_diff_eq!(mesh.uvs[20].y, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(mesh.uvs[4].y, mesh.uvs[16].y, epsilon = 1e-5);
    }

    #[test]
    fn test_disabled_segment_leaves_gap() {
        let mut path = straight_path(4);
        path.disable_segment(0);
        let mesh = create_ribbon_mesh(&path, 2.0, 1.0, 1.0, 1.0);
        let points = path.spaced_points(1.0, 1.0);

        // Vertex-Paare für jeden Punkt, aber keine Dreiecke von Punkt 0 zu Punkt 1
        assert_eq!(mesh.vertex_count(), points.len() * 2);
        assert!(!mesh.triangles.chunks(3).any(|tri| tri.contains(&0)));
        assert_eq!(mesh.triangle_count(), (points.len() - 2) * 2);
    }

    #[test]
    fn test_looped_ribbon_closes() {
        let mut path = BezierPath::empty();
        path.add_segment(Vec3::ZERO);
        path.add_segment(Vec3::new(10.0, 0.0, 0.0));
        path.add_segment(Vec3::new(10.0, 0.0, 10.0));
        path.add_segment(Vec3::new(0.0, 0.0, 10.0));
        assert!(path.set_looped(true));
        path.set_auto_tangent(true);

        let mesh = create_ribbon_mesh(&path, 2.0, 1.0, 1.0, 1.0);
        let point_count = mesh.vertex_count() / 2;
        assert_eq!(mesh.triangle_count(), point_count * 2);

        let last = (point_count as u32 - 1) * 2;
        assert!(mesh.triangles.chunks(3).any(|tri| tri == [last, 0, last + 1]));
    }

    #[test]
    fn test_degenerate_path_gives_empty_mesh() {
        let mut path = BezierPath::empty();
        assert!(create_ribbon_mesh(&path, 2.0, 1.0, 1.0, 1.0).is_empty());
        path.add_segment(Vec3::ONE);
        assert!(create_ribbon_mesh(&path, 2.0, 1.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_options_drive_mesh_parameters() {
        let path = straight_path(2);
        let options = PathOptions {
            ribbon_width: 4.0,
            spacing: 2.0,
            ..PathOptions::default()
        };
        let mesh = create_ribbon_mesh_with_options(&path, &options);

        assert_eq!(mesh.vertex_count(), 12);
        assert_abs_diff_eq!(mesh.vertices[0].distance(mesh.vertices[1]), 4.0, epsilon = 1e-4);
    }
}
