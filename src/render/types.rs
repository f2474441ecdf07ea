//! Mesh-Typen und die Schnittstelle zum Mesh-Konsumenten des Hosts.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Nimmt fertige Mesh-Puffer entgegen (Rendering/Speicherung beim Host).
///
/// `vertices` enthält `xyz`-Tripel, `uvs` `uv`-Paare, `triangles` drei
/// Vertex-Indizes pro Dreieck.
pub trait MeshSink {
    /// Übergibt ein komplettes Mesh.
    fn submit(&mut self, vertices: &[f32], uvs: &[f32], triangles: &[u32]);
}

/// Interleavter Vertex für GPU-Upload (Position + UV).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct RibbonVertex {
    /// Weltposition
    pub position: [f32; 3],
    /// Texturkoordinate
    pub uv: [f32; 2],
}

impl RibbonVertex {
    /// Erstellt einen neuen RibbonVertex.
    pub fn new(position: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            uv: uv.to_array(),
        }
    }
}

/// Ribbon-Mesh entlang eines Pfads: zwei Vertices pro Abtastpunkt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RibbonMesh {
    /// Vertex-Positionen, paarweise linke/rechte Kante
    pub vertices: Vec<Vec3>,
    /// Texturkoordinaten parallel zu `vertices`
    pub uvs: Vec<Vec2>,
    /// Dreiecks-Indizes (3 pro Dreieck)
    pub triangles: Vec<u32>,
}

impl RibbonMesh {
    /// Leeres Mesh ohne Geometrie.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Gibt `true` zurück, wenn das Mesh keine Vertices hat.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Anzahl der Vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Anzahl der Dreiecke.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Positionen als flacher `f32`-Puffer (`x, y, z, x, y, z, ...`).
    pub fn flat_vertices(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// UVs als flacher `f32`-Puffer (`u, v, u, v, ...`).
    pub fn flat_uvs(&self) -> &[f32] {
        bytemuck::cast_slice(&self.uvs)
    }

    /// Position und UV interleavt, bereit für einen Vertex-Buffer.
    pub fn interleaved(&self) -> Vec<RibbonVertex> {
        self.vertices
            .iter()
            .zip(&self.uvs)
            .map(|(&position, &uv)| RibbonVertex::new(position, uv))
            .collect()
    }

    /// Reicht das Mesh an den Konsumenten weiter.
    pub fn submit_to(&self, sink: &mut dyn MeshSink) {
        log::debug!(
            "Ribbon-Mesh übergeben: {} Vertices, {} Dreiecke",
            self.vertex_count(),
            self.triangle_count()
        );
        sink.submit(self.flat_vertices(), self.flat_uvs(), &self.triangles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        vertices: Vec<f32>,
        uvs: Vec<f32>,
        triangles: Vec<u32>,
    }

    impl MeshSink for RecordingSink {
        fn submit(&mut self, vertices: &[f32], uvs: &[f32], triangles: &[u32]) {
            self.vertices = vertices.to_vec();
            self.uvs = uvs.to_vec();
            self.triangles = triangles.to_vec();
        }
    }

    fn quad() -> RibbonMesh {
        RibbonMesh {
            vertices: vec![
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, -1.0),
            ],
            uvs: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.5),
                Vec2::new(1.0, 0.5),
            ],
            triangles: vec![0, 2, 1, 1, 2, 3],
        }
    }

    #[test]
    fn test_flat_buffers_match_vectors() {
        let mesh = quad();
        assert_eq!(mesh.flat_vertices().len(), 12);
        assert_eq!(&mesh.flat_vertices()[6..9], &[1.0, 0.0, 1.0]);
        assert_eq!(mesh.flat_uvs(), &[0.0, 0.0, 1.0, 0.0, 0.0, 0.5, 1.0, 0.5]);
    }

    #[test]
    fn test_submit_forwards_buffers() {
        let mesh = quad();
        let mut sink = RecordingSink::default();
        mesh.submit_to(&mut sink);

        assert_eq!(sink.vertices.len(), 12);
        assert_eq!(sink.uvs.len(), 8);
        assert_eq!(sink.triangles, mesh.triangles);
    }

    #[test]
    fn test_interleaved_vertex_layout() {
        let vertices = quad().interleaved();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[3].position, [1.0, 0.0, -1.0]);
        assert_eq!(vertices[3].uv, [1.0, 0.5]);
        assert_eq!(std::mem::size_of::<RibbonVertex>(), 20);
        assert_eq!(bytemuck::cast_slice::<RibbonVertex, f32>(&vertices).len(), 20);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = RibbonMesh::empty();
        assert!(mesh.is_empty());
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.flat_vertices().is_empty());
    }
}
