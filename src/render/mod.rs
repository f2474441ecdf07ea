//! Mesh-Erzeugung aus Pfaden und Übergabe an den Mesh-Konsumenten.

mod ribbon_mesh;
mod types;

pub use ribbon_mesh::{create_ribbon_mesh, create_ribbon_mesh_with_options};
pub use types::{MeshSink, RibbonMesh, RibbonVertex};
