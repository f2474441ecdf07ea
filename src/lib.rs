//! Bezier-Ribbon-Path Library.
//!
//! Stückweise kubische Bezier-Pfade mit automatischen Tangenten,
//! gleichmäßigem Arc-Length-Resampling und Ribbon-Mesh-Erzeugung.
//! Boden-Abfrage und Mesh-Konsum stellt der Host über Traits bereit.

pub mod core;
pub mod render;
pub mod shared;

pub use core::{
    BezierPath, GroundHit, GroundProbe, GroundQuery, Heightmap, NoGround, PathData, PlaneGround,
    SpacedPoint, SurfaceFilter, WorldBounds,
};
pub use render::{
    create_ribbon_mesh, create_ribbon_mesh_with_options, MeshSink, RibbonMesh, RibbonVertex,
};
pub use shared::PathOptions;
