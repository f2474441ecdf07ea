//! Core-Domänentypen: Bezier-Pfad, Tangenten, Resampling, Boden-Abfrage.

pub mod bezier_path;
pub mod ground;
pub mod heightmap;
pub mod path_data;
pub mod resample;

pub use bezier_path::{loop_index, BezierPath};
pub use ground::{
    ground_normal, GroundHit, GroundProbe, GroundQuery, NoGround, PlaneGround, SurfaceFilter,
};
pub use heightmap::{Heightmap, WorldBounds};
pub use path_data::{PathData, PATH_DATA_VERSION};
pub use resample::{positions, SpacedPoint};
