//! Geteilte Bausteine: Kurvenauswertung und Konfiguration.

pub mod bezier;
pub mod options;

pub use bezier::{cubic, cubic_segment, polyline_length};
pub use options::PathOptions;
