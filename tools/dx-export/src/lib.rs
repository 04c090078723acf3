//! dx-export library
//!
//! Serializes scene snapshots (meshes, materials, armatures, skin weights and
//! keyframed actions) into DirectX `.x` text files.

pub mod animation;
pub mod config;
pub mod coords;
pub mod error;
pub mod export;
pub mod formats;
pub mod import;
pub mod mesh;
pub mod skeleton;
pub mod xfile;

pub use config::{ExportConfig, ExportMode};
pub use error::{ErrorKind, ExportError};
pub use export::{export_scene, export_to_file, list_scene};
pub use import::{load_scene, DEFAULT_FRAME_RATE};
pub use xfile::XFile;

// Re-export the scene model so callers only need this crate
pub use dxport_shared::{Scene, SnapshotTimeline, Timeline};
