//! Shared scene snapshot types for dxport.
//!
//! A [`Scene`] is a read-only snapshot of a host 3-D scene: root-level objects,
//! their meshes, armatures and actions. The only mutable piece of host state the
//! exporter touches is the animation clock, modelled by the [`Timeline`] trait.
//!
//! Matrices are `glam::Mat4` in glam's column-vector convention. Flattening one
//! with `to_cols_array()` gives the row-major, row-vector layout used by
//! DirectX `.x` files (translation in elements 12..14).

pub mod armature;
pub mod mesh;
pub mod scene;
pub mod timeline;

pub use armature::{Action, Armature, Bone, Channel};
pub use mesh::{Face, GroupMember, Material, Mesh, Vertex, VertexGroup};
pub use scene::{ObjectData, Scene, SceneObject};
pub use timeline::{SnapshotTimeline, Timeline};
