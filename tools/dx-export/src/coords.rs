//! Scene (right-handed, Z-up) to DirectX (left-handed, Y-up) conversion
//!
//! Static exports swap Y and Z on every vertex. Animated exports keep vertex
//! data untouched and wrap the hierarchy in a single swapping frame instead,
//! so bone matrices never need to be re-derived.

use glam::{Mat4, Vec3, Vec4};

use crate::config::ExportConfig;
use dxport_shared::Mesh;

/// Per-mesh vertex transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    /// Added to every position
    pub world_offset: Vec3,
    /// Write triplets as `(x, z, y)`
    pub swap_yz: bool,
}

impl CoordinateTransform {
    pub const IDENTITY: Self = Self {
        world_offset: Vec3::ZERO,
        swap_yz: false,
    };

    /// Transform for `mesh` under `config`.
    ///
    /// Animated exports never swap per vertex; the swap lives in the root frame.
    pub fn for_mesh(mesh: &Mesh, config: &ExportConfig) -> Self {
        Self {
            world_offset: if config.apply_world_translation {
                mesh.world_translation()
            } else {
                Vec3::ZERO
            },
            swap_yz: config.swap_y_z && !config.mode.is_animated(),
        }
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        transform_point(p, self.world_offset, self.swap_yz)
    }

    pub fn transform_normal(&self, n: Vec3) -> Vec3 {
        transform_normal(n, self.swap_yz)
    }
}

/// Offset `p` by `world_offset`, then optionally swap Y and Z.
pub fn transform_point(p: Vec3, world_offset: Vec3, swap_yz: bool) -> Vec3 {
    swap(p + world_offset, swap_yz)
}

/// Normals are never offset.
pub fn transform_normal(n: Vec3, swap_yz: bool) -> Vec3 {
    swap(n, swap_yz)
}

fn swap(v: Vec3, swap_yz: bool) -> Vec3 {
    if swap_yz {
        Vec3::new(v.x, v.z, v.y)
    } else {
        v
    }
}

/// Matrix of the synthetic `SwapYZ` root frame.
///
/// A -90 degree rotation about X followed by a Z mirror, which is exactly a
/// permutation of the Y and Z axes.
pub fn swap_yz_frame() -> Mat4 {
    Mat4::from_cols(Vec4::X, Vec4::Z, Vec4::Y, Vec4::W)
}
