//! Skin encoder: bone hierarchy checks, skin header and per-bone weights
//!
//! Bones are always visited depth-first from the unique root bone, children
//! in scene order. The same order drives the frame hierarchy, the
//! `SkinWeights` blocks and the animation tracks.

use glam::Mat4;
use hashbrown::HashSet;

use crate::error::{ExportError, Result};
use crate::formats::{flat_matrix, float, separator, validate_name, IDENTITY_WEIGHTS_MATRIX};
use dxport_shared::{Armature, Bone, Mesh};

/// Determinants below this are treated as singular
const SINGULAR_EPSILON: f32 = 1e-12;

/// Invert `m`, failing on singular or non-finite matrices.
///
/// `what` names the matrix in the error message.
pub fn invert(m: &Mat4, what: impl FnOnce() -> String) -> Result<Mat4> {
    let det = m.determinant();
    if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
        return Err(ExportError::SingularMatrix { what: what() });
    }
    Ok(m.inverse())
}

/// A validated armature with its bones in export order.
#[derive(Debug, Clone)]
pub struct Skeleton<'a> {
    pub name: &'a str,
    pub armature: &'a Armature,
    pub root: &'a Bone,
    /// Pre-order from the root, children in scene order
    pub bones: Vec<&'a Bone>,
}

impl<'a> Skeleton<'a> {
    /// Check that `armature` forms a single tree and order its bones.
    pub fn new(name: &'a str, armature: &'a Armature) -> Result<Self> {
        for bone in &armature.bones {
            if let Some(parent) = &bone.parent {
                if armature.bone(parent).is_none() {
                    return Err(ExportError::UnknownParent {
                        armature: name.to_string(),
                        bone: bone.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        let root = root_bone(name, armature)?;
        let bones = bone_order(armature, root);
        if bones.len() != armature.bones.len() {
            return Err(ExportError::DetachedBones {
                armature: name.to_string(),
                root: root.name.clone(),
                count: armature.bones.len() - bones.len(),
            });
        }

        Ok(Self {
            name,
            armature,
            root,
            bones,
        })
    }
}

/// The single bone without a parent.
pub fn root_bone<'a>(name: &str, armature: &'a Armature) -> Result<&'a Bone> {
    let mut roots = armature.roots();
    match (roots.next(), roots.next()) {
        (Some(root), None) => Ok(root),
        _ => Err(ExportError::NoUniqueRoot {
            armature: name.to_string(),
            roots: armature.roots().count(),
        }),
    }
}

/// Depth-first pre-order walk from `root`. Each name is visited once.
pub fn bone_order<'a>(armature: &'a Armature, root: &'a Bone) -> Vec<&'a Bone> {
    let mut order = Vec::with_capacity(armature.bones.len());
    let mut visited = HashSet::new();
    let mut stack = vec![root];

    while let Some(bone) = stack.pop() {
        if !visited.insert(bone.name.as_str()) {
            continue;
        }
        order.push(bone);
        let children: Vec<_> = armature.children(&bone.name).collect();
        stack.extend(children.into_iter().rev());
    }
    order
}

/// Highest number of bones influencing any vertex weighted to `bones`.
pub fn compute_max_influence(mesh: &Mesh, bones: &[&Bone]) -> usize {
    bones
        .iter()
        .filter_map(|bone| mesh.group(&bone.name))
        .flatten()
        .map(|member| mesh.vertex_influences(member.vertex))
        .max()
        .unwrap_or(0)
}

/// `XSkinMeshHeader` block.
pub fn skin_mesh_header(mesh: &Mesh, bones: &[&Bone]) -> String {
    let max = compute_max_influence(mesh, bones);
    format!(
        "\nXSkinMeshHeader {{\n{};\n{};\n{};\n}}\n",
        max,
        max * 3,
        bones.len()
    )
}

/// Body written for bones without weighted vertices
pub fn placeholder_weights() -> String {
    format!("0;\n0.0;\n{};;\n", IDENTITY_WEIGHTS_MATRIX)
}

/// Body of a `SkinWeights` block: indices, weights and the inverse bind pose.
pub fn encode_bone_weights(mesh: &Mesh, bone: &Bone) -> Result<String> {
    let members = match mesh.group(&bone.name) {
        Some(members) if !members.is_empty() => members,
        _ => return Ok(placeholder_weights()),
    };

    let count = members.len();
    let mut out = format!("{};\n", count);
    for (i, member) in members.iter().enumerate() {
        out.push_str(&format!("{}{}", member.vertex, separator(i, count, ",\n", ";\n")));
    }
    for (i, member) in members.iter().enumerate() {
        out.push_str(&format!("{}{}", float(member.weight), separator(i, count, ",\n", ";\n")));
    }

    let inverse = invert(&bone.matrix, || format!("bind pose of bone '{}'", bone.name))?;
    out.push_str(&flat_matrix(&inverse));
    out.push('\n');
    Ok(out)
}

/// Skin header plus one `SkinWeights` block per bone, in skeleton order.
pub fn encode_skin(mesh: &Mesh, skeleton: &Skeleton) -> Result<String> {
    let mut out = skin_mesh_header(mesh, &skeleton.bones);
    for bone in &skeleton.bones {
        if !matches!(mesh.group(&bone.name), Some(members) if !members.is_empty()) {
            tracing::warn!(
                "Bone '{}' of armature '{}' has no weighted vertices",
                bone.name,
                skeleton.name
            );
        }
        out.push_str(&format!("\nSkinWeights {{\n\"{}\";\n", validate_name(&bone.name)));
        out.push_str(&encode_bone_weights(mesh, bone)?);
        out.push_str("}\n");
    }
    Ok(out)
}
