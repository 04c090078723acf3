//! Mesh encoder (`Mesh` blocks and their nested data)

pub mod geometry;
pub mod material;

use hashbrown::HashSet;

use crate::config::ExportConfig;
use crate::coords::CoordinateTransform;
use crate::error::{ExportError, Result};
use crate::formats::validate_name;
use crate::skeleton::{encode_skin, Skeleton};
use dxport_shared::Mesh;

pub use geometry::{
    encode_faces, encode_normals, encode_texcoords, encode_vertex_colors, encode_vertices,
};
pub use material::{encode_materials, MaterialTable};

/// Check that every face only references vertices of the mesh and carries
/// exactly one color and one UV pair per corner when it has them.
pub fn validate_faces(name: &str, mesh: &Mesh) -> Result<()> {
    let known: HashSet<u32> = mesh.vertices.iter().map(|v| v.index).collect();
    for (face_index, face) in mesh.faces.iter().enumerate() {
        if let Some(&vertex) = face.vertices.iter().find(|v| !known.contains(*v)) {
            return Err(ExportError::VertexOutOfRange {
                mesh: name.to_string(),
                face: face_index,
                vertex,
            });
        }

        let corners = face.vertices.len();
        let attributes = [
            ("colors", face.colors.as_ref().map(Vec::len)),
            ("UV pairs", face.uvs.as_ref().map(Vec::len)),
        ];
        for (attribute, found) in attributes {
            match found {
                Some(found) if found != corners => {
                    return Err(ExportError::CornerCount {
                        mesh: name.to_string(),
                        face: face_index,
                        attribute,
                        found,
                        corners,
                    });
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// A complete `Mesh` block.
///
/// With a skeleton the block also carries the skin header and one
/// `SkinWeights` block per bone.
pub fn encode_mesh(
    name: &str,
    mesh: &Mesh,
    config: &ExportConfig,
    skeleton: Option<&Skeleton>,
) -> Result<String> {
    validate_faces(name, mesh)?;
    let transform = CoordinateTransform::for_mesh(mesh, config);

    tracing::info!(
        "Writing mesh '{}': {} vertices, {} faces",
        name,
        mesh.vertices.len(),
        mesh.faces.len()
    );

    let mut out = format!("\nMesh {} {{\n{};\n", validate_name(name), mesh.vertices.len());
    out.push_str(&encode_vertices(mesh, &transform));
    let faces = encode_faces(mesh);
    out.push_str(&faces);

    if config.write_materials {
        if mesh.materials.is_empty() {
            tracing::debug!("Mesh '{}' has no materials, skipping material list", name);
        } else {
            out.push_str("\nMeshMaterialList {\n");
            out.push_str(&encode_materials(name, mesh)?);
            out.push_str("}\n");
        }
    }

    if config.write_vertex_colors {
        if mesh.has_vertex_colors() {
            out.push_str(&format!("\nMeshVertexColors {{\n{};\n", mesh.vertices.len()));
            out.push_str(&encode_vertex_colors(mesh));
            out.push_str("}\n");
        } else {
            tracing::warn!("Mesh '{}' has no vertex colors", name);
        }
    }

    if config.write_normals {
        out.push_str(&format!("\nMeshNormals {{\n{};\n", mesh.vertices.len()));
        out.push_str(&encode_normals(mesh, &transform));
        out.push_str(&faces);
        out.push_str("}\n");
    }

    if config.write_texcoords {
        if mesh.has_texcoords() {
            out.push_str("\nMeshTextureCoords {\n");
            out.push_str(&encode_texcoords(mesh));
            out.push_str("}\n");
        } else {
            tracing::warn!("Mesh '{}' has no texture coordinates", name);
        }
    }

    if let Some(skeleton) = skeleton {
        out.push_str(&encode_skin(mesh, skeleton)?);
    }

    out.push_str("}\n");
    Ok(out)
}
