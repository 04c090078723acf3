//! Material blocks and the face to material table

use hashbrown::HashMap;

use crate::error::{ExportError, Result};
use crate::formats::{float, separator, texture_basename, validate_name};
use dxport_shared::{Material, Mesh};

/// Texture name written for materials no face gives an image
pub const NO_TEXTURE: &str = "None";

/// Distinct materials of a mesh and the material index of every face.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialTable<'a> {
    /// Distinct materials in first-seen slot order
    pub materials: Vec<&'a Material>,
    /// Texture filename per distinct material
    pub textures: Vec<String>,
    /// Index into `materials` per face
    pub face_materials: Vec<usize>,
}

impl<'a> MaterialTable<'a> {
    /// Deduplicate the mesh's material slots by name and resolve textures.
    ///
    /// Each material takes the image of the first face that uses it and has
    /// one. Faces without a slot use slot 0.
    pub fn build(mesh_name: &str, mesh: &'a Mesh) -> Result<Self> {
        let mut materials: Vec<&Material> = Vec::new();
        let mut by_name: HashMap<&str, usize> = HashMap::new();
        let slots: Vec<usize> = mesh
            .materials
            .iter()
            .map(|m| {
                *by_name.entry(m.name.as_str()).or_insert_with(|| {
                    materials.push(m);
                    materials.len() - 1
                })
            })
            .collect();

        let mut textures: Vec<Option<String>> = vec![None; materials.len()];
        let mut face_materials = Vec::with_capacity(mesh.faces.len());

        for (face_index, face) in mesh.faces.iter().enumerate() {
            let slot = face.material.unwrap_or(0);
            let distinct = *slots.get(slot).ok_or_else(|| ExportError::MaterialOutOfRange {
                mesh: mesh_name.to_string(),
                face: face_index,
                slot,
                count: slots.len(),
            })?;
            face_materials.push(distinct);

            if textures[distinct].is_none() {
                textures[distinct] = face.image.as_deref().map(texture_basename);
            }
        }

        Ok(Self {
            materials,
            textures: textures
                .into_iter()
                .map(|t| t.unwrap_or_else(|| NO_TEXTURE.to_string()))
                .collect(),
            face_materials,
        })
    }
}

/// One `Material` block.
pub fn encode_material(material: &Material, texture: &str) -> String {
    let [r, g, b, a] = material.diffuse.map(float);
    let [sr, sg, sb] = material.specular.map(float);
    let zero = float(0.0);
    format!(
        "Material {} {{\n    {}; {}; {}; {};;\n    {};\n    {}; {}; {};;\n    {}; {}; {};;\n    TextureFilename {{ \"{}\"; }}\n}}\n",
        validate_name(&material.name),
        r,
        g,
        b,
        a,
        float(material.specular_power),
        sr,
        sg,
        sb,
        zero,
        zero,
        zero,
        texture
    )
}

/// Body of a `MeshMaterialList` block.
///
/// Material and face counts, the per-face material table, then one
/// `Material` block per distinct material.
pub fn encode_materials(mesh_name: &str, mesh: &Mesh) -> Result<String> {
    let table = MaterialTable::build(mesh_name, mesh)?;

    let mut out = format!("{};\n{};\n", table.materials.len(), mesh.faces.len());
    let count = table.face_materials.len();
    for (i, index) in table.face_materials.iter().enumerate() {
        out.push_str(&format!("{}{}", index, separator(i, count, ",\n", ";;\n")));
    }
    for (material, texture) in table.materials.iter().zip(&table.textures) {
        out.push_str(&encode_material(material, texture));
    }
    Ok(out)
}
