//! Root-level scene objects

use serde::{Deserialize, Serialize};

use crate::armature::Armature;
use crate::mesh::Mesh;

/// Snapshot of a host scene.
///
/// Objects are kept in scene order; export modes walk them in this order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

/// A root-level object (Blender-like 'Object').
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    /// Whether the user selected this object in the host application
    #[serde(default)]
    pub selected: bool,
    pub data: ObjectData,
}

/// Payload of a scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectData {
    Mesh(Mesh),
    Armature(Armature),
    /// Cameras, lamps, empties... anything the exporter ignores
    #[serde(other)]
    Other,
}

impl SceneObject {
    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.data {
            ObjectData::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn armature(&self) -> Option<&Armature> {
        match &self.data {
            ObjectData::Armature(armature) => Some(armature),
            _ => None,
        }
    }

    /// Short label for the object's type, used in listings and logs.
    pub fn kind(&self) -> &'static str {
        match self.data {
            ObjectData::Mesh(_) => "Mesh",
            ObjectData::Armature(_) => "Armature",
            ObjectData::Other => "Other",
        }
    }
}

impl Scene {
    /// All mesh objects, selected or not.
    pub fn meshes(&self) -> impl Iterator<Item = (&SceneObject, &Mesh)> {
        self.objects
            .iter()
            .filter_map(|obj| obj.mesh().map(|mesh| (obj, mesh)))
    }

    /// Selected objects only.
    pub fn selected(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|obj| obj.selected)
    }
}
