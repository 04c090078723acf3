//! Mesh snapshot: vertices, polygon faces, material slots and vertex groups

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Mesh data of a scene object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
    /// Object-to-world matrix of the owning object
    pub world: Mat4,
    /// Material slots, addressed by [`Face::material`]
    pub materials: Vec<Material>,
    /// Named vertex groups; skinned meshes use one group per bone name
    pub groups: Vec<VertexGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Stable index assigned by the host scene, referenced verbatim by faces
    pub index: u32,
    pub position: Vec3,
    #[serde(default)]
    pub normal: Vec3,
}

/// A polygon (not limited to triangles).
///
/// Per-corner data (`colors`, `uvs`) has one entry per entry in `vertices`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Face {
    pub vertices: Vec<u32>,
    /// Material slot; faces without one use slot 0
    pub material: Option<usize>,
    /// Per-corner RGBA, 0-255 per channel
    pub colors: Option<Vec<[u8; 4]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Filename of the texture image assigned to this face
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    #[serde(default = "default_diffuse")]
    pub diffuse: [f32; 4],
    #[serde(default)]
    pub specular_power: f32,
    #[serde(default)]
    pub specular: [f32; 3],
}

fn default_diffuse() -> [f32; 4] {
    [0.8, 0.8, 0.8, 1.0]
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse: default_diffuse(),
            specular_power: 0.0,
            specular: [0.0; 3],
        }
    }
}

/// Named set of weighted vertices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexGroup {
    pub name: String,
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub vertex: u32,
    pub weight: f32,
}

impl Mesh {
    /// Members of the vertex group called `name`, in group order.
    pub fn group(&self, name: &str) -> Option<&[GroupMember]> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.members.as_slice())
    }

    /// Number of vertex groups the vertex belongs to.
    pub fn vertex_influences(&self, vertex: u32) -> usize {
        self.groups
            .iter()
            .filter(|g| g.members.iter().any(|m| m.vertex == vertex))
            .count()
    }

    /// Translation part of the world matrix.
    pub fn world_translation(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }

    pub fn has_vertex_colors(&self) -> bool {
        self.faces.iter().any(|f| f.colors.is_some())
    }

    pub fn has_texcoords(&self) -> bool {
        self.faces.iter().any(|f| f.uvs.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(vertex: u32, weight: f32) -> GroupMember {
        GroupMember { vertex, weight }
    }

    #[test]
    fn test_vertex_influences() {
        let mesh = Mesh {
            groups: vec![
                VertexGroup {
                    name: "Hip".into(),
                    members: vec![member(0, 1.0), member(1, 0.5)],
                },
                VertexGroup {
                    name: "Knee".into(),
                    members: vec![member(1, 0.5), member(2, 1.0)],
                },
            ],
            ..Default::default()
        };

        assert_eq!(mesh.vertex_influences(0), 1);
        assert_eq!(mesh.vertex_influences(1), 2);
        assert_eq!(mesh.vertex_influences(3), 0);
        assert_eq!(mesh.group("Knee").map(|m| m.len()), Some(2));
        assert!(mesh.group("Foot").is_none());
    }

    #[test]
    fn test_world_translation() {
        let mesh = Mesh {
            world: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            ..Default::default()
        };
        assert_eq!(mesh.world_translation(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Mesh::default().world, Mat4::IDENTITY);
    }

    #[test]
    fn test_face_defaults_from_json() {
        let face: Face = serde_json::from_str(r#"{ "vertices": [0, 1, 2] }"#).unwrap();
        assert_eq!(face.vertices, [0, 1, 2]);
        assert!(face.material.is_none());
        assert!(face.colors.is_none());
        assert!(face.uvs.is_none());
    }
}
