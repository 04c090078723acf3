//! Vertex, face, normal, color and texture coordinate lists

use hashbrown::HashSet;

use crate::coords::CoordinateTransform;
use crate::formats::{float, separator};
use dxport_shared::Mesh;

fn triplet(v: glam::Vec3) -> String {
    format!("{}; {}; {};", float(v.x), float(v.y), float(v.z))
}

/// One `x; y; z;` line per vertex, in mesh order.
pub fn encode_vertices(mesh: &Mesh, transform: &CoordinateTransform) -> String {
    let mut out = String::new();
    let count = mesh.vertices.len();
    for (i, vertex) in mesh.vertices.iter().enumerate() {
        out.push_str(&triplet(transform.transform_point(vertex.position)));
        out.push_str(separator(i, count, ",\n", ";\n"));
    }
    out
}

/// Face count followed by one `n; i0, i1, ...` line per face.
pub fn encode_faces(mesh: &Mesh) -> String {
    let mut out = format!("{};\n", mesh.faces.len());
    let count = mesh.faces.len();
    for (i, face) in mesh.faces.iter().enumerate() {
        let indices: Vec<String> = face.vertices.iter().map(u32::to_string).collect();
        out.push_str(&format!("{}; {}", face.vertices.len(), indices.join(", ")));
        out.push_str(separator(i, count, ";,", ";;"));
        out.push('\n');
    }
    out
}

/// Per-vertex normals, same layout as [`encode_vertices`] but never offset.
pub fn encode_normals(mesh: &Mesh, transform: &CoordinateTransform) -> String {
    let mut out = String::new();
    let count = mesh.vertices.len();
    for (i, vertex) in mesh.vertices.iter().enumerate() {
        out.push_str(&triplet(transform.transform_normal(vertex.normal)));
        out.push_str(separator(i, count, ",\n", ";\n"));
    }
    out
}

/// Color of corners on faces without colors, and of unused vertices
pub const DEFAULT_COLOR: [u8; 4] = [255; 4];

fn color_line(vertex: u32, color: [u8; 4]) -> String {
    let [r, g, b, a] = color.map(|c| float(c as f32 / 255.0));
    format!("{}; {}; {}; {}; {};;\n", vertex, r, g, b, a)
}

/// `index; r; g; b; a;;` for every vertex, taken from the first face corner
/// that uses the vertex.
///
/// Corners of faces without colors, and vertices no face uses, are opaque
/// white, so the block always holds one line per vertex.
pub fn encode_vertex_colors(mesh: &Mesh) -> String {
    let mut out = String::new();
    let mut written = HashSet::new();

    for face in &mesh.faces {
        for (corner, &vertex) in face.vertices.iter().enumerate() {
            if !written.insert(vertex) {
                continue;
            }
            let color = face
                .colors
                .as_ref()
                .and_then(|colors| colors.get(corner))
                .copied()
                .unwrap_or(DEFAULT_COLOR);
            out.push_str(&color_line(vertex, color));
        }
    }
    for vertex in &mesh.vertices {
        if written.insert(vertex.index) {
            out.push_str(&color_line(vertex.index, DEFAULT_COLOR));
        }
    }
    out
}

/// Vertex count, then one `u; v;` pair per face corner.
///
/// The pair count follows the corners, not the declared vertex count, so the
/// two can differ when faces share vertices. Readers expect this layout.
pub fn encode_texcoords(mesh: &Mesh) -> String {
    let mut out = format!("{};\n", mesh.vertices.len());
    let corners: usize = mesh.faces.iter().map(|f| f.vertices.len()).sum();

    let mut written = 0;
    for face in &mesh.faces {
        for corner in 0..face.vertices.len() {
            let [u, v] = face
                .uvs
                .as_ref()
                .and_then(|uvs| uvs.get(corner))
                .copied()
                .unwrap_or([0.0, 0.0]);
            out.push_str(&format!("{}; {};", float(u), float(v)));
            out.push_str(separator(written, corners, ",\n", ";\n"));
            written += 1;
        }
    }
    out
}
