//! Scene loaders (JSON snapshot, glTF/GLB)

pub mod gltf;

use anyhow::{bail, Context, Result};
use std::path::Path;

use dxport_shared::Scene;

pub use self::gltf::{import_scene, DEFAULT_FRAME_RATE};

/// Load a scene snapshot, picking the loader from the file extension.
///
/// `frame_rate` only applies to glTF animations.
pub fn load_scene(input: &Path, frame_rate: f32) -> Result<Scene> {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "json" => load_json(input),
        "gltf" | "glb" => import_scene(input, frame_rate),
        _ => bail!(
            "Unsupported scene format: {:?} (expected .json, .gltf or .glb)",
            input
        ),
    }
}

/// Read a scene snapshot serialized as JSON.
pub fn load_json(input: &Path) -> Result<Scene> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read scene: {:?}", input))?;
    let scene: Scene = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse scene: {:?}", input))?;
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_json_scene() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.JSON");
        std::fs::write(
            &path,
            r#"{
                "objects": [{
                    "name": "Tri",
                    "data": {
                        "type": "mesh",
                        "vertices": [
                            { "index": 0, "position": [0, 0, 0] },
                            { "index": 1, "position": [1, 0, 0] },
                            { "index": 2, "position": [0, 1, 0] }
                        ],
                        "faces": [{ "vertices": [0, 1, 2] }]
                    }
                }]
            }"#,
        )
        .unwrap();

        let scene = load_scene(&path, DEFAULT_FRAME_RATE).unwrap();
        let mesh = scene.objects[0].mesh().unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.faces[0].vertices, [0, 1, 2]);
    }

    #[test]
    fn test_unknown_extension() {
        let err = load_scene(Path::new("model.fbx"), DEFAULT_FRAME_RATE).unwrap_err();
        assert!(err.to_string().contains("Unsupported scene format"));
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_scene(&path, DEFAULT_FRAME_RATE).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }
}
