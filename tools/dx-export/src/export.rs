//! Export orchestration: mode selection and chunk order

use std::path::{Path, PathBuf};

use crate::animation::{write_animated_mesh, FrameCursor};
use crate::config::{ExportConfig, ExportMode};
use crate::error::{ExportError, Result};
use crate::mesh::encode_mesh;
use crate::skeleton::Skeleton;
use crate::xfile::XFile;
use dxport_shared::{Armature, Mesh, ObjectData, Scene, SceneObject, Timeline};

/// Serialize `scene` into an in-memory .x document.
///
/// Nothing is written anywhere; on error the partial document is dropped.
/// Animated exports leave the timeline on frame 0, whether they succeed or not.
pub fn export_scene<T: Timeline + ?Sized>(
    scene: &Scene,
    timeline: &mut T,
    config: &ExportConfig,
) -> Result<XFile> {
    config.validate()?;
    let mut xfile = XFile::new();

    match config.mode {
        ExportMode::All | ExportMode::Selected => {
            let meshes: Vec<_> = scene
                .meshes()
                .filter(|(obj, _)| config.mode == ExportMode::All || obj.selected)
                .collect();
            if meshes.is_empty() {
                tracing::warn!("No meshes to export");
            }
            for (obj, mesh) in meshes {
                xfile.push(encode_mesh(&obj.name, mesh, config, None)?);
            }
        }
        ExportMode::Animated => {
            let mut cursor = FrameCursor::new(timeline);
            let ((mesh_obj, mesh), (armature_obj, armature)) = animated_selection(scene)?;
            let skeleton = Skeleton::new(&armature_obj.name, armature)?;
            write_animated_mesh(&mut xfile, &mesh_obj.name, mesh, &skeleton, &mut cursor, config)?;
        }
    }

    Ok(xfile)
}

type Selected<'a, T> = (&'a SceneObject, &'a T);

/// The single selected mesh and the single selected armature.
fn animated_selection(scene: &Scene) -> Result<(Selected<'_, Mesh>, Selected<'_, Armature>)> {
    let meshes: Vec<_> = scene
        .selected()
        .filter_map(|obj| obj.mesh().map(|m| (obj, m)))
        .collect();
    let armatures: Vec<_> = scene
        .selected()
        .filter_map(|obj| obj.armature().map(|a| (obj, a)))
        .collect();

    match (meshes.as_slice(), armatures.as_slice()) {
        ([mesh], [armature]) => Ok((*mesh, *armature)),
        _ => Err(ExportError::InvalidSelection {
            meshes: meshes.len(),
            armatures: armatures.len(),
        }),
    }
}

/// Export `scene` and commit the result to `path` (given a `.x` extension).
///
/// The file is only created once the whole document has been built.
pub fn export_to_file<T: Timeline + ?Sized>(
    scene: &Scene,
    timeline: &mut T,
    config: &ExportConfig,
    path: &Path,
) -> Result<PathBuf> {
    let xfile = export_scene(scene, timeline, config)?;
    xfile.save(path)
}

/// Log the scene's objects, bones and actions.
pub fn list_scene(scene: &Scene) {
    if scene.objects.is_empty() {
        tracing::info!("Scene is empty");
        return;
    }

    tracing::info!("Objects:");
    for (i, obj) in scene.objects.iter().enumerate() {
        let marker = if obj.selected { "*" } else { " " };
        match &obj.data {
            ObjectData::Mesh(mesh) => tracing::info!(
                "  [{}]{} Mesh '{}': {} vertices, {} faces, {} materials",
                i,
                marker,
                obj.name,
                mesh.vertices.len(),
                mesh.faces.len(),
                mesh.materials.len()
            ),
            ObjectData::Armature(armature) => {
                tracing::info!(
                    "  [{}]{} Armature '{}': {} bones",
                    i,
                    marker,
                    obj.name,
                    armature.bones.len()
                );
                for bone in &armature.bones {
                    tracing::info!(
                        "        bone '{}' (parent: {})",
                        bone.name,
                        bone.parent.as_deref().unwrap_or("-")
                    );
                }
                for action in &armature.actions {
                    tracing::info!(
                        "        action '{}': {} keyframes, {} channels",
                        action.name,
                        action.frames.len(),
                        action.channels.len()
                    );
                }
            }
            ObjectData::Other => tracing::info!("  [{}]{} '{}'", i, marker, obj.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use dxport_shared::{Action, Bone, Channel, Face, SnapshotTimeline, Vertex};
    use glam::{Mat4, Vec3};

    fn triangle() -> Mesh {
        Mesh {
            vertices: (0..3)
                .map(|i| Vertex {
                    index: i,
                    position: Vec3::new(i as f32, 1.0, 2.0),
                    normal: Vec3::Y,
                })
                .collect(),
            faces: vec![Face {
                vertices: vec![0, 1, 2],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn rig() -> Armature {
        Armature {
            bones: vec![
                Bone::new("Root", None, Mat4::IDENTITY),
                Bone::new("Child", Some("Root"), Mat4::from_translation(Vec3::Z)),
            ],
            actions: vec![Action {
                name: "Idle".into(),
                frames: vec![0, 10],
                channels: vec![Channel {
                    bone: "Child".into(),
                    poses: vec![Mat4::from_translation(Vec3::Z); 2],
                }],
            }],
        }
    }

    fn object(name: &str, selected: bool, data: ObjectData) -> SceneObject {
        SceneObject {
            name: name.into(),
            selected,
            data,
        }
    }

    fn scene() -> Scene {
        Scene {
            objects: vec![
                object("Cube", true, ObjectData::Mesh(triangle())),
                object("Plane", false, ObjectData::Mesh(triangle())),
                object("Rig", true, ObjectData::Armature(rig())),
                object("Lamp", true, ObjectData::Other),
            ],
        }
    }

    fn export(scene: &Scene, config: &ExportConfig) -> Result<String> {
        let mut timeline = SnapshotTimeline::new();
        export_scene(scene, &mut timeline, config).map(|x| x.to_text())
    }

    #[test]
    fn test_all_and_selected_modes() {
        let all = export(&scene(), &ExportConfig::default()).unwrap();
        assert!(all.starts_with("xof 0303txt 0032\n\n"));
        assert!(all.contains("\nMesh Cube {\n"));
        assert!(all.contains("\nMesh Plane {\n"));

        let config = ExportConfig {
            mode: ExportMode::Selected,
            ..Default::default()
        };
        let selected = export(&scene(), &config).unwrap();
        assert!(selected.contains("\nMesh Cube {\n"));
        assert!(!selected.contains("Plane"));
    }

    #[test]
    fn test_swap_is_mode_exclusive() {
        let text = export(&scene(), &ExportConfig::default()).unwrap();
        assert!(!text.contains("SwapYZ"));
        assert!(text.contains("1.000000; 2.000000; 1.000000;,\n"));

        let config = ExportConfig {
            mode: ExportMode::Animated,
            ..Default::default()
        };
        let text = export(&scene(), &config).unwrap();
        assert_eq!(text.matches("Frame SwapYZ {\n").count(), 1);
        assert!(text.contains("1.000000; 1.000000; 2.000000;,\n"));
        assert!(text.contains("0.000000; 1.000000; 0.000000;,\n"));
    }

    #[test]
    fn test_invalid_animated_selection() {
        let config = ExportConfig {
            mode: ExportMode::Animated,
            ..Default::default()
        };

        let mut no_armature = scene();
        no_armature.objects[2].selected = false;
        let mut two_armatures = scene();
        two_armatures
            .objects
            .push(object("Rig2", true, ObjectData::Armature(rig())));
        let mut two_meshes = scene();
        two_meshes.objects[1].selected = true;

        for scene in [no_armature, two_armatures, two_meshes] {
            let mut timeline = SnapshotTimeline::new();
            timeline.set_current_frame(7);
            let err = export_scene(&scene, &mut timeline, &config).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration);
            assert_eq!(timeline.current_frame(), 0);
        }
    }

    #[test]
    fn test_two_root_bones_abort() {
        let mut scene = scene();
        if let ObjectData::Armature(rig) = &mut scene.objects[2].data {
            rig.bones[1].parent = None;
        }
        let config = ExportConfig {
            mode: ExportMode::Animated,
            ..Default::default()
        };
        let err = export(&scene, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataIntegrity);
        assert!(err.to_string().contains("no unique root bone"));
    }

    #[test]
    fn test_cursor_back_at_zero_after_export() {
        let config = ExportConfig {
            mode: ExportMode::Animated,
            ..Default::default()
        };
        let mut timeline = SnapshotTimeline::new();
        timeline.set_current_frame(42);
        let xfile = export_scene(&scene(), &mut timeline, &config).unwrap();
        assert!(!xfile.is_empty());
        assert_eq!(timeline.current_frame(), 0);
    }

    #[test]
    fn test_configuration_errors() {
        let config = ExportConfig {
            compressed: true,
            ..Default::default()
        };
        assert!(matches!(
            export(&scene(), &config),
            Err(ExportError::CompressionUnsupported)
        ));
    }

    #[test]
    fn test_failed_export_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.x");
        let mut scene = scene();
        if let ObjectData::Mesh(mesh) = &mut scene.objects[0].data {
            mesh.faces[0].vertices.push(99);
        }

        let mut timeline = SnapshotTimeline::new();
        let err = export_to_file(&scene, &mut timeline, &ExportConfig::default(), &path)
            .unwrap_err();
        assert!(err.to_string().contains("Cube"));
        assert!(!path.exists());

        let written = export_to_file(
            &self::scene(),
            &mut timeline,
            &ExportConfig::default(),
            &dir.path().join("good"),
        )
        .unwrap();
        assert_eq!(written, dir.path().join("good.x"));
        assert!(written.exists());
    }
}
