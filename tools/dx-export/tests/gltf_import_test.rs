//! glTF import tests
//!
//! Builds a small skinned glTF (triangle + two-joint skin + one rotation clip)
//! on disk, imports it and exports the result as an animated .x file.

use glam::{Mat4, Vec3};
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use dx_export::{export_scene, load_scene, ExportConfig, ExportMode, SnapshotTimeline};

fn push_f32s(data: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        data.extend_from_slice(&v.to_le_bytes());
    }
}

/// Write `rig.gltf` and its `rig.bin` buffer into `dir`.
fn write_rig(dir: &Path) -> PathBuf {
    let mut bin = Vec::new();

    // 0: positions (36 bytes)
    push_f32s(&mut bin, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0, 0.0]);
    // 36: normals (36 bytes)
    push_f32s(&mut bin, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    // 72: indices (6 bytes + 2 padding)
    for i in [0u16, 1, 2] {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    bin.extend_from_slice(&[0, 0]);
    // 80: joints (12 bytes)
    bin.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]);
    // 92: weights (48 bytes)
    for _ in 0..3 {
        push_f32s(&mut bin, &[1.0, 0.0, 0.0, 0.0]);
    }
    // 140: inverse bind matrices (128 bytes)
    push_f32s(&mut bin, &Mat4::IDENTITY.to_cols_array());
    push_f32s(
        &mut bin,
        &Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)).to_cols_array(),
    );
    // 268: keyframe times (8 bytes)
    push_f32s(&mut bin, &[0.0, 1.0]);
    // 276: rotations (32 bytes)
    let half = std::f32::consts::FRAC_1_SQRT_2;
    push_f32s(&mut bin, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, half, half]);
    assert_eq!(bin.len(), 308);

    std::fs::write(dir.join("rig.bin"), &bin).expect("Failed to write buffer");

    let view = |offset: usize, length: usize| {
        json!({ "buffer": 0, "byteOffset": offset, "byteLength": length })
    };
    let document = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 1] }],
        "nodes": [
            { "name": "Body", "mesh": 0, "skin": 0 },
            { "name": "Root", "children": [2] },
            { "name": "Arm", "translation": [0.0, 1.0, 0.0] }
        ],
        "meshes": [{
            "name": "BodyMesh",
            "primitives": [{
                "attributes": { "POSITION": 0, "NORMAL": 1, "JOINTS_0": 3, "WEIGHTS_0": 4 },
                "indices": 2
            }]
        }],
        "skins": [{ "name": "Rig", "joints": [1, 2], "inverseBindMatrices": 5 }],
        "animations": [{
            "name": "Wave",
            "channels": [{ "sampler": 0, "target": { "node": 2, "path": "rotation" } }],
            "samplers": [{ "input": 6, "output": 7, "interpolation": "LINEAR" }]
        }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 2.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" },
            { "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" },
            { "bufferView": 3, "componentType": 5121, "count": 3, "type": "VEC4" },
            { "bufferView": 4, "componentType": 5126, "count": 3, "type": "VEC4" },
            { "bufferView": 5, "componentType": 5126, "count": 2, "type": "MAT4" },
            { "bufferView": 6, "componentType": 5126, "count": 2, "type": "SCALAR",
              "min": [0.0], "max": [1.0] },
            { "bufferView": 7, "componentType": 5126, "count": 2, "type": "VEC4" }
        ],
        "bufferViews": [
            view(0, 36),
            view(36, 36),
            view(72, 6),
            view(80, 12),
            view(92, 48),
            view(140, 128),
            view(268, 8),
            view(276, 32)
        ],
        "buffers": [{ "uri": "rig.bin", "byteLength": 308 }]
    });

    let path = dir.join("rig.gltf");
    std::fs::write(&path, serde_json::to_string_pretty(&document).unwrap())
        .expect("Failed to write glTF");
    path
}

/// Test glTF -> scene snapshot conversion
#[test]
fn test_import_skinned_gltf() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_rig(dir.path());

    let scene = load_scene(&path, 30.0).expect("Failed to import glTF");
    assert_eq!(scene.objects.len(), 2);
    assert!(scene.objects.iter().all(|obj| obj.selected));

    // Mesh, converted to Z-up
    let body = &scene.objects[0];
    assert_eq!(body.name, "Body");
    let mesh = body.mesh().expect("Body should be a mesh");
    assert_eq!(mesh.vertices.len(), 3);
    assert!(mesh.vertices[2]
        .position
        .abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-6));
    assert!(mesh.vertices[0].normal.abs_diff_eq(Vec3::NEG_Y, 1e-6));
    assert_eq!(mesh.faces.len(), 1);
    assert_eq!(mesh.faces[0].vertices, [0, 1, 2]);
    assert_eq!(mesh.faces[0].material, Some(0));
    assert_eq!(mesh.materials.len(), 1);
    assert_eq!(mesh.materials[0].name, "Default");

    // Joint weights become vertex groups named after the bones
    let root = mesh.group("Root").expect("Root group");
    assert_eq!(root.len(), 2);
    let arm = mesh.group("Arm").expect("Arm group");
    assert_eq!(arm.len(), 1);
    assert_eq!(arm[0].vertex, 2);

    // Armature from the skin
    let rig = &scene.objects[1];
    assert_eq!(rig.name, "Rig");
    let armature = rig.armature().expect("Rig should be an armature");
    assert_eq!(armature.bones.len(), 2);
    let arm_bone = armature.bone("Arm").expect("Arm bone");
    assert_eq!(arm_bone.parent.as_deref(), Some("Root"));
    assert!(arm_bone
        .matrix
        .abs_diff_eq(Mat4::from_translation(Vec3::Z), 1e-6));
    assert!(armature.bone("Root").unwrap().parent.is_none());

    // The clip is sampled at 30 fps and poses every joint
    let action = armature.action("Wave").expect("Wave action");
    assert_eq!(action.frames, [0, 30]);
    assert_eq!(action.channels.len(), 2);
    let poses = &action.channel("Arm").expect("Arm channel").poses;
    assert!(poses[0].abs_diff_eq(arm_bone.matrix, 1e-6));
    assert!(poses[1].w_axis.abs_diff_eq(glam::Vec4::new(0.0, 0.0, 1.0, 1.0), 1e-6));
    assert!(!poses[1].abs_diff_eq(poses[0], 1e-3));
}

/// Test glTF -> animated .x export
#[test]
fn test_gltf_to_animated_x() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_rig(dir.path());
    let scene = load_scene(&path, 30.0).expect("Failed to import glTF");

    let config = ExportConfig {
        mode: ExportMode::Animated,
        ..Default::default()
    };
    let mut timeline = SnapshotTimeline::new();
    let text = export_scene(&scene, &mut timeline, &config)
        .expect("Animated export failed")
        .to_text();

    assert!(text.contains("Frame SwapYZ {\n"));
    assert!(text.contains("Frame Root {\n"));
    assert!(text.contains("Frame Arm {\n"));
    assert!(text.contains("\nMesh Body {\n3;\n"));
    assert!(text.contains("0.000000; 0.000000; 2.000000;;\n"));
    assert!(text.contains("AnimationSet Wave {\n"));
    assert!(text.contains("  { Root }\n"));
    assert!(text.contains("  { Arm }\n"));
    assert!(text.contains("    2;\n    0;16;"));
    assert!(text.contains("    30;16;"));
}

#[test]
fn test_missing_buffer_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_rig(dir.path());
    std::fs::remove_file(dir.path().join("rig.bin")).unwrap();

    let err = load_scene(&path, 30.0).unwrap_err();
    assert!(format!("{:#}", err).contains("rig.gltf"));
}
