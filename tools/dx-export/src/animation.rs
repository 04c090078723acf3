//! Animation encoder: bone frame hierarchy and keyframe tracks
//!
//! Poses are read from the host [`Timeline`] at its current frame, so
//! sampling an action moves the host's frame cursor. Every animated export
//! holds a [`FrameCursor`], which puts the cursor back on frame 0 when it is
//! dropped, on success and on error alike.

use glam::Mat4;
use std::ops::{Deref, DerefMut};

use crate::config::{ExportConfig, ExportMode};
use crate::coords::swap_yz_frame;
use crate::error::{ExportError, Result};
use crate::formats::{flat_matrix, frame_transform_matrix, separator, validate_name};
use crate::mesh::encode_mesh;
use crate::skeleton::{invert, Skeleton};
use crate::xfile::XFile;
use dxport_shared::{Action, Armature, Bone, Mesh, Timeline};

/// Transform type tag of a full 4x4 matrix key
const MATRIX_KEY: u32 = 4;

/// Scoped access to the timeline's frame cursor.
///
/// Dropping the cursor sets the timeline back to frame 0.
pub struct FrameCursor<'t, T: Timeline + ?Sized> {
    timeline: &'t mut T,
}

impl<'t, T: Timeline + ?Sized> FrameCursor<'t, T> {
    pub fn new(timeline: &'t mut T) -> Self {
        Self { timeline }
    }

    pub fn seek(&mut self, frame: i32) {
        self.timeline.set_current_frame(frame);
    }
}

impl<T: Timeline + ?Sized> Deref for FrameCursor<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.timeline
    }
}

impl<T: Timeline + ?Sized> DerefMut for FrameCursor<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.timeline
    }
}

impl<T: Timeline + ?Sized> Drop for FrameCursor<'_, T> {
    fn drop(&mut self) {
        self.timeline.set_current_frame(0);
    }
}

/// Pose of `bone` relative to its parent's current pose.
///
/// The root bone has no parent and is taken relative to identity.
pub fn combine_animation_matrices<T: Timeline + ?Sized>(
    armature: &Armature,
    bone: &Bone,
    timeline: &T,
) -> Result<Mat4> {
    let pose = timeline.pose_matrix(armature, bone);
    let Some(parent) = armature.parent_of(bone) else {
        return Ok(pose);
    };

    let parent_pose = timeline.pose_matrix(armature, parent);
    let parent_inverse = invert(&parent_pose, || {
        format!(
            "pose of bone '{}' (parent of '{}') at frame {}",
            parent.name,
            bone.name,
            timeline.current_frame()
        )
    })?;
    Ok(parent_inverse * pose)
}

/// Nested `Frame` blocks for `bone` and all its descendants.
pub fn emit_frame_hierarchy<T: Timeline + ?Sized>(
    skeleton: &Skeleton,
    bone: &Bone,
    timeline: &T,
) -> Result<String> {
    let matrix = combine_animation_matrices(skeleton.armature, bone, timeline)?;

    let mut out = format!("Frame {} {{\n", validate_name(&bone.name));
    out.push_str(&frame_transform_matrix(&matrix));
    for child in skeleton.armature.children(&bone.name) {
        out.push_str(&emit_frame_hierarchy(skeleton, child, timeline)?);
    }
    out.push_str("}\n");
    Ok(out)
}

/// Check that an action can be sampled key by key.
pub fn validate_action(action: &Action) -> Result<()> {
    if action.frames.windows(2).any(|w| w[0] >= w[1]) {
        return Err(ExportError::UnorderedFrames {
            action: action.name.clone(),
        });
    }
    for channel in &action.channels {
        if channel.poses.len() != action.frames.len() {
            return Err(ExportError::ChannelLength {
                action: action.name.clone(),
                bone: channel.bone.clone(),
                poses: channel.poses.len(),
                frames: action.frames.len(),
            });
        }
    }
    Ok(())
}

/// `Animation` block for one bone: one matrix key per action frame.
///
/// Moves the cursor to every keyframe of the action.
pub fn encode_animation_track<T: Timeline + ?Sized>(
    armature: &Armature,
    bone: &Bone,
    action: &Action,
    cursor: &mut FrameCursor<'_, T>,
) -> Result<String> {
    let count = action.frames.len();
    let mut out = format!(
        "\nAnimation {{\n  AnimationKey {{\n    {};\n    {};\n",
        MATRIX_KEY, count
    );

    for (i, &frame) in action.frames.iter().enumerate() {
        cursor.seek(frame);
        let matrix = combine_animation_matrices(armature, bone, &**cursor)?;
        out.push_str(&format!(
            "    {};16;{}{}",
            frame,
            flat_matrix(&matrix),
            separator(i, count, ",\n", ";\n")
        ));
    }

    out.push_str(&format!("  }}\n  {{ {} }}\n}}\n", validate_name(&bone.name)));
    Ok(out)
}

/// `AnimationSet` block with one track per bone the action animates.
pub fn encode_animation_set<T: Timeline + ?Sized>(
    skeleton: &Skeleton,
    action: &Action,
    cursor: &mut FrameCursor<'_, T>,
) -> Result<String> {
    cursor.set_active_action(Some(action.name.as_str()));

    let mut out = format!("AnimationSet {} {{\n", validate_name(&action.name));
    let mut tracks = 0;
    for bone in &skeleton.bones {
        if !action.has_channel(&bone.name) || action.frames.is_empty() {
            tracing::debug!(
                "Action '{}' does not animate bone '{}', skipping",
                action.name,
                bone.name
            );
            continue;
        }
        out.push_str(&encode_animation_track(skeleton.armature, bone, action, cursor)?);
        tracks += 1;
    }
    out.push_str("}\n");

    cursor.seek(0);
    tracing::info!(
        "Action '{}': {} tracks, {} keyframes",
        action.name,
        tracks,
        action.frames.len()
    );
    Ok(out)
}

/// Skinned mesh, its bone hierarchy and every action of the armature.
///
/// With `swap_y_z` the whole hierarchy sits in a `SwapYZ` frame; the mesh
/// itself keeps its axes inside an identity container frame.
pub fn write_animated_mesh<T: Timeline + ?Sized>(
    xfile: &mut XFile,
    mesh_name: &str,
    mesh: &Mesh,
    skeleton: &Skeleton,
    cursor: &mut FrameCursor<'_, T>,
    config: &ExportConfig,
) -> Result<()> {
    let config = ExportConfig {
        mode: ExportMode::Animated,
        ..config.clone()
    };
    for action in &skeleton.armature.actions {
        validate_action(action)?;
    }

    tracing::info!(
        "Exporting mesh '{}' with armature '{}' ({} bones, {} actions)",
        mesh_name,
        skeleton.name,
        skeleton.bones.len(),
        skeleton.armature.actions.len()
    );

    if config.swap_y_z {
        xfile.push("Frame SwapYZ {\n");
        xfile.push(frame_transform_matrix(&swap_yz_frame()));
    }

    xfile.push(emit_frame_hierarchy(skeleton, skeleton.root, &**cursor)?);

    xfile.push(format!("Frame Container_{} {{\n", validate_name(mesh_name)));
    xfile.push(frame_transform_matrix(&Mat4::IDENTITY));
    xfile.push(encode_mesh(mesh_name, mesh, &config, Some(skeleton))?);
    xfile.push("}\n");

    if config.swap_y_z {
        xfile.push("}\n");
    }

    xfile.push(format!(
        "\nAnimTicksPerSecond {{\n  {};\n}}\n",
        config.ticks_per_second
    ));

    for action in &skeleton.armature.actions {
        xfile.push(encode_animation_set(skeleton, action, cursor)?);
    }
    Ok(())
}
