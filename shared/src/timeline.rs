//! Host animation clock
//!
//! Pose queries depend on a scene-wide "current frame" and on which action is
//! active. Both are side-effecting host state, so they live behind a trait
//! instead of inside the read-only snapshot.

use glam::Mat4;

use crate::armature::{Armature, Bone};

/// The host scene's animation clock and pose evaluator.
pub trait Timeline {
    fn current_frame(&self) -> i32;

    fn set_current_frame(&mut self, frame: i32);

    /// Make `action` drive pose queries, or fall back to the bind pose with `None`.
    fn set_active_action(&mut self, action: Option<&str>);

    /// Armature-space pose of `bone` at the current frame.
    fn pose_matrix(&self, armature: &Armature, bone: &Bone) -> Mat4;
}

/// Timeline evaluated from the keyframes stored in a scene snapshot.
///
/// Bones not animated by the active action stay in their bind pose.
#[derive(Debug, Clone, Default)]
pub struct SnapshotTimeline {
    frame: i32,
    action: Option<String>,
}

impl SnapshotTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

impl Timeline for SnapshotTimeline {
    fn current_frame(&self) -> i32 {
        self.frame
    }

    fn set_current_frame(&mut self, frame: i32) {
        self.frame = frame;
    }

    fn set_active_action(&mut self, action: Option<&str>) {
        self.action = action.map(str::to_owned);
    }

    fn pose_matrix(&self, armature: &Armature, bone: &Bone) -> Mat4 {
        self.action
            .as_deref()
            .and_then(|name| armature.action(name))
            .and_then(|action| action.sample(&bone.name, self.frame))
            .unwrap_or(bone.matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armature::{Action, Channel};
    use glam::Vec3;

    #[test]
    fn test_pose_falls_back_to_bind() {
        let bind = Mat4::from_translation(Vec3::Z);
        let keyed = Mat4::from_translation(Vec3::X);
        let armature = Armature {
            bones: vec![
                Bone::new("Root", None, bind),
                Bone::new("Tail", Some("Root"), bind),
            ],
            actions: vec![Action {
                name: "Wag".into(),
                frames: vec![0, 5],
                channels: vec![Channel {
                    bone: "Root".into(),
                    poses: vec![keyed, keyed],
                }],
            }],
        };
        let root = &armature.bones[0];
        let tail = &armature.bones[1];

        let mut timeline = SnapshotTimeline::new();
        assert_eq!(timeline.pose_matrix(&armature, root), bind);

        timeline.set_active_action(Some("Wag"));
        timeline.set_current_frame(5);
        assert_eq!(timeline.current_frame(), 5);
        assert_eq!(timeline.active_action(), Some("Wag"));
        assert_eq!(timeline.pose_matrix(&armature, root), keyed);
        assert_eq!(timeline.pose_matrix(&armature, tail), bind);

        timeline.set_active_action(Some("Missing"));
        assert_eq!(timeline.pose_matrix(&armature, root), bind);
    }
}
