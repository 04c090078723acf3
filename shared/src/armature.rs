//! Armature snapshot: bone tree and keyframed actions

use glam::Mat4;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Armature {
    /// Bones in scene order. Children are visited in this order.
    pub bones: Vec<Bone>,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Bind pose in armature space
    #[serde(default)]
    pub matrix: Mat4,
}

/// Keyframed animation of an armature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    pub name: String,
    /// Keyframe numbers, strictly increasing
    pub frames: Vec<i32>,
    pub channels: Vec<Channel>,
}

/// Animation of a single bone: one armature-space pose per keyframe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub bone: String,
    pub poses: Vec<Mat4>,
}

impl Bone {
    pub fn new(name: impl Into<String>, parent: Option<&str>, matrix: Mat4) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_owned),
            matrix,
        }
    }
}

impl Armature {
    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name == name)
    }

    /// Bones without a parent. A well-formed armature has exactly one.
    pub fn roots(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter().filter(|b| b.parent.is_none())
    }

    /// Direct children of `name`, in scene order.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Bone> + 'a {
        self.bones
            .iter()
            .filter(move |b| b.parent.as_deref() == Some(name))
    }

    pub fn parent_of(&self, bone: &Bone) -> Option<&Bone> {
        bone.parent.as_deref().and_then(|p| self.bone(p))
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }
}

impl Action {
    pub fn channel(&self, bone: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.bone == bone)
    }

    pub fn has_channel(&self, bone: &str) -> bool {
        self.channel(bone).is_some()
    }

    /// Pose of `bone` at `frame`, holding the latest key at or before it.
    ///
    /// Frames before the first key use the first key. Returns `None` when the
    /// action does not animate the bone.
    pub fn sample(&self, bone: &str, frame: i32) -> Option<Mat4> {
        let channel = self.channel(bone)?;
        let key = match self.frames.partition_point(|&f| f <= frame) {
            0 => 0,
            n => n - 1,
        };
        channel.poses.get(key).copied()
    }
}
