//! Export errors
//!
//! Every error aborts the whole export before anything is written to disk.

use std::path::PathBuf;

/// Broad class of an [`ExportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested export cannot be performed with these settings or this selection
    Configuration,
    /// The scene data violates an invariant the .x format relies on
    DataIntegrity,
    /// Writing the finished file failed
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("compressed .x output is not supported yet")]
    CompressionUnsupported,

    #[error("ticks per second must be between 1 and 100, got {0}")]
    TicksOutOfRange(u32),

    #[error(
        "animated export needs exactly one selected mesh and one selected armature \
         (selected: {meshes} meshes, {armatures} armatures)"
    )]
    InvalidSelection { meshes: usize, armatures: usize },

    #[error("armature '{armature}' has no unique root bone ({roots} bones without a parent)")]
    NoUniqueRoot { armature: String, roots: usize },

    #[error("bone '{bone}' in armature '{armature}' has unknown parent '{parent}'")]
    UnknownParent {
        armature: String,
        bone: String,
        parent: String,
    },

    #[error("armature '{armature}' has {count} bones not reachable from root bone '{root}'")]
    DetachedBones {
        armature: String,
        root: String,
        count: usize,
    },

    #[error("singular matrix: cannot invert {what}")]
    SingularMatrix { what: String },

    #[error("face {face} of mesh '{mesh}' references vertex {vertex}, which is not in the mesh")]
    VertexOutOfRange { mesh: String, face: usize, vertex: u32 },

    #[error("face {face} of mesh '{mesh}' has {found} {attribute} for {corners} corners")]
    CornerCount {
        mesh: String,
        face: usize,
        attribute: &'static str,
        found: usize,
        corners: usize,
    },

    #[error("face {face} of mesh '{mesh}' uses material slot {slot}, but the mesh has {count} materials")]
    MaterialOutOfRange {
        mesh: String,
        face: usize,
        slot: usize,
        count: usize,
    },

    #[error("action '{action}' has frame numbers that are not strictly increasing")]
    UnorderedFrames { action: String },

    #[error("action '{action}' has {poses} poses for bone '{bone}' but {frames} keyframes")]
    ChannelLength {
        action: String,
        bone: String,
        poses: usize,
        frames: usize,
    },

    #[error("failed to write {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CompressionUnsupported | Self::TicksOutOfRange(_) | Self::InvalidSelection { .. } => {
                ErrorKind::Configuration
            }
            Self::Io { .. } => ErrorKind::Io,
            _ => ErrorKind::DataIntegrity,
        }
    }
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
