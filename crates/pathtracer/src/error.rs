use thiserror::Error;

use crate::material::MaterialId;

/// Precondition violations while describing a scene.
///
/// All of them are fatal: the scene under construction is dropped.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("material {material} is not registered (registry holds {count} materials)")]
    UnknownMaterial { material: MaterialId, count: usize },

    #[error("materials are frozen once the acceleration structure has been built")]
    MaterialsFrozen,

    #[error("imported mesh {name:?} has no faces")]
    EmptyMesh { name: String },

    #[error("face {face} of mesh {name:?} has {vertices} vertices, at least 3 are needed")]
    DegenerateFace {
        name: String,
        face: usize,
        vertices: usize,
    },

    #[error("face {face} of mesh {name:?} references vertex {index} out of {count}")]
    FaceOutOfBounds {
        name: String,
        face: usize,
        index: usize,
        count: usize,
    },

    #[error("failed to import mesh {name:?}: {reason}")]
    Import { name: String, reason: String },
}

/// Failures reported by the ray tracing device. None of them is retried.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("device allocation of {bytes} bytes failed: {reason}")]
    Allocation { bytes: usize, reason: String },

    #[error("acceleration structure build failed: {0}")]
    Build(String),

    #[error("launch failed: {0}")]
    Launch(String),

    #[error("unknown device buffer at address {0:#x}")]
    InvalidBuffer(u64),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}
