//! Scene compiler and progressive render controller for a triangle-only path tracer.
//!
//! The crate is organised the way data flows through it:
//! - [material] and [geometry] turn a scene description into flat buffers,
//! - [light] extracts light records from emissive geometry,
//! - [accel] and [sbt] prepare what the ray tracing device needs,
//! - [controller] drives one device launch per tick and accumulates the result.
//!
//! The device itself is abstracted behind [device::Device]. [cpu::CpuDevice] is a
//! reference implementation that runs on the host.

pub mod accel;
pub mod camera;
pub mod color;
pub mod controller;
pub mod cpu;
pub mod device;
pub mod error;
pub mod geometry;
pub mod light;
pub mod loader;
pub mod material;
pub mod math;
pub mod output;
pub mod sbt;
pub mod scene;
pub mod utils;

pub use error::{DeviceError, Error, SceneError};
pub use rand_xoshiro::Xoshiro256StarStar as Rng;

/// Identifies one sample batch of one pixel.
///
/// Rendering is deterministic given a seed: the random stream only depends on the pixel,
/// the subframe and the seed.
#[derive(Debug, Copy, Clone, Hash)]
#[repr(C)]
pub struct Seed {
    pub seed: u64,
    pub x: u32,
    pub y: u32,
    pub subframe_index: u32,
}

impl Seed {
    pub fn into_rng(self) -> Rng {
        let mut hasher = std::hash::DefaultHasher::new();
        std::hash::Hash::hash(&self, &mut hasher);
        <Rng as rand::SeedableRng>::seed_from_u64(std::hash::Hasher::finish(&hasher))
    }
}
