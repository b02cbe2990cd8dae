//! Interface to the ray tracing device.
//!
//! The core never looks inside device memory: buffers are addresses and the acceleration
//! structure is whatever the device calls a traversable.
use glam::{Vec3, Vec4};

use crate::{
    error::DeviceError, geometry::Vertex, light::Light, sbt::ShaderBindingTable,
};

/// Size in bytes of the opaque program header of a dispatch record
pub const HEADER_SIZE: usize = 32;

pub type ProgramHeader = [u8; HEADER_SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceBuffer {
    pub address: u64,
    /// Number of elements
    pub len: usize,
}

impl DeviceBuffer {
    pub const NULL: Self = Self { address: 0, len: 0 };
}

#[derive(Debug, Clone, Copy)]
pub struct BuildInput<'a> {
    pub vertex_buffer: DeviceBuffer,
    /// One entry per triangle
    pub material_indices: &'a [u32],
    /// Number of dispatch records per ray kind
    pub material_count: usize,
}

/// Sizes in bytes reported by an acceleration structure build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSizes {
    pub output_size: usize,
    pub compacted_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ProgramGroup {
    #[display("raygen")]
    RayGen,
    #[display("radiance miss")]
    RadianceMiss,
    #[display("occlusion miss")]
    OcclusionMiss,
    #[display("radiance hit")]
    RadianceHit,
    #[display("occlusion hit")]
    OcclusionHit,
}

/// Everything one launch needs
#[derive(Debug, Clone, Copy)]
pub struct LaunchParams<'a, T> {
    pub width: u32,
    pub height: u32,
    pub samples_per_launch: u32,
    pub max_depth: u32,
    pub subframe_index: u32,
    pub seed: u64,
    pub eye: Vec3,
    pub u: Vec3,
    pub v: Vec3,
    pub w: Vec3,
    pub lights: DeviceBuffer,
    pub handle: &'a T,
}

pub trait Device {
    type Traversable;

    fn upload_vertices(&mut self, vertices: &[Vertex]) -> Result<DeviceBuffer, DeviceError>;

    fn upload_lights(&mut self, lights: &[Light]) -> Result<DeviceBuffer, DeviceError>;

    fn accel_build(
        &mut self,
        input: &BuildInput,
    ) -> Result<(Self::Traversable, BuildSizes), DeviceError>;

    /// Consumes the uncompacted structure
    fn accel_compact(
        &mut self,
        traversable: Self::Traversable,
        compacted_size: usize,
    ) -> Result<Self::Traversable, DeviceError>;

    fn pack_header(&self, group: ProgramGroup) -> ProgramHeader;

    /// Trace `samples_per_launch` paths per pixel and write their mean radiance to `batch`,
    /// row major, `width * height` pixels.
    fn launch(
        &mut self,
        params: &LaunchParams<Self::Traversable>,
        sbt: &ShaderBindingTable,
        batch: &mut [Vec4],
    ) -> Result<(), DeviceError>;

    /// Wait for the last launch to complete
    fn synchronize(&mut self) -> Result<(), DeviceError>;
}

#[cfg(test)]
pub(crate) mod mock {
    use glam::Vec4;

    use super::{BuildInput, BuildSizes, Device, DeviceBuffer, LaunchParams, ProgramGroup, ProgramHeader};
    use crate::{error::DeviceError, geometry::Vertex, light::Light, sbt::ShaderBindingTable};

    /// Device that records calls and fills launches with a constant color
    #[derive(Debug, Default)]
    pub(crate) struct MockDevice {
        pub sizes: Option<BuildSizes>,
        pub compactions: usize,
        pub launches: usize,
        pub last_subframe: Option<u32>,
        pub synchronizations: usize,
        pub uploaded_vertices: usize,
        pub uploaded_lights: usize,
        pub color: Vec4,
        pub fail_launch: bool,
    }

    impl Device for MockDevice {
        type Traversable = &'static str;

        fn upload_vertices(&mut self, vertices: &[Vertex]) -> Result<DeviceBuffer, DeviceError> {
            self.uploaded_vertices = vertices.len();
            Ok(DeviceBuffer {
                address: 0x1000,
                len: vertices.len(),
            })
        }

        fn upload_lights(&mut self, lights: &[Light]) -> Result<DeviceBuffer, DeviceError> {
            self.uploaded_lights = lights.len();
            Ok(DeviceBuffer {
                address: 0x2000,
                len: lights.len(),
            })
        }

        fn accel_build(
            &mut self,
            input: &BuildInput,
        ) -> Result<(Self::Traversable, BuildSizes), DeviceError> {
            let triangles = input.material_indices.len();
            let sizes = self.sizes.unwrap_or(BuildSizes {
                output_size: 128 * triangles.max(1),
                compacted_size: 64 * triangles.max(1),
            });
            Ok(("original", sizes))
        }

        fn accel_compact(
            &mut self,
            _traversable: Self::Traversable,
            _compacted_size: usize,
        ) -> Result<Self::Traversable, DeviceError> {
            self.compactions += 1;
            Ok("compacted")
        }

        fn pack_header(&self, group: ProgramGroup) -> ProgramHeader {
            let mut header = [0xff; 32];
            header[0] = group as u8;
            header
        }

        fn launch(
            &mut self,
            params: &LaunchParams<Self::Traversable>,
            _sbt: &ShaderBindingTable,
            batch: &mut [Vec4],
        ) -> Result<(), DeviceError> {
            if self.fail_launch {
                return Err(DeviceError::Launch("mock failure".into()));
            }
            assert_eq!(batch.len(), (params.width * params.height) as usize);
            self.launches += 1;
            self.last_subframe = Some(params.subframe_index);
            batch.fill(self.color);
            Ok(())
        }

        fn synchronize(&mut self) -> Result<(), DeviceError> {
            self.synchronizations += 1;
            Ok(())
        }
    }
}
