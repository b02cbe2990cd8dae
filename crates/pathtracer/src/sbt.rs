//! Shading dispatch table.
//!
//! One hit group record per (material, ray kind), at index `material * RAY_KIND_COUNT + kind`,
//! plus the ray generation record and one miss record per ray kind.
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::{
    device::{Device, DeviceBuffer, ProgramGroup, ProgramHeader, HEADER_SIZE},
    material::{Material, MaterialId, MaterialRegistry},
};

/// Alignment the device requires for records
pub const RECORD_ALIGNMENT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[repr(u32)]
pub enum RayKind {
    #[display("radiance")]
    Radiance = 0,
    #[display("occlusion")]
    Occlusion = 1,
}

pub const RAY_KIND_COUNT: usize = 2;

impl RayKind {
    pub const ALL: [RayKind; RAY_KIND_COUNT] = [RayKind::Radiance, RayKind::Occlusion];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Opaque program header followed by the program's data
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record<T> {
    pub header: ProgramHeader,
    pub data: T,
}

// SAFETY: an all zero header is a valid byte array and T is Zeroable
unsafe impl<T: Zeroable> Zeroable for Record<T> {}

// SAFETY: for each of these payloads the header (32 bytes) is followed by a payload whose size is
// a multiple of 16 with no padding, so the record has no padding either. Checked below.
unsafe impl Pod for Record<HitGroupData> {}
unsafe impl Pod for Record<MissData> {}
unsafe impl Pod for Record<RayGenData> {}

const _: () = assert!(std::mem::size_of::<Record<HitGroupData>>() == HEADER_SIZE + 64);
const _: () = assert!(std::mem::size_of::<Record<MissData>>() == HEADER_SIZE + 16);
const _: () = assert!(std::mem::size_of::<Record<RayGenData>>() == HEADER_SIZE + 16);
const _: () = assert!(std::mem::align_of::<Record<HitGroupData>>() == RECORD_ALIGNMENT);

/// Material payload of a radiance hit group
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct HitGroupData {
    pub emission: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub spec_exp: f32,
    pub ior: f32,
    /// Material kind tag
    pub mat: u32,
    /// Device address of the vertex buffer
    pub vertices: u64,
    pad: [u32; 2],
}

impl HitGroupData {
    pub fn new(material: &Material, vertices: DeviceBuffer) -> Self {
        Self {
            emission: material.emission.to_array(),
            diffuse: material.diffuse.to_array(),
            specular: material.specular.to_array(),
            spec_exp: material.specular_exponent,
            ior: material.ior,
            mat: material.kind.tag(),
            vertices: vertices.address,
            pad: [0; 2],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct MissData {
    pub bg_color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct RayGenData {
    reserved: [u32; 4],
}

#[derive(Debug, Clone)]
pub struct ShaderBindingTable {
    pub raygen: Record<RayGenData>,
    pub miss: [Record<MissData>; RAY_KIND_COUNT],
    pub hit_groups: Vec<Record<HitGroupData>>,
    material_count: usize,
}

impl ShaderBindingTable {
    /// Occlusion records keep an all zero payload: only their program matters.
    pub fn build<D: Device + ?Sized>(
        device: &D,
        materials: &MaterialRegistry,
        vertices: DeviceBuffer,
        background: Vec3,
    ) -> Self {
        let radiance_header = device.pack_header(ProgramGroup::RadianceHit);
        let occlusion_header = device.pack_header(ProgramGroup::OcclusionHit);

        let mut hit_groups = Vec::with_capacity(materials.len() * RAY_KIND_COUNT);
        for (_, material) in materials.iter() {
            hit_groups.push(Record {
                header: radiance_header,
                data: HitGroupData::new(material, vertices),
            });
            hit_groups.push(Record {
                header: occlusion_header,
                data: HitGroupData::zeroed(),
            });
        }

        let miss = |group| Record {
            header: device.pack_header(group),
            data: MissData {
                bg_color: background.extend(0.0).to_array(),
            },
        };

        log::debug!(
            "dispatch table: {} hit group records for {} materials",
            hit_groups.len(),
            materials.len()
        );

        Self {
            raygen: Record {
                header: device.pack_header(ProgramGroup::RayGen),
                data: RayGenData::zeroed(),
            },
            miss: [
                miss(ProgramGroup::RadianceMiss),
                miss(ProgramGroup::OcclusionMiss),
            ],
            hit_groups,
            material_count: materials.len(),
        }
    }

    pub fn material_count(&self) -> usize {
        self.material_count
    }

    pub fn len(&self) -> usize {
        self.hit_groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hit_groups.is_empty()
    }

    pub fn hit_group(&self, material: MaterialId, kind: RayKind) -> Option<&Record<HitGroupData>> {
        self.hit_groups
            .get(material.index() * RAY_KIND_COUNT + kind.index())
    }

    pub fn miss(&self, kind: RayKind) -> &Record<MissData> {
        &self.miss[kind.index()]
    }

    /// Hit group records as laid out in device memory
    pub fn hit_group_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.hit_groups)
    }

    /// Distance in bytes between two hit group records
    pub const fn hit_group_stride() -> usize {
        std::mem::size_of::<Record<HitGroupData>>()
    }
}

#[cfg(test)]
mod tests {
    use bytemuck::Zeroable;
    use glam::Vec3;

    use super::{HitGroupData, RayKind, ShaderBindingTable};
    use crate::{
        device::{mock::MockDevice, DeviceBuffer, ProgramGroup},
        material::{Material, MaterialId, MaterialKind, MaterialRegistry},
    };

    fn registry() -> MaterialRegistry {
        let mut registry = MaterialRegistry::new();
        registry.insert(Material::diffuse(Vec3::new(0.8, 0.1, 0.1))).unwrap();
        registry.insert(Material::emissive(Vec3::splat(15.0))).unwrap();
        registry.insert(Material::glossy(Vec3::ONE, 32.0)).unwrap();
        registry
    }

    #[test]
    fn one_record_per_material_and_ray_kind() {
        let device = MockDevice::default();
        let vertices = DeviceBuffer {
            address: 0xdead_0000,
            len: 36,
        };
        let sbt = ShaderBindingTable::build(&device, &registry(), vertices, Vec3::ZERO);

        assert_eq!(sbt.len(), 6);
        assert_eq!(sbt.material_count(), 3);
        assert_eq!(
            sbt.hit_group_bytes().len(),
            6 * ShaderBindingTable::hit_group_stride()
        );
        assert_eq!(ShaderBindingTable::hit_group_stride() % 16, 0);

        for m in 0..3 {
            let radiance = sbt.hit_group(MaterialId(m), RayKind::Radiance).unwrap();
            assert_eq!(radiance.header[0], ProgramGroup::RadianceHit as u8);
            assert_eq!(radiance.data.vertices, 0xdead_0000);

            let occlusion = sbt.hit_group(MaterialId(m), RayKind::Occlusion).unwrap();
            assert_eq!(occlusion.header[0], ProgramGroup::OcclusionHit as u8);
            assert_eq!(occlusion.data, HitGroupData::zeroed());
        }
        assert!(sbt.hit_group(MaterialId(3), RayKind::Radiance).is_none());
    }

    #[test]
    fn radiance_payload_copies_material() {
        let device = MockDevice::default();
        let sbt = ShaderBindingTable::build(&device, &registry(), DeviceBuffer::NULL, Vec3::ZERO);

        let emissive = sbt.hit_group(MaterialId(1), RayKind::Radiance).unwrap();
        assert_eq!(emissive.data.mat, MaterialKind::Emissive.tag());
        assert_eq!(emissive.data.emission, [15.0; 3]);

        let glossy = sbt.hit_group(MaterialId(2), RayKind::Radiance).unwrap();
        assert_eq!(glossy.data.mat, MaterialKind::Glossy.tag());
        assert_eq!(glossy.data.spec_exp, 32.0);
    }

    #[test]
    fn miss_and_raygen_records() {
        let device = MockDevice::default();
        let sbt = ShaderBindingTable::build(&device, &registry(), DeviceBuffer::NULL, Vec3::ZERO);

        assert_eq!(sbt.raygen.header[0], ProgramGroup::RayGen as u8);
        assert_eq!(sbt.miss(RayKind::Radiance).header[0], ProgramGroup::RadianceMiss as u8);
        assert_eq!(sbt.miss(RayKind::Occlusion).header[0], ProgramGroup::OcclusionMiss as u8);
        assert_eq!(sbt.miss(RayKind::Radiance).data.bg_color, [0.0; 4]);
    }

    #[test]
    fn empty_registry() {
        let device = MockDevice::default();
        let sbt = ShaderBindingTable::build(&device, &MaterialRegistry::new(), DeviceBuffer::NULL, Vec3::ZERO);
        assert!(sbt.is_empty());
    }
}
