//! Host implementation of [Device].
//!
//! Device memory is a map from fake addresses to host allocations. Launches run one rayon task
//! per image row.
pub mod bvh;
mod shading;

use std::collections::HashMap;

use glam::{Vec3, Vec4};
use rand::{distributions::Uniform, prelude::Distribution};
use rayon::prelude::{IndexedParallelIterator, ParallelIterator, ParallelSliceMut};

use crate::{
    device::{
        BuildInput, BuildSizes, Device, DeviceBuffer, LaunchParams, ProgramGroup, ProgramHeader,
        HEADER_SIZE,
    },
    error::DeviceError,
    geometry::{Triangle, Vertex},
    light::Light,
    sbt::{RayKind, ShaderBindingTable},
    Seed,
};
use bvh::Bvh;
use shading::Shading;

/// Header magic, followed by the program group
const HEADER_MAGIC: &[u8; 4] = b"cpu\0";

#[derive(Debug)]
enum Allocation {
    Vertices(Vec<Vertex>),
    Lights(Vec<Light>),
}

/// Acceleration structure of the host device
#[derive(Debug)]
pub struct CpuTraversable {
    bvh: Bvh,
    material_indices: Vec<u32>,
}

impl CpuTraversable {
    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }
}

#[derive(Debug, Default)]
pub struct CpuDevice {
    memory: HashMap<u64, Allocation>,
    next_address: u64,
}

impl CpuDevice {
    /// Allocations are aligned on this
    const ALIGNMENT: u64 = 256;

    pub fn new() -> Self {
        Self {
            memory: HashMap::new(),
            next_address: Self::ALIGNMENT,
        }
    }

    fn allocate(&mut self, bytes: usize, allocation: Allocation) -> Result<u64, DeviceError> {
        let address = self.next_address.max(Self::ALIGNMENT);
        let size = (bytes as u64).max(1).div_ceil(Self::ALIGNMENT) * Self::ALIGNMENT;
        self.next_address = address.checked_add(size).ok_or(DeviceError::Allocation {
            bytes,
            reason: "address space exhausted".into(),
        })?;
        self.memory.insert(address, allocation);
        log::debug!("allocated {bytes} bytes at {address:#x}");
        Ok(address)
    }

    fn vertices(&self, buffer: DeviceBuffer) -> Result<&[Vertex], DeviceError> {
        match self.memory.get(&buffer.address) {
            Some(Allocation::Vertices(v)) => Ok(v),
            _ => Err(DeviceError::InvalidBuffer(buffer.address)),
        }
    }

    fn lights(&self, buffer: DeviceBuffer) -> Result<&[Light], DeviceError> {
        match self.memory.get(&buffer.address) {
            Some(Allocation::Lights(l)) => Ok(l),
            _ => Err(DeviceError::InvalidBuffer(buffer.address)),
        }
    }
}

impl Device for CpuDevice {
    type Traversable = CpuTraversable;

    fn upload_vertices(&mut self, vertices: &[Vertex]) -> Result<DeviceBuffer, DeviceError> {
        let address = self.allocate(
            std::mem::size_of_val(vertices),
            Allocation::Vertices(vertices.to_vec()),
        )?;
        Ok(DeviceBuffer {
            address,
            len: vertices.len(),
        })
    }

    fn upload_lights(&mut self, lights: &[Light]) -> Result<DeviceBuffer, DeviceError> {
        let address = self.allocate(
            std::mem::size_of_val(lights),
            Allocation::Lights(lights.to_vec()),
        )?;
        Ok(DeviceBuffer {
            address,
            len: lights.len(),
        })
    }

    fn accel_build(
        &mut self,
        input: &BuildInput,
    ) -> Result<(Self::Traversable, BuildSizes), DeviceError> {
        let vertices = self.vertices(input.vertex_buffer)?;
        if vertices.len() != 3 * input.material_indices.len() {
            return Err(DeviceError::Build(format!(
                "{} vertices for {} triangles",
                vertices.len(),
                input.material_indices.len()
            )));
        }
        if let Some(&m) = input
            .material_indices
            .iter()
            .find(|&&m| m as usize >= input.material_count)
        {
            return Err(DeviceError::Build(format!(
                "material index {m} out of {} records",
                input.material_count
            )));
        }

        let triangles: Vec<Triangle> = vertices
            .chunks_exact(3)
            .map(|v| [v[0].position(), v[1].position(), v[2].position()])
            .collect();
        let bvh = Bvh::build(&triangles);
        log::debug!(
            "bvh: {} triangles in {} nodes",
            bvh.len(),
            bvh.node_count()
        );

        let sizes = BuildSizes {
            output_size: bvh.allocated_size(),
            compacted_size: bvh.used_size(),
        };
        let traversable = CpuTraversable {
            bvh,
            material_indices: input.material_indices.to_vec(),
        };
        Ok((traversable, sizes))
    }

    fn accel_compact(
        &mut self,
        mut traversable: Self::Traversable,
        compacted_size: usize,
    ) -> Result<Self::Traversable, DeviceError> {
        traversable.bvh.compact();
        log::trace!(
            "bvh compacted to {} bytes, {compacted_size} requested",
            traversable.bvh.allocated_size()
        );
        Ok(traversable)
    }

    fn pack_header(&self, group: ProgramGroup) -> ProgramHeader {
        let mut header = [0; HEADER_SIZE];
        header[..4].copy_from_slice(HEADER_MAGIC);
        header[4] = group as u8;
        header
    }

    fn launch(
        &mut self,
        params: &LaunchParams<Self::Traversable>,
        sbt: &ShaderBindingTable,
        batch: &mut [Vec4],
    ) -> Result<(), DeviceError> {
        let (width, height) = (params.width as usize, params.height as usize);
        if batch.len() != width * height {
            return Err(DeviceError::Launch(format!(
                "output holds {} pixels, {width}x{height} expected",
                batch.len()
            )));
        }
        if sbt.raygen.header[..4] != HEADER_MAGIC[..] {
            return Err(DeviceError::Launch(
                "dispatch table headers were not packed by this device".into(),
            ));
        }

        let lights = if params.lights.len == 0 {
            &[][..]
        } else {
            self.lights(params.lights)?
        };
        let materials: Vec<_> = (0..sbt.material_count())
            .filter_map(|m| {
                sbt.hit_group(crate::material::MaterialId(m as u32), RayKind::Radiance)
            })
            .map(|record| record.data)
            .collect();
        let background = Vec3::from_slice(&sbt.miss(RayKind::Radiance).data.bg_color[..3]);

        let shading = Shading {
            bvh: &params.handle.bvh,
            material_indices: &params.handle.material_indices,
            materials: &materials,
            lights,
            background,
            max_depth: params.max_depth,
        };

        let samples = params.samples_per_launch.max(1);
        batch
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let uniform = Uniform::new(0.0f32, 1.0);
                for (x, pixel) in row.iter_mut().enumerate() {
                    let mut rng = Seed {
                        seed: params.seed,
                        x: x as u32,
                        y: y as u32,
                        subframe_index: params.subframe_index,
                    }
                    .into_rng();

                    let mut sum = Vec3::ZERO;
                    for _ in 0..samples {
                        // Row 0 is the top of the image
                        let dx = 2.0 * (x as f32 + uniform.sample(&mut rng)) / width as f32 - 1.0;
                        let dy = 1.0 - 2.0 * (y as f32 + uniform.sample(&mut rng)) / height as f32;
                        let direction = (dx * params.u + dy * params.v + params.w).normalize();
                        sum += shading.radiance(params.eye, direction, &mut rng);
                    }
                    *pixel = (sum / samples as f32).extend(1.0);
                }
            });
        Ok(())
    }

    fn synchronize(&mut self) -> Result<(), DeviceError> {
        // Launches are blocking
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec3, Vec4};

    use super::CpuDevice;
    use crate::{
        camera::Camera,
        controller::{EventQueue, RenderController, RenderOptions},
        device::{BuildInput, Device, DeviceBuffer},
        error::DeviceError,
        geometry::{ShapeKind, Vertex},
        material::Material,
        math::Transform,
        scene::SceneBuilder,
    };

    fn lit_scene() -> SceneBuilder {
        let mut builder = SceneBuilder::new();
        let white = builder.add_material(Material::diffuse(Vec3::splat(0.8))).unwrap();
        let light = builder.add_material(Material::emissive(Vec3::splat(10.0))).unwrap();
        builder
            .add_geometry(
                ShapeKind::Cube,
                white,
                Transform::new(Vec3::new(0.0, -1.0, 0.0), Vec3::ZERO, Vec3::new(20.0, 1.0, 20.0)),
                None,
            )
            .unwrap();
        builder
            .add_geometry(ShapeKind::icosphere(), white, Transform::from_translation(Vec3::Y), None)
            .unwrap();
        builder
            .add_geometry(
                ShapeKind::PointLight,
                light,
                Transform::from_translation(Vec3::new(0.0, 6.0, 4.0)),
                None,
            )
            .unwrap();
        builder
    }

    #[test]
    fn renders_a_lit_scene() {
        let mut device = CpuDevice::new();
        let scene = lit_scene().build(&mut device).unwrap();
        assert!(scene.acceleration_structure().compacted);

        let camera = Camera {
            eye: Vec3::new(0.0, 2.0, 8.0),
            look_at: Vec3::new(0.0, 0.5, 0.0),
            ..Default::default()
        };
        let mut controller = RenderController::new(
            camera,
            16,
            12,
            RenderOptions {
                samples_per_launch: 2,
                ..Default::default()
            },
        );
        let mut events = EventQueue::new();
        controller.tick(&mut device, &scene, &mut events).unwrap();
        controller.tick(&mut device, &scene, &mut events).unwrap();

        let pixels = controller.accumulation().pixels();
        assert_eq!(pixels.len(), 16 * 12);
        assert!(pixels.iter().all(|p| p.is_finite()));
        // The center sees the lit sphere, the top corner the black background
        let center = controller.accumulation().pixel(8, 6).unwrap();
        assert!(center.truncate().max_element() > 0.0, "{center}");
        assert_eq!(controller.accumulation().pixel(0, 0).unwrap(), Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn rendering_is_deterministic() {
        let render = || {
            let mut device = CpuDevice::new();
            let scene = lit_scene().build(&mut device).unwrap();
            let mut controller =
                RenderController::new(Camera::default(), 8, 8, RenderOptions::default());
            controller
                .tick(&mut device, &scene, &mut EventQueue::new())
                .unwrap();
            controller.accumulation().pixels().to_vec()
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn unknown_buffers_are_rejected() {
        let mut device = CpuDevice::new();
        let input = BuildInput {
            vertex_buffer: DeviceBuffer {
                address: 0x42,
                len: 3,
            },
            material_indices: &[0],
            material_count: 1,
        };
        assert!(matches!(
            device.accel_build(&input),
            Err(DeviceError::InvalidBuffer(0x42))
        ));
    }

    #[test]
    fn build_checks_material_indices() {
        let mut device = CpuDevice::new();
        let vertex_buffer = device
            .upload_vertices(&[Vertex::new(Vec3::ZERO), Vertex::new(Vec3::X), Vertex::new(Vec3::Y)])
            .unwrap();
        let input = BuildInput {
            vertex_buffer,
            material_indices: &[1],
            material_count: 1,
        };
        assert!(matches!(device.accel_build(&input), Err(DeviceError::Build(_))));
    }

    #[test]
    fn distinct_addresses() {
        let mut device = CpuDevice::new();
        let a = device.upload_lights(&[]).unwrap();
        let b = device.upload_vertices(&[Vertex::default(); 100]).unwrap();
        let c = device.upload_lights(&[]).unwrap();
        assert_ne!(a.address, b.address);
        assert!(c.address >= b.address + 1600);
        assert_eq!(b.address % 256, 0);
    }
}
