pub mod examples;

use std::collections::HashMap;

use glam::Vec3;

use crate::{
    accel::{build_acceleration_structure, AccelerationStructure},
    color::index_color,
    device::{BuildInput, Device, DeviceBuffer},
    error::{Error, SceneError},
    geometry::{primitives, GeometryBuffers, ShapeKind, Vertex},
    light::Light,
    loader::MeshSource,
    material::{Material, MaterialId, MaterialRegistry},
    math::Transform,
    sbt::ShaderBindingTable,
    utils::timer::timed_scope_log,
};

/// Scene under construction.
///
/// Owns the materials, the flat geometry buffers and the lights until [SceneBuilder::build]
/// consumes it. A failing call appends nothing.
#[derive(Debug, Default)]
pub struct SceneBuilder {
    materials: MaterialRegistry,
    geometry: GeometryBuffers,
    lights: Vec<Light>,
    background: Vec3,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color returned by rays that escape the scene, black by default
    pub fn with_background(self, background: Vec3) -> Self {
        Self { background, ..self }
    }

    pub fn add_material(&mut self, material: Material) -> Result<MaterialId, SceneError> {
        let id = self.materials.insert(material)?;
        log::debug!("material {id}: {}", material.kind);
        Ok(id)
    }

    /// Synthesize a shape with the given material.
    ///
    /// `mesh` is only read for [ShapeKind::Mesh], and a mesh without source is a no-op.
    pub fn add_geometry(
        &mut self,
        shape: ShapeKind,
        material: MaterialId,
        transform: Transform,
        mesh: Option<&dyn MeshSource>,
    ) -> Result<(), SceneError> {
        let descriptor = *self.materials.require(material)?;
        let matrix = transform.into_matrix();
        let triangles_before = self.geometry.triangle_count();

        match shape {
            ShapeKind::Cube => self.geometry.extend(primitives::cube(), &matrix, material),
            ShapeKind::Icosphere { subdivisions } => {
                self.geometry
                    .extend(primitives::icosphere(subdivisions), &matrix, material)
            }
            ShapeKind::Mesh => {
                let Some(source) = mesh else {
                    log::warn!("mesh geometry without a mesh source, skipping");
                    return Ok(());
                };
                self.add_mesh(source, material, &transform)?;
            }
            ShapeKind::AreaLight => {
                self.geometry.extend(primitives::quad(), &matrix, material);
                if descriptor.kind.is_emissive() {
                    self.lights.push(Light::area(&transform, descriptor.emission));
                }
            }
            ShapeKind::PointLight => {
                if descriptor.kind.is_emissive() {
                    self.lights.push(Light::point(&transform, descriptor.emission));
                }
            }
            ShapeKind::SpotLight {
                outer_degrees,
                inner_degrees,
            } => {
                if descriptor.kind.is_emissive() {
                    self.lights.push(Light::spot(
                        &transform,
                        descriptor.emission,
                        outer_degrees,
                        inner_degrees,
                    ));
                }
            }
        }

        if shape.emits_geometry() {
            log::debug!(
                "{shape} with material {material}: {} triangles added",
                self.geometry.triangle_count() - triangles_before
            );
        } else {
            log::debug!("{shape} with material {material}: {} lights", self.lights.len());
        }
        Ok(())
    }

    fn add_mesh(
        &mut self,
        source: &dyn MeshSource,
        fallback: MaterialId,
        transform: &Transform,
    ) -> Result<(), SceneError> {
        let mesh = source.import()?;
        mesh.validate()?;

        // Resolve every face material before the first triangle is appended.
        // Source ids are local to this import.
        let mut source_materials = HashMap::new();
        let mut face_materials = Vec::with_capacity(mesh.faces.len());
        for face in &mesh.faces {
            let material = match mesh.face_material(face) {
                Some(source_id) => self.source_material(&mut source_materials, source_id)?,
                None => fallback,
            };
            face_materials.push(material);
        }

        let matrix = transform.into_matrix();
        for (face, material) in mesh.faces.iter().zip(face_materials) {
            for triangle in mesh.face_triangles(face) {
                self.geometry.push_triangle(triangle, &matrix, material);
            }
        }
        Ok(())
    }

    fn source_material(
        &mut self,
        source_materials: &mut HashMap<u32, MaterialId>,
        source_id: u32,
    ) -> Result<MaterialId, SceneError> {
        if let Some(&id) = source_materials.get(&source_id) {
            return Ok(id);
        }
        let color = index_color(source_id);
        let id = self.materials.insert(Material::diffuse(color))?;
        log::debug!("source material {source_id} mapped to {id} with color {color}");
        source_materials.insert(source_id, id);
        Ok(id)
    }

    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    pub fn vertices(&self) -> &[Vertex] {
        self.geometry.vertices()
    }

    pub fn material_indices(&self) -> &[u32] {
        self.geometry.material_indices()
    }

    pub fn triangle_count(&self) -> usize {
        self.geometry.triangle_count()
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Upload the buffers, build the acceleration structure and the dispatch table.
    ///
    /// Materials are frozen from then on.
    pub fn build<D: Device>(self, device: &mut D) -> Result<Scene<D::Traversable>, Error> {
        let Self {
            mut materials,
            geometry,
            lights,
            background,
            ..
        } = self;

        log::info!(
            "building scene: {} triangles, {} materials, {} lights",
            geometry.triangle_count(),
            materials.len(),
            lights.len()
        );

        let vertex_buffer = device.upload_vertices(geometry.vertices())?;
        let light_buffer = device.upload_lights(&lights)?;

        materials.freeze();

        let input = BuildInput {
            vertex_buffer,
            material_indices: geometry.material_indices(),
            material_count: materials.len(),
        };
        let accel = timed_scope_log("acceleration structure", || {
            build_acceleration_structure(device, &input)
        })
        .res?;

        let sbt = ShaderBindingTable::build(device, &materials, vertex_buffer, background);

        Ok(Scene {
            materials,
            geometry,
            lights,
            vertex_buffer,
            light_buffer,
            accel,
            sbt,
        })
    }
}

/// Scene ready to be rendered. Read only.
#[derive(Debug)]
pub struct Scene<T> {
    materials: MaterialRegistry,
    geometry: GeometryBuffers,
    lights: Vec<Light>,
    vertex_buffer: DeviceBuffer,
    light_buffer: DeviceBuffer,
    accel: AccelerationStructure<T>,
    sbt: ShaderBindingTable,
}

impl<T> Scene<T> {
    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    pub fn geometry(&self) -> &GeometryBuffers {
        &self.geometry
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn vertex_buffer(&self) -> DeviceBuffer {
        self.vertex_buffer
    }

    pub fn light_buffer(&self) -> DeviceBuffer {
        self.light_buffer
    }

    pub fn acceleration_structure(&self) -> &AccelerationStructure<T> {
        &self.accel
    }

    pub fn handle(&self) -> &T {
        &self.accel.handle
    }

    pub fn sbt(&self) -> &ShaderBindingTable {
        &self.sbt
    }
}
