pub mod primitives;

use glam::{Mat4, Vec3};

use crate::{material::MaterialId, math::Transformer};
pub use primitives::Triangle;

pub const DEFAULT_ICOSPHERE_SUBDIVISIONS: u32 = 3;
pub const DEFAULT_SPOT_OUTER_DEGREES: f32 = 25.0;
pub const DEFAULT_SPOT_INNER_DEGREES: f32 = 20.0;

/// A vertex as the device reads it: a position padded to 16 bytes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pad: f32,
}

const _: () = assert!(std::mem::size_of::<Vertex>() == 16);

impl Vertex {
    pub fn new(position: Vec3) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            pad: 0.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl From<Vec3> for Vertex {
    fn from(value: Vec3) -> Self {
        Self::new(value)
    }
}

/// What a geometry call synthesizes
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display)]
pub enum ShapeKind {
    #[display("cube")]
    Cube,
    #[display("icosphere ({subdivisions} subdivisions)")]
    Icosphere { subdivisions: u32 },
    #[display("mesh")]
    Mesh,
    #[display("area light")]
    AreaLight,
    #[display("point light")]
    PointLight,
    #[display("spot light ({outer_degrees}°/{inner_degrees}°)")]
    SpotLight {
        outer_degrees: f32,
        inner_degrees: f32,
    },
}

impl ShapeKind {
    pub const fn icosphere() -> Self {
        ShapeKind::Icosphere {
            subdivisions: DEFAULT_ICOSPHERE_SUBDIVISIONS,
        }
    }

    pub const fn spot_light() -> Self {
        ShapeKind::SpotLight {
            outer_degrees: DEFAULT_SPOT_OUTER_DEGREES,
            inner_degrees: DEFAULT_SPOT_INNER_DEGREES,
        }
    }

    /// Lights without a surface never write to the geometry buffers
    pub fn emits_geometry(&self) -> bool {
        !matches!(self, ShapeKind::PointLight | ShapeKind::SpotLight { .. })
    }
}

/// Flat triangle soup with one material index per triangle.
///
/// `vertices.len() == 3 * material_indices.len()` always holds.
#[derive(Debug, Clone, Default)]
pub struct GeometryBuffers {
    vertices: Vec<Vertex>,
    material_indices: Vec<u32>,
}

impl GeometryBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_triangle(&mut self, triangle: Triangle, transform: &Mat4, material: MaterialId) {
        self.vertices.extend(
            triangle
                .into_iter()
                .map(|p| Vertex::new(transform.apply(p))),
        );
        self.material_indices.push(material.0);
    }

    pub fn extend(
        &mut self,
        triangles: impl IntoIterator<Item = Triangle>,
        transform: &Mat4,
        material: MaterialId,
    ) {
        for triangle in triangles {
            self.push_triangle(triangle, transform, material);
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn material_indices(&self) -> &[u32] {
        &self.material_indices
    }

    pub fn triangle_count(&self) -> usize {
        self.material_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.material_indices.is_empty()
    }

    /// Vertices of triangle `index`
    pub fn triangle(&self, index: usize) -> Option<Triangle> {
        let v = self.vertices.get(3 * index..3 * index + 3)?;
        Some([v[0].position(), v[1].position(), v[2].position()])
    }
}
