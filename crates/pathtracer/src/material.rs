use glam::Vec3;

use crate::error::SceneError;

/// Shading model of a material. The discriminant is the tag the device sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[repr(u32)]
pub enum MaterialKind {
    #[display("diffuse")]
    Diffuse = 0,
    #[display("fresnel")]
    Fresnel = 1,
    #[display("glossy")]
    Glossy = 2,
    #[display("mirror")]
    Mirror = 3,
    #[display("emissive")]
    Emissive = 4,
}

impl MaterialKind {
    pub const fn tag(self) -> u32 {
        self as u32
    }

    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(MaterialKind::Diffuse),
            1 => Some(MaterialKind::Fresnel),
            2 => Some(MaterialKind::Glossy),
            3 => Some(MaterialKind::Mirror),
            4 => Some(MaterialKind::Emissive),
            _ => None,
        }
    }

    pub fn is_emissive(self) -> bool {
        self == MaterialKind::Emissive
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub kind: MaterialKind,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub emission: Vec3,
    pub specular_exponent: f32,
    pub ior: f32,
}

impl Material {
    pub fn diffuse(albedo: Vec3) -> Self {
        Self {
            kind: MaterialKind::Diffuse,
            diffuse: albedo,
            specular: Vec3::ZERO,
            emission: Vec3::ZERO,
            specular_exponent: 0.0,
            ior: 0.0,
        }
    }

    /// An emitter still has a diffuse color: the surface is visible when it is not lit.
    pub fn emissive(emission: Vec3) -> Self {
        Self {
            kind: MaterialKind::Emissive,
            diffuse: Vec3::ONE,
            specular: Vec3::ZERO,
            emission,
            specular_exponent: 0.0,
            ior: 0.0,
        }
    }

    pub fn fresnel(color: Vec3, ior: f32) -> Self {
        Self {
            kind: MaterialKind::Fresnel,
            diffuse: color,
            specular: color,
            emission: Vec3::ZERO,
            specular_exponent: 0.0,
            ior,
        }
    }

    pub fn glossy(color: Vec3, specular_exponent: f32) -> Self {
        Self {
            kind: MaterialKind::Glossy,
            diffuse: color,
            specular: color,
            emission: Vec3::ZERO,
            specular_exponent,
            ior: 0.0,
        }
    }

    pub fn mirror(color: Vec3) -> Self {
        Self {
            kind: MaterialKind::Mirror,
            diffuse: color,
            specular: color,
            emission: Vec3::ZERO,
            specular_exponent: 0.0,
            ior: 0.0,
        }
    }
}

/// Handle to a registered material, it is the index of the material in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("#{_0}")]
pub struct MaterialId(pub u32);

impl MaterialId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Append-only table of materials.
///
/// Handles are never invalidated: there is no removal nor update.
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    materials: Vec<Material>,
    frozen: bool,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a material and returns the id associated with it, which is the size of the registry before insertion
    pub fn insert(&mut self, material: Material) -> Result<MaterialId, SceneError> {
        if self.frozen {
            return Err(SceneError::MaterialsFrozen);
        }
        let id = MaterialId(self.materials.len() as u32);
        self.materials.push(material);
        Ok(id)
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.index())
    }

    pub fn contains(&self, id: MaterialId) -> bool {
        id.index() < self.materials.len()
    }

    /// Returns the material or the precondition error geometry calls report
    pub fn require(&self, id: MaterialId) -> Result<&Material, SceneError> {
        self.get(id).ok_or(SceneError::UnknownMaterial {
            material: id,
            count: self.materials.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialId(i as u32), m))
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }
}
