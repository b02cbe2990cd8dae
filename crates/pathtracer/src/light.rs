use glam::Vec3;

use crate::math::{Transform, Transformer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[repr(u32)]
pub enum LightKind {
    #[display("area")]
    Area = 0,
    #[display("point")]
    Point = 1,
    #[display("spot")]
    Spot = 2,
}

/// A light derived from emissive geometry.
///
/// Fields that do not apply to the kind are zero: edges and normal of a point light,
/// cosine thresholds of an area light...
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    /// Corner of an area light, position of point and spot lights
    pub corner: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
    /// Surface normal of an area light, cone axis of a spot light
    pub normal: Vec3,
    pub emission: Vec3,
    pub cos_outer: f32,
    pub cos_inner: f32,
}

impl Light {
    /// Parallelogram spanned by the unit quad of the XZ plane once transformed
    pub fn area(transform: &Transform, emission: Vec3) -> Self {
        let corner = transform.apply(Vec3::new(0.5, 0.0, -0.5));
        let v1 = transform.apply(Vec3::new(-0.5, 0.0, -0.5)) - corner;
        let v2 = transform.apply(Vec3::new(0.5, 0.0, 0.5)) - corner;
        let normal = (-v1.cross(v2)).normalize_or_zero();

        Self {
            kind: LightKind::Area,
            corner,
            v1,
            v2,
            normal,
            emission,
            cos_outer: 0.0,
            cos_inner: 0.0,
        }
    }

    pub fn point(transform: &Transform, emission: Vec3) -> Self {
        Self {
            kind: LightKind::Point,
            corner: transform.apply(Vec3::ZERO),
            v1: Vec3::ZERO,
            v2: Vec3::ZERO,
            normal: Vec3::ZERO,
            emission,
            cos_outer: 0.0,
            cos_inner: 0.0,
        }
    }

    /// A cone pointing down the rotated -Y axis
    pub fn spot(
        transform: &Transform,
        emission: Vec3,
        outer_degrees: f32,
        inner_degrees: f32,
    ) -> Self {
        Self {
            kind: LightKind::Spot,
            normal: transform.rotate_direction(Vec3::NEG_Y),
            cos_outer: outer_degrees.to_radians().cos(),
            cos_inner: inner_degrees.to_radians().cos(),
            ..Self::point(transform, emission)
        }
    }

    pub fn position(&self) -> Vec3 {
        self.corner
    }

    /// Area of the emitting surface, zero for lights without one
    pub fn area_size(&self) -> f32 {
        self.v1.cross(self.v2).length()
    }
}
