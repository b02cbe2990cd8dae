use glam::{Mat3, Mat4, Vec3};

/// Represents a placement as translation + euler rotation (in degrees) + scale
///
/// The matrix is `Translate * RotateX * RotateY * RotateZ * Scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation_degrees: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pub trait Transformer<T> {
    fn apply(&self, v: T) -> T;
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation_degrees: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation_degrees,
            scale,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn with_scale(self, scale: Vec3) -> Self {
        Self { scale, ..self }
    }

    pub fn with_rotation(self, rotation_degrees: Vec3) -> Self {
        Self {
            rotation_degrees,
            ..self
        }
    }

    /// Rotation part only, X then Y then Z
    pub fn rotation_matrix(&self) -> Mat3 {
        let Vec3 { x, y, z } = self.rotation_degrees;
        Mat3::from_rotation_x(x.to_radians())
            * Mat3::from_rotation_y(y.to_radians())
            * Mat3::from_rotation_z(z.to_radians())
    }

    pub fn into_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_mat3(self.rotation_matrix())
            * Mat4::from_scale(self.scale)
    }

    /// Rotate a direction, ignoring translation and scale. The result is normalized.
    pub fn rotate_direction(&self, direction: Vec3) -> Vec3 {
        (self.rotation_matrix() * direction).normalize_or_zero()
    }
}

impl Transformer<Vec3> for Transform {
    /// Apply scale then rotation then translation
    fn apply(&self, v: Vec3) -> Vec3 {
        self.into_matrix().transform_point3(v)
    }
}

impl Transformer<Vec3> for Mat4 {
    fn apply(&self, v: Vec3) -> Vec3 {
        self.transform_point3(v)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::{Transform, Transformer};

    #[test]
    fn identity() {
        let p = Vec3::new(1.0, -2.0, 3.0);
        assert_eq!(Transform::IDENTITY.apply(p), p);
    }

    #[test]
    fn scale_then_rotate_then_translate() {
        let eps = 1e-5;
        let t = Transform::new(
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(0.0, 0.0, 90.0),
            Vec3::new(2.0, 1.0, 1.0),
        );

        // x is scaled to 2 then rotated onto y then translated
        let p = t.apply(Vec3::X);
        assert!(p.distance(Vec3::new(0.0, 12.0, 0.0)) < eps, "{p}");
    }

    #[test]
    fn rotation_order_is_x_then_y_then_z() {
        let eps = 1e-5;
        let t = Transform::IDENTITY.with_rotation(Vec3::new(90.0, 90.0, 0.0));

        // Ry maps z onto x, then Rx leaves x alone
        let p = t.apply(Vec3::Z);
        assert!(p.distance(Vec3::X) < eps, "{p}");

        // Ry leaves y alone, then Rx maps y onto z
        let p = t.apply(Vec3::Y);
        assert!(p.distance(Vec3::Z) < eps, "{p}");
    }

    #[test]
    fn matrix_applies_like_transform() {
        let t = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(30.0, 0.0, 60.0),
            Vec3::splat(2.0),
        );
        let p = Vec3::new(0.5, -1.0, 4.0);
        assert!(t.into_matrix().apply(p).distance(t.apply(p)) < 1e-5);
    }

    #[test]
    fn directions_ignore_translation_and_scale() {
        let eps = 1e-5;
        let t = Transform::new(
            Vec3::splat(5.0),
            Vec3::new(180.0, 0.0, 0.0),
            Vec3::splat(3.0),
        );
        let d = t.rotate_direction(Vec3::NEG_Y);
        assert!(d.distance(Vec3::Y) < eps, "{d}");
    }
}
