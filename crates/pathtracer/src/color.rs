//! sRGB transfer function.
//!
//! Radiance is accumulated in linear RGB. Displays and image files want sRGB,
//! which gives more room to low brightness values when stored as integers.
//! No math on sRGB values, convert last.
use glam::{Vec3, Vec4};

pub fn srgb_from_linear(linear: f32) -> f32 {
    if linear.is_nan() {
        return 0.0;
    }
    let linear = linear.clamp(0.0, 1.0);
    if linear < 0.0031308 {
        12.92 * linear
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

pub fn linear_from_srgb(srgb: f32) -> f32 {
    if srgb.is_nan() {
        return 0.0;
    }
    let srgb = srgb.clamp(0.0, 1.0);
    if srgb <= 0.04045 {
        srgb / 12.92
    } else {
        ((srgb + 0.055) / 1.055).powf(2.4)
    }
}

/// Quantize a value in [0, 1] to a byte, rounding to nearest
pub fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Linear radiance to an 8 bits sRGB pixel. Alpha stays linear.
pub fn rgba8_from_linear(color: Vec4) -> [u8; 4] {
    let [x, y, z, w] = color.to_array();
    [
        quantize(srgb_from_linear(x)),
        quantize(srgb_from_linear(y)),
        quantize(srgb_from_linear(z)),
        quantize(w),
    ]
}

/// Stable pseudo random color of an index, used to tell imported sub meshes apart.
///
/// The arithmetic wraps on u32.
pub fn index_color(index: u32) -> Vec3 {
    let channel = |mul: u32, offset: u32| {
        (index.wrapping_mul(mul).wrapping_add(offset) & 255) as f32 / 255.0
    };
    Vec3::new(
        channel(13 * 17, 0x234235),
        channel(7 * 3 * 5, 0x773477),
        channel(11 * 19, 0x223766),
    )
}

#[cfg(test)]
mod tests {
    use glam::{Vec3, Vec4};

    use super::*;

    #[test]
    fn srgb_round_trip() {
        let eps = 1e-4;
        for i in 0..=100 {
            let v = i as f32 / 100.0;
            let back = linear_from_srgb(srgb_from_linear(v));
            assert!((back - v).abs() < eps, "{v} -> {back}");
        }
    }

    #[test]
    fn srgb_clamps() {
        assert_eq!(srgb_from_linear(-1.0), 0.0);
        assert_eq!(srgb_from_linear(f32::NAN), 0.0);
        assert!((srgb_from_linear(12.0) - 1.0).abs() < 1e-6);
        assert_eq!(rgba8_from_linear(Vec4::new(0.0, 1.0, 4.0, 1.0)), [0, 255, 255, 255]);
    }

    #[test]
    fn index_colors() {
        // id 0 only keeps the low byte of the offsets
        let c = index_color(0);
        assert_eq!(c, Vec3::new(0x35 as f32, 0x77 as f32, 0x66 as f32) / 255.0);

        let c = index_color(1);
        let expected = Vec3::new(
            ((221 + 0x234235) & 255) as f32,
            ((105 + 0x773477) & 255) as f32,
            ((209 + 0x223766) & 255) as f32,
        ) / 255.0;
        assert_eq!(c, expected);
        assert_ne!(index_color(1), index_color(2));
    }
}
