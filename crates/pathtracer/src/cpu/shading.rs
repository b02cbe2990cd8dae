//! Host path tracer used by [super::CpuDevice].
//!
//! Diffuse surfaces sample the lights directly and bounce along a cosine weighted direction.
//! Mirror, glossy and fresnel surfaces only bounce. Emission is only counted on camera rays and
//! right after such a bounce.
use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::{distributions::Uniform, prelude::Distribution};

use super::bvh::{Bvh, Ray};
use crate::{
    light::{Light, LightKind},
    material::MaterialKind,
    sbt::HitGroupData,
    Rng,
};

/// Offset of secondary rays, in world units
const RAY_EPSILON: f32 = 1e-3;

pub struct Shading<'a> {
    pub bvh: &'a Bvh,
    /// Material of each triangle, indexes `materials`
    pub material_indices: &'a [u32],
    pub materials: &'a [HitGroupData],
    pub lights: &'a [Light],
    pub background: Vec3,
    pub max_depth: u32,
}

struct SurfaceHit {
    position: Vec3,
    /// Faces the incoming ray
    normal: Vec3,
    /// Whether the ray comes from the side the triangle winding points to
    front_face: bool,
    material: HitGroupData,
}

impl Shading<'_> {
    fn hit(&self, ray: &Ray) -> Option<SurfaceHit> {
        let hit = self.bvh.intersect(ray)?;
        let material = self
            .material_indices
            .get(hit.primitive as usize)
            .and_then(|&m| self.materials.get(m as usize))
            .copied()
            .unwrap_or_default();

        let front_face = hit.normal.dot(ray.direction) < 0.0;
        Some(SurfaceHit {
            position: ray.at(hit.t),
            normal: if front_face { hit.normal } else { -hit.normal },
            front_face,
            material,
        })
    }

    /// Radiance arriving at `origin` from `direction`
    pub fn radiance(&self, origin: Vec3, direction: Vec3, rng: &mut Rng) -> Vec3 {
        let uniform = Uniform::new(0.0f32, 1.0);
        let mut ray = Ray::new(origin, direction, 0.0, f32::INFINITY);
        let mut throughput = Vec3::ONE;
        let mut result = Vec3::ZERO;
        let mut count_emission = true;

        for _ in 0..self.max_depth {
            crate::counter!("radiance rays");
            let Some(hit) = self.hit(&ray) else {
                result += throughput * self.background;
                break;
            };
            let m = hit.material;
            let diffuse = Vec3::from_array(m.diffuse);
            let specular = Vec3::from_array(m.specular);

            let wi = match MaterialKind::from_tag(m.mat).unwrap_or(MaterialKind::Diffuse) {
                MaterialKind::Emissive => {
                    if count_emission {
                        result += throughput * Vec3::from_array(m.emission);
                    }
                    break;
                }
                MaterialKind::Diffuse => {
                    result += throughput * diffuse / PI * self.direct_light(&hit, rng);
                    count_emission = false;
                    throughput *= diffuse;
                    cosine_hemisphere(hit.normal, uniform.sample(rng), uniform.sample(rng))
                }
                MaterialKind::Mirror => {
                    count_emission = true;
                    throughput *= specular;
                    reflect(ray.direction, hit.normal)
                }
                MaterialKind::Glossy => {
                    count_emission = true;
                    throughput *= specular;
                    let lobe = phong_lobe(
                        reflect(ray.direction, hit.normal),
                        m.spec_exp,
                        uniform.sample(rng),
                        uniform.sample(rng),
                    );
                    if lobe.dot(hit.normal) <= 0.0 {
                        break;
                    }
                    lobe
                }
                MaterialKind::Fresnel => {
                    count_emission = true;
                    throughput *= specular;
                    let eta = if hit.front_face { 1.0 / m.ior } else { m.ior };
                    dielectric(ray.direction, hit.normal, eta, uniform.sample(rng))
                }
            };

            ray = Ray::new(hit.position + RAY_EPSILON * wi, wi, 0.0, f32::INFINITY);
        }

        result
    }

    /// Irradiance from every light at a diffuse hit
    fn direct_light(&self, hit: &SurfaceHit, rng: &mut Rng) -> Vec3 {
        let uniform = Uniform::new(0.0f32, 1.0);
        let mut irradiance = Vec3::ZERO;

        for light in self.lights {
            let target = match light.kind {
                LightKind::Area => {
                    light.corner + uniform.sample(rng) * light.v1 + uniform.sample(rng) * light.v2
                }
                LightKind::Point | LightKind::Spot => light.corner,
            };
            let to_light = target - hit.position;
            let distance = to_light.length();
            if distance <= RAY_EPSILON {
                continue;
            }
            let wi = to_light / distance;
            let cos_surface = wi.dot(hit.normal);
            if cos_surface <= 0.0 {
                continue;
            }

            let falloff = match light.kind {
                LightKind::Area => (-wi).dot(light.normal).max(0.0) * light.area_size(),
                LightKind::Point => 1.0,
                LightKind::Spot => {
                    smoothstep(light.cos_outer, light.cos_inner, (-wi).dot(light.normal))
                }
            };
            if falloff <= 0.0 {
                continue;
            }

            crate::counter!("occlusion rays");
            let shadow = Ray::new(
                hit.position + RAY_EPSILON * hit.normal,
                wi,
                0.0,
                distance - 2.0 * RAY_EPSILON,
            );
            if self.bvh.occluded(&shadow) {
                continue;
            }
            irradiance += light.emission * cos_surface * falloff / (distance * distance);
        }
        irradiance
    }
}

fn reflect(direction: Vec3, normal: Vec3) -> Vec3 {
    direction - 2.0 * direction.dot(normal) * normal
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Orthonormal basis around `n`
fn basis(n: Vec3) -> (Vec3, Vec3) {
    let helper = if n.x.abs() > 0.9 { Vec3::Y } else { Vec3::X };
    let t = n.cross(helper).normalize();
    (t, n.cross(t))
}

fn cosine_hemisphere(normal: Vec3, u1: f32, u2: f32) -> Vec3 {
    let r = u1.sqrt();
    let phi = TAU * u2;
    let (t, b) = basis(normal);
    (r * phi.cos() * t + r * phi.sin() * b + (1.0 - u1).max(0.0).sqrt() * normal).normalize()
}

/// Direction around `axis` distributed as cos^exponent
fn phong_lobe(axis: Vec3, exponent: f32, u1: f32, u2: f32) -> Vec3 {
    let cos_theta = u1.powf(1.0 / (exponent + 1.0));
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = TAU * u2;
    let (t, b) = basis(axis);
    (sin_theta * phi.cos() * t + sin_theta * phi.sin() * b + cos_theta * axis).normalize()
}

/// Pick reflection or refraction with the Schlick approximation of the Fresnel term.
///
/// `normal` faces the incoming ray and `eta` is the ratio of the indices of refraction, incoming
/// side over outgoing side.
fn dielectric(direction: Vec3, normal: Vec3, eta: f32, u: f32) -> Vec3 {
    if !eta.is_finite() || eta <= 0.0 {
        return direction;
    }
    let cos_i = -direction.dot(normal);
    let sin2_t = eta * eta * (1.0 - cos_i * cos_i);
    if sin2_t > 1.0 {
        return reflect(direction, normal);
    }

    let r0 = ((1.0 - eta) / (1.0 + eta)).powi(2);
    let reflectance = r0 + (1.0 - r0) * (1.0 - cos_i).powi(5);
    if u < reflectance {
        reflect(direction, normal)
    } else {
        let cos_t = (1.0 - sin2_t).sqrt();
        (eta * direction + (eta * cos_i - cos_t) * normal).normalize()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn reflection() {
        let r = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert_eq!(r, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn hemisphere_samples_stay_above_surface() {
        let n = Vec3::new(0.0, 0.0, -1.0);
        for i in 0..10 {
            for j in 0..10 {
                let d = cosine_hemisphere(n, i as f32 / 10.0, j as f32 / 10.0);
                assert!(d.dot(n) >= 0.0);
                assert!((d.length() - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn spot_falloff() {
        assert_eq!(smoothstep(0.5, 0.8, 0.9), 1.0);
        assert_eq!(smoothstep(0.5, 0.8, 0.1), 0.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn refraction_bends_towards_normal() {
        let d = Vec3::new(1.0, -1.0, 0.0).normalize();
        // u = 1 never reflects
        let t = dielectric(d, Vec3::Y, 1.0 / 1.5, 1.0);
        assert!(t.y < 0.0);
        assert!(t.x < d.x);

        // Total internal reflection going out at a grazing angle
        let grazing = Vec3::new(1.0, -0.2, 0.0).normalize();
        let r = dielectric(grazing, Vec3::Y, 1.5, 1.0);
        assert!(r.y > 0.0);
    }
}
