use glam::Vec3;

use crate::{
    error::SceneError,
    geometry::ShapeKind,
    material::Material,
    math::Transform,
    scene::SceneBuilder,
};

/// One light of each kind over a floor
pub struct LightsScene;

impl LightsScene {
    pub fn insert_into(scene: &mut SceneBuilder) -> Result<(), SceneError> {
        let floor = scene.add_material(Material::diffuse(Vec3::splat(0.8)))?;
        let red = scene.add_material(Material::diffuse(Vec3::new(0.8, 0.2, 0.2)))?;
        let glossy = scene.add_material(Material::glossy(Vec3::splat(0.8), 40.0))?;
        let area = scene.add_material(Material::emissive(Vec3::new(10.0, 8.0, 6.0)))?;
        let point = scene.add_material(Material::emissive(Vec3::new(20.0, 20.0, 40.0)))?;
        let spot = scene.add_material(Material::emissive(Vec3::splat(120.0)))?;

        scene.add_geometry(
            ShapeKind::Cube,
            floor,
            Transform::new(Vec3::new(0.0, -0.5, 0.0), Vec3::ZERO, Vec3::new(30.0, 1.0, 30.0)),
            None,
        )?;
        for (x, material) in [(-4.0, red), (0.0, glossy), (4.0, red)] {
            scene.add_geometry(
                ShapeKind::icosphere(),
                material,
                Transform::new(Vec3::new(x, 1.5, 0.0), Vec3::ZERO, Vec3::splat(1.5)),
                None,
            )?;
        }

        scene.add_geometry(
            ShapeKind::AreaLight,
            area,
            Transform::new(Vec3::new(-4.0, 8.0, 0.0), Vec3::ZERO, Vec3::splat(2.0)),
            None,
        )?;
        scene.add_geometry(
            ShapeKind::PointLight,
            point,
            Transform::from_translation(Vec3::new(0.0, 6.0, 3.0)),
            None,
        )?;
        // Tilted towards the right sphere
        scene.add_geometry(
            ShapeKind::spot_light(),
            spot,
            Transform::new(Vec3::new(6.0, 8.0, 2.0), Vec3::new(-10.0, 0.0, 15.0), Vec3::ONE),
            None,
        )?;
        Ok(())
    }
}
