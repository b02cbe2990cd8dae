use std::path::PathBuf;

use glam::Vec3;

use crate::{
    error::SceneError,
    geometry::ShapeKind,
    loader::ObjImporter,
    material::Material,
    math::Transform,
    scene::SceneBuilder,
};

/// Every material kind under a ceiling point light, with an optional OBJ mesh as backdrop
#[derive(Debug, Default, Clone)]
pub struct ShowcaseScene {
    pub mesh: Option<PathBuf>,
}

impl ShowcaseScene {
    pub fn insert_into(&self, scene: &mut SceneBuilder) -> Result<(), SceneError> {
        let _red_light = scene.add_material(Material::emissive(Vec3::new(5.0, 1.0, 1.0)))?;
        let ceiling_light = scene.add_material(Material::emissive(Vec3::splat(20.0)))?;
        let _dim_light = scene.add_material(Material::emissive(Vec3::splat(5.0)))?;
        let white = scene.add_material(Material::diffuse(Vec3::ONE))?;
        let cyan = scene.add_material(Material::diffuse(Vec3::new(0.05, 0.8, 0.8)))?;
        let magenta = scene.add_material(Material::diffuse(Vec3::new(0.8, 0.05, 0.8)))?;
        let pink_glass = scene.add_material(Material::fresnel(Vec3::new(1.0, 0.6, 0.8), 5.4))?;
        let glass = scene.add_material(Material::fresnel(Vec3::ONE, 5.4))?;
        let glossy = scene.add_material(Material::glossy(Vec3::splat(0.8), 10.0))?;
        let glossier = scene.add_material(Material::glossy(Vec3::splat(0.8), 40.0))?;
        let mirror = scene.add_material(Material::mirror(Vec3::ONE))?;

        scene.add_geometry(
            ShapeKind::PointLight,
            ceiling_light,
            Transform::new(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, Vec3::new(3.0, 0.3, 3.0)),
            None,
        )?;

        if let Some(path) = &self.mesh {
            let importer = ObjImporter::new(path);
            scene.add_geometry(
                ShapeKind::Mesh,
                white,
                Transform::new(Vec3::new(-10.0, 0.0, 0.0), Vec3::ZERO, Vec3::splat(0.03)),
                Some(&importer),
            )?;
        } else {
            scene.add_geometry(
                ShapeKind::Cube,
                white,
                Transform::new(Vec3::new(0.0, -0.5, 0.0), Vec3::ZERO, Vec3::new(40.0, 1.0, 40.0)),
                None,
            )?;
        }

        let row = [cyan, magenta, pink_glass, glass, glossy, glossier, mirror];
        for (i, material) in row.into_iter().enumerate() {
            let x = (i as f32 - 3.0) * 2.5;
            scene.add_geometry(
                ShapeKind::icosphere(),
                material,
                Transform::new(Vec3::new(x, 1.0, 0.0), Vec3::ZERO, Vec3::ONE),
                None,
            )?;
        }
        scene.add_geometry(
            ShapeKind::Cube,
            magenta,
            Transform::new(Vec3::new(0.0, 1.0, -4.0), Vec3::new(0.0, 45.0, 0.0), Vec3::splat(2.0)),
            None,
        )?;
        Ok(())
    }
}
