use glam::Vec3;

use crate::{
    error::SceneError,
    geometry::ShapeKind,
    material::Material,
    math::Transform,
    scene::SceneBuilder,
};

/// The classic box: white floor, ceiling and back, red left wall, green right wall, lit by a
/// square area light. 10 units wide, sitting on y = 0.
pub struct CornellBoxScene;

impl CornellBoxScene {
    pub fn insert_into(scene: &mut SceneBuilder) -> Result<(), SceneError> {
        let white = scene.add_material(Material::diffuse(Vec3::splat(0.73)))?;
        let red = scene.add_material(Material::diffuse(Vec3::new(0.65, 0.05, 0.05)))?;
        let green = scene.add_material(Material::diffuse(Vec3::new(0.12, 0.45, 0.15)))?;
        let mirror = scene.add_material(Material::mirror(Vec3::splat(0.95)))?;
        let light = scene.add_material(Material::emissive(Vec3::splat(15.0)))?;

        let wall = |translation: Vec3, scale: Vec3| Transform::new(translation, Vec3::ZERO, scale);
        let walls = [
            // floor, ceiling, back
            (white, wall(Vec3::new(0.0, -0.05, 0.0), Vec3::new(10.0, 0.1, 10.0))),
            (white, wall(Vec3::new(0.0, 10.05, 0.0), Vec3::new(10.0, 0.1, 10.0))),
            (white, wall(Vec3::new(0.0, 5.0, -5.05), Vec3::new(10.0, 10.0, 0.1))),
            (red, wall(Vec3::new(-5.05, 5.0, 0.0), Vec3::new(0.1, 10.0, 10.0))),
            (green, wall(Vec3::new(5.05, 5.0, 0.0), Vec3::new(0.1, 10.0, 10.0))),
        ];
        for (material, transform) in walls {
            scene.add_geometry(ShapeKind::Cube, material, transform, None)?;
        }

        scene.add_geometry(
            ShapeKind::Cube,
            white,
            Transform::new(
                Vec3::new(-1.8, 3.0, -1.5),
                Vec3::new(0.0, 20.0, 0.0),
                Vec3::new(3.0, 6.0, 3.0),
            ),
            None,
        )?;
        scene.add_geometry(
            ShapeKind::Icosphere { subdivisions: 4 },
            mirror,
            Transform::new(Vec3::new(2.0, 1.6, 1.5), Vec3::ZERO, Vec3::splat(1.6)),
            None,
        )?;

        // Right below the ceiling, facing down
        scene.add_geometry(
            ShapeKind::AreaLight,
            light,
            Transform::new(Vec3::new(0.0, 9.95, 0.0), Vec3::ZERO, Vec3::splat(2.5)),
            None,
        )?;
        Ok(())
    }
}
