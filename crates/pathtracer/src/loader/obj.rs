use std::path::PathBuf;

use glam::Vec3;

use super::{ImportedMesh, MeshSource};
use crate::error::SceneError;

/// Wavefront OBJ importer.
///
/// Polygons are kept as they are in the file, triangulation happens when the mesh is
/// consumed. Every model of the file is merged into one mesh, each face remembering the
/// material of its model.
#[derive(Debug, Clone)]
pub struct ObjImporter {
    path: PathBuf,
}

impl ObjImporter {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl MeshSource for ObjImporter {
    fn import(&self) -> Result<ImportedMesh, SceneError> {
        let name = self.path.display().to_string();
        let options = tobj::LoadOptions {
            single_index: false,
            triangulate: false,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        };

        let (models, materials) =
            tobj::load_obj(&self.path, &options).map_err(|err| SceneError::Import {
                name: name.clone(),
                reason: err.to_string(),
            })?;

        let has_materials = match materials {
            Ok(materials) => {
                for (id, material) in materials.iter().enumerate() {
                    log::debug!("{name}: source material {id} is {:?}", material.name);
                }
                !materials.is_empty()
            }
            Err(err) => {
                log::warn!("{name}: materials could not be loaded ({err}), using the default one");
                false
            }
        };

        let mut mesh = ImportedMesh::new(name.clone()).with_materials(has_materials);
        let mut face_positions = Vec::new();

        for model in &models {
            let obj = &model.mesh;
            log::debug!("Loading model {}", model.name);

            if obj.positions.len() % 3 != 0 {
                return Err(SceneError::Import {
                    name,
                    reason: format!("model {} has a truncated position list", model.name),
                });
            }
            let positions: &[[f32; 3]] = bytemuck::cast_slice(&obj.positions);
            let material = obj.material_id.map(|id| id as u32);

            // No arities means the file only holds triangles
            let arities: Box<dyn Iterator<Item = usize>> = if obj.face_arities.is_empty() {
                Box::new(std::iter::repeat(3).take(obj.indices.len() / 3))
            } else {
                Box::new(obj.face_arities.iter().map(|&a| a as usize))
            };

            let mut start = 0;
            for arity in arities {
                let Some(indices) = obj.indices.get(start..start + arity) else {
                    return Err(SceneError::Import {
                        name,
                        reason: format!("model {} has a truncated index list", model.name),
                    });
                };
                start += arity;

                face_positions.clear();
                for &index in indices {
                    let Some(p) = positions.get(index as usize) else {
                        return Err(SceneError::FaceOutOfBounds {
                            name,
                            face: mesh.faces.len(),
                            index: index as usize,
                            count: positions.len(),
                        });
                    };
                    face_positions.push(Vec3::from_array(*p));
                }
                mesh.push_face(&face_positions, material);
            }
        }

        log::info!(
            "Imported {name}: {} faces, {} triangles",
            mesh.faces.len(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use glam::Vec3;

    use super::ObjImporter;
    use crate::{error::SceneError, loader::MeshSource};

    #[test]
    fn import_polygons() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        writeln!(
            file,
            "o quad\n\
             v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 0 0 1\n\
             f 1 2 3 4\n\
             f 1 2 5\n"
        )
        .unwrap();

        let mesh = ObjImporter::new(file.path()).import().unwrap();
        assert_eq!(mesh.faces.len(), 2);
        assert_eq!(mesh.faces[0].count, 4);
        assert_eq!(mesh.faces[1].count, 3);
        assert_eq!(mesh.triangle_count(), 3);
        assert_eq!(mesh.positions[6], Vec3::new(0.0, 0.0, 1.0));
        assert!(!mesh.has_materials);
    }

    #[test]
    fn missing_file() {
        let err = ObjImporter::new("does/not/exist.obj").import().unwrap_err();
        assert!(matches!(err, SceneError::Import { .. }));
    }
}
