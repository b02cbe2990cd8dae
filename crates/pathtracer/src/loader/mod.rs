//! Mesh import.
//!
//! Importers hand over an [ImportedMesh]: flat positions and faces referencing
//! contiguous runs of them. It is consumed once by the scene builder.
mod obj;

use glam::Vec3;

use crate::{error::SceneError, geometry::Triangle};
pub use obj::ObjImporter;

/// `count` positions starting at `offset`, plus the material the source file gave the face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportedFace {
    pub offset: usize,
    pub count: usize,
    pub material: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub faces: Vec<ImportedFace>,
    /// Whether the source declares materials. Face materials are ignored otherwise.
    pub has_materials: bool,
}

pub trait MeshSource {
    fn import(&self) -> Result<ImportedMesh, SceneError>;
}

/// Already in memory
impl MeshSource for ImportedMesh {
    fn import(&self) -> Result<ImportedMesh, SceneError> {
        Ok(self.clone())
    }
}

impl ImportedMesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a face made of the given positions
    pub fn push_face(&mut self, positions: &[Vec3], material: Option<u32>) {
        self.faces.push(ImportedFace {
            offset: self.positions.len(),
            count: positions.len(),
            material,
        });
        self.positions.extend_from_slice(positions);
    }

    pub fn with_materials(self, has_materials: bool) -> Self {
        Self {
            has_materials,
            ..self
        }
    }

    /// Checks every face before anything is consumed
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.faces.is_empty() {
            return Err(SceneError::EmptyMesh {
                name: self.name.clone(),
            });
        }

        for (face_index, face) in self.faces.iter().enumerate() {
            if face.count < 3 {
                return Err(SceneError::DegenerateFace {
                    name: self.name.clone(),
                    face: face_index,
                    vertices: face.count,
                });
            }
            let end = face.offset + face.count;
            if end > self.positions.len() {
                return Err(SceneError::FaceOutOfBounds {
                    name: self.name.clone(),
                    face: face_index,
                    index: end - 1,
                    count: self.positions.len(),
                });
            }
        }
        Ok(())
    }

    /// Material of a face, if the source has materials at all
    pub fn face_material(&self, face: &ImportedFace) -> Option<u32> {
        if self.has_materials {
            face.material
        } else {
            None
        }
    }

    /// Fan triangulation of a validated face
    pub fn face_triangles<'a>(
        &'a self,
        face: &ImportedFace,
    ) -> impl Iterator<Item = Triangle> + 'a {
        let positions = &self.positions[face.offset..face.offset + face.count];
        (1..positions.len() - 1).map(move |i| [positions[0], positions[i], positions[i + 1]])
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.iter().map(|f| f.count.saturating_sub(2)).sum()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::ImportedMesh;
    use crate::error::SceneError;

    fn square() -> [Vec3; 4] {
        [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn fan_triangulation() {
        let mut mesh = ImportedMesh::new("quad");
        mesh.push_face(&square(), None);
        mesh.validate().unwrap();

        let triangles: Vec<_> = mesh.face_triangles(&mesh.faces[0]).collect();
        let [a, b, c, d] = square();
        assert_eq!(triangles, vec![[a, b, c], [a, c, d]]);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn a_triangle_yields_itself() {
        let mut mesh = ImportedMesh::new("tri");
        let [a, b, c, _] = square();
        mesh.push_face(&[a, b, c], Some(0));

        let triangles: Vec<_> = mesh.face_triangles(&mesh.faces[0]).collect();
        assert_eq!(triangles, vec![[a, b, c]]);
    }

    #[test]
    fn invalid_meshes() {
        assert!(matches!(
            ImportedMesh::new("empty").validate(),
            Err(SceneError::EmptyMesh { .. })
        ));

        let mut mesh = ImportedMesh::new("line");
        mesh.push_face(&square(), None);
        mesh.push_face(&square()[..2], None);
        assert!(matches!(
            mesh.validate(),
            Err(SceneError::DegenerateFace {
                face: 1,
                vertices: 2,
                ..
            })
        ));

        let mut mesh = ImportedMesh::new("truncated");
        mesh.push_face(&square(), None);
        mesh.faces[0].count = 5;
        assert!(matches!(
            mesh.validate(),
            Err(SceneError::FaceOutOfBounds {
                index: 4,
                count: 4,
                ..
            })
        ));
    }

    #[test]
    fn face_materials_need_source_materials() {
        let mut mesh = ImportedMesh::new("mesh");
        mesh.push_face(&square(), Some(3));
        assert_eq!(mesh.face_material(&mesh.faces[0]), None);

        let mesh = mesh.with_materials(true);
        assert_eq!(mesh.face_material(&mesh.faces[0]), Some(3));
    }
}
