mod cornell;
mod lights;
mod showcase;

pub use cornell::CornellBoxScene;
pub use lights::LightsScene;
pub use showcase::ShowcaseScene;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{CornellBoxScene, LightsScene, ShowcaseScene};
    use crate::{light::LightKind, scene::SceneBuilder};

    #[test]
    fn cornell_box() {
        let mut builder = SceneBuilder::new();
        CornellBoxScene::insert_into(&mut builder).unwrap();
        assert_eq!(builder.lights().len(), 1);
        assert_eq!(builder.lights()[0].kind, LightKind::Area);
        assert!(builder.triangle_count() > 0);
    }

    #[test]
    fn lights() {
        let mut builder = SceneBuilder::new();
        LightsScene::insert_into(&mut builder).unwrap();
        let kinds: Vec<_> = builder.lights().iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LightKind::Area, LightKind::Point, LightKind::Spot]);
    }

    #[test]
    fn showcase_without_mesh() {
        let mut builder = SceneBuilder::new();
        ShowcaseScene::default().insert_into(&mut builder).unwrap();
        assert_eq!(builder.materials().len(), 11);
        assert_eq!(builder.lights().len(), 1);
    }

    #[test]
    fn showcase_with_missing_mesh() {
        let mut builder = SceneBuilder::new();
        let scene = ShowcaseScene {
            mesh: Some(PathBuf::from("does/not/exist.obj")),
        };
        assert!(scene.insert_into(&mut builder).is_err());
    }
}
