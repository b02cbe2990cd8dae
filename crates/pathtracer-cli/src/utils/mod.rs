use core::fmt::Display;
use std::path::PathBuf;

use clap::ValueEnum;
use pathtracer::{
    scene::{
        examples::{CornellBoxScene, LightsScene, ShowcaseScene},
        SceneBuilder,
    },
    SceneError,
};

#[derive(Debug, Default, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum AvailableScene {
    #[default]
    Showcase,
    CornellBox,
    Lights,
}

impl AvailableScene {
    /// `mesh` is only used by the showcase
    pub fn insert_into(
        self,
        scene: &mut SceneBuilder,
        mesh: Option<PathBuf>,
    ) -> Result<(), SceneError> {
        if mesh.is_some() && self != AvailableScene::Showcase {
            log::warn!("--mesh is only used by the showcase scene");
        }
        match self {
            AvailableScene::Showcase => ShowcaseScene { mesh }.insert_into(scene),
            AvailableScene::CornellBox => CornellBoxScene::insert_into(scene),
            AvailableScene::Lights => LightsScene::insert_into(scene),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash)]
pub enum AvailableOutput {
    /// Stream frames to a tev instance
    Tev,
    /// Write each frame as four PPM quarters
    Quarters,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl std::str::FromStr for Dimensions {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((a, b)) = s.split_once('x') else {
            return Err(anyhow::anyhow!("Incorrect format, expected <width>x<height>"));
        };
        let width: u32 = a.trim().parse()?;
        let height: u32 = b.trim().parse()?;
        if width == 0 || height == 0 {
            return Err(anyhow::anyhow!("Dimensions must be at least 1x1"));
        }

        Ok(Dimensions { width, height })
    }
}

impl Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}x{}", self.width, self.height))
    }
}
