use std::path::PathBuf;

use anyhow::{Context, Result};
use pathtracer::output::OutputSink;

/// Saves every presented frame to `path`, the format is deduced from the extension
pub struct FileOutput {
    pub path: PathBuf,
}

impl FileOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputSink for FileOutput {
    fn present(&mut self, frame: &image::RgbaImage, subframe: u32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        log::info!("Saving {} ({subframe} subframes)", self.path.display());
        frame
            .save(&self.path)
            .with_context(|| format!("Can't save {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use pathtracer::output::OutputSink;

    use super::FileOutput;

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renders/frame.png");
        let frame = image::RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));

        FileOutput::new(&path).present(&frame, 1).unwrap();

        let saved = image::open(&path).unwrap().to_rgba8();
        assert_eq!(saved.dimensions(), (4, 3));
        assert_eq!(saved.get_pixel(3, 2), &image::Rgba([10, 20, 30, 255]));
    }
}
