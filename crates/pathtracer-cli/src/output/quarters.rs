use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::{Context, Result};
use image::{
    codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding},
    ColorType, ImageEncoder, RgbImage,
};
use itertools::iproduct;
use pathtracer::output::OutputSink;

/// Splits each frame in four binary PPM files for a remote viewer.
///
/// `quarter_0.ppm` is the top left quarter, then top right, bottom left and bottom right.
/// With odd dimensions the right and bottom quarters get the extra column / row.
pub struct QuarterOutput {
    pub directory: PathBuf,
}

impl QuarterOutput {
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)
            .with_context(|| format!("Can't create {}", directory.display()))?;
        Ok(Self { directory })
    }

    pub fn quarter_path(&self, index: u32) -> PathBuf {
        self.directory.join(format!("quarter_{index}.ppm"))
    }
}

/// Returns the quarters in file order as `(x, y, width, height)`
pub fn quarters(width: u32, height: u32) -> impl Iterator<Item = (u32, u32, u32, u32)> {
    let (half_w, half_h) = (width / 2, height / 2);
    iproduct!(
        [(0, half_h), (half_h, height - half_h)],
        [(0, half_w), (half_w, width - half_w)]
    )
    .map(|((y, h), (x, w))| (x, y, w, h))
}

impl OutputSink for QuarterOutput {
    fn present(&mut self, frame: &image::RgbaImage, _subframe: u32) -> Result<()> {
        for (i, (x, y, w, h)) in (0..).zip(quarters(frame.width(), frame.height())) {
            let quarter = RgbImage::from_fn(w, h, |qx, qy| {
                let [r, g, b, _] = frame.get_pixel(x + qx, y + qy).0;
                image::Rgb([r, g, b])
            });

            let path = self.quarter_path(i);
            let file = File::create(&path)
                .with_context(|| format!("Can't create {}", path.display()))?;
            PnmEncoder::new(BufWriter::new(file))
                .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
                .write_image(quarter.as_raw(), w, h, ColorType::Rgb8)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pathtracer::output::OutputSink;

    use super::{quarters, QuarterOutput};

    #[test]
    fn quarter_layout() {
        let q: Vec<_> = quarters(4, 2).collect();
        assert_eq!(
            q,
            vec![(0, 0, 2, 1), (2, 0, 2, 1), (0, 1, 2, 1), (2, 1, 2, 1)]
        );

        let q: Vec<_> = quarters(5, 3).collect();
        assert_eq!(
            q,
            vec![(0, 0, 2, 1), (2, 0, 3, 1), (0, 1, 2, 2), (2, 1, 3, 2)]
        );
    }

    #[test]
    fn write_quarters() {
        let dir = tempfile::tempdir().unwrap();
        let mut output = QuarterOutput::new(dir.path().join("quarters")).unwrap();

        // each quarter has its own color
        let frame = image::RgbaImage::from_fn(4, 4, |x, y| {
            let i = (x / 2 + 2 * (y / 2)) as u8;
            image::Rgba([i * 50, 0, 0, 255])
        });
        output.present(&frame, 0).unwrap();

        for i in 0..4u8 {
            let bytes = std::fs::read(output.quarter_path(i as u32)).unwrap();
            assert!(bytes.starts_with(b"P6"));

            let quarter = image::load_from_memory(&bytes).unwrap().to_rgb8();
            assert_eq!(quarter.dimensions(), (2, 2));
            assert!(quarter.pixels().all(|p| p.0 == [i * 50, 0, 0]));
        }
    }
}
