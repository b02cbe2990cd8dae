mod file_output;
mod quarters;
mod tev_streaming;
#[cfg(feature = "window")]
mod window;

pub use file_output::FileOutput;
pub use quarters::QuarterOutput;
pub use tev_streaming::TevStreaming;
#[cfg(feature = "window")]
pub use window::{SdlDisplay, SdlEvents, SdlWindow};

use anyhow::Result;
use pathtracer::output::{OutputSink, Streaming};

/// Presents every frame to each of its streams in turn
#[derive(Default)]
pub struct StreamingOutputs {
    outputs: Vec<Streaming>,
}

impl StreamingOutputs {
    pub fn push(&mut self, name: &'static str, sink: Box<dyn OutputSink>) {
        self.outputs.push(Streaming::new(name, sink));
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }
}

impl OutputSink for StreamingOutputs {
    fn present(&mut self, frame: &image::RgbaImage, subframe: u32) -> Result<()> {
        for output in &mut self.outputs {
            output.present(frame, subframe)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use anyhow::{anyhow, Result};
    use pathtracer::output::OutputSink;

    use super::StreamingOutputs;

    struct Counting(Rc<Cell<u32>>, bool);

    impl OutputSink for Counting {
        fn present(&mut self, _frame: &image::RgbaImage, _subframe: u32) -> Result<()> {
            self.0.set(self.0.get() + 1);
            if self.1 {
                Err(anyhow!("closed"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn a_failing_stream_does_not_stop_the_others() {
        let healthy = Rc::new(Cell::new(0));
        let broken = Rc::new(Cell::new(0));
        let mut outputs = StreamingOutputs::default();
        outputs.push("broken", Box::new(Counting(broken.clone(), true)));
        outputs.push("healthy", Box::new(Counting(healthy.clone(), false)));
        assert_eq!(outputs.len(), 2);

        let frame = image::RgbaImage::new(2, 2);
        for i in 0..3 {
            outputs.present(&frame, i).unwrap();
        }
        assert_eq!(healthy.get(), 3);
        assert_eq!(broken.get(), 1);
    }
}
