//! Frame sinks and the drivers feeding them.
use anyhow::{Context, Result};

use crate::{
    controller::{EventQueue, RenderController},
    device::Device,
    scene::Scene,
};

/// Displays or persists frames
pub trait OutputSink {
    fn present(&mut self, frame: &image::RgbaImage, subframe: u32) -> Result<()>;
}

/// Accepts everything. Stands in for a sink that failed.
pub struct DummyOutput;

impl OutputSink for DummyOutput {
    fn present(&mut self, _frame: &image::RgbaImage, _subframe: u32) -> Result<()> {
        Ok(())
    }
}

/// Delivers window input to the controller
pub trait EventSource {
    /// Queue every pending event without blocking
    fn poll_events(&mut self, queue: &mut EventQueue) -> Result<()>;
}

/// A best effort sink: the first failure is logged and the sink is replaced by [DummyOutput]
pub struct Streaming {
    sink: Box<dyn OutputSink>,
    name: &'static str,
}

impl Streaming {
    pub fn new(name: &'static str, sink: Box<dyn OutputSink>) -> Self {
        Self { sink, name }
    }

    pub fn disabled() -> Self {
        Self::new("none", Box::new(DummyOutput))
    }
}

impl OutputSink for Streaming {
    fn present(&mut self, frame: &image::RgbaImage, subframe: u32) -> Result<()> {
        if let Err(err) = self.sink.present(frame, subframe) {
            log::error!("{} output failed, disabling it: {err:#}", self.name);
            self.sink = Box::new(DummyOutput);
        }
        Ok(())
    }
}

/// Render `frames` ticks (at least one), streaming each of them, then hand the final frame to
/// `output` exactly once.
pub fn run_headless<D: Device>(
    controller: &mut RenderController,
    device: &mut D,
    scene: &Scene<D::Traversable>,
    frames: u32,
    stream: &mut dyn OutputSink,
    output: &mut dyn OutputSink,
) -> Result<()> {
    let mut events = EventQueue::new();
    for _ in 0..frames.max(1) {
        controller.tick(device, scene, &mut events)?;
        stream.present(&controller.frame(), controller.subframe_index())?;
    }

    log::info!("{} subframes rendered", controller.subframe_index());
    output
        .present(&controller.frame(), controller.subframe_index())
        .context("Failed to write the output image")
}

/// Tick until a close is requested. Each frame goes to the display then to the stream, and to
/// `snapshot` when a save was requested.
pub fn run_interactive<D: Device>(
    controller: &mut RenderController,
    device: &mut D,
    scene: &Scene<D::Traversable>,
    events: &mut dyn EventSource,
    display: &mut dyn OutputSink,
    stream: &mut dyn OutputSink,
    snapshot: &mut dyn OutputSink,
) -> Result<()> {
    let mut queue = EventQueue::new();
    loop {
        events.poll_events(&mut queue)?;
        controller.tick(device, scene, &mut queue)?;

        let frame = controller.frame();
        display.present(&frame, controller.subframe_index())?;
        stream.present(&frame, controller.subframe_index())?;

        if controller.take_save_request() {
            snapshot
                .present(&frame, controller.subframe_index())
                .context("Failed to save the snapshot")?;
        }
        // The in flight frame is always completed first
        if controller.close_requested() {
            log::info!("closing after {} subframes", controller.subframe_index());
            return Ok(());
        }
    }
}
