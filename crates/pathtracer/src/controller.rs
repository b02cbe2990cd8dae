//! Progressive render loop.
//!
//! The controller owns the camera and the accumulation buffer. Input is queued by whoever
//! listens to the window and drained at the start of each tick. A tick is at most one device
//! launch: when nothing changed, it adds one batch of samples to the running average, otherwise
//! it restarts the average.
use std::collections::VecDeque;

use glam::Vec4;

use crate::{
    camera::{Camera, CameraFrame, Trackball, ViewMode},
    color::rgba8_from_linear,
    device::{Device, LaunchParams},
    error::DeviceError,
    scene::Scene,
};

bitflags::bitflags! {
    /// What must be recomputed before the next launch
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Dirty: u8 {
        const CAMERA = 1 << 0;
        const RESOLUTION = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Dirty(Dirty),
    /// Only observable from within a tick
    Rendering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Snapshot the current frame
    Save,
    Quit,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    MouseButton {
        button: MouseButton,
        pressed: bool,
        x: f32,
        y: f32,
    },
    CursorMoved {
        x: f32,
        y: f32,
    },
    Resized {
        width: u32,
        height: u32,
    },
    Minimized(bool),
    /// Positive is away from the user
    Scroll {
        delta: f32,
    },
    Key(Key),
    SetCamera(Camera),
    CloseRequested,
}

#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<InputEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Extend<InputEvent> for EventQueue {
    fn extend<I: IntoIterator<Item = InputEvent>>(&mut self, iter: I) {
        self.events.extend(iter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub samples_per_launch: u32,
    pub max_depth: u32,
    /// Given a seed, rendering is deterministic
    pub seed: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            samples_per_launch: 4,
            max_depth: 6,
            seed: 0,
        }
    }
}

/// Running mean of the radiance of each pixel, row major
#[derive(Debug, Clone)]
pub struct AccumulationBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Vec4>,
}

impl AccumulationBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec4::ZERO; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Vec4] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec4> {
        if x >= self.width {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Fold batch `subframe` (0 based) into the average: the first batch overwrites it
    pub fn accumulate(&mut self, batch: &[Vec4], subframe: u32) {
        debug_assert_eq!(batch.len(), self.pixels.len());
        if subframe == 0 {
            self.pixels.copy_from_slice(batch);
        } else {
            let t = 1.0 / (subframe as f32 + 1.0);
            for (acc, &b) in self.pixels.iter_mut().zip(batch) {
                *acc = acc.lerp(b, t);
            }
        }
    }

    /// 8 bits sRGB image of the current average
    pub fn to_rgba8(&self) -> image::RgbaImage {
        let bytes = self
            .pixels
            .iter()
            .flat_map(|&p| rgba8_from_linear(p.truncate().extend(1.0)))
            .collect();
        // The buffer always holds width * height pixels
        image::RgbaImage::from_raw(self.width, self.height, bytes)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }
}

pub struct RenderController {
    state: ControllerState,
    options: RenderOptions,
    camera: Camera,
    trackball: Trackball,
    frame: CameraFrame,
    width: u32,
    height: u32,
    minimized: bool,
    held_button: Option<MouseButton>,
    accumulation: AccumulationBuffer,
    batch: Vec<Vec4>,
    subframe_index: u32,
    save_requested: bool,
    close_requested: bool,
}

impl RenderController {
    /// Sizes are clamped to at least one pixel. The first tick renders from scratch.
    pub fn new(camera: Camera, width: u32, height: u32, options: RenderOptions) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let camera = Camera {
            aspect_ratio: width as f32 / height as f32,
            ..camera
        };

        Self {
            state: ControllerState::Dirty(Dirty::CAMERA),
            options,
            trackball: Trackball::new(&camera),
            frame: camera.frame(),
            camera,
            width,
            height,
            minimized: false,
            held_button: None,
            accumulation: AccumulationBuffer::new(width, height),
            batch: vec![Vec4::ZERO; width as usize * height as usize],
            subframe_index: 0,
            save_requested: false,
            close_requested: false,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn subframe_index(&self) -> u32 {
        self.subframe_index
    }

    pub fn accumulation(&self) -> &AccumulationBuffer {
        &self.accumulation
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Returns whether a snapshot was requested since the last call
    pub fn take_save_request(&mut self) -> bool {
        std::mem::take(&mut self.save_requested)
    }

    pub fn frame(&self) -> image::RgbaImage {
        self.accumulation.to_rgba8()
    }

    fn mark(&mut self, flags: Dirty) {
        self.state = match self.state {
            ControllerState::Dirty(current) => ControllerState::Dirty(current | flags),
            _ => ControllerState::Dirty(flags),
        };
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::MouseButton {
                button,
                pressed: true,
                x,
                y,
            } => {
                self.held_button = Some(button);
                self.trackball.start_tracking(x, y);
            }
            InputEvent::MouseButton { pressed: false, .. } => {
                self.held_button = None;
                self.trackball.stop_tracking();
            }
            InputEvent::CursorMoved { x, y } => {
                let view_mode = match self.held_button {
                    Some(MouseButton::Left) => ViewMode::LookAtFixed,
                    Some(MouseButton::Right) => ViewMode::EyeFixed,
                    _ => return,
                };
                self.trackball.view_mode = view_mode;
                if self.trackball.update_tracking(x, y, &mut self.camera) {
                    self.mark(Dirty::CAMERA);
                }
            }
            InputEvent::Scroll { delta } => {
                if self.trackball.wheel(delta, &mut self.camera) {
                    self.mark(Dirty::CAMERA);
                }
            }
            InputEvent::Resized { width, height } => {
                if self.minimized {
                    log::debug!("ignoring resize to {width}x{height} while minimized");
                    return;
                }
                self.width = width.max(1);
                self.height = height.max(1);
                self.camera.aspect_ratio = self.width as f32 / self.height as f32;
                self.mark(Dirty::RESOLUTION | Dirty::CAMERA);
            }
            InputEvent::Minimized(minimized) => self.minimized = minimized,
            InputEvent::SetCamera(camera) => {
                self.camera = Camera {
                    aspect_ratio: self.width as f32 / self.height as f32,
                    ..camera
                };
                self.trackball.reinit_from_camera(&self.camera);
                self.mark(Dirty::CAMERA);
            }
            InputEvent::Key(Key::Save) => self.save_requested = true,
            InputEvent::Key(Key::Quit) | InputEvent::CloseRequested => {
                self.close_requested = true
            }
            InputEvent::Key(Key::Other) => {}
        }
    }

    /// Drain the queue, then launch once and fold the batch into the average
    pub fn tick<D: Device>(
        &mut self,
        device: &mut D,
        scene: &Scene<D::Traversable>,
        events: &mut EventQueue,
    ) -> Result<(), DeviceError> {
        for event in events.drain() {
            self.handle_event(event);
        }

        if let ControllerState::Dirty(flags) = self.state {
            self.subframe_index = 0;
            if flags.contains(Dirty::RESOLUTION) {
                log::debug!("resizing accumulation buffer to {}x{}", self.width, self.height);
                self.accumulation = AccumulationBuffer::new(self.width, self.height);
                self.batch = vec![Vec4::ZERO; self.accumulation.len()];
            }
            self.frame = self.camera.frame();
        }
        self.state = ControllerState::Rendering;

        let params = LaunchParams {
            width: self.width,
            height: self.height,
            samples_per_launch: self.options.samples_per_launch,
            max_depth: self.options.max_depth,
            subframe_index: self.subframe_index,
            seed: self.options.seed,
            eye: self.frame.eye,
            u: self.frame.u,
            v: self.frame.v,
            w: self.frame.w,
            lights: scene.light_buffer(),
            handle: scene.handle(),
        };
        log::trace!("launch subframe {}", self.subframe_index);
        device.launch(&params, scene.sbt(), &mut self.batch)?;
        device.synchronize()?;

        self.accumulation.accumulate(&self.batch, self.subframe_index);
        self.subframe_index += 1;
        self.state = ControllerState::Idle;
        Ok(())
    }
}
