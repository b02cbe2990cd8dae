use anyhow::{anyhow, Context, Result};
use pathtracer::{
    controller::{EventQueue, InputEvent, Key, MouseButton},
    output::{EventSource, OutputSink},
};
use sdl2::{
    event::{Event, WindowEvent},
    keyboard::Keycode,
    mouse::{MouseButton as SdlButton, MouseWheelDirection},
    pixels::{Color, PixelFormatEnum},
    render::{Canvas, TextureCreator},
    video::{Window, WindowContext},
    EventPump,
};

use crate::utils::Dimensions;

/// An SDL2 window, split in its display half and its input half
pub struct SdlWindow {
    pub display: SdlDisplay,
    pub events: SdlEvents,
}

impl SdlWindow {
    /// With `interop` the frame is written straight into the locked streaming texture,
    /// otherwise it goes through a host side copy.
    pub fn new(title: &str, dim: Dimensions, interop: bool) -> Result<Self> {
        let sdl_context = sdl2::init().map_err(|e| anyhow!(e))?;
        let video_subsystem = sdl_context.video().map_err(|e| anyhow!(e))?;

        let window = video_subsystem
            .window(title, dim.width, dim.height)
            .position_centered()
            .resizable()
            .build()?;

        let mut canvas = window.into_canvas().build()?;
        canvas.set_draw_color(Color::RGB(0, 0, 0));
        canvas.clear();
        canvas.present();

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump().map_err(|e| anyhow!(e))?;
        log::info!(
            "Opened a {dim} window ({})",
            if interop { "locked texture" } else { "host copy" }
        );

        Ok(Self {
            display: SdlDisplay {
                canvas,
                texture_creator,
                interop,
                staging: Vec::new(),
            },
            events: SdlEvents { event_pump },
        })
    }
}

pub struct SdlDisplay {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    interop: bool,
    staging: Vec<u8>,
}

impl OutputSink for SdlDisplay {
    fn present(&mut self, frame: &image::RgbaImage, _subframe: u32) -> Result<()> {
        let (width, height) = frame.dimensions();
        let pitch = 3 * width as usize;
        let mut texture = self
            .texture_creator
            .create_texture_streaming(PixelFormatEnum::RGB24, width, height)?;

        if self.interop {
            texture
                .with_lock(None, |buffer, texture_pitch| {
                    for (row, pixels) in buffer
                        .chunks_exact_mut(texture_pitch)
                        .zip(frame.rows())
                    {
                        for (dst, src) in row[..pitch].chunks_exact_mut(3).zip(pixels) {
                            dst.copy_from_slice(&src.0[..3]);
                        }
                    }
                })
                .map_err(|e| anyhow!(e))?;
        } else {
            self.staging.clear();
            self.staging
                .extend(frame.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]));
            texture
                .update(None, &self.staging, pitch)
                .context("Can't upload the frame to the window")?;
        }

        self.canvas.clear();
        self.canvas
            .copy(&texture, None, None)
            .map_err(|e| anyhow!(e))?;
        self.canvas.present();
        Ok(())
    }
}

pub struct SdlEvents {
    event_pump: EventPump,
}

fn button(button: SdlButton) -> Option<MouseButton> {
    match button {
        SdlButton::Left => Some(MouseButton::Left),
        SdlButton::Right => Some(MouseButton::Right),
        SdlButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

fn key(keycode: Keycode) -> Key {
    match keycode {
        Keycode::Escape | Keycode::Q => Key::Quit,
        Keycode::S => Key::Save,
        _ => Key::Other,
    }
}

impl EventSource for SdlEvents {
    fn poll_events(&mut self, queue: &mut EventQueue) -> Result<()> {
        for event in self.event_pump.poll_iter() {
            let event = match event {
                Event::Quit { .. } => InputEvent::CloseRequested,
                Event::KeyDown {
                    keycode: Some(keycode),
                    ..
                } => InputEvent::Key(key(keycode)),
                Event::MouseButtonDown {
                    mouse_btn, x, y, ..
                }
                | Event::MouseButtonUp {
                    mouse_btn, x, y, ..
                } => {
                    let Some(button) = button(mouse_btn) else {
                        continue;
                    };
                    InputEvent::MouseButton {
                        button,
                        pressed: matches!(event, Event::MouseButtonDown { .. }),
                        x: x as f32,
                        y: y as f32,
                    }
                }
                Event::MouseMotion { x, y, .. } => InputEvent::CursorMoved {
                    x: x as f32,
                    y: y as f32,
                },
                Event::MouseWheel { y, direction, .. } => {
                    let delta = match direction {
                        MouseWheelDirection::Flipped => -y,
                        _ => y,
                    };
                    InputEvent::Scroll {
                        delta: delta as f32,
                    }
                }
                Event::Window { win_event, .. } => match win_event {
                    WindowEvent::SizeChanged(width, height) => InputEvent::Resized {
                        width: width.max(0) as u32,
                        height: height.max(0) as u32,
                    },
                    WindowEvent::Minimized => InputEvent::Minimized(true),
                    WindowEvent::Restored | WindowEvent::Maximized => InputEvent::Minimized(false),
                    WindowEvent::Close => InputEvent::CloseRequested,
                    _ => continue,
                },
                _ => continue,
            };
            queue.push(event);
        }
        Ok(())
    }
}
