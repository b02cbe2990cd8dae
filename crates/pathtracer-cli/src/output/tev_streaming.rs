use std::path::PathBuf;

use anyhow::{Context, Result};
use pathtracer::{color::linear_from_srgb, output::OutputSink};
use rand::{distributions::Alphanumeric, Rng};
use tev_client::{PacketCreateImage, PacketUpdateImage, TevClient};

use crate::utils::Dimensions;

const CHANNEL_NAMES: [&str; 3] = ["R", "G", "B"];

pub struct TevStreaming {
    client: TevClient,
    image_name: String,
    opened: bool,
    dimension: Dimensions,
}

impl TevStreaming {
    pub fn new(
        dimension: Dimensions,
        tev_path: Option<String>,
        tev_hostname: Option<String>,
    ) -> Result<Self> {
        let tev_hostname: String = tev_hostname.unwrap_or("127.0.0.1:14158".into());
        let tev_path: String = tev_path.unwrap_or("./tev".into());

        let try_spawn = |path: PathBuf| -> Result<()> {
            let mut command = std::process::Command::new(path);
            command.arg(format!("--hostname={}", tev_hostname));
            command
                .stdout(std::process::Stdio::null())
                .stdin(std::process::Stdio::null())
                .spawn()?;

            // Give tev some time to open its socket
            std::thread::sleep(std::time::Duration::from_secs(2));
            Ok(())
        };
        let try_connect = || -> Result<TevClient> {
            Ok(TevClient::wrap(std::net::TcpStream::connect(
                &tev_hostname,
            )?))
        };

        log::debug!("Trying tev direct connection");
        let client = match try_connect() {
            Ok(client) => client,
            Err(_) => {
                log::warn!("Can't find tev client, trying to spawn tev");
                try_spawn(tev_path.into())?;
                try_connect()?
            }
        };
        log::info!("Successfully connected to tev");

        fn get_id() -> String {
            rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(7)
                .map(char::from)
                .collect()
        }
        let image_name = format!("pathtraced-{}", get_id());

        Ok(Self {
            client,
            image_name,
            opened: false,
            dimension,
        })
    }
}

/// tev expects linear values: the sRGB encoding of the frame is undone
fn linear_rgb(frame: &image::RgbaImage) -> Vec<f32> {
    frame
        .pixels()
        .flat_map(|p| {
            let [r, g, b, _] = p.0;
            [r, g, b].map(|c| linear_from_srgb(c as f32 / 255.0))
        })
        .collect()
}

impl OutputSink for TevStreaming {
    fn present(&mut self, frame: &image::RgbaImage, _subframe: u32) -> Result<()> {
        let (width, height) = frame.dimensions();
        if (width, height) != (self.dimension.width, self.dimension.height) {
            // The window was resized, a new image is opened with the new size
            self.dimension = Dimensions { width, height };
            self.opened = false;
        }

        if !self.opened {
            self.client.send(PacketCreateImage {
                image_name: &self.image_name,
                grab_focus: true,
                channel_names: &CHANNEL_NAMES[..],
                width,
                height,
            })?;
            self.opened = true;
        }

        let data = linear_rgb(frame);
        self.client
            .send(PacketUpdateImage {
                image_name: &self.image_name,
                grab_focus: false,
                channel_names: &CHANNEL_NAMES[..],
                channel_offsets: &[0, 1, 2],
                channel_strides: &[3, 3, 3],
                x: 0,
                y: 0,
                width,
                height,
                data: &data,
            })
            .context("Can't send Packet to tev client. It may be closed")
    }
}

#[cfg(test)]
mod tests {
    use super::linear_rgb;

    #[test]
    fn interleaved_linear_channels() {
        let frame = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 255, 255, 7]).unwrap();
        let data = linear_rgb(&frame);
        assert_eq!(data.len(), 6);
        let expected = [1.0, 0.0, 0.0, 0.0, 1.0, 1.0];
        for (d, e) in data.iter().zip(expected) {
            assert!((d - e).abs() < 1e-4, "{data:?}");
        }
    }
}
