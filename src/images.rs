//! Reference image loading: filesystem path or `http(s)` URL, decoded into an
//! egui texture. A failure is a state, not a crash.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use crate::variant::is_url;

#[derive(Default)]
pub enum ImageState {
    #[default]
    Empty,
    Loading {
        location: String,
    },
    Loaded {
        location: String,
        texture: egui::TextureHandle,
        size: [usize; 2],
    },
    Failed {
        location: String,
        reason: String,
    },
}

impl ImageState {
    pub fn from_result(ctx: &egui::Context, location: String, result: Result<egui::ColorImage>) -> Self {
        match result {
            Ok(image) => {
                let size = image.size;
                debug!("loaded {} ({}x{})", location, size[0], size[1]);
                let texture = ctx.load_texture(location.clone(), image, Default::default());
                ImageState::Loaded {
                    location,
                    texture,
                    size,
                }
            }
            Err(e) => {
                warn!("failed to load image {}: {:#}", location, e);
                ImageState::Failed {
                    location,
                    reason: format!("{:#}", e),
                }
            }
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            ImageState::Empty => None,
            ImageState::Loading { location }
            | ImageState::Loaded { location, .. }
            | ImageState::Failed { location, .. } => Some(location),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ImageState::Loaded { .. })
    }
}

pub fn decode(bytes: &[u8]) -> Result<egui::ColorImage> {
    let image = image::load_from_memory(bytes).context("Failed to decode image")?;
    let rgba = image.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    if size[0] == 0 || size[1] == 0 {
        bail!("image has no pixels");
    }
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

fn fetch(url: &str) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let res = client
        .get(url)
        .send()
        .with_context(|| format!("Failed to fetch {}", url))?;
    if !res.status().is_success() {
        bail!("{} returned {}", url, res.status());
    }
    Ok(res.bytes()?.to_vec())
}

/// Blocking; run it off the UI thread.
pub fn load_color_image(location: &str) -> Result<egui::ColorImage> {
    let bytes = if is_url(location) {
        fetch(location)?
    } else {
        std::fs::read(location).with_context(|| format!("Failed to read {}", location))?
    };
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(vec![]);
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_png() {
        let img = decode(&png(4, 3)).unwrap();
        assert_eq!(img.size, [4, 3]);
        assert_eq!(img.pixels[0], egui::Color32::from_rgb(10, 20, 30));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode(b"definitely not an image").is_err());
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face_female.png");
        std::fs::write(&path, png(2, 2)).unwrap();

        let img = load_color_image(path.to_str().unwrap()).unwrap();
        assert_eq!(img.size, [2, 2]);
        assert!(load_color_image(dir.path().join("missing.png").to_str().unwrap()).is_err());
    }
}
