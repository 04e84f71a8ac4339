//! Structs and functions for handling textures.
//!
//! The module provides [`ImageData`], a decoded image on the CPU side, and the [`Texture`]
//! struct which is a CPU representation of a GPU texture.

use std::{path::Path, sync::Arc};

use glow::HasContext;
use image::{DynamicImage, GenericImageView};

use crate::error::{ResourceError, allocation};

/// Pixel layout of a texture, chosen from its channel count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Red,
    Rg,
    Rgb,
    Rgba,
}

impl PixelFormat {
    /// Maps a channel count of 1-4 to a format.
    pub fn from_channels(channels: u8) -> Result<Self, ResourceError> {
        match channels {
            1 => Ok(Self::Red),
            2 => Ok(Self::Rg),
            3 => Ok(Self::Rgb),
            4 => Ok(Self::Rgba),
            n => Err(ResourceError::UnsupportedFormat(format!(
                "{} texture channels (expected 1-4)",
                n
            ))),
        }
    }

    /// Number of 8-bit channels per pixel.
    pub fn channels(self) -> u8 {
        match self {
            Self::Red => 1,
            Self::Rg => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// The matching OpenGL format enum.
    pub fn gl_format(self) -> u32 {
        match self {
            Self::Red => glow::RED,
            Self::Rg => glow::RG,
            Self::Rgb => glow::RGB,
            Self::Rgba => glow::RGBA,
        }
    }
}

/// A decoded image, 8 bits per channel, rows stored bottom to top.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl ImageData {
    /// Decodes an image file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| match e {
            image::ImageError::IoError(source) => ResourceError::not_found(path, source),
            other => ResourceError::parse(path.display().to_string(), other.to_string()),
        })?;
        Ok(Self::from_image(image))
    }

    /// Decodes an in-memory image, guessing the format from its contents.
    pub fn decode(bytes: &[u8]) -> Result<Self, ResourceError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| ResourceError::parse("image data", e.to_string()))?;
        Ok(Self::from_image(image))
    }

    /// Flips the image vertically so the first row is the bottom one, as OpenGL expects,
    /// and converts it to 8 bits per channel while keeping its channel count.
    pub fn from_image(image: DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        let channels = image.color().channel_count();
        let image = image.flipv();
        let pixels = match channels {
            1 => image.into_luma8().into_raw(),
            2 => image.into_luma_alpha8().into_raw(),
            3 => image.into_rgb8().into_raw(),
            _ => image.into_rgba8().into_raw(),
        };

        Self {
            width,
            height,
            channels: channels.clamp(1, 4),
            pixels,
        }
    }
}

/// Represents a texture stored on the GPU side.
pub struct Texture {
    gl: Arc<glow::Context>,
    id: Option<glow::Texture>,
    width: u32,
    height: u32,
    format: Option<PixelFormat>,
}

impl Texture {
    /// Uploads a decoded image.
    pub fn new(gl: &Arc<glow::Context>, image: &ImageData) -> Result<Self, ResourceError> {
        Self::from_raw(gl, image.width, image.height, image.channels, &image.pixels)
    }

    /// Decodes an image file and uploads it.
    pub fn load(gl: &Arc<glow::Context>, path: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        let texture = Self::new(gl, &ImageData::open(path)?)?;
        log::debug!(
            "Loaded {} ({}x{}, {} channels)",
            path.display(),
            texture.width,
            texture.height,
            texture.channels()
        );
        Ok(texture)
    }

    /// Creates a new texture from raw pixel data with 1-4 channels per pixel.
    pub fn from_raw(
        gl: &Arc<glow::Context>,
        width: u32,
        height: u32,
        channels: u8,
        data: &[u8],
    ) -> Result<Self, ResourceError> {
        let format = PixelFormat::from_channels(channels)?;
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(ResourceError::UnsupportedFormat(format!(
                "{}x{} texture with {} channels needs {} bytes, got {}",
                width,
                height,
                channels,
                expected,
                data.len()
            )));
        }

        unsafe {
            let texture = gl.create_texture().map_err(allocation("texture"))?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format.gl_format() as i32,
                width as i32,
                height as i32,
                0,
                format.gl_format(),
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(data)),
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::NEAREST as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::NEAREST as i32,
            );
            gl.bind_texture(glow::TEXTURE_2D, None);

            Ok(Self {
                gl: Arc::clone(gl),
                id: Some(texture),
                width,
                height,
                format: Some(format),
            })
        }
    }

    /// Returns the width of the texture.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the texture.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of channels per pixel, or 0 once freed.
    pub fn channels(&self) -> u8 {
        self.format.map_or(0, PixelFormat::channels)
    }

    /// The pixel format, or `None` once freed.
    pub fn format(&self) -> Option<PixelFormat> {
        self.format
    }

    /// The raw GL name, or `None` once freed.
    pub fn handle_id(&self) -> Option<u32> {
        self.id.map(|id| id.0.get())
    }

    pub fn is_live(&self) -> bool {
        self.id.is_some()
    }

    /// Binds the texture to the specified texture unit.
    pub fn bind(&self, unit: u32) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, self.id);
        }
    }

    /// Pairs the texture with a texture unit so it can be written to a sampler uniform.
    pub fn at_unit(&self, unit: u32) -> Sampler<'_> {
        Sampler {
            texture: self,
            unit,
        }
    }

    /// Releases the GPU texture. Calling this again does nothing.
    pub fn free(&mut self) {
        if let Some(id) = self.id.take() {
            unsafe {
                self.gl.delete_texture(id);
            }
        }
        self.width = 0;
        self.height = 0;
        self.format = None;
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.free();
    }
}

/// A texture bound to a texture unit, written to a `sampler2D` uniform as the unit index.
#[derive(Clone, Copy)]
pub struct Sampler<'a> {
    pub texture: &'a Texture,
    pub unit: u32,
}

/// Small PNG fixtures written to the system temp directory.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::PathBuf;

    use image::RgbaImage;

    pub const TOP_ROW: [u8; 4] = [255, 0, 0, 255];
    pub const BOTTOM_ROW: [u8; 4] = [0, 0, 255, 128];

    /// Writes a 2x2 RGBA PNG whose top row is [`TOP_ROW`] and bottom row [`BOTTOM_ROW`].
    pub fn write_rgba_2x2(name: &str) -> PathBuf {
        let image = RgbaImage::from_fn(2, 2, |_, y| {
            image::Rgba(if y == 0 { TOP_ROW } else { BOTTOM_ROW })
        });
        let path = std::env::temp_dir().join(format!(
            "glrender-{}-{}.png",
            std::process::id(),
            name
        ));
        image.save(&path).unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, RgbaImage};

    use super::{fixtures::*, *};

    #[test]
    fn channel_counts_map_to_formats() {
        let expected = [
            (1, PixelFormat::Red, glow::RED),
            (2, PixelFormat::Rg, glow::RG),
            (3, PixelFormat::Rgb, glow::RGB),
            (4, PixelFormat::Rgba, glow::RGBA),
        ];
        for (channels, format, gl_format) in expected {
            let selected = PixelFormat::from_channels(channels).unwrap();
            assert_eq!(selected, format);
            assert_eq!(selected.gl_format(), gl_format);
            assert_eq!(selected.channels(), channels);
        }
    }

    #[test]
    fn unsupported_channel_counts() {
        for channels in [0, 5, 8, 255] {
            assert!(matches!(
                PixelFormat::from_channels(channels),
                Err(ResourceError::UnsupportedFormat(_))
            ));
        }
    }

    fn encode_png(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decode_flips_rows() {
        let top = [255, 0, 0, 255];
        let bottom = [0, 0, 255, 128];
        let image = RgbaImage::from_fn(2, 2, |_, y| {
            image::Rgba(if y == 0 { top } else { bottom })
        });

        let decoded = ImageData::decode(&encode_png(DynamicImage::ImageRgba8(image))).unwrap();
        assert_eq!(decoded.width, 2);
        assert_eq!(decoded.height, 2);
        assert_eq!(decoded.channels, 4);
        assert_eq!(decoded.pixels.len(), 16);
        assert_eq!(&decoded.pixels[0..4], &bottom);
        assert_eq!(&decoded.pixels[12..16], &top);
    }

    #[test]
    fn decode_keeps_channel_count() {
        let gray = image::GrayImage::from_pixel(3, 1, image::Luma([7]));
        let decoded = ImageData::decode(&encode_png(DynamicImage::ImageLuma8(gray))).unwrap();
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.pixels, vec![7, 7, 7]);

        let rgb = image::RgbImage::from_pixel(1, 2, image::Rgb([1, 2, 3]));
        let decoded = ImageData::decode(&encode_png(DynamicImage::ImageRgb8(rgb))).unwrap();
        assert_eq!(decoded.channels, 3);
        assert_eq!(decoded.pixels.len(), 6);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            ImageData::decode(b"definitely not an image"),
            Err(ResourceError::ParseFailure { .. })
        ));
    }

    #[test]
    fn open_rgba_file() {
        let path = write_rgba_2x2("open_rgba_file");
        let decoded = ImageData::open(&path);
        std::fs::remove_file(&path).unwrap();

        let decoded = decoded.unwrap();
        assert_eq!((decoded.width, decoded.height, decoded.channels), (2, 2, 4));
        assert_eq!(decoded.pixels.len(), 16);
        assert_eq!(&decoded.pixels[0..4], &BOTTOM_ROW);
        assert_eq!(&decoded.pixels[4..8], &BOTTOM_ROW);
        assert_eq!(&decoded.pixels[8..12], &TOP_ROW);
        assert_eq!(PixelFormat::from_channels(decoded.channels).unwrap(), PixelFormat::Rgba);
    }

    #[test]
    fn open_missing_file() {
        assert!(matches!(
            ImageData::open("does/not/exist.png"),
            Err(ResourceError::NotFound { .. })
        ));
    }
}
