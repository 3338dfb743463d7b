use glow::{HasContext, PixelUnpackData};

use crate::{config::HudConfig, error::Error, gl::GpuRegistry};

/// Storage layout of a 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TextureFormat {
    pub internal_format: i32,
    pub format: u32,
    pub data_type: u32,
}

impl TextureFormat {
    pub const RGBA8: Self = Self {
        internal_format: glow::RGBA8 as i32,
        format: glow::RGBA,
        data_type: glow::UNSIGNED_BYTE,
    };
}

/// A single-level 2D texture with linear filtering and clamped edges.
#[derive(Debug)]
pub(crate) struct Texture2d {
    texture: glow::Texture,
    format: TextureFormat,
    size: (u32, u32),
}

impl Texture2d {
    pub(crate) fn new(
        gl: &glow::Context,
        registry: &mut GpuRegistry,
        format: TextureFormat,
        size: (u32, u32),
    ) -> Result<Self, Error> {
        let texture = registry.create_texture(gl)?;

        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        }

        let mut texture = Self { texture, format, size: (0, 0) };
        texture.allocate(gl, size, None);
        Ok(texture)
    }

    /// Re-specifies the storage at a new size, keeping the same handle.
    pub(crate) fn allocate(&mut self, gl: &glow::Context, size: (u32, u32), pixels: Option<&[u8]>) {
        let (w, h) = (size.0.max(1), size.1.max(1));
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                self.format.internal_format,
                w as i32,
                h as i32,
                0,
                self.format.format,
                self.format.data_type,
                PixelUnpackData::Slice(pixels),
            );
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
        self.size = (w, h);
    }

    /// Overwrites the full texture contents; `pixels` must match the current size.
    pub(crate) fn upload(&self, gl: &glow::Context, pixels: &[u8]) {
        let (w, h) = self.size;
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                0,
                0,
                w as i32,
                h as i32,
                self.format.format,
                self.format.data_type,
                PixelUnpackData::Slice(Some(pixels)),
            );
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    pub(crate) fn bind(&self, gl: &glow::Context) {
        unsafe { gl.bind_texture(glow::TEXTURE_2D, Some(self.texture)) };
    }

    pub(crate) fn handle(&self) -> glow::Texture {
        self.texture
    }

    pub(crate) fn size(&self) -> (u32, u32) {
        self.size
    }
}

/// CPU copy of the HUD raster with a dirty flag.
///
/// The rasterizer writes whole frames of RGBA bytes here; the GPU copy is
/// refreshed on the next render only when the contents changed.
#[derive(Debug, Clone, PartialEq)]
pub struct HudRaster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    dirty: bool,
}

impl HudRaster {
    /// A fully transparent raster that still needs its first upload.
    ///
    /// Each side is clamped to `1..=`[`HudConfig::MAX_RASTER_SIDE`].
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.clamp(1, HudConfig::MAX_RASTER_SIDE);
        let height = height.clamp(1, HudConfig::MAX_RASTER_SIDE);
        Self {
            width,
            height,
            pixels: vec![0; rgba_byte_len(width, height)],
            dirty: true,
        }
    }

    /// Replaces the raster contents with a full RGBA frame.
    ///
    /// # Errors
    /// Returns [`Error::Data`] when `pixels` does not hold exactly
    /// `width * height * 4` bytes; the previous contents are kept.
    pub fn update(&mut self, pixels: &[u8]) -> Result<(), Error> {
        let expected = self.byte_len();
        if pixels.len() != expected {
            return Err(Error::hud_raster_size_mismatch(expected, pixels.len()));
        }

        if self.pixels != pixels {
            self.pixels.copy_from_slice(pixels);
            self.dirty = true;
        }
        Ok(())
    }

    /// Marks the raster for re-upload, e.g. after the GPU copy was lost.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Returns the pixels if an upload is pending and clears the flag.
    pub fn take_dirty(&mut self) -> Option<&[u8]> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(&self.pixels)
    }

    /// `true` while an upload is pending.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Width and height in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size of one full RGBA frame in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        rgba_byte_len(self.width, self.height)
    }

    /// Row-major RGBA bytes, top row first.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

fn rgba_byte_len(width: u32, height: u32) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4)
}

/// GPU side of the HUD: a texture refreshed from a [`HudRaster`].
#[derive(Debug)]
pub(crate) struct HudTexture {
    texture: Texture2d,
}

impl HudTexture {
    pub(crate) fn new(gl: &glow::Context, registry: &mut GpuRegistry, raster: &HudRaster) -> Result<Self, Error> {
        let texture = Texture2d::new(gl, registry, TextureFormat::RGBA8, raster.size())?;
        Ok(Self { texture })
    }

    /// Uploads the raster if it changed since the last flush.
    pub(crate) fn flush(&self, gl: &glow::Context, raster: &mut HudRaster) {
        if let Some(pixels) = raster.take_dirty() {
            self.texture.upload(gl, pixels);
        }
    }

    pub(crate) fn bind(&self, gl: &glow::Context) {
        self.texture.bind(gl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_raster_needs_upload() {
        let mut raster = HudRaster::new(4, 2);
        assert_eq!(raster.byte_len(), 32);
        assert!(raster.take_dirty().is_some());
        assert!(raster.take_dirty().is_none());
    }

    #[test]
    fn test_update_marks_dirty_only_on_change() {
        let mut raster = HudRaster::new(2, 1);
        raster.take_dirty();

        raster.update(&[0; 8]).unwrap();
        assert!(!raster.is_dirty());

        raster.update(&[255, 0, 0, 255, 0, 0, 0, 0]).unwrap();
        assert!(raster.is_dirty());
        assert_eq!(raster.take_dirty(), Some(&[255, 0, 0, 255, 0, 0, 0, 0][..]));
    }

    #[test]
    fn test_update_rejects_wrong_size() {
        let mut raster = HudRaster::new(512, 128);
        raster.take_dirty();

        let err = raster.update(&[0; 16]).unwrap_err();
        assert!(matches!(err, Error::Data(_)));
        assert!(!raster.is_dirty());
    }

    #[test]
    fn test_oversized_raster_is_capped() {
        let raster = HudRaster::new(40_000, 40_000);
        let side = HudConfig::MAX_RASTER_SIDE;
        assert_eq!(raster.size(), (side, side));
        assert_eq!(raster.byte_len(), side as usize * side as usize * 4);
        assert_eq!(raster.pixels().len(), raster.byte_len());
    }

    #[test]
    fn test_zero_sized_raster_is_clamped() {
        let raster = HudRaster::new(0, 0);
        assert_eq!(raster.size(), (1, 1));
        assert_eq!(raster.pixels().len(), 4);
    }
}
