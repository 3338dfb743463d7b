use glow::HasContext;

use crate::{
    error::Error,
    gl::{GlState, GpuRegistry, Texture2d, TextureFormat},
};

/// Offscreen framebuffer with a color texture and an optional depth buffer.
///
/// Resizing re-specifies storage on the same handles, so the registry never
/// sees more than one registration per attachment.
#[derive(Debug)]
pub(crate) struct RenderTarget {
    label: &'static str,
    framebuffer: glow::Framebuffer,
    color: Texture2d,
    depth: Option<glow::Renderbuffer>,
}

impl RenderTarget {
    pub(crate) fn new(
        gl: &glow::Context,
        registry: &mut GpuRegistry,
        label: &'static str,
        size: (u32, u32),
        with_depth: bool,
    ) -> Result<Self, Error> {
        let framebuffer = registry.create_framebuffer(gl)?;
        let color = Texture2d::new(gl, registry, TextureFormat::RGBA8, size)?;
        let depth = if with_depth { Some(registry.create_renderbuffer(gl)?) } else { None };

        let target = Self { label, framebuffer, color, depth };
        target.attach(gl)?;
        Ok(target)
    }

    /// Reallocates attachment storage for a new size; a no-op if unchanged.
    pub(crate) fn resize(&mut self, gl: &glow::Context, size: (u32, u32)) -> Result<(), Error> {
        let size = (size.0.max(1), size.1.max(1));
        if self.color.size() == size {
            return Ok(());
        }

        self.color.allocate(gl, size, None);
        self.attach(gl)
    }

    fn attach(&self, gl: &glow::Context) -> Result<(), Error> {
        let (w, h) = self.color.size();
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.framebuffer));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(self.color.handle()),
                0,
            );

            if let Some(depth) = self.depth {
                gl.bind_renderbuffer(glow::RENDERBUFFER, Some(depth));
                gl.renderbuffer_storage(glow::RENDERBUFFER, glow::DEPTH_COMPONENT24, w as i32, h as i32);
                gl.framebuffer_renderbuffer(
                    glow::FRAMEBUFFER,
                    glow::DEPTH_ATTACHMENT,
                    glow::RENDERBUFFER,
                    Some(depth),
                );
                gl.bind_renderbuffer(glow::RENDERBUFFER, None);
            }
        }

        let status = unsafe { gl.check_framebuffer_status(glow::FRAMEBUFFER) };
        unsafe { gl.bind_framebuffer(glow::FRAMEBUFFER, None) };

        if status != glow::FRAMEBUFFER_COMPLETE {
            return Err(Error::framebuffer_incomplete(self.label, status));
        }
        Ok(())
    }

    /// Binds the framebuffer and sets a matching viewport.
    pub(crate) fn bind(&self, gl: &glow::Context, state: &mut GlState) {
        let (w, h) = self.color.size();
        state
            .framebuffer(gl, Some(self.framebuffer))
            .viewport(gl, 0, 0, w as i32, h as i32);
    }

    pub(crate) fn color(&self) -> &Texture2d {
        &self.color
    }

    pub(crate) fn size(&self) -> (u32, u32) {
        self.color.size()
    }
}

/// Size of a reduced-resolution buffer, never smaller than one pixel.
pub(crate) fn scaled_size(size: (u32, u32), divisor: u32) -> (u32, u32) {
    let divisor = divisor.max(1);
    ((size.0 / divisor).max(1), (size.1 / divisor).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_size_never_zero() {
        assert_eq!(scaled_size((1600, 1200), 2), (800, 600));
        assert_eq!(scaled_size((1, 1), 2), (1, 1));
        assert_eq!(scaled_size((0, 0), 2), (1, 1));
        assert_eq!(scaled_size((801, 3), 0), (801, 3));
    }
}
