use bitflags::bitflags;
use glow::HasContext;

bitflags! {
    /// Per-draw fixed-function toggles tracked by [`GlState`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RenderFlags: u8 {
        /// Depth comparison against the depth buffer.
        const DEPTH_TEST  = 0b0001;
        /// Depth buffer writes.
        const DEPTH_WRITE = 0b0010;
        /// Blending with the configured blend function.
        const BLEND       = 0b0100;
        /// Back-face culling; front faces wind counter-clockwise.
        const CULL_FACE   = 0b1000;
    }
}

impl RenderFlags {
    /// Depth-tested, depth-writing, back-face culled geometry.
    pub const OPAQUE: Self = Self::DEPTH_TEST.union(Self::DEPTH_WRITE).union(Self::CULL_FACE);
    /// Depth-tested, additively blended geometry that leaves the depth buffer alone.
    pub const ADDITIVE: Self = Self::DEPTH_TEST.union(Self::BLEND);
    /// Fullscreen passes: no depth, no blending.
    pub const FULLSCREEN: Self = Self::empty();
}

/// Manages simple GL state to reduce redundant state changes
#[derive(Debug)]
pub struct GlState {
    // [x, y, width, height]
    viewport: [i32; 4],
    clear_color: [f32; 4],
    flags: RenderFlags,
    // (src_factor, dst_factor)
    blend_func: (u32, u32),
    active_texture_unit: u32,
    framebuffer: Option<glow::Framebuffer>,
}

impl GlState {
    /// Creates a tracker and forces the GL context into the tracked defaults.
    pub fn new(gl: &glow::Context) -> Self {
        unsafe {
            gl.disable(glow::DEPTH_TEST);
            gl.depth_mask(false);
            gl.disable(glow::BLEND);
            gl.disable(glow::CULL_FACE);
            gl.blend_func(glow::ONE, glow::ZERO);
            gl.active_texture(glow::TEXTURE0);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }

        Self {
            viewport: [0, 0, 0, 0],
            clear_color: [0.0, 0.0, 0.0, 0.0],
            flags: RenderFlags::empty(),
            blend_func: (glow::ONE, glow::ZERO),
            active_texture_unit: glow::TEXTURE0,
            framebuffer: None,
        }
    }

    /// Set viewport dimensions
    pub fn viewport(&mut self, gl: &glow::Context, x: i32, y: i32, width: i32, height: i32) -> &mut Self {
        let new_viewport = [x, y, width, height];
        if self.viewport != new_viewport {
            unsafe { gl.viewport(x, y, width, height) };
            self.viewport = new_viewport;
        }
        self
    }

    /// Set clear color
    pub fn clear_color(&mut self, gl: &glow::Context, r: f32, g: f32, b: f32, a: f32) -> &mut Self {
        let new_color = [r, g, b, a];
        if self.clear_color != new_color {
            unsafe { gl.clear_color(r, g, b, a) };
            self.clear_color = new_color;
        }
        self
    }

    /// Applies depth, blend and culling toggles, touching only those that changed.
    pub fn flags(&mut self, gl: &glow::Context, flags: RenderFlags) -> &mut Self {
        let changed = self.flags ^ flags;
        if changed.is_empty() {
            return self;
        }

        let toggle = |cap: u32, on: bool| unsafe {
            if on { gl.enable(cap) } else { gl.disable(cap) }
        };

        if changed.contains(RenderFlags::DEPTH_TEST) {
            toggle(glow::DEPTH_TEST, flags.contains(RenderFlags::DEPTH_TEST));
        }
        if changed.contains(RenderFlags::BLEND) {
            toggle(glow::BLEND, flags.contains(RenderFlags::BLEND));
        }
        if changed.contains(RenderFlags::CULL_FACE) {
            toggle(glow::CULL_FACE, flags.contains(RenderFlags::CULL_FACE));
        }
        if changed.contains(RenderFlags::DEPTH_WRITE) {
            unsafe { gl.depth_mask(flags.contains(RenderFlags::DEPTH_WRITE)) };
        }

        self.flags = flags;
        self
    }

    /// Set blend function
    pub fn blend_func(&mut self, gl: &glow::Context, src: u32, dst: u32) -> &mut Self {
        if self.blend_func != (src, dst) {
            unsafe { gl.blend_func(src, dst) };
            self.blend_func = (src, dst);
        }
        self
    }

    /// Set active texture unit
    pub fn active_texture(&mut self, gl: &glow::Context, texture_unit: u32) -> &mut Self {
        if self.active_texture_unit != texture_unit {
            unsafe { gl.active_texture(texture_unit) };
            self.active_texture_unit = texture_unit;
        }
        self
    }

    /// Binds a framebuffer; `None` selects the default framebuffer.
    pub fn framebuffer(&mut self, gl: &glow::Context, framebuffer: Option<glow::Framebuffer>) -> &mut Self {
        if self.framebuffer != framebuffer {
            unsafe { gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer) };
            self.framebuffer = framebuffer;
        }
        self
    }

    /// Reset all tracked state to GL defaults
    pub fn reset(&mut self, gl: &glow::Context) {
        self.flags(gl, RenderFlags::empty());
        self.blend_func(gl, glow::ONE, glow::ZERO);
        self.active_texture(gl, glow::TEXTURE0);
        self.framebuffer(gl, None);

        // viewport and clear color are owned by whoever renders next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_presets() {
        assert!(RenderFlags::OPAQUE.contains(RenderFlags::DEPTH_WRITE));
        assert!(!RenderFlags::ADDITIVE.contains(RenderFlags::DEPTH_WRITE));
        assert!(RenderFlags::ADDITIVE.contains(RenderFlags::BLEND | RenderFlags::DEPTH_TEST));
        assert!(RenderFlags::FULLSCREEN.is_empty());
    }
}
