use tracing::debug;

use crate::{
    GlslVersion,
    error::Error,
    gl::{GlState, GpuRegistry, HudRaster, post::PostChain, scene_pass::ScenePass},
    sim::Session,
    surface::Surface,
};

/// GPU side of one backdrop session.
///
/// Owns every GL object it creates through a single [`GpuRegistry`], so
/// [`SceneRenderer::dispose`] releases all of them exactly once. The frame
/// itself is rendered as base pass → bloom composite → FXAA → default framebuffer.
#[derive(Debug)]
pub struct SceneRenderer {
    registry: GpuRegistry,
    scene_pass: ScenePass,
    post: PostChain,
    hud_raster: HudRaster,
    physical_size: (u32, u32),
    pixel_ratio: f32,
    disposed: bool,
}

impl SceneRenderer {
    /// Builds the full pipeline for `session`, sized to `surface`.
    ///
    /// # Errors
    /// Returns an error if a shader fails to compile or link, or a GL object
    /// cannot be created. Anything created before the failure is released.
    pub fn new(
        gl: &glow::Context,
        glsl: GlslVersion,
        session: &Session,
        surface: &Surface,
    ) -> Result<Self, Error> {
        let config = session.config();
        let size = surface.physical_size();
        let hud_raster = HudRaster::new(config.hud.width, config.hud.height);

        let mut registry = GpuRegistry::new();
        let passes = ScenePass::new(gl, &mut registry, glsl, config, &session.scene, &hud_raster, size)
            .and_then(|scene_pass| {
                let post = PostChain::new(gl, &mut registry, glsl, config, size)?;
                Ok((scene_pass, post))
            });

        let (scene_pass, post) = match passes {
            Ok(passes) => passes,
            Err(e) => {
                registry.dispose(gl);
                return Err(e);
            },
        };

        debug!(
            resources = registry.len(),
            width = size.0,
            height = size.1,
            "render pipeline created"
        );

        Ok(Self {
            registry,
            scene_pass,
            post,
            hud_raster,
            physical_size: size,
            pixel_ratio: surface.pixel_ratio(),
            disposed: false,
        })
    }

    /// Resizes every size-dependent target to the surface's backing store.
    ///
    /// Calling it again with an unchanged surface does nothing.
    ///
    /// # Errors
    /// Returns an error if a resized framebuffer is incomplete.
    pub fn resize(&mut self, gl: &glow::Context, surface: &Surface) -> Result<(), Error> {
        let size = surface.physical_size();
        self.pixel_ratio = surface.pixel_ratio();
        if self.disposed || size == self.physical_size {
            return Ok(());
        }

        self.scene_pass.resize(gl, size)?;
        self.post.resize(gl, size)?;
        self.physical_size = size;
        Ok(())
    }

    /// Replaces the HUD raster; the texture is refreshed on the next render.
    ///
    /// # Errors
    /// Returns [`Error::Data`] if `pixels` does not match [`Self::hud_size`].
    pub fn update_hud(&mut self, pixels: &[u8]) -> Result<(), Error> {
        self.hud_raster.update(pixels)
    }

    /// HUD raster size in pixels.
    #[must_use]
    pub fn hud_size(&self) -> (u32, u32) {
        self.hud_raster.size()
    }

    /// Renders one frame of `session` to the default framebuffer.
    ///
    /// GL state tracked by `state` is reset afterwards, even on failure.
    ///
    /// # Errors
    /// Propagates failures from the base pass.
    pub fn render(&mut self, gl: &glow::Context, state: &mut GlState, session: &Session) -> Result<(), Error> {
        if self.disposed {
            return Ok(());
        }

        self.scene_pass
            .upload(gl, session.particles.live(), &mut self.hud_raster);

        let result = self
            .scene_pass
            .render(gl, state, &session.scene, self.pixel_ratio)
            .map(|target| self.post.apply(gl, state, target.color()));

        state.reset(gl);
        result
    }

    /// Deletes every GL object of the session; later calls return 0.
    pub fn dispose(&mut self, gl: &glow::Context) -> usize {
        self.disposed = true;
        self.registry.dispose(gl)
    }

    /// Drops all handles without deleting them, for a context that is
    /// already lost. The renderer is unusable afterwards.
    pub fn abandon(&mut self) -> usize {
        self.disposed = true;
        self.hud_raster.invalidate();
        self.registry.abandon()
    }

    /// Number of live GL objects owned by this renderer.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.registry.len()
    }

    /// `true` once the GL objects were released or abandoned.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Drawing-buffer size the pipeline is currently configured for.
    #[must_use]
    pub fn physical_size(&self) -> (u32, u32) {
        self.physical_size
    }
}
