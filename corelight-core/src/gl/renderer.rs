use crate::{error::Error, gl::context::GlState, scene::Scene};

/// Rendering context that provides access to GL state and the frame's scene.
pub struct RenderContext<'a> {
    /// Context the pass draws with.
    pub gl: &'a glow::Context,
    /// Tracked fixed-function state.
    pub state: &'a mut GlState,
    /// Scene as of the current frame.
    pub scene: &'a Scene,
    /// Size of the current render target in device pixels.
    pub viewport: (u32, u32),
    /// Device pixels per CSS pixel.
    pub pixel_ratio: f32,
}

/// Trait for objects that can be rendered.
pub trait Drawable {
    /// Prepares the object for rendering.
    ///
    /// Binds the program, uploads per-frame uniforms and sets the fixed-function
    /// state the object needs.
    ///
    /// # Errors
    /// Returns an error when a resource required for drawing is unavailable.
    fn prepare(&self, context: &mut RenderContext) -> Result<(), Error>;

    /// Performs the actual rendering.
    ///
    /// All necessary state should already be set up from the `prepare()` call.
    fn draw(&self, context: &mut RenderContext);

    /// Cleans up after rendering.
    ///
    /// Unbinds whatever `prepare()` bound so the next drawable starts clean.
    fn cleanup(&self, context: &mut RenderContext);

    /// Runs the full `prepare` → `draw` → `cleanup` sequence.
    ///
    /// # Errors
    /// Propagates failures from [`Drawable::prepare`].
    fn render(&self, context: &mut RenderContext) -> Result<(), Error> {
        self.prepare(context)?;
        self.draw(context);
        self.cleanup(context);
        Ok(())
    }
}
