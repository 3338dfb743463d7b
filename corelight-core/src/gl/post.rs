//! Fullscreen post-processing: bloom with filmic tone mapping, then FXAA.
//!
//! Passes are chained through intermediate targets sized to the drawing
//! surface; the last pass always writes to the default framebuffer.

use std::fmt::Debug;

use glow::HasContext;
use tracing::debug;

use crate::{
    GlslVersion,
    config::BackdropConfig,
    error::Error,
    gl::{
        GlState, GpuRegistry, RenderFlags, ShaderProgram, Texture2d,
        mesh::FullscreenTriangle,
        target::{RenderTarget, scaled_size},
    },
};

const FULLSCREEN_VERT: &str = include_str!("../shaders/fullscreen.vert");

/// One fullscreen step of the post chain.
pub(crate) trait PostPass: Debug {
    fn name(&self) -> &'static str;

    /// Adapts size-dependent resources to a new drawing-buffer size.
    fn resize(&mut self, gl: &glow::Context, size: (u32, u32)) -> Result<(), Error>;

    /// Reads `input` and writes into `output`, or into the default
    /// framebuffer of `size` when `output` is `None`.
    fn apply(
        &self,
        gl: &glow::Context,
        state: &mut GlState,
        quad: &FullscreenTriangle,
        input: &Texture2d,
        output: Option<&RenderTarget>,
        size: (u32, u32),
    );
}

fn bind_output(gl: &glow::Context, state: &mut GlState, output: Option<&RenderTarget>, size: (u32, u32)) {
    match output {
        Some(target) => target.bind(gl, state),
        None => {
            state
                .framebuffer(gl, None)
                .viewport(gl, 0, 0, size.0 as i32, size.1 as i32);
        },
    }
}

fn bind_sampler(gl: &glow::Context, state: &mut GlState, unit: u32, texture: &Texture2d) {
    state.active_texture(gl, glow::TEXTURE0 + unit);
    texture.bind(gl);
}

/// Tap spacing of the separable blur, in source texels, for a bloom radius.
#[must_use]
pub fn blur_spread(radius: f32) -> f32 {
    1.0 + radius.max(0.0) * 4.0
}

/// Size of one texel in UV units; degenerate sizes count as one pixel.
#[must_use]
pub fn inverse_resolution(size: (u32, u32)) -> [f32; 2] {
    [1.0 / size.0.max(1) as f32, 1.0 / size.1.max(1) as f32]
}

/// Threshold, half-resolution separable blur, and additive composite
/// followed by ACES filmic tone mapping and sRGB encoding.
#[derive(Debug)]
pub(crate) struct BloomPass {
    bright: ShaderProgram,
    blur: ShaderProgram,
    composite: ShaderProgram,
    u_bright_source: glow::UniformLocation,
    u_threshold: Option<glow::UniformLocation>,
    u_blur_source: glow::UniformLocation,
    u_direction: Option<glow::UniformLocation>,
    u_scene: glow::UniformLocation,
    u_bloom: glow::UniformLocation,
    u_strength: Option<glow::UniformLocation>,
    u_exposure: Option<glow::UniformLocation>,
    // bright pass and vertical blur land in `ping`, horizontal blur in `pong`
    ping: RenderTarget,
    pong: RenderTarget,
    threshold: f32,
    strength: f32,
    spread: f32,
    exposure: f32,
}

impl BloomPass {
    const BRIGHT_FRAG: &'static str = include_str!("../shaders/bright.frag");
    const BLUR_FRAG: &'static str = include_str!("../shaders/blur.frag");
    const COMPOSITE_FRAG: &'static str = include_str!("../shaders/composite.frag");

    pub(crate) fn new(
        gl: &glow::Context,
        registry: &mut GpuRegistry,
        glsl: GlslVersion,
        config: &BackdropConfig,
        size: (u32, u32),
    ) -> Result<Self, Error> {
        let bright = ShaderProgram::create(gl, registry, glsl, FULLSCREEN_VERT, Self::BRIGHT_FRAG)?;
        let blur = ShaderProgram::create(gl, registry, glsl, FULLSCREEN_VERT, Self::BLUR_FRAG)?;
        let composite = ShaderProgram::create(gl, registry, glsl, FULLSCREEN_VERT, Self::COMPOSITE_FRAG)?;

        let half = scaled_size(size, 2);
        Ok(Self {
            u_bright_source: bright.required_uniform(gl, "u_source")?,
            u_threshold: bright.uniform(gl, "u_threshold"),
            u_blur_source: blur.required_uniform(gl, "u_source")?,
            u_direction: blur.uniform(gl, "u_direction"),
            u_scene: composite.required_uniform(gl, "u_scene")?,
            u_bloom: composite.required_uniform(gl, "u_bloom")?,
            u_strength: composite.uniform(gl, "u_strength"),
            u_exposure: composite.uniform(gl, "u_exposure"),
            ping: RenderTarget::new(gl, registry, "bloom-ping", half, false)?,
            pong: RenderTarget::new(gl, registry, "bloom-pong", half, false)?,
            bright,
            blur,
            composite,
            threshold: config.bloom.threshold,
            strength: config.bloom.strength,
            spread: blur_spread(config.bloom.radius),
            exposure: config.exposure,
        })
    }

    fn blur_into(
        &self,
        gl: &glow::Context,
        state: &mut GlState,
        quad: &FullscreenTriangle,
        source: &RenderTarget,
        target: &RenderTarget,
        axis: [f32; 2],
    ) {
        let [tx, ty] = inverse_resolution(source.size());
        target.bind(gl, state);
        bind_sampler(gl, state, 0, source.color());
        unsafe {
            gl.uniform_2_f32(self.u_direction.as_ref(), axis[0] * tx * self.spread, axis[1] * ty * self.spread);
        }
        quad.draw(gl);
    }
}

impl PostPass for BloomPass {
    fn name(&self) -> &'static str {
        "bloom"
    }

    fn resize(&mut self, gl: &glow::Context, size: (u32, u32)) -> Result<(), Error> {
        let half = scaled_size(size, 2);
        self.ping.resize(gl, half)?;
        self.pong.resize(gl, half)
    }

    fn apply(
        &self,
        gl: &glow::Context,
        state: &mut GlState,
        quad: &FullscreenTriangle,
        input: &Texture2d,
        output: Option<&RenderTarget>,
        size: (u32, u32),
    ) {
        state.flags(gl, RenderFlags::FULLSCREEN);

        // bright pass, downsampled
        self.ping.bind(gl, state);
        self.bright.use_program(gl);
        bind_sampler(gl, state, 0, input);
        unsafe {
            gl.uniform_1_i32(Some(&self.u_bright_source), 0);
            gl.uniform_1_f32(self.u_threshold.as_ref(), self.threshold);
        }
        quad.draw(gl);

        self.blur.use_program(gl);
        unsafe { gl.uniform_1_i32(Some(&self.u_blur_source), 0) };
        self.blur_into(gl, state, quad, &self.ping, &self.pong, [1.0, 0.0]);
        self.blur_into(gl, state, quad, &self.pong, &self.ping, [0.0, 1.0]);

        bind_output(gl, state, output, size);
        self.composite.use_program(gl);
        bind_sampler(gl, state, 0, input);
        bind_sampler(gl, state, 1, self.ping.color());
        unsafe {
            gl.uniform_1_i32(Some(&self.u_scene), 0);
            gl.uniform_1_i32(Some(&self.u_bloom), 1);
            gl.uniform_1_f32(self.u_strength.as_ref(), self.strength);
            gl.uniform_1_f32(self.u_exposure.as_ref(), self.exposure);
        }
        quad.draw(gl);

        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, None);
            state.active_texture(gl, glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.use_program(None);
        }
    }
}

/// Fast approximate anti-aliasing over the tone-mapped image.
#[derive(Debug)]
pub(crate) struct FxaaPass {
    shader: ShaderProgram,
    u_source: glow::UniformLocation,
    u_inverse_resolution: Option<glow::UniformLocation>,
    inverse_resolution: [f32; 2],
}

impl FxaaPass {
    const FXAA_FRAG: &'static str = include_str!("../shaders/fxaa.frag");

    pub(crate) fn new(
        gl: &glow::Context,
        registry: &mut GpuRegistry,
        glsl: GlslVersion,
        size: (u32, u32),
    ) -> Result<Self, Error> {
        let shader = ShaderProgram::create(gl, registry, glsl, FULLSCREEN_VERT, Self::FXAA_FRAG)?;
        Ok(Self {
            u_source: shader.required_uniform(gl, "u_source")?,
            u_inverse_resolution: shader.uniform(gl, "u_inverse_resolution"),
            inverse_resolution: inverse_resolution(size),
            shader,
        })
    }
}

impl PostPass for FxaaPass {
    fn name(&self) -> &'static str {
        "fxaa"
    }

    fn resize(&mut self, _gl: &glow::Context, size: (u32, u32)) -> Result<(), Error> {
        self.inverse_resolution = inverse_resolution(size);
        Ok(())
    }

    fn apply(
        &self,
        gl: &glow::Context,
        state: &mut GlState,
        quad: &FullscreenTriangle,
        input: &Texture2d,
        output: Option<&RenderTarget>,
        size: (u32, u32),
    ) {
        state.flags(gl, RenderFlags::FULLSCREEN);
        bind_output(gl, state, output, size);

        self.shader.use_program(gl);
        bind_sampler(gl, state, 0, input);
        let [x, y] = self.inverse_resolution;
        unsafe {
            gl.uniform_1_i32(Some(&self.u_source), 0);
            gl.uniform_2_f32(self.u_inverse_resolution.as_ref(), x, y);
        }
        quad.draw(gl);

        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, None);
            gl.use_program(None);
        }
    }
}

/// Ordered list of passes; pass `n` reads what pass `n - 1` wrote.
#[derive(Debug)]
pub(crate) struct PostChain {
    passes: Vec<Box<dyn PostPass>>,
    // one target between each pair of adjacent passes
    intermediates: Vec<RenderTarget>,
    quad: FullscreenTriangle,
    size: (u32, u32),
}

impl PostChain {
    /// The standard chain: bloom composite, then FXAA.
    pub(crate) fn new(
        gl: &glow::Context,
        registry: &mut GpuRegistry,
        glsl: GlslVersion,
        config: &BackdropConfig,
        size: (u32, u32),
    ) -> Result<Self, Error> {
        let passes: Vec<Box<dyn PostPass>> = vec![
            Box::new(BloomPass::new(gl, registry, glsl, config, size)?),
            Box::new(FxaaPass::new(gl, registry, glsl, size)?),
        ];

        let intermediates = (1..passes.len())
            .map(|_| RenderTarget::new(gl, registry, "post-intermediate", size, false))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            passes,
            intermediates,
            quad: FullscreenTriangle::new(gl, registry)?,
            size,
        })
    }

    /// Walks every pass and intermediate target; a no-op if the size is unchanged.
    pub(crate) fn resize(&mut self, gl: &glow::Context, size: (u32, u32)) -> Result<(), Error> {
        if self.size == size {
            return Ok(());
        }

        for pass in &mut self.passes {
            pass.resize(gl, size)?;
            debug!(pass = pass.name(), width = size.0, height = size.1, "post pass resized");
        }
        for target in &mut self.intermediates {
            target.resize(gl, size)?;
        }

        self.size = size;
        Ok(())
    }

    /// Runs the chain over `input`, presenting to the default framebuffer.
    pub(crate) fn apply(&self, gl: &glow::Context, state: &mut GlState, input: &Texture2d) {
        let last = self.passes.len().saturating_sub(1);
        let mut source = input;

        for (i, pass) in self.passes.iter().enumerate() {
            let output = if i == last { None } else { self.intermediates.get(i) };
            pass.apply(gl, state, &self.quad, source, output, self.size);
            if let Some(target) = output {
                source = target.color();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blur_spread_grows_with_radius() {
        assert_eq!(blur_spread(0.0), 1.0);
        assert!((blur_spread(0.2) - 1.8).abs() < 1e-6);
        assert_eq!(blur_spread(-3.0), 1.0);
    }

    #[test]
    fn test_inverse_resolution() {
        assert_eq!(inverse_resolution((800, 400)), [1.0 / 800.0, 1.0 / 400.0]);
        assert_eq!(inverse_resolution((0, 0)), [1.0, 1.0]);
    }
}
