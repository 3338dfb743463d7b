//! Platform-agnostic engine of the corelight animated backdrop.
//!
//! The simulation ([`Session`]: motion field, spark particles, HUD telemetry and
//! the scene graph) is plain Rust and runs anywhere. The GPU side
//! ([`SceneRenderer`]) is written against [`glow`], so the same pipeline runs on
//! WebGL2 and desktop OpenGL 3.3.

pub mod config;
pub mod error;
pub mod gl;
pub mod random;
pub mod scene;
pub mod schedule;
pub mod sim;
pub mod surface;

pub use config::BackdropConfig;
pub use error::Error;
pub use gl::{Drawable, GlState, GpuRegistry, HudRaster, RenderContext, SceneRenderer};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use schedule::{FrameHost, FrameScheduler, FrameTick};
pub use sim::{HudFrame, Session, StepReport};
pub use surface::{Surface, effective_pixel_ratio};

/// GL shader language target for version injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlslVersion {
    /// WebGL2 / OpenGL ES 3.0: `#version 300 es`
    Es300,
    /// OpenGL 3.3 Core: `#version 330 core`
    Gl330,
}

impl GlslVersion {
    /// Version and precision header for vertex shaders.
    #[must_use]
    pub fn vertex_preamble(&self) -> &'static str {
        match self {
            Self::Es300 => "#version 300 es\nprecision highp float;\n",
            Self::Gl330 => "#version 330 core\n",
        }
    }

    /// Version and precision header for fragment shaders.
    #[must_use]
    pub fn fragment_preamble(&self) -> &'static str {
        match self {
            Self::Es300 => "#version 300 es\nprecision mediump float;\n",
            Self::Gl330 => "#version 330 core\n",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preambles_start_with_version() {
        for glsl in [GlslVersion::Es300, GlslVersion::Gl330] {
            assert!(glsl.vertex_preamble().starts_with("#version "));
            assert!(glsl.fragment_preamble().ends_with('\n'));
        }
        assert!(GlslVersion::Es300.fragment_preamble().contains("precision"));
    }
}
