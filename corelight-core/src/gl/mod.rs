//! `glow` render pipeline: scene pass, bloom, FXAA and GPU resource ownership.

mod buffer;
pub(crate) mod context;
pub(crate) mod disposal;
mod engine;
pub(crate) mod mesh;
pub(crate) mod post;
mod program;
pub(crate) mod renderer;
pub(crate) mod scene_pass;
pub(crate) mod target;
pub(crate) mod texture;
mod ubo;

// Primary API re-exports
pub use context::{GlState, RenderFlags};
pub use disposal::{DisposalList, GpuRegistry, GpuResource};
pub use engine::SceneRenderer;
pub use post::{blur_spread, inverse_resolution};
pub use renderer::{Drawable, RenderContext};
pub use texture::HudRaster;
// Crate-internal re-exports
use buffer::buffer_upload_struct;
pub(crate) use program::ShaderProgram;
pub(crate) use texture::{Texture2d, TextureFormat};
