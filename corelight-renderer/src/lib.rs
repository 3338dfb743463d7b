//! Browser binding for the corelight animated backdrop.
//!
//! [`Backdrop`] owns one WebGL2 canvas inside a host element: it sizes the
//! canvas to the container, drives the frame loop off `requestAnimationFrame`,
//! rasterizes the HUD with the 2D canvas API and tears everything down again
//! on [`Backdrop::unmount`]. The simulation and GPU pipeline live in
//! [`corelight_core`].

mod backdrop;
mod context_loss;
mod error;
mod hud_canvas;
mod listener;
mod logging;
mod scheduler;

pub(crate) mod js;

#[cfg(feature = "js-api")]
pub mod wasm;

pub use backdrop::{Backdrop, BackdropBuilder};
pub use corelight_core::{BackdropConfig, config};
pub use logging::{LoggingConfig, init_logging};

pub use crate::error::Error;
