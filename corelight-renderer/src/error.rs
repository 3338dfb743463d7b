/// Error categories.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Failed to initialize the WebGL context or retrieve DOM elements.
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Browser-side resource errors, such as the HUD's 2D canvas.
    #[error("Resource error: {0}")]
    Resource(String),

    /// Event listener registration errors.
    #[error("Event listener error: {0}")]
    Callback(String),

    /// Errors raised by the platform-agnostic engine.
    #[error(transparent)]
    Engine(#[from] corelight_core::Error),
}

impl Error {
    // Initialization errors
    pub(crate) fn window_not_found() -> Self {
        Self::Initialization("Unable to retrieve window".to_string())
    }

    pub(crate) fn document_not_found() -> Self {
        Self::Initialization("Unable to retrieve document".to_string())
    }

    pub(crate) fn canvas_creation_failed() -> Self {
        Self::Initialization("Unable to create canvas element".to_string())
    }

    pub(crate) fn canvas_context_failed() -> Self {
        Self::Initialization("Failed to retrieve canvas rendering context".to_string())
    }

    pub(crate) fn webgl_context_failed() -> Self {
        Self::Initialization("Failed to retrieve WebGL2 rendering context".to_string())
    }

    // Resource errors
    pub(crate) fn hud_canvas_creation_failed(detail: String) -> Self {
        Self::Resource(format!("Failed to create HUD offscreen canvas: {detail}"))
    }

    pub(crate) fn hud_context_failed() -> Self {
        Self::Resource("Failed to retrieve HUD 2D rendering context".to_string())
    }

    pub(crate) fn hud_raster_failed(detail: String) -> Self {
        Self::Resource(format!("Failed to rasterize HUD: {detail}"))
    }

    // Callback errors
    pub(crate) fn listener_failed(event_type: &str) -> Self {
        Self::Callback(format!("Failed to add {event_type} listener"))
    }

    pub(crate) fn frame_request_failed() -> Self {
        Self::Callback("requestAnimationFrame refused the frame callback".to_string())
    }
}
