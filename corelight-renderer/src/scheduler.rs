use corelight_core::FrameHost;
use wasm_bindgen::{JsCast, closure::Closure};
use web_sys::Window;

/// [`FrameHost`] backed by `requestAnimationFrame`.
///
/// The host owns the frame callback, so dropping it after
/// [`corelight_core::FrameScheduler::stop`] leaves nothing registered with
/// the browser.
pub(crate) struct AnimationFrameHost {
    window: Window,
    callback: Closure<dyn FnMut(f64)>,
}

impl AnimationFrameHost {
    pub(crate) fn new(window: Window, on_frame: impl 'static + FnMut(f64)) -> Self {
        let callback = Closure::wrap(Box::new(on_frame) as Box<dyn FnMut(f64)>);
        Self { window, callback }
    }
}

impl FrameHost for AnimationFrameHost {
    type Handle = i32;

    fn request_frame(&mut self) -> Option<i32> {
        self.window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
            .ok()
    }

    fn cancel_frame(&mut self, handle: i32) {
        let _ = self.window.cancel_animation_frame(handle);
    }
}

impl std::fmt::Debug for AnimationFrameHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationFrameHost").finish_non_exhaustive()
    }
}
