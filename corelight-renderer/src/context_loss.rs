//! WebGL context loss detection and recovery.
//!
//! A lost context (GPU reset, memory pressure, long-backgrounded tab) keeps
//! the simulation running but skips rendering. Once the browser restores the
//! context, the backdrop rebuilds its GPU resources from the retained session.

use std::{cell::RefCell, rc::Rc};

use tracing::{debug, warn};
use web_sys::HtmlCanvasElement;

use crate::{Error, listener::EventListener};

/// Shared state for tracking context loss across closures.
#[derive(Debug, Clone, Default)]
pub(crate) struct ContextState {
    inner: Rc<RefCell<ContextStateInner>>,
}

#[derive(Debug, Default)]
struct ContextStateInner {
    /// True if context is currently lost
    is_lost: bool,
    /// True if context was restored and resources must be recreated
    pending_rebuild: bool,
}

impl ContextState {
    pub(crate) fn is_lost(&self) -> bool {
        self.inner.borrow().is_lost
    }

    pub(crate) fn pending_rebuild(&self) -> bool {
        self.inner.borrow().pending_rebuild
    }

    fn set_lost(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.is_lost = true;
        inner.pending_rebuild = false;
    }

    fn set_restored(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.is_lost = false;
        inner.pending_rebuild = true;
    }

    fn clear_pending_rebuild(&self) {
        self.inner.borrow_mut().pending_rebuild = false;
    }
}

/// Handles `webglcontextlost` and `webglcontextrestored` on the backdrop canvas.
///
/// `preventDefault()` is called on loss so the browser will attempt a
/// restore. Both listeners are removed when the handler is dropped.
#[derive(Debug)]
pub(crate) struct ContextLossHandler {
    _on_context_lost: EventListener,
    _on_context_restored: EventListener,
    state: ContextState,
}

impl ContextLossHandler {
    pub(crate) fn new(canvas: &HtmlCanvasElement) -> Result<Self, Error> {
        let state = ContextState::default();

        let lost = state.clone();
        let on_context_lost = EventListener::new(canvas, "webglcontextlost", move |event| {
            event.prevent_default();
            warn!("WebGL context lost; rendering paused");
            lost.set_lost();
        })?;

        let restored = state.clone();
        let on_context_restored = EventListener::new(canvas, "webglcontextrestored", move |_| {
            debug!("WebGL context restored");
            restored.set_restored();
        })?;

        Ok(Self {
            _on_context_lost: on_context_lost,
            _on_context_restored: on_context_restored,
            state,
        })
    }

    pub(crate) fn is_context_lost(&self) -> bool {
        self.state.is_lost()
    }

    /// True once the context came back and GPU resources must be recreated.
    pub(crate) fn context_pending_rebuild(&self) -> bool {
        self.state.pending_rebuild()
    }

    pub(crate) fn clear_context_rebuild_needed(&self) {
        self.state.clear_pending_rebuild();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_then_restore_requests_rebuild() {
        let state = ContextState::default();
        assert!(!state.is_lost());

        state.set_lost();
        assert!(state.is_lost());
        assert!(!state.pending_rebuild());

        state.set_restored();
        assert!(!state.is_lost());
        assert!(state.pending_rebuild());

        state.clear_pending_rebuild();
        assert!(!state.pending_rebuild());
    }
}
