use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use corelight_core::{
    BackdropConfig, FrameScheduler, GlState, GlslVersion, SceneRenderer, SeededRandom, Session, Surface,
    effective_pixel_ratio,
};
use tracing::{debug, warn};
use web_sys::{Element, HtmlCanvasElement};

use crate::{
    Error,
    context_loss::ContextLossHandler,
    hud_canvas::HudCanvas,
    js,
    listener::EventListener,
    scheduler::AnimationFrameHost,
};

type Slot = Rc<RefCell<Option<Mounted>>>;
type WeakSlot = Weak<RefCell<Option<Mounted>>>;

/// The animated backdrop as seen by a host page.
///
/// The whole lifecycle is [`Backdrop::mount`] and [`Backdrop::unmount`]. Neither
/// ever fails visibly: a backdrop that cannot start simply renders nothing.
///
/// # Examples
///
/// ```rust,no_run
/// use corelight_renderer::{Backdrop, BackdropConfig};
///
/// let mut backdrop = Backdrop::builder()
///     .config(BackdropConfig { exposure: 1.1, ..BackdropConfig::default() })
///     .seed(7)
///     .build();
///
/// backdrop.mount_selector("#hero");
/// // ...
/// backdrop.unmount();
/// ```
#[derive(Debug)]
pub struct Backdrop {
    config: BackdropConfig,
    seed: Option<u64>,
    slot: Slot,
}

impl Backdrop {
    /// A backdrop with the default configuration and a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a backdrop.
    #[must_use]
    pub fn builder() -> BackdropBuilder {
        BackdropBuilder::new()
    }

    /// Creates the canvas inside `container`, sized to it, and starts the frame loop.
    ///
    /// Does nothing when the backdrop is already mounted, when the container
    /// is not attached to a document, or when WebGL2 is unavailable; the
    /// latter is logged.
    pub fn mount(&mut self, container: &Element) {
        if self.is_mounted() {
            debug!("backdrop already mounted");
            return;
        }
        if !container.is_connected() {
            debug!("backdrop container is not attached to a document; not mounting");
            return;
        }

        let seed = self.seed.unwrap_or_else(js::random_seed);
        match Mounted::create(container, &self.config, seed, Rc::downgrade(&self.slot)) {
            Ok(mounted) => match self.slot.try_borrow_mut() {
                Ok(mut slot) => *slot = Some(mounted),
                Err(_) => mounted.teardown(),
            },
            Err(e) => warn!(error = %e, "backdrop mount failed; nothing will render"),
        }
    }

    /// Looks up the container by CSS selector and mounts into it; a missing
    /// container is a no-op.
    pub fn mount_selector(&mut self, selector: &str) {
        match js::query_element(selector) {
            Some(container) => self.mount(&container),
            None => debug!(selector, "backdrop container not found; not mounting"),
        }
    }

    /// Stops the frame loop, removes every listener, releases all GPU
    /// resources and detaches the canvas.
    ///
    /// Idempotent, and safe before the first frame has run.
    pub fn unmount(&mut self) {
        let mounted = match self.slot.try_borrow_mut() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                warn!("unmount requested while a frame is running; ignored");
                None
            },
        };

        if let Some(mounted) = mounted {
            mounted.teardown();
        }
    }

    /// `true` while a canvas is attached and the frame loop owns GPU resources.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.slot
            .try_borrow()
            .map(|slot| slot.is_some())
            .unwrap_or(true)
    }

    /// Frames rendered by the current mount; zero when not mounted.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.slot
            .try_borrow()
            .ok()
            .and_then(|slot| slot.as_ref().map(|m| m.scheduler.frames()))
            .unwrap_or(0)
    }

    /// The configuration as given; it is validated again at every mount.
    #[must_use]
    pub fn config(&self) -> &BackdropConfig {
        &self.config
    }

    /// Fixes the seed for the next mount.
    ///
    /// A live mount keeps running with the seed it started with.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = Some(seed);
    }
}

impl Default for Backdrop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Backdrop {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Builder for configuring and creating a [`Backdrop`].
#[derive(Debug, Clone, Default)]
pub struct BackdropBuilder {
    config: BackdropConfig,
    seed: Option<u64>,
}

impl BackdropBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Replaces the visual configuration; values are validated at mount.
    #[must_use]
    pub fn config(mut self, config: BackdropConfig) -> Self {
        self.config = config;
        self
    }

    /// Fixes the random seed, making the starfield and spark sequence
    /// repeatable. By default every mount draws a fresh seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Creates the backdrop, unmounted.
    #[must_use]
    pub fn build(self) -> Backdrop {
        Backdrop {
            config: self.config,
            seed: self.seed,
            slot: Rc::new(RefCell::new(None)),
        }
    }
}

/// Everything one mount owns. Dropped as a unit at unmount.
struct Mounted {
    container: Element,
    canvas: HtmlCanvasElement,
    gl: glow::Context,
    raw_gl: web_sys::WebGl2RenderingContext,
    state: GlState,
    surface: Surface,
    max_pixel_ratio: f32,
    session: Session,
    rng: SeededRandom,
    renderer: Option<SceneRenderer>,
    hud: Option<HudCanvas>,
    scheduler: FrameScheduler<AnimationFrameHost>,
    context_loss: ContextLossHandler,
    _resize: EventListener,
}

impl Mounted {
    const GLSL: GlslVersion = GlslVersion::Es300;

    fn create(container: &Element, config: &BackdropConfig, seed: u64, slot: WeakSlot) -> Result<Self, Error> {
        let window = js::window()?;
        let document = js::document()?;

        let config = config.validated();
        let max_pixel_ratio = config.max_pixel_ratio;
        let (width, height) = js::client_size(container);
        let surface = Surface::new(width, height, effective_pixel_ratio(js::device_pixel_ratio(), max_pixel_ratio));

        // built detached; appended only once everything else succeeded
        let canvas = js::create_backdrop_canvas(&document)?;
        let (physical_w, physical_h) = surface.physical_size();
        canvas.set_width(physical_w);
        canvas.set_height(physical_h);

        let (gl, raw_gl) = js::create_glow_context(&canvas)?;
        let state = GlState::new(&gl);

        // listeners before the renderer: early returns here own no GL objects
        let context_loss = ContextLossHandler::new(&canvas)?;

        let on_resize = slot.clone();
        let resize = EventListener::new(&window, "resize", move |_| {
            with_mounted(&on_resize, Mounted::resize);
        })?;

        let on_frame = slot;
        let host = AnimationFrameHost::new(window, move |timestamp| {
            with_mounted(&on_frame, |mounted| mounted.frame(timestamp));
        });

        let mut rng = SeededRandom::new(seed);
        let session = Session::new(&config, js::now(), surface.aspect(), &mut rng);
        let mut renderer = SceneRenderer::new(&gl, Self::GLSL, &session, &surface)?;

        let (hud_w, hud_h) = renderer.hud_size();
        let hud = HudCanvas::new(hud_w, hud_h)
            .inspect_err(|e| warn!(error = %e, "HUD rasterizer unavailable; panel stays blank"))
            .ok();

        let mut scheduler = FrameScheduler::new(host);
        release_on_error(start_presenting(container, &canvas, &mut scheduler), || {
            let released = renderer.dispose(&gl);
            debug!(released, "mount aborted; GPU resources released");
        })?;

        debug!(width, height, seed, "backdrop mounted");

        Ok(Self {
            container: container.clone(),
            canvas,
            gl,
            raw_gl,
            state,
            surface,
            max_pixel_ratio,
            session,
            rng,
            renderer: Some(renderer),
            hud,
            scheduler,
            context_loss,
            _resize: resize,
        })
    }

    /// One display refresh: simulate, then render unless the context is lost.
    fn frame(&mut self, timestamp: f64) {
        let Some(tick) = self.scheduler.on_frame(timestamp) else {
            return;
        };

        if !self.canvas.is_connected() {
            debug!("backdrop canvas detached; stopping frames");
            self.scheduler.stop();
            return;
        }

        let report = self.session.step(tick, &mut self.rng);

        if self.context_loss.is_context_lost() || self.raw_gl.is_context_lost() {
            return;
        }
        if self.context_loss.context_pending_rebuild() {
            self.rebuild();
        }

        let Some(renderer) = &mut self.renderer else {
            return;
        };

        if let Some(hud) = &self.hud {
            let updated = hud
                .rasterize(&report.hud)
                .and_then(|pixels| Ok(renderer.update_hud(&pixels)?));
            if let Err(e) = updated {
                warn!(error = %e, "HUD update failed");
            }
        }

        if let Err(e) = renderer.render(&self.gl, &mut self.state, &self.session) {
            warn!(error = %e, frame = tick.frame, "frame render failed");
        }
    }

    /// Matches the surface to the container; a no-op if nothing changed.
    fn resize(&mut self) {
        let (width, height) = js::client_size(&self.container);
        let ratio = effective_pixel_ratio(js::device_pixel_ratio(), self.max_pixel_ratio);
        if !self.surface.resize(width, height, ratio) {
            return;
        }

        let (physical_w, physical_h) = self.surface.physical_size();
        self.canvas.set_width(physical_w);
        self.canvas.set_height(physical_h);
        self.session.scene.set_aspect(self.surface.aspect());

        if let Some(renderer) = &mut self.renderer
            && let Err(e) = renderer.resize(&self.gl, &self.surface)
        {
            warn!(error = %e, "render pipeline resize failed");
        }
    }

    /// Recreates every GPU resource after the context came back.
    fn rebuild(&mut self) {
        self.context_loss.clear_context_rebuild_needed();

        if let Some(mut stale) = self.renderer.take() {
            stale.abandon();
        }

        self.state = GlState::new(&self.gl);
        match SceneRenderer::new(&self.gl, Self::GLSL, &self.session, &self.surface) {
            Ok(renderer) => {
                debug!(resources = renderer.resource_count(), "GPU resources rebuilt");
                self.renderer = Some(renderer);
            },
            Err(e) => warn!(error = %e, "GPU rebuild failed; nothing will render"),
        }
    }

    /// Full teardown; listeners are removed when `self` drops at the end.
    fn teardown(mut self) {
        self.scheduler.stop();

        if let Some(renderer) = &mut self.renderer {
            let released = if self.raw_gl.is_context_lost() {
                renderer.abandon()
            } else {
                renderer.dispose(&self.gl)
            };
            debug!(released, frames = self.scheduler.frames(), "backdrop unmounted");
        }

        if let Some(parent) = self.canvas.parent_node()
            && let Err(e) = parent.remove_child(&self.canvas)
        {
            debug!(error = ?e, "backdrop canvas already detached");
        }
    }
}

impl std::fmt::Debug for Mounted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mounted")
            .field("surface", &self.surface)
            .field("scheduler", &self.scheduler)
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}

/// Attaches the canvas and requests the first frame; on failure the canvas
/// is detached again.
fn start_presenting(
    container: &Element,
    canvas: &HtmlCanvasElement,
    scheduler: &mut FrameScheduler<AnimationFrameHost>,
) -> Result<(), Error> {
    container
        .append_child(canvas)
        .map_err(|_| Error::canvas_creation_failed())?;

    scheduler.start();
    if !scheduler.is_running() {
        let _ = container.remove_child(canvas);
        return Err(Error::frame_request_failed());
    }

    Ok(())
}

/// Runs `release` before handing back an error, so a half-built mount gives
/// back what it already acquired.
fn release_on_error<T>(result: Result<T, Error>, release: impl FnOnce()) -> Result<T, Error> {
    if result.is_err() {
        release();
    }
    result
}

/// Runs `f` on the mounted state if it still exists and is not borrowed.
fn with_mounted(slot: &WeakSlot, f: impl FnOnce(&mut Mounted)) {
    let Some(slot) = slot.upgrade() else {
        return;
    };
    let Ok(mut guard) = slot.try_borrow_mut() else {
        return;
    };
    if let Some(mounted) = guard.as_mut() {
        f(mounted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_config_and_seed() {
        let config = BackdropConfig { exposure: 1.2, ..BackdropConfig::default() };
        let backdrop = Backdrop::builder()
            .config(config.clone())
            .seed(9)
            .build();

        assert_eq!(backdrop.config(), &config);
        assert_eq!(backdrop.seed, Some(9));
        assert!(!backdrop.is_mounted());
    }

    #[test]
    fn test_set_seed_keeps_the_mount_slot() {
        let mut backdrop = Backdrop::new();
        let slot = Rc::clone(&backdrop.slot);

        backdrop.set_seed(42);

        assert_eq!(backdrop.seed, Some(42));
        assert!(Rc::ptr_eq(&slot, &backdrop.slot));
        assert_eq!(backdrop.config(), &BackdropConfig::default());
    }

    #[test]
    fn test_release_runs_only_on_error() {
        let mut released = 0;
        let ok = release_on_error(Ok(7), || released += 1);
        assert_eq!(ok.ok(), Some(7));
        assert_eq!(released, 0);

        let failed: Result<(), Error> = release_on_error(Err(Error::frame_request_failed()), || released += 1);
        assert!(matches!(failed, Err(Error::Callback(_))));
        assert_eq!(released, 1);
    }

    #[test]
    fn test_unmount_without_mount_is_noop() {
        let mut backdrop = Backdrop::new();
        backdrop.unmount();
        backdrop.unmount();
        assert!(!backdrop.is_mounted());
        assert_eq!(backdrop.frames(), 0);
    }
}
