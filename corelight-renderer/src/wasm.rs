//! `wasm-bindgen` surface for JavaScript hosts (feature `js-api`).

use serde_wasm_bindgen::from_value;
use tracing::debug;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::{Backdrop, BackdropConfig, LoggingConfig, init_logging};

/// JavaScript wrapper for the animated backdrop.
///
/// Thin `#[wasm_bindgen]` wrapper that delegates to [`Backdrop`].
///
/// ```javascript
/// const backdrop = new CoreBackdrop({ exposure: 1.1, hud: { label: "OPEN CORE" } });
/// backdrop.mount(document.getElementById("hero"));
/// // ...
/// backdrop.unmount();
/// ```
#[wasm_bindgen]
#[derive(Debug)]
pub struct CoreBackdrop {
    inner: Backdrop,
}

#[wasm_bindgen]
impl CoreBackdrop {
    /// Creates an unmounted backdrop.
    ///
    /// `config` is a plain object with any subset of the configuration
    /// fields; omitted fields keep their defaults, and `undefined` or `null`
    /// selects the default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<CoreBackdrop, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            BackdropConfig::default()
        } else {
            from_value::<BackdropConfig>(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid backdrop config: {e}")))?
        };

        Ok(Self::with_config(config))
    }

    /// Creates an unmounted backdrop from a JSON configuration string.
    #[wasm_bindgen(js_name = "fromJson")]
    pub fn from_json(json: &str) -> Result<CoreBackdrop, JsValue> {
        let config = serde_json::from_str::<BackdropConfig>(json)
            .map_err(|e| JsValue::from_str(&format!("Invalid backdrop config: {e}")))?;

        Ok(Self::with_config(config))
    }

    /// Fixes the random seed for repeatable starfields and spark sequences.
    ///
    /// Returns the same backdrop. A live mount keeps running with its current
    /// seed; the new one applies from the next `mount`.
    #[wasm_bindgen(js_name = "withSeed")]
    pub fn with_seed(mut self, seed: u64) -> CoreBackdrop {
        self.inner.set_seed(seed);
        self
    }

    /// Starts rendering into `container`. A second call while mounted does nothing.
    pub fn mount(&mut self, container: &HtmlElement) {
        self.inner.mount(container);
    }

    /// Starts rendering into the element matching a CSS selector.
    #[wasm_bindgen(js_name = "mountSelector")]
    pub fn mount_selector(&mut self, selector: &str) {
        self.inner.mount_selector(selector);
    }

    /// Stops rendering and removes everything `mount` created.
    pub fn unmount(&mut self) {
        self.inner.unmount();
    }

    /// `true` while the backdrop is rendering.
    #[wasm_bindgen(getter, js_name = "isMounted")]
    pub fn is_mounted(&self) -> bool {
        self.inner.is_mounted()
    }

    /// Frames rendered since the current mount.
    #[wasm_bindgen(getter)]
    pub fn frames(&self) -> u64 {
        self.inner.frames()
    }
}

impl CoreBackdrop {
    fn with_config(config: BackdropConfig) -> Self {
        Self {
            inner: Backdrop::builder()
                .config(config)
                .build(),
        }
    }
}

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn main() {
    if init_logging(&LoggingConfig::default()) {
        debug!("corelight WASM module loaded");
    }
}
