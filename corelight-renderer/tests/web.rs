#![cfg(target_arch = "wasm32")]

use corelight_renderer::{Backdrop, BackdropConfig};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Document, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window()
        .and_then(|w| w.document())
        .expect("document")
}

fn container(document: &Document) -> HtmlElement {
    let element = document
        .create_element("div")
        .expect("div")
        .dyn_into::<HtmlElement>()
        .expect("html element");

    let style = element.style();
    style.set_property("position", "relative").unwrap();
    style.set_property("width", "320px").unwrap();
    style.set_property("height", "240px").unwrap();
    element
}

fn attached_container() -> HtmlElement {
    let document = document();
    let element = container(&document);
    document
        .body()
        .expect("body")
        .append_child(&element)
        .unwrap();
    element
}

fn canvas_count(element: &HtmlElement) -> u32 {
    element
        .query_selector_all("canvas")
        .map(|nodes| nodes.length())
        .unwrap_or(0)
}

#[wasm_bindgen_test]
fn mount_then_unmount_leaves_container_empty() {
    let element = attached_container();
    let mut backdrop = Backdrop::builder().seed(1).build();

    backdrop.mount(&element);
    if !backdrop.is_mounted() {
        // headless browsers without WebGL2 render nothing and leave no trace
        assert_eq!(canvas_count(&element), 0);
        return;
    }
    assert_eq!(canvas_count(&element), 1);

    backdrop.unmount();
    assert!(!backdrop.is_mounted());
    assert_eq!(canvas_count(&element), 0);
    element.remove();
}

#[wasm_bindgen_test]
fn unmount_is_idempotent() {
    let element = attached_container();
    let mut backdrop = Backdrop::new();

    backdrop.mount(&element);
    backdrop.unmount();
    backdrop.unmount();

    assert!(!backdrop.is_mounted());
    assert_eq!(canvas_count(&element), 0);
    element.remove();
}

#[wasm_bindgen_test]
fn second_mount_does_not_add_a_canvas() {
    let element = attached_container();
    let mut backdrop = Backdrop::new();

    backdrop.mount(&element);
    let first = canvas_count(&element);
    backdrop.mount(&element);

    assert_eq!(canvas_count(&element), first);
    backdrop.unmount();
    element.remove();
}

#[wasm_bindgen_test]
fn detached_container_is_not_mounted() {
    let document = document();
    let element = container(&document);
    let mut backdrop = Backdrop::builder()
        .config(BackdropConfig::default())
        .build();

    backdrop.mount(&element);

    assert!(!backdrop.is_mounted());
    assert_eq!(canvas_count(&element), 0);
}

#[wasm_bindgen_test]
fn missing_selector_is_a_noop() {
    let mut backdrop = Backdrop::new();
    backdrop.mount_selector("#corelight-does-not-exist");
    assert!(!backdrop.is_mounted());
}

#[wasm_bindgen_test]
fn dropping_a_mounted_backdrop_detaches_the_canvas() {
    let element = attached_container();
    {
        let mut backdrop = Backdrop::new();
        backdrop.mount(&element);
    }
    assert_eq!(canvas_count(&element), 0);
    element.remove();
}

#[wasm_bindgen_test]
fn set_seed_keeps_a_live_mount() {
    let element = attached_container();
    let mut backdrop = Backdrop::new();

    backdrop.mount(&element);
    let mounted = backdrop.is_mounted();
    let canvases = canvas_count(&element);

    backdrop.set_seed(5);

    assert_eq!(backdrop.is_mounted(), mounted);
    assert_eq!(canvas_count(&element), canvases);
    backdrop.unmount();
    element.remove();
}
