//! WASM bridge.
//!
//! Exposes the engine's deterministic pieces to a browser host as plain
//! JSON-in/JSON-out functions. The host keeps ownership of the DOM — it
//! calls in for the math (camera transforms, palette assignment, layer
//! composition, URL repair) and applies the results itself.

use restyle_core::camera::CameraState;
use restyle_core::style::{self, StyleSources};
use restyle_core::surface::assets;
use restyle_core::{remap, surface::MemorySurface};
use restyle_protocol::{ColorMapping, Point, Rgb};
use url::Url;
use wasm_bindgen::prelude::*;

/// Cursor-anchored zoom step. Takes and returns a `CameraState` as JSON.
#[wasm_bindgen]
pub fn zoom_camera(
    camera_json: &str,
    cursor_x: f64,
    cursor_y: f64,
    delta_factor: f64,
) -> Result<String, JsError> {
    let camera: CameraState =
        serde_json::from_str(camera_json).map_err(|e| JsError::new(&e.to_string()))?;
    let next = camera.zoomed_about(Point::new(cursor_x, cursor_y), delta_factor);
    serde_json::to_string(&next).map_err(|e| JsError::new(&e.to_string()))
}

/// Compose the injected style block from `StyleSources` JSON plus the
/// current color-remap layer css. Returns the concatenated block.
#[wasm_bindgen]
pub fn compose_style_block(sources_json: &str, remap_css: &str) -> Result<String, JsError> {
    let sources: StyleSources =
        serde_json::from_str(sources_json).map_err(|e| JsError::new(&e.to_string()))?;
    let layers = style::compose_layers(&sources, remap_css);
    Ok(style::pipeline::combined_css(&layers))
}

/// Greedy palette assignment. Selected and target palettes arrive as JSON
/// arrays of hex strings; the result is a `ColorMapping` JSON object.
#[wasm_bindgen]
pub fn assign_palette(selected_json: &str, targets_json: &str) -> Result<String, JsError> {
    let selected: Vec<Rgb> =
        serde_json::from_str(selected_json).map_err(|e| JsError::new(&e.to_string()))?;
    let targets: Vec<Rgb> =
        serde_json::from_str(targets_json).map_err(|e| JsError::new(&e.to_string()))?;
    let targets = if targets.is_empty() {
        remap::BUILTIN_PALETTE.to_vec()
    } else {
        targets
    };
    let mut mapping = ColorMapping::new();
    mapping.merge(remap::assign(&selected, &targets));
    serde_json::to_string(&mapping).map_err(|e| JsError::new(&e.to_string()))
}

/// Proxy-route one asset reference against a base URL. Returns the repaired
/// URL, or `None` when the reference must stay untouched.
#[wasm_bindgen]
pub fn repair_url(raw: &str, base: &str, proxy_base: &str) -> Result<Option<String>, JsError> {
    let base = Url::parse(base).map_err(|e| JsError::new(&e.to_string()))?;
    Ok(assets::repair_reference(raw, &base, proxy_base))
}

/// Run the extraction pass over a document snapshot (JSON) and return the
/// `StyleReport` as JSON.
#[wasm_bindgen]
pub fn extract_snapshot(snapshot_json: &str) -> Result<String, JsError> {
    let surface =
        MemorySurface::from_json(snapshot_json).map_err(|e| JsError::new(&e.to_string()))?;
    let report = restyle_core::extract::extract(&surface);
    serde_json::to_string(&report).map_err(|e| JsError::new(&e.to_string()))
}
