//! Layered style injection.
//!
//! All user-facing overrides funnel into one style element per surface,
//! rebuilt from scratch on every change. Removing the previous element
//! before appending the next is what makes injection idempotent — the
//! pipeline can re-run on every input change without accumulating state in
//! the surface.

use restyle_protocol::{LayerKind, StyleLayer, SurfaceHandle, SurfaceRole, TypographySettings};

use crate::style::{effects, typography};

/// Reserved id of the injected style element. Removing and recreating the
/// element with this id is the only mutation the pipeline performs on a
/// surface's head.
pub const STYLE_ELEMENT_ID: &str = "restyle-injected-styles";

/// The user-controlled inputs of the injected block, minus the remap layer
/// (which the engine carries separately because it is derived, not typed in).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StyleSources {
    /// Raw user css.
    pub custom_css: String,
    pub typography: TypographySettings,
    /// Active effect preset ids in activation order.
    pub active_effects: Vec<String>,
}

/// Build the ordered layer set from the current sources.
///
/// Layer order is fixed regardless of which source changed last:
/// color-remap → typography → custom → effects. Empty layers are dropped.
pub fn compose_layers(sources: &StyleSources, remap_css: &str) -> Vec<StyleLayer> {
    let mut layers = vec![
        StyleLayer::new(LayerKind::ColorRemap, remap_css),
        StyleLayer::new(LayerKind::Typography, typography::typography_css(&sources.typography)),
        StyleLayer::new(LayerKind::Custom, sources.custom_css.clone()),
        StyleLayer::new(LayerKind::Effect, effects::compose_effects(&sources.active_effects)),
    ];
    layers.retain(|layer| !layer.is_empty());
    layers.sort_by_key(|layer| layer.kind);
    layers
}

/// Concatenate layers into the final injected block.
pub fn combined_css(layers: &[StyleLayer]) -> String {
    layers
        .iter()
        .map(|layer| layer.css.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

/// (Re)inject the style block into one surface.
///
/// Always removes any previously injected element first, so repeated calls
/// never leave more than one reserved-id element. Original-role and
/// restricted surfaces are never styled; for them the call degenerates to
/// the removal (a no-op on a surface that was never styled).
///
/// Returns whether a style element is present afterwards.
pub fn inject<H: SurfaceHandle>(
    handle: &mut H,
    role: SurfaceRole,
    restricted: bool,
    layers: &[StyleLayer],
) -> bool {
    handle.remove_style_element(STYLE_ELEMENT_ID);
    if role == SurfaceRole::Original || restricted {
        return false;
    }
    let css = combined_css(layers);
    if css.trim().is_empty() {
        return false;
    }
    handle.append_style_element(STYLE_ELEMENT_ID, &css);
    true
}
