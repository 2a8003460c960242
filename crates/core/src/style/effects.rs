//! Static visual-effect preset registry.

use restyle_protocol::EffectPreset;

/// Every effect the chrome can activate, looked up by id. Preset css is
/// injected verbatim as the last style layer, so later presets in the
/// activation order win conflicts.
pub const EFFECT_PRESETS: &[EffectPreset] = &[
    EffectPreset {
        id: "grayscale",
        name: "Grayscale",
        css: "html { filter: grayscale(1); }",
    },
    EffectPreset {
        id: "sepia",
        name: "Sepia",
        css: "html { filter: sepia(0.85); }",
    },
    EffectPreset {
        id: "inverted",
        name: "Inverted",
        css: "html { filter: invert(1) hue-rotate(180deg); }",
    },
    EffectPreset {
        id: "high-contrast",
        name: "High contrast",
        css: "html { filter: contrast(1.4) saturate(1.2); }",
    },
    EffectPreset {
        id: "soft-shadows",
        name: "Soft shadows",
        css: "* { box-shadow: none !important; } \
              img, button, input, [class*=\"card\"] { \
              box-shadow: 0 2px 12px rgba(0, 0, 0, 0.08) !important; }",
    },
    EffectPreset {
        id: "rounded",
        name: "Rounded corners",
        css: "img, button, input, textarea, select, [class*=\"card\"], [class*=\"btn\"] { \
              border-radius: 12px !important; }",
    },
    EffectPreset {
        id: "flat",
        name: "Flat",
        css: "* { box-shadow: none !important; text-shadow: none !important; \
              border-radius: 0 !important; }",
    },
    EffectPreset {
        id: "reading",
        name: "Reading mode",
        css: "body { max-width: 72ch !important; margin: 0 auto !important; \
              line-height: 1.7 !important; } \
              aside, [class*=\"sidebar\"], [class*=\"banner\"] { display: none !important; }",
    },
];

/// Look up one preset by id.
pub fn preset(id: &str) -> Option<&'static EffectPreset> {
    EFFECT_PRESETS.iter().find(|p| p.id == id)
}

/// Concatenate the css of the given presets in activation order. Unknown
/// ids are skipped.
pub fn compose_effects(ids: &[String]) -> String {
    let mut css = String::new();
    for id in ids {
        match preset(id) {
            Some(p) => {
                if !css.is_empty() {
                    css.push('\n');
                }
                css.push_str(p.css);
            }
            None => tracing::debug!(id, "unknown effect preset"),
        }
    }
    css
}
