pub mod effects;
pub mod pipeline;
pub mod typography;

pub use effects::{EFFECT_PRESETS, compose_effects, preset};
pub use pipeline::{STYLE_ELEMENT_ID, StyleSources, compose_layers, inject};
pub use typography::typography_css;
