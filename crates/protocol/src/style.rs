use serde::{Deserialize, Serialize};

/// One named contribution to the injected style block.
///
/// Layers concatenate in a fixed order regardless of when their sources last
/// changed: color-remap rules first, then typography, then user custom rules,
/// then effect presets. The variant order here *is* that order — the pipeline
/// sorts by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerKind {
    ColorRemap,
    Typography,
    Custom,
    Effect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleLayer {
    pub kind: LayerKind,
    pub css: String,
}

impl StyleLayer {
    pub fn new(kind: LayerKind, css: impl Into<String>) -> Self {
        Self {
            kind,
            css: css.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.css.trim().is_empty()
    }
}

/// User typography overrides. Every field is optional; unset fields
/// contribute nothing to the generated layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypographySettings {
    /// Font family for body text.
    pub body_family: Option<String>,
    /// Font family for headings.
    pub heading_family: Option<String>,
    /// Root font size in pixels.
    pub base_size_px: Option<f32>,
    /// Body line height (unitless multiplier).
    pub line_height: Option<f32>,
    /// Body font weight.
    pub body_weight: Option<u16>,
}

impl TypographySettings {
    pub fn is_empty(&self) -> bool {
        self.body_family.is_none()
            && self.heading_family.is_none()
            && self.base_size_px.is_none()
            && self.line_height.is_none()
            && self.body_weight.is_none()
    }
}

/// One entry in the static visual-effect registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub css: &'static str,
}
