use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// The canonical style-extraction IR that every probed surface compiles into.
///
/// ```text
///   rendered tree ──▶ StyleReport ──▶ palette selection ──▶ ColorMapping
///      (host)           (this)          (UI chrome)          (remapper)
/// ```
///
/// A report is a pure statistical summary: producing one has no side effects
/// on the surface, and the same rendered tree always yields the same report.
/// Every list is capped and sorted by descending frequency, ties broken by
/// first-seen document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleReport {
    /// Most frequent colors with the properties they were observed on.
    pub colors: Vec<ColorUsage>,
    /// Primary font families with aggregated weights and sizes.
    pub fonts: Vec<FontUsage>,
    /// Distinct non-zero margin/padding shorthand values.
    pub spacing: Vec<SpacingUsage>,
    /// Distinct border-radius values.
    pub radii: Vec<ValueUsage>,
    /// Distinct box-shadow values.
    pub shadows: Vec<ValueUsage>,
    /// Font-size distribution with the tags using each size.
    pub scale: Vec<FontSizeUsage>,
    /// Display-value distribution with flex/grid detail.
    pub layouts: Vec<LayoutUsage>,
    /// Distinct non-inline image URLs.
    pub image_urls: Vec<String>,
    /// Distinct anchor URLs (fragment and script links excluded).
    pub link_urls: Vec<String>,
}

impl StyleReport {
    /// The observed palette in frequency order — the default remap selection.
    pub fn palette(&self) -> Vec<Rgb> {
        self.colors.iter().map(|c| c.color).collect()
    }
}

/// One observed color and where it was used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorUsage {
    /// Normalized 6-digit hex color.
    pub color: Rgb,
    pub count: u32,
    /// Distinct property names this color was seen on, first-seen order.
    pub properties: Vec<String>,
}

/// One primary font family and its observed variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontUsage {
    /// First family in the stack, quotes stripped.
    pub family: String,
    pub count: u32,
    pub weights: Vec<String>,
    pub sizes: Vec<String>,
}

/// One distinct spacing shorthand value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacingUsage {
    pub value: String,
    pub count: u32,
    /// Which of margin/padding the value was seen on.
    pub properties: Vec<String>,
}

/// A distinct value with a plain frequency count (radii, shadows).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueUsage {
    pub value: String,
    pub count: u32,
}

/// One step of the typography scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSizeUsage {
    pub size: String,
    pub count: u32,
    /// Tag names observed at this size, first-seen order.
    pub tags: Vec<String>,
}

/// One display value and its layout detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutUsage {
    pub display: String,
    pub count: u32,
    /// flex-direction or grid-template detail values seen alongside.
    pub details: Vec<String>,
}
