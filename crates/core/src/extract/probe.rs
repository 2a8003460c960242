//! Style probe — the extraction pass.
//!
//! One read-only statistical walk over a surface's rendered tree, compiling
//! the computed styles the host reports into a [`StyleReport`]. The pass is
//! deferred behind a timer (so referenced stylesheets finish loading) by the
//! engine; the walk itself is synchronous and side-effect free.

use restyle_protocol::{
    ColorUsage, FontSizeUsage, FontUsage, LayoutUsage, Rgb, SpacingUsage, StyleReport,
    SurfaceHandle, ValueUsage,
};

use crate::extract::freq::{FreqMap, push_distinct};

const MAX_COLORS: usize = 20;
const MAX_FONTS: usize = 15;
const MAX_SPACING: usize = 15;
const MAX_RADII: usize = 10;
const MAX_SHADOWS: usize = 10;
const MAX_SCALE: usize = 12;
const MAX_LAYOUTS: usize = 8;
const MAX_IMAGES: usize = 20;
const MAX_LINKS: usize = 20;

/// Color-bearing properties sampled per element.
const COLOR_PROPS: &[&str] = &[
    "color",
    "background-color",
    "border-top-color",
    "border-right-color",
    "border-bottom-color",
    "border-left-color",
];

#[derive(Default)]
struct FontStats {
    weights: Vec<String>,
    sizes: Vec<String>,
}

/// Run the extraction pass over one surface.
pub fn extract<H: SurfaceHandle>(handle: &H) -> StyleReport {
    let mut colors: FreqMap<Vec<String>> = FreqMap::new();
    let mut fonts: FreqMap<FontStats> = FreqMap::new();
    let mut spacing: FreqMap<Vec<String>> = FreqMap::new();
    let mut radii: FreqMap<()> = FreqMap::new();
    let mut shadows: FreqMap<()> = FreqMap::new();
    let mut scale: FreqMap<Vec<String>> = FreqMap::new();
    let mut layouts: FreqMap<Vec<String>> = FreqMap::new();
    let mut image_urls = Vec::new();
    let mut link_urls = Vec::new();

    for node in handle.query_all("*") {
        let tag = handle.tag_name(node).unwrap_or_default();

        for &prop in COLOR_PROPS {
            if let Some(value) = handle.computed_style(node, prop)
                && let Some(color) = Rgb::parse(&value)
            {
                colors.tally(&color.to_string(), |props| push_distinct(props, prop));
            }
        }

        if let Some(family) = handle.computed_style(node, "font-family") {
            let primary = primary_family(&family);
            if !primary.is_empty() {
                let weight = handle.computed_style(node, "font-weight");
                let size = handle.computed_style(node, "font-size");
                fonts.tally(&primary, |stats| {
                    if let Some(w) = &weight {
                        push_distinct(&mut stats.weights, w);
                    }
                    if let Some(s) = &size {
                        push_distinct(&mut stats.sizes, s);
                    }
                });
            }
        }

        for prop in ["margin", "padding"] {
            if let Some(value) = handle.computed_style(node, prop)
                && !is_zero_spacing(&value)
            {
                spacing.tally(&value, |props| push_distinct(props, prop));
            }
        }

        if let Some(radius) = handle.computed_style(node, "border-radius")
            && !is_zero_spacing(&radius)
        {
            radii.tally(&radius, |_| {});
        }

        if let Some(shadow) = handle.computed_style(node, "box-shadow")
            && shadow != "none"
            && !shadow.is_empty()
        {
            shadows.tally(&shadow, |_| {});
        }

        if let Some(size) = handle.computed_style(node, "font-size")
            && !size.is_empty()
            && !tag.is_empty()
        {
            scale.tally(&size, |tags| push_distinct(tags, &tag));
        }

        if let Some(display) = handle.computed_style(node, "display")
            && !display.is_empty()
        {
            let detail = if display.contains("flex") {
                handle.computed_style(node, "flex-direction")
            } else if display.contains("grid") {
                handle.computed_style(node, "grid-template-columns")
            } else {
                None
            };
            layouts.tally(&display, |details| {
                if let Some(d) = &detail {
                    push_distinct(details, d);
                }
            });
        }

        match tag.as_str() {
            "img" => {
                if image_urls.len() < MAX_IMAGES
                    && let Some(src) = handle.attribute(node, "src")
                    && !src.is_empty()
                    && !src.starts_with("data:")
                {
                    push_distinct(&mut image_urls, &src);
                }
            }
            "a" => {
                if link_urls.len() < MAX_LINKS
                    && let Some(href) = handle.attribute(node, "href")
                    && !href.is_empty()
                    && !href.starts_with('#')
                    && !href.starts_with("javascript:")
                {
                    push_distinct(&mut link_urls, &href);
                }
            }
            _ => {}
        }
    }

    image_urls.truncate(MAX_IMAGES);
    link_urls.truncate(MAX_LINKS);

    StyleReport {
        colors: colors
            .top(MAX_COLORS)
            .into_iter()
            .filter_map(|(hex, count, properties)| {
                Rgb::parse(&hex).map(|color| ColorUsage {
                    color,
                    count,
                    properties,
                })
            })
            .collect(),
        fonts: fonts
            .top(MAX_FONTS)
            .into_iter()
            .map(|(family, count, stats)| FontUsage {
                family,
                count,
                weights: stats.weights,
                sizes: stats.sizes,
            })
            .collect(),
        spacing: spacing
            .top(MAX_SPACING)
            .into_iter()
            .map(|(value, count, properties)| SpacingUsage {
                value,
                count,
                properties,
            })
            .collect(),
        radii: radii
            .top(MAX_RADII)
            .into_iter()
            .map(|(value, count, ())| ValueUsage { value, count })
            .collect(),
        shadows: shadows
            .top(MAX_SHADOWS)
            .into_iter()
            .map(|(value, count, ())| ValueUsage { value, count })
            .collect(),
        scale: scale
            .top(MAX_SCALE)
            .into_iter()
            .map(|(size, count, tags)| FontSizeUsage { size, count, tags })
            .collect(),
        layouts: layouts
            .top(MAX_LAYOUTS)
            .into_iter()
            .map(|(display, count, details)| LayoutUsage {
                display,
                count,
                details,
            })
            .collect(),
        image_urls,
        link_urls,
    }
}

/// First family of a font stack, quotes stripped.
fn primary_family(stack: &str) -> String {
    stack
        .split(',')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(['"', '\''])
        .to_owned()
}

/// Whether a spacing shorthand is all zeros (`0px`, `0px 0px`, `0`).
fn is_zero_spacing(value: &str) -> bool {
    let mut parts = value.split_whitespace().peekable();
    if parts.peek().is_none() {
        return true;
    }
    parts.all(|p| matches!(p, "0" | "0px" | "0%"))
}
