//! Applying a color mapping to a live surface.
//!
//! Three passes, all matching against *current* values so re-application is
//! idempotent:
//!
//! 1. accessible same-origin stylesheet rules — matching color-valued
//!    properties rewritten in place with `!important`,
//! 2. every element — computed color-family properties compared (after hex
//!    normalization) and overridden inline with `!important`,
//! 3. embedded vector graphics — `fill`/`stroke`/`stop-color` attributes.
//!
//! The rule pass also renders its rewrites as css text; the engine injects
//! that as the color-remap style layer so reinjection on unrelated changes
//! keeps the palette without re-walking the tree.

use restyle_protocol::{ColorMapping, Rgb, SurfaceHandle};

/// Simple color-valued properties rewritten by the rule and element passes.
pub const COLOR_PROPERTIES: &[&str] = &[
    "color",
    "background-color",
    "background",
    "border-top-color",
    "border-right-color",
    "border-bottom-color",
    "border-left-color",
    "outline-color",
    "text-decoration-color",
    "column-rule-color",
];

/// Properties whose values embed colors amid other components.
pub const SHADOW_PROPERTIES: &[&str] = &["box-shadow", "text-shadow"];

const SVG_PAINT_ATTRS: &[&str] = &["fill", "stroke", "stop-color"];

/// What one application pass touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemapOutcome {
    /// css rendition of the stylesheet rewrites (the color-remap layer).
    pub css: String,
    pub rules_rewritten: usize,
    pub nodes_restyled: usize,
    pub svg_nodes_restyled: usize,
}

/// Apply `mapping` to one surface. See the module docs for the passes.
pub fn apply<H: SurfaceHandle>(handle: &mut H, mapping: &ColorMapping) -> RemapOutcome {
    let mut outcome = RemapOutcome::default();
    if mapping.is_empty() {
        return outcome;
    }

    // Pass 1: stylesheet rules.
    let mut css = String::new();
    for rule in handle.style_rules() {
        let mut rewrites: Vec<(String, String)> = Vec::new();
        for &prop in COLOR_PROPERTIES {
            if let Some(value) = handle.rule_property(rule, prop)
                && let Some(source) = Rgb::parse(&value)
                && let Some(target) = mapping.target(source)
            {
                rewrites.push((prop.to_owned(), target.to_string()));
            }
        }
        for &prop in SHADOW_PROPERTIES {
            if let Some(value) = handle.rule_property(rule, prop)
                && let Some(rewritten) = rewrite_embedded_colors(&value, mapping)
            {
                rewrites.push((prop.to_owned(), rewritten));
            }
        }
        if rewrites.is_empty() {
            continue;
        }
        outcome.rules_rewritten += 1;
        let selector = handle.rule_selector(rule);
        for (prop, value) in &rewrites {
            handle.set_rule_property(rule, prop, value, true);
        }
        if let Some(selector) = selector {
            css.push_str(&selector);
            css.push_str(" { ");
            for (prop, value) in &rewrites {
                css.push_str(&format!("{prop}: {value} !important; "));
            }
            css.push_str("}\n");
        }
    }
    outcome.css = css;

    // Pass 2: computed-style element walk.
    for node in handle.query_all("*") {
        let mut touched = false;
        for &prop in COLOR_PROPERTIES {
            if let Some(value) = handle.computed_style(node, prop)
                && let Some(source) = Rgb::parse(&value)
                && let Some(target) = mapping.target(source)
                && target != source
            {
                handle.set_inline_style(node, prop, &target.to_string(), true);
                touched = true;
            }
        }
        for &prop in SHADOW_PROPERTIES {
            if let Some(value) = handle.computed_style(node, prop)
                && let Some(rewritten) = rewrite_embedded_colors(&value, mapping)
            {
                handle.set_inline_style(node, prop, &rewritten, true);
                touched = true;
            }
        }
        if touched {
            outcome.nodes_restyled += 1;
        }
    }

    // Pass 3: vector-graphic paint attributes.
    for node in handle.query_all("svg, svg *") {
        let mut touched = false;
        for &attr in SVG_PAINT_ATTRS {
            if let Some(value) = handle.attribute(node, attr)
                && let Some(source) = Rgb::parse(&value)
                && let Some(target) = mapping.target(source)
                && target != source
            {
                handle.set_attribute(node, attr, &target.to_string());
                touched = true;
            }
        }
        if touched {
            outcome.svg_nodes_restyled += 1;
        }
    }

    tracing::debug!(
        rules = outcome.rules_rewritten,
        nodes = outcome.nodes_restyled,
        svg = outcome.svg_nodes_restyled,
        "applied color mapping"
    );
    outcome
}

/// Rewrite every mapped color token inside a compound value (shadows).
///
/// Recognizes `#hex` and `rgb()`/`rgba()` tokens. Returns `None` when no
/// token matched the mapping.
pub fn rewrite_embedded_colors(value: &str, mapping: &ColorMapping) -> Option<String> {
    let mut out = String::with_capacity(value.len());
    let mut changed = false;
    let bytes = value.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let rest = &value[i..];
        let token_len = color_token_len(rest);
        match token_len {
            Some(len) => {
                let token = &rest[..len];
                match Rgb::parse(token).and_then(|source| {
                    mapping.target(source).filter(|target| *target != source)
                }) {
                    Some(target) => {
                        changed = true;
                        out.push_str(&target.to_string());
                    }
                    None => out.push_str(token),
                }
                i += len;
            }
            None => {
                let ch_len = rest.chars().next().map_or(1, char::len_utf8);
                out.push_str(&rest[..ch_len]);
                i += ch_len;
            }
        }
    }
    changed.then_some(out)
}

/// Length of a color token starting at the head of `s`, if any.
fn color_token_len(s: &str) -> Option<usize> {
    if s.starts_with('#') {
        // Take the whole digit run; `Rgb::parse` only accepts 3- and
        // 6-digit forms, so alpha hex tokens pass through verbatim.
        let digits = s[1..].chars().take_while(char::is_ascii_hexdigit).count();
        return (digits > 0).then_some(1 + digits);
    }
    if s.starts_with("rgb(") || s.starts_with("rgba(") {
        return s.find(')').map(|close| close + 1);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::memory::{MemorySurface, Snapshot, SnapshotNode, SnapshotRule};
    use std::collections::BTreeMap;

    fn mapping() -> ColorMapping {
        let mut mapping = ColorMapping::new();
        mapping.insert(Rgb::new(255, 0, 0), Rgb::new(0, 0, 255));
        mapping.insert(Rgb::new(17, 17, 17), Rgb::new(240, 240, 240));
        mapping
    }

    fn page() -> MemorySurface {
        MemorySurface::new(Snapshot {
            url: None,
            root: SnapshotNode::new("html").with_child(
                SnapshotNode::new("body")
                    .with_computed("color", "rgb(17, 17, 17)")
                    .with_computed("background-color", "rgb(250, 250, 250)")
                    .with_computed("box-shadow", "rgb(255, 0, 0) 0px 2px 8px")
                    .with_child(
                        SnapshotNode::new("svg").with_child(
                            SnapshotNode::new("path")
                                .with_attribute("fill", "#ff0000")
                                .with_attribute("stroke", "none"),
                        ),
                    ),
            ),
            rules: vec![SnapshotRule {
                selector: ".btn".into(),
                properties: BTreeMap::from([
                    ("color".to_owned(), "#ff0000".to_owned()),
                    ("padding".to_owned(), "4px".to_owned()),
                ]),
            }],
        })
    }

    #[test]
    fn stylesheet_rules_rewrite_and_render_css() {
        let mut surface = page();
        let outcome = apply(&mut surface, &mapping());
        assert_eq!(outcome.rules_rewritten, 1);
        assert!(outcome.css.contains(".btn { color: #0000ff !important; }"));
        let rule = surface.style_rules()[0];
        assert_eq!(surface.rule_property(rule, "color").as_deref(), Some("#0000ff"));
        // Unrelated properties survive.
        assert_eq!(surface.rule_property(rule, "padding").as_deref(), Some("4px"));
    }

    #[test]
    fn computed_walk_overrides_inline() {
        let mut surface = page();
        apply(&mut surface, &mapping());
        let body = surface.query_all("body")[0];
        assert_eq!(surface.computed_style(body, "color").as_deref(), Some("#f0f0f0"));
        // Unmapped colors stay.
        assert_eq!(
            surface.computed_style(body, "background-color").as_deref(),
            Some("rgb(250, 250, 250)")
        );
    }

    #[test]
    fn shadow_colors_rewrite_inside_the_value() {
        let mut surface = page();
        apply(&mut surface, &mapping());
        let body = surface.query_all("body")[0];
        assert_eq!(
            surface.computed_style(body, "box-shadow").as_deref(),
            Some("#0000ff 0px 2px 8px")
        );
    }

    #[test]
    fn svg_paint_attributes_rewrite() {
        let mut surface = page();
        let outcome = apply(&mut surface, &mapping());
        assert_eq!(outcome.svg_nodes_restyled, 1);
        let path = surface.query_all("path")[0];
        assert_eq!(surface.attribute(path, "fill").as_deref(), Some("#0000ff"));
        assert_eq!(surface.attribute(path, "stroke").as_deref(), Some("none"));
    }

    #[test]
    fn reapplication_is_idempotent() {
        let mut surface = page();
        let map = mapping();
        apply(&mut surface, &map);
        let snapshot = surface.clone();

        let outcome = apply(&mut surface, &map);
        // Nothing matched the second time: values already carry targets.
        assert_eq!(outcome.nodes_restyled, 0);
        assert_eq!(outcome.svg_nodes_restyled, 0);
        let body = surface.query_all("body")[0];
        let before = snapshot.query_all("body")[0];
        assert_eq!(
            surface.computed_style(body, "color"),
            snapshot.computed_style(before, "color")
        );
    }

    #[test]
    fn empty_mapping_is_a_noop() {
        let mut surface = page();
        let outcome = apply(&mut surface, &ColorMapping::new());
        assert_eq!(outcome, RemapOutcome::default());
    }

    #[test]
    fn embedded_rewrite_reports_unchanged_values() {
        let map = mapping();
        assert_eq!(rewrite_embedded_colors("0px 1px rgb(1, 2, 3)", &map), None);
        assert_eq!(
            rewrite_embedded_colors("0px 1px #ff0000", &map).as_deref(),
            Some("0px 1px #0000ff")
        );
    }
}
