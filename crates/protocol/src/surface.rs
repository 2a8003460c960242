use serde::{Deserialize, Serialize};

use crate::types::Point;

/// Opaque element handle within one surface's rendered tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Opaque handle to one rule in an accessible stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub u32);

/// Which half of a before/after pair a surface plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceRole {
    /// Receives style injection and remapping.
    Modified,
    /// The untouched reference copy. Never receives style injection.
    Original,
}

/// Capability contract a host implements to expose one live rendering
/// surface to the engine.
///
/// The engine is deliberately ignorant of what a surface *is* — a browser
/// iframe, a webview, or an in-memory document in tests. Everything the
/// core needs is expressed through this trait:
///
/// - content delivery (`write_content` / `navigate`),
/// - tree inspection (`query_all`, `tag_name`, `attribute`, `computed_style`),
/// - the three permitted mutation channels (attributes, inline style
///   overrides, the single reserved-id style element),
/// - accessible stylesheet rules, and
/// - the scroll position used by the comparison synchronizer.
///
/// Hosts report readiness and cross-origin restriction; the engine degrades
/// per surface instead of failing.
pub trait SurfaceHandle {
    /// Replace the surface's document with the given markup.
    fn write_content(&mut self, html: &str);

    /// Point the surface directly at a URL (reference copies load their own
    /// document instead of receiving a write).
    fn navigate(&mut self, url: &str);

    /// Whether the document can be introspected. A cross-origin surface
    /// reports `true` and is excluded from injection, extraction, and remap.
    fn is_restricted(&self) -> bool;

    /// Whether the document finished loading.
    fn is_loaded(&self) -> bool;

    /// Elements matching a selector, in document order. Supported grammar is
    /// the small subset the engine uses: `*`, `tag`, `[attr]`, `tag[attr]`,
    /// `svg *`, and comma lists thereof.
    fn query_all(&self, selector: &str) -> Vec<NodeId>;

    /// Lowercase tag name, if the node still exists.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// Resolved computed value for a property, as the host reports it
    /// (typically `rgb(...)` forms for colors).
    fn computed_style(&self, node: NodeId, property: &str) -> Option<String>;

    /// Set an inline override. `important` maps to `!important` priority.
    fn set_inline_style(&mut self, node: NodeId, property: &str, value: &str, important: bool);

    /// Rules of accessible same-origin stylesheets, in document order.
    fn style_rules(&self) -> Vec<RuleId>;

    fn rule_selector(&self, rule: RuleId) -> Option<String>;

    fn rule_property(&self, rule: RuleId, property: &str) -> Option<String>;

    fn set_rule_property(&mut self, rule: RuleId, property: &str, value: &str, important: bool);

    /// Remove the style element carrying the given reserved id, if present.
    fn remove_style_element(&mut self, id: &str);

    /// Append a style element with the given reserved id and css text to the
    /// document head, creating the head first if absent.
    fn append_style_element(&mut self, id: &str, css: &str);

    fn scroll_offset(&self) -> Point;

    fn set_scroll_offset(&mut self, offset: Point);
}
