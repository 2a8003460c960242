//! In-memory rendering surface.
//!
//! The [`SurfaceHandle`] reference implementation: a scriptable document
//! snapshot (element tree with computed-style maps, accessible stylesheet
//! rules, head style elements, a scroll offset) that stands in for a real
//! rendering host. The CLI inspector runs extraction and remapping against
//! it offline, and every integration test drives the engine through it.
//!
//! Computed styles are part of the snapshot rather than derived — this is a
//! capability mock, not a style engine. Inline overrides shadow the
//! snapshot's computed values the way a real host's computed values would
//! follow an inline `!important` write.

use std::collections::BTreeMap;

use restyle_protocol::{NodeId, Point, RuleId, SurfaceHandle};
use serde::{Deserialize, Serialize};

/// One element in a snapshot document, with its subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Computed styles as the host would report them.
    #[serde(default)]
    pub computed: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_owned(), value.to_owned());
        self
    }

    pub fn with_computed(mut self, property: &str, value: &str) -> Self {
        self.computed.insert(property.to_owned(), value.to_owned());
        self
    }

    pub fn with_child(mut self, child: SnapshotNode) -> Self {
        self.children.push(child);
        self
    }
}

/// One rule of an accessible stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRule {
    pub selector: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// A captured document: the serialized form the CLI inspector consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub url: Option<String>,
    pub root: SnapshotNode,
    #[serde(default)]
    pub rules: Vec<SnapshotRule>,
}

#[derive(Debug, Clone)]
struct FlatNode {
    tag: String,
    attributes: BTreeMap<String, String>,
    computed: BTreeMap<String, String>,
    /// Inline overrides, shadowing `computed`.
    inline: BTreeMap<String, String>,
    /// Whether the node sits below an `svg` element.
    in_svg: bool,
}

/// Scriptable [`SurfaceHandle`] over a [`Snapshot`].
#[derive(Debug, Clone)]
pub struct MemorySurface {
    pristine: Snapshot,
    nodes: Vec<FlatNode>,
    rules: Vec<SnapshotRule>,
    head_styles: Vec<(String, String)>,
    scroll: Point,
    loaded: bool,
    restricted: bool,
    /// Content writes received — lets tests verify the initialization ledger.
    pub content_writes: usize,
    /// URL of the last `navigate` call, if any.
    pub navigated_to: Option<String>,
}

impl MemorySurface {
    pub fn new(snapshot: Snapshot) -> Self {
        let mut surface = Self {
            nodes: Vec::new(),
            rules: snapshot.rules.clone(),
            pristine: snapshot,
            head_styles: Vec::new(),
            scroll: Point::default(),
            loaded: true,
            restricted: false,
            content_writes: 0,
            navigated_to: None,
        };
        surface.rebuild();
        surface
    }

    /// An empty loaded surface (no document yet).
    pub fn empty() -> Self {
        Self::new(Snapshot {
            root: SnapshotNode::new("html"),
            ..Snapshot::default()
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Mark the surface cross-origin restricted.
    pub fn restricted(mut self) -> Self {
        self.restricted = true;
        self
    }

    /// Override the loaded flag (attach-retry tests start unloaded).
    pub fn with_loaded(mut self, loaded: bool) -> Self {
        self.loaded = loaded;
        self
    }

    pub fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    /// Reset the live tree to the pristine snapshot.
    fn rebuild(&mut self) {
        self.nodes.clear();
        let root = self.pristine.root.clone();
        self.flatten(&root, false);
        self.rules = self.pristine.rules.clone();
    }

    fn flatten(&mut self, node: &SnapshotNode, in_svg: bool) {
        let is_svg = node.tag.eq_ignore_ascii_case("svg");
        self.nodes.push(FlatNode {
            tag: node.tag.to_ascii_lowercase(),
            attributes: node.attributes.clone(),
            computed: node.computed.clone(),
            inline: BTreeMap::new(),
            in_svg,
        });
        for child in &node.children {
            self.flatten(child, in_svg || is_svg);
        }
    }

    fn node(&self, id: NodeId) -> Option<&FlatNode> {
        self.nodes.get(id.0 as usize)
    }

    /// The css text of the reserved-id style element, if present.
    pub fn style_element(&self, id: &str) -> Option<&str> {
        self.head_styles
            .iter()
            .find(|(sid, _)| sid == id)
            .map(|(_, css)| css.as_str())
    }

    /// How many style elements carry the given id (injection must keep this
    /// at most 1).
    pub fn style_element_count(&self, id: &str) -> usize {
        self.head_styles.iter().filter(|(sid, _)| sid == id).count()
    }

    fn matches_simple(node: &FlatNode, selector: &str) -> bool {
        let selector = selector.trim();
        if selector == "*" {
            return true;
        }
        if let Some(rest) = selector.strip_prefix("svg ") {
            return node.in_svg && Self::matches_simple(node, rest);
        }
        let (tag, attr) = match selector.split_once('[') {
            Some((tag, attr)) => (tag, attr.strip_suffix(']')),
            None => (selector, None),
        };
        if !tag.is_empty() && node.tag != tag.to_ascii_lowercase() {
            return false;
        }
        match attr {
            Some(name) => node.attributes.contains_key(name.trim()),
            None => true,
        }
    }
}

impl SurfaceHandle for MemorySurface {
    fn write_content(&mut self, _html: &str) {
        // A write re-instantiates the captured document: the snapshot *is*
        // the rendered form of this content.
        self.rebuild();
        self.head_styles.clear();
        self.scroll = Point::default();
        self.content_writes += 1;
        self.loaded = true;
    }

    fn navigate(&mut self, url: &str) {
        self.rebuild();
        self.head_styles.clear();
        self.scroll = Point::default();
        self.navigated_to = Some(url.to_owned());
        self.loaded = true;
    }

    fn is_restricted(&self) -> bool {
        self.restricted
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        if self.restricted {
            return Vec::new();
        }
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                selector
                    .split(',')
                    .any(|simple| Self::matches_simple(node, simple))
            })
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.node(node).map(|n| n.tag.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node)?.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.nodes.get_mut(node.0 as usize) {
            n.attributes.insert(name.to_owned(), value.to_owned());
        }
    }

    fn computed_style(&self, node: NodeId, property: &str) -> Option<String> {
        let n = self.node(node)?;
        n.inline
            .get(property)
            .or_else(|| n.computed.get(property))
            .cloned()
    }

    fn set_inline_style(&mut self, node: NodeId, property: &str, value: &str, _important: bool) {
        if let Some(n) = self.nodes.get_mut(node.0 as usize) {
            n.inline.insert(property.to_owned(), value.to_owned());
        }
    }

    fn style_rules(&self) -> Vec<RuleId> {
        if self.restricted {
            return Vec::new();
        }
        (0..self.rules.len()).map(|i| RuleId(i as u32)).collect()
    }

    fn rule_selector(&self, rule: RuleId) -> Option<String> {
        self.rules.get(rule.0 as usize).map(|r| r.selector.clone())
    }

    fn rule_property(&self, rule: RuleId, property: &str) -> Option<String> {
        self.rules.get(rule.0 as usize)?.properties.get(property).cloned()
    }

    fn set_rule_property(&mut self, rule: RuleId, property: &str, value: &str, _important: bool) {
        if let Some(r) = self.rules.get_mut(rule.0 as usize) {
            r.properties.insert(property.to_owned(), value.to_owned());
        }
    }

    fn remove_style_element(&mut self, id: &str) {
        self.head_styles.retain(|(sid, _)| sid != id);
    }

    fn append_style_element(&mut self, id: &str, css: &str) {
        self.head_styles.push((id.to_owned(), css.to_owned()));
    }

    fn scroll_offset(&self) -> Point {
        self.scroll
    }

    fn set_scroll_offset(&mut self, offset: Point) {
        self.scroll = offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemorySurface {
        MemorySurface::new(Snapshot {
            url: Some("https://example.com/".into()),
            root: SnapshotNode::new("html").with_child(
                SnapshotNode::new("body")
                    .with_computed("color", "rgb(20, 20, 20)")
                    .with_child(SnapshotNode::new("img").with_attribute("src", "a.png"))
                    .with_child(
                        SnapshotNode::new("svg")
                            .with_child(SnapshotNode::new("path").with_attribute("fill", "#ff0000")),
                    ),
            ),
            rules: vec![SnapshotRule {
                selector: "body".into(),
                properties: BTreeMap::from([("color".to_owned(), "#141414".to_owned())]),
            }],
        })
    }

    #[test]
    fn selector_subset() {
        let surface = sample();
        assert_eq!(surface.query_all("*").len(), 5);
        assert_eq!(surface.query_all("img").len(), 1);
        assert_eq!(surface.query_all("img[src]").len(), 1);
        assert_eq!(surface.query_all("[src]").len(), 1);
        assert_eq!(surface.query_all("img[srcset]").len(), 0);
        assert_eq!(surface.query_all("svg *").len(), 1);
        assert_eq!(surface.query_all("svg, svg *").len(), 2);
    }

    #[test]
    fn inline_override_shadows_computed() {
        let mut surface = sample();
        let body = surface.query_all("body")[0];
        assert_eq!(
            surface.computed_style(body, "color").as_deref(),
            Some("rgb(20, 20, 20)")
        );
        surface.set_inline_style(body, "color", "#00ff00", true);
        assert_eq!(surface.computed_style(body, "color").as_deref(), Some("#00ff00"));
    }

    #[test]
    fn write_content_resets_overrides_and_counts() {
        let mut surface = sample();
        let body = surface.query_all("body")[0];
        surface.set_inline_style(body, "color", "#00ff00", true);
        surface.append_style_element("x", "body{}");

        surface.write_content("<html></html>");
        assert_eq!(surface.content_writes, 1);
        assert_eq!(surface.style_element_count("x"), 0);
        let body = surface.query_all("body")[0];
        assert_eq!(
            surface.computed_style(body, "color").as_deref(),
            Some("rgb(20, 20, 20)")
        );
    }

    #[test]
    fn restricted_surface_exposes_nothing() {
        let surface = sample().restricted();
        assert!(surface.query_all("*").is_empty());
        assert!(surface.style_rules().is_empty());
        assert!(surface.is_restricted());
    }

    #[test]
    fn snapshot_json_roundtrip() {
        let snapshot = sample().pristine.clone();
        let json = serde_json::to_string(&snapshot).expect("serialize");
        let surface = MemorySurface::from_json(&json).expect("parse");
        assert_eq!(surface.query_all("*").len(), 5);
    }
}
