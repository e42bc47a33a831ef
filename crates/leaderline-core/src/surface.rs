//! The drawing surface a line renders into.
//!
//! A line owns a fixed SVG template (host, svg root, path, arrowhead
//! marker) plus two optional parts: the dash `<animate>` element and the
//! `<text><textPath>` label. [`ConnectorSurface`] is the write-only view the
//! renderer needs; the browser implements it over the shadow DOM and
//! [`MemorySurface`] keeps everything in memory.

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// The nodes of a line's template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SvgNode {
    /// The custom element itself.
    Host,
    Svg,
    Path,
    Marker,
    MarkerPath,
    /// Dash animation, child of the path. Optional.
    Animate,
    /// Label, child of the svg root. Optional.
    Text,
    /// Label text path, child of the label. Optional.
    TextPath,
}

impl SvgNode {
    /// Element tag name.
    pub fn tag(&self) -> &'static str {
        match self {
            SvgNode::Host => "leader-line",
            SvgNode::Svg => "svg",
            SvgNode::Path | SvgNode::MarkerPath => "path",
            SvgNode::Marker => "marker",
            SvgNode::Animate => "animate",
            SvgNode::Text => "text",
            SvgNode::TextPath => "textPath",
        }
    }

    /// Whether the node is created and removed at runtime.
    pub fn is_optional(&self) -> bool {
        matches!(self, SvgNode::Animate | SvgNode::Text | SvgNode::TextPath)
    }

    /// Template id, used as the child-ref selector.
    pub fn id(&self) -> Option<&'static str> {
        match self {
            SvgNode::Svg => Some("svg"),
            SvgNode::Path => Some("path"),
            SvgNode::Marker => Some("marker"),
            SvgNode::MarkerPath => Some("marker_path"),
            _ => None,
        }
    }
}

/// Write access to a line's template.
///
/// Writes to an optional node that does not exist are ignored.
pub trait ConnectorSurface {
    fn set_attribute(&mut self, node: SvgNode, name: &str, value: &str);
    fn remove_attribute(&mut self, node: SvgNode, name: &str);
    fn set_style(&mut self, node: SvgNode, property: &str, value: &str);
    fn set_text_content(&mut self, node: SvgNode, text: &str);
    /// Create an optional node under its parent. No-op if it exists.
    fn create_node(&mut self, node: SvgNode);
    /// Remove an optional node and its children.
    fn remove_node(&mut self, node: SvgNode);
}

#[derive(Debug, Clone, Default, PartialEq)]
struct NodeState {
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: Option<String>,
}

/// In-memory surface, pre-populated with the line template.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySurface {
    nodes: BTreeMap<SvgNode, NodeState>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    pub fn new() -> Self {
        let mut surface = Self {
            nodes: BTreeMap::new(),
        };
        for node in [
            SvgNode::Host,
            SvgNode::Svg,
            SvgNode::Path,
            SvgNode::Marker,
            SvgNode::MarkerPath,
        ] {
            surface.nodes.insert(node, NodeState::default());
            if let Some(id) = node.id() {
                surface.set_attribute(node, "id", id);
            }
        }
        surface.set_style(SvgNode::Host, "display", "none");
        surface.set_attribute(SvgNode::Path, "marker-end", "url(#marker)");
        for (name, value) in [
            ("viewBox", "0 0 10 10"),
            ("refX", "5"),
            ("refY", "5"),
            ("markerWidth", "5"),
            ("markerHeight", "5"),
            ("orient", "auto-start-reverse"),
        ] {
            surface.set_attribute(SvgNode::Marker, name, value);
        }
        for (name, value) in [
            ("d", "M 0 0 L 10 5 L 0 10 z"),
            ("stroke", "context-stroke"),
            ("fill", "context-fill"),
        ] {
            surface.set_attribute(SvgNode::MarkerPath, name, value);
        }
        surface
    }

    pub fn has_node(&self, node: SvgNode) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn attribute(&self, node: SvgNode, name: &str) -> Option<&str> {
        self.nodes.get(&node)?.attributes.get(name).map(String::as_str)
    }

    pub fn style(&self, node: SvgNode, property: &str) -> Option<&str> {
        self.nodes.get(&node)?.style.get(property).map(String::as_str)
    }

    pub fn text_content(&self, node: SvgNode) -> Option<&str> {
        self.nodes.get(&node)?.text.as_deref()
    }

    /// Whether the host is displayed.
    pub fn is_displayed(&self) -> bool {
        self.style(SvgNode::Host, "display") != Some("none")
    }

    /// Serialise the svg root as a nested `<svg>` fragment.
    ///
    /// The root's `left`/`top` styles become `x`/`y` attributes so the
    /// fragment can be embedded in another SVG document. Template ids and the
    /// references to them are prefixed with `id_prefix`, since the fragment
    /// no longer lives in its own shadow root.
    pub fn to_svg_markup(&self, id_prefix: &str) -> String {
        let mut out = String::new();
        let mut root_attributes = Vec::new();
        for (property, attribute) in [("left", "x"), ("top", "y")] {
            if let Some(value) = self.style(SvgNode::Svg, property) {
                root_attributes.push((attribute, value.trim_end_matches("px").to_string()));
            }
        }

        self.open_tag(&mut out, SvgNode::Svg, &root_attributes, id_prefix);
        self.open_tag(&mut out, SvgNode::Path, &[], id_prefix);
        if self.has_node(SvgNode::Animate) {
            self.open_tag(&mut out, SvgNode::Animate, &[], id_prefix);
            close_tag(&mut out, SvgNode::Animate);
        }
        close_tag(&mut out, SvgNode::Path);
        self.open_tag(&mut out, SvgNode::Marker, &[], id_prefix);
        self.open_tag(&mut out, SvgNode::MarkerPath, &[], id_prefix);
        close_tag(&mut out, SvgNode::MarkerPath);
        close_tag(&mut out, SvgNode::Marker);
        if self.has_node(SvgNode::Text) {
            self.open_tag(&mut out, SvgNode::Text, &[], id_prefix);
            if self.has_node(SvgNode::TextPath) {
                self.open_tag(&mut out, SvgNode::TextPath, &[], id_prefix);
                if let Some(text) = self.text_content(SvgNode::TextPath) {
                    let _ = write!(out, "{}", escaped_text(text));
                }
                close_tag(&mut out, SvgNode::TextPath);
            }
            close_tag(&mut out, SvgNode::Text);
        }
        close_tag(&mut out, SvgNode::Svg);
        out
    }

    fn open_tag(&self, out: &mut String, node: SvgNode, extra: &[(&str, String)], id_prefix: &str) {
        let Some(state) = self.nodes.get(&node) else {
            return;
        };
        let _ = write!(out, "<{}", node.tag());
        for (name, value) in extra {
            let _ = write!(out, " {}=\"{}\"", name, escaped_attr(value));
        }
        for (name, value) in &state.attributes {
            let value = match (name.as_str(), value.as_str()) {
                ("id", id) => format!("{id_prefix}{id}"),
                ("href", reference) if reference.starts_with('#') => {
                    format!("#{id_prefix}{}", &reference[1..])
                }
                (_, url) if url.starts_with("url(#") => format!("url(#{id_prefix}{}", &url[5..]),
                (_, value) => value.to_string(),
            };
            let _ = write!(out, " {}=\"{}\"", name, escaped_attr(&value));
        }
        out.push('>');
    }

    fn node_mut(&mut self, node: SvgNode) -> Option<&mut NodeState> {
        self.nodes.get_mut(&node)
    }
}

fn close_tag(out: &mut String, node: SvgNode) {
    let _ = write!(out, "</{}>", node.tag());
}

impl ConnectorSurface for MemorySurface {
    fn set_attribute(&mut self, node: SvgNode, name: &str, value: &str) {
        if let Some(state) = self.node_mut(node) {
            state.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&mut self, node: SvgNode, name: &str) {
        if let Some(state) = self.node_mut(node) {
            state.attributes.remove(name);
        }
    }

    fn set_style(&mut self, node: SvgNode, property: &str, value: &str) {
        if let Some(state) = self.node_mut(node) {
            state.style.insert(property.to_string(), value.to_string());
        }
    }

    fn set_text_content(&mut self, node: SvgNode, text: &str) {
        if let Some(state) = self.node_mut(node) {
            state.text = Some(text.to_string());
        }
    }

    fn create_node(&mut self, node: SvgNode) {
        if node.is_optional() {
            self.nodes.entry(node).or_default();
        }
    }

    fn remove_node(&mut self, node: SvgNode) {
        if !node.is_optional() {
            return;
        }
        self.nodes.remove(&node);
        if node == SvgNode::Text {
            self.nodes.remove(&SvgNode::TextPath);
        }
    }
}

/// A string written with XML escaping. `"` is only escaped in attributes.
#[derive(Debug, Clone, Copy)]
pub struct Escaped<'a> {
    raw: &'a str,
    in_attribute: bool,
}

/// Escape text content.
pub fn escaped_text(raw: &str) -> Escaped<'_> {
    Escaped {
        raw,
        in_attribute: false,
    }
}

/// Escape a value placed inside a double-quoted attribute.
pub fn escaped_attr(raw: &str) -> Escaped<'_> {
    Escaped {
        raw,
        in_attribute: true,
    }
}

impl std::fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let special = |c: char| matches!(c, '&' | '<' | '>') || (self.in_attribute && c == '"');
        let mut rest = self.raw;
        while let Some(at) = rest.find(special) {
            f.write_str(&rest[..at])?;
            f.write_str(match rest.as_bytes()[at] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                _ => "&quot;",
            })?;
            rest = &rest[at + 1..];
        }
        f.write_str(rest)
    }
}
