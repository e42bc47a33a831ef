//! Writes style and geometry onto a line's surface.

use crate::style::StyleConfiguration;
use crate::surface::{ConnectorSurface, SvgNode};
use kurbo::Rect;

/// Owns a line's surface and knows which template nodes to touch.
pub struct LineRenderer<S> {
    surface: S,
    hidden: bool,
}

impl<S: ConnectorSurface> LineRenderer<S> {
    /// Wrap a freshly mounted (hidden) surface.
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            hidden: true,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Show or hide the host. Only writes when the state changes.
    pub fn set_visible(&mut self, visible: bool) {
        if visible != self.hidden {
            return;
        }
        self.hidden = !visible;
        let display = if visible { "contents" } else { "none" };
        self.surface.set_style(SvgNode::Host, "display", display);
    }

    /// Write the path data and fit the svg root to `viewport`.
    pub fn draw(&mut self, path: &str, viewport: Rect) {
        let (x, y, w, h) = (viewport.x0, viewport.y0, viewport.width(), viewport.height());
        self.surface.set_attribute(SvgNode::Path, "d", path);
        self.surface.set_style(SvgNode::Svg, "left", &format!("{x}px"));
        self.surface.set_style(SvgNode::Svg, "top", &format!("{y}px"));
        self.surface.set_attribute(SvgNode::Svg, "width", &format!("{w}px"));
        self.surface.set_attribute(SvgNode::Svg, "height", &format!("{h}px"));
        self.surface
            .set_attribute(SvgNode::Svg, "viewBox", &format!("{x} {y} {w} {h}"));
    }

    /// Apply a resolved style to the template.
    pub fn apply_style(&mut self, style: &StyleConfiguration) {
        let surface = &mut self.surface;
        surface.set_attribute(SvgNode::Path, "stroke", &style.color);
        surface.set_attribute(SvgNode::Path, "fill", &style.color);
        surface.set_attribute(SvgNode::Path, "stroke-width", &style.line_thickness.to_string());
        let arrowhead = style.arrowhead_thickness.to_string();
        surface.set_attribute(SvgNode::Marker, "markerWidth", &arrowhead);
        surface.set_attribute(SvgNode::Marker, "markerHeight", &arrowhead);

        match &style.dashed {
            Some(dash) => {
                surface.set_attribute(SvgNode::Path, "stroke-dasharray", &dash.dash_length.to_string());
                surface.set_attribute(SvgNode::Path, "stroke-dashoffset", &dash.start_offset.to_string());
                match &dash.animate {
                    Some(animation) => {
                        surface.create_node(SvgNode::Animate);
                        surface.set_attribute(SvgNode::Animate, "attributeName", "stroke-dashoffset");
                        surface.set_attribute(SvgNode::Animate, "dur", &animation.duration.to_string());
                        surface.set_attribute(SvgNode::Animate, "calcMode", animation.timing.as_str());
                        surface.set_attribute(SvgNode::Animate, "repeatCount", &animation.repeat.to_string());
                        surface.set_attribute(
                            SvgNode::Animate,
                            "values",
                            &format!("{};0", dash.dash_length * 2.0),
                        );
                    }
                    None => surface.remove_node(SvgNode::Animate),
                }
            }
            None => {
                surface.remove_attribute(SvgNode::Path, "stroke-dasharray");
                surface.remove_attribute(SvgNode::Path, "stroke-dashoffset");
                surface.remove_node(SvgNode::Animate);
            }
        }

        match style.text.as_deref() {
            Some(text) if !text.is_empty() => {
                surface.create_node(SvgNode::Text);
                surface.create_node(SvgNode::TextPath);
                surface.set_attribute(SvgNode::TextPath, "href", "#path");
                surface.set_attribute(SvgNode::TextPath, "startOffset", "50%");
                surface.set_text_content(SvgNode::TextPath, text);
                surface.set_attribute(SvgNode::TextPath, "fill", &style.color);
            }
            _ => surface.remove_node(SvgNode::Text),
        }
    }
}
