//! Path and viewport computation for a straight connector.

use crate::element::ElementId;
use crate::events::DrawEvent;
use crate::socket::Socket;
use crate::style::{Curve, StyleConfiguration};
use kurbo::{Point, Rect};

/// What to write to the surface for one redraw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Path data for the connector (`d` attribute).
    pub path: String,
    /// Region of the svg root, in page coordinates, as left by the draw
    /// notification.
    pub viewport: Rect,
}

/// Rect spanning both endpoints, grown on every side by the arrowhead and
/// line thickness so neither gets clipped.
pub fn viewport(start: Point, end: Point, style: &StyleConfiguration) -> Rect {
    let pad = style.arrowhead_thickness + style.line_thickness;
    Rect::from_points(start, end).inflate(pad, pad)
}

/// Move the start point half a line thickness inward from `socket`.
pub fn adjust_start(start: Point, socket: Socket, line_thickness: f64) -> Point {
    let half = line_thickness / 2.0;
    match socket {
        Socket::Left => Point::new(start.x + half, start.y),
        Socket::Top => Point::new(start.x, start.y + half),
        Socket::Right => Point::new(start.x - half, start.y),
        Socket::Bottom => Point::new(start.x, start.y - half),
    }
}

/// SVG path data from `start` to `end`.
pub fn path_command(curve: Curve, start: Point, end: Point) -> String {
    match curve {
        Curve::Linear => format!("M {},{} L {},{}", start.x, start.y, end.x, end.y),
    }
}

/// Run one draw pass: viewport from the socket points, then the cancelable
/// draw notification, then the start-adjusted path from whatever geometry
/// the notification left. `None` when vetoed.
pub fn build_draw(
    line: ElementId,
    start: Point,
    end: Point,
    socket: Socket,
    style: &StyleConfiguration,
    notify: impl FnOnce(&mut DrawEvent) -> bool,
) -> Option<DrawCommand> {
    let mut event = DrawEvent {
        line,
        start,
        end,
        viewport: viewport(start, end, style),
    };
    if !notify(&mut event) {
        return None;
    }
    let adjusted = adjust_start(event.start, socket, style.line_thickness);
    Some(DrawCommand {
        path: path_command(style.curve, adjusted, event.end),
        viewport: event.viewport,
    })
}
