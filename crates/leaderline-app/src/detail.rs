//! `detail` payloads of the DOM events a mounted line dispatches.
//!
//! Keys follow the `<leader-line>` element's public event contract. Every
//! payload carries the dispatching line under [`LINE`].

use kurbo::{Point, Rect};
use leaderline_core::{DrawEvent, ElementId, PositionEvent, ReferenceChangeEvent, ValidateEvent};

pub const LINE: &str = "line";
pub const ADDED_REF: &str = "addedRef";
pub const REMOVED_REF: &str = "removedRef";
pub const REFERENCE_TYPE: &str = "referenceType";
pub const SOURCE: &str = "source";
pub const TARGET: &str = "target";
pub const SOURCE_GEOMETRY: &str = "source_geometry";
pub const TARGET_GEOMETRY: &str = "target_geometry";
pub const SOURCE_SOCKET: &str = "source_socket";
pub const TARGET_SOCKET: &str = "target_socket";
pub const START: &str = "start";
pub const END: &str = "end";
pub const RECT: &str = "rect";

/// A payload value, before conversion to the host's object model.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailValue {
    /// An element, or `null`.
    Element(Option<ElementId>),
    Text(String),
    Point(Point),
    Rect(Rect),
}

/// Ordered `(key, value)` pairs.
pub type Detail = Vec<(&'static str, DetailValue)>;

pub fn reference_change(event: &ReferenceChangeEvent) -> Detail {
    vec![
        (ADDED_REF, DetailValue::Element(event.added)),
        (REMOVED_REF, DetailValue::Element(event.removed)),
        (REFERENCE_TYPE, DetailValue::Text(event.kind.as_str().to_string())),
        (LINE, DetailValue::Element(Some(event.line))),
    ]
}

pub fn validate(event: &ValidateEvent) -> Detail {
    vec![
        (SOURCE, DetailValue::Element(event.source)),
        (TARGET, DetailValue::Element(event.target)),
        (LINE, DetailValue::Element(Some(event.line))),
    ]
}

pub fn position(event: &PositionEvent) -> Detail {
    vec![
        (SOURCE, DetailValue::Element(Some(event.source))),
        (SOURCE_GEOMETRY, DetailValue::Rect(event.source_geometry)),
        (SOURCE_SOCKET, DetailValue::Text(event.source_socket.to_string())),
        (TARGET, DetailValue::Element(Some(event.target))),
        (TARGET_GEOMETRY, DetailValue::Rect(event.target_geometry)),
        (TARGET_SOCKET, DetailValue::Text(event.target_socket.to_string())),
        (LINE, DetailValue::Element(Some(event.line))),
    ]
}

/// Listeners may rewrite [`START`], [`END`] and [`RECT`] before the path is
/// built; the host reads them back into the event.
pub fn draw(event: &DrawEvent) -> Detail {
    vec![
        (START, DetailValue::Point(event.start)),
        (END, DetailValue::Point(event.end)),
        (RECT, DetailValue::Rect(event.viewport)),
        (LINE, DetailValue::Element(Some(event.line))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaderline_core::{ReferenceKind, Socket, rect_from_xywh};
    use uuid::Uuid;

    fn keys(detail: &Detail) -> Vec<&'static str> {
        detail.iter().map(|(key, _)| *key).collect()
    }

    fn value<'a>(detail: &'a Detail, key: &str) -> Option<&'a DetailValue> {
        detail.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    #[test]
    fn test_reference_change_keys() {
        let line = Uuid::new_v4();
        let added = Uuid::new_v4();
        let detail = reference_change(&ReferenceChangeEvent {
            line,
            kind: ReferenceKind::Target,
            added: Some(added),
            removed: None,
        });
        assert_eq!(keys(&detail), ["addedRef", "removedRef", "referenceType", "line"]);
        assert_eq!(value(&detail, ADDED_REF), Some(&DetailValue::Element(Some(added))));
        assert_eq!(value(&detail, REMOVED_REF), Some(&DetailValue::Element(None)));
        assert_eq!(
            value(&detail, REFERENCE_TYPE),
            Some(&DetailValue::Text("target".into()))
        );
        assert_eq!(value(&detail, LINE), Some(&DetailValue::Element(Some(line))));
    }

    #[test]
    fn test_draw_uses_rect_key() {
        let line = Uuid::new_v4();
        let viewport = rect_from_xywh(92.5, 42.5, 215.0, 15.0);
        let detail = draw(&DrawEvent {
            line,
            start: Point::new(100.0, 50.0),
            end: Point::new(300.0, 50.0),
            viewport,
        });
        assert_eq!(keys(&detail), ["start", "end", "rect", "line"]);
        assert_eq!(value(&detail, RECT), Some(&DetailValue::Rect(viewport)));
        assert_eq!(value(&detail, "viewport"), None);
    }

    #[test]
    fn test_every_payload_carries_line() {
        let line = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let rect = rect_from_xywh(0.0, 0.0, 10.0, 10.0);
        let payloads = [
            validate(&ValidateEvent {
                line,
                source: Some(a),
                target: None,
            }),
            position(&PositionEvent {
                line,
                source: a,
                source_geometry: rect,
                source_socket: Socket::Right,
                target: b,
                target_geometry: rect,
                target_socket: Socket::Left,
            }),
        ];
        for detail in &payloads {
            assert_eq!(value(detail, LINE), Some(&DetailValue::Element(Some(line))));
        }
        assert_eq!(
            value(&payloads[1], SOURCE_SOCKET),
            Some(&DetailValue::Text("right".into()))
        );
    }
}
