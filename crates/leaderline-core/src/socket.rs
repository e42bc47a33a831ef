//! Socket selection: which edge midpoint of each rectangle a line attaches to.
//!
//! The incident angle between the two rectangle centers is compared with each
//! rectangle's own corner-diagonal angles. Angles increase counter-clockwise
//! from the positive x axis, with y inverted to match screen coordinates.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::fmt;

/// Midpoint of one edge of a bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Socket {
    Left,
    Top,
    Right,
    Bottom,
}

impl Socket {
    /// Classify an incident angle against a rectangle's corner angles.
    ///
    /// Intervals are half-open and evaluated in order, so an angle lying
    /// exactly on a diagonal always resolves to the same socket.
    pub fn from_incident_angle(incident: f64, corners: &CornerAngles) -> Self {
        if incident <= corners.top_right || incident > corners.bottom_right {
            return Socket::Right;
        }
        if incident <= corners.top_left && incident > corners.top_right {
            return Socket::Top;
        }
        if incident <= corners.bottom_left && incident > corners.top_left {
            return Socket::Left;
        }
        Socket::Bottom
    }

    /// Coordinates of this socket on `rect`, given its center.
    pub fn point_on(self, rect: &Rect, center: Point) -> Point {
        match self {
            Socket::Left => Point::new(center.x - rect.width() / 2.0, center.y),
            Socket::Top => Point::new(center.x, center.y - rect.height() / 2.0),
            Socket::Right => Point::new(center.x + rect.width() / 2.0, center.y),
            Socket::Bottom => Point::new(center.x, center.y + rect.height() / 2.0),
        }
    }
}

impl fmt::Display for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Socket::Left => "left",
            Socket::Top => "top",
            Socket::Right => "right",
            Socket::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

/// Angle from `origin` to `vertex`, normalised to `[0, 2π)`.
pub fn angle_between(origin: Point, vertex: Point) -> f64 {
    let angle = (-(vertex.y - origin.y)).atan2(vertex.x - origin.x);
    if angle < 0.0 { angle + TAU } else { angle }
}

/// Angles of a rectangle's four corner diagonals, relative to its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerAngles {
    pub top_right: f64,
    pub top_left: f64,
    pub bottom_left: f64,
    pub bottom_right: f64,
}

impl CornerAngles {
    /// Corner angles of `rect`. Only the top-right diagonal is measured; the
    /// rest follow by symmetry.
    pub fn of(rect: &Rect, center: Point) -> Self {
        let va = angle_between(center, Point::new(rect.max_x(), rect.min_y()));
        let ha = PI - 2.0 * va;
        Self {
            top_right: va,
            top_left: va + ha,
            bottom_left: PI + va,
            bottom_right: PI + va + ha,
        }
    }
}

/// Sockets chosen for a source/target pair, with the centers used to get them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocketResolution {
    pub source: Socket,
    pub target: Socket,
    pub source_center: Point,
    pub target_center: Point,
}

impl SocketResolution {
    /// Socket coordinates on the source rectangle.
    pub fn source_point(&self, source: &Rect) -> Point {
        self.source.point_on(source, self.source_center)
    }

    /// Socket coordinates on the target rectangle.
    pub fn target_point(&self, target: &Rect) -> Point {
        self.target.point_on(target, self.target_center)
    }
}

/// Pick the sockets a line from `source` to `target` should connect.
pub fn resolve_sockets(source: &Rect, target: &Rect) -> SocketResolution {
    let source_center = source.center();
    let target_center = target.center();
    let source_angle = angle_between(source_center, target_center);
    let target_angle = angle_between(target_center, source_center);
    let source_corners = CornerAngles::of(source, source_center);
    let target_corners = CornerAngles::of(target, target_center);
    SocketResolution {
        source: Socket::from_incident_angle(source_angle, &source_corners),
        target: Socket::from_incident_angle(target_angle, &target_corners),
        source_center,
        target_center,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rect_from_xywh;
    use std::f64::consts::FRAC_PI_4;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_angle_is_counter_clockwise_in_screen_space() {
        let o = Point::new(0.0, 0.0);
        assert!(approx(angle_between(o, Point::new(10.0, 0.0)), 0.0));
        assert!(approx(angle_between(o, Point::new(0.0, -10.0)), PI / 2.0));
        assert!(approx(angle_between(o, Point::new(-10.0, 0.0)), PI));
        assert!(approx(angle_between(o, Point::new(0.0, 10.0)), 3.0 * PI / 2.0));
    }

    #[test]
    fn test_square_corner_angles() {
        let r = rect_from_xywh(0.0, 0.0, 100.0, 100.0);
        let corners = CornerAngles::of(&r, r.center());
        assert!(approx(corners.top_right, FRAC_PI_4));
        assert!(approx(corners.top_left, 3.0 * FRAC_PI_4));
        assert!(approx(corners.bottom_left, 5.0 * FRAC_PI_4));
        assert!(approx(corners.bottom_right, 7.0 * FRAC_PI_4));
    }

    #[test]
    fn test_wide_rect_corner_angles() {
        let r = rect_from_xywh(0.0, 0.0, 200.0, 100.0);
        let corners = CornerAngles::of(&r, r.center());
        assert!(approx(corners.top_right, 0.5f64.atan()));
        assert!(approx(corners.top_left, PI - 0.5f64.atan()));
    }

    #[test]
    fn test_target_to_the_right() {
        let source = rect_from_xywh(0.0, 0.0, 100.0, 100.0);
        let target = rect_from_xywh(300.0, 0.0, 100.0, 100.0);
        let resolution = resolve_sockets(&source, &target);
        assert_eq!(resolution.source, Socket::Right);
        assert_eq!(resolution.target, Socket::Left);
        assert_eq!(resolution.source_point(&source), Point::new(100.0, 50.0));
        assert_eq!(resolution.target_point(&target), Point::new(300.0, 50.0));
    }

    #[test]
    fn test_target_above_and_below() {
        let source = rect_from_xywh(0.0, 300.0, 100.0, 100.0);
        let target = rect_from_xywh(0.0, 0.0, 100.0, 100.0);
        let up = resolve_sockets(&source, &target);
        assert_eq!((up.source, up.target), (Socket::Top, Socket::Bottom));
        let down = resolve_sockets(&target, &source);
        assert_eq!((down.source, down.target), (Socket::Bottom, Socket::Top));
    }

    #[test]
    fn test_target_to_the_left() {
        let source = rect_from_xywh(300.0, 0.0, 100.0, 100.0);
        let target = rect_from_xywh(0.0, 20.0, 100.0, 100.0);
        let resolution = resolve_sockets(&source, &target);
        assert_eq!((resolution.source, resolution.target), (Socket::Left, Socket::Right));
    }

    #[test]
    fn test_exact_diagonal_is_deterministic() {
        // Centers 200 apart on both axes: exactly on the top-right diagonal.
        let source = rect_from_xywh(0.0, 0.0, 100.0, 100.0);
        let target = rect_from_xywh(200.0, -200.0, 100.0, 100.0);
        let first = resolve_sockets(&source, &target);
        assert_eq!(first.source, Socket::Right);
        for _ in 0..10 {
            assert_eq!(resolve_sockets(&source, &target), first);
        }
    }

    #[test]
    fn test_boundary_classification() {
        let corners = CornerAngles {
            top_right: FRAC_PI_4,
            top_left: 3.0 * FRAC_PI_4,
            bottom_left: 5.0 * FRAC_PI_4,
            bottom_right: 7.0 * FRAC_PI_4,
        };
        assert_eq!(Socket::from_incident_angle(FRAC_PI_4, &corners), Socket::Right);
        assert_eq!(Socket::from_incident_angle(3.0 * FRAC_PI_4, &corners), Socket::Top);
        assert_eq!(Socket::from_incident_angle(5.0 * FRAC_PI_4, &corners), Socket::Left);
        assert_eq!(Socket::from_incident_angle(7.0 * FRAC_PI_4, &corners), Socket::Bottom);
        assert_eq!(Socket::from_incident_angle(7.5 * FRAC_PI_4, &corners), Socket::Right);
    }

    #[test]
    fn test_socket_points() {
        let r = rect_from_xywh(10.0, 10.0, 40.0, 20.0);
        let c = r.center();
        assert_eq!(Socket::Left.point_on(&r, c), Point::new(10.0, 20.0));
        assert_eq!(Socket::Top.point_on(&r, c), Point::new(30.0, 10.0));
        assert_eq!(Socket::Right.point_on(&r, c), Point::new(50.0, 20.0));
        assert_eq!(Socket::Bottom.point_on(&r, c), Point::new(30.0, 30.0));
    }
}
