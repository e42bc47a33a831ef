//! Rectangle math used by the positioning engine.
//!
//! All rectangles are axis-aligned `kurbo::Rect`s in screen coordinates
//! (y grows downward). Nothing here mutates its inputs.

use kurbo::{Point, Rect};

/// Build a rectangle from an origin and a size, the way bounding client
/// rects are reported by the platform.
pub fn rect_from_xywh(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::from_origin_size((x, y), (width, height))
}

/// Extra rectangle predicates on top of what `kurbo` ships.
pub trait RectExt {
    /// Rectangle of overlap, or [`Rect::ZERO`] when the two don't overlap.
    fn intersection_rect(&self, other: &Rect) -> Rect;

    /// Whether the overlap has a nonzero area. Touching edges don't count.
    fn intersects_rect(&self, other: &Rect) -> bool;

    /// Whether `other` fits entirely inside `self` and `self` is strictly
    /// larger. Equal rectangles never contain each other.
    fn strictly_contains_rect(&self, other: &Rect) -> bool;

    /// Point containment, inclusive of every edge.
    fn contains_point_inclusive(&self, point: Point) -> bool;

    /// Point containment after translating `self` by `(tx, ty)`.
    fn contains_point_translated(&self, tx: f64, ty: f64, point: Point) -> bool;

    /// [`RectExt::strictly_contains_rect`] against `other` translated by `(tx, ty)`.
    fn contains_rect_translated(&self, tx: f64, ty: f64, other: &Rect) -> bool;
}

impl RectExt for Rect {
    fn intersection_rect(&self, other: &Rect) -> Rect {
        let left = self.min_x().max(other.min_x());
        let right = self.max_x().min(other.max_x());
        if left > right {
            return Rect::ZERO;
        }
        let bottom = self.max_y().min(other.max_y());
        let top = self.min_y().max(other.min_y());
        if bottom < top {
            return Rect::ZERO;
        }
        rect_from_xywh(left, top, (right - left).abs(), (bottom - top).abs())
    }

    fn intersects_rect(&self, other: &Rect) -> bool {
        self.intersection_rect(other).area() != 0.0
    }

    fn strictly_contains_rect(&self, other: &Rect) -> bool {
        if self.area() <= other.area() || self.width() < other.width() || self.height() < other.height() {
            return false;
        }
        let overlap = self.intersection_rect(other);
        // Compare origin + size; `x0 + w` may round differently from `x1`.
        overlap.x0 == other.x0
            && overlap.y0 == other.y0
            && overlap.width() == other.width()
            && overlap.height() == other.height()
    }

    fn contains_point_inclusive(&self, point: Point) -> bool {
        point.x >= self.x0 && point.x <= self.x1 && point.y >= self.y0 && point.y <= self.y1
    }

    fn contains_point_translated(&self, tx: f64, ty: f64, point: Point) -> bool {
        point.x >= self.x0 + tx && point.x <= self.x1 + tx && point.y >= self.y0 + ty && point.y <= self.y1 + ty
    }

    fn contains_rect_translated(&self, tx: f64, ty: f64, other: &Rect) -> bool {
        self.strictly_contains_rect(&rect_from_xywh(other.x0 + tx, other.y0 + ty, other.width(), other.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Rect> {
        vec![
            rect_from_xywh(0.0, 0.0, 100.0, 100.0),
            rect_from_xywh(50.0, 50.0, 100.0, 100.0),
            rect_from_xywh(300.0, 0.0, 100.0, 100.0),
            rect_from_xywh(100.0, 0.0, 50.0, 50.0),
            rect_from_xywh(-20.0, 10.0, 40.0, 5.0),
            rect_from_xywh(25.0, 25.0, 10.0, 10.0),
        ]
    }

    #[test]
    fn test_intersection_is_commutative() {
        let rects = samples();
        for a in &rects {
            for b in &rects {
                assert_eq!(a.intersection_rect(b), b.intersection_rect(a));
            }
        }
    }

    #[test]
    fn test_zero_area_iff_not_intersecting() {
        let rects = samples();
        for a in &rects {
            for b in &rects {
                let empty = a.intersection_rect(b).area() == 0.0;
                assert_eq!(empty, !a.intersects_rect(b));
            }
        }
    }

    #[test]
    fn test_intersection_overlap() {
        let a = rect_from_xywh(0.0, 0.0, 100.0, 100.0);
        let b = rect_from_xywh(50.0, 50.0, 100.0, 100.0);
        assert_eq!(a.intersection_rect(&b), rect_from_xywh(50.0, 50.0, 50.0, 50.0));
    }

    #[test]
    fn test_disjoint_intersection_is_zero_rect() {
        let a = rect_from_xywh(0.0, 0.0, 100.0, 100.0);
        let b = rect_from_xywh(300.0, 0.0, 100.0, 100.0);
        assert_eq!(a.intersection_rect(&b), Rect::ZERO);
        let below = rect_from_xywh(0.0, 200.0, 100.0, 100.0);
        assert_eq!(a.intersection_rect(&below), Rect::ZERO);
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = rect_from_xywh(0.0, 0.0, 100.0, 100.0);
        let b = rect_from_xywh(100.0, 0.0, 50.0, 50.0);
        assert!(!a.intersects_rect(&b));
    }

    #[test]
    fn test_contains_strict() {
        let outer = rect_from_xywh(0.0, 0.0, 100.0, 100.0);
        let inner = rect_from_xywh(25.0, 25.0, 10.0, 10.0);
        assert!(outer.strictly_contains_rect(&inner));
        assert!(!inner.strictly_contains_rect(&outer));
    }

    #[test]
    fn test_equal_rects_do_not_contain() {
        let a = rect_from_xywh(10.0, 10.0, 40.0, 40.0);
        let b = a;
        assert!(!a.strictly_contains_rect(&b));
        assert!(!b.strictly_contains_rect(&a));
        // kurbo's inherent `contains_rect` is inclusive; ours must not be.
        assert!(a.contains_rect(b));
    }

    #[test]
    fn test_partial_overlap_is_not_containment() {
        let a = rect_from_xywh(0.0, 0.0, 100.0, 100.0);
        let b = rect_from_xywh(90.0, 90.0, 20.0, 20.0);
        assert!(!a.strictly_contains_rect(&b));
    }

    #[test]
    fn test_center() {
        let r = rect_from_xywh(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.center(), Point::new(60.0, 45.0));
        assert_eq!(r.area(), 5000.0);
    }

    #[test]
    fn test_contains_point_inclusive_edges() {
        let r = rect_from_xywh(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains_point_inclusive(Point::new(10.0, 10.0)));
        assert!(r.contains_point_inclusive(Point::new(0.0, 5.0)));
        assert!(!r.contains_point_inclusive(Point::new(10.5, 5.0)));
    }

    #[test]
    fn test_translated_containment() {
        let r = rect_from_xywh(0.0, 0.0, 10.0, 10.0);
        assert!(!r.contains_point_translated(0.0, 0.0, Point::new(15.0, 15.0)));
        assert!(r.contains_point_translated(10.0, 10.0, Point::new(15.0, 15.0)));

        let outer = rect_from_xywh(0.0, 0.0, 100.0, 100.0);
        let inner = rect_from_xywh(95.0, 95.0, 10.0, 10.0);
        assert!(!outer.strictly_contains_rect(&inner));
        assert!(outer.contains_rect_translated(-50.0, -50.0, &inner));
    }
}
