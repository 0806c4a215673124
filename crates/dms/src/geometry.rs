//! Planar landmark geometry

use landmark_source::Point2D;

/// Euclidean distance between two landmarks
#[inline]
pub fn distance(p1: Point2D, p2: Point2D) -> f32 {
    (p1.x - p2.x).hypot(p1.y - p2.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point2D::new(1.0, 2.0);
        let b = Point2D::new(4.0, 6.0);
        assert_eq!(distance(a, b), 5.0);
        assert_eq!(distance(b, a), 5.0);
        assert_eq!(distance(a, a), 0.0);
    }

    #[test]
    fn test_distance_negative_coordinates() {
        let a = Point2D::new(-0.5, -0.5);
        let b = Point2D::new(0.5, -0.5);
        assert_eq!(distance(a, b), 1.0);
    }
}
