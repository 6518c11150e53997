//! Per-triangle normal and area helpers

use glam::Vec3;

/// Unit normal of a triangle (counter-clockwise winding), +Z when degenerate
pub fn triangle_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    (v1 - v0).cross(v2 - v0).try_normalize().unwrap_or(Vec3::Z)
}

/// Area of a triangle
pub fn triangle_area(v0: Vec3, v1: Vec3, v2: Vec3) -> f32 {
    (v1 - v0).cross(v2 - v0).length() * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_normal() {
        let n = triangle_normal(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert_eq!(n, Vec3::Z);
    }

    #[test]
    fn test_degenerate_triangle() {
        let n = triangle_normal(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert_eq!(n, Vec3::Z);
        assert_eq!(triangle_area(Vec3::ZERO, Vec3::X, Vec3::X * 2.0), 0.0);
    }

    #[test]
    fn test_triangle_area() {
        assert_eq!(triangle_area(Vec3::ZERO, Vec3::X * 2.0, Vec3::Y * 2.0), 2.0);
    }
}
