//! Math types for audio positioning
//!
//! Thin aliases over nalgebra; enough for listener transforms and emitter
//! placement, nothing more.

pub use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Normalize a direction, falling back to `default` for degenerate input
pub fn normalize_or(v: Vec3, default: Vec3) -> Vec3 {
    let norm = v.norm();
    if norm > f32::EPSILON {
        v / norm
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_or_unit_length() {
        let v = normalize_or(Vec3::new(3.0, 4.0, 0.0), Vec3::x());
        assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_or_degenerate_falls_back() {
        let v = normalize_or(Vec3::zeros(), Vec3::y());
        assert_eq!(v, Vec3::y());
    }
}
