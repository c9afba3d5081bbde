//! Math shared by the shading stages

pub mod cube;
pub mod tbn;
pub mod tonemap;

pub use cube::{CubeFace, CubeProjection};
pub use tbn::TangentFrame;
pub use tonemap::FilmicCurve;

use glam::Vec3;

/// Normalize, returning zero for zero-length or non-finite input
#[inline]
pub fn safe_normalize(v: Vec3) -> Vec3 {
    v.normalize_or_zero()
}

/// Normalization used by the shading stages: guarded or raw
#[inline]
pub(crate) fn shading_normalize(v: Vec3, guard: bool) -> Vec3 {
    if guard {
        safe_normalize(v)
    } else {
        v.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_normalize_zero() {
        assert_eq!(safe_normalize(Vec3::ZERO), Vec3::ZERO);
        assert!((safe_normalize(Vec3::new(3.0, 0.0, 4.0)).length() - 1.0).abs() < 1e-6);
        assert!(shading_normalize(Vec3::ZERO, false).x.is_nan());
    }
}
