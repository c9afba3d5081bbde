//! Filmic tonemap curve and gamma encoding

use glam::Vec3;

/// Filmic curve `T(x) = ((x(Ax+CB)+DE) / (x(Ax+B)+DF)) - E/F`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilmicCurve {
    /// Shoulder strength
    pub a: f32,
    /// Linear strength
    pub b: f32,
    /// Linear angle
    pub c: f32,
    /// Toe strength
    pub d: f32,
    /// Toe numerator
    pub e: f32,
    /// Toe denominator
    pub f: f32,
    /// Linear white point
    pub white: f32,
}

impl Default for FilmicCurve {
    fn default() -> Self {
        Self {
            a: 0.15,
            b: 0.50,
            c: 0.10,
            d: 0.20,
            e: 0.02,
            f: 0.30,
            white: 11.2,
        }
    }
}

impl FilmicCurve {
    pub fn evaluate(&self, x: f32) -> f32 {
        let Self { a, b, c, d, e, f, .. } = *self;
        ((x * (a * x + c * b) + d * e) / (x * (a * x + b) + d * f)) - e / f
    }

    pub fn evaluate_vec(&self, x: Vec3) -> Vec3 {
        Vec3::new(self.evaluate(x.x), self.evaluate(x.y), self.evaluate(x.z))
    }

    /// `1 / T(W)`
    pub fn white_scale(&self) -> f32 {
        1.0 / self.evaluate(self.white)
    }

    /// Exposure-scaled curve, without gamma
    pub fn map(&self, color: Vec3, exposure_bias: f32, pre_scale: f32, normalize_white: bool) -> Vec3 {
        let mapped = self.evaluate_vec(color * exposure_bias * pre_scale);
        if normalize_white {
            mapped * self.white_scale()
        } else {
            mapped
        }
    }
}

/// `pow(max(color, 0), 1/gamma)`
pub fn gamma_correct(color: Vec3, gamma: f32) -> Vec3 {
    color.max(Vec3::ZERO).powf(1.0 / gamma)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_passes_through_origin() {
        let curve = FilmicCurve::default();
        assert!(curve.evaluate(0.0).abs() < 1e-7);
    }

    #[test]
    fn curve_is_monotonic() {
        let curve = FilmicCurve::default();
        let mut previous = curve.evaluate(0.0);
        for i in 1..2000 {
            let value = curve.evaluate(i as f32 * 0.05);
            assert!(value >= previous, "T decreased at x = {}", i as f32 * 0.05);
            previous = value;
        }
    }

    #[test]
    fn white_point_maps_to_one() {
        let curve = FilmicCurve::default();
        assert!((curve.evaluate(curve.white) * curve.white_scale() - 1.0).abs() < 1e-5);
        let white = curve.map(Vec3::splat(curve.white / 32.0), 2.0, 16.0, true);
        assert!((white - Vec3::ONE).length() < 1e-4);
    }

    #[test]
    fn gamma_clamps_negative() {
        let c = gamma_correct(Vec3::new(-1.0, 0.25, 1.0), 2.0);
        assert_eq!(c.x, 0.0);
        assert!((c.y - 0.5).abs() < 1e-6);
        assert!((c.z - 1.0).abs() < 1e-6);
    }
}
