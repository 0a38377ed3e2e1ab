//! Keyframe easing curves.
//!
//! A curve is a cubic Bezier whose endpoints are pinned at (0,0) and (1,1); only
//! the two interior control points vary. Evaluating it maps the elapsed fraction
//! of a keyframe segment (X) to an interpolation weight (Y).

use glam::Vec2;

/// Stop refining the curve parameter once X is this close to the target.
pub const TOLERANCE: f32 = 1e-5;
/// Upper bound on bisection steps; 2^-32 is far below f32 resolution on [0,1].
pub const MAX_ITERATIONS: u32 = 32;

/// Control points are stored as bytes in 0..=127 in motion files.
const BYTE_SCALE: f32 = 127.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierCurve {
    pub p1: Vec2,
    pub p2: Vec2,
}

impl BezierCurve {
    /// The editor default: (20,20) and (107,107), a straight line.
    pub const LINEAR: Self = Self {
        p1: Vec2::new(20.0 / BYTE_SCALE, 20.0 / BYTE_SCALE),
        p2: Vec2::new(107.0 / BYTE_SCALE, 107.0 / BYTE_SCALE),
    };

    pub fn new(p1: Vec2, p2: Vec2) -> Self { Self { p1, p2 } }

    pub fn from_bytes(x1: u8, y1: u8, x2: u8, y2: u8) -> Self {
        Self {
            p1: Vec2::new(x1 as f32, y1 as f32) / BYTE_SCALE,
            p2: Vec2::new(x2 as f32, y2 as f32) / BYTE_SCALE,
        }
    }

    /// Inverse of [`BezierCurve::from_bytes`]: `[x1, y1, x2, y2]`.
    pub fn to_bytes(&self) -> [u8; 4] {
        let q = |v: f32| (v * BYTE_SCALE).round().clamp(0.0, BYTE_SCALE) as u8;
        [q(self.p1.x), q(self.p1.y), q(self.p2.x), q(self.p2.y)]
    }

    pub fn is_linear(&self) -> bool { self.p1.x == self.p1.y && self.p2.x == self.p2.y }

    pub fn evaluate(&self, t: f32) -> f32 { evaluate(self.p1, self.p2, t) }
}

impl Default for BezierCurve {
    fn default() -> Self { Self::LINEAR }
}

/// Weight at elapsed fraction `t` for the curve through `p1` and `p2`.
///
/// `t` is clamped to [0,1]; both ends are returned exactly. X is monotonic for
/// control points inside the unit square, so bisection always brackets the root.
pub fn evaluate(p1: Vec2, p2: Vec2, t: f32) -> f32 {
    if t.is_nan() || t <= 0.0 { return 0.0; }
    if t >= 1.0 { return 1.0; }
    if p1.x == p1.y && p2.x == p2.y { return t; }

    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    let mut u = t;
    for _ in 0..MAX_ITERATIONS {
        let err = cubic(p1.x, p2.x, u) - t;
        if err.abs() < TOLERANCE { break; }
        if err > 0.0 { hi = u; } else { lo = u; }
        u = 0.5 * (lo + hi);
    }
    cubic(p1.y, p2.y, u).clamp(0.0, 1.0)
}

// B(u) with B(0)=0 and B(1)=1 along one axis.
fn cubic(c1: f32, c2: f32, u: f32) -> f32 {
    let inv = 1.0 - u;
    3.0 * inv * inv * u * c1 + 3.0 * inv * u * u * c2 + u * u * u
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curves() -> Vec<BezierCurve> {
        vec![
            BezierCurve::LINEAR,
            BezierCurve::from_bytes(0, 0, 127, 127),
            BezierCurve::from_bytes(64, 0, 64, 127),
            BezierCurve::from_bytes(127, 0, 0, 127),
            BezierCurve::from_bytes(10, 90, 30, 127),
            BezierCurve::new(Vec2::new(0.42, 0.0), Vec2::new(0.58, 1.0)),
        ]
    }

    #[test]
    fn endpoints_are_exact() {
        for c in curves() {
            assert_eq!(c.evaluate(0.0), 0.0, "{:?}", c);
            assert_eq!(c.evaluate(1.0), 1.0, "{:?}", c);
        }
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        let c = BezierCurve::from_bytes(64, 0, 64, 127);
        assert_eq!(c.evaluate(-0.5), 0.0);
        assert_eq!(c.evaluate(1.5), 1.0);
        assert_eq!(c.evaluate(f32::NAN), 0.0);
    }

    #[test]
    fn linear_curve_is_identity() {
        let c = BezierCurve::LINEAR;
        assert!(c.is_linear());
        for i in 0..=20 {
            let t = i as f32 / 20.0;
            assert_eq!(c.evaluate(t), t);
        }
    }

    #[test]
    fn ease_in_out_is_symmetric_and_monotonic() {
        let c = BezierCurve::new(Vec2::new(0.42, 0.0), Vec2::new(0.58, 1.0));
        assert!((c.evaluate(0.5) - 0.5).abs() < 1e-3);
        assert!(c.evaluate(0.1) < 0.1);
        assert!(c.evaluate(0.9) > 0.9);
        let mut prev = 0.0;
        for i in 1..=100 {
            let w = c.evaluate(i as f32 / 100.0);
            assert!(w + 1e-5 >= prev, "not monotonic at {}", i);
            prev = w;
        }
    }

    #[test]
    fn solved_parameter_hits_target_x() {
        let c = BezierCurve::from_bytes(10, 90, 30, 127);
        for i in 1..10 {
            let t = i as f32 / 10.0;
            // Re-derive u by dense search and compare Y.
            let u = (0..=10_000)
                .map(|k| k as f32 / 10_000.0)
                .min_by(|a, b| {
                    let da = (cubic(c.p1.x, c.p2.x, *a) - t).abs();
                    let db = (cubic(c.p1.x, c.p2.x, *b) - t).abs();
                    da.partial_cmp(&db).unwrap()
                })
                .unwrap();
            assert!((c.evaluate(t) - cubic(c.p1.y, c.p2.y, u)).abs() < 1e-3);
        }
    }
}
