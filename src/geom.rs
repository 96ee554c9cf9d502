//! Shared geometry utilities for the polygon and curve stages.
//!
//! All helpers work on `kurbo::Point` and mirror the small vector
//! primitives of the classic tracer (parallelogram areas, inner
//! products, the L-infinity chord denominator).

use kurbo::{CubicBez, ParamCurve, Point, Vec2};

/// Sign of a value as -1, 0 or 1.
pub fn sign(v: f64) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Non-negative remainder of `a` modulo `n`.
pub fn pmod(a: isize, n: usize) -> usize {
    a.rem_euclid(n as isize) as usize
}

/// Whether `b` lies in the cyclic half-open range `[a, c)`.
pub fn cyclic(a: usize, b: usize, c: usize) -> bool {
    if a <= c {
        a <= b && b < c
    } else {
        a <= b || b < c
    }
}

/// Signed area of the parallelogram spanned by `p1 - p0` and `p2 - p0`.
pub fn dpara(p0: Point, p1: Point, p2: Point) -> f64 {
    (p1 - p0).cross(p2 - p0)
}

/// Cross product of `p1 - p0` and `p3 - p2`.
pub fn cprod(p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    (p1 - p0).cross(p3 - p2)
}

/// Inner product of `p1 - p0` and `p2 - p0`.
pub fn iprod(p0: Point, p1: Point, p2: Point) -> f64 {
    (p1 - p0).dot(p2 - p0)
}

/// Inner product of `p1 - p0` and `p3 - p2`.
pub fn iprod1(p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    (p1 - p0).dot(p3 - p2)
}

/// Direction orthogonal to `p2 - p0`, rounded to the L-infinity unit box.
fn dorth_infty(p0: Point, p2: Point) -> Vec2 {
    Vec2::new(
        -(sign(p2.y - p0.y) as f64),
        sign(p2.x - p0.x) as f64,
    )
}

/// Denominator of the corner-strength ratio: the distance-like measure
/// of chord `p0 -> p2` along its rounded normal.
pub fn ddenom(p0: Point, p2: Point) -> f64 {
    let r = dorth_infty(p0, p2);
    r.y * (p2.x - p0.x) - r.x * (p2.y - p0.y)
}

/// Point on the cubic `p0 p1 p2 p3` at parameter `t`.
pub fn bezier(t: f64, p0: Point, p1: Point, p2: Point, p3: Point) -> Point {
    CubicBez::new(p0, p1, p2, p3).eval(t)
}

/// Parameter in `[0, 1]` at which the cubic `p0 p1 p2 p3` runs parallel
/// to `q0 -> q1`, or -1 if there is none.
pub fn tangent(p0: Point, p1: Point, p2: Point, p3: Point, q0: Point, q1: Point) -> f64 {
    let a_ = cprod(p0, p1, q0, q1);
    let b_ = cprod(p1, p2, q0, q1);
    let c_ = cprod(p2, p3, q0, q1);

    let a = a_ - 2.0 * b_ + c_;
    let b = -2.0 * a_ + 2.0 * b_;
    let c = a_;
    let d = b * b - 4.0 * a * c;

    if a == 0.0 || d < 0.0 {
        return -1.0;
    }

    let s = d.sqrt();
    let r1 = (-b + s) / (2.0 * a);
    let r2 = (-b - s) / (2.0 * a);

    if (0.0..=1.0).contains(&r1) {
        r1
    } else if (0.0..=1.0).contains(&r2) {
        r2
    } else {
        -1.0
    }
}
