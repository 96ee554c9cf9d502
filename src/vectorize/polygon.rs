//! Optimal polygon approximation via dynamic programming.
//!
//! Given a closed pixel-edge contour, finds the polygon with the fewest
//! vertices that stays within half a pixel of the original path, then
//! measures how sharp each vertex is.
//!
//! ## Algorithm
//!
//! 1. **Prefix sums** (`calc_sums`): O(1) line-fit statistics for any
//!    sub-range of the path.
//! 2. **Longest straight subpath** (`calc_lon`): for each point, find
//!    the farthest reachable point where the path stays within ±0.5
//!    of a straight line (using constraint propagation).
//! 3. **DP optimal polygon** (`best_polygon`): among polygons with the
//!    minimum number of segments, minimize the summed line-fit penalty.
//! 4. **Vertex refinement** (`adjust_vertices`): shift each polygon vertex
//!    to the sub-pixel position that minimizes squared distance to the
//!    two adjacent best-fit lines (constrained to ±0.5 of the pixel corner).
//! 5. **Corner strength** (`vertex_strength`): how far each vertex sits
//!    from the chord of its neighbours, relative to the chord length.

use kurbo::Point;
use log::debug;

use super::decompose::Contour;
use crate::geom::{ddenom, dpara, pmod};
use crate::path::ContourType;

/// Upper bound of a vertex strength (a vertex on a degenerate chord).
pub const MAX_STRENGTH: f64 = 4.0 / 3.0;

/// Prefix sum accumulator for O(1) line-fit statistics.
#[derive(Debug, Clone, Copy, Default)]
struct Sums {
    x: f64,
    y: f64,
    x2: f64,
    xy: f64,
    y2: f64,
}

impl Sums {
    /// Sums over the cyclic range `[i, j]` where `j` may have wrapped `r`
    /// times around a path of length `n`.
    fn range(sums: &[Sums], i: usize, j: usize, r: f64) -> Sums {
        let n = sums.len() - 1;
        Sums {
            x: sums[j + 1].x - sums[i].x + r * sums[n].x,
            y: sums[j + 1].y - sums[i].y + r * sums[n].y,
            x2: sums[j + 1].x2 - sums[i].x2 + r * sums[n].x2,
            xy: sums[j + 1].xy - sums[i].xy + r * sums[n].xy,
            y2: sums[j + 1].y2 - sums[i].y2 + r * sums[n].y2,
        }
    }
}

/// Optimal polygon derived from a contour.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Sub-pixel-refined vertex positions. Hole polygons run in the
    /// opposite direction to their contour.
    pub vertices: Vec<Point>,
    /// Corner strength per vertex, in `[0, 4/3]`. Larger is sharper.
    pub strength: Vec<f64>,
    pub contour_type: ContourType,
    /// Signed pixel area of the source contour.
    pub area: i64,
}

impl Polygon {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Mean of the vertices; where a degenerate polygon collapses to.
    pub fn centroid(&self) -> Point {
        if self.vertices.is_empty() {
            return Point::ZERO;
        }
        let sum = self
            .vertices
            .iter()
            .fold(kurbo::Vec2::ZERO, |acc, v| acc + v.to_vec2());
        (sum / self.vertices.len() as f64).to_point()
    }
}

/// Compute the optimal polygon for a contour.
///
/// Prefix sums → longest straight subpaths → DP optimal polygon →
/// sub-pixel vertex refinement → corner strengths.
pub fn extract(contour: Contour) -> Polygon {
    let Contour {
        points,
        area,
        contour_type,
    } = contour;

    // A lone speckle has no straight subpaths worth fitting.
    if is_speckle(&points) {
        let (sx, sy) = points
            .iter()
            .fold((0i64, 0i64), |(sx, sy), &(x, y)| (sx + x as i64, sy + y as i64));
        let k = points.len().max(1) as f64;
        let center = Point::new(sx as f64 / k, sy as f64 / k);
        debug!("polygon: speckle at ({:.1}, {:.1}) collapsed", center.x, center.y);
        return Polygon {
            vertices: vec![center],
            strength: vec![MAX_STRENGTH],
            contour_type,
            area,
        };
    }

    let sums = calc_sums(&points);
    let lon = calc_lon(&points);
    let po = best_polygon(&points, &lon, &sums);
    let mut vertices = adjust_vertices(&points, &po, &sums);

    if contour_type == ContourType::Hole {
        vertices.reverse();
    }

    let strength = vertex_strength(&vertices);

    Polygon {
        vertices,
        strength,
        contour_type,
        area,
    }
}

/// Whether the contour's bounding box is at most one pixel wide and tall.
fn is_speckle(points: &[(i32, i32)]) -> bool {
    let Some(&(x0, y0)) = points.first() else {
        return true;
    };
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (x0, x0, y0, y0);
    for &(x, y) in points {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    max_x - min_x <= 1 && max_y - min_y <= 1
}

// ── Prefix sums ──────────────────────────────────────────

/// Prefix sums of x, y, x², xy, y², relative to the first point.
///
/// For any sub-range [i..j], the sums can be retrieved in O(1) as
/// `sums[j+1] - sums[i]` (plus a full-cycle correction when the range
/// wraps). These statistics are sufficient to compute the best-fit line
/// and its RMS error for any sub-range.
fn calc_sums(pt: &[(i32, i32)]) -> Vec<Sums> {
    let (x0, y0) = pt[0];
    let mut sums = Vec::with_capacity(pt.len() + 1);
    sums.push(Sums::default());
    for (i, &(px, py)) in pt.iter().enumerate() {
        let x = (px - x0) as f64;
        let y = (py - y0) as f64;
        let s = sums[i];
        sums.push(Sums {
            x: s.x + x,
            y: s.y + y,
            x2: s.x2 + x * x,
            xy: s.xy + x * y,
            y2: s.y2 + y * y,
        });
    }
    sums
}

// ── Longest straight subpath ─────────────────────────────

/// For each point i, the farthest point reachable by a straight line
/// that stays within 0.5 units of all intermediate points.
///
/// Starting from point `i`, walk forward through the direction changes
/// while maintaining two constraint vectors that bound an angular
/// corridor of admissible line directions. The walk stops when the path
/// has moved in all four cardinal directions or leaves the corridor.
///
/// The expression `(3 + 3*dx + dy) / 2` maps a unit step to a direction
/// index 0–3 (W, -y, +y, E).
fn calc_lon(pt: &[(i32, i32)]) -> Vec<usize> {
    let n = pt.len();
    let mut lon = vec![0usize; n];
    let mut pivk = vec![0usize; n];

    // nc[i]: index of the next point that differs from pt[i] in both
    // coordinates (adjacent points differ in one only, so nc[i] < n).
    let mut nc = vec![0usize; n];
    let mut k = 0usize;
    for i in (0..n).rev() {
        if pt[i].0 != pt[k].0 && pt[i].1 != pt[k].1 {
            k = i + 1;
        }
        nc[i] = k;
    }

    for i in (0..n).rev() {
        let mut ct = [0u32; 4];
        let mut constraint = [(0i32, 0i32); 2];

        let i1 = (i + 1) % n;
        ct[dir_index(pt[i1].0 - pt[i].0, pt[i1].1 - pt[i].1)] += 1;

        let mut k = nc[i];
        let mut k1 = i;
        let mut found = None;

        loop {
            ct[dir_index(isign(pt[k].0 - pt[k1].0), isign(pt[k].1 - pt[k1].1))] += 1;

            if ct.iter().all(|&c| c != 0) {
                found = Some(k1);
                break;
            }

            let cur = (pt[k].0 - pt[i].0, pt[k].1 - pt[i].1);

            if xprod(constraint[0], cur) < 0 || xprod(constraint[1], cur) > 0 {
                break;
            }

            if cur.0.abs() > 1 || cur.1.abs() > 1 {
                let off = (
                    cur.0 + if cur.1 >= 0 && (cur.1 > 0 || cur.0 < 0) { 1 } else { -1 },
                    cur.1 + if cur.0 <= 0 && (cur.0 < 0 || cur.1 < 0) { 1 } else { -1 },
                );
                if xprod(constraint[0], off) >= 0 {
                    constraint[0] = off;
                }
                let off = (
                    cur.0 + if cur.1 <= 0 && (cur.1 < 0 || cur.0 < 0) { 1 } else { -1 },
                    cur.1 + if cur.0 >= 0 && (cur.0 > 0 || cur.1 < 0) { 1 } else { -1 },
                );
                if xprod(constraint[1], off) <= 0 {
                    constraint[1] = off;
                }
            }

            k1 = k;
            k = nc[k1];
            if !cyclic(k, i, k1) {
                break;
            }
        }

        pivk[i] = match found {
            Some(p) => p,
            None => pivot_at_violation(pt, &constraint, k, k1, i),
        };
    }

    // Make lon monotone: a point can reach at least as far as its successor.
    let mut j = pivk[n - 1];
    lon[n - 1] = j;
    for i in (0..n - 1).rev() {
        if cyclic(i + 1, pivk[i], j) {
            j = pivk[i];
        }
        lon[i] = j;
    }

    let mut i = n - 1;
    while cyclic((i + 1) % n, j, lon[i]) {
        lon[i] = j;
        if i == 0 {
            break;
        }
        i -= 1;
    }

    lon
}

/// The last point before the corridor is left, interpolated along the
/// straight run from `k1` towards `k`.
fn pivot_at_violation(
    pt: &[(i32, i32)],
    constraint: &[(i32, i32); 2],
    k: usize,
    k1: usize,
    i: usize,
) -> usize {
    let n = pt.len();
    let dk = (isign(pt[k].0 - pt[k1].0), isign(pt[k].1 - pt[k1].1));
    let cur = (pt[k1].0 - pt[i].0, pt[k1].1 - pt[i].1);
    let a = xprod(constraint[0], cur);
    let b = xprod(constraint[0], dk);
    let c = xprod(constraint[1], cur);
    let d = xprod(constraint[1], dk);

    let mut j = 10_000_000i64;
    if b < 0 {
        j = floordiv(a, -b);
    }
    if d > 0 {
        j = j.min(floordiv(-c, d));
    }
    pmod(k1 as isize + j as isize, n)
}

// ── Dynamic programming optimal polygon ──────────────────

/// Find the optimal polygon; returns vertex indices into the contour.
fn best_polygon(pt: &[(i32, i32)], lon: &[usize], sums: &[Sums]) -> Vec<usize> {
    let n = pt.len();

    // clip0[i]: farthest point a segment starting at i may reach.
    let mut clip0 = vec![0usize; n];
    for i in 0..n {
        let mut c = pmod(lon[pmod(i as isize - 1, n)] as isize - 1, n);
        if c == i {
            c = (i + 1) % n;
        }
        clip0[i] = if c < i { n } else { c };
    }

    // clip1[j]: earliest point from which j is reachable.
    let mut clip1 = vec![0usize; n + 1];
    let mut j = 1usize;
    for (i, &c) in clip0.iter().enumerate() {
        while j <= c {
            clip1[j] = i;
            j += 1;
        }
    }

    // seg0[j]: greedy forward walk; its length is the minimum segment count.
    let mut seg0 = vec![0usize; n + 1];
    let mut i = 0usize;
    let mut m = 0usize;
    while i < n {
        seg0[m] = i;
        i = clip0[i];
        m += 1;
    }
    seg0[m] = n;

    // seg1[j]: greedy backward walk.
    let mut seg1 = vec![0usize; m + 1];
    let mut i = n;
    for j in (1..=m).rev() {
        seg1[j] = i;
        i = clip1[i];
    }
    seg1[0] = 0;

    let mut pen = vec![-1.0f64; n + 1];
    let mut prev = vec![0usize; n + 1];
    pen[0] = 0.0;

    for j in 1..=m {
        for i in seg1[j]..=seg0[j] {
            let mut best = -1.0f64;
            for k in (clip1[i]..=seg0[j - 1]).rev() {
                if pen[k] < 0.0 {
                    continue;
                }
                let this = penalty3(pt, sums, k, i) + pen[k];
                if best < 0.0 || this < best {
                    prev[i] = k;
                    best = this;
                }
            }
            pen[i] = best;
        }
    }

    let mut po = vec![0usize; m];
    let mut i = n;
    for slot in po.iter_mut().rev() {
        i = prev[i];
        *slot = i;
    }
    po
}

/// Penalty for approximating the path from point i to point j (j may be
/// up to `n`, meaning a wrap to point 0) by a straight line: the RMS
/// distance of the points from the line through the midpoint of the
/// chord, scaled by the chord length.
///
/// ```text
///   px, py  = midpoint of (pt[i], pt[j])
///   ex, ey  = normal of the chord: (-(j.y - i.y), j.x - i.x)
///   penalty = sqrt(ex²·E[(x-px)²] + 2·ex·ey·E[(x-px)(y-py)] + ey²·E[(y-py)²])
/// ```
fn penalty3(pt: &[(i32, i32)], sums: &[Sums], i: usize, j: usize) -> f64 {
    let n = pt.len();
    let (j, r) = if j >= n { (j - n, 1.0) } else { (j, 0.0) };
    let k = (j + 1) as f64 - i as f64 + r * n as f64;
    let s = Sums::range(sums, i, j, r);

    let (x0, y0) = pt[0];
    let px = (pt[i].0 + pt[j].0) as f64 / 2.0 - x0 as f64;
    let py = (pt[i].1 + pt[j].1) as f64 / 2.0 - y0 as f64;
    let ey = (pt[j].0 - pt[i].0) as f64;
    let ex = -((pt[j].1 - pt[i].1) as f64);

    let a = (s.x2 - 2.0 * s.x * px) / k + px * px;
    let b = (s.xy - s.x * py - s.y * px) / k + px * py;
    let c = (s.y2 - 2.0 * s.y * py) / k + py * py;

    let v = ex * ex * a + 2.0 * ex * ey * b + ey * ey * c;
    v.max(0.0).sqrt()
}

// ── Vertex adjustment ────────────────────────────────────

type QuadForm = [[f64; 3]; 3];

/// Refine each polygon vertex to the optimal sub-pixel position.
///
/// For each vertex, builds a 3×3 quadratic form Q = Q_prev + Q_next from
/// the best-fit lines of the two adjacent polygon edges. Each Q encodes
/// the squared distance to its line as `[x, y, 1] · Q · [x, y, 1]ᵀ`.
/// The minimum is taken if it lies within ±0.5 of the pixel corner;
/// otherwise the minimum over the boundary of that box is used.
fn adjust_vertices(pt: &[(i32, i32)], po: &[usize], sums: &[Sums]) -> Vec<Point> {
    let n = pt.len();
    let m = po.len();
    let (x0, y0) = pt[0];

    let q: Vec<QuadForm> = (0..m)
        .map(|i| {
            let j = pmod(po[(i + 1) % m] as isize - po[i] as isize, n) + po[i];
            let (ctr, dir) = point_slope(sums, n, po[i] as isize, j as isize);
            line_quadform(ctr, dir)
        })
        .collect();

    let mut vertices = Vec::with_capacity(m);
    for i in 0..m {
        let s = Point::new((pt[po[i]].0 - x0) as f64, (pt[po[i]].1 - y0) as f64);
        let mut qf = add_quadform(&q[pmod(i as isize - 1, m)], &q[i]);

        let w = loop {
            let det = qf[0][0] * qf[1][1] - qf[0][1] * qf[1][0];
            if det != 0.0 {
                break Point::new(
                    (-qf[0][2] * qf[1][1] + qf[1][2] * qf[0][1]) / det,
                    (qf[0][2] * qf[1][0] - qf[1][2] * qf[0][0]) / det,
                );
            }
            // Parallel lines: add an orthogonal axis through the pixel corner.
            let (v0, v1) = if qf[0][0] > qf[1][1] {
                (-qf[0][1], qf[0][0])
            } else if qf[1][1] != 0.0 {
                (-qf[1][1], qf[1][0])
            } else {
                (1.0, 0.0)
            };
            let d = v0 * v0 + v1 * v1;
            let v = [v0, v1, -v1 * s.y - v0 * s.x];
            for l in 0..3 {
                for k in 0..3 {
                    qf[l][k] += v[l] * v[k] / d;
                }
            }
        };

        let local = if (w.x - s.x).abs() <= 0.5 && (w.y - s.y).abs() <= 0.5 {
            w
        } else {
            constrain_to_box(&qf, s)
        };
        vertices.push(Point::new(local.x + x0 as f64, local.y + y0 as f64));
    }

    vertices
}

/// Best-fit line through the path from point `i` to point `j` (either
/// may lie outside `0..n`; the range wraps cyclically).
///
/// Returns (centroid relative to the first point, unit direction). The
/// direction is the eigenvector of the covariance matrix for its larger
/// eigenvalue, or zero for a degenerate range.
fn point_slope(sums: &[Sums], n: usize, i: isize, j: isize) -> (Point, kurbo::Vec2) {
    let n_i = n as isize;
    let mut r = 0isize;
    let (mut i, mut j) = (i, j);
    while j >= n_i {
        j -= n_i;
        r += 1;
    }
    while i >= n_i {
        i -= n_i;
        r -= 1;
    }
    while j < 0 {
        j += n_i;
        r -= 1;
    }
    while i < 0 {
        i += n_i;
        r += 1;
    }

    let s = Sums::range(sums, i as usize, j as usize, r as f64);
    let k = (j + 1 - i + r * n_i) as f64;

    let ctr = Point::new(s.x / k, s.y / k);

    let a = (s.x2 - s.x * s.x / k) / k;
    let b = (s.xy - s.x * s.y / k) / k;
    let c = (s.y2 - s.y * s.y / k) / k;

    let lambda2 = (a + c + ((a - c) * (a - c) + 4.0 * b * b).sqrt()) / 2.0;
    let a = a - lambda2;
    let c = c - lambda2;

    let dir = if a.abs() >= c.abs() {
        let l = (a * a + b * b).sqrt();
        if l != 0.0 {
            kurbo::Vec2::new(-b / l, a / l)
        } else {
            kurbo::Vec2::ZERO
        }
    } else {
        let l = (c * c + b * b).sqrt();
        if l != 0.0 {
            kurbo::Vec2::new(-c / l, b / l)
        } else {
            kurbo::Vec2::ZERO
        }
    };

    (ctr, dir)
}

/// Quadratic form giving the squared distance from the line through
/// `ctr` with direction `dir`.
fn line_quadform(ctr: Point, dir: kurbo::Vec2) -> QuadForm {
    let d = dir.hypot2();
    if d == 0.0 {
        return [[0.0; 3]; 3];
    }
    let v = [dir.y, -dir.x, dir.x * ctr.y - dir.y * ctr.x];
    let mut q = [[0.0f64; 3]; 3];
    for l in 0..3 {
        for k in 0..3 {
            q[l][k] = v[l] * v[k] / d;
        }
    }
    q
}

fn add_quadform(a: &QuadForm, b: &QuadForm) -> QuadForm {
    let mut q = [[0.0f64; 3]; 3];
    for l in 0..3 {
        for k in 0..3 {
            q[l][k] = a[l][k] + b[l][k];
        }
    }
    q
}

/// Evaluate quadratic form at point p: [x, y, 1] · Q · [x, y, 1]ᵀ
fn eval_quadform(q: &QuadForm, p: Point) -> f64 {
    let v = [p.x, p.y, 1.0];
    let mut val = 0.0;
    for l in 0..3 {
        for k in 0..3 {
            val += v[l] * q[l][k] * v[k];
        }
    }
    val
}

/// Minimum of the quadratic form on the boundary of the ±0.5 box
/// around `s` (the box centre itself is the fallback).
fn constrain_to_box(q: &QuadForm, s: Point) -> Point {
    let mut best = s;
    let mut best_val = eval_quadform(q, s);
    let mut consider = |p: Point| {
        let v = eval_quadform(q, p);
        if v < best_val {
            best_val = v;
            best = p;
        }
    };

    // Horizontal edges: y fixed, optimal x.
    if q[0][0] != 0.0 {
        for z in 0..2 {
            let y = s.y - 0.5 + z as f64;
            let x = -(q[0][1] * y + q[0][2]) / q[0][0];
            if (x - s.x).abs() <= 0.5 {
                consider(Point::new(x, y));
            }
        }
    }

    // Vertical edges: x fixed, optimal y.
    if q[1][1] != 0.0 {
        for z in 0..2 {
            let x = s.x - 0.5 + z as f64;
            let y = -(q[1][0] * x + q[1][2]) / q[1][1];
            if (y - s.y).abs() <= 0.5 {
                consider(Point::new(x, y));
            }
        }
    }

    for l in 0..2 {
        for k in 0..2 {
            consider(Point::new(s.x - 0.5 + l as f64, s.y - 0.5 + k as f64));
        }
    }

    best
}

// ── Corner strength ──────────────────────────────────────

/// Strength of each vertex: the distance of v[j] from the chord
/// v[j-1] → v[j+1], relative to the chord's L1 length, mapped so that
/// 0 is flat and 4/3 is a full corner.
fn vertex_strength(v: &[Point]) -> Vec<f64> {
    let m = v.len();
    (0..m)
        .map(|j| {
            let i = pmod(j as isize - 1, m);
            let k = (j + 1) % m;
            let denom = ddenom(v[i], v[k]);
            if denom != 0.0 {
                let dd = (dpara(v[i], v[j], v[k]) / denom).abs();
                let alpha = if dd > 1.0 { 1.0 - 1.0 / dd } else { 0.0 };
                alpha / 0.75
            } else {
                MAX_STRENGTH
            }
        })
        .collect()
}

// ── Helpers ──────────────────────────────────────────────

fn dir_index(dx: i32, dy: i32) -> usize {
    ((3 + 3 * dx + dy) / 2) as usize
}

/// Integer cross product.
fn xprod(a: (i32, i32), b: (i32, i32)) -> i64 {
    a.0 as i64 * b.1 as i64 - a.1 as i64 * b.0 as i64
}

fn isign(x: i32) -> i32 {
    x.signum()
}

/// Floor division (rounds toward negative infinity).
fn floordiv(a: i64, b: i64) -> i64 {
    a.div_euclid(b)
}

/// Whether b is in the cyclic interval [a, c).
fn cyclic(a: usize, b: usize, c: usize) -> bool {
    crate::geom::cyclic(a, b, c)
}
