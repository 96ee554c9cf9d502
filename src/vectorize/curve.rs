//! Corner detection and Bezier curve generation from an optimal polygon.
//!
//! Every polygon vertex yields one segment running from the midpoint of
//! its incoming edge to the midpoint of its outgoing edge: a sharp corner
//! when the vertex strength reaches `alphamax`, otherwise a cubic tangent
//! to both edges. An optional pass then merges runs of smooth segments
//! into single cubics when the merged curve stays within `opttolerance`
//! of the polygon.

use kurbo::Point;
use log::debug;

use super::polygon::Polygon;
use crate::config::TracingConfig;
use crate::geom::{bezier, cprod, dpara, iprod, iprod1, sign, tangent};
use crate::path::{BezierSegment, CornerSegment, Path, Segment};

/// Smooth vertices never get control points closer to the vertex than
/// this fraction of the half-edge.
const ALPHA_MIN: f64 = 0.55;
const ALPHA_MAX: f64 = 1.0;

/// cos(179°): two edges bending further than this cannot share one cubic.
const COS_179: f64 = -0.999847695156391;

/// Parameters for curve generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveParams {
    /// Vertices with strength >= this are corners.
    pub alphamax: f64,
    /// Merge runs of smooth segments.
    pub opticurve: bool,
    /// Largest deviation (pixels) a merged segment may introduce.
    pub opttolerance: f64,
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            alphamax: 1.0,
            opticurve: true,
            opttolerance: 0.2,
        }
    }
}

impl From<&TracingConfig> for CurveParams {
    fn from(config: &TracingConfig) -> Self {
        Self {
            alphamax: config.alphamax,
            opticurve: config.opticurve,
            opttolerance: config.opttolerance,
        }
    }
}

/// Classification state of a polygon vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VertexClass {
    Unvisited,
    Corner,
    Smooth,
}

/// The per-vertex curve before optimisation.
struct SmoothCurve {
    segments: Vec<Segment>,
    classes: Vec<VertexClass>,
    /// Clamped alpha for smooth vertices, raw strength for corners.
    alpha: Vec<f64>,
    /// mids[j] = midpoint of v[j] → v[j+1]; the end of segment j.
    mids: Vec<Point>,
}

/// Convert a polygon to a closed path of corner and cubic segments.
///
/// Polygons with fewer than 3 vertices come back as trivial paths
/// anchored at their centroid.
pub fn fit(polygon: Polygon, params: &CurveParams) -> Path {
    let m = polygon.len();
    if m < 3 {
        let anchor = polygon.centroid();
        debug!(
            "curve: trivial path ({} vertices) at ({:.1}, {:.1}), area {}",
            m, anchor.x, anchor.y, polygon.area
        );
        return Path::trivial(polygon.contour_type, polygon.area, anchor);
    }

    let curve = classify(&polygon, params.alphamax);
    let segments = if params.opticurve {
        optimize(&polygon.vertices, &curve, params.opttolerance)
    } else {
        curve.segments
    };

    Path {
        contour_type: polygon.contour_type,
        area: polygon.area,
        anchor: segments[0].start(),
        trivial: false,
        segments,
    }
}

/// Turn every vertex into a corner or a smooth cubic.
fn classify(polygon: &Polygon, alphamax: f64) -> SmoothCurve {
    let v = &polygon.vertices;
    let m = v.len();

    let mids: Vec<Point> = (0..m).map(|j| v[j].midpoint(v[(j + 1) % m])).collect();
    let mut classes = vec![VertexClass::Unvisited; m];
    let mut alpha = vec![0.0; m];
    let mut segments = Vec::with_capacity(m);

    for j in 0..m {
        let i = (j + m - 1) % m;
        let k = (j + 1) % m;
        let start = mids[i];
        let end = mids[j];
        let strength = polygon.strength[j];

        if strength >= alphamax {
            classes[j] = VertexClass::Corner;
            alpha[j] = strength;
            segments.push(Segment::Corner(CornerSegment::new(start, v[j], end)));
        } else {
            let a = strength.clamp(ALPHA_MIN, ALPHA_MAX);
            let f = 0.5 + 0.5 * a;
            classes[j] = VertexClass::Smooth;
            alpha[j] = a;
            segments.push(Segment::CubicBezier(BezierSegment::new(
                start,
                v[i].lerp(v[j], f),
                v[k].lerp(v[j], f),
                end,
            )));
        }
    }

    debug_assert!(classes.iter().all(|&c| c != VertexClass::Unvisited));

    SmoothCurve {
        segments,
        classes,
        alpha,
        mids,
    }
}

// ── Segment merging ──────────────────────────────────────

/// Shared per-polygon data for merge tests.
struct MergeContext<'a> {
    v: &'a [Point],
    curve: &'a SmoothCurve,
    /// Turning direction at each smooth vertex, 0 at corners.
    convc: Vec<i32>,
    /// Cumulative area under the curve, for area-preserving fits.
    areac: Vec<f64>,
    tolerance: f64,
}

impl<'a> MergeContext<'a> {
    fn new(v: &'a [Point], curve: &'a SmoothCurve, tolerance: f64) -> Self {
        let m = v.len();
        let convc = (0..m)
            .map(|i| match curve.classes[i] {
                VertexClass::Smooth => sign(dpara(v[(i + m - 1) % m], v[i], v[(i + 1) % m])),
                _ => 0,
            })
            .collect();

        let mids = &curve.mids;
        let mut areac = Vec::with_capacity(m + 1);
        let mut area = 0.0;
        areac.push(0.0);
        for i in 0..m {
            let i1 = (i + 1) % m;
            if curve.classes[i1] == VertexClass::Smooth {
                let a = curve.alpha[i1];
                area += 0.3 * a * (4.0 - a) * dpara(mids[i], v[i1], mids[i1]) / 2.0;
                area += dpara(v[0], mids[i], mids[i1]) / 2.0;
            }
            areac.push(area);
        }

        Self {
            v,
            curve,
            convc,
            areac,
            tolerance,
        }
    }

    /// Try to replace the segments after `i` up to and including `j`
    /// with one cubic from mids[i] to mids[j].
    fn merge(&self, i: usize, j: usize) -> Option<BezierSegment> {
        let v = self.v;
        let mids = &self.curve.mids;
        let m = v.len();
        let tol = self.tolerance;

        // A full loop can never be one cubic.
        if i == j {
            return None;
        }

        // Convex, same turning direction, total bend under 179°.
        let i1 = (i + 1) % m;
        let conv = self.convc[i1];
        if conv == 0 {
            return None;
        }
        let d = v[i].distance(v[i1]);
        let mut k = i1;
        while k != j {
            let k1 = (k + 1) % m;
            let k2 = (k + 2) % m;
            if self.convc[k1] != conv {
                return None;
            }
            if sign(cprod(v[i], v[i1], v[k1], v[k2])) != conv {
                return None;
            }
            if iprod1(v[i], v[i1], v[k1], v[k2]) < d * v[k1].distance(v[k2]) * COS_179 {
                return None;
            }
            k = k1;
        }

        let p0 = mids[i];
        let p1 = v[i1];
        let p2 = v[j];
        let p3 = mids[j];

        // Area under the original run of segments.
        let mut area = self.areac[j] - self.areac[i];
        area -= dpara(v[0], mids[i], mids[j]) / 2.0;
        if i >= j {
            area += self.areac[m];
        }

        let a1 = dpara(p0, p1, p2);
        let a2 = dpara(p0, p1, p3);
        let a3 = dpara(p0, p2, p3);
        let a4 = a1 + a3 - a2;
        if a2 == a1 {
            return None;
        }

        let t = a3 / (a3 - a4);
        let s = a2 / (a2 - a1);
        let a = a2 * t / 2.0;
        if a == 0.0 {
            return None;
        }
        let r = area / a;
        let alpha = 2.0 - (4.0 - r / 0.3).sqrt();
        if !alpha.is_finite() {
            return None;
        }

        let c0 = p0.lerp(p1, t * alpha);
        let c1 = p3.lerp(p2, s * alpha);

        // Every polygon edge must be touched within tolerance.
        let mut k = i1;
        while k != j {
            let k1 = (k + 1) % m;
            let t = tangent(p0, c0, c1, p3, v[k], v[k1]);
            if t < -0.5 {
                return None;
            }
            let pt = bezier(t, p0, c0, c1, p3);
            let d = v[k].distance(v[k1]);
            if d == 0.0 {
                return None;
            }
            let d1 = dpara(v[k], v[k1], pt) / d;
            if d1.abs() > tol {
                return None;
            }
            if iprod(v[k], v[k1], pt) < 0.0 || iprod(v[k1], v[k], pt) < 0.0 {
                return None;
            }
            k = k1;
        }

        // The merged curve must bulge at least as far as the original
        // segments did at every vertex.
        let mut k = i;
        while k != j {
            let k1 = (k + 1) % m;
            let t = tangent(p0, c0, c1, p3, mids[k], mids[k1]);
            if t < -0.5 {
                return None;
            }
            let pt = bezier(t, p0, c0, c1, p3);
            let d = mids[k].distance(mids[k1]);
            if d == 0.0 {
                return None;
            }
            let mut d1 = dpara(mids[k], mids[k1], pt) / d;
            let mut d2 = dpara(mids[k], mids[k1], v[k1]) / d;
            d2 *= 0.75 * self.curve.alpha[k1];
            if d2 < 0.0 {
                d1 = -d1;
                d2 = -d2;
            }
            if d1 < d2 - tol {
                return None;
            }
            k = k1;
        }

        Some(BezierSegment::new(p0, c0, c1, p3))
    }
}

/// Greedy forward merge over the segment sequence.
///
/// From cursor `s`, the window `s..=e` grows while the segments merge;
/// the longest accepted window replaces its segments and scanning
/// resumes after it.
fn optimize(v: &[Point], curve: &SmoothCurve, tolerance: f64) -> Vec<Segment> {
    let m = v.len();
    let ctx = MergeContext::new(v, curve, tolerance);
    let mut out = Vec::with_capacity(m);

    let mut s = 0;
    while s < m {
        let i = (s + m - 1) % m;
        let mut best = None;
        let mut e = s + 1;
        while e < m {
            match ctx.merge(i, e) {
                Some(seg) => best = Some((e, seg)),
                None => break,
            }
            e += 1;
        }

        match best {
            Some((e, seg)) => {
                out.push(Segment::CubicBezier(seg));
                s = e + 1;
            }
            None => {
                out.push(curve.segments[s]);
                s += 1;
            }
        }
    }

    debug!("curve: {} segments merged into {}", m, out.len());
    out
}
