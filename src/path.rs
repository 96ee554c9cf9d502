//! Traced output: segments, paths and the overall trace result.

use kurbo::{BezPath, CubicBez, ParamCurve, Point, Shape};
use serde::{Deserialize, Serialize};

/// Whether a contour is an outer boundary or a hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourType {
    Outer,
    Hole,
}

/// A cubic Bézier segment `(start, c1, c2, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BezierSegment {
    pub start: Point,
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

impl BezierSegment {
    pub fn new(start: Point, c1: Point, c2: Point, end: Point) -> Self {
        Self { start, c1, c2, end }
    }

    /// A straight segment expressed as a cubic (controls at 1/3 and 2/3).
    pub fn line(start: Point, end: Point) -> Self {
        Self {
            start,
            c1: start.lerp(end, 1.0 / 3.0),
            c2: start.lerp(end, 2.0 / 3.0),
            end,
        }
    }

    pub fn to_cubic(&self) -> CubicBez {
        CubicBez::new(self.start, self.c1, self.c2, self.end)
    }

    pub fn eval(&self, t: f64) -> Point {
        self.to_cubic().eval(t)
    }
}

/// Two straight pieces meeting at a sharp vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerSegment {
    pub start: Point,
    pub vertex: Point,
    pub end: Point,
}

impl CornerSegment {
    pub fn new(start: Point, vertex: Point, end: Point) -> Self {
        Self { start, vertex, end }
    }
}

/// One piece of a traced path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Corner(CornerSegment),
    CubicBezier(BezierSegment),
}

impl Segment {
    pub fn start(&self) -> Point {
        match self {
            Segment::Corner(c) => c.start,
            Segment::CubicBezier(b) => b.start,
        }
    }

    pub fn end(&self) -> Point {
        match self {
            Segment::Corner(c) => c.end,
            Segment::CubicBezier(b) => b.end,
        }
    }

    pub fn is_corner(&self) -> bool {
        matches!(self, Segment::Corner(_))
    }

    /// The segment as cubics: one for a curve, two straight ones for a
    /// corner.
    pub fn cubics(&self) -> Vec<BezierSegment> {
        match self {
            Segment::Corner(c) => vec![
                BezierSegment::line(c.start, c.vertex),
                BezierSegment::line(c.vertex, c.end),
            ],
            Segment::CubicBezier(b) => vec![*b],
        }
    }
}

/// The fitted outline of one retained contour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub contour_type: ContourType,
    /// Signed pixel area of the source contour (negative for holes).
    pub area: i64,
    /// First point of the path; for a trivial path, the point the
    /// contour collapsed to.
    pub anchor: Point,
    /// Set when the contour was too small to carry any segments.
    pub trivial: bool,
    pub segments: Vec<Segment>,
}

impl Path {
    /// A path with no segments, collapsed to `anchor`.
    pub fn trivial(contour_type: ContourType, area: i64, anchor: Point) -> Self {
        Self {
            contour_type,
            area,
            anchor,
            trivial: true,
            segments: Vec::new(),
        }
    }

    pub fn is_trivial(&self) -> bool {
        self.trivial
    }

    pub fn corner_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_corner()).count()
    }

    /// The closed outline as a kurbo path (corners become line pairs).
    pub fn to_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some(first) = self.segments.first() else {
            return path;
        };
        path.move_to(first.start());
        for seg in &self.segments {
            match seg {
                Segment::Corner(c) => {
                    path.line_to(c.vertex);
                    path.line_to(c.end);
                }
                Segment::CubicBezier(b) => path.curve_to(b.c1, b.c2, b.end),
            }
        }
        path.close_path();
        path
    }

    /// Area enclosed by the fitted outline, signed by winding.
    pub fn fitted_area(&self) -> f64 {
        self.to_bezpath().area()
    }
}

/// Everything a trace produces for one mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceResult {
    pub width: u32,
    pub height: u32,
    /// Paths in contour discovery order.
    pub paths: Vec<Path>,
}

impl TraceResult {
    pub fn segment_count(&self) -> usize {
        self.paths.iter().map(|p| p.segments.len()).sum()
    }

    pub fn corner_count(&self) -> usize {
        self.paths.iter().map(Path::corner_count).sum()
    }

    /// Counts of (outer, hole) paths.
    pub fn contour_counts(&self) -> (usize, usize) {
        let outer = self
            .paths
            .iter()
            .filter(|p| p.contour_type == ContourType::Outer)
            .count();
        (outer, self.paths.len() - outer)
    }

    /// All non-trivial paths as kurbo paths.
    pub fn to_bezpaths(&self) -> Vec<BezPath> {
        self.paths
            .iter()
            .filter(|p| !p.trivial)
            .map(Path::to_bezpath)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_path() -> Path {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(4.0, 0.0);
        let c = Point::new(4.0, 4.0);
        let d = Point::new(0.0, 4.0);
        let mid = |p: Point, q: Point| p.midpoint(q);
        let segments = vec![
            Segment::Corner(CornerSegment::new(mid(d, a), a, mid(a, b))),
            Segment::Corner(CornerSegment::new(mid(a, b), b, mid(b, c))),
            Segment::Corner(CornerSegment::new(mid(b, c), c, mid(c, d))),
            Segment::Corner(CornerSegment::new(mid(c, d), d, mid(d, a))),
        ];
        Path {
            contour_type: ContourType::Outer,
            area: 16,
            anchor: mid(d, a),
            trivial: false,
            segments,
        }
    }

    #[test]
    fn line_segment_is_straight() {
        let seg = BezierSegment::line(Point::new(0.0, 0.0), Point::new(3.0, 6.0));
        assert_eq!(seg.c1, Point::new(1.0, 2.0));
        assert_eq!(seg.c2, Point::new(2.0, 4.0));
        let mid = seg.eval(0.5);
        assert!((mid.x - 1.5).abs() < 1e-12 && (mid.y - 3.0).abs() < 1e-12);
    }

    #[test]
    fn corner_splits_into_two_cubics() {
        let seg = Segment::Corner(CornerSegment::new(
            Point::new(0.0, 1.0),
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
        ));
        let cubics = seg.cubics();
        assert_eq!(cubics.len(), 2);
        assert_eq!(cubics[0].start, seg.start());
        assert_eq!(cubics[0].end, cubics[1].start);
        assert_eq!(cubics[1].end, seg.end());
    }

    #[test]
    fn bezpath_area_matches_winding() {
        // y-down frame: the square above is traced with positive shoelace area.
        let path = square_path();
        assert!((path.fitted_area() - 16.0).abs() < 1e-9);
        assert_eq!(path.corner_count(), 4);
    }

    #[test]
    fn segments_serialize_with_kind_tag() {
        let json = serde_json::to_value(square_path()).unwrap();
        assert_eq!(json["segments"][0]["kind"], "corner");
        assert_eq!(json["contour_type"], "outer");
        let back: Path = serde_json::from_value(json).unwrap();
        assert_eq!(back, square_path());
    }

    #[test]
    fn trivial_path_has_no_outline() {
        let p = Path::trivial(ContourType::Outer, 1, Point::new(0.5, 0.5));
        assert!(p.is_trivial());
        assert!(p.to_bezpath().elements().is_empty());
    }
}
