use img2eq::kurbo::Point;
use img2eq::{
    trace, BinaryMask, ContourType, EquationOptions, EquationStyle, Segment, TraceResult,
    TracingConfig, TurnPolicy, YAxis,
};

fn filled(width: u32, height: u32, cells: impl Fn(i32, i32) -> bool) -> BinaryMask {
    let mut mask = BinaryMask::empty(width, height).unwrap();
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            mask.set(x, y, cells(x, y));
        }
    }
    mask
}

fn square_mask() -> BinaryMask {
    filled(12, 12, |x, y| (1..11).contains(&x) && (1..11).contains(&y))
}

fn circle_mask() -> BinaryMask {
    filled(70, 70, |x, y| {
        let dx = x as f64 + 0.5 - 35.0;
        let dy = y as f64 + 0.5 - 35.0;
        dx * dx + dy * dy <= 30.0 * 30.0
    })
}

fn down() -> EquationOptions {
    EquationOptions {
        y_axis: YAxis::Down,
        ..EquationOptions::default()
    }
}

#[test]
fn square_with_zero_alphamax_is_four_corners() {
    let config = TracingConfig {
        alphamax: 0.0,
        ..TracingConfig::default()
    };
    let result = trace(&square_mask(), &config).unwrap();
    assert_eq!(result.paths.len(), 1);
    let path = &result.paths[0];
    assert_eq!(path.contour_type, ContourType::Outer);
    assert_eq!(path.area, 100);
    assert_eq!(path.segments.len(), 4);
    assert!(path.segments.iter().all(Segment::is_corner));
    assert_eq!(result.corner_count(), 4);
    assert_eq!(result.to_bezpaths().len(), 1);
}

#[test]
fn empty_mask_traces_nothing() {
    let mask = BinaryMask::empty(9, 5).unwrap();
    let result = trace(&mask, &TracingConfig::default()).unwrap();
    assert!(result.paths.is_empty());
    assert!(img2eq::equation::emit(&result, &EquationOptions::default()).is_empty());
}

#[test]
fn speckle_is_filtered_or_trivial() {
    let mask = filled(3, 3, |x, y| x == 1 && y == 1);

    let result = trace(&mask, &TracingConfig::default()).unwrap();
    assert!(result.paths.is_empty());

    let config = TracingConfig {
        min_area: 0,
        ..TracingConfig::default()
    };
    let result = trace(&mask, &config).unwrap();
    assert_eq!(result.paths.len(), 1);
    assert!(result.paths[0].is_trivial());
    assert_eq!(result.paths[0].anchor, Point::new(1.5, 1.5));
    assert!(img2eq::equation::emit(&result, &down()).is_empty());
}

#[test]
fn circle_has_no_corners_at_high_alphamax() {
    let config = TracingConfig {
        alphamax: 1.3,
        ..TracingConfig::default()
    };
    let result = trace(&circle_mask(), &config).unwrap();
    assert_eq!(result.paths.len(), 1);
    assert_eq!(result.corner_count(), 0);
    assert!(result.segment_count() > 0);
}

#[test]
fn opticurve_never_adds_segments() {
    let mask = circle_mask();
    let plain = trace(
        &mask,
        &TracingConfig {
            opticurve: false,
            ..TracingConfig::default()
        },
    )
    .unwrap();
    let merged = trace(&mask, &TracingConfig::default()).unwrap();
    assert!(merged.segment_count() <= plain.segment_count());
}

#[test]
fn looser_tolerance_merges_more() {
    let mask = circle_mask();
    let count = |opttolerance: f64| {
        let config = TracingConfig {
            alphamax: 1.3,
            opttolerance,
            ..TracingConfig::default()
        };
        trace(&mask, &config).unwrap().segment_count()
    };
    assert!(count(1.0) <= count(0.03));
}

#[test]
fn ring_winds_holes_opposite_to_outer() {
    let mask = filled(11, 11, |x, y| {
        let outer = (1..10).contains(&x) && (1..10).contains(&y);
        let hole = (3..8).contains(&x) && (3..8).contains(&y);
        outer && !hole
    });
    let result = trace(&mask, &TracingConfig::default()).unwrap();
    assert_eq!(result.contour_counts(), (1, 1));
    let (outer, hole) = (&result.paths[0], &result.paths[1]);
    assert_eq!(outer.contour_type, ContourType::Outer);
    assert_eq!(hole.contour_type, ContourType::Hole);
    assert_eq!(outer.area, 81);
    assert_eq!(hole.area, -25);
    assert!(outer.fitted_area() * hole.fitted_area() < 0.0);
}

#[test]
fn turn_policy_decides_diagonal_junctions() {
    // Two 3x3 blocks meeting at a single corner point.
    let mask = filled(8, 8, |x, y| {
        let a = (1..4).contains(&x) && (1..4).contains(&y);
        let b = (4..7).contains(&x) && (4..7).contains(&y);
        a || b
    });
    let count = |turn_policy: TurnPolicy| {
        let config = TracingConfig {
            turn_policy,
            ..TracingConfig::default()
        };
        trace(&mask, &config).unwrap().paths.len()
    };
    assert_eq!(count(TurnPolicy::Black), 1);
    assert_eq!(count(TurnPolicy::White), 2);
}

#[test]
fn equations_chain_around_each_path() {
    let config = TracingConfig {
        alphamax: 0.0,
        ..TracingConfig::default()
    };
    let result = trace(&square_mask(), &config).unwrap();
    let eqs = img2eq::equation::emit(&result, &down());
    assert_eq!(eqs.len(), 8);
    assert_eq!(eqs[0].eval(0.0), result.paths[0].segments[0].start());
    for i in 0..eqs.len() {
        let next = &eqs[(i + 1) % eqs.len()];
        assert_eq!(eqs[i].eval(1.0), next.eval(0.0));
    }
}

#[test]
fn y_up_mirrors_equations() {
    let result = trace(&square_mask(), &TracingConfig::default()).unwrap();
    let down_eqs = img2eq::equation::emit(&result, &down());
    let up_eqs = img2eq::equation::emit(&result, &EquationOptions::default());
    assert_eq!(down_eqs.len(), up_eqs.len());
    for (d, u) in down_eqs.iter().zip(&up_eqs) {
        let (pd, pu) = (d.eval(0.25), u.eval(0.25));
        assert_eq!(pd.x, pu.x);
        assert_eq!(pd.y, -pu.y);
    }
}

#[test]
fn written_equations_are_one_per_line() {
    let result = trace(&circle_mask(), &TracingConfig::default()).unwrap();
    let options = EquationOptions {
        style: EquationStyle::Bernstein,
        precision: Some(3),
        ..EquationOptions::default()
    };
    let eqs = img2eq::equation::emit(&result, &options);

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("equations.txt");
    let file = std::fs::File::create(&out).unwrap();
    img2eq::equation::write_equations(file, &eqs).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), eqs.len());
    assert!(lines
        .iter()
        .all(|l| l.starts_with("((1-t)^3*") && l.ends_with(')')));
}

#[test]
fn json_round_trip_keeps_structure() {
    let mask = filled(11, 11, |x, y| {
        let outer = (1..10).contains(&x) && (1..10).contains(&y);
        let hole = (3..8).contains(&x) && (3..8).contains(&y);
        outer && !hole
    });
    let result = trace(&mask, &TracingConfig::default()).unwrap();
    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("\"contour_type\":\"hole\""));
    assert!(json.contains("\"kind\":"));

    let back: TraceResult = serde_json::from_str(&json).unwrap();
    assert_eq!((back.width, back.height), (11, 11));
    assert_eq!(back.paths.len(), result.paths.len());
    for (a, b) in back.paths.iter().zip(&result.paths) {
        assert_eq!(a.contour_type, b.contour_type);
        assert_eq!(a.area, b.area);
        assert_eq!(a.segments.len(), b.segments.len());
        for (sa, sb) in a.segments.iter().zip(&b.segments) {
            assert_eq!(sa.is_corner(), sb.is_corner());
            assert!((sa.start() - sb.start()).hypot() < 1e-9);
        }
    }
}

#[test]
fn tracing_is_deterministic() {
    let mask = circle_mask();
    let a = trace(&mask, &TracingConfig::default()).unwrap();
    let b = trace(&mask, &TracingConfig::default()).unwrap();
    assert_eq!(a, b);
}
