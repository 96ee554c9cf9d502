//! Parametric equations for traced segments.
//!
//! Every cubic becomes one `(x(t), y(t))` string for `t` in `[0, 1]`,
//! ready to paste into a graphing calculator. Corner segments are
//! written as two straight cubics.

use std::fmt;
use std::io::Write;

use clap::ValueEnum;
use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::error::TraceError;
use crate::path::{BezierSegment, TraceResult};

/// How each coordinate polynomial is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EquationStyle {
    /// Expanded Bernstein form:
    /// `(1-t)^3*P0+3*(1-t)^2*t*P1+3*(1-t)*t^2*P2+t^3*P3`.
    Bernstein,
    /// Nested de Casteljau form, `(1-t)(...)+t(...)`.
    #[default]
    Nested,
}

/// Direction of the y axis in the written equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YAxis {
    /// Image convention: y grows downward, coordinates written as traced.
    Down,
    /// Plotting convention: y is negated so the drawing appears upright.
    #[default]
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EquationOptions {
    pub style: EquationStyle,
    pub y_axis: YAxis,
    /// Digits after the decimal point; `None` writes the shortest exact
    /// representation.
    pub precision: Option<usize>,
}

/// One cubic written as a pair of polynomials in `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equation {
    /// x coefficients P0..P3.
    pub x: [f64; 4],
    /// y coefficients P0..P3, already in the requested y axis.
    pub y: [f64; 4],
    style: EquationStyle,
    precision: Option<usize>,
}

impl Equation {
    pub fn from_segment(seg: &BezierSegment, options: &EquationOptions) -> Self {
        let pts = [seg.start, seg.c1, seg.c2, seg.end];
        let flip = match options.y_axis {
            YAxis::Down => 1.0,
            YAxis::Up => -1.0,
        };
        Self {
            x: pts.map(|p| p.x),
            y: pts.map(|p| flip * p.y),
            style: options.style,
            precision: options.precision,
        }
    }

    /// Point at parameter `t`, in the equation's own axes.
    pub fn eval(&self, t: f64) -> Point {
        Point::new(bernstein(&self.x, t), bernstein(&self.y, t))
    }

    fn write_coordinate(&self, f: &mut fmt::Formatter<'_>, p: &[f64; 4]) -> fmt::Result {
        let [a, b, c, d] = p.map(|v| Coef(v, self.precision));
        match self.style {
            EquationStyle::Bernstein => write!(
                f,
                "(1-t)^3*{}+3*(1-t)^2*t*{}+3*(1-t)*t^2*{}+t^3*{}",
                a, b, c, d
            ),
            EquationStyle::Nested => write!(
                f,
                "(1-t)((1-t)((1-t){a}+t{b})+t((1-t){b}+t{c}))+t((1-t)((1-t){b}+t{c})+t((1-t){c}+t{d}))",
                a = a,
                b = b,
                c = c,
                d = d
            ),
        }
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        self.write_coordinate(f, &self.x)?;
        f.write_str(", ")?;
        self.write_coordinate(f, &self.y)?;
        f.write_str(")")
    }
}

/// A coefficient formatted for juxtaposition: negatives are wrapped in
/// parentheses so `t(-3)` never reads as `t-3`.
struct Coef(f64, Option<usize>);

impl fmt::Display for Coef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Avoid writing "-0".
        let v = if self.0 == 0.0 { 0.0 } else { self.0 };
        let text = match self.1 {
            Some(p) => format!("{:.*}", p, v),
            None => format!("{}", v),
        };
        if text.starts_with('-') {
            write!(f, "({})", text)
        } else {
            f.write_str(&text)
        }
    }
}

fn bernstein(p: &[f64; 4], t: f64) -> f64 {
    let mt = 1.0 - t;
    mt * mt * mt * p[0] + 3.0 * mt * mt * t * p[1] + 3.0 * mt * t * t * p[2] + t * t * t * p[3]
}

/// Equations for every segment of every non-trivial path, in trace order.
pub fn emit(result: &TraceResult, options: &EquationOptions) -> Vec<Equation> {
    result
        .paths
        .iter()
        .filter(|p| !p.trivial)
        .flat_map(|p| p.segments.iter())
        .flat_map(|s| s.cubics())
        .map(|c| Equation::from_segment(&c, options))
        .collect()
}

/// Write one equation per line.
pub fn write_equations<W: Write>(mut writer: W, equations: &[Equation]) -> Result<(), TraceError> {
    for eq in equations {
        writeln!(writer, "{}", eq)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{ContourType, CornerSegment, Path, Segment};

    fn seg() -> BezierSegment {
        BezierSegment::new(
            Point::new(0.0, 0.0),
            Point::new(1.0, 2.0),
            Point::new(3.0, 2.0),
            Point::new(4.0, 0.0),
        )
    }

    fn down(style: EquationStyle) -> EquationOptions {
        EquationOptions {
            style,
            y_axis: YAxis::Down,
            precision: None,
        }
    }

    #[test]
    fn nested_form_matches_de_casteljau_layout() {
        let eq = Equation::from_segment(&seg(), &down(EquationStyle::Nested));
        let s = eq.to_string();
        assert!(s.starts_with("((1-t)((1-t)((1-t)0+t1)+t((1-t)1+t3))+t((1-t)((1-t)1+t3)+t((1-t)3+t4)), "));
        assert!(s.ends_with("+t((1-t)2+t0)))"));
    }

    #[test]
    fn bernstein_form() {
        let eq = Equation::from_segment(&seg(), &down(EquationStyle::Bernstein));
        assert_eq!(
            eq.to_string(),
            "((1-t)^3*0+3*(1-t)^2*t*1+3*(1-t)*t^2*3+t^3*4, (1-t)^3*0+3*(1-t)^2*t*2+3*(1-t)*t^2*2+t^3*0)"
        );
    }

    #[test]
    fn y_up_negates_and_parenthesises() {
        let options = EquationOptions {
            style: EquationStyle::Bernstein,
            y_axis: YAxis::Up,
            precision: Some(2),
        };
        let eq = Equation::from_segment(&seg(), &options);
        let s = eq.to_string();
        assert!(s.contains("3*(1-t)^2*t*(-2.00)"), "{}", s);
        assert!(!s.contains("-0.00"), "{}", s);
        assert_eq!(eq.eval(0.5), Point::new(2.0, -1.5));
    }

    #[test]
    fn endpoints_reproduce_segment() {
        let s = seg();
        let eq = Equation::from_segment(&s, &down(EquationStyle::Nested));
        assert_eq!(eq.eval(0.0), s.start);
        assert_eq!(eq.eval(1.0), s.end);
        let mid = s.eval(0.5);
        assert!((eq.eval(0.5) - mid).hypot() < 1e-12);
    }

    #[test]
    fn corners_emit_two_lines_and_trivial_paths_nothing() {
        let corner = Segment::Corner(CornerSegment::new(
            Point::new(0.0, 5.0),
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
        ));
        let result = TraceResult {
            width: 10,
            height: 10,
            paths: vec![
                Path {
                    contour_type: ContourType::Outer,
                    area: 25,
                    anchor: corner.start(),
                    trivial: false,
                    segments: vec![corner, Segment::CubicBezier(seg())],
                },
                Path::trivial(ContourType::Outer, 1, Point::new(8.5, 8.5)),
            ],
        };
        let eqs = emit(&result, &down(EquationStyle::Nested));
        assert_eq!(eqs.len(), 3);
        assert_eq!(eqs[0].eval(0.0), Point::new(0.0, 5.0));
        assert_eq!(eqs[1].eval(1.0), Point::new(5.0, 0.0));

        let mut buf = Vec::new();
        write_equations(&mut buf, &eqs).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
