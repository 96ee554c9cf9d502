//! Raster preview of a trace.
//!
//! Converts kurbo BezPaths to tiny-skia paths and produces a side-by-side
//! PNG: the binary mask on the left, the traced curves stroked over a
//! faded copy of the mask on the right.

use std::path::Path;

use kurbo::{BezPath, PathEl};
use log::info;
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Stroke, Transform};

use crate::error::TraceError;
use crate::mask::BinaryMask;
use crate::path::TraceResult;

const SEPARATOR: u32 = 2;

/// Convert a kurbo `BezPath` to a `tiny_skia::Path`.
fn kurbo_to_tinyskia(bezpath: &BezPath, transform: Transform) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in bezpath.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                let (x, y) = transform_point(p.x, p.y, transform);
                pb.move_to(x, y);
            }
            PathEl::LineTo(p) => {
                let (x, y) = transform_point(p.x, p.y, transform);
                pb.line_to(x, y);
            }
            PathEl::QuadTo(c, p) => {
                let (cx, cy) = transform_point(c.x, c.y, transform);
                let (px, py) = transform_point(p.x, p.y, transform);
                pb.quad_to(cx, cy, px, py);
            }
            PathEl::CurveTo(c1, c2, p) => {
                let (c1x, c1y) = transform_point(c1.x, c1.y, transform);
                let (c2x, c2y) = transform_point(c2.x, c2.y, transform);
                let (px, py) = transform_point(p.x, p.y, transform);
                pb.cubic_to(c1x, c1y, c2x, c2y, px, py);
            }
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Apply transform manually to a point (f64 → f32).
fn transform_point(x: f64, y: f64, t: Transform) -> (f32, f32) {
    let x = x as f32;
    let y = y as f32;
    (t.sx * x + t.kx * y + t.tx, t.ky * x + t.sy * y + t.ty)
}

/// Encode a pixmap to PNG bytes.
fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, TraceError> {
    let mut buf = Vec::new();
    let mut encoder = png::Encoder::new(&mut buf, pixmap.width(), pixmap.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .map_err(|e| TraceError::Render(e.to_string()))?;
    writer
        .write_image_data(pixmap.data())
        .map_err(|e| TraceError::Render(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| TraceError::Render(e.to_string()))?;
    Ok(buf)
}

fn new_pixmap(w: u32, h: u32) -> Result<Pixmap, TraceError> {
    Pixmap::new(w, h).ok_or_else(|| TraceError::Render(format!("invalid canvas size {}x{}", w, h)))
}

/// Paint the mask at `scale` pixels per cell: foreground in `ink`,
/// background white.
fn mask_panel(mask: &BinaryMask, scale: u32, ink: u8) -> Result<Pixmap, TraceError> {
    let (w, h) = mask.dimensions();
    let mut panel = new_pixmap(w * scale, h * scale)?;
    panel.fill(Color::WHITE);
    let ink = PremultipliedColorU8::from_rgba(ink, ink, ink, 255)
        .ok_or_else(|| TraceError::Render("invalid ink color".to_string()))?;
    let panel_w = panel.width();
    let pixels = panel.pixels_mut();
    for y in 0..h {
        for x in 0..w {
            if !mask.get(x as i32, y as i32) {
                continue;
            }
            for py in y * scale..(y + 1) * scale {
                for px in x * scale..(x + 1) * scale {
                    pixels[(py * panel_w + px) as usize] = ink;
                }
            }
        }
    }
    Ok(panel)
}

/// Render the preview and return PNG bytes.
///
/// `scale` is the number of preview pixels per mask cell.
pub fn render_preview_png(
    mask: &BinaryMask,
    result: &TraceResult,
    scale: u32,
) -> Result<Vec<u8>, TraceError> {
    let scale = scale.max(1);
    let source_panel = mask_panel(mask, scale, 0)?;
    let mut traced_panel = mask_panel(mask, scale, 220)?;
    let (panel_w, panel_h) = (source_panel.width(), source_panel.height());

    let transform = Transform::from_scale(scale as f32, scale as f32);
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(0, 0, 255, 255));
    paint.anti_alias = true;
    let stroke = Stroke {
        width: (scale as f32 * 0.5).max(1.0),
        ..Stroke::default()
    };

    for path in &result.paths {
        if path.trivial {
            let (x, y) = transform_point(path.anchor.x, path.anchor.y, transform);
            if let Some(dot) = PathBuilder::from_circle(x, y, stroke.width) {
                traced_panel.fill_path(
                    &dot,
                    &paint,
                    tiny_skia::FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
            continue;
        }
        if let Some(sk_path) = kurbo_to_tinyskia(&path.to_bezpath(), transform) {
            traced_panel.stroke_path(&sk_path, &paint, &stroke, Transform::identity(), None);
        }
    }

    // ── Composite ──
    let total_w = panel_w * 2 + SEPARATOR;
    let mut composite = new_pixmap(total_w, panel_h)?;
    composite.fill(Color::from_rgba8(200, 200, 200, 255));
    let out = composite.pixels_mut();
    for y in 0..panel_h {
        for x in 0..panel_w {
            let idx = (y * panel_w + x) as usize;
            out[(y * total_w + x) as usize] = source_panel.pixels()[idx];
            out[(y * total_w + panel_w + SEPARATOR + x) as usize] = traced_panel.pixels()[idx];
        }
    }

    encode_png(&composite)
}

/// Render the preview to a PNG file.
pub fn render_preview(
    mask: &BinaryMask,
    result: &TraceResult,
    output_path: &Path,
    scale: u32,
) -> Result<(), TraceError> {
    let png_data = render_preview_png(mask, result, scale)?;
    std::fs::write(output_path, png_data)?;
    info!("Preview     {}", output_path.display());
    Ok(())
}
