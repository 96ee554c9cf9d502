//! Pixel-edge contour extraction on the dual grid.
//!
//! Contours are traced on the pixel-corner grid (between pixels) rather
//! than through pixel centers. Uses XOR fill to handle contour nesting
//! (outer vs hole): once a boundary is traced its interior is inverted,
//! so a hole inside it shows up later as foreground.

use log::debug;

use crate::config::TurnPolicy;
use crate::mask::BinaryMask;
use crate::path::ContourType;

/// A closed path on the pixel-corner grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    /// Lattice points, one unit step apart. (0,0) is the top-left corner
    /// of the mask, y grows downward.
    pub points: Vec<(i32, i32)>,
    /// Enclosed pixel count; positive for outer boundaries, negative for
    /// holes.
    pub area: i64,
    pub contour_type: ContourType,
}

/// Direction taken at an ambiguous junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
}

/// Working copy of the mask that XOR fills are applied to.
struct Bitmap {
    data: Vec<bool>,
    width: i32,
    height: i32,
}

impl Bitmap {
    fn from_mask(mask: &BinaryMask) -> Self {
        Bitmap {
            data: mask.cells().to_vec(),
            width: mask.width() as i32,
            height: mask.height() as i32,
        }
    }

    /// Get pixel at (x, y). Out-of-bounds = false.
    fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return false;
        }
        self.data[(y * self.width + x) as usize]
    }

    /// XOR all pixels in row y from column x to the right edge.
    fn xor_row_from(&mut self, x: i32, y: i32) {
        if y < 0 || y >= self.height {
            return;
        }
        let row = (y * self.width) as usize;
        for xi in x.max(0)..self.width {
            self.data[row + xi as usize] ^= true;
        }
    }

    /// Next set pixel in row-major order, starting at (x, y).
    fn find_next(&self, x: i32, y: i32) -> Option<(i32, i32)> {
        let start = (y * self.width + x) as usize;
        self.data[start..]
            .iter()
            .position(|&v| v)
            .map(|offset| {
                let idx = (start + offset) as i32;
                (idx % self.width, idx / self.width)
            })
    }
}

/// Extract closed contours from a binary mask on the dual (pixel-corner)
/// grid, in discovery order.
///
/// Contours enclosing fewer than `min_area` pixels are dropped (their
/// interior is still cleared, so they cannot be rediscovered).
pub fn decompose(mask: &BinaryMask, min_area: u64, turn_policy: TurnPolicy) -> Vec<Contour> {
    let mut bm = Bitmap::from_mask(mask);
    let mut contours = Vec::new();
    let mut dropped = 0usize;

    let (mut x, mut y) = (0, 0);
    while let Some((nx, ny)) = bm.find_next(x, y) {
        x = nx;
        y = ny;

        // Sign from the ORIGINAL mask, not the XOR'd working copy.
        let contour_type = if mask.get(x, y) {
            ContourType::Outer
        } else {
            ContourType::Hole
        };

        let contour = find_path(&bm, x, y, contour_type, turn_policy);
        xor_fill(&mut bm, &contour.points);

        if contour.area.unsigned_abs() < min_area {
            dropped += 1;
        } else {
            contours.push(contour);
        }
    }

    debug!(
        "decompose: {} contours kept, {} below min_area {}",
        contours.len(),
        dropped,
        min_area
    );
    contours
}

/// Trace one closed contour starting at the top-left corner of pixel
/// (x0, y0), heading +x.
fn find_path(
    bm: &Bitmap,
    x0: i32,
    y0: i32,
    contour_type: ContourType,
    policy: TurnPolicy,
) -> Contour {
    let mut points = Vec::new();
    let (mut x, mut y) = (x0, y0);
    let (mut dx, mut dy) = (1i32, 0i32);
    let mut area: i64 = 0;

    loop {
        points.push((x, y));

        x += dx;
        y += dy;
        area += x as i64 * dy as i64;

        if x == x0 && y == y0 {
            break;
        }

        // The two pixels ahead of corner (x, y). `d` lies on the traced
        // region's side of the direction of travel, `c` on the other.
        // Integer division truncates toward zero, which maps each of the
        // four directions onto the right pixel offsets.
        let c = bm.get(x + (dx + dy - 1) / 2, y + (dy - dx - 1) / 2);
        let d = bm.get(x + (dx - dy - 1) / 2, y + (dy + dx - 1) / 2);

        //   c  d  │ action
        //   ──────┼──────────────────────────────
        //   1  0  │ diagonal pinch: ask the turn policy
        //   1  1  │ turn right
        //   0  0  │ turn left
        //   0  1  │ straight
        let turn = if c && !d {
            Some(resolve_turn(policy, contour_type, bm, x, y))
        } else if c {
            Some(Turn::Right)
        } else if !d {
            Some(Turn::Left)
        } else {
            None
        };

        match turn {
            Some(Turn::Right) => {
                (dx, dy) = (dy, -dx);
            }
            Some(Turn::Left) => {
                (dx, dy) = (-dy, dx);
            }
            None => {}
        }
    }

    let area = match contour_type {
        ContourType::Outer => area,
        ContourType::Hole => -area,
    };

    Contour {
        points,
        area,
        contour_type,
    }
}

/// Decide the turn at an ambiguous junction at corner (x, y).
///
/// A right turn connects the traced region diagonally; a left turn
/// separates it.
fn resolve_turn(
    policy: TurnPolicy,
    contour_type: ContourType,
    bm: &Bitmap,
    x: i32,
    y: i32,
) -> Turn {
    let right = match policy {
        TurnPolicy::Right => true,
        TurnPolicy::Left => false,
        TurnPolicy::Black => contour_type == ContourType::Outer,
        TurnPolicy::White => contour_type == ContourType::Hole,
        TurnPolicy::Majority => majority(bm, x, y),
        TurnPolicy::Minority => !majority(bm, x, y),
    };
    if right {
        Turn::Right
    } else {
        Turn::Left
    }
}

/// Whether foreground dominates the neighbourhood of corner (x, y).
///
/// Counts pixels on square rings of growing radius (2 to 4) around the
/// corner; the first ring without a tie decides. All ties count as
/// background.
fn majority(bm: &Bitmap, x: i32, y: i32) -> bool {
    let vote = |set: bool| if set { 1 } else { -1 };
    for i in 2..5 {
        let mut ct = 0;
        for a in (-i + 1)..=(i - 1) {
            ct += vote(bm.get(x + a, y + i - 1));
            ct += vote(bm.get(x + i - 1, y + a - 1));
            ct += vote(bm.get(x + a - 1, y - i));
            ct += vote(bm.get(x - i, y + a));
        }
        if ct > 0 {
            return true;
        } else if ct < 0 {
            return false;
        }
    }
    false
}

/// XOR-fill the interior of a path.
///
/// For each vertical step in the path, toggle all pixels from that column
/// to the right edge of the row. Pairs of toggles cancel outside the
/// contour, leaving only the interior flipped.
fn xor_fill(bm: &mut Bitmap, points: &[(i32, i32)]) {
    let Some(&(_, last_y)) = points.last() else {
        return;
    };
    let mut y_prev = last_y;
    for &(x, y) in points {
        if y != y_prev {
            bm.xor_row_from(x, y.min(y_prev));
        }
        y_prev = y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(rows: &[&str]) -> BinaryMask {
        let rows: Vec<Vec<u8>> = rows
            .iter()
            .map(|r| r.bytes().map(|b| (b == b'#') as u8).collect())
            .collect();
        BinaryMask::from_rows(&rows).unwrap()
    }

    fn diagonal_pair() -> BinaryMask {
        mask(&["#.", ".#"])
    }

    #[test]
    fn empty_mask_has_no_contours() {
        let m = BinaryMask::empty(8, 5).unwrap();
        assert!(decompose(&m, 0, TurnPolicy::Minority).is_empty());
    }

    #[test]
    fn single_pixel() {
        let m = mask(&["#"]);
        let contours = decompose(&m, 0, TurnPolicy::Minority);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![(0, 0), (1, 0), (1, 1), (0, 1)]);
        assert_eq!(contours[0].area, 1);
        assert_eq!(contours[0].contour_type, ContourType::Outer);
    }

    #[test]
    fn filled_square_boundary() {
        let m = mask(&[
            "......", ".####.", ".####.", ".####.", ".####.", "......",
        ]);
        let contours = decompose(&m, 0, TurnPolicy::Minority);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert_eq!(c.area, 16);
        assert_eq!(c.points.len(), 16);
        assert_eq!(c.points[0], (1, 1));
        // Every step is one unit long, including the closing step.
        for (i, &(x, y)) in c.points.iter().enumerate() {
            let (nx, ny) = c.points[(i + 1) % c.points.len()];
            assert_eq!((nx - x).abs() + (ny - y).abs(), 1);
        }
    }

    #[test]
    fn ring_yields_outer_then_hole() {
        let m = mask(&[
            "######", "######", "##..##", "##..##", "######", "######",
        ]);
        let contours = decompose(&m, 0, TurnPolicy::Minority);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].contour_type, ContourType::Outer);
        assert_eq!(contours[0].area, 36);
        assert_eq!(contours[1].contour_type, ContourType::Hole);
        assert_eq!(contours[1].area, -4);
        assert_eq!(contours[1].points[0], (2, 2));
    }

    #[test]
    fn island_inside_hole() {
        let m = mask(&[
            "#######", "#.....#", "#.....#", "#..#..#", "#.....#", "#.....#", "#######",
        ]);
        let contours = decompose(&m, 0, TurnPolicy::Minority);
        let areas: Vec<i64> = contours.iter().map(|c| c.area).collect();
        assert_eq!(areas, vec![49, -25, 1]);
    }

    #[test]
    fn min_area_filters_speckles() {
        let m = mask(&["#....", ".....", "..###", "..###"]);
        let all = decompose(&m, 0, TurnPolicy::Minority);
        assert_eq!(all.len(), 2);
        let kept = decompose(&m, 2, TurnPolicy::Minority);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].area, 6);
        // Exactly at the threshold is kept.
        assert_eq!(decompose(&m, 6, TurnPolicy::Minority).len(), 1);
        assert!(decompose(&m, 7, TurnPolicy::Minority).is_empty());
    }

    #[test]
    fn connecting_policies_join_diagonal_pixels() {
        for policy in [TurnPolicy::Right, TurnPolicy::Black, TurnPolicy::Minority] {
            let contours = decompose(&diagonal_pair(), 0, policy);
            assert_eq!(contours.len(), 1, "{}", policy);
            assert_eq!(contours[0].area, 2);
            assert_eq!(
                contours[0].points,
                vec![(0, 0), (1, 0), (1, 1), (2, 1), (2, 2), (1, 2), (1, 1), (0, 1)]
            );
        }
    }

    #[test]
    fn separating_policies_split_diagonal_pixels() {
        for policy in [TurnPolicy::Left, TurnPolicy::White, TurnPolicy::Majority] {
            let contours = decompose(&diagonal_pair(), 0, policy);
            assert_eq!(contours.len(), 2, "{}", policy);
            assert!(contours.iter().all(|c| c.area == 1));
        }
    }

    #[test]
    fn majority_reads_the_neighbourhood() {
        let m = mask(&["#####", "#####", "##.##", "#####", "#####"]);
        let bm = Bitmap::from_mask(&m);
        assert!(majority(&bm, 2, 2));
        let empty = Bitmap::from_mask(&BinaryMask::empty(5, 5).unwrap());
        assert!(!majority(&empty, 2, 2));
        assert_eq!(
            resolve_turn(TurnPolicy::Minority, ContourType::Outer, &bm, 2, 2),
            Turn::Left
        );
        assert_eq!(
            resolve_turn(TurnPolicy::White, ContourType::Hole, &bm, 2, 2),
            Turn::Right
        );
    }

    #[test]
    fn xor_fill_clears_traced_interior() {
        let m = mask(&["###", "###"]);
        let mut bm = Bitmap::from_mask(&m);
        let c = find_path(&bm, 0, 0, ContourType::Outer, TurnPolicy::Minority);
        xor_fill(&mut bm, &c.points);
        assert!(bm.data.iter().all(|&v| !v));
    }
}
