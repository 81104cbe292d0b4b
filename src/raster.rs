// ============================================================================
// STROKE RASTERISER — round-capped, round-joined anti-aliased polylines
// ============================================================================
//
// Coverage of a pixel is derived from the distance between its centre and
// the nearest segment of the stroke.  Segments are stamped one at a time into
// a `CoverageMask` and merged with `max`, so a stroke never blends over
// itself where segments overlap and appending a segment only touches the
// pixels that segment can reach.  Rows are processed in parallel with rayon.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::paint::StrokePaint;

/// Half-open pixel rectangle `[x0, x1) × [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRect {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn union(self, other: PixelRect) -> PixelRect {
        PixelRect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Pixels of `self` touched by the float box `min..max`, or `None` when
    /// they do not meet.
    fn clip(&self, min: (f32, f32), max: (f32, f32)) -> Option<PixelRect> {
        let x0 = min.0.floor().max(self.x0 as f32).min(self.x1 as f32) as u32;
        let y0 = min.1.floor().max(self.y0 as f32).min(self.y1 as f32) as u32;
        let x1 = max.0.ceil().max(self.x0 as f32).min(self.x1 as f32) as u32;
        let y1 = max.1.ceil().max(self.y0 as f32).min(self.y1 as f32) as u32;
        (x0 < x1 && y0 < y1).then_some(PixelRect { x0, y0, x1, y1 })
    }
}

struct Segment {
    ax: f32,
    ay: f32,
    bx: f32,
    by: f32,
}

impl Segment {
    fn new(a: (f32, f32), b: (f32, f32)) -> Self {
        Self {
            ax: a.0,
            ay: a.1,
            bx: b.0,
            by: b.1,
        }
    }

    /// Distance from (px, py) to the closed segment.
    #[inline]
    fn distance(&self, px: f32, py: f32) -> f32 {
        let dx = self.bx - self.ax;
        let dy = self.by - self.ay;
        let len2 = dx * dx + dy * dy;
        let t = if len2 <= f32::EPSILON {
            0.0
        } else {
            (((px - self.ax) * dx + (py - self.ay) * dy) / len2).clamp(0.0, 1.0)
        };
        let cx = self.ax + t * dx - px;
        let cy = self.ay + t * dy - py;
        (cx * cx + cy * cy).sqrt()
    }
}

#[inline]
fn brush_radius(width: f32) -> f32 {
    (width / 2.0).max(0.5)
}

/// Per-pixel stroke coverage (0.0..=1.0) over a window of the canvas.
pub struct CoverageMask {
    area: PixelRect,
    data: Vec<f32>,
}

impl CoverageMask {
    pub fn new(area: PixelRect) -> Self {
        Self {
            area,
            data: vec![0.0; area.width() as usize * area.height() as usize],
        }
    }

    pub fn area(&self) -> PixelRect {
        self.area
    }

    /// Coverage at canvas pixel (x, y); zero outside the window.
    #[inline]
    pub fn coverage(&self, x: u32, y: u32) -> f32 {
        let a = self.area;
        if x < a.x0 || x >= a.x1 || y < a.y0 || y >= a.y1 {
            return 0.0;
        }
        self.data[(y - a.y0) as usize * a.width() as usize + (x - a.x0) as usize]
    }

    /// Stamp the capsule around `a..b` for a brush `width` px wide.
    /// Returns the pixels that may have changed.
    pub fn add_segment(&mut self, a: (f32, f32), b: (f32, f32), width: f32) -> Option<PixelRect> {
        let radius = brush_radius(width);
        let reach = radius + 1.0;
        let bounds = self.area.clip(
            (a.0.min(b.0) - reach, a.1.min(b.1) - reach),
            (a.0.max(b.0) + reach, a.1.max(b.1) + reach),
        )?;

        let segment = Segment::new(a, b);
        let stride = self.area.width() as usize;
        let (ox, oy) = (self.area.x0, self.area.y0);
        let rows = &mut self.data[(bounds.y0 - oy) as usize * stride..(bounds.y1 - oy) as usize * stride];

        rows.par_chunks_mut(stride)
            .enumerate()
            .for_each(|(i, row)| {
                let py = (bounds.y0 + i as u32) as f32 + 0.5;
                for x in bounds.x0..bounds.x1 {
                    let px = x as f32 + 0.5;
                    let coverage = (radius + 0.5 - segment.distance(px, py)).clamp(0.0, 1.0);
                    let cell = &mut row[(x - ox) as usize];
                    if coverage > *cell {
                        *cell = coverage;
                    }
                }
            });
        Some(bounds)
    }
}

/// Segment endpoints of a polyline; a single point is a zero-length segment.
pub fn segments(points: &[(f32, f32)]) -> impl Iterator<Item = ((f32, f32), (f32, f32))> + '_ {
    let dot = (points.len() == 1).then(|| (points[0], points[0]));
    dot.into_iter().chain(points.windows(2).map(|w| (w[0], w[1])))
}

/// Rasterise `points` into `target` with `paint`.
///
/// A single point renders as a round dot.  Erase strokes clear the target
/// in proportion to coverage; color and alpha are ignored for them.
pub fn draw_stroke(target: &mut RgbaImage, points: &[(f32, f32)], paint: &StrokePaint) {
    let (width, height) = target.dimensions();
    if points.is_empty() || width == 0 || height == 0 {
        return;
    }

    // Bounding box of the stroke, expanded by the brush radius
    let reach = brush_radius(paint.width) + 1.0;
    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for &(x, y) in points {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    let canvas = PixelRect::new(0, 0, width, height);
    let Some(area) = canvas.clip((min_x - reach, min_y - reach), (max_x + reach, max_y + reach)) else {
        return;
    };

    let mut mask = CoverageMask::new(area);
    for (a, b) in segments(points) {
        mask.add_segment(a, b, paint.width);
    }
    composite(target, None, &mask, paint, area);
}

/// Blend `paint` through `mask` into `target` inside `area`.
///
/// Underlying pixels are read from `base` when given (which must match
/// `target` in size), otherwise from `target` itself.  Pixels with no
/// coverage are copied from `base` unchanged.
pub fn composite(
    target: &mut RgbaImage,
    base: Option<&RgbaImage>,
    mask: &CoverageMask,
    paint: &StrokePaint,
    area: PixelRect,
) {
    let (width, height) = target.dimensions();
    let Some(area) = PixelRect::new(0, 0, width, height).clip(
        (area.x0 as f32, area.y0 as f32),
        (area.x1 as f32, area.y1 as f32),
    ) else {
        return;
    };
    let base = base.filter(|b| b.dimensions() == (width, height)).map(|b| b.as_raw().as_slice());

    let row_len = width as usize * 4;
    let alpha = paint.alpha as f32 / 255.0;
    let raw: &mut [u8] = &mut *target;
    let rows = &mut raw[area.y0 as usize * row_len..area.y1 as usize * row_len];

    rows.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(i, row)| {
            let y = area.y0 + i as u32;
            let base_row = base.map(|b| &b[y as usize * row_len..(y as usize + 1) * row_len]);
            for x in area.x0..area.x1 {
                let idx = x as usize * 4;
                let under = base_row.unwrap_or(&*row);
                let dst = Rgba([under[idx], under[idx + 1], under[idx + 2], under[idx + 3]]);
                let coverage = mask.coverage(x, y);
                let out = if coverage <= 0.0 {
                    dst
                } else if paint.erase {
                    erase_pixel(dst, coverage)
                } else {
                    let src = paint.source.sample(x, y);
                    let a = src[3] as f32 / 255.0 * alpha * coverage;
                    blend_over(dst, src, a)
                };
                row[idx..idx + 4].copy_from_slice(&out.0);
            }
        });
}

/// Copy `area` of `source` into `target` (same dimensions).
pub fn copy_rect(target: &mut RgbaImage, source: &RgbaImage, area: PixelRect) {
    if target.dimensions() != source.dimensions() {
        return;
    }
    let (width, height) = target.dimensions();
    let x1 = area.x1.min(width) as usize * 4;
    let x0 = (area.x0 as usize * 4).min(x1);
    let row_len = width as usize * 4;
    let src = source.as_raw();
    let raw: &mut [u8] = &mut *target;
    for y in area.y0.min(height)..area.y1.min(height) {
        let start = y as usize * row_len;
        raw[start + x0..start + x1].copy_from_slice(&src[start + x0..start + x1]);
    }
}

/// Source-over blend of `src` at effective opacity `a` onto `dst` (straight alpha).
#[inline]
pub fn blend_over(dst: Rgba<u8>, src: Rgba<u8>, a: f32) -> Rgba<u8> {
    if a <= 0.0 {
        return dst;
    }
    if a >= 1.0 {
        return Rgba([src[0], src[1], src[2], 255]);
    }
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = a + dst_a * (1.0 - a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mix = |s: u8, d: u8| {
        ((s as f32 * a + d as f32 * dst_a * (1.0 - a)) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[inline]
fn erase_pixel(dst: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    let a = (dst[3] as f32 * (1.0 - coverage)).round() as u8;
    if a == 0 {
        Rgba([0, 0, 0, 0])
    } else {
        Rgba([dst[0], dst[1], dst[2], a])
    }
}

/// Composite `image` over an opaque `background`.
pub fn flatten_onto(image: &RgbaImage, background: Rgba<u8>) -> RgbaImage {
    let bg = Rgba([background[0], background[1], background[2], 255]);
    let mut out = RgbaImage::from_pixel(image.width(), image.height(), bg);
    let raw: &mut [u8] = &mut out;
    raw.par_chunks_mut(4)
        .zip(image.as_raw().par_chunks(4))
        .for_each(|(o, s)| {
            let top = Rgba([s[0], s[1], s[2], s[3]]);
            let px = blend_over(bg, top, s[3] as f32 / 255.0);
            o.copy_from_slice(&px.0);
        });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::PaintSource;

    fn solid(width: f32, color: Rgba<u8>, alpha: u8) -> StrokePaint {
        StrokePaint {
            source: PaintSource::Solid(color),
            width,
            alpha,
            erase: false,
        }
    }

    #[test]
    fn line_covers_its_path_and_nothing_far_away() {
        let mut img = RgbaImage::new(40, 40);
        let red = Rgba([255, 0, 0, 255]);
        draw_stroke(&mut img, &[(5.0, 20.0), (35.0, 20.0)], &solid(6.0, red, 255));
        assert_eq!(*img.get_pixel(20, 19), red);
        assert_eq!(*img.get_pixel(20, 20), red);
        assert_eq!(img.get_pixel(20, 30)[3], 0);
        assert_eq!(img.get_pixel(20, 5)[3], 0);
    }

    #[test]
    fn caps_are_round() {
        let mut img = RgbaImage::new(40, 40);
        draw_stroke(&mut img, &[(10.0, 20.0), (30.0, 20.0)], &solid(10.0, Rgba([0, 0, 255, 255]), 255));
        // Past the end point along the axis, inside the cap
        assert_eq!(img.get_pixel(33, 20)[3], 255);
        // Corner of the cap's bounding square is outside the circle
        assert_eq!(img.get_pixel(34, 24)[3], 0);
    }

    #[test]
    fn single_point_draws_a_dot() {
        let mut img = RgbaImage::new(20, 20);
        draw_stroke(&mut img, &[(10.0, 10.0)], &solid(8.0, Rgba([0, 0, 0, 255]), 255));
        assert_eq!(img.get_pixel(10, 10)[3], 255);
        assert_eq!(img.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn overlapping_segments_do_not_double_blend() {
        let mut img = RgbaImage::new(40, 40);
        let paint = solid(6.0, Rgba([0, 255, 0, 255]), 128);
        draw_stroke(&mut img, &[(5.0, 20.0), (35.0, 20.0), (5.0, 20.0)], &paint);
        assert_eq!(img.get_pixel(20, 20)[3], 128);
    }

    #[test]
    fn erase_clears_and_ignores_color() {
        let mut img = RgbaImage::from_pixel(30, 30, Rgba([9, 9, 9, 255]));
        let mut paint = solid(6.0, Rgba([255, 0, 0, 255]), 10);
        paint.erase = true;
        draw_stroke(&mut img, &[(0.0, 15.0), (30.0, 15.0)], &paint);
        assert_eq!(*img.get_pixel(15, 15), Rgba([0, 0, 0, 0]));
        assert_eq!(*img.get_pixel(15, 2), Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn strokes_off_canvas_are_clipped() {
        let mut img = RgbaImage::new(10, 10);
        draw_stroke(&mut img, &[(-50.0, -50.0), (-40.0, -40.0)], &solid(4.0, Rgba([1, 2, 3, 255]), 255));
        assert!(img.pixels().all(|p| p[3] == 0));
        draw_stroke(&mut img, &[(-5.0, 5.0), (15.0, 5.0)], &solid(2.0, Rgba([1, 2, 3, 255]), 255));
        assert_eq!(img.get_pixel(0, 5)[3], 255);
        assert_eq!(img.get_pixel(9, 5)[3], 255);
    }

    #[test]
    fn stamping_a_segment_reports_only_its_reach() {
        let mut mask = CoverageMask::new(PixelRect::new(0, 0, 200, 200));
        let touched = mask.add_segment((100.0, 100.0), (110.0, 100.0), 6.0).unwrap();
        assert_eq!(touched, PixelRect::new(96, 96, 114, 104));
        assert_eq!(mask.coverage(105, 100), 1.0);
        assert_eq!(mask.coverage(50, 100), 0.0);
        assert!(mask.add_segment((-50.0, -50.0), (-40.0, -40.0), 6.0).is_none());
    }

    #[test]
    fn incremental_composite_matches_whole_stroke() {
        let points = [(4.0, 4.0), (30.0, 10.0), (8.0, 30.0), (36.0, 36.0)];
        let paint = solid(7.0, Rgba([10, 200, 30, 255]), 160);
        let base = RgbaImage::from_pixel(40, 40, Rgba([200, 200, 200, 90]));

        let mut whole = base.clone();
        draw_stroke(&mut whole, &points, &paint);

        let mut live = base.clone();
        let mut mask = CoverageMask::new(PixelRect::new(0, 0, 40, 40));
        for (a, b) in std::iter::once((points[0], points[0])).chain(segments(&points)) {
            if let Some(area) = mask.add_segment(a, b, paint.width) {
                composite(&mut live, Some(&base), &mask, &paint, area);
            }
        }
        assert_eq!(live, whole);
    }

    #[test]
    fn copy_rect_restores_an_area() {
        let clean = RgbaImage::new(8, 8);
        let mut img = RgbaImage::from_pixel(8, 8, Rgba([1, 1, 1, 255]));
        copy_rect(&mut img, &clean, PixelRect::new(2, 2, 4, 4));
        assert_eq!(img.get_pixel(3, 3)[3], 0);
        assert_eq!(img.get_pixel(4, 4)[3], 255);
    }

    #[test]
    fn flatten_fills_transparent_with_background() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
        let flat = flatten_onto(&img, Rgba([255, 255, 255, 255]));
        assert_eq!(*flat.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*flat.get_pixel(1, 0), Rgba([0, 0, 0, 255]));
    }
}
