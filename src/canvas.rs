use image::{Rgba, RgbaImage};

use crate::paint::{self, PaintError, PaintSource, StrokePaint};
use crate::raster::{self, CoverageMask, PixelRect};

/// Color a fresh canvas paints with (`#FF660000`).
pub const INITIAL_COLOR: Rgba<u8> = Rgba([0x66, 0x00, 0x00, 0xFF]);

// ============================================================================
// TOUCH INPUT
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchAction {
    Down,
    Move,
    Up,
    Cancel,
}

/// A single touch sample in canvas pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub x: f32,
    pub y: f32,
}

impl TouchEvent {
    pub fn new(action: TouchAction, x: f32, y: f32) -> Self {
        Self { action, x, y }
    }
}

// ============================================================================
// STROKE
// ============================================================================

/// One continuous gesture: its points and the paint it started with.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub points: Vec<(f32, f32)>,
    pub paint: StrokePaint,
}

impl Stroke {
    fn begin(x: f32, y: f32, paint: StrokePaint) -> Self {
        Self {
            points: vec![(x, y)],
            paint,
        }
    }

    fn render(&self, target: &mut RgbaImage) {
        raster::draw_stroke(target, &self.points, &self.paint);
    }
}

/// The gesture in progress.  Its coverage is kept between samples so each
/// Move only rasterises the segment it appends.
struct LiveStroke {
    stroke: Stroke,
    mask: CoverageMask,
    /// Union of every area stamped so far
    bounds: Option<PixelRect>,
}

impl LiveStroke {
    fn new(stroke: Stroke, width: u32, height: u32) -> Self {
        let mut live = Self {
            stroke,
            mask: CoverageMask::new(PixelRect::new(0, 0, width, height)),
            bounds: None,
        };
        let first = live.stroke.points.first().copied();
        if let Some(p) = first {
            live.stamp(p, p);
        }
        for i in 1..live.stroke.points.len() {
            let (a, b) = (live.stroke.points[i - 1], live.stroke.points[i]);
            live.stamp(a, b);
        }
        live
    }

    fn stamp(&mut self, a: (f32, f32), b: (f32, f32)) -> Option<PixelRect> {
        let area = self.mask.add_segment(a, b, self.stroke.paint.width)?;
        self.bounds = Some(self.bounds.map_or(area, |b| b.union(area)));
        Some(area)
    }

    /// Append a point; returns the pixels that need recompositing.
    fn extend(&mut self, x: f32, y: f32) -> Option<PixelRect> {
        let last = self.stroke.points.last().copied().unwrap_or((x, y));
        self.stroke.points.push((x, y));
        self.stamp(last, (x, y))
    }
}

// ============================================================================
// DRAWING CANVAS
// ============================================================================

/// Touch-driven bitmap canvas.
///
/// Committed strokes are rasterised into `bitmap` on touch-up and kept in
/// order so the bitmap can be rebuilt for undo, redo and resize.  `preview`
/// is `bitmap` with the gesture in progress composited on top; it is only
/// touched where the gesture changes.
pub struct DrawingCanvas {
    bitmap: RgbaImage,
    preview: RgbaImage,
    strokes: Vec<Stroke>,
    redo_stack: Vec<Stroke>,
    active: Option<LiveStroke>,

    source: PaintSource,
    /// Stroke width in pixels
    brush_size: f32,
    /// Last draw size chosen by the user, in dp
    last_brush_size: f32,
    alpha: u8,
    erase: bool,
    /// Pixels per dp
    density: f32,

    dirty: bool,
}

impl DrawingCanvas {
    pub fn new(width: u32, height: u32, density: f32, medium_brush_dp: f32) -> Self {
        let density = density.max(0.1);
        Self {
            bitmap: RgbaImage::new(width, height),
            preview: RgbaImage::new(width, height),
            strokes: Vec::new(),
            redo_stack: Vec::new(),
            active: None,
            source: PaintSource::Solid(INITIAL_COLOR),
            brush_size: (medium_brush_dp * density).max(1.0),
            last_brush_size: medium_brush_dp,
            alpha: 255,
            erase: false,
            density,
            dirty: true,
        }
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    /// Update the dp→px scale.  The current brush keeps its dp size.
    pub fn set_density(&mut self, density: f32) {
        let density = density.max(0.1);
        if (density - self.density).abs() < f32::EPSILON {
            return;
        }
        let dp = self.brush_size / self.density;
        self.density = density;
        self.brush_size = (dp * density).max(1.0);
    }

    /// Replace the bitmap with one of the new size and replay committed strokes.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.bitmap.dimensions() == (width, height) {
            return;
        }
        crate::log_info!("Canvas resized to {}x{}", width, height);
        self.bitmap = RgbaImage::new(width, height);
        self.rebuild();
    }

    /// Feed one touch sample.  Returns true when the event was consumed.
    ///
    /// A Down while a gesture is still open commits that gesture first, so
    /// its points are kept rather than dropped.
    pub fn on_touch(&mut self, event: TouchEvent) -> bool {
        let TouchEvent { action, x, y } = event;
        match action {
            TouchAction::Down => {
                self.commit_active();
                let stroke = Stroke::begin(x, y, self.current_paint());
                let live = LiveStroke::new(stroke, self.width(), self.height());
                if let Some(area) = live.bounds {
                    raster::composite(&mut self.preview, Some(&self.bitmap), &live.mask, &live.stroke.paint, area);
                }
                self.active = Some(live);
            }
            TouchAction::Move => {
                let Some(live) = self.active.as_mut() else { return false };
                if let Some(area) = live.extend(x, y) {
                    raster::composite(&mut self.preview, Some(&self.bitmap), &live.mask, &live.stroke.paint, area);
                }
            }
            TouchAction::Up => {
                let Some(live) = self.active.as_mut() else { return false };
                if let Some(area) = live.extend(x, y) {
                    raster::composite(&mut self.preview, Some(&self.bitmap), &live.mask, &live.stroke.paint, area);
                }
                self.commit_active();
            }
            TouchAction::Cancel => {
                if let Some(live) = self.active.take() {
                    if let Some(area) = live.bounds {
                        raster::copy_rect(&mut self.preview, &self.bitmap, area);
                    }
                    self.dirty = true;
                }
                return false;
            }
        }
        self.dirty = true;
        true
    }

    /// Whether a gesture is in progress.
    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Select a paint by palette tag: `#RRGGBB` / `#AARRGGBB` or a pattern name.
    pub fn set_color(&mut self, tag: &str) -> Result<(), PaintError> {
        self.dirty = true;
        self.source = PaintSource::from_tag(tag)?;
        Ok(())
    }

    pub fn paint_source(&self) -> &PaintSource {
        &self.source
    }

    /// Set the stroke width in dp.
    pub fn set_brush_size(&mut self, dp: f32) {
        self.brush_size = (dp * self.density).max(1.0);
    }

    /// Current stroke width in pixels.
    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    pub fn last_brush_size(&self) -> f32 {
        self.last_brush_size
    }

    pub fn set_last_brush_size(&mut self, dp: f32) {
        self.last_brush_size = dp;
    }

    pub fn set_erase(&mut self, erase: bool) {
        self.erase = erase;
    }

    pub fn is_erase(&self) -> bool {
        self.erase
    }

    pub fn paint_alpha(&self) -> u8 {
        self.alpha
    }

    pub fn paint_alpha_percent(&self) -> u8 {
        paint::alpha_to_percent(self.alpha)
    }

    pub fn set_paint_alpha_percent(&mut self, percent: u8) {
        self.alpha = paint::percent_to_alpha(percent);
    }

    /// Clear everything.  Not undoable.
    pub fn start_new(&mut self) {
        self.bitmap.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
        self.strokes.clear();
        self.redo_stack.clear();
        self.active = None;
        self.sync_preview();
    }

    pub fn can_undo(&self) -> bool {
        !self.strokes.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Remove the most recent stroke.  Returns false when there is none.
    pub fn undo(&mut self) -> bool {
        let Some(stroke) = self.strokes.pop() else { return false };
        self.redo_stack.push(stroke);
        self.rebuild();
        true
    }

    /// Re-apply the most recently undone stroke.
    pub fn redo(&mut self) -> bool {
        let Some(stroke) = self.redo_stack.pop() else { return false };
        stroke.render(&mut self.bitmap);
        self.strokes.push(stroke);
        self.sync_preview();
        true
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Committed pixels only.
    pub fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }

    /// What the screen shows: committed pixels plus the gesture in progress.
    pub fn view(&self) -> &RgbaImage {
        &self.preview
    }

    /// Owned copy of [`Self::view`].
    pub fn snapshot(&self) -> RgbaImage {
        self.preview.clone()
    }

    /// Snapshot composited over an opaque background, as saved to the gallery.
    pub fn flatten(&self, background: Rgba<u8>) -> RgbaImage {
        raster::flatten_onto(&self.preview, background)
    }

    /// Returns true once per change since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn current_paint(&self) -> StrokePaint {
        StrokePaint {
            source: self.source.clone(),
            width: self.brush_size,
            alpha: self.alpha,
            erase: self.erase,
        }
    }

    /// Rasterise the open gesture into the bitmap and record it.
    fn commit_active(&mut self) {
        let Some(live) = self.active.take() else { return };
        if let Some(area) = live.bounds {
            raster::composite(&mut self.bitmap, None, &live.mask, &live.stroke.paint, area);
            raster::copy_rect(&mut self.preview, &self.bitmap, area);
        }
        self.strokes.push(live.stroke);
        self.redo_stack.clear();
        self.dirty = true;
    }

    fn rebuild(&mut self) {
        self.bitmap.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
        for stroke in &self.strokes {
            stroke.render(&mut self.bitmap);
        }
        self.sync_preview();
    }

    /// Recreate the preview from the bitmap, re-stamping any open gesture at
    /// the current size.
    fn sync_preview(&mut self) {
        self.preview.clone_from(&self.bitmap);
        if let Some(live) = self.active.take() {
            let live = LiveStroke::new(live.stroke, self.width(), self.height());
            if let Some(area) = live.bounds {
                raster::composite(&mut self.preview, Some(&self.bitmap), &live.mask, &live.stroke.paint, area);
            }
            self.active = Some(live);
        }
        self.dirty = true;
    }
}
