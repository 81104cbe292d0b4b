use eframe::egui;
use egui::{Color32, ColorImage, Rect, Sense, TextureHandle, TextureOptions};

use crate::canvas::{DrawingCanvas, TouchAction, TouchEvent};
use crate::components::dialogs::{
    ActiveDialog, BrushSizeDialog, ConfirmDialog, DialogResult, OpacityDialog, SizePurpose,
};
use crate::components::palette::Palette;
use crate::components::toast::Toasts;
use crate::gallery::{self, Gallery};
use crate::paint::BrushSize;
use crate::settings::{clamp_density, clamp_window, AppSettings};
use crate::{log_err, log_info};

pub const SAVED_MESSAGE: &str = "Drawing saved to Gallery!";
pub const SAVE_FAILED_MESSAGE: &str = "Oops! Image could not be saved.";
/// Description stored with every saved drawing.
pub const SAVED_DESCRIPTION: &str = "drawing";

const FULL_OPACITY: u8 = 100;
/// Upper bound on either side of the bitmap created before the first frame;
/// the canvas is resized to the real widget size once laid out.
const INITIAL_CANVAS_LIMIT: u32 = 2048;

/// Canvas touch event for one frame of pointer state, if any.
///
/// `pointer` is relative to the canvas' top-left corner in points and is
/// scaled by `ppp` into canvas pixels; `last` is the previous event position
/// in canvas pixels.  A touch cancel ends an open gesture; otherwise a press
/// starts one, a moved press extends it and a release ends it (at `last`
/// when the pointer has left the window).
pub fn pointer_to_touch(
    down: bool,
    is_drawing: bool,
    pointer: Option<(f32, f32)>,
    last: Option<(f32, f32)>,
    cancelled: bool,
    ppp: f32,
) -> Option<TouchEvent> {
    if cancelled && is_drawing {
        let (x, y) = last.unwrap_or((0.0, 0.0));
        return Some(TouchEvent::new(TouchAction::Cancel, x, y));
    }
    let pointer = pointer.map(|(x, y)| (x * ppp, y * ppp));
    match (down, is_drawing, pointer) {
        (true, false, Some((x, y))) => Some(TouchEvent::new(TouchAction::Down, x, y)),
        (true, true, Some((x, y))) if last != Some((x, y)) => {
            Some(TouchEvent::new(TouchAction::Move, x, y))
        }
        (false, true, _) => {
            let (x, y) = pointer.or(last).unwrap_or((0.0, 0.0));
            Some(TouchEvent::new(TouchAction::Up, x, y))
        }
        _ => None,
    }
}

/// Application shell: toolbar, palette, dialogs and the canvas view.
/// All drawing state lives in `canvas`; this type only forwards user choices.
pub struct DrawingApp {
    pub canvas: DrawingCanvas,
    pub settings: AppSettings,
    pub gallery: Gallery,
    pub palette: Palette,
    pub dialog: ActiveDialog,
    pub toasts: Toasts,
    texture: Option<TextureHandle>,
    /// Last pointer position in canvas pixels while a gesture is active
    last_pointer: Option<(f32, f32)>,
}

impl DrawingApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: AppSettings) -> Self {
        let density = settings.density_or(cc.egui_ctx.pixels_per_point());
        Self::with_settings(settings, density)
    }

    pub fn with_settings(settings: AppSettings, density: f32) -> Self {
        let gallery = Gallery::from_setting(&settings.gallery_dir);
        let density = clamp_density(density);
        let density = if density > 0.0 { density } else { 1.0 };
        let initial_side = |points: f32, fallback: f32| {
            let px = (clamp_window(points, fallback) * density) as u32;
            px.clamp(1, INITIAL_CANVAS_LIMIT)
        };
        let defaults = AppSettings::default();
        let width = initial_side(settings.window_width, defaults.window_width);
        let height = initial_side(settings.window_height, defaults.window_height);
        let canvas = DrawingCanvas::new(width, height, density, settings.brushes.medium);
        log_info!(
            "Canvas {}x{} at density {:.2}, gallery {}",
            width,
            height,
            density,
            gallery.dir().display()
        );

        let mut app = Self {
            canvas,
            settings,
            gallery,
            palette: Palette::default(),
            dialog: ActiveDialog::None,
            toasts: Toasts::default(),
            texture: None,
            last_pointer: None,
        };
        app.set_brush_size(BrushSize::Medium);
        app
    }

    // ------------------------------------------------------------------
    // Actions forwarded to the canvas
    // ------------------------------------------------------------------

    /// Brush-size pick: leaves erase mode and remembers the size.
    pub fn set_brush_size(&mut self, size: BrushSize) {
        let dp = self.settings.brushes.dp(size);
        self.canvas.set_erase(false);
        self.canvas.set_brush_size(dp);
        self.canvas.set_last_brush_size(dp);
    }

    /// Eraser-size pick: the remembered draw size is left alone.
    pub fn set_erase_size(&mut self, size: BrushSize) {
        let dp = self.settings.brushes.dp(size);
        self.canvas.set_erase(true);
        self.canvas.set_brush_size(dp);
    }

    /// Palette swatch clicked: back to drawing at full opacity with the
    /// last draw size, then switch paint if the swatch changed.
    pub fn paint_clicked(&mut self, index: usize) {
        self.canvas.set_erase(false);
        self.canvas.set_paint_alpha_percent(FULL_OPACITY);
        self.canvas.set_brush_size(self.canvas.last_brush_size());

        if index == self.palette.current() {
            return;
        }
        let Some(tag) = self.palette.tag(index) else { return };
        match self.canvas.set_color(tag) {
            Ok(()) => self.palette.set_current(index),
            Err(e) => {
                log_err!("Palette swatch {}: {}", index, e);
                self.toasts.error(e.to_string());
            }
        }
    }

    pub fn set_opacity(&mut self, percent: u8) {
        self.canvas.set_paint_alpha_percent(percent);
    }

    pub fn start_new(&mut self) {
        self.canvas.start_new();
        log_info!("New drawing started");
    }

    /// Export the flattened drawing to the gallery and report via toast.
    pub fn save_drawing(&mut self) -> bool {
        let image = self.canvas.flatten(self.settings.background);
        let title = gallery::unique_png_name();
        match self.gallery.insert_image(&image, &title, SAVED_DESCRIPTION) {
            Ok(_) => {
                self.toasts.info(SAVED_MESSAGE);
                true
            }
            Err(e) => {
                log_err!("Save to {} failed: {}", self.gallery.dir().display(), e);
                self.toasts.error(SAVE_FAILED_MESSAGE);
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // UI
    // ------------------------------------------------------------------

    fn show_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("\u{1F4C4} New").on_hover_text("Start new drawing").clicked() {
                self.dialog = ActiveDialog::New(ConfirmDialog::new_drawing());
            }
            if ui.button("\u{1F58C} Brush").on_hover_text("Brush size").clicked() {
                self.dialog = ActiveDialog::BrushSize(BrushSizeDialog::new(SizePurpose::Draw));
            }
            if ui.button("\u{1F9F9} Erase").on_hover_text("Eraser size").clicked() {
                self.dialog = ActiveDialog::BrushSize(BrushSizeDialog::new(SizePurpose::Erase));
            }
            if ui.button("\u{1F4BE} Save").on_hover_text("Save to gallery").clicked() {
                self.dialog = ActiveDialog::Save(ConfirmDialog::save_drawing());
            }
            if ui.button("\u{25D0} Opacity").on_hover_text("Opacity level").clicked() {
                self.dialog =
                    ActiveDialog::Opacity(OpacityDialog::new(self.canvas.paint_alpha_percent()));
            }
            ui.separator();
            if ui
                .add_enabled(self.canvas.can_undo(), egui::Button::new("\u{21B6} Undo"))
                .clicked()
            {
                self.canvas.undo();
            }
            if ui
                .add_enabled(self.canvas.can_redo(), egui::Button::new("\u{21B7} Redo"))
                .clicked()
            {
                self.canvas.redo();
            }
        });
    }

    fn show_canvas(&mut self, ui: &mut egui::Ui) {
        let ppp = ui.ctx().pixels_per_point();
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;

        // Bitmap follows the widget size in physical pixels
        self.canvas.set_density(self.settings.density_or(ppp));
        let width = (rect.width() * ppp).round().max(1.0) as u32;
        let height = (rect.height() * ppp).round().max(1.0) as u32;
        self.canvas.resize(width, height);

        if self.dialog.is_none() {
            self.handle_pointer(ui, &response, ppp);
        }

        if self.canvas.take_dirty() || self.texture.is_none() {
            let view = self.canvas.view();
            let image = ColorImage::from_rgba_unmultiplied(
                [view.width() as usize, view.height() as usize],
                view.as_raw(),
            );
            if let Some(tex) = self.texture.as_mut() {
                tex.set(image, TextureOptions::LINEAR);
            } else {
                self.texture = Some(ui.ctx().load_texture("drawing_canvas", image, TextureOptions::LINEAR));
            }
        }

        let bg = self.settings.background;
        painter.rect_filled(rect, 0.0, Color32::from_rgb(bg[0], bg[1], bg[2]));
        if let Some(tex) = &self.texture {
            painter.image(
                tex.id(),
                rect,
                Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }
    }

    /// Translate egui pointer/touch state into canvas touch events.
    fn handle_pointer(&mut self, ui: &egui::Ui, response: &egui::Response, ppp: f32) {
        let origin = response.rect.min;
        let cancelled = ui.input(|i| {
            i.events.iter().any(|e| {
                matches!(
                    e,
                    egui::Event::Touch {
                        phase: egui::TouchPhase::Cancel,
                        ..
                    }
                )
            })
        });
        let pointer = ui
            .input(|i| i.pointer.interact_pos())
            .map(|p| (p.x - origin.x, p.y - origin.y));
        let down = response.is_pointer_button_down_on();

        let Some(event) = pointer_to_touch(
            down,
            self.canvas.is_drawing(),
            pointer,
            self.last_pointer,
            cancelled,
            ppp,
        ) else {
            return;
        };
        self.canvas.on_touch(event);
        self.last_pointer = match event.action {
            TouchAction::Down | TouchAction::Move => Some((event.x, event.y)),
            TouchAction::Up | TouchAction::Cancel => None,
        };
    }

    fn show_dialog(&mut self, ctx: &egui::Context) {
        let brushes = self.settings.brushes;
        self.dialog = match std::mem::take(&mut self.dialog) {
            ActiveDialog::None => ActiveDialog::None,
            ActiveDialog::BrushSize(mut d) => match d.show(ctx, |s| brushes.dp(s)) {
                DialogResult::Open => ActiveDialog::BrushSize(d),
                DialogResult::Ok(size) => {
                    match d.purpose {
                        SizePurpose::Draw => self.set_brush_size(size),
                        SizePurpose::Erase => self.set_erase_size(size),
                    }
                    ActiveDialog::None
                }
                DialogResult::Cancel => ActiveDialog::None,
            },
            ActiveDialog::New(mut d) => match d.show(ctx) {
                DialogResult::Open => ActiveDialog::New(d),
                DialogResult::Ok(()) => {
                    self.start_new();
                    ActiveDialog::None
                }
                DialogResult::Cancel => ActiveDialog::None,
            },
            ActiveDialog::Save(mut d) => match d.show(ctx) {
                DialogResult::Open => ActiveDialog::Save(d),
                DialogResult::Ok(()) => {
                    self.save_drawing();
                    ActiveDialog::None
                }
                DialogResult::Cancel => ActiveDialog::None,
            },
            ActiveDialog::Opacity(mut d) => match d.show(ctx) {
                DialogResult::Open => ActiveDialog::Opacity(d),
                DialogResult::Ok(percent) => {
                    self.set_opacity(percent);
                    ActiveDialog::None
                }
                DialogResult::Cancel => ActiveDialog::None,
            },
        };
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if !self.dialog.is_none() || self.canvas.is_drawing() {
            return;
        }
        let (undo, redo) = ctx.input_mut(|i| {
            (
                i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z),
                i.consume_key(egui::Modifiers::COMMAND, egui::Key::Y),
            )
        });
        if undo {
            self.canvas.undo();
        }
        if redo {
            self.canvas.redo();
        }
    }
}

impl eframe::App for DrawingApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);
        let enabled = self.dialog.is_none();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_enabled_ui(enabled, |ui| self.show_toolbar(ui));
        });
        egui::TopBottomPanel::bottom("palette").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.add_enabled_ui(enabled, |ui| {
                if let Some(index) = self.palette.show(ui) {
                    self.paint_clicked(index);
                }
            });
            ui.add_space(4.0);
        });
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.show_canvas(ui));

        self.show_dialog(ctx);
        self.toasts.show(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::palette::COLOR_TAGS;
    use crate::components::toast::ToastKind;
    use crate::paint::{BrushPresets, PaintSource};
    use image::Rgba;

    fn temp_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("drawingfun-app-{}", uuid::Uuid::new_v4()))
    }

    fn app_in(gallery_dir: &std::path::Path) -> DrawingApp {
        let settings = AppSettings {
            window_width: 64.0,
            window_height: 48.0,
            gallery_dir: gallery_dir.to_string_lossy().into_owned(),
            ..AppSettings::default()
        };
        DrawingApp::with_settings(settings, 1.0)
    }

    fn toast_texts(app: &DrawingApp) -> Vec<(String, ToastKind)> {
        app.toasts.iter().map(|t| (t.text.clone(), t.kind)).collect()
    }

    #[test]
    fn starts_with_medium_brush() {
        let app = app_in(&temp_dir());
        let presets = BrushPresets::default();
        assert_eq!(app.canvas.brush_size(), presets.medium);
        assert_eq!(app.canvas.last_brush_size(), presets.medium);
        assert!(!app.canvas.is_erase());
        assert_eq!((app.canvas.width(), app.canvas.height()), (64, 48));
    }

    #[test]
    fn eraser_size_keeps_last_brush_size() {
        let mut app = app_in(&temp_dir());
        app.set_erase_size(BrushSize::Small);
        assert!(app.canvas.is_erase());
        assert_eq!(app.canvas.brush_size(), app.settings.brushes.small);
        assert_eq!(app.canvas.last_brush_size(), app.settings.brushes.medium);

        app.set_brush_size(BrushSize::Large);
        assert!(!app.canvas.is_erase());
        assert_eq!(app.canvas.brush_size(), app.settings.brushes.large);
        assert_eq!(app.canvas.last_brush_size(), app.settings.brushes.large);
    }

    #[test]
    fn palette_click_restores_drawing_state_and_switches_color() {
        let mut app = app_in(&temp_dir());
        app.set_brush_size(BrushSize::Large);
        app.set_erase_size(BrushSize::Small);
        app.set_opacity(30);

        app.paint_clicked(1);
        assert!(!app.canvas.is_erase());
        assert_eq!(app.canvas.paint_alpha_percent(), 100);
        assert_eq!(app.canvas.brush_size(), app.settings.brushes.large);
        assert_eq!(app.palette.current(), 1);
        assert_eq!(app.canvas.paint_source(), &PaintSource::Solid(Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn clicking_current_swatch_only_resets_paint_state() {
        let mut app = app_in(&temp_dir());
        app.set_opacity(30);
        app.paint_clicked(0);
        assert_eq!(app.canvas.paint_alpha_percent(), 100);
        assert_eq!(app.palette.current(), 0);
        assert_eq!(
            app.canvas.paint_source(),
            &PaintSource::Solid(crate::canvas::INITIAL_COLOR)
        );
    }

    #[test]
    fn pattern_swatch_selects_pattern_paint() {
        let mut app = app_in(&temp_dir());
        app.paint_clicked(COLOR_TAGS.len());
        assert!(matches!(app.canvas.paint_source(), PaintSource::Pattern(_)));
        assert_eq!(app.palette.current(), COLOR_TAGS.len());
    }

    #[test]
    fn opacity_dialog_reads_current_level() {
        let mut app = app_in(&temp_dir());
        app.set_opacity(40);
        assert_eq!(OpacityDialog::new(app.canvas.paint_alpha_percent()).percent, 40);
    }

    #[test]
    fn save_writes_png_and_reports_success() {
        let dir = temp_dir();
        let mut app = app_in(&dir);
        app.canvas.on_touch(TouchEvent::new(TouchAction::Down, 5.0, 5.0));
        app.canvas.on_touch(TouchEvent::new(TouchAction::Up, 40.0, 30.0));

        assert!(app.save_drawing());
        assert_eq!(toast_texts(&app), vec![(SAVED_MESSAGE.to_string(), ToastKind::Info)]);

        let files: Vec<_> = std::fs::read_dir(&dir).unwrap().flatten().collect();
        assert_eq!(files.len(), 1);
        let path = files[0].path();
        let saved = image::open(&path).unwrap().into_rgba8();
        assert_eq!(saved.dimensions(), (64, 48));

        // The Title chunk names the file it lives in
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let reader = png::Decoder::new(std::fs::File::open(&path).unwrap()).read_info().unwrap();
        let title = reader
            .info()
            .uncompressed_latin1_text
            .iter()
            .find(|t| t.keyword == "Title")
            .map(|t| t.text.clone());
        assert_eq!(title, Some(name));
        // Flattened: no transparent pixels remain
        assert!(saved.pixels().all(|p| p[3] == 255));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_failure_reports_toast() {
        let blocker = temp_dir();
        std::fs::write(&blocker, b"not a directory").unwrap();
        let mut app = app_in(&blocker);
        assert!(!app.save_drawing());
        assert_eq!(
            toast_texts(&app),
            vec![(SAVE_FAILED_MESSAGE.to_string(), ToastKind::Error)]
        );
        let _ = std::fs::remove_file(&blocker);
    }

    #[test]
    fn new_drawing_clears_canvas() {
        let mut app = app_in(&temp_dir());
        app.canvas.on_touch(TouchEvent::new(TouchAction::Down, 5.0, 5.0));
        app.canvas.on_touch(TouchEvent::new(TouchAction::Up, 40.0, 30.0));
        app.start_new();
        assert!(app.canvas.bitmap().pixels().all(|p| p[3] == 0));
        assert!(!app.canvas.can_undo());
    }

    #[test]
    fn huge_density_is_bounded_at_startup() {
        let settings = AppSettings {
            window_width: 1e9,
            window_height: f32::INFINITY,
            gallery_dir: temp_dir().to_string_lossy().into_owned(),
            ..AppSettings::default()
        };
        let app = DrawingApp::with_settings(settings, 1e5);
        assert_eq!(app.canvas.density(), crate::settings::MAX_DENSITY);
        assert!(app.canvas.width() <= INITIAL_CANVAS_LIMIT);
        assert!(app.canvas.height() <= INITIAL_CANVAS_LIMIT);
    }

    #[test]
    fn press_starts_gesture_in_canvas_pixels() {
        let event = pointer_to_touch(true, false, Some((10.0, 4.0)), None, false, 2.0);
        assert_eq!(event, Some(TouchEvent::new(TouchAction::Down, 20.0, 8.0)));
        // Press with no position yet: nothing to report
        assert_eq!(pointer_to_touch(true, false, None, None, false, 2.0), None);
    }

    #[test]
    fn drag_moves_only_when_position_changes() {
        let last = Some((20.0, 8.0));
        assert_eq!(pointer_to_touch(true, true, Some((10.0, 4.0)), last, false, 2.0), None);
        assert_eq!(
            pointer_to_touch(true, true, Some((11.0, 4.0)), last, false, 2.0),
            Some(TouchEvent::new(TouchAction::Move, 22.0, 8.0))
        );
    }

    #[test]
    fn release_ends_gesture_at_last_known_point() {
        assert_eq!(
            pointer_to_touch(false, true, Some((5.0, 5.0)), Some((1.0, 1.0)), false, 1.5),
            Some(TouchEvent::new(TouchAction::Up, 7.5, 7.5))
        );
        // Pointer left the window: fall back to the previous position
        assert_eq!(
            pointer_to_touch(false, true, None, Some((3.0, 4.0)), false, 1.5),
            Some(TouchEvent::new(TouchAction::Up, 3.0, 4.0))
        );
        // Idle hover is ignored
        assert_eq!(pointer_to_touch(false, false, Some((5.0, 5.0)), None, false, 1.0), None);
    }

    #[test]
    fn touch_cancel_ends_open_gesture_only() {
        assert_eq!(
            pointer_to_touch(true, true, Some((9.0, 9.0)), Some((3.0, 4.0)), true, 2.0),
            Some(TouchEvent::new(TouchAction::Cancel, 3.0, 4.0))
        );
        // No gesture open: a cancel is just an ordinary frame
        assert_eq!(
            pointer_to_touch(true, false, Some((1.0, 1.0)), None, true, 1.0),
            Some(TouchEvent::new(TouchAction::Down, 1.0, 1.0))
        );
    }
}
