// ============================================================================
// DIALOGS — modal pickers and confirmations for the toolbar buttons
// ============================================================================
//
// At most one dialog is open at a time.  Each `show()` is called every frame
// and reports what the user did through `DialogResult`.

use eframe::egui;
use egui::{Color32, Pos2, Rect, Rounding, Sense, Vec2};

use crate::paint::BrushSize;

#[derive(Default)]
pub enum ActiveDialog {
    #[default]
    None,
    BrushSize(BrushSizeDialog),
    New(ConfirmDialog),
    Save(ConfirmDialog),
    Opacity(OpacityDialog),
}

impl ActiveDialog {
    /// Returns true if no dialog is currently open.
    pub fn is_none(&self) -> bool {
        matches!(self, ActiveDialog::None)
    }
}

/// Result returned by each dialog's `show()` method every frame.
#[derive(Debug, PartialEq)]
pub enum DialogResult<T> {
    /// Still open, nothing to do this frame.
    Open,
    /// User confirmed with this value.
    Ok(T),
    /// User dismissed the dialog.
    Cancel,
}

// ============================================================================
// SHARED DIALOG STYLING HELPERS
// ============================================================================

/// Colors extracted from the current egui visuals for dialog rendering.
pub(crate) struct DialogColors {
    pub accent: Color32,
    pub accent_faint: Color32,
    pub text_muted: Color32,
}

impl DialogColors {
    pub(crate) fn from_ctx(ctx: &egui::Context) -> Self {
        let v = ctx.style().visuals.clone();
        let accent = v.selection.stroke.color;
        let faint_alpha = if v.dark_mode { 35 } else { 25 };
        Self {
            accent,
            accent_faint: Color32::from_rgba_unmultiplied(
                accent.r(),
                accent.g(),
                accent.b(),
                faint_alpha,
            ),
            text_muted: if v.dark_mode {
                Color32::from_gray(160)
            } else {
                v.weak_text_color()
            },
        }
    }
}

/// Paint the accent header bar with icon + title.
pub(crate) fn paint_dialog_header(ui: &mut egui::Ui, colors: &DialogColors, icon: &str, title: &str) {
    let header_height = 32.0;
    let (rect, _) = ui.allocate_exact_size(
        Vec2::new(ui.available_width(), header_height),
        Sense::hover(),
    );

    let painter = ui.painter();
    painter.rect_filled(rect, Rounding::ZERO, colors.accent_faint);
    painter.rect_filled(
        Rect::from_min_size(rect.min, Vec2::new(3.0, header_height)),
        Rounding::ZERO,
        colors.accent,
    );
    painter.text(
        Pos2::new(rect.min.x + 12.0, rect.center().y),
        egui::Align2::LEFT_CENTER,
        format!("{} {}", icon, title),
        egui::FontId::proportional(14.0),
        colors.accent,
    );
}

/// Thin separator line using accent color (very faint).
pub(crate) fn accent_separator(ui: &mut egui::Ui, colors: &DialogColors) {
    let (rect, _) = ui.allocate_exact_size(Vec2::new(ui.available_width(), 1.0), Sense::hover());
    ui.painter().rect_filled(rect, 0.0, colors.accent_faint);
}

/// Styled confirm / cancel footer. Returns (ok_clicked, cancel_clicked).
pub(crate) fn dialog_footer(ui: &mut egui::Ui, colors: &DialogColors, ok_label: &str) -> (bool, bool) {
    let mut ok = false;
    let mut cancel = false;
    ui.add_space(4.0);
    accent_separator(ui, colors);
    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Cancel").clicked() {
                cancel = true;
            }
            let ok_btn = egui::Button::new(
                egui::RichText::new(format!("  {}  ", ok_label))
                    .color(Color32::WHITE)
                    .strong(),
            )
            .fill(colors.accent);
            if ui.add(ok_btn).clicked() {
                ok = true;
            }
        });
    });
    (ok, cancel)
}

fn dialog_window(id: &str) -> egui::Window<'static> {
    egui::Window::new(id.to_owned())
        .title_bar(false)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
}

fn escape_pressed(ctx: &egui::Context) -> bool {
    ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Escape))
}

fn enter_pressed(ctx: &egui::Context) -> bool {
    ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Enter))
}

// ============================================================================
// BRUSH / ERASER SIZE DIALOG
// ============================================================================

/// Which tool a size pick applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizePurpose {
    Draw,
    Erase,
}

pub struct BrushSizeDialog {
    pub purpose: SizePurpose,
}

impl BrushSizeDialog {
    pub fn new(purpose: SizePurpose) -> Self {
        Self { purpose }
    }

    pub fn title(&self) -> &'static str {
        match self.purpose {
            SizePurpose::Draw => "Brush size:",
            SizePurpose::Erase => "Eraser size:",
        }
    }

    /// `preview_px` gives the on-screen diameter drawn for each preset.
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        preview_px: impl Fn(BrushSize) -> f32,
    ) -> DialogResult<BrushSize> {
        let mut result = DialogResult::Open;
        if escape_pressed(ctx) {
            return DialogResult::Cancel;
        }
        let colors = DialogColors::from_ctx(ctx);
        let icon = match self.purpose {
            SizePurpose::Draw => "\u{1F58C}",
            SizePurpose::Erase => "\u{1F9F9}",
        };

        dialog_window("brush_size_dialog").show(ctx, |ui| {
            ui.set_min_width(260.0);
            paint_dialog_header(ui, &colors, icon, self.title());
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                for &size in BrushSize::all() {
                    let diameter = preview_px(size).clamp(2.0, 48.0);
                    let (rect, response) =
                        ui.allocate_exact_size(Vec2::splat(64.0), Sense::click());
                    let fill = if response.hovered() {
                        colors.accent_faint
                    } else {
                        Color32::TRANSPARENT
                    };
                    ui.painter().rect_filled(rect, Rounding::same(4.0), fill);
                    ui.painter().circle_filled(
                        rect.center() - Vec2::new(0.0, 6.0),
                        diameter / 2.0,
                        ui.visuals().text_color(),
                    );
                    ui.painter().text(
                        Pos2::new(rect.center().x, rect.max.y - 6.0),
                        egui::Align2::CENTER_BOTTOM,
                        size.label(),
                        egui::FontId::proportional(11.0),
                        colors.text_muted,
                    );
                    if response.clicked() {
                        result = DialogResult::Ok(size);
                    }
                }
            });

            ui.add_space(4.0);
            accent_separator(ui, &colors);
            ui.add_space(4.0);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Cancel").clicked() {
                    result = DialogResult::Cancel;
                }
            });
        });
        result
    }
}

// ============================================================================
// CONFIRMATION DIALOG (new drawing / save drawing)
// ============================================================================

pub struct ConfirmDialog {
    pub icon: &'static str,
    pub title: &'static str,
    pub message: &'static str,
}

impl ConfirmDialog {
    pub fn new_drawing() -> Self {
        Self {
            icon: "\u{1F4C4}",
            title: "New drawing",
            message: "Start new drawing (you will lose the current drawing)?",
        }
    }

    pub fn save_drawing() -> Self {
        Self {
            icon: "\u{1F4BE}",
            title: "Save drawing",
            message: "Save drawing to device Gallery?",
        }
    }

    pub fn show(&mut self, ctx: &egui::Context) -> DialogResult<()> {
        if escape_pressed(ctx) {
            return DialogResult::Cancel;
        }
        if enter_pressed(ctx) {
            return DialogResult::Ok(());
        }
        let mut result = DialogResult::Open;
        let colors = DialogColors::from_ctx(ctx);

        dialog_window("confirm_dialog").show(ctx, |ui| {
            ui.set_min_width(320.0);
            paint_dialog_header(ui, &colors, self.icon, self.title);
            ui.add_space(8.0);
            ui.label(self.message);
            let (ok, cancel) = dialog_footer(ui, &colors, "Yes");
            if ok {
                result = DialogResult::Ok(());
            }
            if cancel {
                result = DialogResult::Cancel;
            }
        });
        result
    }
}

// ============================================================================
// OPACITY DIALOG
// ============================================================================

pub struct OpacityDialog {
    /// Slider position, 0–100
    pub percent: u8,
}

impl OpacityDialog {
    /// Open with the slider at the canvas's current opacity.
    pub fn new(current_percent: u8) -> Self {
        Self {
            percent: current_percent.min(100),
        }
    }

    /// Text shown next to the slider.
    pub fn percent_label(&self) -> String {
        format!("{}%", self.percent)
    }

    pub fn show(&mut self, ctx: &egui::Context) -> DialogResult<u8> {
        if escape_pressed(ctx) {
            return DialogResult::Cancel;
        }
        if enter_pressed(ctx) {
            return DialogResult::Ok(self.percent);
        }
        let mut result = DialogResult::Open;
        let colors = DialogColors::from_ctx(ctx);

        dialog_window("opacity_dialog").show(ctx, |ui| {
            ui.set_min_width(300.0);
            paint_dialog_header(ui, &colors, "\u{25D0}", "Opacity level:");
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.add(
                    egui::Slider::new(&mut self.percent, 0..=100)
                        .show_value(false)
                        .step_by(1.0),
                );
                ui.label(egui::RichText::new(self.percent_label()).strong());
            });
            let (ok, cancel) = dialog_footer(ui, &colors, "OK");
            if ok {
                result = DialogResult::Ok(self.percent);
            }
            if cancel {
                result = DialogResult::Cancel;
            }
        });
        result
    }
}
