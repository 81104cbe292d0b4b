use std::collections::VecDeque;

use eframe::egui;
use egui::{Color32, Rounding};

/// How long a toast stays on screen, in seconds.
pub const TOAST_SECONDS: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub text: String,
    pub kind: ToastKind,
    /// egui time the toast was first painted
    shown_at: Option<f64>,
}

/// Short-lived messages stacked at the bottom of the window.
#[derive(Default)]
pub struct Toasts {
    items: VecDeque<Toast>,
}

impl Toasts {
    pub fn info(&mut self, text: impl Into<String>) {
        self.push(text.into(), ToastKind::Info);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(text.into(), ToastKind::Error);
    }

    fn push(&mut self, text: String, kind: ToastKind) {
        self.items.push_back(Toast {
            text,
            kind,
            shown_at: None,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop toasts older than `TOAST_SECONDS` and stamp new ones with `now`.
    pub fn expire(&mut self, now: f64) {
        for toast in self.items.iter_mut() {
            toast.shown_at.get_or_insert(now);
        }
        self.items
            .retain(|t| t.shown_at.is_some_and(|at| now - at < TOAST_SECONDS));
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time);
        self.expire(now);
        if self.items.is_empty() {
            return;
        }

        egui::Area::new("toasts")
            .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -96.0])
            .interactable(false)
            .show(ctx, |ui| {
                for toast in &self.items {
                    let fill = match toast.kind {
                        ToastKind::Info => Color32::from_rgba_unmultiplied(40, 40, 40, 230),
                        ToastKind::Error => Color32::from_rgba_unmultiplied(150, 30, 30, 230),
                    };
                    egui::Frame::none()
                        .fill(fill)
                        .rounding(Rounding::same(12.0))
                        .inner_margin(egui::Margin::symmetric(14.0, 8.0))
                        .show(ui, |ui| {
                            ui.label(egui::RichText::new(&toast.text).color(Color32::WHITE));
                        });
                    ui.add_space(4.0);
                }
            });
        // Keep repainting so toasts disappear without further input
        ctx.request_repaint_after(std::time::Duration::from_millis(250));
    }
}
