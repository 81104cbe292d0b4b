use std::collections::HashMap;

use eframe::egui;
use egui::{Color32, ColorImage, Rect, Rounding, Sense, Stroke, TextureHandle, TextureOptions, Vec2};

use crate::paint::{self, PATTERN_NAMES};

/// Solid swatches, in palette order.  The first one matches the canvas's
/// initial color.
pub const COLOR_TAGS: &[&str] = &[
    "#FF660000", "#FFFF0000", "#FFFF6600", "#FFFFCC00", "#FF009900", "#FF009999",
    "#FF0000FF", "#FF990099", "#FFFF6666", "#FFFFFFFF", "#FF787878", "#FF000000",
];

const SWATCH_SIZE: f32 = 30.0;

/// Row of color and pattern swatches; one of them is "pressed".
pub struct Palette {
    tags: Vec<&'static str>,
    current: usize,
    pattern_textures: HashMap<&'static str, TextureHandle>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            tags: COLOR_TAGS.iter().chain(PATTERN_NAMES).copied().collect(),
            current: 0,
            pattern_textures: HashMap::new(),
        }
    }
}

impl Palette {
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tag(&self, index: usize) -> Option<&'static str> {
        self.tags.get(index).copied()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn set_current(&mut self, index: usize) {
        if index < self.tags.len() {
            self.current = index;
        }
    }

    /// Draw the swatches; returns the index clicked this frame.
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<usize> {
        let mut clicked = None;
        let accent = ui.visuals().selection.stroke.color;
        let outline = ui.visuals().widgets.noninteractive.bg_stroke.color;

        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing = Vec2::splat(4.0);
            for index in 0..self.tags.len() {
                let tag = self.tags[index];
                let (rect, response) =
                    ui.allocate_exact_size(Vec2::splat(SWATCH_SIZE), Sense::click());
                let inner = rect.shrink(3.0);

                if let Ok(c) = paint::parse_color(tag) {
                    ui.painter().rect_filled(
                        inner,
                        Rounding::same(4.0),
                        Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3]),
                    );
                } else if let Some(tex) = self.pattern_texture(ui.ctx(), tag) {
                    ui.painter().image(
                        tex.id(),
                        inner,
                        Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }

                let stroke = if index == self.current {
                    Stroke::new(3.0, accent)
                } else {
                    Stroke::new(1.0, outline)
                };
                ui.painter().rect_stroke(inner, Rounding::same(4.0), stroke);

                if response.on_hover_text(tag).clicked() {
                    clicked = Some(index);
                }
            }
        });
        clicked
    }

    fn pattern_texture(&mut self, ctx: &egui::Context, tag: &'static str) -> Option<&TextureHandle> {
        if !self.pattern_textures.contains_key(tag) {
            let tile = paint::pattern_tile(tag)?;
            let image = ColorImage::from_rgba_unmultiplied(
                [tile.width() as usize, tile.height() as usize],
                tile.as_raw(),
            );
            let handle = ctx.load_texture(format!("pattern_{}", tag), image, TextureOptions::NEAREST);
            self.pattern_textures.insert(tag, handle);
        }
        self.pattern_textures.get(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_lists_colors_then_patterns() {
        let p = Palette::default();
        assert_eq!(p.len(), COLOR_TAGS.len() + PATTERN_NAMES.len());
        assert_eq!(p.tag(0), Some("#FF660000"));
        assert_eq!(p.tag(COLOR_TAGS.len()), Some("pattern1"));
        assert_eq!(p.tag(p.len()), None);
        assert_eq!(p.current(), 0);
    }

    #[test]
    fn every_swatch_resolves_to_a_paint() {
        let p = Palette::default();
        for i in 0..p.len() {
            let tag = p.tag(i).unwrap();
            assert!(paint::PaintSource::from_tag(tag).is_ok(), "{tag}");
        }
    }

    #[test]
    fn set_current_ignores_out_of_range() {
        let mut p = Palette::default();
        p.set_current(3);
        p.set_current(999);
        assert_eq!(p.current(), 3);
    }
}
