// ============================================================================
// Launch arguments — per-session overrides for the persisted settings
// ============================================================================
//
// Usage examples:
//   DrawingFun --gallery-dir ~/sketches
//   DrawingFun --width 360 --height 640 --density 2
//   DrawingFun --no-log

use std::path::PathBuf;

use clap::Parser;

use crate::settings::{clamp_density, clamp_window, AppSettings};

/// DrawingFun freehand drawing pad.
#[derive(Parser, Debug, Default)]
#[command(name = "drawingfun", about = "Freehand drawing pad with a PNG gallery")]
pub struct LaunchArgs {
    /// Directory saved drawings are written to.
    #[arg(long, value_name = "DIR")]
    pub gallery_dir: Option<PathBuf>,

    /// Initial window width in points.
    #[arg(long, value_name = "POINTS")]
    pub width: Option<f32>,

    /// Initial window height in points.
    #[arg(long, value_name = "POINTS")]
    pub height: Option<f32>,

    /// Pixels per dp used for brush sizes (default: follow the display).
    #[arg(long, value_name = "SCALE")]
    pub density: Option<f32>,

    /// Do not write the session log file.
    #[arg(long)]
    pub no_log: bool,
}

impl LaunchArgs {
    /// Apply the overrides that were given, clamped into the accepted
    /// ranges; the rest of `settings` is kept.
    pub fn apply(&self, settings: &mut AppSettings) {
        if let Some(dir) = &self.gallery_dir {
            settings.gallery_dir = dir.to_string_lossy().into_owned();
        }
        if let Some(w) = self.width {
            settings.window_width = clamp_window(w, settings.window_width);
        }
        if let Some(h) = self.height {
            settings.window_height = clamp_window(h, settings.window_height);
        }
        if let Some(d) = self.density.map(clamp_density).filter(|d| *d > 0.0) {
            settings.density = d;
        }
    }
}
