use std::path::PathBuf;

use image::Rgba;

use crate::paint::{self, BrushPresets};

/// Accepted pixels-per-dp range for an explicit density
pub const MIN_DENSITY: f32 = 0.1;
pub const MAX_DENSITY: f32 = 8.0;
/// Accepted window size range, in points
pub const MIN_WINDOW: f32 = 32.0;
pub const MAX_WINDOW: f32 = 4096.0;
/// Accepted brush preset range, in dp
pub const MIN_BRUSH: f32 = 1.0;
pub const MAX_BRUSH: f32 = 200.0;

/// Explicit density clamped into range; anything non-positive or not finite
/// means "follow the display" (0).
pub fn clamp_density(density: f32) -> f32 {
    if density.is_finite() && density > 0.0 {
        density.clamp(MIN_DENSITY, MAX_DENSITY)
    } else {
        0.0
    }
}

/// Window extent clamped into range, `fallback` when unusable.
pub fn clamp_window(points: f32, fallback: f32) -> f32 {
    if points.is_finite() && points > 0.0 {
        points.clamp(MIN_WINDOW, MAX_WINDOW)
    } else {
        fallback
    }
}

fn clamp_brush(dp: f32, fallback: f32) -> f32 {
    if dp.is_finite() && dp > 0.0 {
        dp.clamp(MIN_BRUSH, MAX_BRUSH)
    } else {
        fallback
    }
}

/// Application settings that persist across sessions
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Initial window inner size in points
    pub window_width: f32,
    pub window_height: f32,
    /// Pixels per dp.  `0.0` = follow the display's pixels-per-point.
    pub density: f32,
    /// Brush size presets in dp
    pub brushes: BrushPresets,
    /// Background the drawing is flattened onto when saved
    pub background: Rgba<u8>,
    /// Gallery directory.  Empty = platform default.
    pub gallery_dir: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            window_width: 480.0,
            window_height: 800.0,
            density: 0.0,
            brushes: BrushPresets::default(),
            background: Rgba([255, 255, 255, 255]),
            gallery_dir: String::new(),
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/drawingfun/drawingfun_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\DrawingFun\drawingfun_settings.cfg
    /// On macOS:   ~/Library/Application Support/DrawingFun/drawingfun_settings.cfg
    pub(crate) fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("drawingfun");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("drawingfun_settings.cfg"));
        }
        #[cfg(not(target_os = "linux"))]
        {
            let config_dir = data_dir().join("DrawingFun");
            let _ = std::fs::create_dir_all(&config_dir);
            Some(config_dir.join("drawingfun_settings.cfg"))
        }
    }

    /// Effective density given the display's pixels-per-point.
    pub fn density_or(&self, pixels_per_point: f32) -> f32 {
        let explicit = clamp_density(self.density);
        if explicit > 0.0 {
            return explicit;
        }
        let display = clamp_density(pixels_per_point);
        if display > 0.0 { display } else { 1.0 }
    }

    /// Serialize to the `key=value` settings format.
    pub fn to_config_string(&self) -> String {
        format!(
            "window_width={}\n\
             window_height={}\n\
             density={}\n\
             small_brush={}\n\
             medium_brush={}\n\
             large_brush={}\n\
             background={}\n\
             gallery_dir={}\n",
            self.window_width,
            self.window_height,
            self.density,
            self.brushes.small,
            self.brushes.medium,
            self.brushes.large,
            paint::format_color(self.background),
            self.gallery_dir,
        )
    }

    /// Parse the settings format.  Unknown keys are skipped and malformed
    /// values keep their defaults.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "window_width" => {
                    s.window_width = clamp_window(val.parse().unwrap_or(s.window_width), s.window_width);
                }
                "window_height" => {
                    s.window_height = clamp_window(val.parse().unwrap_or(s.window_height), s.window_height);
                }
                "density" => {
                    s.density = clamp_density(val.parse().unwrap_or(0.0));
                }
                "small_brush" => {
                    s.brushes.small = clamp_brush(val.parse().unwrap_or(s.brushes.small), s.brushes.small);
                }
                "medium_brush" => {
                    s.brushes.medium = clamp_brush(val.parse().unwrap_or(s.brushes.medium), s.brushes.medium);
                }
                "large_brush" => {
                    s.brushes.large = clamp_brush(val.parse().unwrap_or(s.brushes.large), s.brushes.large);
                }
                "background" => {
                    if let Ok(c) = paint::parse_color(val) {
                        s.background = c;
                    }
                }
                "gallery_dir" => {
                    s.gallery_dir = val.to_string();
                }
                _ => {}
            }
        }
        s
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = std::fs::write(&path, self.to_config_string()) {
            crate::log_warn!("Failed to write settings {}: {}", path.display(), e);
        }
    }

    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        let Ok(content) = std::fs::read_to_string(&path) else { return Self::default() };
        Self::parse(&content)
    }
}

/// Platform data directory (without the app sub-folder).
pub(crate) fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_known_keys() {
        let s = AppSettings::parse(
            "density=2\nsmall_brush=5\nlarge_brush=40\nbackground=#FF000000\ngallery_dir=/tmp/pics\n",
        );
        assert_eq!(s.density, 2.0);
        assert_eq!(s.brushes.small, 5.0);
        assert_eq!(s.brushes.medium, BrushPresets::default().medium);
        assert_eq!(s.brushes.large, 40.0);
        assert_eq!(s.background, Rgba([0, 0, 0, 255]));
        assert_eq!(s.gallery_dir, "/tmp/pics");
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let s = AppSettings::parse("window_width=wide\nbackground=blue\nnot a line\nmystery=1\n");
        assert_eq!(s, AppSettings::default());
    }

    #[test]
    fn config_string_parses_back() {
        let mut s = AppSettings::default();
        s.density = 1.5;
        s.brushes.medium = 24.0;
        s.background = Rgba([10, 20, 30, 255]);
        s.gallery_dir = "gallery".to_string();
        assert_eq!(AppSettings::parse(&s.to_config_string()), s);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let s = AppSettings::parse(
            "density=100000\nwindow_width=inf\nwindow_height=1e9\nlarge_brush=NaN\nsmall_brush=0.01\n",
        );
        assert_eq!(s.density, MAX_DENSITY);
        assert_eq!(s.window_width, AppSettings::default().window_width);
        assert_eq!(s.window_height, MAX_WINDOW);
        assert_eq!(s.brushes.large, BrushPresets::default().large);
        assert_eq!(s.brushes.small, MIN_BRUSH);

        assert_eq!(AppSettings::parse("density=-3\n").density, 0.0);
        assert_eq!(AppSettings::parse("density=inf\n").density, 0.0);
    }

    #[test]
    fn density_or_stays_in_range() {
        let s = AppSettings {
            density: 1e5,
            ..AppSettings::default()
        };
        assert_eq!(s.density_or(1.0), MAX_DENSITY);
        assert_eq!(AppSettings::default().density_or(f32::NAN), 1.0);
        assert_eq!(AppSettings::default().density_or(50.0), MAX_DENSITY);
    }

    #[test]
    fn density_zero_follows_display() {
        let mut s = AppSettings::default();
        assert_eq!(s.density_or(2.0), 2.0);
        s.density = 3.0;
        assert_eq!(s.density_or(2.0), 3.0);
    }
}
