// ============================================================================
// GALLERY — the image store saved drawings are exported to
// ============================================================================

use std::fmt;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use uuid::Uuid;

/// Error type for gallery writes
#[derive(Debug)]
pub enum GalleryError {
    Io(std::io::Error),
    Encode(String),
}

impl fmt::Display for GalleryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GalleryError::Io(e) => write!(f, "I/O error: {}", e),
            GalleryError::Encode(e) => write!(f, "PNG encode error: {}", e),
        }
    }
}

impl std::error::Error for GalleryError {}

impl From<std::io::Error> for GalleryError {
    fn from(e: std::io::Error) -> Self {
        GalleryError::Io(e)
    }
}

impl From<png::EncodingError> for GalleryError {
    fn from(e: png::EncodingError) -> Self {
        GalleryError::Encode(e.to_string())
    }
}

/// `<uuid-v4>.png`
pub fn unique_png_name() -> String {
    format!("{}.png", Uuid::new_v4())
}

/// Default gallery location: `~/Pictures/DrawingFun` (XDG_PICTURES_DIR respected).
pub fn default_dir() -> PathBuf {
    if let Ok(pictures) = std::env::var("XDG_PICTURES_DIR") {
        return PathBuf::from(pictures).join("DrawingFun");
    }
    #[cfg(target_os = "windows")]
    {
        if let Ok(profile) = std::env::var("USERPROFILE") {
            return PathBuf::from(profile).join("Pictures").join("DrawingFun");
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join("Pictures").join("DrawingFun");
    }
    crate::settings::data_dir().join("DrawingFun").join("gallery")
}

pub struct Gallery {
    dir: PathBuf,
}

impl Gallery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Gallery at the configured directory, or the platform default when empty.
    pub fn from_setting(dir: &str) -> Self {
        if dir.trim().is_empty() {
            Self::new(default_dir())
        } else {
            Self::new(dir.trim())
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store `image` as a PNG carrying `title` and `description` text
    /// chunks.  A title that is a plain `*.png` file name not yet in the
    /// gallery names the file; otherwise a fresh `<uuid>.png` is used.
    /// Returns the written path.
    pub fn insert_image(
        &self,
        image: &RgbaImage,
        title: &str,
        description: &str,
    ) -> Result<PathBuf, GalleryError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.file_for(title);
        write_png(image, &path, title, description)?;
        crate::log_info!("Saved drawing {} ({}x{})", path.display(), image.width(), image.height());
        Ok(path)
    }

    fn file_for(&self, title: &str) -> PathBuf {
        let plain = Path::new(title).file_name().is_some_and(|n| n == std::ffi::OsStr::new(title))
            && title.ends_with(".png")
            && title.len() > ".png".len();
        if plain {
            let path = self.dir.join(title);
            if !path.exists() {
                return path;
            }
        }
        self.dir.join(unique_png_name())
    }
}

/// Encode RGBA8 pixels as PNG with tEXt metadata.
fn write_png(
    image: &RgbaImage,
    path: &Path,
    title: &str,
    description: &str,
) -> Result<(), GalleryError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.add_text_chunk("Title".to_string(), title.to_string())?;
    encoder.add_text_chunk("Description".to_string(), description.to_string())?;

    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())?;
    writer.finish()?;
    Ok(())
}
