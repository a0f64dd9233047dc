//! Thumbnail handling for the preview panel.
//!
//! yt-dlp writes `thumbnail.<ext>` (usually WebP) next to the app. It is
//! converted to `thumbnail.png`, the original is deleted, and the PNG is
//! decoded for egui.

use std::fs;
use std::path::{Path, PathBuf};

use eframe::egui::ColorImage;
use image::ImageFormat;
use tracing::debug;

use crate::error::Result;

pub const THUMBNAIL_STEM: &str = "thumbnail";
const PNG_NAME: &str = "thumbnail.png";
/// Formats yt-dlp may write that get converted
const SOURCE_EXTENSIONS: &[&str] = &["webp", "jpg", "jpeg"];

/// Output template handed to yt-dlp so the thumbnail lands in `dir`.
pub fn output_template(dir: &Path) -> String {
    dir.join(format!("{THUMBNAIL_STEM}.%(ext)s")).display().to_string()
}

/// Removes thumbnails left over from a previous preview.
pub fn clear_thumbnails(dir: &Path) -> Result<()> {
    for ext in SOURCE_EXTENSIONS.iter().chain(&["png"]) {
        let path = dir.join(format!("{THUMBNAIL_STEM}.{ext}"));
        if path.exists() {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Produces `thumbnail.png` in `dir` and decodes it.
///
/// Uses the file yt-dlp wrote if there is one, otherwise downloads
/// `fallback_url`. Blocks; call from a blocking task.
pub fn prepare_thumbnail(dir: &Path, fallback_url: Option<&str>) -> Result<Option<ColorImage>> {
    let png = dir.join(PNG_NAME);

    if let Some(source) = find_source(dir) {
        convert_to_png(&source, &png)?;
    } else if !png.exists() {
        let Some(url) = fallback_url else {
            return Ok(None);
        };
        fetch_to_png(url, &png)?;
    }

    load_color_image(&png).map(Some)
}

fn find_source(dir: &Path) -> Option<PathBuf> {
    SOURCE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{THUMBNAIL_STEM}.{ext}")))
        .find(|p| p.is_file())
}

fn convert_to_png(source: &Path, png: &Path) -> Result<()> {
    debug!("converting {} to {}", source.display(), png.display());
    image::open(source)?.save_with_format(png, ImageFormat::Png)?;
    fs::remove_file(source)?;
    Ok(())
}

fn fetch_to_png(url: &str, png: &Path) -> Result<()> {
    debug!("fetching thumbnail from {url}");
    let bytes = reqwest::blocking::get(url)?.error_for_status()?.bytes()?;
    image::load_from_memory(&bytes)?.save_with_format(png, ImageFormat::Png)?;
    Ok(())
}

fn load_color_image(path: &Path) -> Result<ColorImage> {
    let img = image::open(path)?.to_rgba8();
    let size = [img.width() as usize, img.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, img.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    #[test]
    fn converts_jpeg_and_removes_source() {
        let dir = tempdir().unwrap();
        let jpg = dir.path().join("thumbnail.jpg");
        RgbImage::from_pixel(4, 3, Rgb([200, 10, 10])).save(&jpg).unwrap();

        let img = prepare_thumbnail(dir.path(), None).unwrap().expect("thumbnail");
        assert_eq!(img.size, [4, 3]);
        assert!(!jpg.exists());
        assert!(dir.path().join("thumbnail.png").is_file());
    }

    #[test]
    fn nothing_to_show_without_file_or_url() {
        let dir = tempdir().unwrap();
        assert!(prepare_thumbnail(dir.path(), None).unwrap().is_none());
    }

    #[test]
    fn corrupt_source_is_a_conversion_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("thumbnail.webp"), b"not an image").unwrap();
        let err = prepare_thumbnail(dir.path(), None).unwrap_err();
        assert!(matches!(err, crate::error::AppError::Conversion(_)), "{err}");
    }

    #[test]
    fn clear_removes_old_thumbnails() {
        let dir = tempdir().unwrap();
        RgbImage::new(2, 2).save(dir.path().join("thumbnail.png")).unwrap();
        fs::write(dir.path().join("thumbnail.webp"), b"x").unwrap();

        clear_thumbnails(dir.path()).unwrap();
        assert!(!dir.path().join("thumbnail.png").exists());
        assert!(!dir.path().join("thumbnail.webp").exists());
    }

    #[test]
    fn template_points_into_dir() {
        let t = output_template(Path::new("/tmp/uvd"));
        assert!(t.starts_with("/tmp/uvd"));
        assert!(t.ends_with("thumbnail.%(ext)s"));
    }
}
