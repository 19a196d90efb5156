use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eframe::egui::{ColorImage, Rect};
use image::RgbaImage;

// ---------------------------------------------------------------------------
// PNG export of the chart area
// ---------------------------------------------------------------------------

/// Append `.png` unless the path already ends in it.
pub fn with_png_extension(path: PathBuf) -> PathBuf {
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if is_png {
        path
    } else {
        path.with_extension("png")
    }
}

/// Convert an egui screenshot into an `image` buffer.
pub fn to_rgba_image(image: &ColorImage) -> Result<RgbaImage> {
    let [w, h] = image.size;
    let bytes: Vec<u8> = image
        .pixels
        .iter()
        .flat_map(|p| p.to_srgba_unmultiplied())
        .collect();
    RgbaImage::from_raw(w as u32, h as u32, bytes).context("screenshot buffer has the wrong size")
}

/// Write the part of a viewport screenshot covered by `chart_rect` (in
/// points) as a PNG. Without a rect the whole screenshot is written.
pub fn save_chart_png(
    screenshot: &ColorImage,
    chart_rect: Option<Rect>,
    pixels_per_point: f32,
    path: &Path,
) -> Result<()> {
    let cropped = match chart_rect {
        Some(rect) => screenshot.region(&rect, Some(pixels_per_point)),
        None => screenshot.clone(),
    };
    to_rgba_image(&cropped)?
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!(
        "Saved {}×{} chart image to {}",
        cropped.size[0],
        cropped.size[1],
        path.display()
    );
    Ok(())
}
