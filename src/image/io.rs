//! I/O helpers for RGBA images and JSON.
//!
//! - `load_rgba_image`: read a PNG/JPEG/etc. into an owned RGBA buffer.
//! - `encode_png`: encode a buffer as PNG bytes in memory.
//! - `save_png`: write a buffer to a PNG file.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::RgbaBuffer;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk and convert to 8-bit RGBA.
pub fn load_rgba_image(path: &Path) -> Result<RgbaBuffer, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_rgba8();
    let width = img.width() as usize;
    let height = img.height() as usize;
    RgbaBuffer::new(width, height, 4, img.into_raw())
        .map_err(|e| format!("Failed to load {}: {e}", path.display()))
}

/// Encode an RGB/RGBA buffer as PNG bytes.
pub fn encode_png(buffer: &RgbaBuffer) -> Result<Vec<u8>, String> {
    let color = match buffer.channels() {
        3 => ExtendedColorType::Rgb8,
        4 => ExtendedColorType::Rgba8,
        other => return Err(format!("Cannot encode {other}-channel buffer as PNG")),
    };
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            buffer.as_bytes(),
            buffer.width() as u32,
            buffer.height() as u32,
            color,
        )
        .map_err(|e| format!("Failed to encode PNG: {e}"))?;
    Ok(out)
}

/// Save an RGB/RGBA buffer to a PNG.
pub fn save_png(buffer: &RgbaBuffer, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let bytes = encode_png(buffer)?;
    fs::write(path, bytes).map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
