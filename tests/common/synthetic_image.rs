/// A horizontal band `[start, end)` filled with one RGB colour.
#[derive(Clone, Copy, Debug)]
pub struct Band {
    pub start: usize,
    pub end: usize,
    pub rgb: [u8; 3],
}

impl Band {
    pub fn gray(start: usize, end: usize, level: u8) -> Self {
        Self {
            start,
            end,
            rgb: [level, level, level],
        }
    }
}

/// Generates an RGBA strip of `background` with the given bands painted on top.
pub fn banded_strip_rgba(width: usize, height: usize, background: [u8; 3], bands: &[Band]) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");

    let mut img = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let rgb = bands
            .iter()
            .rev()
            .find(|b| (b.start..b.end).contains(&y))
            .map_or(background, |b| b.rgb);
        for _ in 0..width {
            img.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
    }
    img
}

/// Page-like content: near-white paper with dark, colourful text lines.
pub fn text_page_rgba(width: usize, height: usize, seed: u32) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");

    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state
    };
    let mut img = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let text_line = (y / 6) % 3 == 1;
        for x in 0..width {
            let ink = text_line && (x / 4 + y) % 5 != 0;
            let rgb = if ink {
                let r = next();
                [(r & 0x3f) as u8, ((r >> 8) & 0x3f) as u8 + 40, ((r >> 16) & 0x3f) as u8 + 120]
            } else {
                [250, 248, 245]
            };
            img.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
    }
    img
}

/// Paints `bands` over an existing RGBA buffer of the given width.
pub fn paint_bands(img: &mut [u8], width: usize, bands: &[Band]) {
    let row_bytes = width * 4;
    for band in bands {
        for row in img
            .chunks_exact_mut(row_bytes)
            .skip(band.start)
            .take(band.end.saturating_sub(band.start))
        {
            for px in row.chunks_exact_mut(4) {
                px[..3].copy_from_slice(&band.rgb);
                px[3] = 255;
            }
        }
    }
}

/// Drops the alpha channel of an RGBA buffer.
pub fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]).collect()
}
