//! Interleaved 8-bit RGB/RGBA images: a borrowed view and an owned buffer.
//!
//! The pipeline only ever reads pixels; crops are copied into a fresh
//! [`RgbaBuffer`] so the source view is never touched.
use crate::error::{SplitError, SplitResult};

/// Borrowed view over an interleaved RGB or RGBA buffer.
#[derive(Clone, Copy, Debug)]
pub struct ImageRgba<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize, // bytes between rows
    pub channels: usize,
    pub data: &'a [u8],
}

impl<'a> ImageRgba<'a> {
    /// Tightly packed view (`stride == w * channels`), validated.
    pub fn new(w: usize, h: usize, channels: usize, data: &'a [u8]) -> SplitResult<Self> {
        let view = Self {
            w,
            h,
            stride: w * channels,
            channels,
            data,
        };
        view.validate()?;
        Ok(view)
    }

    /// Check that the geometry is non-empty and the buffer covers it.
    pub fn validate(&self) -> SplitResult<()> {
        if self.w == 0 || self.h == 0 {
            return Err(SplitError::InvalidImage(format!(
                "zero-sized image {}x{}",
                self.w, self.h
            )));
        }
        if self.channels != 3 && self.channels != 4 {
            return Err(SplitError::InvalidImage(format!(
                "expected 3 or 4 channels, got {}",
                self.channels
            )));
        }
        let row_bytes = self.w * self.channels;
        if self.stride < row_bytes {
            return Err(SplitError::InvalidImage(format!(
                "stride {} shorter than row of {} bytes",
                self.stride, row_bytes
            )));
        }
        let required = (self.h - 1) * self.stride + row_bytes;
        if self.data.len() < required {
            return Err(SplitError::InvalidImage(format!(
                "buffer holds {} bytes, {}x{}x{} needs {}",
                self.data.len(),
                self.w,
                self.h,
                self.channels,
                required
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.w
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.h
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.w * self.h
    }

    /// Interleaved bytes of row `y` (alpha included when present).
    #[inline]
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w * self.channels]
    }

    /// Red, green and blue of the pixel at (x, y); alpha is ignored.
    #[inline]
    pub fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        let i = y * self.stride + x * self.channels;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Copy rows `[start, end)` at full width into an owned buffer.
    pub fn crop_rows(&self, start: usize, end: usize) -> RgbaBuffer {
        let end = end.min(self.h);
        let start = start.min(end);
        let row_bytes = self.w * self.channels;
        let mut data = Vec::with_capacity((end - start) * row_bytes);
        for y in start..end {
            data.extend_from_slice(self.row(y));
        }
        RgbaBuffer {
            width: self.w,
            height: end - start,
            channels: self.channels,
            data,
        }
    }
}

/// Owned, tightly packed RGB/RGBA buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaBuffer {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl RgbaBuffer {
    /// Wrap raw interleaved bytes, checking the length against the geometry.
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<u8>) -> SplitResult<Self> {
        ImageRgba::new(width, height, channels, &data)?;
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Interleaved channels per pixel (3 or 4)
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Borrow as a read-only `ImageRgba` view
    pub fn as_view(&self) -> ImageRgba<'_> {
        ImageRgba {
            w: self.width,
            h: self.height,
            stride: self.width * self.channels,
            channels: self.channels,
            data: &self.data,
        }
    }
}
