//! Native 16-bit framebuffer to 32-bit ARGB presentation conversion.
//!
//! Channels are widened with multiply-and-shift so that the result equals
//! `round(c * 255 / max)`: full intensity lands on exactly 0xFF and the
//! ramp has no banding steps that bit replication would introduce.

use crate::core::PresentationSurface;

/// Alpha byte of every converted pixel.
pub const OPAQUE: u32 = 0xFF00_0000;

/// Pixel layout of the emulation core's framebuffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NativeFormat {
    /// `RRRRRGGG GGGBBBBB`
    #[default]
    Rgb565,
    /// `xRRRRRGG GGGBBBBB`, top bit ignored.
    Rgb555,
}

/// What happens to presentation pixels outside the native rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MarginPolicy {
    /// Leave whatever the surface held before.
    #[default]
    Keep,
    /// Fill with opaque black.
    Clear,
}

#[inline(always)]
fn widen5(c: u32) -> u32 {
    (c * 527 + 23) >> 6
}

#[inline(always)]
fn widen6(c: u32) -> u32 {
    (c * 259 + 33) >> 6
}

#[inline]
pub fn rgb565_to_argb(pixel: u16) -> u32 {
    let p = pixel as u32;
    let r = widen5((p >> 11) & 0x1F);
    let g = widen6((p >> 5) & 0x3F);
    let b = widen5(p & 0x1F);
    OPAQUE | (r << 16) | (g << 8) | b
}

#[inline]
pub fn rgb555_to_argb(pixel: u16) -> u32 {
    let p = pixel as u32;
    let r = widen5((p >> 10) & 0x1F);
    let g = widen5((p >> 5) & 0x1F);
    let b = widen5(p & 0x1F);
    OPAQUE | (r << 16) | (g << 8) | b
}

impl NativeFormat {
    pub fn to_argb(self, pixel: u16) -> u32 {
        match self {
            NativeFormat::Rgb565 => rgb565_to_argb(pixel),
            NativeFormat::Rgb555 => rgb555_to_argb(pixel),
        }
    }
}

/// Borrowed view of the core's framebuffer. `pitch` is in pixels and may
/// exceed `width`.
pub struct NativeFrame<'a> {
    pub pixels: &'a [u16],
    pub width: usize,
    pub height: usize,
    pub pitch: usize,
}

/// Convert the rectangle where `src` and `dst` overlap. Returns the
/// converted `(width, height)`.
pub fn convert_frame(
    src: &NativeFrame<'_>,
    dst: &mut PresentationSurface<'_>,
    format: NativeFormat,
    margin: MarginPolicy,
) -> (usize, usize) {
    // Dispatch once per frame so the per-pixel loop stays branch-free.
    let size = match format {
        NativeFormat::Rgb565 => convert_rows(src, dst, rgb565_to_argb),
        NativeFormat::Rgb555 => convert_rows(src, dst, rgb555_to_argb),
    };
    if margin == MarginPolicy::Clear {
        clear_margin(dst, size);
    }
    size
}

fn convert_rows(
    src: &NativeFrame<'_>,
    dst: &mut PresentationSurface<'_>,
    convert: impl Fn(u16) -> u32,
) -> (usize, usize) {
    let width = src.width.min(dst.width);
    let height = src.height.min(dst.height);
    if width == 0 || height == 0 || src.pitch == 0 || dst.pitch == 0 {
        return (0, 0);
    }

    let mut rows = 0;
    for (src_row, dst_row) in src
        .pixels
        .chunks(src.pitch)
        .zip(dst.pixels.chunks_mut(dst.pitch))
        .take(height)
    {
        if src_row.len() < width || dst_row.len() < width {
            break;
        }
        for (out, &pixel) in dst_row[..width].iter_mut().zip(&src_row[..width]) {
            *out = convert(pixel);
        }
        rows += 1;
    }
    (width, rows)
}

fn clear_margin(dst: &mut PresentationSurface<'_>, (width, height): (usize, usize)) {
    if dst.pitch == 0 {
        return;
    }
    let visible = dst.width;
    for (y, row) in dst.pixels.chunks_mut(dst.pitch).take(dst.height).enumerate() {
        let end = visible.min(row.len());
        let start = if y < height { width.min(end) } else { 0 };
        row[start..end].fill(OPAQUE);
    }
}
