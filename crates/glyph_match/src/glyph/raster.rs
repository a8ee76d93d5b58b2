use std::fmt;

use crate::source::cell::CellRect;
use crate::GlyphError;

/// Background intensity.
pub const WHITE: u8 = 0xFF;
/// Full ink intensity.
pub const BLACK: u8 = 0x00;

/// Pixels below this intensity are drawn as ink in the ASCII rendering.
const INK_THRESHOLD: u8 = 0xC0;

/// Bytes per pixel in raw source buffers; the first three are color channels.
const BYTES_PER_PIXEL: usize = 4;

/// Materialized grayscale glyph buffer.
///
/// Pixels are stored row-major in a flat buffer. Each column carries a cached
/// signature (whether it is entirely white, and how many of its pixels are
/// colored, i.e. neither white nor black) that every mutation keeps in sync.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    baseline: isize,
    pixels: Vec<u8>,
    white_columns: Vec<bool>,
    colored_counts: Vec<usize>,
}

#[derive(Clone, Copy, Debug)]
struct ColumnSignature {
    is_white: bool,
    colored: usize,
}

impl ColumnSignature {
    fn new() -> Self {
        Self { is_white: true, colored: 0 }
    }

    fn add(&mut self, pixel: u8) {
        if pixel != WHITE {
            self.is_white = false;

            if pixel != BLACK {
                self.colored += 1;
            }
        }
    }
}

impl Raster {
    /// The 0x0 sentinel standing for "no glyph here".
    pub fn empty() -> Self {
        Self::default()
    }

    /// All-white buffer ready to be populated.
    pub fn new(width: usize, height: usize, baseline: isize) -> Self {
        Self {
            width,
            height,
            baseline,
            pixels: vec![WHITE; width * height],
            white_columns: vec![true; width],
            colored_counts: vec![0; width],
        }
    }

    /// Decodes `rect` out of a raw 4-bytes-per-pixel buffer.
    ///
    /// Intensity is the integer average of the three color channels; the
    /// fourth (alpha) byte is ignored. With `clear_edges` the first row and
    /// the first column of the rectangle are forced to white.
    pub fn from_raw(
        rect: CellRect,
        bytes: &[u8],
        stride: usize,
        baseline: isize,
        clear_edges: bool,
    ) -> Result<Self, GlyphError> {
        if rect.width > 0 && rect.height > 0 {
            let needed = (rect.top + rect.height - 1) * stride
                + (rect.left + rect.width) * BYTES_PER_PIXEL;
            if needed > bytes.len() {
                return Err(GlyphError::SourceTooShort { needed, available: bytes.len() });
            }
        }

        Ok(Self::from_columns(rect.width, rect.height, baseline, |x, y| {
            if clear_edges && (x == 0 || y == 0) {
                return WHITE;
            }

            let offset = (rect.top + y) * stride + (rect.left + x) * BYTES_PER_PIXEL;
            let channels = &bytes[offset..offset + 3];
            let sum: u16 = channels.iter().map(|&channel| u16::from(channel)).sum();
            (sum / 3) as u8
        }))
    }

    /// Builds a raster column by column, computing the column signatures as
    /// the pixels are produced.
    pub(crate) fn from_columns<F>(width: usize, height: usize, baseline: isize, mut pixel: F) -> Self
    where
        F: FnMut(usize, usize) -> u8,
    {
        let mut raster = Self::new(width, height, baseline);

        for x in 0..width {
            let mut signature = ColumnSignature::new();

            for y in 0..height {
                let value = pixel(x, y);
                raster.pixels[x + y * width] = value;
                signature.add(value);
            }

            raster.white_columns[x] = signature.is_white;
            raster.colored_counts[x] = signature.colored;
        }

        raster
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row of the text baseline. Clipping can move it above the first row.
    pub fn baseline(&self) -> isize {
        self.baseline
    }

    pub fn ascent(&self) -> isize {
        self.baseline
    }

    pub fn descent(&self) -> isize {
        self.height as isize - self.baseline
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        x + y * self.width
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        let index = self.index(x, y);
        self.pixels[index] = value;
        self.refresh_column(x);
    }

    /// Resets a pixel to background.
    pub fn clear(&mut self, x: usize, y: usize) {
        self.set(x, y, WHITE);
    }

    #[inline]
    pub fn is_white(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == WHITE
    }

    pub fn is_colored(&self, x: usize, y: usize) -> bool {
        self.colored_value(x, y).is_some()
    }

    /// Intensity of the pixel if it is neither white nor black.
    pub fn colored_value(&self, x: usize, y: usize) -> Option<u8> {
        let value = self.get(x, y);
        (value != WHITE && value != BLACK).then_some(value)
    }

    /// Cached: every pixel of column `x` is white.
    pub fn is_white_column(&self, x: usize) -> bool {
        self.white_columns[x]
    }

    /// Cached: number of colored pixels in column `x`.
    pub fn colored_count(&self, x: usize) -> usize {
        self.colored_counts[x]
    }

    /// Scans column `x` for ink, bypassing the cache.
    pub(crate) fn is_blank_column(&self, x: usize) -> bool {
        (0..self.height).all(|y| self.is_white(x, y))
    }

    pub(crate) fn is_blank_row(&self, y: usize) -> bool {
        (0..self.width).all(|x| self.is_white(x, y))
    }

    fn refresh_column(&mut self, x: usize) {
        let mut signature = ColumnSignature::new();
        for y in 0..self.height {
            signature.add(self.pixels[x + y * self.width]);
        }

        self.white_columns[x] = signature.is_white;
        self.colored_counts[x] = signature.colored;
    }

    /// Copy of the leftmost `width` columns (clamped to the raster width).
    pub fn left_side(&self, width: usize) -> Raster {
        let width = width.min(self.width);
        Self::from_columns(width, self.height, self.baseline, |x, y| self.get(x, y))
    }

    /// Copy of the rightmost `width` columns (clamped to the raster width).
    pub fn right_side(&self, width: usize) -> Raster {
        let width = width.min(self.width);
        let start = self.width - width;
        Self::from_columns(width, self.height, self.baseline, |x, y| self.get(start + x, y))
    }

    /// Drops `count` leading columns, unless that would remove half the glyph
    /// or more.
    pub fn cut_left(&self, count: usize) -> Raster {
        if count == 0 || self.width <= count * 2 {
            return self.clone();
        }

        Self::from_columns(self.width - count, self.height, self.baseline, |x, y| {
            self.get(x + count, y)
        })
    }

    /// Drops `count` trailing columns, with the same guard as [`Raster::cut_left`].
    pub fn cut_right(&self, count: usize) -> Raster {
        if count == 0 || self.width <= count * 2 {
            return self.clone();
        }

        Self::from_columns(self.width - count, self.height, self.baseline, |x, y| self.get(x, y))
    }

    /// Pads with white rows so that ascent and descent both reach the
    /// target's.
    pub fn enlarge(&self, target: &Raster) -> Raster {
        if self.ascent() >= target.ascent() && self.descent() >= target.descent() {
            return self.clone();
        }

        let top = (target.ascent() - self.ascent()).max(0) as usize;
        let bottom = (target.descent() - self.descent()).max(0) as usize;
        let height = top + self.height + bottom;

        Self::from_columns(self.width, height, self.baseline + top as isize, |x, y| {
            if y >= top && y < top + self.height {
                self.get(x, y - top)
            } else {
                WHITE
            }
        })
    }

    /// ASCII art rows: `X` for ink, `.` on the baseline row, space elsewhere.
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.height).map(move |y| {
            (0..self.width)
                .map(|x| {
                    if self.get(x, y) < INK_THRESHOLD {
                        'X'
                    } else if y as isize == self.baseline {
                        '.'
                    } else {
                        ' '
                    }
                })
                .collect()
        })
    }

    pub fn debug_string(&self) -> String {
        self.rows().fold(String::new(), |mut out, row| {
            out.push_str(&row);
            out.push('\n');
            out
        })
    }
}

impl fmt::Display for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::fixtures::{raster, solid, GRAY};

    fn bgra(pixels: &[[u8; 4]]) -> Vec<u8> {
        pixels.iter().flatten().copied().collect()
    }

    #[test]
    fn new_is_white() {
        let raster = Raster::new(3, 2, 1);
        assert!(raster.pixels().iter().all(|&p| p == WHITE));
        assert!((0..3).all(|x| raster.is_white_column(x)));
        assert!((0..3).all(|x| raster.colored_count(x) == 0));
    }

    #[test]
    fn get_set_clear() {
        let mut raster = solid(2, 2, BLACK);
        assert_eq!(raster.get(0, 0), BLACK);
        assert!(!raster.is_colored(0, 0));
        assert_eq!(raster.colored_value(0, 0), None);

        raster.set(0, 0, 0x80);
        assert_eq!(raster.get(0, 0), 0x80);
        assert_eq!(raster.colored_value(0, 0), Some(0x80));
        assert_eq!(raster.colored_count(0), 1);

        raster.clear(0, 0);
        raster.clear(0, 1);
        assert!(raster.is_white(0, 0));
        assert!(raster.is_white_column(0));
        assert_eq!(raster.colored_count(0), 0);
        assert!(!raster.is_white_column(1));
    }

    #[test]
    fn from_raw_averages_channels() {
        // Two pixels per row, stride padded to 12 bytes.
        let mut bytes = bgra(&[[30, 60, 90, 0], [255, 255, 255, 255], [0, 0, 0, 0]]);
        bytes.extend(bgra(&[[0, 0, 0, 255], [10, 20, 30, 0], [0, 0, 0, 0]]));
        let rect = CellRect { left: 0, top: 0, width: 2, height: 2 };

        let raster = Raster::from_raw(rect, &bytes, 12, 1, false).unwrap();
        assert_eq!(raster.get(0, 0), 60);
        assert_eq!(raster.get(1, 0), WHITE);
        assert_eq!(raster.get(0, 1), BLACK);
        assert_eq!(raster.get(1, 1), 20);
        assert_eq!(raster.colored_count(0), 1);
        assert_eq!(raster.colored_count(1), 1);
        assert!(!raster.is_white_column(1));
    }

    #[test]
    fn from_raw_clears_edges() {
        let bytes = vec![0u8; 3 * 3 * 4];
        let rect = CellRect { left: 1, top: 1, width: 2, height: 2 };

        let raster = Raster::from_raw(rect, &bytes, 12, 1, true).unwrap();
        assert!(raster.is_white(0, 0));
        assert!(raster.is_white(1, 0));
        assert!(raster.is_white(0, 1));
        assert_eq!(raster.get(1, 1), BLACK);
        assert!(raster.is_white_column(0));
    }

    #[test]
    fn from_raw_rejects_short_buffer() {
        let bytes = vec![0u8; 15];
        let rect = CellRect { left: 0, top: 0, width: 2, height: 2 };

        let err = Raster::from_raw(rect, &bytes, 8, 1, false).unwrap_err();
        assert_eq!(err, GlyphError::SourceTooShort { needed: 16, available: 15 });
    }

    #[test]
    fn sides_keep_height_and_baseline() {
        let glyph = raster(&["X..#", "X..#", "XXXX"], 2);

        let left = glyph.left_side(1);
        assert_eq!((left.width(), left.height(), left.baseline()), (1, 3, 2));
        assert!(!left.is_white_column(0));
        assert_eq!(left.colored_count(0), 0);

        let right = glyph.right_side(2);
        assert_eq!(right.width(), 2);
        assert!(right.is_white(0, 0));
        assert_eq!(right.colored_count(1), 2);
        assert_eq!(right.get(1, 0), GRAY);
    }

    #[test]
    fn cut_guards_small_glyphs() {
        let glyph = raster(&["XX.X", "XXXX"], 1);

        assert_eq!(glyph.cut_left(0), glyph);
        assert_eq!(glyph.cut_right(0), glyph);
        assert_eq!(glyph.cut_left(2), glyph);
        assert_eq!(glyph.cut_right(3), glyph);

        let cut = glyph.cut_left(1);
        assert_eq!(cut.width(), 3);
        assert!(cut.is_white(1, 0));

        let cut = glyph.cut_right(1);
        assert_eq!(cut.width(), 3);
        assert!(cut.is_white(2, 0));
    }

    #[test]
    fn enlarge_pads_to_target() {
        let small = solid(2, 2, BLACK);
        let big = raster(&["....", "....", "....", "....", "...."], 3);

        let enlarged = small.enlarge(&big);
        assert_eq!(enlarged.height(), big.height());
        assert_eq!(enlarged.baseline(), big.baseline());
        assert_eq!(enlarged.width(), small.width());
        assert!(enlarged.is_blank_row(0));
        assert!(!enlarged.is_blank_row(2));
        assert!(!enlarged.is_blank_row(3));
        assert!(enlarged.is_blank_row(4));

        assert_eq!(big.enlarge(&small), big);
    }

    #[test]
    fn ascii_rows_mark_ink_and_baseline() {
        let glyph = raster(&["X.", "#.", ".X"], 1);
        assert_eq!(glyph.debug_string(), "X \nX.\n X\n");
        assert_eq!(glyph.to_string(), glyph.debug_string());
    }
}
