mod glyph;
mod matcher;
mod source;

pub use glyph::{
    clip::{ClipBounds, Clipped},
    lazy::GlyphImage,
    raster::{Raster, BLACK, WHITE},
};
pub use matcher::{distance::HorizontalDistance, edge::LeftMatch, GlyphMatcher};
pub use source::{
    cell::{BitmapCellSource, CellBytes, CellRect, SourceBinding},
    sheet::{FontSheet, SheetError, SheetLayout},
};

/// Largest difference tolerated between two corresponding pixels.
pub const DEFAULT_MAX_PIXEL_DIFF: u32 = 5;

/// Running difference total tolerated by exact and left-anchored matching.
pub const DEFAULT_MAX_TOTAL_DIFF: u32 = 5;

/// Share of the compared area that right-anchored and diagonal matching may
/// spend on accumulated pixel differences.
pub const DEFAULT_MAX_DIFF_RATIO: f64 = 0.2;

/// Mismatching pixels diagonal matching may absorb outside its hard zone.
pub const DEFAULT_MAX_SOFT_TAKEN_PIXELS: usize = 14;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GlyphError {
    #[error("source buffer holds {available} bytes but the cell needs {needed}")]
    SourceTooShort { needed: usize, available: usize },
    #[error("failed to decode cell ({column}, {row}): {reason}")]
    Decode { column: usize, row: usize, reason: String },
    #[error("cell ({column}, {row}) is outside the {columns}x{rows} sheet")]
    CellOutOfRange { column: usize, row: usize, columns: usize, rows: usize },
    #[error("glyph image of {width}x{height} pixels is not clipped")]
    NotClipped { width: usize, height: usize },
    #[error("compatibility test width {test_width} exceeds glyph width {width}")]
    TestWidthOutOfRange { test_width: usize, width: usize },
    #[error("replacement glyph is {width} pixels wide, target is only {target_width}")]
    ReplaceTooWide { width: usize, target_width: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchConfig {
    /// Largest difference tolerated between two corresponding pixels.
    pub max_pixel_diff: u32,
    /// Running difference total for exact and left-anchored matching.
    pub max_total_diff: u32,
    /// Area-proportional tolerance for right-anchored and diagonal matching.
    pub max_diff_ratio: f64,
    /// Budget of mismatching pixels in the soft zone of a diagonal match.
    pub max_soft_taken_pixels: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_pixel_diff: DEFAULT_MAX_PIXEL_DIFF,
            max_total_diff: DEFAULT_MAX_TOTAL_DIFF,
            max_diff_ratio: DEFAULT_MAX_DIFF_RATIO,
            max_soft_taken_pixels: DEFAULT_MAX_SOFT_TAKEN_PIXELS,
        }
    }
}

impl MatchConfig {
    /// Difference total allowed over a `width` x `height` comparison frame.
    pub fn area_tolerance(&self, width: usize, height: usize) -> u32 {
        ((width * height) as f64 * self.max_diff_ratio) as u32
    }
}
