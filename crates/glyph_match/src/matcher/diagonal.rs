use log::trace;

use super::{Frame, GlyphMatcher};
use crate::glyph::lazy::GlyphImage;
use crate::glyph::raster::Raster;
use crate::GlyphError;

/// Per-pixel flags over the comparison frame marking where `first` claims the
/// pixel: soft-taken pixels may differ within a budget, hard-taken ones not
/// at all.
struct TakenZones {
    width: usize,
    soft: Vec<bool>,
    hard: Vec<bool>,
}

impl TakenZones {
    /// Each row is taken from the leftmost column up to the last ink of
    /// `first`, looking at most `perfect_width` columns in from the right. The
    /// hard zone is the soft zone pulled in by `overlap` columns.
    fn new(first: &Raster, frame: &Frame, perfect_width: usize, overlap: usize) -> Self {
        let width = frame.width;
        let mut soft = vec![false; width * frame.height];
        let mut hard = vec![false; width * frame.height];

        for y in 0..frame.height {
            let (y1, _) = frame.rows(y);
            let trailing = (0..perfect_width)
                .find(|&x| {
                    let x1 = width - x - 1;
                    x1 < first.width() && y1.is_some_and(|y1| !first.is_white(x1, y1))
                })
                .unwrap_or(perfect_width);

            for x in trailing..width {
                soft[width - x - 1 + y * width] = true;
            }

            for x in trailing..width.saturating_sub(overlap) {
                hard[width - x - overlap - 1 + y * width] = true;
            }
        }

        Self { width, soft, hard }
    }

    fn is_soft(&self, x: usize, y: usize) -> bool {
        self.soft[x + y * self.width]
    }

    fn is_hard(&self, x: usize, y: usize) -> bool {
        self.hard[x + y * self.width]
    }
}

impl GlyphMatcher {
    /// Matches `first` against the start of `second` where the two may
    /// overlap diagonally, as italic glyphs do.
    ///
    /// The trailing background of each row of `first` is left free for the
    /// neighbouring glyph. Differences in the remaining soft zone use up the
    /// soft pixel budget; differences `right_overlap_width` columns or more
    /// away from that free area fail immediately. At most
    /// `width * (1 - perfect_match_ratio)` columns are scanned for the free
    /// area.
    pub fn left_diagonal_match(
        &self,
        first: &GlyphImage,
        perfect_match_ratio: f64,
        right_overlap_width: usize,
        second: &GlyphImage,
        vertical_offset: i32,
    ) -> Result<bool, GlyphError> {
        let (first, second) = (first.raster()?, second.raster()?);
        let frame = Frame::new(first, second, vertical_offset);
        let tolerance = self.config.area_tolerance(frame.width, frame.height);
        let perfect_width = (frame.width as f64 * (1.0 - perfect_match_ratio)) as usize;
        let zones = TakenZones::new(first, &frame, perfect_width.min(frame.width), right_overlap_width);

        let mut diff = self.pixel_diff();
        let mut soft_taken = 0;

        for x in 0..frame.width {
            if x >= second.width() {
                if x < first.width() && !first.is_white_column(x) {
                    trace!("Diagonal match failed: ink in trailing column {}", x);
                    return Ok(false);
                }
                continue;
            }

            if x >= first.width() {
                continue;
            }

            for y in 0..frame.height {
                let is_different = match frame.rows(y) {
                    (Some(y1), Some(y2)) => {
                        zones.is_soft(x, y)
                            && (!diff.accumulate(first.get(x, y1), second.get(x, y2))
                                || diff.total > tolerance)
                    },
                    (y1, y2) => {
                        y1.is_some_and(|y1| !first.is_white(x, y1))
                            || (zones.is_soft(x, y) && y2.is_some_and(|y2| !second.is_white(x, y2)))
                    },
                };

                if !is_different {
                    continue;
                }

                if zones.is_hard(x, y) || soft_taken >= self.config.max_soft_taken_pixels {
                    trace!("Diagonal match failed at ({}, {}) after {} soft pixels", x, y, soft_taken);
                    return Ok(false);
                }

                soft_taken += 1;
            }
        }

        Ok(true)
    }
}
