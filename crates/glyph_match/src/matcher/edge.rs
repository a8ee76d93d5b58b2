use log::trace;

use super::{Frame, GlyphMatcher, PixelDiff};
use crate::glyph::lazy::GlyphImage;
use crate::glyph::raster::Raster;
use crate::GlyphError;

/// Outcome of a left-anchored comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeftMatch {
    pub is_match: bool,
    /// First column where the accumulated difference became non-zero.
    pub first_diff_column: Option<usize>,
}

/// Which end of the glyphs the columns are counted from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Anchor {
    Left,
    Right,
}

impl Anchor {
    /// Raster column at distance `x` from the anchored edge.
    fn column(self, raster: &Raster, x: usize) -> usize {
        match self {
            Anchor::Left => x,
            Anchor::Right => raster.width() - x - 1,
        }
    }
}

struct EdgeScan<'a> {
    first: &'a Raster,
    second: &'a Raster,
    frame: Frame,
    anchor: Anchor,
    diff: PixelDiff,
    tolerance: u32,
    first_diff_column: Option<usize>,
}

impl EdgeScan<'_> {
    fn run(&mut self) -> bool {
        for x in 0..self.frame.width {
            let in_first = x < self.first.width();
            let in_second = x < self.second.width();

            let column_ok = match (in_first, in_second) {
                (true, true) => self.shared_column(x),
                (true, false) => self.first.is_white_column(self.anchor.column(self.first, x)),
                (false, true) => self.second.is_white_column(self.anchor.column(self.second, x)),
                (false, false) => true,
            };

            if !column_ok {
                trace!("{:?} match failed at column {}", self.anchor, x);
                return false;
            }
        }

        true
    }

    fn shared_column(&mut self, x: usize) -> bool {
        let x1 = self.anchor.column(self.first, x);
        let x2 = self.anchor.column(self.second, x);

        for y in 0..self.frame.height {
            match self.frame.rows(y) {
                (Some(y1), Some(y2)) => {
                    if !self.diff.accumulate(self.first.get(x1, y1), self.second.get(x2, y2))
                        || self.diff.total > self.tolerance
                    {
                        return false;
                    }

                    if self.diff.total > 0 && self.first_diff_column.is_none() {
                        self.first_diff_column = Some(x);
                    }
                },
                (y1, y2) => {
                    if y1.is_some_and(|y1| !self.first.is_white(x1, y1)) {
                        return false;
                    }

                    if y2.is_some_and(|y2| !self.second.is_white(x2, y2)) {
                        return false;
                    }
                },
            }
        }

        true
    }
}

impl GlyphMatcher {
    /// Compares the glyphs column by column from their left edges.
    ///
    /// Columns only the longer glyph has must be white, so a match means one
    /// glyph is the other with blank space appended.
    pub fn left_match(
        &self,
        first: &GlyphImage,
        second: &GlyphImage,
        vertical_offset: i32,
    ) -> Result<LeftMatch, GlyphError> {
        let (first, second) = (first.raster()?, second.raster()?);

        let mut scan = EdgeScan {
            first,
            second,
            frame: Frame::new(first, second, vertical_offset),
            anchor: Anchor::Left,
            diff: self.pixel_diff(),
            tolerance: self.config.max_total_diff,
            first_diff_column: None,
        };
        let is_match = scan.run();

        Ok(LeftMatch { is_match, first_diff_column: scan.first_diff_column })
    }

    /// Mirror of [`GlyphMatcher::left_match`] anchored at the right edges,
    /// with a tolerance proportional to the compared area.
    pub fn right_match(
        &self,
        first: &GlyphImage,
        second: &GlyphImage,
        vertical_offset: i32,
    ) -> Result<bool, GlyphError> {
        let (first, second) = (first.raster()?, second.raster()?);
        let frame = Frame::new(first, second, vertical_offset);

        let mut scan = EdgeScan {
            first,
            second,
            frame,
            anchor: Anchor::Right,
            diff: self.pixel_diff(),
            tolerance: self.config.area_tolerance(frame.width, frame.height),
            first_diff_column: None,
        };

        Ok(scan.run())
    }
}
