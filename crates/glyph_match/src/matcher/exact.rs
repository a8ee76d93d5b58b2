use log::trace;

use super::GlyphMatcher;
use crate::glyph::clip::Clipped;
use crate::glyph::lazy::GlyphImage;
use crate::GlyphError;

impl GlyphMatcher {
    /// Same size, same baseline once `vertical_offset` is applied to `second`,
    /// and pixels within the difference budget.
    pub fn exact_match(&self, first: &Clipped, second: &Clipped, vertical_offset: i32) -> bool {
        if first.width() != second.width() || first.height() != second.height() {
            trace!(
                "Exact match rejected: {}x{} vs {}x{}",
                first.width(),
                first.height(),
                second.width(),
                second.height()
            );
            return false;
        }

        if second.baseline() - first.baseline() + vertical_offset as isize != 0 {
            trace!("Exact match rejected: baselines differ");
            return false;
        }

        let mut diff = self.pixel_diff();
        for x in 0..first.width() {
            for y in 0..first.height() {
                if !diff.accumulate(first.get(x, y), second.get(x, y))
                    || diff.total > self.config.max_total_diff
                {
                    return false;
                }
            }
        }

        true
    }

    /// Identical dimensions and byte-identical pixels.
    pub fn pixel_perfect_match(&self, first: &GlyphImage, second: &GlyphImage) -> Result<bool, GlyphError> {
        let (first, second) = (first.raster()?, second.raster()?);

        Ok(first.width() == second.width()
            && first.height() == second.height()
            && first.pixels() == second.pixels())
    }
}
