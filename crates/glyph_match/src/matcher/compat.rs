use super::GlyphMatcher;
use crate::glyph::lazy::GlyphImage;
use crate::GlyphError;

impl GlyphMatcher {
    /// Cheap pre-filter: the first `test_width` columns of both glyphs agree
    /// on being blank and on their count of colored pixels.
    pub fn is_compatible(
        &self,
        first: &GlyphImage,
        second: &GlyphImage,
        test_width: usize,
    ) -> Result<bool, GlyphError> {
        let (first, second) = (first.raster()?, second.raster()?);

        for raster in [first, second] {
            if test_width > raster.width() {
                return Err(GlyphError::TestWidthOutOfRange { test_width, width: raster.width() });
            }
        }

        Ok((0..test_width).all(|x| {
            first.is_white_column(x) == second.is_white_column(x)
                && first.colored_count(x) == second.colored_count(x)
        }))
    }
}
