use super::GlyphMatcher;
use crate::glyph::lazy::GlyphImage;
use crate::glyph::raster::{Raster, WHITE};
use crate::GlyphError;

/// Multiplies two overlapping intensities; white is neutral.
fn blend(a: u8, b: u8) -> u8 {
    let (a, b) = (u16::from(a), u16::from(b));

    if a != u16::from(WHITE) && b != u16::from(WHITE) {
        (a * b / 255) as u8
    } else {
        (a + b - 255) as u8
    }
}

/// Row of `raster` at frame row `y`, when the raster's top sits at `top`.
fn row_in(raster: &Raster, top: isize, y: usize) -> Option<usize> {
    let row = y as isize - top;
    (0..raster.height() as isize).contains(&row).then_some(row as usize)
}

impl GlyphMatcher {
    /// Places `second` after `first`, overlapping by `inside_width` columns.
    ///
    /// `second` is raised by `offset_y` rows relative to the shared
    /// baseline. A non-positive overlap places the glyphs side by side; an
    /// overlap wider than either glyph is capped at the narrower one.
    pub fn merge(
        &self,
        first: &GlyphImage,
        offset_y: i32,
        second: &GlyphImage,
        inside_width: i32,
    ) -> Result<GlyphImage, GlyphError> {
        self.merge_within(first, offset_y, second, inside_width, usize::MAX)
    }

    /// [`GlyphMatcher::merge`], keeping only the leftmost `max_width` columns.
    pub fn merge_within(
        &self,
        first: &GlyphImage,
        offset_y: i32,
        second: &GlyphImage,
        inside_width: i32,
        max_width: usize,
    ) -> Result<GlyphImage, GlyphError> {
        let (first, second) = (first.raster()?, second.raster()?);

        let inside = inside_width.clamp(0, first.width().min(second.width()) as i32) as usize;
        let total_width = first.width() - inside + second.width();
        let second_left = total_width - second.width();

        let second_baseline = second.baseline() + offset_y as isize;
        let baseline = first.baseline().max(second_baseline);
        let descent = (first.height() as isize - first.baseline())
            .max(second.height() as isize - second_baseline);
        let height = (baseline + descent).max(0) as usize;

        let first_top = baseline - first.baseline();
        let second_top = baseline - second_baseline;

        let merged = Raster::from_columns(total_width.min(max_width), height, baseline, |x, y| {
            let a = (x < first.width()).then(|| row_in(first, first_top, y)).flatten();
            let b = (x >= second_left).then(|| row_in(second, second_top, y)).flatten();

            match (a, b) {
                (Some(y1), Some(y2)) => blend(first.get(x, y1), second.get(x - second_left, y2)),
                (Some(y1), None) => first.get(x, y1),
                (None, Some(y2)) => second.get(x - second_left, y2),
                (None, None) => WHITE,
            }
        });

        Ok(merged.into())
    }

    /// Overlays `first` onto the leading columns of the wider `second`.
    ///
    /// The result takes `second`'s width. Where `first` covers a pixel it
    /// wins; elsewhere `second` shows through, moved down by `vertical_offset`.
    pub fn replace(
        &self,
        first: &GlyphImage,
        second: &GlyphImage,
        vertical_offset: i32,
    ) -> Result<GlyphImage, GlyphError> {
        let (first, second) = (first.raster()?, second.raster()?);

        if first.width() > second.width() {
            return Err(GlyphError::ReplaceTooWide {
                width: first.width(),
                target_width: second.width(),
            });
        }

        let offset = vertical_offset as isize;
        let second_baseline = second.baseline() - offset;
        let baseline = first.baseline().max(second_baseline);
        let descent = (first.height() as isize - first.baseline())
            .max(second.height() as isize - second_baseline);
        let height = (baseline + descent).max(0) as usize;

        let first_top = baseline - first.baseline();
        let second_top = baseline - second_baseline;

        let replaced = Raster::from_columns(second.width(), height, baseline + offset, |x, y| {
            match (x < first.width()).then(|| row_in(first, first_top, y)).flatten() {
                Some(y1) => first.get(x, y1),
                None => row_in(second, second_top, y).map_or(WHITE, |y2| second.get(x, y2)),
            }
        });

        Ok(replaced.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::fixtures::{raster, solid, GRAY};
    use crate::glyph::raster::BLACK;

    fn image(rows: &[&str], baseline: isize) -> GlyphImage {
        GlyphImage::from(raster(rows, baseline))
    }

    #[test]
    fn blend_multiplies_ink_and_passes_white() {
        assert_eq!(blend(WHITE, WHITE), WHITE);
        assert_eq!(blend(WHITE, GRAY), GRAY);
        assert_eq!(blend(BLACK, WHITE), BLACK);
        assert_eq!(blend(GRAY, GRAY), 0x40);
        assert_eq!(blend(BLACK, GRAY), BLACK);
    }

    #[test]
    fn merge_widths() {
        let matcher = GlyphMatcher::default();
        let glyph = image(&["X#X", "#X#", "X.X"], 2);
        let (width, height) = (3, 3);

        let side_by_side = matcher.merge(&glyph, 0, &glyph, 0).unwrap();
        assert_eq!((side_by_side.width().unwrap(), side_by_side.height().unwrap()), (2 * width, height));

        let capped = matcher.merge_within(&glyph, 0, &glyph, 0, 2 * width).unwrap();
        assert_eq!(capped.width().unwrap(), 2 * width);

        let stacked = matcher.merge(&glyph, 0, &glyph, width as i32).unwrap();
        assert_eq!((stacked.width().unwrap(), stacked.height().unwrap()), (width, height));

        let cropped = matcher.merge_within(&glyph, 0, &glyph, 0, width + 1).unwrap();
        assert_eq!(cropped.width().unwrap(), width + 1);

        let abutting = matcher.merge(&glyph, 0, &glyph, -4).unwrap();
        assert_eq!(abutting.width().unwrap(), 2 * width);
    }

    #[test]
    fn merge_into_wider_glyph() {
        let matcher = GlyphMatcher::default();
        let small = image(&["XX", "XX"], 1);
        let large = image(&["XXXX", "X..X", "X..X", "XXXX"], 3);

        let inside = matcher.merge(&small, 0, &large, 2).unwrap();
        assert_eq!((inside.width().unwrap(), inside.height().unwrap()), (4, 4));

        let overlap = matcher.merge(&small, 0, &large, 1).unwrap();
        assert_eq!((overlap.width().unwrap(), overlap.height().unwrap()), (5, 4));
        assert_eq!(overlap.baseline().unwrap(), 3);
    }

    #[test]
    fn merge_blends_overlap_and_offsets_second() {
        let matcher = GlyphMatcher::default();
        let left = image(&["#.", "#."], 1);
        let right = image(&["#X", "X."], 1);

        let merged = matcher.merge(&left, 0, &right, 1).unwrap().into_raster().unwrap();
        assert_eq!(merged.width(), 3);
        // Column 1 holds left's white over right's first column.
        assert_eq!(merged.get(0, 0), GRAY);
        assert_eq!(merged.get(1, 0), GRAY);
        assert_eq!(merged.get(1, 1), BLACK);
        assert_eq!(merged.get(2, 0), BLACK);
        assert_eq!(merged.colored_count(1), 1);

        let raised = matcher.merge(&left, 1, &right, 0).unwrap().into_raster().unwrap();
        assert_eq!((raised.width(), raised.height(), raised.baseline()), (4, 3, 2));
        assert!(raised.is_white(0, 0));
        assert_eq!(raised.get(0, 1), GRAY);
        assert_eq!(raised.get(2, 0), GRAY);
        assert_eq!(raised.get(2, 1), BLACK);
        assert!(raised.is_white(2, 2));
    }

    #[test]
    fn replace_overlays_leading_columns() {
        let matcher = GlyphMatcher::default();
        let accent = image(&["##"], 0);
        let base = solid(4, 3, BLACK);
        let base_image = GlyphImage::from(base.clone());

        let replaced = matcher.replace(&accent, &base_image, 0).unwrap().into_raster().unwrap();
        assert_eq!((replaced.width(), replaced.height()), (base.width(), base.height()));
        assert_eq!(replaced.get(0, 2), GRAY);
        assert_eq!(replaced.get(1, 2), GRAY);
        assert_eq!(replaced.get(2, 2), BLACK);
        assert_eq!(replaced.get(0, 0), BLACK);

        let same = matcher.replace(&base_image, &base_image, 0).unwrap();
        assert_eq!(same.raster().unwrap(), &base);
    }

    #[test]
    fn replace_rejects_wider_overlay() {
        let matcher = GlyphMatcher::default();
        let wide = GlyphImage::from(solid(5, 2, BLACK));
        let narrow = GlyphImage::from(solid(3, 2, BLACK));

        let err = matcher.replace(&wide, &narrow, 0).unwrap_err();
        assert_eq!(err, GlyphError::ReplaceTooWide { width: 5, target_width: 3 });
    }
}
