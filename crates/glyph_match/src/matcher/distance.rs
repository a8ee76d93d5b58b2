use super::GlyphMatcher;
use crate::glyph::lazy::GlyphImage;
use crate::glyph::raster::{Raster, WHITE};
use crate::GlyphError;

/// How far into a row the first ink sits, seen from one edge of a glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HorizontalDistance {
    /// Number of white pixels before the first non-white one.
    pub colored_pixel_position: usize,
    /// Intensity of that pixel, or white when the row is blank.
    pub colored_pixel_intensity: u8,
}

impl HorizontalDistance {
    /// Sub-pixel distance: a faint edge pixel counts as almost a full step.
    pub fn distance(&self) -> f64 {
        self.colored_pixel_position as f64 + f64::from(self.colored_pixel_intensity) / f64::from(WHITE)
    }

    fn scan(raster: &Raster, y: usize, columns: impl Iterator<Item = usize>) -> Self {
        let mut position = 0;
        for x in columns {
            let value = raster.get(x, y);
            if value != WHITE {
                return Self { colored_pixel_position: position, colored_pixel_intensity: value };
            }
            position += 1;
        }

        Self { colored_pixel_position: position, colored_pixel_intensity: WHITE }
    }
}

impl GlyphMatcher {
    /// Smallest gap between the ink of `first` and the ink of `second` when
    /// `second` is drawn `separation` columns after `first`.
    ///
    /// Rows are aligned on the baselines and span both glyphs' ascent and
    /// descent. Returns infinity when that band is empty.
    pub fn distance(
        &self,
        first: &GlyphImage,
        second: &GlyphImage,
        separation: usize,
    ) -> Result<f64, GlyphError> {
        let (first, second) = (first.raster()?, second.raster()?);

        let top = -first.baseline().max(second.baseline());
        let bottom = first.descent().max(second.descent());
        let band = (bottom - top).max(0) as usize;

        let row_of = |raster: &Raster, y: usize| {
            let row = y as isize + top + raster.baseline();
            (0..raster.height() as isize).contains(&row).then_some(row as usize)
        };

        let left: Vec<HorizontalDistance> = (0..band)
            .map(|y| match row_of(first, y) {
                Some(y1) => HorizontalDistance::scan(first, y1, (0..first.width()).rev()),
                None => HorizontalDistance { colored_pixel_position: first.width(), colored_pixel_intensity: 0 },
            })
            .collect();

        let right: Vec<HorizontalDistance> = (0..band)
            .map(|y| match row_of(second, y) {
                Some(y2) => HorizontalDistance::scan(second, y2, 0..second.width()),
                None => HorizontalDistance {
                    colored_pixel_position: second.width().saturating_sub(1),
                    colored_pixel_intensity: 0,
                },
            })
            .collect();

        let mut min_square = f64::INFINITY;
        for (i, left) in left.iter().enumerate() {
            for (j, right) in right.iter().enumerate() {
                let dx = separation as f64 + left.distance() + right.distance();
                let dy = i as f64 - j as f64;
                min_square = min_square.min(dx * dx + dy * dy);
            }
        }

        Ok(min_square.sqrt())
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
    fn sub_pixel_distance() {
        let edge = HorizontalDistance { colored_pixel_position: 2, colored_pixel_intensity: GRAY };
        assert!((edge.distance() - (2.0 + 128.0 / 255.0)).abs() < 1e-12);

        let blank = HorizontalDistance { colored_pixel_position: 3, colored_pixel_intensity: WHITE };
        assert_eq!(blank.distance(), 4.0);
    }

    #[test]
    fn solid_glyphs_touch() {
        let matcher = GlyphMatcher::default();
        let black = GlyphImage::from(solid(3, 4, BLACK));

        assert_eq!(matcher.distance(&black, &black, 0).unwrap(), 0.0);
        assert_eq!(matcher.distance(&black, &black, 2).unwrap(), 2.0);
    }

    #[test]
    fn gap_is_measured_from_facing_edges() {
        let matcher = GlyphMatcher::default();
        let left = image(&["X..", "X..", "X.."], 2);
        let right = image(&["..X", "..X", "..X"], 2);

        // Two blank columns on each side of the gap.
        assert_eq!(matcher.distance(&left, &right, 1).unwrap(), 5.0);
        assert_eq!(matcher.distance(&right, &left, 0).unwrap(), 0.0);
    }

    #[test]
    fn misaligned_rows_add_vertical_distance() {
        let matcher = GlyphMatcher::default();
        let high = image(&["X", ".", "."], 2);
        let low = image(&[".", ".", "X"], 2);

        let distance = matcher.distance(&high, &low, 0).unwrap();
        assert!(distance > 0.0);
        // Ink rows two apart, or a blank row costing its full width plus one.
        assert_eq!(distance, 2.0);
    }

    #[test]
    fn antialiased_edge_is_fractional() {
        let matcher = GlyphMatcher::default();
        let soft = image(&["X#"], 0);
        let black = GlyphImage::from(solid(1, 1, BLACK));

        let distance = matcher.distance(&soft, &black, 0).unwrap();
        assert!((distance - 128.0 / 255.0).abs() < 1e-12);
    }

    #[test]
    fn empty_band_is_infinitely_far() {
        let matcher = GlyphMatcher::default();
        let empty = GlyphImage::empty();
        assert_eq!(matcher.distance(&empty, &empty, 0).unwrap(), f64::INFINITY);
    }
}
