use std::ops::Deref;

use super::lazy::GlyphImage;
use super::raster::Raster;
use crate::GlyphError;

/// Extent of the non-white content of a raster, as half-open ranges
/// `left..right` and `top..bottom`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipBounds {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl ClipBounds {
    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    pub fn width(&self) -> usize {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> usize {
        self.bottom.saturating_sub(self.top)
    }
}

impl Raster {
    /// Walks inward from each edge past all-white columns and rows.
    pub fn clip_bounds(&self) -> ClipBounds {
        let left = (0..self.width()).find(|&x| !self.is_blank_column(x)).unwrap_or(self.width());
        let right = (0..self.width()).rev().find(|&x| !self.is_blank_column(x)).map_or(0, |x| x + 1);
        let top = (0..self.height()).find(|&y| !self.is_blank_row(y)).unwrap_or(self.height());
        let bottom = (0..self.height()).rev().find(|&y| !self.is_blank_row(y)).map_or(0, |y| y + 1);

        ClipBounds { left, top, right, bottom }
    }

    /// Crops the white border away. Yields [`Raster::empty`] when nothing is
    /// left, and an unchanged copy when there was no border.
    pub fn clipped(&self) -> Raster {
        let bounds = self.clip_bounds();

        if bounds.is_empty() {
            return Raster::empty();
        }

        if bounds.width() == self.width() && bounds.height() == self.height() {
            return self.clone();
        }

        let baseline = self.baseline() - bounds.top as isize;
        let clipped = Raster::from_columns(bounds.width(), bounds.height(), baseline, |x, y| {
            self.get(bounds.left + x, bounds.top + y)
        });

        debug_assert!(clipped.is_clipped());
        clipped
    }

    /// Each of the four edge columns and rows holds at least one non-white
    /// pixel.
    pub fn is_clipped(&self) -> bool {
        if self.is_empty() {
            return false;
        }

        !self.is_blank_column(0)
            && !self.is_blank_column(self.width() - 1)
            && !self.is_blank_row(0)
            && !self.is_blank_row(self.height() - 1)
    }
}

/// A materialized raster known to be clipped.
///
/// Exact matching only makes sense between clipped glyphs; holding a
/// `Clipped` is the proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clipped(Raster);

impl Clipped {
    pub fn from_raster(raster: Raster) -> Result<Self, GlyphError> {
        if raster.is_clipped() {
            Ok(Self(raster))
        } else {
            Err(GlyphError::NotClipped { width: raster.width(), height: raster.height() })
        }
    }

    /// Wraps an already clipped image, materializing it if needed.
    pub fn new(image: &GlyphImage) -> Result<Self, GlyphError> {
        Self::from_raster(image.raster()?.clone())
    }

    pub fn raster(&self) -> &Raster {
        &self.0
    }

    pub fn into_raster(self) -> Raster {
        self.0
    }

    pub fn into_image(self) -> GlyphImage {
        GlyphImage::from(self.0)
    }
}

impl Deref for Clipped {
    type Target = Raster;

    fn deref(&self) -> &Raster {
        &self.0
    }
}

impl TryFrom<GlyphImage> for Clipped {
    type Error = GlyphError;

    fn try_from(image: GlyphImage) -> Result<Self, GlyphError> {
        Self::from_raster(image.into_raster()?)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::glyph::fixtures::{raster, solid};
    use crate::glyph::raster::{BLACK, WHITE};

    #[test]
    fn clip_crops_border_and_moves_baseline() {
        let glyph = raster(&[".....", "..X..", ".X#..", ".....", "....."], 3);

        let bounds = glyph.clip_bounds();
        assert_eq!(bounds, ClipBounds { left: 1, top: 1, right: 3, bottom: 3 });

        let clipped = glyph.clipped();
        assert_eq!((clipped.width(), clipped.height()), (2, 2));
        assert_eq!(clipped.baseline(), 2);
        assert!(clipped.is_clipped());
        assert!(!glyph.is_clipped());
        assert_eq!(clipped.colored_count(1), 1);
        assert!(!clipped.is_white_column(0));
    }

    #[test]
    fn clipping_above_baseline_goes_negative() {
        let glyph = raster(&["...", "...", ".X.", "..."], 1);
        assert_eq!(glyph.clipped().baseline(), -1);
    }

    #[test]
    fn white_clips_to_empty() {
        let white = solid(4, 3, WHITE);
        assert!(white.clip_bounds().is_empty());
        assert_eq!(white.clipped(), Raster::empty());
        assert_eq!(Raster::empty().clipped(), Raster::empty());
        assert!(!Raster::empty().is_clipped());
    }

    #[test]
    fn solid_ink_is_already_clipped() {
        let black = solid(3, 5, BLACK);
        assert!(black.is_clipped());
        assert_eq!(black.clipped(), black);
    }

    #[test]
    fn clip_is_idempotent_on_noise() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..64 {
            let width = rng.gen_range(1..9);
            let height = rng.gen_range(1..9);
            let mut glyph = Raster::new(width, height, rng.gen_range(0..height as isize));
            for y in 0..height {
                for x in 0..width {
                    if rng.gen_bool(0.2) {
                        glyph.set(x, y, rng.gen_range(0..WHITE));
                    }
                }
            }

            let once = glyph.clipped();
            assert_eq!(once.clipped(), once);
            assert!(once.is_empty() || once.is_clipped());
        }
    }

    #[test]
    fn clipped_wrapper_checks_edges() {
        let black = solid(2, 2, BLACK);
        assert!(Clipped::from_raster(black.clone()).is_ok());

        let padded = raster(&["...", ".X.", "..."], 1);
        let err = Clipped::from_raster(padded.clone()).unwrap_err();
        assert_eq!(err, GlyphError::NotClipped { width: 3, height: 3 });

        let wrapped = Clipped::try_from(GlyphImage::from(padded.clipped())).unwrap();
        assert_eq!(wrapped.width(), 1);
        assert!(Clipped::from_raster(Raster::empty()).is_err());
    }
}
