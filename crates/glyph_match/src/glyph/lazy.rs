use std::fmt;
use std::sync::{Arc, OnceLock};

use image::DynamicImage;

use super::clip::{ClipBounds, Clipped};
use super::raster::Raster;
use crate::source::cell::{CellRect, SourceBinding};
use crate::GlyphError;

/// A glyph image, either built eagerly or bound to a cell of a font sheet.
///
/// A bound image is decoded (and clipped, if requested) on first access to its
/// pixels. The transition runs at most once even when the image is shared
/// between threads; a decode failure is remembered and reported to every
/// caller.
#[derive(Clone)]
pub struct GlyphImage {
    binding: Option<Arc<SourceBinding>>,
    state: OnceLock<Result<Raster, GlyphError>>,
}

impl GlyphImage {
    pub fn empty() -> Self {
        Self::from(Raster::empty())
    }

    /// All-white image ready to be populated.
    pub fn new(width: usize, height: usize, baseline: isize) -> Self {
        Self::from(Raster::new(width, height, baseline))
    }

    pub fn from_raw(
        rect: CellRect,
        bytes: &[u8],
        stride: usize,
        baseline: isize,
        clear_edges: bool,
    ) -> Result<Self, GlyphError> {
        Raster::from_raw(rect, bytes, stride, baseline, clear_edges).map(Self::from)
    }

    /// The whole image as a single glyph whose baseline sits `baseline_diff`
    /// rows above the bottom edge.
    pub fn from_image(image: &DynamicImage, baseline_diff: usize) -> Result<Self, GlyphError> {
        let rgba = image.to_rgba8();
        let (width, height) = (rgba.width() as usize, rgba.height() as usize);
        let rect = CellRect { left: 0, top: 0, width, height };
        let baseline = height as isize - baseline_diff as isize;

        Self::from_raw(rect, rgba.as_raw(), width * 4, baseline, false)
    }

    /// Records where the glyph lives without decoding anything yet.
    pub fn bound_to_source(binding: SourceBinding) -> Self {
        Self { binding: Some(Arc::new(binding)), state: OnceLock::new() }
    }

    pub fn binding(&self) -> Option<&SourceBinding> {
        self.binding.as_deref()
    }

    pub fn is_materialized(&self) -> bool {
        self.state.get().is_some()
    }

    fn state(&self) -> &Result<Raster, GlyphError> {
        self.state.get_or_init(|| match self.binding.as_deref() {
            Some(binding) => binding.load(),
            None => Ok(Raster::empty()),
        })
    }

    /// Forces decoding of a bound image.
    pub fn materialize(&self) -> Result<(), GlyphError> {
        self.raster().map(|_| ())
    }

    pub fn raster(&self) -> Result<&Raster, GlyphError> {
        self.state().as_ref().map_err(Clone::clone)
    }

    pub fn raster_mut(&mut self) -> Result<&mut Raster, GlyphError> {
        self.state();
        match self.state.get_mut() {
            Some(Ok(raster)) => Ok(raster),
            Some(Err(err)) => Err(err.clone()),
            None => unreachable!("glyph state is initialized by state()"),
        }
    }

    pub fn into_raster(self) -> Result<Raster, GlyphError> {
        self.state();
        match self.state.into_inner() {
            Some(state) => state,
            None => unreachable!("glyph state is initialized by state()"),
        }
    }

    pub fn width(&self) -> Result<usize, GlyphError> {
        Ok(self.raster()?.width())
    }

    pub fn height(&self) -> Result<usize, GlyphError> {
        Ok(self.raster()?.height())
    }

    pub fn baseline(&self) -> Result<isize, GlyphError> {
        Ok(self.raster()?.baseline())
    }

    pub fn is_empty(&self) -> Result<bool, GlyphError> {
        Ok(self.raster()?.is_empty())
    }

    pub fn get(&self, x: usize, y: usize) -> Result<u8, GlyphError> {
        Ok(self.raster()?.get(x, y))
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) -> Result<(), GlyphError> {
        self.raster_mut()?.set(x, y, value);
        Ok(())
    }

    pub fn clear(&mut self, x: usize, y: usize) -> Result<(), GlyphError> {
        self.raster_mut()?.clear(x, y);
        Ok(())
    }

    pub fn is_white(&self, x: usize, y: usize) -> Result<bool, GlyphError> {
        Ok(self.raster()?.is_white(x, y))
    }

    pub fn is_colored(&self, x: usize, y: usize) -> Result<Option<u8>, GlyphError> {
        Ok(self.raster()?.colored_value(x, y))
    }

    pub fn clip_bounds(&self) -> Result<ClipBounds, GlyphError> {
        Ok(self.raster()?.clip_bounds())
    }

    pub fn clipped(&self) -> Result<GlyphImage, GlyphError> {
        Ok(self.raster()?.clipped().into())
    }

    /// Clips and wraps in one step; fails for glyphs that clip to nothing.
    pub fn to_clipped(&self) -> Result<Clipped, GlyphError> {
        Clipped::from_raster(self.raster()?.clipped())
    }

    pub fn is_clipped(&self) -> Result<bool, GlyphError> {
        Ok(self.raster()?.is_clipped())
    }

    pub fn left_side(&self, width: usize) -> Result<GlyphImage, GlyphError> {
        Ok(self.raster()?.left_side(width).into())
    }

    pub fn right_side(&self, width: usize) -> Result<GlyphImage, GlyphError> {
        Ok(self.raster()?.right_side(width).into())
    }

    pub fn cut_left(&self, count: usize) -> Result<GlyphImage, GlyphError> {
        Ok(self.raster()?.cut_left(count).into())
    }

    pub fn cut_right(&self, count: usize) -> Result<GlyphImage, GlyphError> {
        Ok(self.raster()?.cut_right(count).into())
    }

    pub fn enlarge(&self, target: &GlyphImage) -> Result<GlyphImage, GlyphError> {
        Ok(self.raster()?.enlarge(target.raster()?).into())
    }

    pub fn debug_string(&self) -> Result<String, GlyphError> {
        Ok(self.raster()?.debug_string())
    }
}

impl Default for GlyphImage {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Raster> for GlyphImage {
    fn from(raster: Raster) -> Self {
        Self { binding: None, state: OnceLock::from(Ok(raster)) }
    }
}

impl fmt::Debug for GlyphImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.get() {
            Some(Ok(raster)) => f
                .debug_struct("GlyphImage")
                .field("width", &raster.width())
                .field("height", &raster.height())
                .field("baseline", &raster.baseline())
                .finish(),
            Some(Err(err)) => f.debug_tuple("GlyphImage").field(err).finish(),
            None => f.debug_tuple("GlyphImage").field(&self.binding).finish(),
        }
    }
}
