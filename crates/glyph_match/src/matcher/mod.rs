pub mod compat;
pub mod compose;
pub mod diagonal;
pub mod distance;
pub mod edge;
pub mod exact;

use crate::glyph::raster::Raster;
use crate::MatchConfig;

/// Comparison and composition algorithms over glyph images.
///
/// The matcher holds nothing but its tolerances; every operation is pure
/// apart from forcing lazy images to materialize.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlyphMatcher {
    config: MatchConfig,
}

impl GlyphMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    fn pixel_diff(&self) -> PixelDiff {
        PixelDiff { total: 0, max_pixel: self.config.max_pixel_diff }
    }
}

/// Two rasters stacked on a shared baseline.
///
/// The second raster is raised by the vertical offset. Frame rows are
/// projected back onto each raster; a row outside a raster's extent projects
/// to `None`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Frame {
    pub width: usize,
    pub height: usize,
    baseline: isize,
    first: Extent,
    second: Extent,
}

#[derive(Clone, Copy, Debug)]
struct Extent {
    baseline: isize,
    height: usize,
}

impl Extent {
    fn of(raster: &Raster, vertical_offset: i32) -> Self {
        Self { baseline: raster.baseline() + vertical_offset as isize, height: raster.height() }
    }

    fn descent(&self) -> isize {
        self.height as isize - self.baseline
    }
}

impl Frame {
    pub fn new(first: &Raster, second: &Raster, vertical_offset: i32) -> Self {
        let width = first.width().max(second.width());
        let first = Extent::of(first, 0);
        let second = Extent::of(second, vertical_offset);

        let baseline = first.baseline.max(second.baseline);
        let descent = first.descent().max(second.descent());

        Self { width, height: (baseline + descent).max(0) as usize, baseline, first, second }
    }

    /// Rows of the first and second raster seen at frame row `y`.
    pub fn rows(&self, y: usize) -> (Option<usize>, Option<usize>) {
        (self.project(y, self.first), self.project(y, self.second))
    }

    fn project(&self, y: usize, extent: Extent) -> Option<usize> {
        let row = y as isize - self.baseline + extent.baseline;
        (0..extent.height as isize).contains(&row).then_some(row as usize)
    }
}

/// Running absolute difference between corresponding pixels.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PixelDiff {
    pub total: u32,
    max_pixel: u32,
}

impl PixelDiff {
    /// Adds `|a - b|` to the total. Returns false when this single pair is
    /// already too far apart.
    pub fn accumulate(&mut self, a: u8, b: u8) -> bool {
        let diff = u32::from(a.abs_diff(b));
        self.total += diff;
        diff <= self.max_pixel
    }
}
