use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::glyph::raster::Raster;
use crate::GlyphError;

/// Rectangle of a raw source buffer, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRect {
    pub left: usize,
    pub top: usize,
    pub width: usize,
    pub height: usize,
}

/// Raw bytes backing one cell of a font sheet.
///
/// `bytes` covers the whole sheet with four bytes per pixel (three color
/// channels, then alpha) and `stride` bytes per row. The cell occupies the
/// square at `(column * cell_size, row * cell_size)`.
#[derive(Clone, Copy, Debug)]
pub struct CellBytes<'a> {
    pub bytes: &'a [u8],
    pub stride: usize,
    pub cell_size: usize,
    pub baseline: isize,
}

/// Decoded font sheet that glyph images can be lazily extracted from.
pub trait BitmapCellSource: Send + Sync {
    fn cell_bytes(&self, column: usize, row: usize) -> Result<CellBytes<'_>, GlyphError>;
}

/// Where a lazily materialized glyph image comes from.
///
/// The baseline is not part of the binding: it is whatever the source
/// reports for the cell when the image is materialized.
#[derive(Clone)]
pub struct SourceBinding {
    pub source: Arc<dyn BitmapCellSource>,
    pub column: usize,
    pub row: usize,
    pub width: usize,
    pub height: usize,
    /// Whiten the first row and column, which carry the sheet's grid lines.
    pub clear_edges: bool,
    /// Clip the decoded cell before handing it out.
    pub auto_clip: bool,
}

impl SourceBinding {
    pub(crate) fn load(&self) -> Result<Raster, GlyphError> {
        let cell = self.source.cell_bytes(self.column, self.row)?;
        let rect = CellRect {
            left: self.column * cell.cell_size,
            top: self.row * cell.cell_size,
            width: self.width,
            height: self.height,
        };

        let raster =
            Raster::from_raw(rect, cell.bytes, cell.stride, cell.baseline, self.clear_edges)?;
        debug!(
            "Materialized cell ({}, {}) as {}x{} glyph",
            self.column,
            self.row,
            raster.width(),
            raster.height()
        );

        if !self.auto_clip {
            return Ok(raster);
        }

        let clipped = raster.clipped();
        if clipped.is_empty() {
            debug!("Cell ({}, {}) is blank", self.column, self.row);
        }

        Ok(clipped)
    }
}

impl fmt::Debug for SourceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceBinding")
            .field("column", &self.column)
            .field("row", &self.row)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("clear_edges", &self.clear_edges)
            .field("auto_clip", &self.auto_clip)
            .finish_non_exhaustive()
    }
}
