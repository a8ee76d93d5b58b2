use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, RgbaImage};
use log::debug;

use super::cell::{BitmapCellSource, CellBytes, SourceBinding};
use crate::glyph::lazy::GlyphImage;
use crate::GlyphError;

/// How glyph cells are laid out on a font sheet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SheetLayout {
    /// Cells per row; the cell size is the sheet width divided by this.
    pub columns: usize,
    /// Baseline position as a fraction of the cell size.
    pub baseline_ratio: f64,
    /// Whiten the grid lines along the top and left edge of each cell.
    pub clear_edges: bool,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self { columns: 20, baseline_ratio: 0.65, clear_edges: true }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("failed to load font sheet: {0}")]
    Image(#[from] image::ImageError),
    #[error("{width}x{height} sheet cannot hold {columns} square cells per row")]
    InvalidLayout { width: u32, height: u32, columns: usize },
}

/// A decoded font sheet: a grid of square glyph cells.
pub struct FontSheet {
    pixels: RgbaImage,
    layout: SheetLayout,
    cell_size: usize,
    rows: usize,
}

impl FontSheet {
    pub fn open(path: impl AsRef<Path>, layout: SheetLayout) -> Result<Self, SheetError> {
        let image = image::open(path.as_ref())?;
        debug!("Loaded font sheet {}", path.as_ref().display());
        Self::from_image(&image, layout)
    }

    pub fn from_image(image: &DynamicImage, layout: SheetLayout) -> Result<Self, SheetError> {
        let pixels = image.to_rgba8();
        let (width, height) = pixels.dimensions();

        let cell_size = if layout.columns == 0 { 0 } else { width as usize / layout.columns };
        if cell_size == 0 {
            return Err(SheetError::InvalidLayout { width, height, columns: layout.columns });
        }

        let rows = height as usize / cell_size;
        debug!("Font sheet of {}x{} cells, {} pixels each", layout.columns, rows, cell_size);

        Ok(Self { pixels, layout, cell_size, rows })
    }

    pub fn columns(&self) -> usize {
        self.layout.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> usize {
        self.cell_size
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    pub fn baseline(&self) -> isize {
        (self.cell_size as f64 * self.layout.baseline_ratio) as isize
    }

    fn check_cell(&self, column: usize, row: usize) -> Result<(), GlyphError> {
        if column >= self.columns() || row >= self.rows {
            return Err(GlyphError::CellOutOfRange {
                column,
                row,
                columns: self.columns(),
                rows: self.rows,
            });
        }

        Ok(())
    }

    /// The glyph in cell (`column`, `row`), decoded on first use.
    pub fn glyph(self: &Arc<Self>, column: usize, row: usize, auto_clip: bool) -> Result<GlyphImage, GlyphError> {
        self.check_cell(column, row)?;

        Ok(GlyphImage::bound_to_source(SourceBinding {
            source: self.clone(),
            column,
            row,
            width: self.cell_size,
            height: self.cell_size,
            clear_edges: self.layout.clear_edges,
            auto_clip,
        }))
    }

    /// Every cell of the sheet in row-major order.
    pub fn glyphs(self: &Arc<Self>, auto_clip: bool) -> impl Iterator<Item = (usize, usize, GlyphImage)> + '_ {
        let columns = self.columns();
        (0..self.rows * columns).filter_map(move |index| {
            let (column, row) = (index % columns, index / columns);
            self.glyph(column, row, auto_clip).ok().map(|glyph| (column, row, glyph))
        })
    }
}

impl BitmapCellSource for FontSheet {
    fn cell_bytes(&self, column: usize, row: usize) -> Result<CellBytes<'_>, GlyphError> {
        self.check_cell(column, row)?;

        Ok(CellBytes {
            bytes: self.pixels.as_raw(),
            stride: self.pixels.width() as usize * 4,
            cell_size: self.cell_size,
            baseline: self.baseline(),
        })
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::glyph::raster::{BLACK, WHITE};

    fn sheet(columns: usize, rows: usize, cell: u32) -> RgbaImage {
        let mut image = RgbaImage::from_pixel(
            columns as u32 * cell,
            rows as u32 * cell,
            Rgba([WHITE, WHITE, WHITE, 0xFF]),
        );
        // An ink bar in the middle of cell (1, 0).
        for y in 2..cell - 2 {
            image.put_pixel(cell + cell / 2, y, Rgba([BLACK, BLACK, BLACK, 0xFF]));
        }
        image
    }

    fn layout(columns: usize) -> SheetLayout {
        SheetLayout { columns, ..Default::default() }
    }

    #[test]
    fn geometry_follows_layout() {
        let image = DynamicImage::ImageRgba8(sheet(4, 3, 10));
        let sheet = FontSheet::from_image(&image, layout(4)).unwrap();

        assert_eq!((sheet.columns(), sheet.rows(), sheet.cell_size()), (4, 3, 10));
        assert_eq!(sheet.baseline(), 6);
    }

    #[test]
    fn too_many_columns_is_rejected() {
        let image = DynamicImage::ImageRgba8(sheet(1, 1, 10));
        let err = FontSheet::from_image(&image, layout(20)).err().unwrap();
        assert!(matches!(err, SheetError::InvalidLayout { width: 10, height: 10, columns: 20 }));
    }

    #[test]
    fn cells_are_bound_lazily_and_clipped() {
        let image = DynamicImage::ImageRgba8(sheet(2, 1, 10));
        let sheet = Arc::new(FontSheet::from_image(&image, layout(2)).unwrap());

        let bar = sheet.glyph(1, 0, true).unwrap();
        assert!(!bar.is_materialized());
        assert_eq!((bar.width().unwrap(), bar.height().unwrap()), (1, 6));
        assert_eq!(bar.baseline().unwrap(), 4);

        let blank = sheet.glyph(0, 0, true).unwrap();
        assert!(blank.is_empty().unwrap());

        let raw = sheet.glyph(1, 0, false).unwrap();
        assert_eq!((raw.width().unwrap(), raw.height().unwrap()), (10, 10));
    }

    #[test]
    fn out_of_range_cells_are_rejected() {
        let image = DynamicImage::ImageRgba8(sheet(2, 1, 10));
        let sheet = Arc::new(FontSheet::from_image(&image, layout(2)).unwrap());

        let err = sheet.glyph(2, 0, true).unwrap_err();
        assert_eq!(err, GlyphError::CellOutOfRange { column: 2, row: 0, columns: 2, rows: 1 });
        assert!(sheet.cell_bytes(0, 1).is_err());
        assert_eq!(sheet.glyphs(true).count(), 2);
    }
}
