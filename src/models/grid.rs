use crate::error::{AnalysisError, Result};

/// Immutable gray-value grid, row-major, `rows` x `cols`
///
/// `i` indexes rows (vertical) and `j` indexes columns (horizontal).
/// A constructed grid always has at least one row and one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Wrap a row-major buffer of `rows * cols` gray values
    pub fn new(rows: usize, cols: usize, data: Vec<u8>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(AnalysisError::invalid(format!(
                "grid must be non-empty, got {rows}x{cols}"
            )));
        }
        let expected = rows
            .checked_mul(cols)
            .ok_or_else(|| AnalysisError::invalid("grid dimensions overflow"))?;
        if data.len() != expected {
            return Err(AnalysisError::invalid(format!(
                "buffer holds {} values, {rows}x{cols} grid needs {expected}",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Grid filled with a single gray value
    pub fn filled(rows: usize, cols: usize, value: u8) -> Result<Self> {
        let len = rows
            .checked_mul(cols)
            .ok_or_else(|| AnalysisError::invalid("grid dimensions overflow"))?;
        Self::new(rows, cols, vec![value; len])
    }

    /// Build from nested rows; every row must have the same length
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(AnalysisError::invalid(format!(
                    "row {i} has {} columns, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Self::new(rows.len(), cols, data)
    }

    /// Number of rows (I)
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (J)
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total pixel count, `rows * cols`
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed grid
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Gray value at row `i`, column `j`
    ///
    /// # Panics
    /// Panics if `(i, j)` is outside the grid.
    pub fn get(&self, i: usize, j: usize) -> u8 {
        assert!(i < self.rows && j < self.cols, "({i}, {j}) outside grid");
        self.data[i * self.cols + j]
    }

    /// Row `i` as a slice
    pub fn row(&self, i: usize) -> &[u8] {
        let start = i * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Iterate rows top to bottom
    pub fn row_iter(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(self.cols)
    }

    /// Raw row-major data
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl TryFrom<&image::GrayImage> for PixelGrid {
    type Error = AnalysisError;

    fn try_from(img: &image::GrayImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::new(height as usize, width as usize, img.as_raw().clone())
    }
}
