use crate::error::{AnalysisError, Result};

/// Compact {0,1} mask with the same `(i, j)` layout as its source grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl BinaryMask {
    /// All-zero mask; `rows` and `cols` must both be non-zero
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(AnalysisError::invalid(format!(
                "mask must be non-empty, got {rows}x{cols}"
            )));
        }
        let bits = rows
            .checked_mul(cols)
            .ok_or_else(|| AnalysisError::invalid("mask dimensions overflow"))?;
        Ok(Self {
            rows,
            cols,
            data: vec![0; bits.div_ceil(8)],
        })
    }

    /// Mask whose bit at `(i, j)` is `f(i, j)`
    pub fn from_fn(
        rows: usize,
        cols: usize,
        mut f: impl FnMut(usize, usize) -> bool,
    ) -> Result<Self> {
        let mut mask = Self::zeros(rows, cols)?;
        for i in 0..rows {
            for j in 0..cols {
                if f(i, j) {
                    mask.set(i, j, true);
                }
            }
        }
        Ok(mask)
    }

    /// Build from nested rows of 0/1 values
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut mask = Self::zeros(rows.len(), cols)?;
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(AnalysisError::invalid(format!(
                    "row {i} has {} columns, expected {cols}",
                    row.len()
                )));
            }
            for (j, &v) in row.iter().enumerate() {
                match v {
                    0 => {}
                    1 => mask.set(i, j, true),
                    other => {
                        return Err(AnalysisError::invalid(format!(
                            "mask value {other} at ({i}, {j}) is not 0 or 1"
                        )));
                    }
                }
            }
        }
        Ok(mask)
    }

    /// Pack row-major flags for a grid-shaped mask; `rows * cols` must be non-zero
    pub(crate) fn pack(rows: usize, cols: usize, flags: impl IntoIterator<Item = bool>) -> Self {
        let mut data = vec![0u8; (rows * cols).div_ceil(8)];
        for (index, flag) in flags.into_iter().enumerate().take(rows * cols) {
            if flag {
                data[index / 8] |= 1 << (index % 8);
            }
        }
        Self { rows, cols, data }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Bit at row `i`, column `j`; out-of-range reads are 0
    pub fn get(&self, i: usize, j: usize) -> bool {
        if i >= self.rows || j >= self.cols {
            return false;
        }
        let index = i * self.cols + j;
        (self.data[index / 8] >> (index % 8)) & 1 == 1
    }

    /// Value at `(i, j)` as 0 or 1
    pub fn value(&self, i: usize, j: usize) -> u8 {
        self.get(i, j) as u8
    }

    pub(crate) fn set(&mut self, i: usize, j: usize, value: bool) {
        if i >= self.rows || j >= self.cols {
            return;
        }
        let index = i * self.cols + j;
        let byte_index = index / 8;
        let bit_index = index % 8;
        if value {
            self.data[byte_index] |= 1 << bit_index;
        } else {
            self.data[byte_index] &= !(1 << bit_index);
        }
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Set pixels in row-major order (i ascending, then j ascending)
    pub fn iter_ones(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.rows).flat_map(move |i| {
            (0..self.cols).filter_map(move |j| self.get(i, j).then_some((i, j)))
        })
    }

    /// Raw packed bits, LSB first within each byte
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
