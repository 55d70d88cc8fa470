//! Dense row-major matrices over GF(2^8) and Gauss-Jordan elimination.

use crate::error::FecError;
use crate::gf::Gf;

/// A row-major matrix backed by one flat buffer.
///
/// The buffer is reused across [`Matrix::reset`] calls, so a matrix sized
/// once for the largest system never reallocates afterwards.
#[derive(Debug, Clone, Default)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Gf>,
}

impl Matrix {
    /// An empty matrix whose buffer can hold `capacity` entries before
    /// growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Matrix {
            rows: 0,
            cols: 0,
            data: Vec::with_capacity(capacity),
        }
    }

    /// Resizes to `rows × cols` and zeroes every entry.
    pub fn reset(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
        self.data.clear();
        self.data.resize(rows * cols, Gf::ZERO);
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Gf {
        self.data[row * self.cols + col]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [Gf] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.data.split_at_mut(hi * self.cols);
        head[lo * self.cols..(lo + 1) * self.cols].swap_with_slice(&mut tail[..self.cols]);
    }

    /// `row[target] -= factor * row[source]`
    fn sub_scaled_row(&mut self, target: usize, source: usize, factor: Gf) {
        for j in 0..self.cols {
            let v = self.get(source, j);
            self.data[target * self.cols + j] -= factor * v;
        }
    }

    /// Solves the augmented system `[A | b]` held in this matrix, where the
    /// last column is `b` and the remaining `cols - 1` columns are unknowns.
    ///
    /// Returns `Ok(false)` if the system has no unique solution: either some
    /// column has no nonzero pivot, or a row left over after elimination
    /// demands `0 = c` for nonzero `c`. On `Ok(true)` the value of unknown `i`
    /// is `self.get(i, cols - 1)`.
    pub fn solve_augmented(&mut self) -> Result<bool, FecError> {
        let unknowns = self.cols - 1;
        if self.rows < unknowns {
            return Ok(false);
        }

        for col in 0..unknowns {
            // Any nonzero entry will do; there is no magnitude in GF(2^8).
            let pivot = match (col..self.rows).find(|&r| !self.get(r, col).is_zero()) {
                Some(pivot) => pivot,
                None => return Ok(false),
            };
            self.swap_rows(col, pivot);

            let scale = self.get(col, col).inv()?;
            for v in self.row_mut(col) {
                *v *= scale;
            }

            for r in 0..self.rows {
                if r == col {
                    continue;
                }
                let factor = self.get(r, col);
                if !factor.is_zero() {
                    self.sub_scaled_row(r, col, factor);
                }
            }
        }

        Ok((unknowns..self.rows).all(|r| self.get(r, unknowns).is_zero()))
    }
}
