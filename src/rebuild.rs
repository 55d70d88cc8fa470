//! Erasure rebuild, in-place correction, and the combined decode.
//!
//! [`FecCode::rebuild`] trusts its input and interpolates the message from
//! `required` shares. [`FecCode::correct`] finds the columns where the shares
//! disagree with each other and runs Berlekamp-Welch on those only, which is
//! much cheaper than [`FecCode::berlekamp_welch`] when most columns are clean.

use tracing::debug;

use crate::berlekamp_welch::Workspace;
use crate::code::FecCode;
use crate::error::FecError;
use crate::gf::{self, Gf};
use crate::poly;
use crate::share::{Share, ShareSink};

impl FecCode {
    /// Positions of the first `required` shares with distinct numbers.
    fn distinct_base(&self, shares: &[Share]) -> Result<Vec<usize>, FecError> {
        let mut seen = [false; 256];
        let mut base = Vec::with_capacity(self.k);
        for (pos, share) in shares.iter().enumerate() {
            if !seen[share.number as usize] {
                seen[share.number as usize] = true;
                base.push(pos);
                if base.len() == self.k {
                    return Ok(base);
                }
            }
        }
        Err(FecError::InsufficientShares {
            needed: self.k,
            got: base.len(),
        })
    }

    /// Weights mapping the values of the `base` shares to the value at `x`.
    fn weights_at(&self, shares: &[Share], base: &[usize], x: Gf) -> Result<Vec<u8>, FecError> {
        let nodes: Vec<Gf> = base
            .iter()
            .map(|&pos| self.points()[shares[pos].number as usize])
            .collect();
        let mut weights = vec![Gf::ZERO; base.len()];
        poly::lagrange_weights(&nodes, x, &mut weights)?;
        Ok(weights.into_iter().map(u8::from).collect())
    }

    /// Rebuilds the message from the first `required` distinct shares,
    /// without any error correction, and hands the `required` message rows
    /// to `sink` in increasing number order.
    ///
    /// # Arguments
    ///
    /// * `shares` - Shares in any order. Only the first `required` with
    ///   distinct numbers are read, so corrupted shares corrupt the output.
    /// * `sink` - Receives the message rows.
    ///
    /// # Errors
    ///
    /// [`FecError::InsufficientShares`] if fewer than `required` distinct
    /// share numbers are present, plus the share checks of
    /// [`FecCode::berlekamp_welch`].
    pub fn rebuild<S>(&self, shares: &[Share], sink: &mut S) -> Result<(), FecError>
    where
        S: ShareSink + ?Sized,
    {
        let block = self.check_shares(shares)?;
        let base = self.distinct_base(shares)?;

        let decode_matrix = (0..self.k)
            .map(|j| self.weights_at(shares, &base, self.points()[j]))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(k = self.k, block, "rebuilding message rows");

        let mut row = vec![0u8; block];
        for (j, weights) in decode_matrix.iter().enumerate() {
            row.fill(0);
            for (&pos, &w) in base.iter().zip(weights) {
                gf::addmul_slice(&mut row, &shares[pos].data, w);
            }
            sink.put(j, self.n, &row);
        }
        Ok(())
    }

    /// Corrects errors in `shares` in place.
    ///
    /// Every share beyond the first `required` distinct ones is predicted
    /// from those; columns where any prediction misses are decoded with
    /// Berlekamp-Welch and every share's byte in that column is rewritten
    /// from the recovered codeword. Shares are left untouched on error.
    ///
    /// # Errors
    ///
    /// As [`FecCode::berlekamp_welch`], plus [`FecError::InsufficientShares`]
    /// if fewer than `required` distinct share numbers are present.
    pub fn correct(&self, shares: &mut [Share]) -> Result<(), FecError> {
        let block = self.check_shares(shares)?;
        let base = self.distinct_base(shares)?;

        let mut dirty = vec![false; block];
        let mut syndrome = vec![0u8; block];
        for (pos, share) in shares.iter().enumerate() {
            if base.contains(&pos) {
                continue;
            }
            let weights = self.weights_at(shares, &base, self.points()[share.number as usize])?;
            syndrome.copy_from_slice(&share.data);
            for (&b, &w) in base.iter().zip(&weights) {
                gf::addmul_slice(&mut syndrome, &shares[b].data, w);
            }
            for (d, &s) in dirty.iter_mut().zip(&syndrome) {
                *d |= s != 0;
            }
        }

        let dirty_columns: Vec<usize> = (0..block).filter(|&c| dirty[c]).collect();
        if dirty_columns.is_empty() {
            debug!(block, "all columns consistent");
            return Ok(());
        }

        let mut ws = Workspace::new(self, shares);
        let mut fixes = Vec::new();
        for &column in &dirty_columns {
            ws.load_column(shares, column);
            ws.solve(column)?;
            for (pos, share) in shares.iter().enumerate() {
                let value = poly::evaluate(ws.message(), self.points()[share.number as usize]).0;
                if value != share.data[column] {
                    fixes.push((pos, column, value));
                }
            }
        }

        debug!(
            block,
            dirty = dirty_columns.len(),
            fixed = fixes.len(),
            "corrected shares"
        );
        for (pos, column, value) in fixes {
            shares[pos].data[column] = value;
        }
        Ok(())
    }

    /// Corrects a copy of `shares` and rebuilds the message from it.
    ///
    /// Produces the same output and errors as [`FecCode::berlekamp_welch`] on
    /// shares with distinct numbers, but only pays for Berlekamp-Welch on
    /// columns that actually contain errors.
    ///
    /// # Arguments
    ///
    /// * `shares` - At least `required` shares with distinct numbers.
    /// * `sink` - Optional receiver of the decoded message rows. Without one
    ///   the shares are only checked for decodability.
    ///
    /// # Errors
    ///
    /// As [`FecCode::berlekamp_welch`], plus [`FecError::InsufficientShares`]
    /// if fewer than `required` distinct share numbers are present.
    pub fn decode(&self, shares: &[Share], sink: Option<&mut dyn ShareSink>) -> Result<(), FecError> {
        let mut fixed = shares.to_vec();
        self.correct(&mut fixed)?;
        match sink {
            Some(sink) => self.rebuild(&fixed, sink),
            None => Ok(()),
        }
    }
}
