//! Berlekamp-Welch error correction.
//!
//! For one byte column, the `r` received values `y_i` at points `x_i` come
//! from a polynomial `F` of degree below `k`, except at up to
//! `(r - k) / 2` corrupted shares. With an error locator `E` (monic, degree
//! `e`, vanishing at the corrupted points) and `Q = E * F`, every share
//! satisfies `y_i * E(x_i) = Q(x_i)`, which is linear in the coefficients of
//! `E` and `Q`. Solving that system for `e = maxE, …, 0` and dividing `Q` by
//! `E` recovers `F`.

use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::code::FecCode;
use crate::error::FecError;
use crate::gf::Gf;
use crate::matrix::Matrix;
use crate::poly;
use crate::share::{Share, ShareSink};

/// Scratch space for decoding one set of shares, column after column.
///
/// Every buffer is sized for the largest candidate error count, so decoding
/// does not allocate after construction.
pub(crate) struct Workspace {
    k: usize,
    max_errors: usize,
    points: Vec<Gf>,
    values: Vec<Gf>,
    system: Matrix,
    q: Vec<Gf>,
    locator: Vec<Gf>,
    message: Vec<Gf>,
}

impl Workspace {
    pub(crate) fn new(code: &FecCode, shares: &[Share]) -> Self {
        let k = code.k;
        let r = shares.len();
        let max_errors = (r - k) / 2;
        let unknowns = k + 2 * max_errors;

        Workspace {
            k,
            max_errors,
            points: shares
                .iter()
                .map(|s| code.points()[s.number as usize])
                .collect(),
            values: vec![Gf::ZERO; r],
            system: Matrix::with_capacity(r * (unknowns + 1)),
            q: Vec::with_capacity(k + max_errors),
            locator: Vec::with_capacity(max_errors + 1),
            message: Vec::with_capacity(k),
        }
    }

    pub(crate) fn load_column(&mut self, shares: &[Share], column: usize) {
        for (v, share) in self.values.iter_mut().zip(shares) {
            *v = Gf(share.data[column]);
        }
    }

    /// Finds `F` for the loaded column. On success `self.message` holds its
    /// coefficients, `self.locator` holds `E`, and the error count is returned.
    pub(crate) fn solve(&mut self, column: usize) -> Result<usize, FecError> {
        let k = self.k;
        let r = self.points.len();

        for e in (0..=self.max_errors).rev() {
            let unknowns = k + 2 * e;
            if r < unknowns {
                continue;
            }

            // Unknown order: q_0..q_{k+e-1}, then e_0..e_{e-1}.
            self.system.reset(r, unknowns + 1);
            for i in 0..r {
                let x = self.points[i];
                let y = self.values[i];
                let row = self.system.row_mut(i);
                let mut xp = Gf::ONE;
                for j in 0..k + e {
                    row[j] = xp;
                    if j < e {
                        row[k + e + j] = y * xp;
                    }
                    if j == e {
                        row[unknowns] = y * xp;
                    }
                    xp *= x;
                }
            }

            if !self.system.solve_augmented()? {
                trace!(column, e, "singular or inconsistent system");
                continue;
            }

            self.q.clear();
            self.q
                .extend((0..k + e).map(|j| self.system.get(j, unknowns)));
            self.locator.clear();
            self.locator
                .extend((0..e).map(|j| self.system.get(k + e + j, unknowns)));
            self.locator.push(Gf::ONE);
            self.message.clear();
            self.message.resize(k, Gf::ZERO);

            poly::div_rem(&mut self.q, &self.locator, &mut self.message)?;
            if !poly::is_zero(&self.q[..e]) {
                trace!(column, e, "nonzero remainder");
                continue;
            }

            return Ok(e);
        }

        warn!(column, shares = r, required = k, "column is uncorrectable");
        Err(FecError::Uncorrectable { column })
    }

    /// Coefficients of the last recovered message polynomial.
    pub(crate) fn message(&self) -> &[Gf] {
        &self.message
    }

    /// Number of loaded shares whose point is a root of the locator.
    fn located_errors(&self) -> usize {
        self.points
            .iter()
            .filter(|&&x| poly::evaluate(&self.locator, x).is_zero())
            .count()
    }
}

impl FecCode {
    /// Checks a set of shares against this code and returns their common length.
    pub(crate) fn check_shares(&self, shares: &[Share]) -> Result<usize, FecError> {
        if shares.len() < self.k {
            return Err(FecError::InsufficientShares {
                needed: self.k,
                got: shares.len(),
            });
        }

        let len = shares[0].data.len();
        for share in shares {
            if share.number as usize >= self.n {
                return Err(FecError::InvalidParameters(format!(
                    "share number {} out of range for total {}",
                    share.number, self.n
                )));
            }
            if share.data.len() != len {
                return Err(FecError::InvalidInputLength {
                    expected: len,
                    actual: share.data.len(),
                });
            }
        }
        Ok(len)
    }

    /// Decodes a single byte column and returns the full corrected codeword,
    /// one byte per share `0..total`.
    ///
    /// # Errors
    ///
    /// [`FecError::InsufficientShares`] for fewer than `required` shares,
    /// [`FecError::InvalidInputLength`] if the shares differ in length or are
    /// too short for `column`, and [`FecError::Uncorrectable`] if the column
    /// has more errors than the shares can correct.
    pub fn decode_column(&self, shares: &[Share], column: usize) -> Result<Vec<u8>, FecError> {
        let len = self.check_shares(shares)?;
        if column >= len {
            return Err(FecError::InvalidInputLength {
                expected: column + 1,
                actual: len,
            });
        }

        let mut ws = Workspace::new(self, shares);
        ws.load_column(shares, column);
        let e = ws.solve(column)?;
        trace!(column, e, errors = ws.located_errors(), "decoded column");

        Ok(self
            .points()
            .iter()
            .map(|&x| poly::evaluate(&ws.message, x).0)
            .collect())
    }

    /// Recovers the message from `shares`, correcting corrupted shares.
    ///
    /// Shares may be any subset of the code's shares in any order. Each byte
    /// column is decoded independently. On success `sink` (if any) receives
    /// the `required` message rows as `(number, total, row)` in increasing
    /// number order; without a sink the shares are only checked for
    /// decodability. Nothing is delivered if any column fails.
    ///
    /// # Arguments
    ///
    /// * `shares` - At least `required` shares of equal length.
    /// * `sink` - Optional receiver of the decoded message rows.
    ///
    /// # Returns
    ///
    /// `Ok(())` once every column has decoded and the rows have been delivered.
    ///
    /// # Errors
    ///
    /// The same as [`FecCode::decode_column`]; a failing column stops the
    /// decode and its error is returned.
    pub fn berlekamp_welch(
        &self,
        shares: &[Share],
        sink: Option<&mut dyn ShareSink>,
    ) -> Result<(), FecError> {
        let block = self.check_shares(shares)?;
        debug!(k = self.k, n = self.n, shares = shares.len(), block, "berlekamp-welch decode");

        let mut ws = Workspace::new(self, shares);
        let mut rows = match sink {
            Some(_) => vec![0u8; self.k * block],
            None => Vec::new(),
        };
        let mut corrected = 0;

        for column in 0..block {
            ws.load_column(shares, column);
            if ws.solve(column)? > 0 {
                corrected += ws.located_errors();
            }
            if !rows.is_empty() {
                for j in 0..self.k {
                    rows[j * block + column] = poly::evaluate(&ws.message, self.points()[j]).0;
                }
            }
        }

        debug!(block, corrected, "decoded all columns");

        if let Some(sink) = sink {
            for j in 0..self.k {
                sink.put(j, self.n, &rows[j * block..(j + 1) * block]);
            }
        }
        Ok(())
    }

    /// [`FecCode::berlekamp_welch`] with columns decoded on the rayon pool.
    ///
    /// Output and errors are identical to the sequential decode: when several
    /// columns fail, the lowest column index is reported.
    pub fn par_berlekamp_welch(
        &self,
        shares: &[Share],
        sink: Option<&mut dyn ShareSink>,
    ) -> Result<(), FecError> {
        let block = self.check_shares(shares)?;
        debug!(k = self.k, n = self.n, shares = shares.len(), block, "parallel berlekamp-welch decode");

        // Column-major: column c occupies columns[c * k..(c + 1) * k].
        let mut columns = vec![0u8; self.k * block];
        let results: Vec<Result<(), FecError>> = columns
            .par_chunks_mut(self.k)
            .enumerate()
            .map_init(
                || Workspace::new(self, shares),
                |ws, (column, out)| -> Result<(), FecError> {
                    ws.load_column(shares, column);
                    ws.solve(column)?;
                    for (j, o) in out.iter_mut().enumerate() {
                        *o = poly::evaluate(&ws.message, self.points()[j]).0;
                    }
                    Ok(())
                },
            )
            .collect();

        if let Some(err) = results.into_iter().find_map(Result::err) {
            return Err(err);
        }

        if let Some(sink) = sink {
            let mut row = vec![0u8; block];
            for j in 0..self.k {
                for (column, b) in row.iter_mut().enumerate() {
                    *b = columns[column * self.k + j];
                }
                sink.put(j, self.n, &row);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::ShareCollector;
    use crate::test_utils::{copy_shares, mutate_share, permute_shares, some_message, some_shares};
    use rand::Rng;

    #[test]
    fn test_single_column_codeword() {
        let code = FecCode::new(3, 7).unwrap();
        let shares = some_shares(&code, 1);

        let out = code.decode_column(&shares, 0).unwrap();
        assert_eq!(out, vec![0x01, 0x02, 0x03, 0x15, 0x69, 0xcc, 0xf2]);
    }

    #[test]
    fn test_single_column_any_three_shares() {
        let code = FecCode::new(3, 7).unwrap();
        let shares = some_shares(&code, 1);

        for a in 0..7 {
            for b in a + 1..7 {
                for c in b + 1..7 {
                    let subset = vec![shares[c].clone(), shares[a].clone(), shares[b].clone()];
                    let out = code.decode_column(&subset, 0).unwrap();
                    assert_eq!(&out[..3], &[1, 2, 3], "subset {a} {b} {c}");
                }
            }
        }
    }

    #[test]
    fn test_single_column_any_one_flip() {
        let code = FecCode::new(3, 7).unwrap();
        let shares = some_shares(&code, 1);

        for i in 0..7 {
            let mut corrupted = copy_shares(&shares);
            corrupted[i].data[0] ^= 0x5a;
            let out = code.decode_column(&corrupted, 0).unwrap();
            assert_eq!(out, vec![0x01, 0x02, 0x03, 0x15, 0x69, 0xcc, 0xf2]);
        }
    }

    #[test]
    fn test_decode_column_checks_arguments() {
        let code = FecCode::new(3, 7).unwrap();
        let shares = some_shares(&code, 2);

        assert_eq!(
            code.decode_column(&shares[..2], 0),
            Err(FecError::InsufficientShares { needed: 3, got: 2 })
        );
        assert_eq!(
            code.decode_column(&shares, 2),
            Err(FecError::InvalidInputLength {
                expected: 3,
                actual: 2
            })
        );

        let mut bad = copy_shares(&shares);
        bad[4].data.pop();
        assert!(matches!(
            code.decode_column(&bad, 0),
            Err(FecError::InvalidInputLength { .. })
        ));

        let mut bad = copy_shares(&shares);
        bad[0].number = 7;
        assert!(matches!(
            code.decode_column(&bad, 0),
            Err(FecError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_berlekamp_welch_two_errors() {
        let code = FecCode::new(3, 7).unwrap();
        let mut shares = some_shares(&code, 256);
        code.berlekamp_welch(&shares, None).unwrap();

        let original = copy_shares(&shares);
        shares[0].data[0] = shares[0].data[0].wrapping_add(1);
        shares[1].data[0] = shares[1].data[0].wrapping_add(1);

        let mut decoded = ShareCollector::new();
        code.berlekamp_welch(&shares, Some(&mut decoded)).unwrap();
        assert_eq!(decoded.shares(), &original[..3]);
    }

    #[test]
    fn test_berlekamp_welch_zero_message() {
        let code = FecCode::new(20, 40).unwrap();
        let mut buf = vec![0u8; 200];
        buf.extend(std::iter::repeat(0x14).take(20));

        let mut collector = ShareCollector::new();
        code.encode(&buf, &mut collector).unwrap();
        let mut shares = collector.into_shares();
        shares[0].data[0] = shares[0].data[0].wrapping_add(1);

        code.berlekamp_welch(&shares, None).unwrap();

        let mut decoded = ShareCollector::new();
        code.berlekamp_welch(&shares, Some(&mut decoded)).unwrap();
        assert_eq!(decoded.concat(), buf);
    }

    #[test]
    fn test_berlekamp_welch_random_errors() {
        let code = FecCode::new(3, 7).unwrap();
        let block = 64;
        let shares = some_shares(&code, block);
        let mut rng = rand::thread_rng();

        for _ in 0..50 {
            let mut corrupted = copy_shares(&shares);
            for column in 0..block {
                for _ in 0..2 {
                    let victim = rng.gen_range(0..7);
                    mutate_share(&mut rng, column, &mut corrupted[victim]);
                }
            }

            let mut decoded = ShareCollector::new();
            code.berlekamp_welch(&corrupted, Some(&mut decoded)).unwrap();
            assert_eq!(decoded.shares(), &shares[..3]);
        }
    }

    #[test]
    fn test_berlekamp_welch_random_subsets() {
        let code = FecCode::new(3, 7).unwrap();
        let block = 64;
        let shares = some_shares(&code, block);
        let mut rng = rand::thread_rng();

        for _ in 0..50 {
            let mut subset = copy_shares(&shares);
            permute_shares(&mut rng, &mut subset);
            subset.truncate(3 + 2 + rng.gen_range(0..2));

            for column in 0..block {
                let victim = rng.gen_range(0..subset.len());
                mutate_share(&mut rng, column, &mut subset[victim]);
            }

            let mut decoded = ShareCollector::new();
            code.berlekamp_welch(&subset, Some(&mut decoded)).unwrap();
            assert_eq!(decoded.shares(), &shares[..3]);
        }
    }

    #[test]
    fn test_berlekamp_welch_correction_bound() {
        let code = FecCode::new(20, 40).unwrap();
        let shares = some_shares(&code, 4);
        let mut rng = rand::thread_rng();

        for errors in 0..=10 {
            let mut corrupted = copy_shares(&shares);
            permute_shares(&mut rng, &mut corrupted);
            for share in corrupted.iter_mut().take(errors) {
                for column in 0..4 {
                    mutate_share(&mut rng, column, share);
                }
            }

            let mut decoded = ShareCollector::new();
            code.berlekamp_welch(&corrupted, Some(&mut decoded)).unwrap();
            assert_eq!(decoded.shares(), &shares[..20], "{errors} errors");
        }
    }

    #[test]
    fn test_berlekamp_welch_beyond_bound_never_lies() {
        let code = FecCode::new(20, 40).unwrap();
        let shares = some_shares(&code, 4);
        let mut rng = rand::thread_rng();

        for _ in 0..50 {
            let errors = rng.gen_range(11..=20);
            let mut corrupted = copy_shares(&shares);
            permute_shares(&mut rng, &mut corrupted);
            for share in corrupted.iter_mut().take(errors) {
                for column in 0..4 {
                    mutate_share(&mut rng, column, share);
                }
            }

            let mut decoded = ShareCollector::new();
            match code.berlekamp_welch(&corrupted, Some(&mut decoded)) {
                Ok(()) => assert_eq!(decoded.shares(), &shares[..20], "{errors} errors"),
                Err(err) => {
                    assert!(matches!(err, FecError::Uncorrectable { .. }), "{err}");
                    assert!(decoded.shares().is_empty());
                }
            }
        }
    }

    #[test]
    fn test_berlekamp_welch_reports_first_failing_column() {
        let code = FecCode::new(3, 5).unwrap();
        let mut shares = some_shares(&code, 4);
        // One correctable error in column 1, three errors in columns 2 and 3.
        shares[0].data[1] ^= 1;
        for column in 2..4 {
            for share in shares.iter_mut().take(3) {
                share.data[column] ^= 0x80;
            }
        }

        let mut decoded = ShareCollector::new();
        let err = code.berlekamp_welch(&shares, Some(&mut decoded)).unwrap_err();
        assert_eq!(err, FecError::Uncorrectable { column: 2 });
        assert!(decoded.shares().is_empty());

        let err = code.par_berlekamp_welch(&shares, None).unwrap_err();
        assert_eq!(err, FecError::Uncorrectable { column: 2 });
    }

    #[test]
    fn test_berlekamp_welch_exact_shares_no_redundancy() {
        let code = FecCode::new(4, 8).unwrap();
        let shares = some_shares(&code, 16);

        let mut decoded = ShareCollector::new();
        code.berlekamp_welch(&shares[4..], Some(&mut decoded)).unwrap();
        assert_eq!(decoded.shares(), &shares[..4]);
    }

    #[test]
    fn test_berlekamp_welch_insufficient_shares() {
        let code = FecCode::new(4, 8).unwrap();
        let shares = some_shares(&code, 16);
        assert_eq!(
            code.berlekamp_welch(&shares[..3], None),
            Err(FecError::InsufficientShares { needed: 4, got: 3 })
        );
        assert_eq!(
            code.berlekamp_welch(&[], None),
            Err(FecError::InsufficientShares { needed: 4, got: 0 })
        );
    }

    #[test]
    fn test_par_berlekamp_welch_matches_sequential() {
        let code = FecCode::new(5, 11).unwrap();
        let block = 96;
        let mut shares = some_shares(&code, block);
        let mut rng = rand::thread_rng();
        for column in 0..block {
            for _ in 0..3 {
                let victim = rng.gen_range(0..11);
                mutate_share(&mut rng, column, &mut shares[victim]);
            }
        }

        let mut sequential = ShareCollector::new();
        code.berlekamp_welch(&shares, Some(&mut sequential)).unwrap();
        let mut parallel = ShareCollector::new();
        code.par_berlekamp_welch(&shares, Some(&mut parallel)).unwrap();

        assert_eq!(sequential.shares(), parallel.shares());
        assert_eq!(sequential.concat(), some_message(code.required() * block));
    }
}
