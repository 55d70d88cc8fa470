//! Code configuration and the systematic encoder.
//!
//! A [`FecCode`] with `required = k` and `total = n` treats every byte column
//! of the message as the values of a polynomial `F` of degree below `k` at
//! the evaluation points of shares `0..k`, and produces share `i` by
//! evaluating `F` at share `i`'s point. Share `0` sits at `0`, share `i > 0`
//! at `2^(i-1)`, which gives 256 distinct points.

use tracing::debug;

use crate::error::FecError;
use crate::gf::{self, Gf};
use crate::poly;
use crate::share::{Share, ShareSink};

/// Largest supported `total`: the number of distinct evaluation points.
pub const MAX_SHARES: usize = 256;

/// Evaluation point assigned to share `number`.
pub fn eval_point(number: usize) -> u8 {
    if number == 0 {
        0
    } else {
        gf::exp(number - 1)
    }
}

/// An immutable `(required, total)` Reed-Solomon code over GF(2^8).
///
/// # Examples
///
/// ```rust
/// use shardfec::code::FecCode;
/// use shardfec::share::ShareCollector;
///
/// let code = FecCode::new(3, 7).unwrap();
/// let mut collector = ShareCollector::new();
/// code.encode(&[1, 2, 3], &mut collector).unwrap();
/// assert_eq!(collector.concat(), vec![0x01, 0x02, 0x03, 0x15, 0x69, 0xcc, 0xf2]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FecCode {
    pub(crate) k: usize,
    pub(crate) n: usize,
    points: Vec<Gf>,
    /// `n × k` generator matrix, row-major. The top `k` rows are the identity.
    matrix: Vec<u8>,
}

impl FecCode {
    /// Builds the code for `required` message shares out of `total`.
    ///
    /// # Arguments
    ///
    /// * `required` - Number of shares needed to rebuild a message (`k`).
    /// * `total` - Number of shares produced per message (`n`).
    ///
    /// # Returns
    ///
    /// The code with its evaluation points and generator matrix in place.
    ///
    /// # Errors
    ///
    /// Returns [`FecError::InvalidParameters`] unless
    /// `1 <= required <= total <= 256`.
    pub fn new(required: usize, total: usize) -> Result<Self, FecError> {
        if required == 0 || required > total || total > MAX_SHARES {
            return Err(FecError::InvalidParameters(format!(
                "requires 1 <= required <= total <= {MAX_SHARES}, got required={required} total={total}"
            )));
        }

        let points: Vec<Gf> = (0..total).map(|i| Gf(eval_point(i))).collect();

        let mut matrix = vec![0u8; total * required];
        for i in 0..required {
            matrix[i * required + i] = 1;
        }

        let mut weights = vec![Gf::ZERO; required];
        for i in required..total {
            poly::lagrange_weights(&points[..required], points[i], &mut weights)?;
            for (dst, w) in matrix[i * required..(i + 1) * required].iter_mut().zip(&weights) {
                *dst = w.0;
            }
        }

        debug!(required, total, "built generator matrix");

        Ok(FecCode {
            k: required,
            n: total,
            points,
            matrix,
        })
    }

    /// Number of shares needed to decode (`k`).
    pub fn required(&self) -> usize {
        self.k
    }

    /// Number of shares produced by [`FecCode::encode`] (`n`).
    pub fn total(&self) -> usize {
        self.n
    }

    /// Evaluation point of share `number`, or `None` past `total`.
    pub fn point(&self, number: usize) -> Option<u8> {
        self.points.get(number).map(|p| p.0)
    }

    pub(crate) fn points(&self) -> &[Gf] {
        &self.points
    }

    /// Row `number` of the generator matrix.
    ///
    /// # Panics
    ///
    /// Panics if `number >= total`.
    pub fn generator_row(&self, number: usize) -> &[u8] {
        &self.matrix[number * self.k..(number + 1) * self.k]
    }

    /// Length of each share for a message of `len` bytes.
    fn block_size(&self, len: usize) -> Result<usize, FecError> {
        if len == 0 || len % self.k != 0 {
            return Err(FecError::InvalidInputLength {
                expected: len.div_ceil(self.k).max(1) * self.k,
                actual: len,
            });
        }
        Ok(len / self.k)
    }

    fn fill_row(&self, number: usize, data: &[u8], block: usize, out: &mut [u8]) {
        let row = self.generator_row(number);
        gf::mul_slice(out, &data[..block], row[0]);
        for (j, &c) in row.iter().enumerate().skip(1) {
            gf::addmul_slice(out, &data[j * block..(j + 1) * block], c);
        }
    }

    /// Encodes `data` and hands each of the `total` shares to `sink`, in
    /// increasing share order.
    ///
    /// `data` is read as `required` consecutive rows of equal length; the
    /// first `required` shares are those rows unchanged.
    ///
    /// # Arguments
    ///
    /// * `data` - The message, `required` rows of `data.len() / required` bytes.
    /// * `sink` - Receives `(number, total, share)` for every share.
    ///
    /// # Errors
    ///
    /// Returns [`FecError::InvalidInputLength`] if `data` is empty or its
    /// length is not a multiple of `required`.
    pub fn encode<S>(&self, data: &[u8], sink: &mut S) -> Result<(), FecError>
    where
        S: ShareSink + ?Sized,
    {
        let block = self.block_size(data.len())?;
        debug!(k = self.k, n = self.n, block, "encoding block");

        for i in 0..self.k {
            sink.put(i, self.n, &data[i * block..(i + 1) * block]);
        }

        let mut parity = vec![0u8; block];
        for i in self.k..self.n {
            self.fill_row(i, data, block, &mut parity);
            sink.put(i, self.n, &parity);
        }

        Ok(())
    }

    /// Computes only share `number` of `data`'s encoding.
    ///
    /// # Errors
    ///
    /// [`FecError::InvalidParameters`] if `number >= total`, otherwise the
    /// same length errors as [`FecCode::encode`].
    pub fn encode_single(&self, data: &[u8], number: usize) -> Result<Share, FecError> {
        if number >= self.n {
            return Err(FecError::InvalidParameters(format!(
                "share number {number} out of range for total {}",
                self.n
            )));
        }
        let block = self.block_size(data.len())?;

        let mut out = vec![0u8; block];
        if number < self.k {
            out.copy_from_slice(&data[number * block..(number + 1) * block]);
        } else {
            self.fill_row(number, data, block, &mut out);
        }
        Ok(Share::new(number as u16, out))
    }
}
