//! # Reed-Solomon Forward Error Correction with Berlekamp-Welch Decoding
//!
//! This library implements a systematic Reed-Solomon code over GF(2^8). A message is split into
//! `required` shares, `total - required` parity shares are added, and the message can be rebuilt
//! from any `required` of the `total` shares. When more shares than that are available, the extra
//! redundancy is used to find and correct corrupted shares with the Berlekamp-Welch algorithm.
//!
//! ## The Mathematics Behind the Code
//!
//! Every byte column of the message is read as the values of a polynomial `F` of degree below `k`
//! (`k = required`) at `k` fixed points of the field. Share `i` carries `F(x_i)`, where share `0`
//! sits at `x_0 = 0` and share `i > 0` at `x_i = 2^(i-1)`:
//!
//! ```ignore
//! share_i = F(x_i),   F(x) = f0 + f1*x + ... + f(k-1)*x^(k-1)
//! ```
//!
//! The first `k` shares are the message itself (the code is systematic); the others are parity.
//! Any `k` points determine `F`, so any `k` shares suffice to rebuild the message.
//!
//! ### Berlekamp-Welch
//!
//! With `r` shares of which at most `(r - k) / 2` are corrupted, let `E` be the monic polynomial
//! whose roots are the points of the corrupted shares and `Q = E * F`. Then every received value
//! `y_i` satisfies:
//!
//! ```ignore
//! y_i * E(x_i) = Q(x_i)
//! ```
//!
//! which is a linear system in the coefficients of `E` and `Q`. Solving it and dividing `Q` by `E`
//! gives back `F`, and the roots of `E` point at the corrupted shares.
//!
//! ## Usage
//!
//! ### Example: Encoding and Decoding
//!
//! ```rust
//! use shardfec::code::FecCode;
//! use shardfec::share::ShareCollector;
//!
//! let code = FecCode::new(3, 7).unwrap();
//!
//! let mut encoded = ShareCollector::new();
//! code.encode(b"hello world!", &mut encoded).unwrap();
//! let mut shares = encoded.into_shares();
//!
//! // Corrupt two shares and drop another one.
//! shares[1].data[0] ^= 0xff;
//! shares[5].data[2] ^= 0x01;
//! shares.remove(3);
//!
//! let mut decoded = ShareCollector::new();
//! code.berlekamp_welch(&shares, Some(&mut decoded)).unwrap();
//! assert_eq!(decoded.concat(), b"hello world!");
//! ```
//!
//! ## Modules
//!
//! - `gf`: GF(2^8) arithmetic.
//! - `code`: the code configuration and the encoder.
//! - `berlekamp_welch`: the error-correcting decoder.
//! - `rebuild`: erasure rebuild, in-place correction, and the combined decode.
//! - `share`: shares and the sink contract.
//! - `config`: loading code parameters from files and the environment.

/// The `error` module defines [`error::FecError`], returned by every fallible operation.
pub mod error;

/// The `gf` module implements arithmetic over GF(2^8) using log/exponent tables built once per
/// process.
pub mod gf;

/// The `poly` module holds polynomial evaluation, division, and Lagrange weights over flat
/// coefficient slices.
pub mod poly;

/// The `matrix` module provides dense matrices and the Gauss-Jordan solver used by the decoder.
pub mod matrix;

/// The `share` module defines [`share::Share`] and the [`share::ShareSink`] trait through which
/// encoders and decoders stream their output.
pub mod share;

/// The `code` module defines [`code::FecCode`], which owns the generator matrix and encodes
/// messages into shares.
pub mod code;

/// The `berlekamp_welch` module decodes shares column by column, correcting corrupted shares.
pub mod berlekamp_welch;

/// The `rebuild` module adds erasure-only rebuild, in-place correction, and a decode that only
/// runs Berlekamp-Welch on columns that contain errors.
pub mod rebuild;

/// The `config` module loads code parameters from a TOML file and `SHARDFEC_*` environment
/// variables.
pub mod config;

#[cfg(test)]
mod test_utils;

pub use code::FecCode;
pub use error::FecError;
pub use share::{Share, ShareCollector, ShareSink};
