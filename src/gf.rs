//! Arithmetic over the Galois field GF(2^8).
//!
//! Elements are bytes. Addition is XOR; multiplication and division go
//! through discrete-log/exponent tables relative to the generator `2` of
//! the field defined by `x^8 + x^4 + x^3 + x^2 + 1` (0x11d). The tables are
//! built once, on first use, and are read-only for the rest of the process.

use core::fmt;
use core::ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign};

use lazy_static::lazy_static;

use crate::error::FecError;

/// The irreducible polynomial defining the field, with the `x^8` term.
pub const POLYNOMIAL: u16 = 0x11d;

/// Generator of the multiplicative group (order 255).
pub const GENERATOR: u8 = 2;

struct Tables {
    /// `exp[i] = GENERATOR^i`, doubled so `log[a] + log[b]` never needs a reduction.
    exp: [u8; 510],
    log: [u8; 256],
    /// Full product table, indexed `mul[a][b]`.
    mul: Vec<[u8; 256]>,
}

impl Tables {
    fn build() -> Self {
        let mut exp = [0u8; 510];
        let mut log = [0u8; 256];

        let mut x: u16 = 1;
        for i in 0..255 {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= POLYNOMIAL;
            }
        }
        for i in 255..510 {
            exp[i] = exp[i - 255];
        }

        let mut mul = vec![[0u8; 256]; 256];
        for a in 1..256 {
            for b in 1..256 {
                mul[a][b] = exp[log[a] as usize + log[b] as usize];
            }
        }

        Tables { exp, log, mul }
    }
}

lazy_static! {
    static ref TABLES: Tables = Tables::build();
}

/// Adds two field elements. Subtraction is the same operation.
#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Multiplies two field elements.
#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    TABLES.mul[a as usize][b as usize]
}

/// Divides `a` by `b`.
///
/// # Errors
///
/// Returns [`FecError::DivisionByZero`] when `b` is zero.
#[inline]
pub fn div(a: u8, b: u8) -> Result<u8, FecError> {
    if b == 0 {
        return Err(FecError::DivisionByZero);
    }
    if a == 0 {
        return Ok(0);
    }
    let t = &*TABLES;
    Ok(t.exp[t.log[a as usize] as usize + 255 - t.log[b as usize] as usize])
}

/// Multiplicative inverse of `a`.
///
/// # Errors
///
/// Returns [`FecError::DivisionByZero`] when `a` is zero.
#[inline]
pub fn inv(a: u8) -> Result<u8, FecError> {
    div(1, a)
}

/// `GENERATOR^i`.
#[inline]
pub fn exp(i: usize) -> u8 {
    TABLES.exp[i % 255]
}

/// `dst[i] = c * src[i]` over the shorter of the two slices.
pub fn mul_slice(dst: &mut [u8], src: &[u8], c: u8) {
    let row = &TABLES.mul[c as usize];
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = row[s as usize];
    }
}

/// `dst[i] += c * src[i]` over the shorter of the two slices.
pub fn addmul_slice(dst: &mut [u8], src: &[u8], c: u8) {
    if c == 0 {
        return;
    }
    let row = &TABLES.mul[c as usize];
    for (d, &s) in dst.iter_mut().zip(src) {
        *d ^= row[s as usize];
    }
}

/// A GF(2^8) element with the field operations as operators.
///
/// Division by zero is an error, so division is [`Gf::checked_div`] and
/// [`Gf::inv`] rather than an operator.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Gf(pub u8);

impl Gf {
    pub const ZERO: Gf = Gf(0);
    pub const ONE: Gf = Gf(1);

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn inv(self) -> Result<Gf, FecError> {
        inv(self.0).map(Gf)
    }

    pub fn checked_div(self, rhs: Gf) -> Result<Gf, FecError> {
        div(self.0, rhs.0).map(Gf)
    }
}

impl fmt::Debug for Gf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gf({:#04x})", self.0)
    }
}

impl fmt::Display for Gf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

impl From<u8> for Gf {
    fn from(value: u8) -> Self {
        Gf(value)
    }
}

impl From<Gf> for u8 {
    fn from(value: Gf) -> Self {
        value.0
    }
}

impl Add for Gf {
    type Output = Gf;

    fn add(self, rhs: Gf) -> Gf {
        Gf(add(self.0, rhs.0))
    }
}

impl Sub for Gf {
    type Output = Gf;

    fn sub(self, rhs: Gf) -> Gf {
        Gf(add(self.0, rhs.0))
    }
}

impl Mul for Gf {
    type Output = Gf;

    fn mul(self, rhs: Gf) -> Gf {
        Gf(mul(self.0, rhs.0))
    }
}

impl AddAssign for Gf {
    fn add_assign(&mut self, rhs: Gf) {
        self.0 ^= rhs.0;
    }
}

impl SubAssign for Gf {
    fn sub_assign(&mut self, rhs: Gf) {
        self.0 ^= rhs.0;
    }
}

impl MulAssign for Gf {
    fn mul_assign(&mut self, rhs: Gf) {
        *self = *self * rhs;
    }
}
