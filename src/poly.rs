//! Polynomials over GF(2^8) stored as flat coefficient slices.
//!
//! Index `i` holds the coefficient of `x^i`. The decoder keeps these in
//! preallocated buffers, so everything here works on borrowed slices.

use crate::error::FecError;
use crate::gf::Gf;

/// Evaluates the polynomial at `x` (Horner's rule).
pub fn evaluate(coefficients: &[Gf], x: Gf) -> Gf {
    let mut result = Gf::ZERO;
    for &coeff in coefficients.iter().rev() {
        result = result * x + coeff;
    }
    result
}

/// Long division of `dividend` by `divisor`.
///
/// Writes the quotient into `quotient` and leaves the remainder in the low
/// `divisor.len() - 1` coefficients of `dividend` (everything above is zeroed
/// by the elimination). `quotient` must hold `dividend.len() - divisor.len() + 1`
/// coefficients; when the dividend is shorter than the divisor the quotient is
/// empty and the dividend is already the remainder.
///
/// # Errors
///
/// Returns [`FecError::DivisionByZero`] if the divisor's leading coefficient is zero.
pub fn div_rem(dividend: &mut [Gf], divisor: &[Gf], quotient: &mut [Gf]) -> Result<(), FecError> {
    let lead = match divisor.last() {
        Some(&lead) if !lead.is_zero() => lead,
        _ => return Err(FecError::DivisionByZero),
    };
    if dividend.len() < divisor.len() {
        return Ok(());
    }

    let deg = divisor.len() - 1;
    let lead_inv = lead.inv()?;
    for i in (0..dividend.len() - deg).rev() {
        let coeff = dividend[i + deg] * lead_inv;
        quotient[i] = coeff;
        if coeff.is_zero() {
            continue;
        }
        for (j, &d) in divisor.iter().enumerate() {
            dividend[i + j] -= coeff * d;
        }
    }
    Ok(())
}

/// True when every coefficient is zero.
pub fn is_zero(coefficients: &[Gf]) -> bool {
    coefficients.iter().all(|c| c.is_zero())
}

/// Lagrange weights of `nodes` at `x`.
///
/// Writes `weights[j] = L_j(x)`, where `L_j` is the basis polynomial that is
/// one at `nodes[j]` and zero at every other node. For any polynomial `p` of
/// degree below `nodes.len()`, `p(x) = sum_j weights[j] * p(nodes[j])`.
///
/// # Errors
///
/// Returns [`FecError::DivisionByZero`] if two nodes coincide.
pub fn lagrange_weights(nodes: &[Gf], x: Gf, weights: &mut [Gf]) -> Result<(), FecError> {
    for (i, &a) in nodes.iter().enumerate() {
        let mut weight = Gf::ONE;

        for (j, &b) in nodes.iter().enumerate() {
            if i != j {
                let top = x - b;
                let bottom = a - b;
                weight *= top.checked_div(bottom)?;
            }
        }

        weights[i] = weight;
    }
    Ok(())
}
