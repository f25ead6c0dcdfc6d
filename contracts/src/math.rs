//! Fixed-point helpers.
//!
//! All prices, ratios and rates share one decimal scale (1e18). A product of
//! two scaled values is rescaled exactly once. Every helper comes in a
//! rounding-down and a rounding-up flavour: amounts paid out by the protocol
//! round down, amounts owed to it round up.

use odra::casper_types::U256;
use crate::errors::{ProtocolError, ProtocolResult};

/// Fixed-point scale (1e18 = 1.0)
pub const SCALE: u128 = 1_000_000_000_000_000_000;

/// `1.0` as a scaled value
pub fn one() -> U256 {
    U256::from(SCALE)
}

/// Scaled value from a whole number
pub fn from_whole(value: u64) -> U256 {
    U256::from(value) * one()
}

/// Scaled value from a fraction `numerator / denominator`
pub fn ratio(numerator: u64, denominator: u64) -> U256 {
    U256::from(numerator) * one() / U256::from(denominator)
}

/// `a * b / d`, rounded down
pub fn mul_div_down(a: U256, b: U256, d: U256) -> ProtocolResult<U256> {
    if d.is_zero() {
        return Err(ProtocolError::MathOverflow);
    }
    let product = a.checked_mul(b).ok_or(ProtocolError::MathOverflow)?;
    Ok(product / d)
}

/// `a * b / d`, rounded up
pub fn mul_div_up(a: U256, b: U256, d: U256) -> ProtocolResult<U256> {
    if d.is_zero() {
        return Err(ProtocolError::MathOverflow);
    }
    let product = a.checked_mul(b).ok_or(ProtocolError::MathOverflow)?;
    let quotient = product / d;
    if (product % d).is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256::one())
    }
}

/// `a * b` for scaled `b`, rounded down
pub fn mul_down(a: U256, b: U256) -> ProtocolResult<U256> {
    mul_div_down(a, b, one())
}

/// `a * b` for scaled `b`, rounded up
pub fn mul_up(a: U256, b: U256) -> ProtocolResult<U256> {
    mul_div_up(a, b, one())
}

/// `a / b` for scaled `b`, rounded down
pub fn div_down(a: U256, b: U256) -> ProtocolResult<U256> {
    mul_div_down(a, one(), b)
}

/// `a / b` for scaled `b`, rounded up
pub fn div_up(a: U256, b: U256) -> ProtocolResult<U256> {
    mul_div_up(a, one(), b)
}

pub fn checked_add(a: U256, b: U256) -> ProtocolResult<U256> {
    a.checked_add(b).ok_or(ProtocolError::MathOverflow)
}
