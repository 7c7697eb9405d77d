use std::hash::{Hash, Hasher};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::{
    error::{EvalError, EvalResult},
    interpreter::{
        literal::{LiteralShape, scan_literal},
        value::{
            core::{LiteralContext, Numeric},
            flags::TypeFlags,
        },
    },
};

/// Largest exponent magnitude accepted by `^`, `<<` and `>>`.
///
/// Rational powers grow without bound, so a limit keeps a single token from
/// allocating gigabytes.
pub const MAX_EXPONENT: i32 = 4096;

/// Largest numerator or denominator, in bits, that `^`, `<<` and `>>` may
/// produce.
///
/// Nested powers such as `(10^4096)^4096` stay within [`MAX_EXPONENT`] at
/// every step, so the result size is bounded separately.
pub const MAX_RESULT_BITS: u64 = 1 << 20;

/// Arbitrary-precision decimal arithmetic backed by exact rationals.
///
/// Every finite decimal literal is represented exactly. Division by zero is
/// an error, and powers and shifts require an integral exponent since the
/// result would otherwise be irrational.
impl Numeric for BigRational {
    const DEFAULT_FLAGS: TypeFlags = TypeFlags::NUMERIC.union(TypeFlags::DECIMAL);
    const INTEGRAL: bool = false;
    const NAME: &'static str = "decimal";
    const SIGNED: bool = true;
    const SUPPORTED: TypeFlags = TypeFlags::NUMERIC.union(TypeFlags::DECIMAL);

    fn zero() -> Self {
        Zero::zero()
    }

    fn one() -> Self {
        One::one()
    }

    fn minus_one() -> Option<Self> {
        Some(-<Self as One>::one())
    }

    fn same_value(&self, other: &Self) -> bool {
        self == other
    }

    fn hash_value<H: Hasher>(&self, state: &mut H) {
        self.hash(state);
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }

    fn read_literal(text: &str, offset: usize, _context: &LiteralContext) -> Result<Option<(Self, usize)>, String> {
        let Some(literal) = scan_literal(text, offset) else {
            return Ok(None);
        };
        let value = match literal.shape {
            LiteralShape::Integer | LiteralShape::Real => parse_decimal(literal.text),
            LiteralShape::Hex => BigInt::parse_bytes(literal.text[2..].as_bytes(), 16).map(Self::from_integer),
        };
        value.map(|v| Some((v, literal.end)))
             .ok_or_else(|| format!("invalid decimal literal '{}'", literal.text))
    }

    fn try_add(&self, rhs: &Self) -> EvalResult<Self> {
        Ok(self + rhs)
    }

    fn try_sub(&self, rhs: &Self) -> EvalResult<Self> {
        Ok(self - rhs)
    }

    fn try_mul(&self, rhs: &Self) -> EvalResult<Self> {
        Ok(self * rhs)
    }

    fn try_div(&self, rhs: &Self) -> EvalResult<Self> {
        if Zero::is_zero(rhs) {
            return Err(EvalError::DivisionByZero);
        }
        Ok(self / rhs)
    }

    fn try_rem(&self, rhs: &Self) -> EvalResult<Self> {
        if Zero::is_zero(rhs) {
            return Err(EvalError::DivisionByZero);
        }
        Ok(self % rhs)
    }

    fn try_neg(&self) -> EvalResult<Self> {
        Ok(-self)
    }

    fn try_truncate(&self) -> EvalResult<Self> {
        Ok(self.trunc())
    }

    fn try_pow(&self, rhs: &Self) -> EvalResult<Self> {
        let exponent = integral_exponent(rhs, "^")?;
        if exponent < 0 && Zero::is_zero(self) {
            return Err(EvalError::DivisionByZero);
        }
        let bits = magnitude_bits(self).saturating_mul(u64::from(exponent.unsigned_abs()));
        check_result_bits(bits, "^")?;
        Ok(self.pow(exponent))
    }

    fn try_shl(&self, rhs: &Self) -> EvalResult<Self> {
        let exponent = integral_exponent(rhs, "<<")?;
        check_result_bits(magnitude_bits(self) + u64::from(exponent.unsigned_abs()), "<<")?;
        Ok(self * power_of_two(exponent))
    }

    fn try_shr(&self, rhs: &Self) -> EvalResult<Self> {
        let exponent = integral_exponent(rhs, ">>")?;
        check_result_bits(magnitude_bits(self) + u64::from(exponent.unsigned_abs()), ">>")?;
        Ok(self / power_of_two(exponent))
    }
}

/// Converts an exponent operand to `i32`, rejecting fractions and values
/// beyond [`MAX_EXPONENT`].
fn integral_exponent(value: &BigRational, operator: &str) -> EvalResult<i32> {
    if !value.is_integer() {
        return Err(EvalError::domain(format!("'{operator}' requires an integral exponent, got {value}")));
    }
    value.to_integer()
         .to_i32()
         .filter(|e| e.abs() <= MAX_EXPONENT)
         .ok_or_else(|| EvalError::domain(format!("exponent {value} of '{operator}' is too large")))
}

/// Bits in the larger of numerator and denominator.
fn magnitude_bits(value: &BigRational) -> u64 {
    value.numer().bits().max(value.denom().bits())
}

fn check_result_bits(bits: u64, operator: &str) -> EvalResult<()> {
    if bits > MAX_RESULT_BITS {
        return Err(EvalError::domain(format!("result of '{operator}' would exceed {MAX_RESULT_BITS} bits")));
    }
    Ok(())
}

fn power_of_two(exponent: i32) -> BigRational {
    BigRational::from_integer(BigInt::from(2)).pow(exponent)
}

/// Parses `digits[.digits][e[+-]digits]` exactly.
///
/// # Example
/// ```
/// use exprc::interpreter::value::decimal::parse_decimal;
/// use num_rational::BigRational;
///
/// let quarter = parse_decimal("0.25").unwrap();
/// assert_eq!(quarter, BigRational::new(1.into(), 4.into()));
/// assert_eq!(parse_decimal("1.5e2").unwrap(), BigRational::from_integer(150.into()));
/// ```
#[must_use]
pub fn parse_decimal(text: &str) -> Option<BigRational> {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(at) => (&text[..at], text[at + 1..].parse::<i32>().ok()?),
        None => (text, 0),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{whole}{fraction}");
    let numerator = BigInt::parse_bytes(digits.as_bytes(), 10)?;
    let scale = exponent.checked_sub(i32::try_from(fraction.len()).ok()?)?;
    if scale.abs() > MAX_EXPONENT {
        return None;
    }
    let ten = BigRational::from_integer(BigInt::from(10));
    Some(BigRational::from_integer(numerator) * ten.pow(scale))
}

/// Renders a rational as a decimal string when it has a finite expansion
/// of at most `max_digits` fractional digits, and as `n/d` otherwise.
///
/// # Example
/// ```
/// use exprc::interpreter::value::decimal::{format_decimal, parse_decimal};
/// use num_rational::BigRational;
///
/// assert_eq!(format_decimal(&parse_decimal("-12.375").unwrap(), 20), "-12.375");
/// assert_eq!(format_decimal(&BigRational::new(1.into(), 3.into()), 20), "1/3");
/// ```
#[must_use]
pub fn format_decimal(value: &BigRational, max_digits: usize) -> String {
    if value.is_integer() {
        return value.to_integer().to_string();
    }
    let ten = BigInt::from(10);
    let mut remainder = value.fract().abs();
    let mut fraction = String::new();
    while !Zero::is_zero(&remainder) && fraction.len() < max_digits {
        remainder *= BigRational::from_integer(ten.clone());
        let digit = remainder.to_integer();
        fraction.push_str(&digit.to_string());
        remainder -= BigRational::from_integer(digit);
    }
    if !Zero::is_zero(&remainder) {
        return value.to_string();
    }
    let sign = if value.is_negative() { "-" } else { "" };
    format!("{sign}{}.{fraction}", value.trunc().to_integer().abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal(text: &str) -> BigRational {
        parse_decimal(text).unwrap()
    }

    #[test]
    fn powers_are_bounded_by_result_size() {
        let big = decimal("10").try_pow(&decimal("4096")).unwrap();
        assert!(magnitude_bits(&big) < MAX_RESULT_BITS);
        assert!(matches!(big.try_pow(&decimal("4096")), Err(EvalError::Domain { .. })));
        assert!(matches!(big.try_pow(&decimal("-4096")), Err(EvalError::Domain { .. })));
        assert_eq!(decimal("1").try_pow(&decimal("4096")), Ok(decimal("1")));
    }

    #[test]
    fn shifts_are_bounded_by_result_size() {
        let big = BigRational::from_integer(BigInt::from(2)).pow(1 << 20);
        assert!(matches!(big.try_shl(&decimal("1")), Err(EvalError::Domain { .. })));
        assert_eq!(decimal("3").try_shl(&decimal("2")), Ok(decimal("12")));
        assert_eq!(decimal("3").try_shr(&decimal("1")), Ok(decimal("1.5")));
    }

    #[test]
    fn fractional_exponents_are_rejected() {
        assert!(matches!(decimal("2").try_pow(&decimal("0.5")), Err(EvalError::Domain { .. })));
    }
}
