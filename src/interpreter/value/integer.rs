use std::hash::{Hash, Hasher};

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

/// Masks a shift count to the 0..=63 range, so `x << 64` equals `x << 0`.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
const fn shift_count(count: u64) -> u32 {
    (count & 63) as u32
}

/// Implements [`Numeric`] for a 64-bit integer type.
///
/// Arithmetic is checked: overflow raises [`EvalError::Overflow`] and
/// division or remainder by zero raises [`EvalError::DivisionByZero`].
/// Shifts mask their count, and `>>` is arithmetic for signed types.
/// Hexadecimal literals are read as a 64-bit pattern, so `0x8000000000000000`
/// is `i64::MIN`.
macro_rules! integer_numeric {
    ($t:ty, signed = $signed:expr, minus_one = $minus_one:expr) => {
        impl Numeric for $t {
            const DEFAULT_FLAGS: TypeFlags = TypeFlags::NUMERIC.union(TypeFlags::INTEGER);
            const INTEGRAL: bool = true;
            const NAME: &'static str = stringify!($t);
            const SIGNED: bool = $signed;
            const SUPPORTED: TypeFlags = TypeFlags::NUMERIC.union(TypeFlags::INTEGER);

            fn zero() -> Self {
                0
            }

            fn one() -> Self {
                1
            }

            fn minus_one() -> Option<Self> {
                $minus_one
            }

            fn same_value(&self, other: &Self) -> bool {
                self == other
            }

            fn hash_value<H: Hasher>(&self, state: &mut H) {
                self.hash(state);
            }

            #[allow(clippy::cast_possible_wrap, clippy::unnecessary_cast)]
            fn read_literal(text: &str,
                            offset: usize,
                            _context: &LiteralContext)
                            -> Result<Option<(Self, usize)>, String> {
                let Some(literal) = scan_literal(text, offset) else {
                    return Ok(None);
                };
                let value = match literal.shape {
                    LiteralShape::Integer => literal.text.parse::<Self>().ok(),
                    LiteralShape::Hex => u64::from_str_radix(&literal.text[2..], 16).ok().map(|bits| bits as Self),
                    LiteralShape::Real => {
                        return Err(format!("fractional literal '{}' is not allowed for {}",
                                           literal.text,
                                           Self::NAME));
                    },
                };
                value.map(|v| Some((v, literal.end)))
                     .ok_or_else(|| format!("literal '{}' does not fit in {}", literal.text, Self::NAME))
            }

            fn try_add(&self, rhs: &Self) -> EvalResult<Self> {
                self.checked_add(*rhs).ok_or(EvalError::Overflow)
            }

            fn try_sub(&self, rhs: &Self) -> EvalResult<Self> {
                self.checked_sub(*rhs).ok_or(EvalError::Overflow)
            }

            fn try_mul(&self, rhs: &Self) -> EvalResult<Self> {
                self.checked_mul(*rhs).ok_or(EvalError::Overflow)
            }

            fn try_div(&self, rhs: &Self) -> EvalResult<Self> {
                if *rhs == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                self.checked_div(*rhs).ok_or(EvalError::Overflow)
            }

            fn try_rem(&self, rhs: &Self) -> EvalResult<Self> {
                if *rhs == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                self.checked_rem(*rhs).ok_or(EvalError::Overflow)
            }

            fn try_neg(&self) -> EvalResult<Self> {
                self.checked_neg().ok_or(EvalError::Overflow)
            }

            fn try_truncate(&self) -> EvalResult<Self> {
                Ok(*self)
            }

            #[allow(clippy::cast_sign_loss)]
            fn try_shl(&self, rhs: &Self) -> EvalResult<Self> {
                Ok(self.wrapping_shl(shift_count(*rhs as u64)))
            }

            #[allow(clippy::cast_sign_loss)]
            fn try_shr(&self, rhs: &Self) -> EvalResult<Self> {
                Ok(self.wrapping_shr(shift_count(*rhs as u64)))
            }

            fn try_bit_or(&self, rhs: &Self) -> EvalResult<Self> {
                Ok(self | rhs)
            }

            fn try_bit_and(&self, rhs: &Self) -> EvalResult<Self> {
                Ok(self & rhs)
            }

            fn try_bit_xor(&self, rhs: &Self) -> EvalResult<Self> {
                Ok(self ^ rhs)
            }

            fn try_not(&self) -> EvalResult<Self> {
                Ok(!self)
            }
        }
    };
}

integer_numeric!(i64, signed = true, minus_one = Some(-1));
integer_numeric!(u64, signed = false, minus_one = None);
