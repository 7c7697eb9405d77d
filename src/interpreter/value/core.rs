use std::{
    fmt::{Debug, Display},
    hash::Hasher,
};

use crate::{
    error::{EvalError, EvalResult},
    interpreter::value::flags::TypeFlags,
};

/// Context handed to a value-reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralContext {
    /// Flags of the grammar being lexed.
    pub flags: TypeFlags,
}

/// A number type an expression can be compiled over.
///
/// The trait bundles everything the grammar, the optimizer and the compiled
/// closures need from `T`: identity elements, checked arithmetic, equality and
/// hashing suitable for structural sharing, and a default literal reader.
/// Operators a type cannot provide keep the default implementation, which
/// reports [`EvalError::Unsupported`]; [`Numeric::SUPPORTED`] must not list
/// the flags that enable them.
pub trait Numeric: Clone + PartialOrd + Debug + Display + Send + Sync + 'static {
    /// Name used in diagnostics.
    const NAME: &'static str;
    /// Flags this type can honor.
    const SUPPORTED: TypeFlags;
    /// Flags used by [`crate::Evaluator::standard`].
    const DEFAULT_FLAGS: TypeFlags;
    /// Whether negative values exist.
    const SIGNED: bool;
    /// Whether every value is integral, making integral conversions no-ops.
    const INTEGRAL: bool;

    fn zero() -> Self;

    fn one() -> Self;

    /// Minus one, for signed types.
    fn minus_one() -> Option<Self>;

    /// Exact equality used for structural sharing; stricter than `==` for
    /// floats so that `0.0` and `-0.0` stay distinct.
    fn same_value(&self, other: &Self) -> bool;

    /// Feeds a hash consistent with [`Numeric::same_value`].
    fn hash_value<H: Hasher>(&self, state: &mut H);

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    fn is_one(&self) -> bool {
        *self == Self::one()
    }

    fn is_minus_one(&self) -> bool {
        Self::minus_one().is_some_and(|m| *self == m)
    }

    /// Truthiness used by conditionals.
    fn is_truthy(&self) -> bool {
        !self.is_zero()
    }

    /// Reads a literal at `offset` of `text`.
    ///
    /// # Returns
    /// - `Ok(Some((value, end)))` when a literal was read.
    /// - `Ok(None)` when no literal starts at `offset`.
    /// - `Err(message)` when a literal starts there but cannot be represented.
    fn read_literal(text: &str, offset: usize, context: &LiteralContext) -> Result<Option<(Self, usize)>, String>;

    fn try_add(&self, rhs: &Self) -> EvalResult<Self>;

    fn try_sub(&self, rhs: &Self) -> EvalResult<Self>;

    fn try_mul(&self, rhs: &Self) -> EvalResult<Self>;

    fn try_div(&self, rhs: &Self) -> EvalResult<Self>;

    fn try_rem(&self, rhs: &Self) -> EvalResult<Self>;

    fn try_neg(&self) -> EvalResult<Self>;

    /// Rounds toward zero; fails when the result cannot be represented.
    fn try_truncate(&self) -> EvalResult<Self>;

    fn try_pow(&self, _rhs: &Self) -> EvalResult<Self> {
        Err(unsupported::<Self>("^"))
    }

    fn try_shl(&self, _rhs: &Self) -> EvalResult<Self> {
        Err(unsupported::<Self>("<<"))
    }

    fn try_shr(&self, _rhs: &Self) -> EvalResult<Self> {
        Err(unsupported::<Self>(">>"))
    }

    fn try_bit_or(&self, _rhs: &Self) -> EvalResult<Self> {
        Err(unsupported::<Self>("|"))
    }

    fn try_bit_and(&self, _rhs: &Self) -> EvalResult<Self> {
        Err(unsupported::<Self>("&"))
    }

    fn try_bit_xor(&self, _rhs: &Self) -> EvalResult<Self> {
        Err(unsupported::<Self>("^"))
    }

    fn try_not(&self) -> EvalResult<Self> {
        Err(unsupported::<Self>("~"))
    }
}

/// Builds the error reported by operators a type does not implement.
#[must_use]
pub const fn unsupported<T: Numeric>(operator: &'static str) -> EvalError {
    EvalError::Unsupported { operator,
                             type_name: T::NAME }
}

/// Parses a standalone value, accepting an optional leading sign.
///
/// Used to read parameter values from the command line and from test
/// corpora, where the whole string must be consumed.
///
/// # Example
/// ```
/// use exprc::interpreter::value::core::parse_value;
///
/// assert_eq!(parse_value::<f64>("-2.5"), Ok(-2.5));
/// assert_eq!(parse_value::<i64>("0x10"), Ok(16));
/// assert!(parse_value::<u64>("-1").is_err());
/// assert!(parse_value::<i64>("12abc").is_err());
/// ```
pub fn parse_value<T: Numeric>(text: &str) -> Result<T, String> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let context = LiteralContext { flags: T::SUPPORTED };
    match T::read_literal(digits, 0, &context)? {
        Some((value, end)) if end == digits.len() => {
            if negative {
                value.try_neg().map_err(|e| format!("cannot negate '{digits}': {e}"))
            } else {
                Ok(value)
            }
        },
        _ => Err(format!("'{text}' is not a valid {} value", T::NAME)),
    }
}
