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

/// IEEE-754 double precision.
///
/// Arithmetic follows IEEE semantics, so division by zero yields an infinity
/// rather than an error. Shifts are algebraic: `a << b` is `a * 2^b`.
impl Numeric for f64 {
    const DEFAULT_FLAGS: TypeFlags = TypeFlags::NUMERIC.union(TypeFlags::DECIMAL);
    const INTEGRAL: bool = false;
    const NAME: &'static str = "f64";
    const SIGNED: bool = true;
    const SUPPORTED: TypeFlags = TypeFlags::NUMERIC.union(TypeFlags::DECIMAL);

    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn minus_one() -> Option<Self> {
        Some(-1.0)
    }

    fn same_value(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }

    fn hash_value<H: Hasher>(&self, state: &mut H) {
        self.to_bits().hash(state);
    }

    #[allow(clippy::cast_precision_loss)]
    fn read_literal(text: &str, offset: usize, _context: &LiteralContext) -> Result<Option<(Self, usize)>, String> {
        let Some(literal) = scan_literal(text, offset) else {
            return Ok(None);
        };
        let value = match literal.shape {
            LiteralShape::Real | LiteralShape::Integer => {
                literal.text
                       .parse::<Self>()
                       .map_err(|e| format!("invalid number '{}': {e}", literal.text))?
            },
            LiteralShape::Hex => {
                let bits = u64::from_str_radix(&literal.text[2..], 16).map_err(|_| {
                               format!("hexadecimal literal '{}' is too large", literal.text)
                           })?;
                bits as Self
            },
        };
        Ok(Some((value, literal.end)))
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
        Ok(self / rhs)
    }

    fn try_rem(&self, rhs: &Self) -> EvalResult<Self> {
        Ok(self % rhs)
    }

    fn try_neg(&self) -> EvalResult<Self> {
        Ok(-self)
    }

    fn try_truncate(&self) -> EvalResult<Self> {
        if self.is_finite() {
            Ok(self.trunc())
        } else {
            Err(EvalError::domain(format!("cannot truncate non-finite value {self}")))
        }
    }

    fn try_pow(&self, rhs: &Self) -> EvalResult<Self> {
        Ok(self.powf(*rhs))
    }

    fn try_shl(&self, rhs: &Self) -> EvalResult<Self> {
        Ok(self * 2.0_f64.powf(*rhs))
    }

    fn try_shr(&self, rhs: &Self) -> EvalResult<Self> {
        Ok(self / 2.0_f64.powf(*rhs))
    }
}
