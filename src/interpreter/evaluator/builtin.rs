use std::cmp::Ordering;

use num_rational::BigRational;

use crate::{
    error::{EvalError, EvalResult},
    interpreter::{evaluator::extensions::Extensions, value::core::Numeric},
};

/// Adds float functions of fixed arity from a table of `name => |args| expr`
/// entries. Each body receives the argument slice and returns a plain `f64`.
macro_rules! float_functions {
    ($extensions:expr, { $($name:literal / $arity:literal => $body:expr),* $(,)? }) => {
        $extensions$(.function($name, $arity, |args: &[f64]| Ok($body(args))))*
    };
}

/// `abs`, `min`, `max`, `sign` and `clamp` for any numeric type.
///
/// # Example
/// ```
/// use exprc::{Evaluator, TypeFlags, builtin};
///
/// let evaluator = Evaluator::<i64>::builder(TypeFlags::NUMERIC).extension(builtin::common())
///                                                              .build()
///                                                              .unwrap();
/// let compiled = evaluator.compile("clamp(abs(x), 0, 10) * sign(x)", &["x"]).unwrap();
/// assert_eq!(compiled.call(&[-42]), Ok(-10));
/// ```
#[must_use]
pub fn common<T: Numeric>() -> Extensions<T> {
    Extensions::<T>::new("common").function("abs", 1, |args| abs(&args[0]))
                                  .function("min", 2, |args| Ok(if args[1] < args[0] { args[1].clone() } else { args[0].clone() }))
                                  .function("max", 2, |args| Ok(if args[1] > args[0] { args[1].clone() } else { args[0].clone() }))
                                  .function("sign", 1, |args| sign(&args[0]))
                                  .function("clamp", 3, |args| clamp(&args[0], &args[1], &args[2]))
}

fn abs<T: Numeric>(value: &T) -> EvalResult<T> {
    if *value < T::zero() {
        value.try_neg()
    } else {
        Ok(value.clone())
    }
}

fn sign<T: Numeric>(value: &T) -> EvalResult<T> {
    match value.partial_cmp(&T::zero()) {
        Some(Ordering::Greater) => Ok(T::one()),
        Some(Ordering::Less) => T::minus_one().ok_or(EvalError::Overflow),
        Some(Ordering::Equal) | None => Ok(value.clone()),
    }
}

fn clamp<T: Numeric>(value: &T, low: &T, high: &T) -> EvalResult<T> {
    if low > high {
        return Err(EvalError::domain(format!("clamp bounds are reversed: {low} > {high}")));
    }
    Ok(if value < low {
        low.clone()
    } else if value > high {
        high.clone()
    } else {
        value.clone()
    })
}

/// The common functions plus the `f64` math library and the constants
/// `Pi`, `E` and `Tau`.
///
/// # Example
/// ```
/// use exprc::{Evaluator, TypeFlags, builtin};
///
/// let evaluator = Evaluator::builder(TypeFlags::NUMERIC | TypeFlags::DECIMAL).extension(builtin::float_math())
///                                                                            .build()
///                                                                            .unwrap();
/// let compiled = evaluator.compile("Pi*2", &[]).unwrap();
/// assert_eq!(compiled.call(&[]), Ok(std::f64::consts::TAU));
/// ```
#[must_use]
pub fn float_math() -> Extensions<f64> {
    let math = Extensions::new("math").constant("Pi", std::f64::consts::PI)
                                      .constant("E", std::f64::consts::E)
                                      .constant("Tau", std::f64::consts::TAU);
    let math = float_functions!(math, {
        "sqrt"  / 1 => |a: &[f64]| a[0].sqrt(),
        "exp"   / 1 => |a: &[f64]| a[0].exp(),
        "ln"    / 1 => |a: &[f64]| a[0].ln(),
        "log10" / 1 => |a: &[f64]| a[0].log10(),
        "log"   / 2 => |a: &[f64]| a[0].ln() / a[1].ln(),
        "sin"   / 1 => |a: &[f64]| a[0].sin(),
        "cos"   / 1 => |a: &[f64]| a[0].cos(),
        "tan"   / 1 => |a: &[f64]| a[0].tan(),
        "asin"  / 1 => |a: &[f64]| a[0].asin(),
        "acos"  / 1 => |a: &[f64]| a[0].acos(),
        "atan"  / 1 => |a: &[f64]| a[0].atan(),
        "atan2" / 2 => |a: &[f64]| a[0].atan2(a[1]),
        "floor" / 1 => |a: &[f64]| a[0].floor(),
        "ceil"  / 1 => |a: &[f64]| a[0].ceil(),
        "round" / 1 => |a: &[f64]| a[0].round(),
        "hypot" / 2 => |a: &[f64]| a[0].hypot(a[1]),
    });
    math.merge(common())
}

/// The common functions plus `floor`, `ceil` and the constructor
/// `frac(n, d)` for exact decimals.
///
/// # Example
/// ```
/// use exprc::{Evaluator, Numeric, builtin};
/// use num_rational::BigRational;
///
/// let evaluator = Evaluator::<BigRational>::builder(BigRational::DEFAULT_FLAGS).extension(builtin::decimal_math())
///                                                                             .build()
///                                                                             .unwrap();
/// let third = evaluator.compile("frac(1, 3) * 3", &[]).unwrap();
/// assert_eq!(third.call(&[]), Ok(BigRational::from_integer(1.into())));
/// ```
#[must_use]
pub fn decimal_math() -> Extensions<BigRational> {
    let math = Extensions::new("decimal").constructor("frac", 2, |args: &[BigRational]| {
                                             if num_traits::Zero::is_zero(&args[1]) {
                                                 return Err(EvalError::DivisionByZero);
                                             }
                                             Ok(&args[0] / &args[1])
                                         })
                                         .function("floor", 1, |args: &[BigRational]| Ok(args[0].floor()))
                                         .function("ceil", 1, |args: &[BigRational]| Ok(args[0].ceil()));
    math.merge(common())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_of_unsigned_values() {
        assert_eq!(sign(&0_u64), Ok(0));
        assert_eq!(sign(&9_u64), Ok(1));
        assert_eq!(sign(&-9_i64), Ok(-1));
    }

    #[test]
    fn abs_of_minimum_overflows() {
        assert_eq!(abs(&i64::MIN), Err(EvalError::Overflow));
        assert_eq!(abs(&-2.5_f64), Ok(2.5));
    }

    #[test]
    fn clamp_rejects_reversed_bounds() {
        assert!(matches!(clamp(&1_i64, &5, &0), Err(EvalError::Domain { .. })));
        assert_eq!(clamp(&7_i64, &0, &5), Ok(5));
    }
}
