/// The `Numeric` trait and value-reader plumbing.
///
/// Declares what a number type must provide to be compiled over: identity
/// elements, checked arithmetic, hashing for structural sharing, and a
/// default literal reader.
pub mod core;
/// Arbitrary-precision decimal support backed by `BigRational`.
pub mod decimal;
/// Type flags selecting the operator set of a grammar.
pub mod flags;
/// `f64` support.
pub mod float;
/// `i64` and `u64` support.
pub mod integer;
