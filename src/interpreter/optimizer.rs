/// The fixed-point rewriter.
///
/// Drives bottom-up passes over a node graph until nothing changes: constant
/// folding, identity elimination, structural sharing, and folding of pure
/// calls, constructors, read-only members, conversions and conditionals.
pub mod core;
/// Algebraic identities.
///
/// Rules for binary nodes with exactly one constant operand, such as `x+0`,
/// `x*1` or `0<<x`.
pub mod identity;
/// Optimization counters.
///
/// Per-run statistics plus process-wide atomic totals.
pub mod stats;

pub use self::{
    core::optimize,
    stats::{OptimizeStats, cumulative},
};
