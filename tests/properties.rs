//! Property tests for the optimizer.
//!
//! Random integer expressions over `x` and `y` are compiled with and without
//! optimization. The optimized tree must be a fixed point of the optimizer
//! and must evaluate to the same value wherever the raw tree does.

use exprc::{Evaluator, builtin, interpreter::optimizer::optimize};
use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};

/// A random integer expression.
#[derive(Debug, Clone)]
struct Source(String);

impl Arbitrary for Source {
    fn arbitrary(g: &mut Gen) -> Self {
        let depth = g.size().min(5);
        Self(expression(g, depth))
    }
}

fn leaf(g: &mut Gen) -> String {
    // Identity elements are overrepresented so the rewrite rules fire.
    let leaves = ["x", "y", "0", "1", "(-1)", "2", "3", "7", "x", "y"];
    leaves[usize::arbitrary(g) % leaves.len()].to_string()
}

fn expression(g: &mut Gen, depth: usize) -> String {
    if depth == 0 {
        return leaf(g);
    }
    match u8::arbitrary(g) % 8 {
        0..=3 => {
            let ops = ["+", "-", "*", "/", "%", "&", "|", "^", "<<", ">>"];
            let op = ops[usize::arbitrary(g) % ops.len()];
            format!("({} {op} {})", expression(g, depth - 1), expression(g, depth - 1))
        },
        4 => {
            let prefix = ["-", "~", "+"];
            format!("{}{}", prefix[usize::arbitrary(g) % prefix.len()], expression(g, depth - 1))
        },
        5 => {
            format!("if({}, {}, {})",
                    expression(g, depth - 1),
                    expression(g, depth - 1),
                    expression(g, depth - 1))
        },
        6 => {
            let calls = ["abs", "trunc", "sign"];
            format!("{}({})", calls[usize::arbitrary(g) % calls.len()], expression(g, depth - 1))
        },
        _ => leaf(g),
    }
}

fn evaluator() -> Evaluator<i64> {
    Evaluator::builder(exprc::TypeFlags::NUMERIC | exprc::TypeFlags::INTEGER).extension(builtin::common())
                                                                              .build()
                                                                              .unwrap()
}

#[test]
fn optimizing_is_idempotent() {
    fn prop(source: Source) -> TestResult {
        let Ok(raw) = evaluator().compile_with(&source.0, &["x", "y"], false) else {
            return TestResult::discard();
        };
        let (once, _) = optimize(raw.node());
        let (twice, stats) = optimize(&once);
        TestResult::from_bool(once == twice && stats.removed == 0 && stats.merged == 0)
    }
    QuickCheck::new().tests(500)
                     .max_tests(2000)
                     .quickcheck(prop as fn(Source) -> TestResult);
}

#[test]
fn optimized_and_raw_trees_agree() {
    fn prop(source: Source, x: i16, y: i16) -> TestResult {
        let evaluator = evaluator();
        let names = ["x", "y"];
        let (Ok(raw), Ok(optimized)) = (evaluator.compile_with(&source.0, &names, false),
                                        evaluator.compile_with(&source.0, &names, true))
        else {
            return TestResult::discard();
        };
        let inputs = [i64::from(x), i64::from(y)];
        match raw.call(&inputs) {
            // Overflow and division by zero may be optimized away.
            Err(_) => TestResult::discard(),
            Ok(expected) => TestResult::from_bool(optimized.call(&inputs) == Ok(expected)),
        }
    }
    QuickCheck::new().tests(500)
                     .max_tests(5000)
                     .quickcheck(prop as fn(Source, i16, i16) -> TestResult);
}
