use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use exprc::{
    EvalError, Evaluator, Extensions, TypeFlags,
    ast::Node,
    builtin,
    interpreter::optimizer::{cumulative, optimize},
};
use num_rational::BigRational;

fn integers() -> Evaluator<i64> {
    Evaluator::standard().unwrap()
}

fn is_parameter<T>(node: &Node<T>, index: usize) -> bool {
    matches!(node, Node::Parameter(i) if *i == index)
}

#[test]
fn constant_expression_folds_to_one_node() {
    let compiled = integers().compile("2*3+4", &[]).unwrap();
    assert_eq!(compiled.node().as_constant(), Some(&10));
    assert_eq!(compiled.node().count(), 1);
    assert_eq!(compiled.call(&[]), Ok(10));
}

#[test]
fn identities_reduce_to_the_parameter() {
    let evaluator = integers();
    for expression in ["x*1", "1*x", "x/1", "x+0", "x-0", "0+x", "x<<0", "x>>0", "x|0", "0^x"] {
        let compiled = evaluator.compile(expression, &["x"]).unwrap();
        assert!(is_parameter(compiled.node(), 0),
                "{expression} optimized to {}",
                compiled.render());
    }
}

#[test]
fn annihilators_reduce_to_zero() {
    let evaluator = integers();
    for expression in ["x*0", "0*x", "x&0", "0<<x"] {
        let compiled = evaluator.compile(expression, &["x"]).unwrap();
        assert_eq!(compiled.node().as_constant(), Some(&0), "{expression}");
    }
}

#[test]
fn minus_one_becomes_negation() {
    let evaluator = integers();
    for expression in ["x*-1", "-1*x", "x/-1", "0-x"] {
        let compiled = evaluator.compile(expression, &["x"]).unwrap();
        assert_eq!(compiled.render(), "-x", "{expression}");
        assert_eq!(compiled.call(&[5]), Ok(-5));
    }
}

#[test]
fn minus_one_is_left_alone_for_unsigned_types() {
    let evaluator = Evaluator::<u64>::standard().unwrap();
    let compiled = evaluator.compile("x*18446744073709551615", &["x"]).unwrap();
    assert_eq!(compiled.render(), "(x * 18446744073709551615)");
}

#[test]
fn equal_subtrees_are_shared() {
    let compiled = integers().compile("(x+1)*(x+1)", &["x"]).unwrap();
    let Node::Binary { left, right, .. } = compiled.node().as_ref() else {
        panic!("expected a binary node, got {}", compiled.render());
    };
    assert!(Arc::ptr_eq(left, right));
    assert!(compiled.stats().is_some_and(|s| s.merged > 0));
    assert_eq!(compiled.call(&[2]), Ok(9));
}

#[test]
fn optimizing_twice_changes_nothing() {
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC | TypeFlags::DECIMAL).extension(builtin::float_math())
                                                                               .build()
                                                                               .unwrap();
    let raw = evaluator.compile_with("sqrt(x*x + y*y) * (2 - 1) + Pi*0 + if(1, x, y)", &["x", "y"], false)
                       .unwrap();
    let (once, _) = optimize(raw.node());
    let (twice, stats) = optimize(&once);
    assert_eq!(once, twice);
    assert_eq!(stats.passes, 1);
    assert_eq!(stats.removed, 0);
    assert_eq!(stats.merged, 0);
}

#[test]
fn pure_calls_fold_and_impure_calls_do_not() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let host = Extensions::new("host").function("double", 1, |args: &[i64]| Ok(args[0] * 2))
                                      .impure_function("tick", 0, move |_: &[i64]| {
                                          Ok(i64::try_from(counter.fetch_add(1, Ordering::SeqCst)).unwrap_or(0))
                                      });
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC).extension(host).build().unwrap();

    let folded = evaluator.compile("double(21)", &[]).unwrap();
    assert_eq!(folded.node().as_constant(), Some(&42));

    let compiled = evaluator.compile("tick() + double(1)", &[]).unwrap();
    assert_eq!(compiled.render(), "(tick() + 2)");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(compiled.call(&[]), Ok(2));
    assert_eq!(compiled.call(&[]), Ok(3));
}

#[test]
fn constructors_and_properties_fold() {
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC | TypeFlags::DECIMAL).extension(builtin::decimal_math())
                                                                               .build()
                                                                               .unwrap();
    let compiled = evaluator.compile("frac(1, 4) * 4", &[]).unwrap();
    assert!(compiled.node().as_constant().is_some());

    let host = Extensions::new("host").property("answer", || 42_i64);
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC).extension(host).build().unwrap();
    let compiled = evaluator.compile("answer + 1", &[]).unwrap();
    assert_eq!(compiled.node().as_constant(), Some(&43));
}

#[test]
fn variables_are_not_folded() {
    let cell = Arc::new(std::sync::RwLock::new(5_i64));
    let host = Extensions::new("host").variable("level", cell);
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC).extension(host).build().unwrap();
    let compiled = evaluator.compile("level * 1", &[]).unwrap();
    assert!(matches!(compiled.node().as_ref(), Node::Member(_)));
}

#[test]
fn conversions_are_elided_or_folded() {
    let evaluator = integers();
    let compiled = evaluator.compile("trunc(+x)", &["x"]).unwrap();
    assert!(is_parameter(compiled.node(), 0));

    let floats = Evaluator::<f64>::standard().unwrap();
    assert_eq!(floats.compile("trunc(-7.9)", &[]).unwrap().node().as_constant(), Some(&-7.0));
    assert_eq!(floats.compile("trunc(x)", &["x"]).unwrap().render(), "trunc(x)");
}

#[test]
fn constant_conditions_choose_a_branch() {
    let evaluator = integers();
    let compiled = evaluator.compile("if(2 - 2, 1/0, x)", &["x"]).unwrap();
    assert!(is_parameter(compiled.node(), 0));

    let kept = evaluator.compile("if(x, 1, 2)", &["x"]).unwrap();
    assert_eq!(kept.render(), "if(x, 1, 2)");
}

#[test]
fn failing_folds_surface_at_evaluation() {
    let compiled = integers().compile("x + 1/0", &["x"]).unwrap();
    assert_eq!(compiled.render(), "(x + (1 / 0))");
    assert!(compiled.call(&[1]).is_err());
}

#[test]
fn oversized_decimal_powers_are_not_folded() {
    let evaluator = Evaluator::<BigRational>::standard().unwrap();
    let compiled = evaluator.compile("((10^4096)^4096)^4096", &[]).unwrap();
    assert!(compiled.node().as_constant().is_none());
    let error = compiled.call(&[]).unwrap_err();
    assert!(matches!(error.root(), EvalError::Domain { .. }), "{error}");
    assert!(error.span().is_some());

    let folded = evaluator.compile("10^4096 / 10^4095", &[]).unwrap();
    assert_eq!(folded.node().as_constant(), Some(&BigRational::from_integer(10.into())));
}

#[test]
fn disabled_optimizer_keeps_the_tree() {
    let evaluator = Evaluator::<i64>::builder(TypeFlags::NUMERIC | TypeFlags::INTEGER).optimize(false)
                                                                                      .build()
                                                                                      .unwrap();
    let compiled = evaluator.compile("x*1 + 2*3", &["x"]).unwrap();
    assert!(compiled.stats().is_none());
    assert_eq!(compiled.render(), "((x * 1) + (2 * 3))");
    assert_eq!(compiled.call(&[4]), Ok(10));
}

#[test]
fn totals_accumulate_across_compilations() {
    let before = cumulative();
    let compiled = integers().compile("1+2+3+4", &[]).unwrap();
    let stats = compiled.stats().unwrap();
    let after = cumulative();
    assert_eq!(stats.removed, 6);
    assert!(after.removed >= before.removed + stats.removed);
    assert!(after.passes >= before.passes + stats.passes);
}
