use std::{
    fs,
    path::Path,
    sync::{Arc, RwLock},
    thread,
};

use exprc::{
    CompileResult, Error, EvalError, Evaluator, Extensions, GrammarError, Numeric, ParseErrorKind, TypeFlags,
    builtin, evaluate,
    interpreter::{token::TokenClass, value::core::parse_value},
};
use num_rational::BigRational;
use walkdir::WalkDir;

/// One corpus line: optional bindings, the expression, and the expected
/// value or `None` when evaluation must fail.
struct Case {
    line:       usize,
    names:      Vec<String>,
    values:     Vec<String>,
    expression: String,
    expected:   Option<String>,
}

fn parse_case(line: usize, text: &str) -> Case {
    let (rest, expected) = text.rsplit_once("=>")
                               .unwrap_or_else(|| panic!("line {line}: missing '=>' in {text:?}"));
    let mut rest = rest.trim();
    let mut names = Vec::new();
    let mut values = Vec::new();
    if let Some(bracketed) = rest.strip_prefix('[') {
        let (bindings, expression) = bracketed.split_once(']')
                                              .unwrap_or_else(|| panic!("line {line}: unclosed bindings"));
        for binding in bindings.split(',') {
            let (name, value) = binding.split_once('=')
                                       .unwrap_or_else(|| panic!("line {line}: bad binding {binding:?}"));
            names.push(name.trim().to_string());
            values.push(value.trim().to_string());
        }
        rest = expression.trim();
    }
    let expected = expected.trim();
    Case { line,
           names,
           values,
           expression: rest.to_string(),
           expected: (expected != "error").then(|| expected.to_string()) }
}

fn run_case<T: Numeric>(evaluator: &Evaluator<T>, case: &Case, optimize: bool) -> CompileResult<T> {
    let names: Vec<&str> = case.names.iter().map(String::as_str).collect();
    let values: Vec<T> = case.values
                             .iter()
                             .map(|v| parse_value::<T>(v).unwrap_or_else(|e| panic!("line {}: {e}", case.line)))
                             .collect();
    let compiled = evaluator.compile_with(&case.expression, &names, optimize)?;
    Ok(compiled.call(&values)?)
}

fn check_corpus<T: Numeric>(path: &Path, extensions: Extensions<T>, close: fn(&T, &T) -> bool) -> usize {
    let content = fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));
    let evaluator = Evaluator::builder(T::DEFAULT_FLAGS).extension(extensions).build().unwrap();

    let mut count = 0;
    for (i, text) in content.lines().enumerate() {
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let case = parse_case(i + 1, text);
        count += 1;
        for optimize in [true, false] {
            let outcome = run_case(&evaluator, &case, optimize);
            match (&case.expected, outcome) {
                (Some(expected), Ok(actual)) => {
                    let expected = parse_value::<T>(expected).unwrap();
                    assert!(close(&actual, &expected),
                            "{path:?}:{} `{}` (optimize: {optimize}) gave {actual}, expected {expected}",
                            case.line,
                            case.expression);
                },
                (Some(_), Err(e)) => {
                    panic!("{path:?}:{} `{}` (optimize: {optimize}) failed:\n{}",
                           case.line,
                           case.expression,
                           e.render(&case.expression))
                },
                (None, Ok(actual)) => {
                    panic!("{path:?}:{} `{}` (optimize: {optimize}) gave {actual} but was expected to fail",
                           case.line,
                           case.expression)
                },
                (None, Err(_)) => {},
            }
        }
    }
    count
}

fn exact<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

fn approx(a: &f64, b: &f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1.0)
}

#[test]
fn corpus_evaluates_to_expected_values() {
    let mut count = 0;

    for entry in WalkDir::new("tests/corpus").into_iter()
                                             .filter_map(Result::ok)
                                             .filter(|e| e.path().extension().is_some_and(|ext| ext == "calc"))
    {
        let path = entry.path();
        let mode = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        count += match mode {
            "float" => check_corpus::<f64>(path, builtin::float_math(), approx),
            "decimal" => check_corpus::<BigRational>(path, builtin::decimal_math(), exact),
            "int" => check_corpus::<i64>(path, builtin::common(), exact),
            "uint" => check_corpus::<u64>(path, builtin::common(), exact),
            other => panic!("{path:?}: no numeric mode named '{other}'"),
        };
    }

    assert!(count > 0, "No corpus cases found in tests/corpus");
}

fn decimal(text: &str) -> BigRational {
    parse_value::<BigRational>(text).unwrap()
}

fn parse_error<T: Numeric>(evaluator: &Evaluator<T>, expression: &str) -> exprc::ParseError {
    match evaluator.compile(expression, &[]) {
        Err(Error::Parse(e)) => e,
        other => panic!("expected a parse error for {expression:?}, got {:?}", other.map(|c| c.render())),
    }
}

#[test]
fn precedence_and_grouping() {
    assert_eq!(evaluate::<f64>("2+3*4"), Ok(14.0));
    assert_eq!(evaluate::<f64>("(2+3)*4"), Ok(20.0));
    assert_eq!(evaluate::<i64>("2+3*4"), Ok(14));
    assert_eq!(evaluate::<BigRational>("2^3^2"), Ok(decimal("512")));
}

#[test]
fn unary_minus() {
    assert_eq!(evaluate::<f64>("-3+4"), Ok(1.0));
    assert_eq!(evaluate::<f64>("3*-4"), Ok(-12.0));
    assert_eq!(evaluate::<f64>("-(3+4)"), Ok(-7.0));
    assert_eq!(evaluate::<i64>("--3"), Ok(3));
}

#[test]
fn integer_operators() {
    assert_eq!(evaluate::<i64>("2^3"), Ok(1));
    assert_eq!(evaluate::<i64>("5&3"), Ok(1));
    assert_eq!(evaluate::<i64>("5|2"), Ok(7));
    assert_eq!(evaluate::<i64>("~0"), Ok(-1));
    assert_eq!(evaluate::<i64>("!0"), Ok(-1));
}

#[test]
fn unknown_identifier_spans_the_identifier() {
    let evaluator = Evaluator::<f64>::standard().unwrap();
    let e = parse_error(&evaluator, "2 + foo_1 * 3");
    assert_eq!(e.kind, ParseErrorKind::UnknownIdentifier);
    assert!(e.is_lexical());
    assert_eq!((e.start, e.end), (4, Some(9)));
    assert_eq!(e.offending_text(), "foo_1");
}

#[test]
fn unknown_operator_is_a_lexical_error() {
    let evaluator = Evaluator::<f64>::standard().unwrap();
    let e = parse_error(&evaluator, "2 $$ 3");
    assert_eq!(e.kind, ParseErrorKind::UnknownOperator);
    assert_eq!(e.offending_text(), "$$");
}

#[test]
fn unbalanced_parentheses_are_syntax_errors() {
    let evaluator = Evaluator::<f64>::standard().unwrap();
    let open = parse_error(&evaluator, "(2+3");
    assert!(open.is_syntax());
    assert_eq!(open.kind, ParseErrorKind::MismatchedParentheses);

    let close = parse_error(&evaluator, "2+3)");
    assert!(close.is_syntax());
    assert_eq!(close.kind, ParseErrorKind::MismatchedClosingParenthesis);
    assert_eq!(close.start, 3);
}

#[test]
fn malformed_calls_are_syntax_errors() {
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC).extension(builtin::common::<f64>())
                                                                 .build()
                                                                 .unwrap();
    assert_eq!(parse_error(&evaluator, "max 1").kind, ParseErrorKind::ExpectedArguments);
    assert_eq!(parse_error(&evaluator, "max(1,)").kind, ParseErrorKind::EmptyGroup);
    assert_eq!(parse_error(&evaluator, "1, 2").kind, ParseErrorKind::MisplacedSeparator);
    assert_eq!(parse_error(&evaluator, "(1, 2)").kind, ParseErrorKind::MisplacedSeparator);
    assert_eq!(parse_error(&evaluator, "2 * ()").kind, ParseErrorKind::EmptyGroup);
    assert_eq!(parse_error(&evaluator, "2 *").kind, ParseErrorKind::MissingOperand);
}

#[test]
fn wrong_argument_count_is_located() {
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC).extension(builtin::common::<f64>())
                                                                 .build()
                                                                 .unwrap();
    let Err(Error::Eval(e)) = evaluator.compile("1 + abs(1, 2)", &[]) else {
        panic!("expected an evaluation error");
    };
    assert!(matches!(e.root(), EvalError::ArgumentCount { expected: 1, found: 2, .. }));
    assert_eq!(e.span().map(|s| s.start), Some(4));
}

#[test]
fn parameters_bind_in_declared_order() {
    let evaluator = Evaluator::<f64>::standard().unwrap();
    let compiled = evaluator.compile("x*x+y*y", &["x", "y"]).unwrap();
    assert_eq!(compiled.call(&[3.0, 4.0]), Ok(25.0));
    assert_eq!(compiled.call(&[4.0, 3.0]), Ok(25.0));
    assert_eq!(compiled.parameters(), ["x", "y"]);
    assert!(matches!(compiled.call(&[1.0]), Err(EvalError::InputCount { expected: 2, found: 1 })));
}

#[test]
fn parameter_names_are_validated() {
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC | TypeFlags::DECIMAL).extension(builtin::float_math())
                                                                               .build()
                                                                               .unwrap();
    assert!(matches!(evaluator.compile("pi", &["Pi"]), Err(Error::Grammar(GrammarError::ReservedName { .. }))));
    assert!(matches!(evaluator.compile("x", &["x", "X"]),
                     Err(Error::Grammar(GrammarError::DuplicateParameter { .. }))));
    assert!(matches!(evaluator.compile("x", &["2x"]), Err(Error::Grammar(GrammarError::InvalidName { .. }))));
}

#[test]
fn extension_constant() {
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC).extension(Extensions::new("math").constant("Pi",
                                                                                                     std::f64::consts::PI))
                                                          .build()
                                                          .unwrap();
    let compiled = evaluator.compile("Pi*2", &[]).unwrap();
    assert_eq!(compiled.call(&[]), Ok(std::f64::consts::TAU));
}

#[test]
fn prefixed_extensions_use_qualified_names() {
    let math = Extensions::new("math").prefixed("Math").constant("Pi", std::f64::consts::PI);
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC).extension(math).build().unwrap();
    assert_eq!(evaluator.compile("Math.Pi / 2", &[]).unwrap().call(&[]),
               Ok(std::f64::consts::FRAC_PI_2));
    assert!(evaluator.compile("Pi", &[]).is_err());
}

#[test]
fn first_registration_of_a_name_wins() {
    let first = Extensions::new("first").constant("k", 1_i64);
    let second = Extensions::new("second").constant("k", 2_i64).constant("j", 3_i64);
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC).extension(first)
                                                          .extension(second)
                                                          .build()
                                                          .unwrap();
    assert_eq!(evaluator.compile("k + j", &[]).unwrap().call(&[]), Ok(4));

    let merged = Extensions::new("first").constant("k", 1_i64)
                                         .merge(Extensions::new("second").constant("k", 2_i64).constant("j", 3_i64));
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC).extension(merged).build().unwrap();
    assert_eq!(evaluator.compile("k + j", &[]).unwrap().call(&[]), Ok(4));
}

#[test]
fn case_sensitivity_follows_the_flag() {
    let insensitive = Evaluator::builder(TypeFlags::NUMERIC).extension(builtin::float_math())
                                                            .build()
                                                            .unwrap();
    assert!(insensitive.compile("PI + SQRT(4)", &[]).is_ok());

    let sensitive = Evaluator::builder(TypeFlags::NUMERIC | TypeFlags::CASE_SENSITIVE).extension(builtin::float_math())
                                                                                      .build()
                                                                                      .unwrap();
    assert!(sensitive.compile("Pi + sqrt(4)", &[]).is_ok());
    assert!(sensitive.flags().contains(TypeFlags::CASE_SENSITIVE));
    assert!(!insensitive.flags().contains(TypeFlags::CASE_SENSITIVE));
    let e = parse_error(&sensitive, "PI");
    assert_eq!(e.kind, ParseErrorKind::UnknownIdentifier);
}

#[test]
fn conflicting_and_unsupported_flags() {
    assert!(matches!(Evaluator::<f64>::new(TypeFlags::DECIMAL | TypeFlags::INTEGER),
                     Err(GrammarError::ConflictingFlags { .. })));
    assert!(matches!(Evaluator::<i64>::new(TypeFlags::NUMERIC | TypeFlags::DECIMAL),
                     Err(GrammarError::UnsupportedFlags { .. })));
    assert!(matches!(Evaluator::<f64>::new(TypeFlags::NUMERIC | TypeFlags::INTEGER),
                     Err(GrammarError::UnsupportedFlags { .. })));
}

#[test]
fn custom_value_reader_replaces_literals() {
    // Tally marks: each '#' counts one.
    let evaluator = Evaluator::<f64>::builder(TypeFlags::NUMERIC).value_reader(|text, at, _| {
                                                                     let run = text[at..].chars()
                                                                                         .take_while(|&c| c == '#')
                                                                                         .count();
                                                                     Ok((run > 0).then(|| (run as f64, at + run)))
                                                                 })
                                                                 .build()
                                                                 .unwrap();
    assert_eq!(evaluator.compile("## + #", &[]).unwrap().call(&[]), Ok(3.0));
    assert_eq!(evaluator.compile("x * ###", &["x"]).unwrap().call(&[2.0]), Ok(6.0));
    assert_eq!(parse_error(&evaluator, "2").kind, ParseErrorKind::UnknownOperator);
}

#[test]
fn value_reader_end_offsets_are_checked() {
    let past_end = Evaluator::<f64>::builder(TypeFlags::NUMERIC).value_reader(|_, at, _| Ok(Some((7.0, at + 5))))
                                                                .build()
                                                                .unwrap();
    let error = parse_error(&past_end, "7");
    assert_eq!(error.kind, ParseErrorKind::InvalidLiteral);
    assert_eq!(error.start, 0);

    let mid_char = Evaluator::<f64>::builder(TypeFlags::NUMERIC).value_reader(|_, at, _| Ok(Some((1.0, at + 1))))
                                                                .build()
                                                                .unwrap();
    assert_eq!(parse_error(&mid_char, "1 + é").kind, ParseErrorKind::InvalidLiteral);
}

#[test]
fn allow_unknown_defers_the_error_to_building() {
    let evaluator = Evaluator::<f64>::builder(TypeFlags::NUMERIC).allow_unknown(true).build().unwrap();
    let tokens = evaluator.tokenize("1 + mystery", &[]).unwrap();
    assert_eq!(tokens[2].class, TokenClass::Operand);
    assert_eq!(tokens[2].text, "mystery");

    let Err(Error::Eval(e)) = evaluator.compile("1 + mystery", &[]) else {
        panic!("expected an evaluation error");
    };
    assert!(matches!(e.root(), EvalError::UnknownIdentifier { .. }));
}

#[test]
fn extra_whitespace_characters() {
    let evaluator = Evaluator::<i64>::builder(TypeFlags::NUMERIC).whitespace(['_'])
                                                                 .build()
                                                                 .unwrap();
    assert_eq!(evaluator.compile("_2_+_3_", &[]).unwrap().call(&[]), Ok(5));
}

#[test]
fn tokenize_reports_classes_and_offsets() {
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC).extension(builtin::common::<f64>())
                                                                 .build()
                                                                 .unwrap();
    let tokens = evaluator.tokenize("max(x, 10) - 2", &["x"]).unwrap();
    let classes: Vec<TokenClass> = tokens.iter().map(|t| t.class).collect();
    assert_eq!(classes,
               [TokenClass::Function,
                TokenClass::OpenParen,
                TokenClass::Operand,
                TokenClass::ArgSeparator,
                TokenClass::Operand,
                TokenClass::CloseParen,
                TokenClass::LeftAssocOperator,
                TokenClass::Operand]);
    assert_eq!((tokens[4].start, tokens[4].end, tokens[4].text.as_str()), (7, 9, "10"));
}

#[test]
fn rpn_orders_operators_after_operands() {
    let evaluator = Evaluator::<f64>::standard().unwrap();
    let rpn: Vec<String> = evaluator.rpn("(1 + 2) ^ 3 ^ 2", &[])
                                    .unwrap()
                                    .into_iter()
                                    .map(|t| t.text)
                                    .collect();
    assert_eq!(rpn, ["1", "2", "+", "3", "2", "^", "^"]);
}

#[test]
fn introspection_lists_names() {
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC).extension(builtin::common::<i64>())
                                                          .build()
                                                          .unwrap();
    assert!(evaluator.operator_names().contains("%"));
    assert!(!evaluator.operator_names().contains("^"));
    assert!(evaluator.identifier_names().contains("clamp"));
    assert!(evaluator.identifier_names().contains("if"));
}

#[test]
fn variables_are_read_at_each_evaluation() {
    let cell = Arc::new(RwLock::new(2.0));
    let evaluator = Evaluator::builder(TypeFlags::NUMERIC).extension(Extensions::new("host").variable("scale",
                                                                                                     cell.clone()))
                                                          .build()
                                                          .unwrap();
    let compiled = evaluator.compile("scale * x", &["x"]).unwrap();
    assert_eq!(compiled.call(&[10.0]), Ok(20.0));
    *cell.write().unwrap() = 3.0;
    assert_eq!(compiled.call(&[10.0]), Ok(30.0));
}

#[test]
fn errors_render_with_a_caret() {
    let evaluator = Evaluator::<i64>::standard().unwrap();
    let expression = "7 + 1 % 0";
    let compiled = evaluator.compile(expression, &[]).unwrap();
    let e = Error::from(compiled.call(&[]).unwrap_err());
    assert_eq!(e.render(expression).lines().last(), Some("      ^"));
}

#[test]
fn failed_conversions_are_located() {
    let evaluator = Evaluator::<f64>::standard().unwrap();
    let expression = "1 + trunc(x)";
    let compiled = evaluator.compile(expression, &["x"]).unwrap();
    let e = compiled.call(&[f64::INFINITY]).unwrap_err();
    assert!(matches!(e.root(), EvalError::Domain { .. }));
    assert_eq!(Error::from(e).render(expression).lines().last(), Some("    ^^^^^"));
}

#[test]
fn compiled_expressions_are_shared_across_threads() {
    let evaluator = Evaluator::<i64>::standard().unwrap();
    let compiled = evaluator.compile("x * x - 1", &["x"]).unwrap();
    thread::scope(|scope| {
        for x in 0..4_i64 {
            let compiled = &compiled;
            scope.spawn(move || assert_eq!(compiled.call(&[x]), Ok(x * x - 1)));
        }
    });
}
