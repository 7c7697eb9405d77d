use std::{fs, process::ExitCode};

use clap::{Parser, ValueEnum};
use exprc::{
    CompileResult, Error, Evaluator, Extensions, Numeric, TypeFlags, builtin,
    interpreter::value::{
        core::parse_value,
        decimal::format_decimal,
    },
    logging,
};
use num_rational::BigRational;

/// Fractional digits printed for decimal results before falling back to
/// `n/d`.
const DECIMAL_DIGITS: usize = 40;

/// The numeric type an expression is compiled over.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// 64-bit floating point.
    Float,
    /// Exact arbitrary-precision decimals.
    Decimal,
    /// Signed 64-bit integers.
    Int,
    /// Unsigned 64-bit integers.
    Uint,
}

/// exprc compiles an arithmetic expression and evaluates it.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Numeric type to compute with.
    #[arg(short, long, value_enum, default_value_t = Mode::Float)]
    mode: Mode,

    /// Match names case-sensitively.
    #[arg(short, long)]
    case_sensitive: bool,

    /// Skip the optimizer.
    #[arg(long)]
    no_optimize: bool,

    /// Bind a parameter, as `name=value`. May be repeated.
    #[arg(short, long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,

    /// Print the token table instead of evaluating.
    #[arg(long)]
    tokens: bool,

    /// Print the compiled tree instead of evaluating.
    #[arg(long)]
    tree: bool,

    /// Tells exprc to read the expression from a file.
    #[arg(short, long)]
    file: bool,

    /// Increase log output; repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    expression: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = logging::init(args.verbose) {
        eprintln!("{e}");
    }

    let expression = if args.file {
        match fs::read_to_string(&args.expression) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                eprintln!("Failed to read the input file '{}': {e}", args.expression);
                return ExitCode::FAILURE;
            },
        }
    } else {
        args.expression.clone()
    };

    let outcome = match args.mode {
        Mode::Float => run::<f64>(&args, &expression, builtin::float_math(), |v| v.to_string()),
        Mode::Decimal => {
            run::<BigRational>(&args, &expression, builtin::decimal_math(), |v| {
                format_decimal(v, DECIMAL_DIGITS)
            })
        },
        Mode::Int => run::<i64>(&args, &expression, builtin::common(), |v| v.to_string()),
        Mode::Uint => run::<u64>(&args, &expression, builtin::common(), |v| v.to_string()),
    };

    match outcome {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("error: {}", e.render(&expression));
            ExitCode::FAILURE
        },
    }
}

/// Compiles and runs `expression` over `T`, returning the text to print.
fn run<T: Numeric>(args: &Args,
                   expression: &str,
                   extensions: Extensions<T>,
                   format: impl Fn(&T) -> String)
                   -> CompileResult<String> {
    let mut flags = T::DEFAULT_FLAGS;
    if args.case_sensitive {
        flags = flags | TypeFlags::CASE_SENSITIVE;
    }
    let evaluator = Evaluator::builder(flags).extension(extensions)
                                             .optimize(!args.no_optimize)
                                             .build()?;

    let (names, values) = bindings::<T>(&args.params)?;
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    if args.tokens {
        let tokens = evaluator.tokenize(expression, &names)?;
        return Ok(tokens.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n"));
    }

    let compiled = evaluator.compile(expression, &names)?;
    if args.tree {
        let mut text = format!("{}\ngrammar: {}", compiled.render(), evaluator.flags());
        if let Some(stats) = compiled.stats() {
            text.push_str(&format!("\n{} node(s) after {} pass(es), {} removed, {} merged",
                                   compiled.node().count(),
                                   stats.passes,
                                   stats.removed,
                                   stats.merged));
        }
        return Ok(text);
    }
    Ok(format(&compiled.call(&values)?))
}

/// Splits `name=value` options into parameter names and input values.
fn bindings<T: Numeric>(params: &[String]) -> CompileResult<(Vec<String>, Vec<T>)> {
    let mut names = Vec::new();
    let mut values = Vec::new();
    for param in params {
        let (name, value) = param.split_once('=').ok_or_else(|| bad_binding(param, "expected NAME=VALUE"))?;
        let value = parse_value::<T>(value).map_err(|e| bad_binding(param, &e))?;
        names.push(name.trim().to_string());
        values.push(value);
    }
    Ok((names, values))
}

fn bad_binding(param: &str, details: &str) -> Error {
    Error::Eval(exprc::EvalError::Extension { name:    format!("--param {param}"),
                                              details: details.to_string(), })
}
