//! Expression grammar for user-supplied function definitions.
//!
//! Parses definitions of the form `f(x, a, b) = sin(a * x) + b / 2` into an
//! expression tree. The grammar is closed: numeric literals, parameter
//! references, the constants `pi` and `e`, a fixed set of unary functions,
//! the arithmetic operators `+ - * / ^`, unary minus, and parentheses.
//!
//! Operator precedence (loosest to tightest): `+ -`, `* /`, unary minus,
//! `^` (right-associative).

use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{all_consuming, map},
    error::{VerboseError, convert_error},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded},
};

type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// A parsed function definition before validation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Definition {
    /// The function name (`f` in `f(x) = ...`).
    pub(crate) name: String,
    /// All formal parameters in declaration order, including the first.
    pub(crate) params: Vec<String>,
    /// The expression tree on the right-hand side.
    pub(crate) body: Expr,
}

/// A node in the expression tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    /// A numeric literal.
    Number(f64),
    /// A parameter or constant reference.
    Ident(String),
    /// Unary negation.
    Neg(Box<Expr>),
    /// A unary function application, resolved by name at validation time.
    Call(String, Box<Expr>),
    /// A binary arithmetic operation.
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// The fixed set of unary functions the grammar accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryFn {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Log,
    Sqrt,
    Abs,
    Floor,
    Ceil,
}

impl UnaryFn {
    /// Resolve a function name to its implementation, if known.
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "asin" => Some(Self::Asin),
            "acos" => Some(Self::Acos),
            "atan" => Some(Self::Atan),
            "sinh" => Some(Self::Sinh),
            "cosh" => Some(Self::Cosh),
            "tanh" => Some(Self::Tanh),
            "exp" => Some(Self::Exp),
            "ln" => Some(Self::Ln),
            "log" => Some(Self::Log),
            "sqrt" => Some(Self::Sqrt),
            "abs" => Some(Self::Abs),
            "floor" => Some(Self::Floor),
            "ceil" => Some(Self::Ceil),
            _ => None,
        }
    }

    /// Apply the function to a value. Domain violations follow IEEE float
    /// semantics (`sqrt(-1)` is NaN, `ln(0)` is -inf), not errors.
    pub(crate) fn apply(self, v: f64) -> f64 {
        match self {
            Self::Sin => v.sin(),
            Self::Cos => v.cos(),
            Self::Tan => v.tan(),
            Self::Asin => v.asin(),
            Self::Acos => v.acos(),
            Self::Atan => v.atan(),
            Self::Sinh => v.sinh(),
            Self::Cosh => v.cosh(),
            Self::Tanh => v.tanh(),
            Self::Exp => v.exp(),
            Self::Ln => v.ln(),
            Self::Log => v.log10(),
            Self::Sqrt => v.sqrt(),
            Self::Abs => v.abs(),
            Self::Floor => v.floor(),
            Self::Ceil => v.ceil(),
        }
    }
}

/// Resolve a built-in constant by name.
pub(crate) fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

impl Expr {
    /// Evaluate the tree with a variable lookup.
    ///
    /// The lookup is consulted first, so a formal parameter named `e`
    /// shadows the constant. An identifier neither bound nor constant is a
    /// runtime error (validation rejects it at compile time; this path is
    /// reachable only through a missing parameter binding).
    pub(crate) fn eval(
        &self,
        lookup: &dyn Fn(&str) -> Option<f64>,
    ) -> Result<f64, crate::SampleError> {
        match self {
            Self::Number(v) => Ok(*v),
            Self::Ident(name) => lookup(name).or_else(|| constant(name)).ok_or_else(|| {
                crate::SampleError::Runtime(format!("variable `{name}` is not bound"))
            }),
            Self::Neg(inner) => Ok(-inner.eval(lookup)?),
            Self::Call(name, arg) => {
                let v = arg.eval(lookup)?;
                let f = UnaryFn::from_name(name).ok_or_else(|| {
                    crate::SampleError::Runtime(format!("unknown function `{name}`"))
                })?;
                Ok(f.apply(v))
            }
            Self::Binary(op, lhs, rhs) => {
                let l = lhs.eval(lookup)?;
                let r = rhs.eval(lookup)?;
                Ok(match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                    BinOp::Pow => l.powf(r),
                })
            }
        }
    }

    /// Visit every identifier and call name in the tree.
    pub(crate) fn visit_names(&self, visit: &mut dyn FnMut(NameUse<'_>)) {
        match self {
            Self::Number(_) => {}
            Self::Ident(name) => visit(NameUse::Variable(name)),
            Self::Neg(inner) => inner.visit_names(visit),
            Self::Call(name, arg) => {
                visit(NameUse::Function(name));
                arg.visit_names(visit);
            }
            Self::Binary(_, lhs, rhs) => {
                lhs.visit_names(visit);
                rhs.visit_names(visit);
            }
        }
    }
}

/// A name reference found while walking an expression tree.
#[derive(Debug, Clone, Copy)]
pub(crate) enum NameUse<'a> {
    /// A variable or constant reference.
    Variable(&'a str),
    /// A function call by name.
    Function(&'a str),
}

/// Parse a complete definition, consuming all input.
pub(crate) fn parse_definition(source: &str) -> Result<Definition, String> {
    match all_consuming(definition)(source) {
        Ok((_, def)) => Ok(def),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(convert_error(source, e)),
        Err(nom::Err::Incomplete(_)) => Err(String::from("incomplete input")),
    }
}

fn definition(input: &str) -> PResult<'_, Definition> {
    let (input, _) = multispace0(input)?;
    let (input, name) = identifier(input)?;
    let (input, params) = delimited(
        ws_char('('),
        separated_list0(ws_char(','), map(ws(identifier), str::to_owned)),
        char(')'),
    )(input)?;
    let (input, _) = ws_char('=')(input)?;
    let (input, body) = expr(input)?;
    let (input, _) = multispace0(input)?;
    Ok((
        input,
        Definition {
            name: name.to_owned(),
            params,
            body,
        },
    ))
}

fn identifier(input: &str) -> PResult<'_, &str> {
    nom::combinator::recognize(pair(alpha1, many0(alt((alphanumeric1, tag("_"))))))(input)
}

/// A single character surrounded by optional whitespace.
fn ws_char<'a>(c: char) -> impl FnMut(&'a str) -> PResult<'a, char> {
    delimited(multispace0, char(c), multispace0)
}

/// A parser surrounded by optional whitespace.
fn ws<'a, O>(
    inner: impl FnMut(&'a str) -> PResult<'a, O>,
) -> impl FnMut(&'a str) -> PResult<'a, O> {
    delimited(multispace0, inner, multispace0)
}

fn expr(input: &str) -> PResult<'_, Expr> {
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(ws(alt((char('+'), char('-')))), term))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn term(input: &str) -> PResult<'_, Expr> {
    let (input, first) = unary(input)?;
    let (input, rest) = many0(pair(ws(alt((char('*'), char('/')))), unary))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn fold_binary(first: Expr, rest: Vec<(char, Expr)>) -> Expr {
    rest.into_iter().fold(first, |lhs, (op, rhs)| {
        let op = match op {
            '+' => BinOp::Add,
            '-' => BinOp::Sub,
            '*' => BinOp::Mul,
            _ => BinOp::Div,
        };
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    })
}

fn unary(input: &str) -> PResult<'_, Expr> {
    alt((
        map(preceded(ws_char('-'), unary), |e| Expr::Neg(Box::new(e))),
        power,
    ))(input)
}

fn power(input: &str) -> PResult<'_, Expr> {
    let (input, base) = atom(input)?;
    let (input, exponent) = nom::combinator::opt(preceded(ws_char('^'), unary))(input)?;
    Ok((input, match exponent {
        Some(exp) => Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exp)),
        None => base,
    }))
}

fn atom(input: &str) -> PResult<'_, Expr> {
    alt((
        map(double, Expr::Number),
        call_or_ident,
        delimited(ws_char('('), expr, ws_char(')')),
    ))(input)
}

fn call_or_ident(input: &str) -> PResult<'_, Expr> {
    let (input, name) = identifier(input)?;
    let (input, arg) = nom::combinator::opt(delimited(ws_char('('), expr, ws_char(')')))(input)?;
    Ok((input, match arg {
        Some(arg) => Expr::Call(name.to_owned(), Box::new(arg)),
        None => Expr::Ident(name.to_owned()),
    }))
}
