use chumsky::error::SimpleReason;
use chumsky::prelude::*;
use convsolve_core::expr::{Equation, Expr};
use miette::SourceSpan;

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    fn apply(self, lhs: Expr, rhs: Expr) -> Expr {
        match self {
            Op::Add => lhs + rhs,
            Op::Sub => lhs - rhs,
            Op::Mul => lhs * rhs,
            Op::Div => lhs / rhs,
        }
    }
}

fn number() -> impl Parser<char, Expr, Error = Simple<char>> + Clone {
    let frac = just('.').chain(text::digits(10));
    let exp = one_of("eE")
        .chain(one_of("+-").or_not())
        .chain::<char, _, _>(text::digits(10));

    text::digits(10)
        .chain::<char, _, _>(frac.or_not().flatten())
        .chain::<char, _, _>(exp.or_not().flatten())
        .collect::<String>()
        .try_map(|literal, span| {
            Expr::decimal(&literal)
                .ok_or_else(|| Simple::custom(span, format!("invalid number literal `{literal}`")))
        })
        .labelled("number")
}

fn exponent() -> impl Parser<char, i32, Error = Simple<char>> + Clone {
    just('-')
        .or_not()
        .chain::<char, _, _>(text::digits(10))
        .collect::<String>()
        .try_map(|digits, span| {
            digits
                .parse::<i32>()
                .map_err(|_| Simple::custom(span, format!("exponent `{digits}` is out of range")))
        })
        .padded()
        .labelled("integer exponent")
}

fn expr() -> impl Parser<char, Expr, Error = Simple<char>> + Clone {
    recursive(|expr| {
        let atom = number()
            .or(text::ident().map(Expr::Sym))
            .or(expr.delimited_by(just('('), just(')')))
            .padded();

        let power = atom
            .then(just("**").or(just("^")).ignore_then(exponent()).or_not())
            .map(|(base, exponent)| match exponent {
                Some(exponent) => base.pow(exponent),
                None => base,
            });

        let unary = just('-').padded().repeated().then(power).foldr(|_, operand| -operand);

        let product = just('*').to(Op::Mul).or(just('/').to(Op::Div)).padded();
        let term = unary
            .clone()
            .then(product.then(unary).repeated())
            .foldl(|lhs, (op, rhs)| op.apply(lhs, rhs));

        let sum = just('+').to(Op::Add).or(just('-').to(Op::Sub)).padded();
        term.clone().then(sum.then(term).repeated()).foldl(|lhs, (op, rhs)| op.apply(lhs, rhs))
    })
}

/// `lhs = rhs`, or a bare expression meaning `expr = 0`.
fn equation() -> impl Parser<char, Equation, Error = Simple<char>> {
    expr()
        .then(just('=').ignore_then(expr()).or_not())
        .then_ignore(end())
        .map(|(lhs, rhs)| Equation::new(lhs, rhs.unwrap_or_else(Expr::zero)))
}

pub(crate) fn parse(text: &str, index: usize) -> Result<Equation, ParseError> {
    equation().parse(text).map_err(|errors| {
        let first = errors.into_iter().min_by_key(|e| e.span().start);
        match first {
            Some(error) => {
                let span = error.span();
                let start = byte_offset(text, span.start);
                let end = byte_offset(text, span.end).max(start);
                ParseError {
                    src: text.to_string(),
                    span: SourceSpan::new(start.into(), end - start),
                    message: describe(&error),
                    index,
                }
            }
            None => ParseError {
                src: text.to_string(),
                span: SourceSpan::new(0.into(), text.len()),
                message: "unparseable equation".to_string(),
                index,
            },
        }
    })
}

/// Parser spans count characters; diagnostics need bytes.
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(at, _)| at)
}

fn describe(error: &Simple<char>) -> String {
    match error.reason() {
        SimpleReason::Custom(message) => return message.clone(),
        SimpleReason::Unclosed { delimiter, .. } => return format!("unclosed `{delimiter}`"),
        SimpleReason::Unexpected => {}
    }

    let found = match error.found() {
        Some(c) => format!("unexpected `{c}`"),
        None => "unexpected end of input".to_string(),
    };
    if let Some(label) = error.label() {
        return format!("{found}, expected {label}");
    }
    let mut expected: Vec<String> = error
        .expected()
        .map(|e| match e {
            Some(c) => format!("`{c}`"),
            None => "end of input".to_string(),
        })
        .collect();
    expected.sort();
    expected.dedup();
    match expected.is_empty() {
        true => found,
        false => format!("{found}, expected one of {}", expected.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(text: &str) -> String {
        parse(text, 0).unwrap().to_string()
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(round_trip("a - b - c"), "a - b - c = 0");
        assert_eq!(round_trip("a - (b - c)"), "a - (b - c) = 0");
        assert_eq!(round_trip("a / b * c = d"), "a/b*c = d");
        assert_eq!(round_trip("a + b*c^2 = -d"), "a + b*c^2 = -d");
    }

    #[test]
    fn both_power_spellings() {
        assert_eq!(parse("x**2 = 4", 0).unwrap(), parse("x ^ 2 = 4", 0).unwrap());
        assert_eq!(round_trip("x^-1 = 2"), "x^-1 = 2");
    }

    #[test]
    fn literals_stay_exact() {
        let equation = parse("VREF = 1.205", 0).unwrap();
        assert_eq!(Some(equation.rhs), Expr::decimal("1.205"));
        assert_eq!(parse("f = 250e3", 0).unwrap().rhs, Expr::int(250_000));
    }
}
