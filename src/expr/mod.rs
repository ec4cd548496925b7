//==================================================
// File: expr/mod.rs
//==================================================
// Author: NASL Value Team
// License: MIT
// Goal: Minimal NASL expression front end
// Objective: Tokenize and parse the statement subset used to observe
//            value semantics: literals, variables, operators, indexing,
//            increments, assignment and built-in calls
//==================================================

mod eval;

pub use eval::{Environment, evaluate, parse_binding};

use thiserror::Error;

use crate::coerce::parse_integer;
use crate::ops::{BinaryOp, Comparison, UnaryOp};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("invalid integer literal {text:?} at offset {offset}")]
    InvalidInteger { text: String, offset: usize },
    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("invalid assignment target at offset {offset}")]
    InvalidTarget { offset: usize },
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Int(i64),
    Data(Vec<u8>),
    Str(Vec<u8>),
    Ident(String),
    Punct(&'static str),
    End,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Int(n) => format!("integer {n}"),
            TokenKind::Data(_) | TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::Punct(p) => format!("`{p}`"),
            TokenKind::End => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

// Longest first so that `>>>=` wins over `>>` and `>`.
const PUNCTUATION: &[&str] = &[
    ">>>=", ">>>", ">!<", "<<=", ">>=", "**", "==", "!=", "<=", ">=", "><", "<<", ">>", "++",
    "--", "+=", "-=", "*=", "/=", "%=", "&&", "||", "=", "+", "-", "*", "/", "%", "<", ">", "&",
    "|", "^", "!", "~", "(", ")", "[", "]", ",", ";",
];

fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    'outer: while pos < bytes.len() {
        let byte = bytes[pos];
        if byte.is_ascii_whitespace() {
            pos += 1;
            continue;
        }
        if byte == b'#' {
            while pos < bytes.len() && bytes[pos] != b'\n' {
                pos += 1;
            }
            continue;
        }

        let start = pos;
        if byte.is_ascii_digit() {
            while pos < bytes.len() && bytes[pos].is_ascii_alphanumeric() {
                pos += 1;
            }
            let text = &source[start..pos];
            let n = parse_integer(text).map_err(|_| ExprError::InvalidInteger {
                text: text.to_string(),
                offset: start,
            })?;
            tokens.push(Token {
                kind: TokenKind::Int(n),
                offset: start,
            });
            continue;
        }
        if byte.is_ascii_alphabetic() || byte == b'_' {
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident(source[start..pos].to_string()),
                offset: start,
            });
            continue;
        }
        if byte == b'\'' {
            let (data, next) = single_quoted(bytes, start)?;
            tokens.push(Token {
                kind: TokenKind::Data(data),
                offset: start,
            });
            pos = next;
            continue;
        }
        if byte == b'"' {
            let end = bytes[start + 1..]
                .iter()
                .position(|&b| b == b'"')
                .ok_or(ExprError::UnterminatedString { offset: start })?;
            tokens.push(Token {
                kind: TokenKind::Str(bytes[start + 1..start + 1 + end].to_vec()),
                offset: start,
            });
            pos = start + end + 2;
            continue;
        }
        for &punct in PUNCTUATION {
            if bytes[pos..].starts_with(punct.as_bytes()) {
                tokens.push(Token {
                    kind: TokenKind::Punct(punct),
                    offset: start,
                });
                pos += punct.len();
                continue 'outer;
            }
        }
        let ch = source[pos..].chars().next().unwrap_or('\u{fffd}');
        return Err(ExprError::UnexpectedChar { ch, offset: pos });
    }

    tokens.push(Token {
        kind: TokenKind::End,
        offset: bytes.len(),
    });
    Ok(tokens)
}

/// Decodes a single-quoted literal starting at `start`; returns the
/// payload and the offset just past the closing quote.
fn single_quoted(bytes: &[u8], start: usize) -> Result<(Vec<u8>, usize), ExprError> {
    let mut out = Vec::new();
    let mut pos = start + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\'' => return Ok((out, pos + 1)),
            b'\\' if pos + 1 < bytes.len() => {
                let escaped = bytes[pos + 1];
                pos += 2;
                match escaped {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'\\' | b'\'' | b'"' => out.push(escaped),
                    b'x' => {
                        let hex = bytes.get(pos..pos + 2).and_then(|digits| {
                            std::str::from_utf8(digits)
                                .ok()
                                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                        });
                        match hex {
                            Some(byte) => {
                                out.push(byte);
                                pos += 2;
                            }
                            None => out.extend_from_slice(b"\\x"),
                        }
                    }
                    other => out.extend_from_slice(&[b'\\', other]),
                }
            }
            other => {
                out.push(other);
                pos += 1;
            }
        }
    }
    Err(ExprError::UnterminatedString { offset: start })
}

/// Single-quoted literals are pure text unless an escape or a raw
/// character puts a byte outside ASCII into them; those read as impure
/// text so the pure-text invariant holds.
fn data_literal(bytes: Vec<u8>) -> Value {
    Value::pure_text(bytes.as_slice()).unwrap_or_else(|_| Value::ImpureText(bytes))
}

/// Assignable location.
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    Var(String),
    Index(String, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var(String),
    Index(Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    Compare(Box<Expr>, Comparison, Box<Expr>),
    /// `needle >< haystack`, or `>!<` when `negated`.
    Match {
        needle: Box<Expr>,
        haystack: Box<Expr>,
        negated: bool,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Step {
        target: String,
        delta: i64,
        prefix: bool,
    },
    Assign {
        target: Place,
        op: Option<BinaryOp>,
        value: Box<Expr>,
    },
    Call(String, Vec<Expr>),
}

enum Infix {
    Or,
    And,
    Compare(Comparison),
    Match(bool),
    Binary(BinaryOp),
}

const PREFIX_BP: u8 = 19;

fn infix(punct: &str) -> Option<(u8, u8, Infix)> {
    let entry = match punct {
        "||" => (1, 2, Infix::Or),
        "&&" => (3, 4, Infix::And),
        "==" => (5, 6, Infix::Compare(Comparison::Eq)),
        "!=" => (5, 6, Infix::Compare(Comparison::Ne)),
        "<" => (5, 6, Infix::Compare(Comparison::Lt)),
        "<=" => (5, 6, Infix::Compare(Comparison::Le)),
        ">" => (5, 6, Infix::Compare(Comparison::Gt)),
        ">=" => (5, 6, Infix::Compare(Comparison::Ge)),
        "><" => (5, 6, Infix::Match(false)),
        ">!<" => (5, 6, Infix::Match(true)),
        "|" => (7, 8, Infix::Binary(BinaryOp::BitOr)),
        "^" => (9, 10, Infix::Binary(BinaryOp::BitXor)),
        "&" => (11, 12, Infix::Binary(BinaryOp::BitAnd)),
        "<<" => (13, 14, Infix::Binary(BinaryOp::Shl)),
        ">>" => (13, 14, Infix::Binary(BinaryOp::Shr)),
        ">>>" => (13, 14, Infix::Binary(BinaryOp::UShr)),
        "+" => (15, 16, Infix::Binary(BinaryOp::Add)),
        "-" => (15, 16, Infix::Binary(BinaryOp::Sub)),
        "*" => (17, 18, Infix::Binary(BinaryOp::Mul)),
        "/" => (17, 18, Infix::Binary(BinaryOp::Div)),
        "%" => (17, 18, Infix::Binary(BinaryOp::Rem)),
        "**" => (22, 21, Infix::Binary(BinaryOp::Pow)),
        _ => return None,
    };
    Some(entry)
}

fn assignment(punct: &str) -> Option<Option<BinaryOp>> {
    let op = match punct {
        "=" => None,
        "+=" => Some(BinaryOp::Add),
        "-=" => Some(BinaryOp::Sub),
        "*=" => Some(BinaryOp::Mul),
        "/=" => Some(BinaryOp::Div),
        "%=" => Some(BinaryOp::Rem),
        "<<=" => Some(BinaryOp::Shl),
        ">>=" => Some(BinaryOp::Shr),
        ">>>=" => Some(BinaryOp::UShr),
        _ => return None,
    };
    Some(op)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_punct(&self, punct: &str) -> bool {
        matches!(self.peek().kind, TokenKind::Punct(p) if p == punct)
    }

    fn expect_punct(&mut self, punct: &str) -> Result<(), ExprError> {
        if self.at_punct(punct) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&self) -> ExprError {
        let token = self.peek();
        match token.kind {
            TokenKind::End => ExprError::UnexpectedEnd,
            ref kind => ExprError::UnexpectedToken {
                found: kind.describe(),
                offset: token.offset,
            },
        }
    }

    fn program(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut statements = Vec::new();
        loop {
            while self.at_punct(";") {
                self.advance();
            }
            if self.peek().kind == TokenKind::End {
                return Ok(statements);
            }
            statements.push(self.statement()?);
            if self.peek().kind != TokenKind::End {
                self.expect_punct(";")?;
            }
        }
    }

    fn statement(&mut self) -> Result<Expr, ExprError> {
        let offset = self.peek().offset;
        let target = self.expr(0)?;
        let op = match &self.peek().kind {
            TokenKind::Punct(p) => assignment(p),
            _ => None,
        };
        let Some(op) = op else {
            return Ok(target);
        };
        self.advance();
        let place = match target {
            Expr::Var(name) => Place::Var(name),
            Expr::Index(base, key) => match *base {
                Expr::Var(name) if op.is_none() => Place::Index(name, key),
                _ => return Err(ExprError::InvalidTarget { offset }),
            },
            _ => return Err(ExprError::InvalidTarget { offset }),
        };
        let value = self.statement()?;
        Ok(Expr::Assign {
            target: place,
            op,
            value: Box::new(value),
        })
    }

    fn expr(&mut self, min_bp: u8) -> Result<Expr, ExprError> {
        let mut lhs = self.prefix()?;
        loop {
            let TokenKind::Punct(punct) = self.peek().kind else {
                break;
            };
            let Some((left_bp, right_bp, op)) = infix(punct) else {
                break;
            };
            if left_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = Box::new(self.expr(right_bp)?);
            let lhs_box = Box::new(lhs);
            lhs = match op {
                Infix::Or => Expr::Or(lhs_box, rhs),
                Infix::And => Expr::And(lhs_box, rhs),
                Infix::Compare(cmp) => Expr::Compare(lhs_box, cmp, rhs),
                Infix::Match(negated) => Expr::Match {
                    needle: lhs_box,
                    haystack: rhs,
                    negated,
                },
                Infix::Binary(op) => Expr::Binary(lhs_box, op, rhs),
            };
        }
        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr, ExprError> {
        let token = self.advance();
        let expr = match token.kind {
            TokenKind::Int(n) => Expr::Literal(Value::Integer(n)),
            TokenKind::Data(bytes) => Expr::Literal(data_literal(bytes)),
            TokenKind::Str(bytes) => Expr::Literal(Value::ImpureText(bytes)),
            TokenKind::Ident(name) => match name.as_str() {
                "NULL" => Expr::Literal(Value::Absent),
                "TRUE" => Expr::Literal(Value::Integer(1)),
                "FALSE" => Expr::Literal(Value::Integer(0)),
                _ if self.at_punct("(") => {
                    self.advance();
                    Expr::Call(name, self.arguments()?)
                }
                _ => Expr::Var(name),
            },
            TokenKind::Punct("(") => {
                let inner = self.expr(0)?;
                self.expect_punct(")")?;
                inner
            }
            TokenKind::Punct(p @ ("-" | "!" | "~")) => {
                let op = match p {
                    "-" => UnaryOp::Neg,
                    "!" => UnaryOp::Not,
                    _ => UnaryOp::BitNot,
                };
                Expr::Unary(op, Box::new(self.expr(PREFIX_BP)?))
            }
            TokenKind::Punct(p @ ("++" | "--")) => {
                let target = self.variable_name()?;
                return Ok(Expr::Step {
                    target,
                    delta: if p == "++" { 1 } else { -1 },
                    prefix: true,
                });
            }
            TokenKind::End => return Err(ExprError::UnexpectedEnd),
            kind => {
                return Err(ExprError::UnexpectedToken {
                    found: kind.describe(),
                    offset: token.offset,
                });
            }
        };
        self.postfix(expr)
    }

    fn postfix(&mut self, mut expr: Expr) -> Result<Expr, ExprError> {
        loop {
            if self.at_punct("[") {
                self.advance();
                let key = self.expr(0)?;
                self.expect_punct("]")?;
                expr = Expr::Index(Box::new(expr), Box::new(key));
            } else if self.at_punct("++") || self.at_punct("--") {
                let Expr::Var(target) = expr else {
                    return Err(ExprError::InvalidTarget {
                        offset: self.peek().offset,
                    });
                };
                let delta = if self.at_punct("++") { 1 } else { -1 };
                self.advance();
                return Ok(Expr::Step {
                    target,
                    delta,
                    prefix: false,
                });
            } else {
                return Ok(expr);
            }
        }
    }

    fn variable_name(&mut self) -> Result<String, ExprError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Ident(name) => Ok(name),
            _ => Err(ExprError::InvalidTarget {
                offset: token.offset,
            }),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.at_punct(")") {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.expr(0)?);
            if self.at_punct(",") {
                self.advance();
                continue;
            }
            self.expect_punct(")")?;
            return Ok(args);
        }
    }
}

/// Parses `;`-separated statements.
pub fn parse(source: &str) -> Result<Vec<Expr>, ExprError> {
    let tokens = tokenize(source)?;
    Parser { tokens, pos: 0 }.program()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Var(name.to_string()))
    }

    fn int(n: i64) -> Box<Expr> {
        Box::new(Expr::Literal(Value::Integer(n)))
    }

    #[test]
    fn literals() {
        assert_eq!(
            parse("017; 0x66; 'a\\x00b'; \"raw\\n\"; NULL").expect("parse"),
            vec![
                Expr::Literal(Value::Integer(15)),
                Expr::Literal(Value::Integer(102)),
                Expr::Literal(Value::PureText(b"a\x00b".to_vec())),
                Expr::Literal(Value::ImpureText(b"raw\\n".to_vec())),
                Expr::Literal(Value::Absent),
            ]
        );
    }

    #[test]
    fn precedence() {
        let parsed = parse("x0 + x1 * 2").expect("parse");
        assert_eq!(
            parsed,
            vec![Expr::Binary(
                var("x0"),
                BinaryOp::Add,
                Box::new(Expr::Binary(var("x1"), BinaryOp::Mul, int(2)))
            )]
        );
    }

    #[test]
    fn power_is_right_associative_and_binds_tighter_than_minus() {
        let parsed = parse("-2 ** 3 ** 2").expect("parse");
        assert_eq!(
            parsed,
            vec![Expr::Unary(
                UnaryOp::Neg,
                Box::new(Expr::Binary(
                    int(2),
                    BinaryOp::Pow,
                    Box::new(Expr::Binary(int(3), BinaryOp::Pow, int(2)))
                ))
            )]
        );
    }

    #[test]
    fn assignment_targets() {
        let parsed = parse("x0[1] = 5; x1 += 2").expect("parse");
        assert_eq!(
            parsed[0],
            Expr::Assign {
                target: Place::Index("x0".into(), int(1)),
                op: None,
                value: int(5),
            }
        );
        assert_eq!(
            parsed[1],
            Expr::Assign {
                target: Place::Var("x1".into()),
                op: Some(BinaryOp::Add),
                value: int(2),
            }
        );
        assert!(matches!(
            parse("1 = 2"),
            Err(ExprError::InvalidTarget { offset: 0 })
        ));
    }

    #[test]
    fn increments_and_calls() {
        let parsed = parse("x0++; --x1; typeof(x0[2])").expect("parse");
        assert_eq!(
            parsed[0],
            Expr::Step {
                target: "x0".into(),
                delta: 1,
                prefix: false
            }
        );
        assert_eq!(
            parsed[1],
            Expr::Step {
                target: "x1".into(),
                delta: -1,
                prefix: true
            }
        );
        assert_eq!(
            parsed[2],
            Expr::Call("typeof".into(), vec![Expr::Index(var("x0"), int(2))])
        );
    }

    #[test]
    fn non_ascii_single_quoted_literals_are_impure() {
        let parsed = parse("'\\xff'; 'caf\u{e9}'; 'plain\\x41'").expect("parse");
        assert_eq!(
            parsed,
            vec![
                Expr::Literal(Value::ImpureText(vec![0xff])),
                Expr::Literal(Value::ImpureText("caf\u{e9}".as_bytes().to_vec())),
                Expr::Literal(Value::PureText(b"plainA".to_vec())),
            ]
        );
    }

    #[test]
    fn match_operators() {
        let parsed = parse("'b' >!< x0").expect("parse");
        assert!(matches!(parsed[0], Expr::Match { negated: true, .. }));
    }

    #[test]
    fn lexer_errors() {
        assert!(matches!(parse("'abc"), Err(ExprError::UnterminatedString { offset: 0 })));
        assert!(matches!(parse("08"), Err(ExprError::InvalidInteger { .. })));
        assert!(matches!(parse("x0 @ 1"), Err(ExprError::UnexpectedChar { ch: '@', offset: 3 })));
        assert_eq!(parse("x0 +"), Err(ExprError::UnexpectedEnd));
    }
}
