//==================================================
// File: ops/mod.rs
//==================================================
// Author: NASL Value Team
// License: MIT
// Goal: Generic operator dispatch over NASL values
// Objective: Run every binary operation through the coercion engine,
//            reporting unsupported kind pairings explicitly
//==================================================

pub mod integer;

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;
use tracing::trace;

use crate::value::{Key, Kind, Value, text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::Ne => ordering != Ordering::Equal,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Le => ordering != Ordering::Greater,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Ge => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

/// The operation has no meaning for this pairing of kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operator `{op}` is not supported between {left} and {right}")]
pub struct Unsupported {
    pub op: &'static str,
    pub left: Kind,
    pub right: Kind,
}

impl Unsupported {
    pub fn new(op: &'static str, left: &Value, right: &Value) -> Self {
        Self {
            op,
            left: left.kind(),
            right: right.kind(),
        }
    }
}

pub type OpResult<T> = Result<T, Unsupported>;

/// `lhs op rhs`.
///
/// `rhs` is coerced into the kind of `lhs` first; when that fails or
/// the kind has no such operation, `lhs` is coerced into the kind of
/// `rhs` (the reflected attempt). An Absent operand always takes the
/// kind of the other side, and `Absent op Absent` is Absent.
pub fn binary(lhs: &Value, op: BinaryOp, rhs: &Value) -> OpResult<Value> {
    trace!(op = op.symbol(), left = %lhs.kind(), right = %rhs.kind(), "binary dispatch");
    let outcome = match (lhs, rhs) {
        (Value::Absent, Value::Absent) => Some(Value::Absent),
        (Value::Absent, _) => reflected(lhs, op, rhs),
        _ => forward(lhs, op, rhs).or_else(|| {
            trace!(op = op.symbol(), "retrying with reflected operands");
            reflected(lhs, op, rhs)
        }),
    };
    outcome.ok_or_else(|| Unsupported::new(op.symbol(), lhs, rhs))
}

fn forward(lhs: &Value, op: BinaryOp, rhs: &Value) -> Option<Value> {
    let rhs = rhs.coerce(lhs.kind()).ok()?;
    same_kind(lhs, op, &rhs)
}

fn reflected(lhs: &Value, op: BinaryOp, rhs: &Value) -> Option<Value> {
    let lhs = lhs.coerce(rhs.kind()).ok()?;
    same_kind(&lhs, op, rhs)
}

fn same_kind(lhs: &Value, op: BinaryOp, rhs: &Value) -> Option<Value> {
    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => Some(Value::Integer(integer::apply(*a, op, *b))),
        (Value::PureText(a), Value::PureText(b)) => text_op(a, op, b).map(Value::PureText),
        (Value::ImpureText(a), Value::ImpureText(b)) => text_op(a, op, b).map(Value::ImpureText),
        (Value::Absent, Value::Absent) => Some(Value::Absent),
        _ => None,
    }
}

fn text_op(lhs: &[u8], op: BinaryOp, rhs: &[u8]) -> Option<Vec<u8>> {
    match op {
        BinaryOp::Add => Some([lhs, rhs].concat()),
        BinaryOp::Sub => Some(text::remove_first(lhs, rhs)),
        _ => None,
    }
}

/// Brings both operands to a common kind using the same order of
/// attempts as [`binary`].
fn align(lhs: &Value, rhs: &Value) -> Option<(Value, Value)> {
    if lhs.is_absent() && !rhs.is_absent() {
        return Some((lhs.coerce(rhs.kind()).ok()?, rhs.clone()));
    }
    if let Ok(rhs) = rhs.coerce(lhs.kind()) {
        return Some((lhs.clone(), rhs));
    }
    let lhs = lhs.coerce(rhs.kind()).ok()?;
    Some((lhs, rhs.clone()))
}

fn ordering(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Absent, Value::Absent) => Some(Ordering::Equal),
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::PureText(a), Value::PureText(b)) | (Value::ImpureText(a), Value::ImpureText(b)) => {
            Some(a.cmp(b))
        }
        _ => None,
    }
}

/// `lhs cmp rhs`. Equality never fails: operands without a common kind
/// are unequal. Ordering needs a common ordered kind.
pub fn compare(lhs: &Value, cmp: Comparison, rhs: &Value) -> OpResult<bool> {
    trace!(op = cmp.symbol(), left = %lhs.kind(), right = %rhs.kind(), "comparison dispatch");
    let aligned = align(lhs, rhs);
    match cmp {
        Comparison::Eq => Ok(aligned.is_some_and(|(a, b)| a == b)),
        Comparison::Ne => Ok(!aligned.is_some_and(|(a, b)| a == b)),
        _ => aligned
            .and_then(|(a, b)| ordering(&a, &b))
            .map(|order| cmp.holds(order))
            .ok_or_else(|| Unsupported::new(cmp.symbol(), lhs, rhs)),
    }
}

/// Substring containment, NASL's `needle >< haystack`.
///
/// Both operands must meet in a text kind. The needle is brought to the
/// haystack's kind first; when that lands on a non-text kind the
/// reflected attempt brings the haystack to the needle's kind.
pub fn contains(haystack: &Value, needle: &Value) -> OpResult<bool> {
    let as_text = |(hay, needle): (Value, Value)| match (hay.as_bytes(), needle.as_bytes()) {
        (Some(hay), Some(needle)) => Some(text::contains(hay, needle)),
        _ => None,
    };
    align(haystack, needle)
        .and_then(as_text)
        .or_else(|| {
            trace!(op = "><", "retrying with reflected operands");
            let hay = haystack.coerce(needle.kind()).ok()?;
            as_text((hay, needle.clone()))
        })
        .ok_or_else(|| Unsupported::new("><", needle, haystack))
}

pub fn unary(op: UnaryOp, operand: &Value) -> OpResult<Value> {
    let unsupported = || Unsupported::new(op.symbol(), operand, operand);
    match op {
        UnaryOp::Not => Ok(Value::from(!operand.to_boolean())),
        UnaryOp::Neg | UnaryOp::BitNot => {
            let n = operand
                .coerce(Kind::Integer)
                .ok()
                .and_then(|value| value.as_integer())
                .ok_or_else(unsupported)?;
            Ok(Value::Integer(match op {
                UnaryOp::Neg => n.wrapping_neg(),
                _ => !n,
            }))
        }
    }
}

/// Read-only indexing. Absent reads as Absent here; the in-place
/// promotion to a collection happens through [`crate::cell`].
pub fn index(value: &Value, key: &Value) -> OpResult<Value> {
    let unsupported = || Unsupported::new("[]", value, key);
    match value {
        Value::Absent => Ok(Value::Absent),
        Value::Collection(collection) => {
            let key = Key::try_from(key).map_err(|_| unsupported())?;
            Ok(collection.get(&key))
        }
        Value::PureText(bytes) | Value::ImpureText(bytes) => {
            let position = key
                .coerce(Kind::Integer)
                .ok()
                .and_then(|value| value.as_integer())
                .ok_or_else(unsupported)?;
            let byte = usize::try_from(position)
                .ok()
                .and_then(|position| bytes.get(position).copied());
            Ok(match (byte, value) {
                (None, _) => Value::Absent,
                (Some(byte), Value::PureText(_)) => Value::PureText(vec![byte]),
                (Some(byte), _) => Value::ImpureText(vec![byte]),
            })
        }
        Value::Integer(_) => Err(unsupported()),
    }
}
