//==================================================
// File: value/mod.rs
//==================================================
// Author: NASL Value Team
// License: MIT
// Goal: Runtime value model for NASL scripts
// Objective: Define the five value kinds and the capabilities
//            every kind answers: truthiness, display, typeof, equality
//==================================================

pub mod collection;
pub mod text;

use std::fmt;

pub use collection::{Collection, Key};

/// Tag distinguishing the five value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Absent,
    Integer,
    PureText,
    ImpureText,
    Collection,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Absent => "absent",
            Kind::Integer => "integer",
            Kind::PureText => "pure text",
            Kind::ImpureText => "impure text",
            Kind::Collection => "collection",
        }
    }

    pub fn is_text(self) -> bool {
        matches!(self, Kind::PureText | Kind::ImpureText)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A NASL runtime value.
///
/// `PureText` only ever holds bytes in `0..=127`; the constructors in
/// [`crate::coerce`] enforce that. `ImpureText` holds arbitrary bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Absent,
    Integer(i64),
    PureText(Vec<u8>),
    ImpureText(Vec<u8>),
    Collection(Collection),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Absent => Kind::Absent,
            Value::Integer(_) => Kind::Integer,
            Value::PureText(_) => Kind::PureText,
            Value::ImpureText(_) => Kind::ImpureText,
            Value::Collection(_) => Kind::Collection,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Text payload for either text kind.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::PureText(bytes) | Value::ImpureText(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// NASL truthiness. Text is falsy when empty or exactly `"0"`;
    /// a collection is always truthy, even when empty.
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Absent => false,
            Value::Integer(n) => *n != 0,
            Value::PureText(bytes) | Value::ImpureText(bytes) => {
                !bytes.is_empty() && bytes.as_slice() != b"0"
            }
            Value::Collection(_) => true,
        }
    }

    /// Bytes `display()` would emit for this value.
    pub fn display_bytes(&self) -> Vec<u8> {
        match self {
            Value::Absent => Vec::new(),
            Value::Integer(n) => n.to_string().into_bytes(),
            Value::PureText(bytes) | Value::ImpureText(bytes) => bytes.clone(),
            Value::Collection(collection) => collection.display_bytes(),
        }
    }

    /// Display rendering as a host string. Non UTF-8 bytes of impure
    /// text are replaced; use [`Value::display_bytes`] for the exact bytes.
    pub fn to_display_string(&self) -> String {
        String::from_utf8_lossy(&self.display_bytes()).into_owned()
    }

    /// The string NASL's `typeof()` reports.
    pub fn runtime_type_tag(&self) -> &'static str {
        match self {
            Value::Absent => "undef",
            Value::Integer(_) => "int",
            Value::PureText(_) | Value::ImpureText(_) => "data",
            Value::Collection(_) => "array",
        }
    }

    /// Strict equality: same kind and same payload, no coercion.
    /// The `==` operator goes through [`crate::ops::compare`] instead.
    pub fn equals(&self, other: &Value) -> bool {
        self == other
    }

    /// Source literal that evaluates to this value in a NASL script.
    pub fn as_nasl(&self) -> String {
        match self {
            Value::Absent => "NULL".to_string(),
            Value::Integer(n) => integer_literal(*n),
            Value::PureText(bytes) => text::single_quoted(bytes),
            Value::ImpureText(bytes) => text::double_quoted(bytes),
            Value::Collection(collection) => collection.as_nasl(),
        }
    }
}

/// Decimal literal for `n`. The magnitude of `i64::MIN` is not itself an
/// `i64`, so that one value is written as a subtraction.
pub(crate) fn integer_literal(n: i64) -> String {
    if n == i64::MIN {
        format!("({} - 1)", i64::MIN + 1)
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<Collection> for Value {
    fn from(value: Collection) -> Self {
        Value::Collection(value)
    }
}
