//==================================================
// File: coerce/mod.rs
//==================================================
// Author: NASL Value Team
// License: MIT
// Goal: Single chokepoint for kind conversion
// Objective: Build values from host data and convert values between
//            kinds, failing with CoercionError when no path exists
//==================================================

use thiserror::Error;

use crate::value::{Collection, Key, Kind, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("cannot interpret {0:?} as an integer")]
    NotAnInteger(String),
    #[error("non-ASCII byte 0x{byte:02x} at offset {offset} cannot be pure text")]
    NonAscii { byte: u8, offset: usize },
    #[error("cannot coerce {from} into {to}")]
    Incompatible { from: Kind, to: Kind },
    #[error("cannot build {to} from host {origin}")]
    HostMismatch { origin: &'static str, to: Kind },
    #[error("{0} cannot be used as a collection key")]
    InvalidKey(Kind),
}

/// Host-side data a value can be constructed from.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Nothing,
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
    Map(Vec<(HostValue, Value)>),
    Value(Value),
}

impl HostValue {
    fn origin(&self) -> &'static str {
        match self {
            HostValue::Nothing => "nothing",
            HostValue::Int(_) => "integer",
            HostValue::Str(_) => "string",
            HostValue::Bytes(_) => "bytes",
            HostValue::Map(_) => "mapping",
            HostValue::Value(_) => "value",
        }
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        HostValue::Int(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Int(i64::from(value))
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::Str(value.to_string())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::Str(value)
    }
}

impl From<&[u8]> for HostValue {
    fn from(value: &[u8]) -> Self {
        HostValue::Bytes(value.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for HostValue {
    fn from(value: &[u8; N]) -> Self {
        HostValue::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for HostValue {
    fn from(value: Vec<u8>) -> Self {
        HostValue::Bytes(value)
    }
}

impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        HostValue::Value(value)
    }
}

impl From<&Value> for HostValue {
    fn from(value: &Value) -> Self {
        HostValue::Value(value.clone())
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(HostValue::Nothing, Into::into)
    }
}

impl Value {
    /// Builds a value of `kind` from host data.
    pub fn construct(kind: Kind, host: impl Into<HostValue>) -> Result<Value, CoercionError> {
        let host = host.into();
        match host {
            HostValue::Value(value) => value.coerce(kind),
            HostValue::Nothing => Value::Absent.coerce(kind),
            HostValue::Int(n) => Value::Integer(n).coerce(kind),
            HostValue::Str(text) => from_host_bytes(kind, text.into_bytes(), "string"),
            HostValue::Bytes(bytes) => from_host_bytes(kind, bytes, "bytes"),
            HostValue::Map(entries) if kind == Kind::Collection => {
                let mut collection = Collection::new();
                for (key, value) in entries {
                    collection.insert(host_key(key)?, value);
                }
                Ok(Value::Collection(collection))
            }
            other => Err(CoercionError::HostMismatch {
                origin: other.origin(),
                to: kind,
            }),
        }
    }

    pub fn absent(host: impl Into<HostValue>) -> Result<Value, CoercionError> {
        Value::construct(Kind::Absent, host)
    }

    pub fn integer(host: impl Into<HostValue>) -> Result<Value, CoercionError> {
        Value::construct(Kind::Integer, host)
    }

    pub fn pure_text(host: impl Into<HostValue>) -> Result<Value, CoercionError> {
        Value::construct(Kind::PureText, host)
    }

    pub fn impure_text(host: impl Into<HostValue>) -> Result<Value, CoercionError> {
        Value::construct(Kind::ImpureText, host)
    }

    pub fn collection(host: impl Into<HostValue>) -> Result<Value, CoercionError> {
        Value::construct(Kind::Collection, host)
    }

    /// Converts into `kind`. Same-kind coercion is a copy and Absent
    /// converts into every kind. Collections are never produced from
    /// scalars and nothing but Absent becomes Absent.
    pub fn coerce(&self, kind: Kind) -> Result<Value, CoercionError> {
        if self.kind() == kind {
            return Ok(self.clone());
        }
        match (self, kind) {
            (Value::Absent, Kind::Integer) => Ok(Value::Integer(0)),
            (Value::Absent, Kind::PureText) => Ok(Value::PureText(Vec::new())),
            (Value::Absent, Kind::ImpureText) => Ok(Value::ImpureText(Vec::new())),
            (Value::Absent, Kind::Collection) => Ok(Value::Collection(Collection::new())),
            (Value::Integer(n), Kind::PureText) => Ok(Value::PureText(n.to_string().into_bytes())),
            (Value::Integer(n), Kind::ImpureText) => {
                Ok(Value::ImpureText(n.to_string().into_bytes()))
            }
            (Value::PureText(bytes) | Value::ImpureText(bytes), Kind::Integer) => {
                parse_integer_bytes(bytes).map(Value::Integer)
            }
            (Value::PureText(bytes), Kind::ImpureText) => Ok(Value::ImpureText(bytes.clone())),
            _ => Err(CoercionError::Incompatible {
                from: self.kind(),
                to: kind,
            }),
        }
    }
}

fn from_host_bytes(
    kind: Kind,
    bytes: Vec<u8>,
    origin: &'static str,
) -> Result<Value, CoercionError> {
    match kind {
        Kind::Integer => parse_integer_bytes(&bytes).map(Value::Integer),
        Kind::PureText => {
            ensure_ascii(&bytes)?;
            Ok(Value::PureText(bytes))
        }
        Kind::ImpureText => Ok(Value::ImpureText(bytes)),
        Kind::Absent | Kind::Collection => Err(CoercionError::HostMismatch { origin, to: kind }),
    }
}

fn ensure_ascii(bytes: &[u8]) -> Result<(), CoercionError> {
    match bytes.iter().position(|byte| !byte.is_ascii()) {
        Some(offset) => Err(CoercionError::NonAscii {
            byte: bytes[offset],
            offset,
        }),
        None => Ok(()),
    }
}

fn host_key(host: HostValue) -> Result<Key, CoercionError> {
    match host {
        HostValue::Int(n) => Ok(Key::Int(n)),
        HostValue::Str(text) => Ok(Key::Text(text.into_bytes())),
        HostValue::Bytes(bytes) => Ok(Key::Text(bytes)),
        HostValue::Value(value) => Key::try_from(&value),
        HostValue::Nothing => Err(CoercionError::InvalidKey(Kind::Absent)),
        HostValue::Map(_) => Err(CoercionError::InvalidKey(Kind::Collection)),
    }
}

impl TryFrom<&Value> for Key {
    type Error = CoercionError;

    /// Keys used for indexing: integers and either text kind.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Integer(n) => Ok(Key::Int(*n)),
            Value::PureText(bytes) | Value::ImpureText(bytes) => Ok(Key::Text(bytes.clone())),
            other => Err(CoercionError::InvalidKey(other.kind())),
        }
    }
}

/// Parses `-?(0|[1-9][0-9]*)`, `-?0x[0-9a-fA-F]+` or `-?0[0-7]+`.
pub fn parse_integer(text: &str) -> Result<i64, CoercionError> {
    let not_an_integer = || CoercionError::NotAnInteger(text.to_string());
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let radix = if digits == "0" {
        10
    } else if let Some(hex) = digits.strip_prefix("0x") {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(not_an_integer());
        }
        16
    } else if let Some(octal) = digits.strip_prefix('0') {
        if octal.is_empty() || !octal.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return Err(not_an_integer());
        }
        8
    } else {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(not_an_integer());
        }
        10
    };

    let body = match radix {
        16 => &digits[2..],
        _ => digits,
    };
    let magnitude = i128::from_str_radix(body, radix).map_err(|_| not_an_integer())?;
    let signed = if negative { -magnitude } else { magnitude };
    i64::try_from(signed).map_err(|_| not_an_integer())
}

fn parse_integer_bytes(bytes: &[u8]) -> Result<i64, CoercionError> {
    match std::str::from_utf8(bytes) {
        Ok(text) if text.is_ascii() => parse_integer(text),
        _ => Err(CoercionError::NotAnInteger(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
    }
}
