use thiserror::Error;

use crate::coerce::CoercionError;
use crate::expr::ExprError;
use crate::ops::Unsupported;
use crate::oracle::OracleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Syntax,
    Coercion,
    UnsupportedOperation,
    UnknownFunction,
    Oracle,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Syntax => "E001",
            ErrorCode::Coercion => "E002",
            ErrorCode::UnsupportedOperation => "E003",
            ErrorCode::UnknownFunction => "E004",
            ErrorCode::Oracle => "E005",
        }
    }
}

/// Script-level error surfaced to whoever runs NASL code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", .code.as_str())]
pub struct ScriptError {
    pub code: ErrorCode,
    pub message: String,
}

impl ScriptError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl From<ExprError> for ScriptError {
    fn from(value: ExprError) -> Self {
        ScriptError::new(ErrorCode::Syntax, value.to_string())
    }
}

impl From<CoercionError> for ScriptError {
    fn from(value: CoercionError) -> Self {
        ScriptError::new(ErrorCode::Coercion, value.to_string())
    }
}

impl From<Unsupported> for ScriptError {
    fn from(value: Unsupported) -> Self {
        ScriptError::new(ErrorCode::UnsupportedOperation, value.to_string())
    }
}

impl From<OracleError> for ScriptError {
    fn from(value: OracleError) -> Self {
        match value {
            OracleError::Local(err) => err,
            other => ScriptError::new(ErrorCode::Oracle, other.to_string()),
        }
    }
}
