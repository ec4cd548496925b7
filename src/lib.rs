//! NASL value semantics: value kinds, coercion, operator dispatch and
//! the Absent → Collection transition, plus an oracle harness that
//! checks them against the reference interpreter.

pub mod cell;
pub mod coerce;
pub mod config;
pub mod expr;
pub mod interpreter;
pub mod logging;
pub mod ops;
pub mod oracle;
pub mod value;

pub use cell::Slot;
pub use coerce::{CoercionError, HostValue};
pub use config::OracleConfig;
pub use interpreter::{ErrorCode, ScriptError};
pub use ops::{BinaryOp, Comparison, OpResult, UnaryOp, Unsupported};
pub use value::{Collection, Key, Kind, Value};
