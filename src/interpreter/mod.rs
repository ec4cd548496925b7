pub mod errors;

pub use errors::{ErrorCode, ScriptError};
