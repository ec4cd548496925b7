//==================================================
// File: oracle/mod.rs
//==================================================
// Author: NASL Value Team
// License: MIT
// Goal: Cross-check the engine against the reference interpreter
// Objective: Generate observation scripts, run them through an Oracle
//            (reference process or local engine) and compare the
//            two-line display/typeof output
//==================================================

use std::fs;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::OracleConfig;
use crate::expr::{Environment, evaluate};
use crate::interpreter::ScriptError;
use crate::value::Value;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
    #[error("key-value socket {path} did not appear within {waited_ms} ms")]
    StoreTimeout { path: String, waited_ms: u64 },
    #[error("reference interpreter exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("local engine failed: {0}")]
    Local(#[from] ScriptError),
}

fn io_error(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> OracleError {
    let context = context.into();
    move |source| OracleError::Io { context, source }
}

/// Anything that can run a NASL script and return its stdout.
pub trait Oracle {
    fn run(&self, script: &str) -> Result<String, OracleError>;
}

/// Builds the observation script: bind each setup value to `x0`, `x1`,
/// ... then display the expression and its type tag on two lines.
pub fn script(expression: &str, setup: &[Value]) -> String {
    let mut lines: Vec<String> = setup
        .iter()
        .enumerate()
        .map(|(idx, value)| format!("x{idx} = {};", value.as_nasl()))
        .collect();
    lines.push(format!("display({expression});"));
    lines.push(format!("display('\\n' + typeof({expression}));"));
    let mut script = lines.join("\n");
    script.push('\n');
    script
}

/// Display string and type tag of one expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub display: String,
    #[serde(rename = "type")]
    pub type_tag: String,
}

impl Observation {
    /// What the oracle script prints for `value`.
    pub fn of(value: &Value) -> Self {
        Self {
            display: value.to_display_string(),
            type_tag: value.runtime_type_tag().to_string(),
        }
    }

    /// Splits oracle output on its last newline.
    pub fn parse(stdout: &str) -> Self {
        match stdout.rsplit_once('\n') {
            Some((display, type_tag)) => Self {
                display: display.to_string(),
                type_tag: type_tag.to_string(),
            },
            None => Self {
                display: stdout.to_string(),
                type_tag: String::new(),
            },
        }
    }
}

pub fn observe(
    oracle: &dyn Oracle,
    expression: &str,
    setup: &[Value],
) -> Result<Observation, OracleError> {
    let stdout = oracle.run(&script(expression, setup))?;
    Ok(Observation::parse(&stdout))
}

/// Outcome of running one expression through two oracles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub reference: Observation,
    pub local: Observation,
}

impl Verdict {
    pub fn agrees(&self) -> bool {
        self.reference == self.local
    }
}

pub fn cross_check(
    reference: &dyn Oracle,
    local: &dyn Oracle,
    expression: &str,
    setup: &[Value],
) -> Result<Verdict, OracleError> {
    let reference = observe(reference, expression, setup)?;
    let local = observe(local, expression, setup)?;
    let verdict = Verdict { reference, local };
    if !verdict.agrees() {
        warn!(expression, ?verdict, "engine disagrees with reference interpreter");
    }
    Ok(verdict)
}

/// Runs scripts with this crate's own engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalEngine;

impl Oracle for LocalEngine {
    fn run(&self, script: &str) -> Result<String, OracleError> {
        let mut env = Environment::new();
        evaluate(script, &mut env)?;
        Ok(String::from_utf8_lossy(&env.take_output()).into_owned())
    }
}

/// Runs scripts with the reference interpreter. Each run starts a
/// private key-value store on a unix socket inside a temporary
/// directory and stops it afterwards.
#[derive(Debug, Clone)]
pub struct ReferenceInterpreter {
    config: OracleConfig,
}

impl ReferenceInterpreter {
    pub fn new(config: OracleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn start_store(&self, socket: &Path) -> Result<StoreGuard, OracleError> {
        let child = Command::new(&self.config.redis_binary)
            .arg("--unixsocket")
            .arg(socket)
            .args(["--port", "0"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(io_error(format!(
                "starting {}",
                self.config.redis_binary.display()
            )))?;
        let guard = StoreGuard(child);

        let timeout = Duration::from_millis(self.config.startup_timeout_ms);
        let poll = Duration::from_millis(self.config.poll_interval_ms.max(1));
        let started = Instant::now();
        while !socket.exists() {
            if started.elapsed() >= timeout {
                return Err(OracleError::StoreTimeout {
                    path: socket.display().to_string(),
                    waited_ms: self.config.startup_timeout_ms,
                });
            }
            thread::sleep(poll);
        }
        debug!(socket = %socket.display(), "key-value store ready");
        Ok(guard)
    }
}

impl Oracle for ReferenceInterpreter {
    fn run(&self, script: &str) -> Result<String, OracleError> {
        let dir = tempfile::tempdir().map_err(io_error("creating scratch directory"))?;
        let socket = dir.path().join("redis.sock");
        let config_file = dir.path().join("openvas.cfg");
        let script_file = dir.path().join("script.nasl");

        let _store = self.start_store(&socket)?;
        fs::write(&config_file, format!("kb_location = {}\n", socket.display()))
            .map_err(io_error("writing interpreter configuration"))?;
        fs::write(&script_file, script).map_err(io_error("writing script"))?;

        info!(binary = %self.config.nasl_binary.display(), "running reference interpreter");
        let output = Command::new(&self.config.nasl_binary)
            .args(&self.config.nasl_args)
            .arg("-c")
            .arg(&config_file)
            .arg(&script_file)
            .stdin(Stdio::null())
            .output()
            .map_err(io_error(format!(
                "running {}",
                self.config.nasl_binary.display()
            )))?;

        if !output.status.success() {
            return Err(OracleError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Stops the key-value store when dropped.
struct StoreGuard(Child);

impl Drop for StoreGuard {
    fn drop(&mut self) {
        if let Err(err) = self.0.kill() {
            debug!(%err, "key-value store already stopped");
        }
        let _ = self.0.wait();
    }
}
