use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use naslvalue::OracleConfig;
use naslvalue::expr::{Environment, evaluate, parse_binding};
use naslvalue::logging;
use naslvalue::oracle::{self, LocalEngine, Observation, ReferenceInterpreter};
use naslvalue::value::Value;

#[derive(Debug, Parser)]
#[command(
    name = "naslvalue",
    about = "Evaluates NASL value expressions and cross-checks them against openvas-nasl.",
    version
)]
struct Args {
    /// Log operator dispatch (equivalent to setting NASLVALUE_TRACE=1).
    #[arg(long, global = true)]
    trace: bool,

    /// Oracle configuration file (defaults to <config dir>/naslvalue/oracle.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate an expression with the local engine.
    Eval {
        #[command(flatten)]
        target: Target,
        /// Print a JSON object instead of the two-line format.
        #[arg(long)]
        json: bool,
    },
    /// Print the script the reference interpreter would run.
    Script {
        #[command(flatten)]
        target: Target,
    },
    /// Run the expression through both engines and compare.
    Check {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        json: bool,
    },
    /// Print the effective oracle configuration as TOML.
    Config,
}

#[derive(Debug, ClapArgs)]
struct Target {
    /// Value bound to x0, x1, ... in order: null, int:N, str:TEXT,
    /// data:BYTES or a literal such as 'foo'.
    #[arg(long = "bind", value_name = "LITERAL")]
    bindings: Vec<String>,

    /// Expression to evaluate, e.g. "x0 + x1".
    #[arg(allow_hyphen_values = true)]
    expression: String,
}

impl Target {
    fn values(&self) -> Result<Vec<Value>> {
        self.bindings
            .iter()
            .map(|text| {
                parse_binding(text).with_context(|| format!("invalid binding `{text}`"))
            })
            .collect()
    }
}

#[derive(Serialize)]
struct CheckReport<'a> {
    expression: &'a str,
    agrees: bool,
    #[serde(flatten)]
    verdict: &'a oracle::Verdict,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    logging::init(args.trace || logging::trace_from_env());

    match &args.command {
        Command::Eval { target, json } => {
            let observation = eval_local(target)?;
            if *json {
                println!("{}", serde_json::to_string(&observation)?);
            } else {
                println!("{}\n{}", observation.display, observation.type_tag);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Script { target } => {
            print!("{}", oracle::script(&target.expression, &target.values()?));
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { target, json } => check(&args, target, *json),
        Command::Config => {
            let config = load_config(&args)?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(args: &Args) -> Result<OracleConfig> {
    let config = OracleConfig::load(args.config.as_deref())?;
    debug!(?config, "oracle configuration loaded");
    Ok(config)
}

fn eval_local(target: &Target) -> Result<Observation> {
    let mut env = Environment::with_bindings(target.values()?);
    let value = evaluate(&target.expression, &mut env)
        .map_err(|err| anyhow!("{}: {err}", target.expression))?;
    Ok(Observation::of(&value))
}

fn check(args: &Args, target: &Target, json: bool) -> Result<ExitCode> {
    let reference = ReferenceInterpreter::new(load_config(args)?);
    let verdict = oracle::cross_check(
        &reference,
        &LocalEngine,
        &target.expression,
        &target.values()?,
    )
    .context("cross-check failed")?;

    if json {
        let report = CheckReport {
            expression: &target.expression,
            agrees: verdict.agrees(),
            verdict: &verdict,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if verdict.agrees() {
        println!(
            "ok: {} => {:?} ({})",
            target.expression, verdict.local.display, verdict.local.type_tag
        );
    } else {
        println!("MISMATCH: {}", target.expression);
        println!(
            "  reference: {:?} ({})",
            verdict.reference.display, verdict.reference.type_tag
        );
        println!(
            "  local:     {:?} ({})",
            verdict.local.display, verdict.local.type_tag
        );
    }

    Ok(if verdict.agrees() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
