use std::path::Path;
use std::process::{Command, ExitStatus};

#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

fn naslvalue(args: &[&str], config_dir: Option<&Path>) -> CommandOutput {
    let mut command = Command::new(env!("CARGO_BIN_EXE_naslvalue"));
    command
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("NASLVALUE_TRACE")
        .env_remove("NASLVALUE_NASL_BIN")
        .env_remove("NASLVALUE_REDIS_BIN");
    if let Some(dir) = config_dir {
        command.env("XDG_CONFIG_HOME", dir).env("HOME", dir);
    }
    let output = command.output().expect("spawn naslvalue");
    CommandOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

pub fn run(args: &[&str]) -> String {
    let output = naslvalue(args, None);
    if !output.status.success() {
        panic!(
            "naslvalue {args:?} failed: {}\nstdout:\n{}\nstderr:\n{}",
            output.status, output.stdout, output.stderr
        );
    }
    output.stdout
}

pub fn run_in(args: &[&str], config_dir: &Path) -> String {
    let output = naslvalue(args, Some(config_dir));
    assert!(
        output.status.success(),
        "naslvalue {args:?} failed: {}\nstderr:\n{}",
        output.status,
        output.stderr
    );
    output.stdout
}

pub fn run_expect_failure(args: &[&str]) -> CommandOutput {
    let output = naslvalue(args, None);
    if output.status.success() {
        panic!(
            "naslvalue {args:?} unexpectedly succeeded\nstdout:\n{}",
            output.stdout
        );
    }
    output
}
