//=============================================
// logging.rs
//=============================================
// Author: NASL Value Team
// License: MIT
// Goal: Tracing setup for the naslvalue binary and tests
// Objective: Install one fmt subscriber, filtered by RUST_LOG or the
//            verbosity requested on the command line
//=============================================

use std::env;
use std::sync::OnceLock;

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

static INIT: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber once. `verbose` raises the default
/// level to TRACE so operator dispatch is visible; an explicit
/// `RUST_LOG` always wins.
pub fn init(verbose: bool) {
    INIT.get_or_init(|| {
        let level = if verbose { Level::TRACE } else { Level::WARN };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
        // Another subscriber may already be installed by a test harness.
        let _ = SubscriberBuilder::default()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .try_init();
    });
}

/// `NASLVALUE_TRACE` set to anything but empty, `0`, `false` or `off`.
pub fn trace_from_env() -> bool {
    env::var("NASLVALUE_TRACE")
        .ok()
        .map(|value| {
            let lower = value.to_ascii_lowercase();
            !(lower.is_empty() || lower == "0" || lower == "false" || lower == "off")
        })
        .unwrap_or(false)
}
