//! Tracing subscriber setup.
//!
//! `MEDPREDICT_LOG` takes precedence over `[logging].filter`. Output goes to
//! stderr so that `--json` command output on stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "MEDPREDICT_LOG";

pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::try_new(default_filter).unwrap_or_else(|_| EnvFilter::new("info"))
    });

    // A second init (tests, embedding) is not an error.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
