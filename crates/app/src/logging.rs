//! Logging setup for the terminal front end.
//!
//! `RUST_LOG` wins when set; otherwise `--verbose` picks `debug` and the
//! default is `info`. Logs go to stderr so they never mix with screen output.

use std::io;

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_logging(verbose: bool) -> Result<(), TryInitError> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init()
}
