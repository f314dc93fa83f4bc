//! Tracing bootstrap for binaries and tests embedding the engine.
//!
//! The subscriber is only initialised when `OPKIT_LOG` (or `RUST_LOG`) is
//! set, so there is zero overhead in normal builds.
//!
//! ```bash
//! OPKIT_LOG=debug my-app
//!
//! # Fine-grained filtering
//! OPKIT_LOG="opkit_engine=trace,opkit_core=debug" my-app
//! ```

use tracing_subscriber::EnvFilter;

/// Build an `EnvFilter` from `OPKIT_LOG`, falling back to `RUST_LOG`.
///
/// `OPKIT_LOG` takes precedence when both are set. Values use the same
/// syntax as `RUST_LOG` (e.g. `debug`, `opkit_engine=trace`).
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("OPKIT_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else {
        // RUST_LOG is set (caller already checked).  Use it as-is.
        EnvFilter::from_default_env()
    }
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `OPKIT_LOG` nor `RUST_LOG` is set. All output
/// goes to stderr so it never interferes with a host application's stdout.
pub fn init_tracing() {
    let has_opkit_log = std::env::var("OPKIT_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_opkit_log && !has_rust_log {
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_writer(std::io::stderr)
        .init();
}
