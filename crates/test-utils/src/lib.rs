pub mod builders;
pub mod collector;

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install the tracing subscriber once for the whole test binary.
///
/// Filtering defaults to `info`; raise it with `RUST_LOG` when chasing a
/// failure. Output goes through the test writer, so passing tests stay
/// quiet unless the harness runs with `--nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Bound a pipeline-driving future so a wedged subprocess fails the test
/// instead of hanging the whole suite.
///
/// Ten seconds is generous headroom for the shell-script toolchains the
/// integration suites spawn.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(10), f)
        .await
        .expect("timed out waiting for the pipeline")
}
