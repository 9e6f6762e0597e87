//! Logging setup utilities for the buzzer quiz server.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default filter directive: every listed crate (and the binary) at `level`.
fn default_directive(binary_name: &str, crate_names: &[&str], level: &str) -> String {
    let mut targets: Vec<String> = Vec::new();
    for name in std::iter::once(binary_name).chain(crate_names.iter().copied()) {
        let target = name.replace('-', "_");
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    targets
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The level applies to the binary and to every crate listed in `crate_names`.
/// It can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "buzzquiz-server")
/// * `crate_names` - Library crates whose logs should be enabled
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn")
///
/// # Examples
///
/// ```no_run
/// use buzzquiz_shared::logger::setup_logger;
///
/// setup_logger("buzzquiz-server", &["buzzquiz-server", "tower-http"], "debug");
/// ```
pub fn setup_logger(binary_name: &str, crate_names: &[&str], default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                default_directive(binary_name, crate_names, default_log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
