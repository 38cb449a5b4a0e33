//! Headless runners for the open-world simulation core.
//!
//! The `openworld` binary plays a scripted scenario; `vehicle-tuning` measures
//! the car. Both drive the core from a Bevy fixed-timestep loop without a
//! window or renderer.

pub mod launch_params;
pub mod runner;
pub mod script;

/// Install the `tracing` subscriber used by the binaries.
///
/// Reads `RUST_LOG`, falling back to `info`.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
