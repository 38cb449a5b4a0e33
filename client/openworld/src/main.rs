//! Headless open-world simulation runner.
//!
//! Run with: cargo run -p openworld -- --scenario joyride --telemetry drive.csv

use bevy::app::AppExit;
use openworld::{
    init_tracing, launch_params,
    runner::{self, TelemetrySink},
};
use openworld_sim::telemetry::FileTelemetryOutput;

fn main() -> AppExit {
    init_tracing();
    let params = launch_params::parse();

    let session = match runner::start_session(&params) {
        Ok(session) => session,
        Err(err) => {
            tracing::error!(%err, "failed to start session");
            return AppExit::error();
        }
    };

    let telemetry = match &params.telemetry {
        Some(path) => match FileTelemetryOutput::create(path) {
            Ok(output) => Some(TelemetrySink::new(Box::new(output))),
            Err(err) => {
                tracing::error!(%err, "failed to open telemetry file");
                return AppExit::error();
            }
        },
        None => None,
    };

    tracing::info!(
        scenario = ?params.scenario,
        preset = %params.preset,
        duration = params.duration,
        seed = params.seed,
        "starting"
    );
    runner::build_app(params, session, telemetry).run()
}
