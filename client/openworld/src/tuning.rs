//! Headless vehicle tuner.
//!
//! Puts a driver in a single car on flat ground and runs it through the same
//! session tick as the game: a full-throttle speed test, a braking test and a
//! handbrake drift test. Telemetry CSV goes to stdout, the summary to stderr.
//!
//! Run with: cargo run -p openworld --bin vehicle-tuning -- [preset]
//! Example: cargo run -p openworld --bin vehicle-tuning -- drift > drift.csv

use std::{env, time::Duration};

use bevy::{app::ScheduleRunnerPlugin, prelude::*, time::TimeUpdateStrategy};
use glam::{Vec2, Vec3};
use openworld_sim::{
    ControlInput, Mode, Session, WorldLayout,
    config::TuningSet,
    input::ActionEdges,
    telemetry::{StdoutTelemetryOutput, VehicleTelemetry, emit_telemetry_to, reset_telemetry_to},
    terrain::FlatGround,
    vehicle::theoretical_top_speed,
    world::VehiclePlacement,
};

/// Fixed timestep for the simulation (60 Hz).
const FIXED_TIMESTEP: f64 = 1.0 / 60.0;

/// Give up on reaching equilibrium after this long (seconds).
const MAX_SPEED_TEST_TIME: f32 = 30.0;

/// Speed must stay above 95% of theoretical for this long to count as settled.
const EQUILIBRIUM_TIME: f32 = 2.0;

/// Give up on stopping after this long (seconds).
const MAX_BRAKE_TIME: f32 = 10.0;

/// Forward speed below which the car counts as stopped.
const STOPPED_SPEED: f32 = 0.5;

/// Straight-line run-up before the drift (seconds).
const DRIFT_RUN_UP: f32 = 3.0;

/// Handbrake turn duration (seconds).
const DRIFT_TEST_TIME: f32 = 3.0;

/// State of the tuner.
#[derive(Resource, Debug, Default, PartialEq)]
enum TunerState {
    /// Getting into the car.
    #[default]
    Entering,
    /// Full throttle until top speed settles.
    SpeedTest { elapsed: f32, equilibrium_timer: f32 },
    /// Full reverse from top speed until stopped.
    BrakeTest { elapsed: f32, start: Vec3 },
    /// Run-up, then hard left with the handbrake.
    DriftTest { elapsed: f32 },
    /// Done.
    Complete,
}

/// The tuner's session.
#[derive(Resource)]
struct TunerSession(Session);

/// Measurement results accumulated during the tests.
#[derive(Resource, Debug, Default)]
struct MeasurementResults {
    preset: String,
    theoretical_top_speed: f32,
    max_speed: f32,
    time_to_90_percent: Option<f32>,
    brake_start_speed: f32,
    stopping_distance: f32,
    stopping_time: f32,
    peak_drift: f32,
    drift_time: f32,
}

/// One car at the origin with the driver beside it.
fn test_layout() -> WorldLayout {
    WorldLayout {
        player_spawn: Vec3::new(2.0, 0.0, 0.0),
        vehicles: vec![VehiclePlacement {
            position: Vec3::ZERO,
            heading: 0.0,
        }],
        npcs: Vec::new(),
        houses: Vec::new(),
    }
}

/// Input for the current test.
fn test_input(state: &TunerState) -> ControlInput {
    match state {
        TunerState::Entering => ControlInput {
            actions: ActionEdges {
                interact: true,
                ..ActionEdges::default()
            },
            ..ControlInput::default()
        },
        TunerState::SpeedTest { .. } => ControlInput::with_move(Vec2::new(0.0, -1.0)),
        TunerState::BrakeTest { .. } => ControlInput::with_move(Vec2::new(0.0, 1.0)),
        TunerState::DriftTest { elapsed } if *elapsed >= DRIFT_RUN_UP => {
            let mut input = ControlInput::with_move(Vec2::new(-1.0, -1.0));
            input.handbrake = true;
            input
        }
        TunerState::DriftTest { .. } => ControlInput::with_move(Vec2::new(0.0, -1.0)),
        TunerState::Complete => ControlInput::default(),
    }
}

/// Step the session with the test input and advance the test state.
fn run_tests(
    time: Res<Time>,
    mut state: ResMut<TunerState>,
    mut tuner: ResMut<TunerSession>,
    mut results: ResMut<MeasurementResults>,
) {
    if *state == TunerState::Complete {
        return;
    }
    let dt = time.delta_secs();
    let session = &mut tuner.0;
    let report = session.tick(&test_input(&state), dt);

    let Some(car) = session.world().active() else {
        if *state != TunerState::Entering {
            eprintln!("# ERROR: driver left the car");
            *state = TunerState::Complete;
        }
        return;
    };

    if let Some(step) = report.vehicle_step {
        let snapshot = VehicleTelemetry::capture(session.ctx().elapsed(), report.dt, car, &step);
        emit_telemetry_to(&snapshot, &mut StdoutTelemetryOutput);
    }

    let speed = car.speed();
    match &mut *state {
        TunerState::Entering => {
            if report.mode == Mode::Driving {
                reset_telemetry_to(&mut StdoutTelemetryOutput);
                eprintln!("# In the car, running speed test...");
                *state = TunerState::SpeedTest {
                    elapsed: 0.0,
                    equilibrium_timer: 0.0,
                };
            }
        }
        TunerState::SpeedTest {
            elapsed,
            equilibrium_timer,
        } => {
            *elapsed += dt;
            results.max_speed = results.max_speed.max(speed);
            let target = results.theoretical_top_speed;
            if results.time_to_90_percent.is_none() && speed >= target * 0.9 {
                results.time_to_90_percent = Some(*elapsed);
            }
            if speed >= target * 0.95 {
                *equilibrium_timer += dt;
            } else {
                *equilibrium_timer = 0.0;
            }

            if *equilibrium_timer >= EQUILIBRIUM_TIME || *elapsed >= MAX_SPEED_TEST_TIME {
                eprintln!("# Speed test complete: {:.2} m/s", results.max_speed);
                eprintln!("# Running brake test...");
                results.brake_start_speed = car.forward_speed();
                *state = TunerState::BrakeTest {
                    elapsed: 0.0,
                    start: car.position,
                };
            }
        }
        TunerState::BrakeTest { elapsed, start } => {
            *elapsed += dt;
            if car.forward_speed() < STOPPED_SPEED || *elapsed >= MAX_BRAKE_TIME {
                let travelled = car.position - *start;
                results.stopping_distance = Vec2::new(travelled.x, travelled.z).length();
                results.stopping_time = *elapsed;
                eprintln!("# Brake test complete: {:.1} m", results.stopping_distance);
                eprintln!("# Running drift test...");
                *state = TunerState::DriftTest { elapsed: 0.0 };
            }
        }
        TunerState::DriftTest { elapsed } => {
            *elapsed += dt;
            if *elapsed >= DRIFT_RUN_UP {
                results.peak_drift = results.peak_drift.max(car.drift_angle.abs());
                if car.is_drifting {
                    results.drift_time += dt;
                }
            }
            if *elapsed >= DRIFT_RUN_UP + DRIFT_TEST_TIME {
                *state = TunerState::Complete;
            }
        }
        TunerState::Complete => {}
    }
}

/// Print the summary and exit once the tests are done.
fn check_complete(
    state: Res<TunerState>,
    results: Res<MeasurementResults>,
    mut exit: MessageWriter<AppExit>,
    mut done: Local<bool>,
) {
    if *done || *state != TunerState::Complete {
        return;
    }
    *done = true;

    eprintln!();
    eprintln!("# === {} ===", results.preset);
    eprintln!("# Speed:");
    eprintln!(
        "#   Theoretical top speed: {:.1} m/s ({:.1} km/h)",
        results.theoretical_top_speed,
        results.theoretical_top_speed * 3.6
    );
    eprintln!(
        "#   Max speed: {:.1} m/s ({:.1} km/h)",
        results.max_speed,
        results.max_speed * 3.6
    );
    if let Some(time) = results.time_to_90_percent {
        eprintln!("#   Time to 90%: {time:.2} s");
    } else {
        eprintln!("#   Time to 90%: (not reached)");
    }
    eprintln!("# Braking:");
    eprintln!("#   From: {:.1} m/s", results.brake_start_speed);
    eprintln!(
        "#   Stopping distance: {:.1} m in {:.2} s",
        results.stopping_distance, results.stopping_time
    );
    eprintln!("# Drift:");
    eprintln!("#   Peak drift angle: {:.1} deg", results.peak_drift.to_degrees());
    eprintln!("#   Time drifting: {:.2} s", results.drift_time);

    exit.write(AppExit::Success);
}

/// Assemble the tuner app for a tuning table.
fn build_app(preset: &str, tuning: TuningSet) -> App {
    let results = MeasurementResults {
        preset: preset.to_owned(),
        theoretical_top_speed: theoretical_top_speed(&tuning.vehicle, false),
        ..MeasurementResults::default()
    };
    let session = Session::new(tuning, &test_layout(), 0).with_ground(FlatGround::default());

    let mut app = App::new();
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            FIXED_TIMESTEP,
        )))
        .insert_resource(Time::<Fixed>::from_seconds(FIXED_TIMESTEP))
        .init_resource::<TunerState>()
        .insert_resource(TunerSession(session))
        .insert_resource(results)
        .add_systems(FixedUpdate, run_tests)
        .add_systems(Update, check_complete);
    app
}

fn main() -> AppExit {
    openworld::init_tracing();

    let preset = env::args().nth(1).unwrap_or_else(|| "standard".to_string());
    let tuning = match TuningSet::preset(&preset) {
        Ok(tuning) => tuning,
        Err(err) => {
            eprintln!("# ERROR: {err}");
            return AppExit::error();
        }
    };
    eprintln!("# Tuning preset: {preset}");
    build_app(&preset, tuning).run()
}
