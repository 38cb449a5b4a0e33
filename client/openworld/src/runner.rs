//! Headless Bevy app that drives a [`Session`] at a fixed 60 Hz.
//!
//! Simulated time advances by exactly one fixed step per app update, so a run
//! is deterministic for a given seed and finishes as fast as the CPU allows.

use std::time::Duration;

use bevy::{app::ScheduleRunnerPlugin, prelude::*, time::TimeUpdateStrategy};
use glam::Vec3;
use openworld_sim::{
    Mode, Session, SessionEvent, TickReport,
    telemetry::{TelemetryOutput, VehicleTelemetry, emit_telemetry_to, reset_telemetry_to},
};

use crate::{launch_params::LaunchParams, script::Script};

/// Fixed timestep for the simulation (60 Hz).
pub const FIXED_TIMESTEP: f64 = 1.0 / 60.0;

/// Per-tick moves longer than this are teleports and not counted as travel.
const TELEPORT_DISTANCE: f32 = 5.0;

/// The running session.
#[derive(Resource)]
pub struct SimSession(pub Session);

/// The scripted player.
#[derive(Resource)]
pub struct ScriptPlayer(pub Script);

/// Optional vehicle telemetry destination.
#[derive(Resource, Default)]
pub struct TelemetrySink {
    output: Option<Box<dyn TelemetryOutput>>,
}

impl TelemetrySink {
    /// Wrap an output and write the CSV header.
    pub fn new(mut output: Box<dyn TelemetryOutput>) -> Self {
        reset_telemetry_to(output.as_mut());
        Self {
            output: Some(output),
        }
    }
}

/// Running totals for the end-of-run summary.
#[derive(Resource, Debug, Default)]
pub struct RunStats {
    pub ticks: u64,
    pub walked: f32,
    pub driven: f32,
    pub max_speed_kmh: f32,
    /// Largest drift angle seen, in radians.
    pub peak_drift: f32,
    pub events: Vec<SessionEvent>,
    last_position: Option<Vec3>,
    next_progress: f32,
}

impl RunStats {
    fn record(&mut self, report: &TickReport, session: &Session) {
        self.ticks += 1;
        let position = report.minimap.player_position;
        if let Some(last) = self.last_position {
            let step = position.distance(last);
            if step < TELEPORT_DISTANCE {
                if report.mode == Mode::Driving {
                    self.driven += step;
                } else {
                    self.walked += step;
                }
            }
        }
        self.last_position = Some(position);

        if let Some(speed) = report.hud.speed_kmh {
            self.max_speed_kmh = self.max_speed_kmh.max(speed);
        }
        if let Some(car) = session.world().active() {
            self.peak_drift = self.peak_drift.max(car.drift_angle.abs());
        }
        self.events.extend(report.events.iter().cloned());
    }
}

/// Build the session described by the launch parameters.
pub fn start_session(params: &LaunchParams) -> openworld_sim::Result<Session> {
    let tuning = params.tuning()?;
    let layout = params.layout()?;
    Ok(Session::new(tuning, &layout, params.seed))
}

/// Plugin that steps the session and reports on it.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RunStats>()
            .init_resource::<TelemetrySink>()
            .insert_resource(Time::<Fixed>::from_seconds(FIXED_TIMESTEP))
            .add_systems(FixedUpdate, step_session)
            .add_systems(Update, (log_progress, check_complete).chain());
    }
}

/// Assemble the headless app.
pub fn build_app(params: LaunchParams, session: Session, telemetry: Option<TelemetrySink>) -> App {
    let script = Script::for_scenario(params.scenario, &session);
    let mut app = App::new();
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            FIXED_TIMESTEP,
        )))
        .add_plugins(SimulationPlugin)
        .insert_resource(SimSession(session))
        .insert_resource(ScriptPlayer(script))
        .insert_resource(params);
    if let Some(sink) = telemetry {
        app.insert_resource(sink);
    }
    app
}

fn step_session(
    time: Res<Time>,
    mut session: ResMut<SimSession>,
    mut script: ResMut<ScriptPlayer>,
    mut telemetry: ResMut<TelemetrySink>,
    mut stats: ResMut<RunStats>,
) {
    let dt = time.delta_secs();
    let SimSession(session) = &mut *session;
    let input = script.0.next_input(session, dt);
    let report = session.tick(&input, dt);

    for event in &report.events {
        log_event(event);
    }
    if let (Some(output), Some(step), Some(car)) = (
        telemetry.output.as_deref_mut(),
        report.vehicle_step,
        session.world().active(),
    ) {
        let snapshot = VehicleTelemetry::capture(session.ctx().elapsed(), report.dt, car, &step);
        emit_telemetry_to(&snapshot, output);
    }
    stats.record(&report, session);
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::Talked(dialog) => {
            tracing::info!(friend = %dialog.name, message = %dialog.message, "dialog");
        }
        SessionEvent::NpcSurprised { friend, kind } => {
            tracing::debug!(%friend, ?kind, "npc surprised");
        }
        other => tracing::info!(event = ?other, "session event"),
    }
}

fn log_progress(params: Res<LaunchParams>, session: Res<SimSession>, mut stats: ResMut<RunStats>) {
    if params.progress_interval <= 0.0 {
        return;
    }
    #[allow(clippy::cast_possible_truncation)]
    let elapsed = session.0.ctx().elapsed() as f32;
    if elapsed < stats.next_progress {
        return;
    }
    stats.next_progress = elapsed + params.progress_interval;

    let hud = session.0.hud();
    let position = session.0.world().focus_position();
    tracing::info!(
        t = elapsed,
        mode = %hud.mode,
        location = %hud.location,
        x = position.x,
        z = position.z,
        prompt = hud.prompt.as_deref().unwrap_or("-"),
        "progress"
    );
}

fn check_complete(
    params: Res<LaunchParams>,
    session: Res<SimSession>,
    stats: Res<RunStats>,
    mut exit: MessageWriter<AppExit>,
    mut done: Local<bool>,
) {
    if *done || session.0.ctx().elapsed() < f64::from(params.duration) {
        return;
    }
    *done = true;

    let hud = session.0.hud();
    eprintln!();
    eprintln!("# === {:?} ===", params.scenario);
    eprintln!(
        "# Simulated: {:.1} s ({} ticks)",
        session.0.ctx().elapsed(),
        stats.ticks
    );
    eprintln!("# Final mode: {} at {}", hud.mode, hud.location);
    eprintln!("# Distance on foot: {:.1} m", stats.walked);
    eprintln!("# Distance driven: {:.1} m", stats.driven);
    eprintln!("# Max speed: {:.1} km/h", stats.max_speed_kmh);
    eprintln!("# Peak drift: {:.1} deg", stats.peak_drift.to_degrees());
    eprintln!("# Events: {}", stats.events.len());

    exit.write(AppExit::Success);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Scenario;

    fn app(scenario: Scenario, duration: f32) -> App {
        let params = LaunchParams {
            scenario,
            duration,
            progress_interval: 0.0,
            ..LaunchParams::default()
        };
        let session = start_session(&params).unwrap();
        build_app(params, session, None)
    }

    #[test]
    fn test_one_fixed_step_per_update() {
        let mut app = app(Scenario::Stroll, 60.0);
        for _ in 0..30 {
            app.update();
        }
        let ticks = app.world().resource::<RunStats>().ticks;
        // The first update may not accumulate a full step.
        assert!((28..=30).contains(&ticks), "ticks = {ticks}");
        assert!(app.world().resource::<RunStats>().walked > 0.0);
    }

    #[test]
    fn test_exit_after_duration() {
        let mut app = app(Scenario::Stroll, 0.5);
        let mut exit = None;
        for _ in 0..120 {
            app.update();
            exit = app.should_exit();
            if exit.is_some() {
                break;
            }
        }
        assert_eq!(exit, Some(AppExit::Success));
        let session = &app.world().resource::<SimSession>().0;
        assert!(session.ctx().elapsed() >= 0.5);
    }

    #[test]
    fn test_start_session_uses_preset() {
        let params = LaunchParams {
            preset: "drift".to_owned(),
            ..LaunchParams::default()
        };
        let session = start_session(&params).unwrap();
        assert_eq!(
            session.ctx().tuning,
            openworld_sim::config::TuningSet::preset("drift").unwrap()
        );
    }
}
