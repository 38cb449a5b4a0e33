//! Vehicle dynamics telemetry.
//!
//! Emits one CSV row per driving tick. Destinations implement
//! [`TelemetryOutput`]; the tuner writes to stdout, the runner to a file and
//! tests to memory.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use glam::Vec3;

use crate::{
    error::{Error, Result},
    vehicle::{GripState, VehicleState, VehicleStepOutput},
};

/// Snapshot of one vehicle step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VehicleTelemetry {
    pub elapsed: f64,
    pub dt: f32,
    pub throttle: f32,
    pub steer_input: f32,
    pub steer_angle: f32,
    pub handbrake: bool,
    pub speed: f32,
    pub forward_speed: f32,
    pub lateral_speed: f32,
    pub heading: f32,
    pub angular_velocity: f32,
    pub drift_angle: f32,
    pub drift_factor: f32,
    pub is_drifting: bool,
    pub grip: GripState,
    pub engine_force: f32,
    pub position: Vec3,
}

impl VehicleTelemetry {
    /// Capture a vehicle after a step.
    pub fn capture(elapsed: f64, dt: f32, car: &VehicleState, step: &VehicleStepOutput) -> Self {
        Self {
            elapsed,
            dt,
            throttle: car.throttle,
            steer_input: car.steer_input,
            steer_angle: car.steer_angle,
            handbrake: car.handbrake,
            speed: car.speed(),
            forward_speed: car.forward_speed(),
            lateral_speed: car.lateral_speed(),
            heading: car.heading,
            angular_velocity: car.angular_velocity,
            drift_angle: car.drift_angle,
            drift_factor: car.drift_factor,
            is_drifting: car.is_drifting,
            grip: step.grip,
            engine_force: step.engine_force,
            position: car.position,
        }
    }
}

/// A telemetry destination.
pub trait TelemetryOutput: Send + Sync {
    /// Write the CSV header.
    fn write_header(&mut self, header: &str);
    /// Write a data row.
    fn write_row(&mut self, row: &str);
}

/// Buffered CSV file, truncated on creation.
pub struct FileTelemetryOutput {
    path: PathBuf,
    writer: BufWriter<File>,
    failed: bool,
}

impl FileTelemetryOutput {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            failed: false,
        })
    }

    fn write_line(&mut self, line: &str) {
        if self.failed {
            return;
        }
        if let Err(err) = writeln!(self.writer, "{line}") {
            // One warning, then stay quiet.
            tracing::warn!(path = %self.path.display(), %err, "telemetry write failed");
            self.failed = true;
        }
    }
}

impl TelemetryOutput for FileTelemetryOutput {
    fn write_header(&mut self, header: &str) {
        self.write_line(header);
    }

    fn write_row(&mut self, row: &str) {
        self.write_line(row);
    }
}

impl Drop for FileTelemetryOutput {
    fn drop(&mut self) {
        if let Err(err) = self.writer.flush() {
            tracing::warn!(path = %self.path.display(), %err, "telemetry flush failed");
        }
    }
}

/// Stdout output for the headless tuner.
pub struct StdoutTelemetryOutput;

impl TelemetryOutput for StdoutTelemetryOutput {
    fn write_header(&mut self, header: &str) {
        println!("{header}");
    }

    fn write_row(&mut self, row: &str) {
        println!("{row}");
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryTelemetryOutput {
    pub lines: Vec<String>,
}

impl TelemetryOutput for MemoryTelemetryOutput {
    fn write_header(&mut self, header: &str) {
        self.lines.clear();
        self.lines.push(header.to_owned());
    }

    fn write_row(&mut self, row: &str) {
        self.lines.push(row.to_owned());
    }
}

/// Generates `reset_telemetry_to()` and `emit_telemetry_to()` from one column
/// schema so header and rows stay in sync.
macro_rules! define_telemetry {
    (
        columns: { $( $name:ident : $fmt:literal ),* $(,)? },
        prelude: |$snapshot:ident| { $( $prelude:stmt );* $(;)? },
        row_values: { $( $val:expr ),* $(,)? }
    ) => {
        /// CSV header string.
        pub const CSV_HEADER: &str = concat!( $( stringify!($name), "," ),* );

        /// Start a new log: write the header.
        pub fn reset_telemetry_to(output: &mut dyn TelemetryOutput) {
            output.write_header(CSV_HEADER.trim_end_matches(','));
        }

        /// Append one snapshot.
        pub fn emit_telemetry_to($snapshot: &VehicleTelemetry, output: &mut dyn TelemetryOutput) {
            $( $prelude )*

            let line = format!( concat!( $( $fmt, "," ),* ), $( $val ),* );
            output.write_row(line.trim_end_matches(','));
        }
    };
}

define_telemetry! {
    columns: {
        t: "{:.4}",
        dt: "{:.5}",
        throttle: "{:.3}",
        steer: "{:.3}",
        steer_deg: "{:.2}",
        handbrake: "{}",
        speed: "{:.2}",
        fwd_speed: "{:.2}",
        lat_speed: "{:.2}",
        heading_deg: "{:.2}",
        yaw_rate: "{:.3}",
        drift_deg: "{:.2}",
        drift_factor: "{:.3}",
        drifting: "{}",
        grip_front: "{:.3}",
        grip_rear: "{:.3}",
        engine: "{:.1}",
        pos_x: "{:.2}",
        pos_y: "{:.2}",
        pos_z: "{:.2}",
    },
    prelude: |t| {
        let handbrake = u8::from(t.handbrake);
        let drifting = u8::from(t.is_drifting);
    },
    row_values: {
        t.elapsed,
        t.dt,
        t.throttle,
        t.steer_input,
        t.steer_angle.to_degrees(),
        handbrake,
        t.speed,
        t.forward_speed,
        t.lateral_speed,
        t.heading.to_degrees(),
        t.angular_velocity,
        t.drift_angle.to_degrees(),
        t.drift_factor,
        drifting,
        t.grip.front,
        t.grip.rear,
        t.engine_force,
        t.position.x,
        t.position.y,
        t.position.z,
    }
}
