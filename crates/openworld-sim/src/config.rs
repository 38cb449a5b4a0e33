//! Tunable constant tables.
//!
//! Each subsystem reads its own struct out of a [`TuningSet`]. Sets are
//! swappable as a whole (named presets) or partially overridden from JSON,
//! since every struct defaults to the standard table field by field.

use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Vehicle
// ============================================================================

/// Configuration for vehicle dynamics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    /// Peak engine force at zero speed (N).
    pub engine_force: f32,
    /// Braking force when reversing throttle while rolling forward (N).
    pub brake_force: f32,
    /// Peak reverse force (N).
    pub reverse_force: f32,
    /// Speed where engine force tapers to zero (m/s).
    pub max_speed: f32,
    /// Max speed multiplier while boosting.
    pub boost_multiplier: f32,
    /// Reverse top speed as a fraction of max speed.
    pub reverse_speed_ratio: f32,
    /// Rate at which the wheels steer toward the target angle (1/s).
    pub steering_speed: f32,
    /// Rate at which the wheels recenter with no steer input (1/s).
    pub steering_return_speed: f32,
    /// Maximum wheel angle at standstill (radians).
    pub max_steering_angle: f32,
    /// Base front tire grip.
    pub front_grip: f32,
    /// Base rear tire grip. Lower values oversteer.
    pub rear_grip: f32,
    /// Rear grip multiplier while the handbrake is held.
    pub handbrake_grip: f32,
    /// Lateral friction coefficient.
    pub drift_factor: f32,
    /// Vehicle mass in kg.
    pub mass: f32,
    /// Quadratic aerodynamic drag coefficient.
    pub drag_coefficient: f32,
    /// Rolling resistance coefficient.
    pub rolling_resistance: f32,
    /// Effective wheelbase used for the turn radius (m).
    pub wheelbase: f32,
    /// Height of the chassis origin above the ground (m).
    pub ride_height: f32,
    /// Body roll per unit of yaw rate times speed.
    pub body_roll: f32,
    /// Nose-up pitch under full throttle.
    pub pitch_on_accel: f32,
    /// Nose-down pitch under full braking.
    pub pitch_on_brake: f32,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            engine_force: 4500.0,
            brake_force: 6000.0,
            reverse_force: 2000.0,
            max_speed: 45.0,
            boost_multiplier: 1.4,
            reverse_speed_ratio: 0.3,
            steering_speed: 3.5,
            steering_return_speed: 5.0,
            max_steering_angle: 0.6,
            front_grip: 1.0,
            rear_grip: 0.85,
            handbrake_grip: 0.3,
            drift_factor: 0.92,
            mass: 1500.0,
            drag_coefficient: 0.35,
            rolling_resistance: 0.015,
            wheelbase: 3.0,
            ride_height: 0.35,
            body_roll: 0.08,
            pitch_on_accel: 0.04,
            pitch_on_brake: 0.06,
        }
    }
}

impl VehicleTuning {
    /// Loose rear end and quicker steering for sliding around corners.
    pub fn drift() -> Self {
        Self {
            rear_grip: 0.7,
            handbrake_grip: 0.2,
            drift_factor: 0.85,
            steering_speed: 4.5,
            max_steering_angle: 0.65,
            ..Self::default()
        }
    }
}

// ============================================================================
// Locomotion
// ============================================================================

/// Axis-aligned rectangle on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundRect {
    /// Minimum (x, z) corner.
    pub min: Vec2,
    /// Maximum (x, z) corner.
    pub max: Vec2,
}

impl GroundRect {
    /// Clamp an (x, z) point into the rectangle.
    pub fn clamp(&self, x: f32, z: f32) -> (f32, f32) {
        (x.clamp(self.min.x, self.max.x), z.clamp(self.min.y, self.max.y))
    }
}

/// Configuration for on-foot movement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionTuning {
    /// Target speed with the walk modifier held (m/s).
    pub walk_speed: f32,
    /// Default target speed (m/s).
    pub jog_speed: f32,
    /// Target speed with the run modifier held (m/s).
    pub sprint_speed: f32,
    /// Acceleration toward the target speed at full stick (m/s²).
    pub acceleration: f32,
    /// Deceleration with no input (m/s²). Halved when above target speed.
    pub deceleration: f32,
    /// Turn rate while idle.
    pub turn_speed_idle: f32,
    /// Turn rate while walking or jogging.
    pub turn_speed_walk: f32,
    /// Turn rate while sprinting.
    pub turn_speed_sprint: f32,
    /// Angular velocity damping rate (1/s).
    pub turn_damping: f32,
    /// Downward acceleration while airborne (m/s²).
    pub gravity: f32,
    /// Upward velocity applied by a jump (m/s).
    pub jump_force: f32,
    /// Maximum falling speed (m/s).
    pub terminal_velocity: f32,
    /// Largest drop the player follows without becoming airborne (m).
    pub ground_snap: f32,
    /// Interior room bounds used in indoor mode.
    pub indoor_bounds: GroundRect,
}

impl Default for LocomotionTuning {
    fn default() -> Self {
        Self {
            walk_speed: 4.5,
            jog_speed: 6.5,
            sprint_speed: 9.5,
            acceleration: 18.0,
            deceleration: 22.0,
            turn_speed_idle: 8.0,
            turn_speed_walk: 5.0,
            turn_speed_sprint: 3.0,
            turn_damping: 9.0,
            gravity: 28.0,
            jump_force: 9.0,
            terminal_velocity: 50.0,
            ground_snap: 0.3,
            indoor_bounds: GroundRect {
                min: Vec2::new(492.0, 492.0),
                max: Vec2::new(508.0, 509.0),
            },
        }
    }
}

// ============================================================================
// Camera
// ============================================================================

/// Configuration for the chase camera.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// Follow spring rate for position, distance and height.
    pub follow_smoothing: f32,
    /// Spring rate for the look-at point.
    pub look_smoothing: f32,
    /// Velocity damping applied to the position spring each tick.
    pub position_damping: f32,
    /// Velocity damping applied to the look-at spring each tick.
    pub look_damping: f32,
    /// Base follow distance on foot.
    pub walk_distance: f32,
    /// Base camera height on foot.
    pub walk_height: f32,
    /// Base follow distance while driving.
    pub drive_distance: f32,
    /// Base camera height while driving.
    pub drive_height: f32,
    /// Extra distance at full driving speed.
    pub drive_speed_zoom: f32,
    /// Follow distance indoors.
    pub indoor_distance: f32,
    /// Camera height indoors.
    pub indoor_height: f32,
    /// Base field of view in degrees.
    pub fov_base: f32,
    /// Extra field of view while sprinting (degrees).
    pub fov_sprint_boost: f32,
    /// Extra field of view at full driving speed (degrees).
    pub fov_drive_boost: f32,
    /// Gap kept between the camera and an obstruction.
    pub collision_margin: f32,
    /// Closest the camera is pulled toward the look-at point by obstructions.
    pub collision_min_distance: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            follow_smoothing: 8.0,
            look_smoothing: 15.0,
            position_damping: 0.85,
            look_damping: 0.88,
            walk_distance: 8.0,
            walk_height: 4.0,
            drive_distance: 14.0,
            drive_height: 5.0,
            drive_speed_zoom: 6.0,
            indoor_distance: 5.0,
            indoor_height: 2.5,
            fov_base: 65.0,
            fov_sprint_boost: 10.0,
            fov_drive_boost: 20.0,
            collision_margin: 0.5,
            collision_min_distance: 1.0,
        }
    }
}

// ============================================================================
// NPC
// ============================================================================

/// Configuration for NPC reactions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcTuning {
    /// Beyond this distance the NPC idles.
    pub idle_distance: f32,
    /// Beyond this distance (and within idle) the NPC watches.
    pub watch_distance: f32,
    /// Beyond this distance (and within watch) the NPC is alert; inside it greets.
    pub greet_distance: f32,
    /// Approach speed that startles an alert NPC (m/s).
    pub startle_speed: f32,
    /// Knockback distance for a startle.
    pub startle_offset: f32,
    /// Knockback distance when first becoming alert.
    pub alert_offset: f32,
    /// Knockback offset decay per reference tick.
    pub offset_decay: f32,
    /// Surprise hop decay per reference tick.
    pub surprise_decay: f32,
    /// Rate at which awareness tracks its target (1/s).
    pub awareness_rate: f32,
    /// Facing rate while alert (1/s).
    pub alert_turn_rate: f32,
    /// Facing rate otherwise (1/s).
    pub calm_turn_rate: f32,
    /// Wave ramp-in rate (1/s).
    pub wave_in_rate: f32,
    /// Wave ramp-out rate (1/s).
    pub wave_out_rate: f32,
}

impl Default for NpcTuning {
    fn default() -> Self {
        Self {
            idle_distance: 15.0,
            watch_distance: 8.0,
            greet_distance: 4.0,
            startle_speed: 8.0,
            startle_offset: 1.4,
            alert_offset: 1.1,
            offset_decay: 0.9,
            surprise_decay: 0.92,
            awareness_rate: 3.0,
            alert_turn_rate: 8.0,
            calm_turn_rate: 3.0,
            wave_in_rate: 5.0,
            wave_out_rate: 3.0,
        }
    }
}

// ============================================================================
// Interaction
// ============================================================================

/// Reach distances for interactables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionTuning {
    /// Exit reach while driving, measured from the occupied vehicle.
    pub exit_radius: f32,
    /// Reach to a parked vehicle on foot.
    pub vehicle_radius: f32,
    /// Reach to an NPC on foot.
    pub npc_radius: f32,
    /// Reach to a house door on foot.
    pub house_radius: f32,
    /// Reach to the interior exit door.
    pub door_radius: f32,
    /// Sideways distance of the exit point from a vehicle.
    pub exit_offset: f32,
}

impl Default for InteractionTuning {
    fn default() -> Self {
        Self {
            exit_radius: 3.0,
            vehicle_radius: 5.0,
            npc_radius: 4.0,
            house_radius: 4.0,
            door_radius: 3.0,
            exit_offset: 2.5,
        }
    }
}

// ============================================================================
// Tuning set
// ============================================================================

/// All tables for one session.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningSet {
    /// Vehicle dynamics table.
    pub vehicle: VehicleTuning,
    /// On-foot movement table.
    pub locomotion: LocomotionTuning,
    /// Chase camera table.
    pub camera: CameraTuning,
    /// NPC reaction table.
    pub npc: NpcTuning,
    /// Interaction reach table.
    pub interaction: InteractionTuning,
}

impl TuningSet {
    /// Names accepted by [`TuningSet::preset`].
    pub const PRESETS: &'static [&'static str] = &["standard", "drift"];

    /// Resolve a built-in table by name.
    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "standard" => Ok(Self::default()),
            "drift" => Ok(Self {
                vehicle: VehicleTuning::drift(),
                ..Self::default()
            }),
            _ => Err(Error::UnknownPreset {
                name: name.to_string(),
            }),
        }
    }

    /// Decode a JSON override document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let set: Self = serde_json::from_str(json).map_err(|source| Error::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        set.validate()?;
        Ok(set)
    }

    /// Load and validate a JSON override file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let set: Self = serde_json::from_str(&text).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        set.validate()?;
        tracing::info!(path = %path.display(), "loaded tuning overrides");
        Ok(set)
    }

    /// Reject values the integrators cannot handle.
    pub fn validate(&self) -> Result<()> {
        let v = &self.vehicle;
        positive("vehicle.mass", v.mass)?;
        positive("vehicle.max_speed", v.max_speed)?;
        positive("vehicle.wheelbase", v.wheelbase)?;
        non_negative("vehicle.engine_force", v.engine_force)?;
        non_negative("vehicle.brake_force", v.brake_force)?;
        non_negative("vehicle.reverse_force", v.reverse_force)?;
        positive("vehicle.reverse_speed_ratio", v.reverse_speed_ratio)?;
        non_negative("vehicle.front_grip", v.front_grip)?;
        non_negative("vehicle.rear_grip", v.rear_grip)?;
        unit("vehicle.handbrake_grip", v.handbrake_grip)?;
        non_negative("vehicle.drag_coefficient", v.drag_coefficient)?;
        non_negative("vehicle.rolling_resistance", v.rolling_resistance)?;

        let l = &self.locomotion;
        positive("locomotion.walk_speed", l.walk_speed)?;
        positive("locomotion.jog_speed", l.jog_speed)?;
        positive("locomotion.sprint_speed", l.sprint_speed)?;
        non_negative("locomotion.acceleration", l.acceleration)?;
        non_negative("locomotion.deceleration", l.deceleration)?;
        non_negative("locomotion.gravity", l.gravity)?;
        positive("locomotion.terminal_velocity", l.terminal_velocity)?;
        if l.indoor_bounds.min.cmpgt(l.indoor_bounds.max).any() {
            return Err(Error::InvalidTuning {
                field: "locomotion.indoor_bounds",
                detail: "min corner exceeds max corner".to_string(),
            });
        }

        let c = &self.camera;
        positive("camera.follow_smoothing", c.follow_smoothing)?;
        positive("camera.look_smoothing", c.look_smoothing)?;
        unit("camera.position_damping", c.position_damping)?;
        unit("camera.look_damping", c.look_damping)?;
        non_negative("camera.collision_margin", c.collision_margin)?;

        let n = &self.npc;
        if !(n.idle_distance > n.watch_distance && n.watch_distance > n.greet_distance) {
            return Err(Error::InvalidTuning {
                field: "npc.idle_distance",
                detail: "thresholds must satisfy idle > watch > greet".to_string(),
            });
        }
        unit("npc.offset_decay", n.offset_decay)?;
        unit("npc.surprise_decay", n.surprise_decay)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTuning {
            field,
            detail: format!("expected a positive number, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTuning {
            field,
            detail: format!("expected a non-negative number, got {value}"),
        })
    }
}

fn unit(field: &'static str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidTuning {
            field,
            detail: format!("expected a value in [0, 1], got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_resolve_and_validate() {
        for name in TuningSet::PRESETS {
            let set = TuningSet::preset(name).expect("preset should exist");
            set.validate().expect("preset should be valid");
        }
        assert!(matches!(
            TuningSet::preset("rally"),
            Err(Error::UnknownPreset { .. })
        ));
    }

    #[test]
    fn test_drift_preset_loosens_rear() {
        let standard = TuningSet::preset("standard").unwrap();
        let drift = TuningSet::preset("drift").unwrap();
        assert!(drift.vehicle.rear_grip < standard.vehicle.rear_grip);
        assert_eq!(drift.locomotion, standard.locomotion);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let set = TuningSet::from_json_str(r#"{ "vehicle": { "max_speed": 60.0 } }"#).unwrap();
        assert!((set.vehicle.max_speed - 60.0).abs() < 1e-6);
        assert!((set.vehicle.engine_force - 4500.0).abs() < 1e-6);
        assert_eq!(set.camera, CameraTuning::default());
    }

    #[test]
    fn test_negative_grip_rejected() {
        let err = TuningSet::from_json_str(r#"{ "vehicle": { "rear_grip": -0.5 } }"#).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTuning {
                field: "vehicle.rear_grip",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = TuningSet::from_json_str("{ vehicle: ").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = TuningSet::load("definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_indoor_bounds_clamp() {
        let bounds = LocomotionTuning::default().indoor_bounds;
        assert_eq!(bounds.clamp(480.0, 520.0), (492.0, 509.0));
        assert_eq!(bounds.clamp(500.0, 500.0), (500.0, 500.0));
    }
}
