//! Per-tick control snapshot consumed by the simulation.
//!
//! Device binding is someone else's problem. The core only sees the semantic
//! values below, optionally shaped by [`MoveAxisSmoother`] so digital input
//! behaves like an analog stick.

use std::f32::consts::PI;

use glam::Vec2;

/// Largest look pitch magnitude (radians).
pub const MAX_PITCH: f32 = PI / 2.2;

/// Axis magnitude past which a direction counts as pressed for driving.
const DRIVE_AXIS_THRESHOLD: f32 = 0.5;

/// One-shot actions pressed this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActionEdges {
    /// Enter/exit vehicle, visit or leave a house.
    pub interact: bool,
    /// Talk to a nearby friend.
    pub talk: bool,
    /// Jump while on foot.
    pub jump: bool,
}

/// Normalized control values for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlInput {
    /// Ramped movement axis. `x` is right, `y` is backward, so forward is `-y`.
    pub move_direction: Vec2,
    /// `min(1, |move_direction|)`.
    pub move_intensity: f32,
    /// Camera yaw (radians).
    pub yaw: f32,
    /// Camera pitch (radians), within `±MAX_PITCH`.
    pub pitch: f32,
    /// Run modifier. Also boosts vehicles.
    pub running: bool,
    /// Walk modifier.
    pub walking: bool,
    /// Vehicle handbrake.
    pub handbrake: bool,
    /// Edge-triggered actions.
    pub actions: ActionEdges,
}

impl ControlInput {
    /// Build a snapshot from a movement axis, deriving the intensity.
    pub fn with_move(move_direction: Vec2) -> Self {
        Self {
            move_direction,
            move_intensity: move_direction.length().min(1.0),
            ..Self::default()
        }
    }

    /// Set the look angles, clamping pitch.
    #[must_use]
    pub fn looking(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self
    }

    /// Whether the vehicle boost is active.
    pub fn is_boosting(&self) -> bool {
        self.running
    }

    /// Discrete drive targets implied by the movement axis.
    pub fn drive_intent(&self) -> DriveIntent {
        let axis = self.move_direction;
        let mut throttle = 0.0;
        if axis.y < -DRIVE_AXIS_THRESHOLD {
            throttle = 1.0;
        }
        // Reverse wins when both are somehow reported.
        if axis.y > DRIVE_AXIS_THRESHOLD {
            throttle = -1.0;
        }
        let mut steer = 0.0;
        if axis.x < -DRIVE_AXIS_THRESHOLD {
            steer = 1.0;
        }
        if axis.x > DRIVE_AXIS_THRESHOLD {
            steer = -1.0;
        }
        DriveIntent {
            throttle,
            steer,
            handbrake: self.handbrake,
            boost: self.is_boosting(),
        }
    }
}

/// Targets for vehicle control smoothing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DriveIntent {
    /// +1 accelerate, -1 brake/reverse, 0 coast.
    pub throttle: f32,
    /// +1 left, -1 right, 0 center.
    pub steer: f32,
    /// Handbrake held.
    pub handbrake: bool,
    /// Boost held.
    pub boost: bool,
}

/// Digital movement keys held this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirectionKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

/// Ramps digital movement into an analog-style axis.
#[derive(Clone, Debug)]
pub struct MoveAxisSmoother {
    axis: Vec2,
    /// Ramp rate while any direction is held (1/s).
    pub ramp_rate: f32,
    /// Decay rate after release (1/s).
    pub decay_rate: f32,
}

impl Default for MoveAxisSmoother {
    fn default() -> Self {
        Self {
            axis: Vec2::ZERO,
            ramp_rate: 8.0,
            decay_rate: 12.0,
        }
    }
}

impl MoveAxisSmoother {
    /// Advance the ramp and return the current axis.
    pub fn update(&mut self, keys: DirectionKeys, dt: f32) -> Vec2 {
        let mut raw = Vec2::ZERO;
        if keys.forward {
            raw.y = -1.0;
        }
        if keys.back {
            raw.y = 1.0;
        }
        if keys.left {
            raw.x = -1.0;
        }
        if keys.right {
            raw.x = 1.0;
        }
        if raw.length_squared() > 1.0 {
            raw = raw.normalize();
        }

        let rate = if raw == Vec2::ZERO {
            self.decay_rate
        } else {
            self.ramp_rate
        };
        self.axis = self.axis.lerp(raw, (rate * dt).clamp(0.0, 1.0));

        // Kill small values.
        if self.axis.x.abs() < 0.01 {
            self.axis.x = 0.0;
        }
        if self.axis.y.abs() < 0.01 {
            self.axis.y = 0.0;
        }
        self.axis
    }

    /// Current axis without advancing.
    pub fn axis(&self) -> Vec2 {
        self.axis
    }
}
