use glam::{Quat, Vec3};

use super::visuals::{CarRig, VehicleVisuals};
use crate::{math::heading_basis, terrain::GroundSampler};

/// Index of a vehicle in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VehicleId(pub usize);

/// Mutable state of one car.
///
/// `speed`, `forward_speed` and `lateral_speed` are derived from the velocity
/// and heading and are only recomputed by [`VehicleState::refresh_derived`].
#[derive(Clone, Debug)]
pub struct VehicleState {
    /// Chassis origin in world space.
    pub position: Vec3,
    /// Linear velocity (m/s).
    pub velocity: Vec3,
    /// Yaw (radians). Heading 0 faces +Z.
    pub heading: f32,
    /// Yaw rate (rad/s).
    pub angular_velocity: f32,
    /// Smoothed throttle in `[-1, 1]`.
    pub throttle: f32,
    /// Brake amount in `[0, 1]` while slowing from forward motion.
    pub brake: f32,
    /// Smoothed steer input in `[-1, 1]`, positive left.
    pub steer_input: f32,
    /// Smoothed front wheel angle (radians).
    pub steer_angle: f32,
    /// Handbrake held this tick.
    pub handbrake: bool,
    /// Someone is driving.
    pub occupied: bool,
    /// Slip angle between heading and velocity (radians).
    pub drift_angle: f32,
    /// Smoothed drift weight in `[0, 1]`.
    pub drift_factor: f32,
    /// Sliding past the slip threshold.
    pub is_drifting: bool,
    /// Cosmetic body and wheel motion.
    pub visuals: VehicleVisuals,
    /// Body and wheel transforms for the renderer.
    pub rig: CarRig,
    speed: f32,
    forward_speed: f32,
    lateral_speed: f32,
}

impl VehicleState {
    /// A parked car at rest.
    pub fn new(position: Vec3, heading: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            heading,
            angular_velocity: 0.0,
            throttle: 0.0,
            brake: 0.0,
            steer_input: 0.0,
            steer_angle: 0.0,
            handbrake: false,
            occupied: false,
            drift_angle: 0.0,
            drift_factor: 0.0,
            is_drifting: false,
            visuals: VehicleVisuals::default(),
            rig: CarRig::new(),
            speed: 0.0,
            forward_speed: 0.0,
            lateral_speed: 0.0,
        }
    }

    /// Unit forward vector from the heading.
    pub fn forward(&self) -> Vec3 {
        heading_basis(self.heading).0
    }

    /// Unit right vector from the heading.
    pub fn right(&self) -> Vec3 {
        heading_basis(self.heading).1
    }

    /// Recompute speed and the forward/lateral projections.
    pub fn refresh_derived(&mut self) {
        let (forward, right) = heading_basis(self.heading);
        self.forward_speed = self.velocity.dot(forward);
        self.lateral_speed = self.velocity.dot(right);
        self.speed = self.velocity.length();
    }

    /// `|velocity|` as of the last refresh.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Signed velocity along the heading.
    pub fn forward_speed(&self) -> f32 {
        self.forward_speed
    }

    /// Signed velocity along the right vector.
    pub fn lateral_speed(&self) -> f32 {
        self.lateral_speed
    }

    /// Speed in km/h for the HUD.
    pub fn speed_kmh(&self) -> f32 {
        self.speed * 3.6
    }

    /// How much the car is sliding, in `[0, 1]`.
    pub fn drift_amount(&self) -> f32 {
        (self.drift_angle.abs() * 2.0).min(1.0) * (self.speed / 20.0).min(1.0)
    }

    /// Where the driver steps out: `offset` to the side, rotated by heading.
    pub fn exit_position(&self, offset: f32) -> Vec3 {
        self.position + Quat::from_rotation_y(self.heading) * Vec3::new(offset, 0.0, 0.0)
    }

    /// Neutral controls, as when a driver gets in.
    pub fn reset_controls(&mut self) {
        self.throttle = 0.0;
        self.brake = 0.0;
        self.steer_input = 0.0;
        self.steer_angle = 0.0;
        self.handbrake = false;
    }

    /// Snap the chassis onto the ground.
    pub fn sync_to_ground(&mut self, ground: &dyn GroundSampler, ride_height: f32) {
        self.position.y = ground.height_at(self.position.x, self.position.z) + ride_height;
    }
}
