//! Cosmetic body roll, pitch and wheel spin.
//!
//! None of this feeds back into the dynamics.

use glam::Vec3;

use crate::{
    config::VehicleTuning,
    math::approach,
    pose::{PartId, PartTransform, Pose},
};

/// Wheel spin per meter travelled (rad/m).
const WHEEL_SPIN_PER_METER: f32 = 2.5;
/// Fraction of roll/pitch applied to the body mesh.
const BODY_TILT_SCALE: f32 = 0.3;

/// Smoothed cosmetic motion.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VehicleVisuals {
    /// Body roll (radians).
    pub body_roll: f32,
    /// Body pitch (radians).
    pub body_pitch: f32,
    /// Accumulated wheel spin (radians).
    pub wheel_rotation: f32,
    /// Rendered front wheel yaw (radians).
    pub front_wheel_angle: f32,
}

impl VehicleVisuals {
    /// Advance from the current driving state.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        params: &VehicleTuning,
        throttle: f32,
        forward_speed: f32,
        speed: f32,
        angular_velocity: f32,
        steer_angle: f32,
        dt: f32,
    ) {
        let target_roll = -angular_velocity * speed * params.body_roll;
        self.body_roll = approach(self.body_roll, target_roll, 10.0, dt);

        let target_pitch = if throttle > 0.0 {
            -params.pitch_on_accel * throttle
        } else if throttle < 0.0 && forward_speed > 0.0 {
            params.pitch_on_brake * throttle.abs()
        } else {
            0.0
        };
        self.body_pitch = approach(self.body_pitch, target_pitch, 8.0, dt);

        self.wheel_rotation += forward_speed * dt * WHEEL_SPIN_PER_METER;
        self.front_wheel_angle = approach(self.front_wheel_angle, steer_angle, 12.0, dt);
    }
}

/// Body and wheel parts of a car.
#[derive(Clone, Debug)]
pub struct CarRig {
    pub pose: Pose,
    body: PartId,
    front_left: PartId,
    front_right: PartId,
    rear_left: PartId,
    rear_right: PartId,
}

impl CarRig {
    /// Body at the chassis origin and four wheels at the corners.
    pub fn new() -> Self {
        let mut pose = Pose::new();
        let body = pose.add("body", None, PartTransform::default());
        let wheel = |x: f32, z: f32| PartTransform::at(Vec3::new(x, 0.35, z));
        let front_left = pose.add("wheel_front_left", None, wheel(-1.0, 1.15));
        let front_right = pose.add("wheel_front_right", None, wheel(1.0, 1.15));
        let rear_left = pose.add("wheel_rear_left", None, wheel(-1.0, -1.15));
        let rear_right = pose.add("wheel_rear_right", None, wheel(1.0, -1.15));
        Self {
            pose,
            body,
            front_left,
            front_right,
            rear_left,
            rear_right,
        }
    }

    /// Write the cosmetic state into the part transforms.
    pub fn apply(&mut self, visuals: &VehicleVisuals) {
        self.pose.local_mut(self.body).rotation = Vec3::new(
            visuals.body_pitch * BODY_TILT_SCALE,
            0.0,
            visuals.body_roll * BODY_TILT_SCALE,
        );
        for wheel in [self.rear_left, self.rear_right] {
            self.pose.local_mut(wheel).rotation = Vec3::new(visuals.wheel_rotation, 0.0, 0.0);
        }
        for wheel in [self.front_left, self.front_right] {
            self.pose.local_mut(wheel).rotation =
                Vec3::new(visuals.wheel_rotation, visuals.front_wheel_angle, 0.0);
        }
    }

    /// Body part.
    pub fn body(&self) -> PartId {
        self.body
    }

    /// Front wheels, left then right.
    pub fn front_wheels(&self) -> [PartId; 2] {
        [self.front_left, self.front_right]
    }
}

impl Default for CarRig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_accelerating_pitches_nose_up() {
        let params = VehicleTuning::default();
        let mut visuals = VehicleVisuals::default();
        for _ in 0..120 {
            visuals.update(&params, 1.0, 10.0, 10.0, 0.0, 0.0, DT);
        }
        assert!((visuals.body_pitch + params.pitch_on_accel).abs() < 1e-3);
        assert!((visuals.wheel_rotation - 10.0 * 2.0 * 2.5).abs() < 1e-2);
    }

    #[test]
    fn test_turning_rolls_body() {
        let params = VehicleTuning::default();
        let mut visuals = VehicleVisuals::default();
        for _ in 0..60 {
            visuals.update(&params, 0.0, 10.0, 10.0, 0.5, 0.3, DT);
        }
        assert!(visuals.body_roll < 0.0);
        assert!((visuals.front_wheel_angle - 0.3).abs() < 1e-3);
    }

    #[test]
    fn test_rig_steers_front_wheels_only() {
        let mut rig = CarRig::new();
        let visuals = VehicleVisuals {
            front_wheel_angle: 0.4,
            wheel_rotation: 1.0,
            ..VehicleVisuals::default()
        };
        rig.apply(&visuals);
        for wheel in rig.front_wheels() {
            assert_eq!(rig.pose.local(wheel).rotation.y, 0.4);
        }
        let rear = rig.pose.find("wheel_rear_left").unwrap();
        assert_eq!(rig.pose.local(rear).rotation, Vec3::new(1.0, 0.0, 0.0));
    }
}
