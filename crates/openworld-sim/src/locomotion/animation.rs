use glam::Vec3;

use crate::{
    config::LocomotionTuning,
    math::{approach, lerp, per_tick_decay},
    pose::{PartId, PartTransform, Pose},
};

/// Speed above which the walk cycle runs.
const CYCLE_MIN_SPEED: f32 = 0.3;
const BODY_HEIGHT: f32 = 0.9;
const HEAD_HEIGHT: f32 = 1.75;

/// Phase accumulators and smoothed weights for the procedural gait.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimationState {
    /// Gait phase (radians, unbounded).
    pub walk_cycle: f32,
    /// Smoothed limb swing amplitude.
    pub stride_length: f32,
    /// Moving weight in `[0, 1]`, reaching 1 at jog speed.
    pub blend: f32,
    /// Forward body lean (radians).
    pub lean: f32,
    /// Idle breathing phase.
    pub breathe_phase: f32,
}

/// Pivots of the player's body.
#[derive(Clone, Debug)]
pub struct HumanoidRig {
    pub pose: Pose,
    pub body: PartId,
    pub head: PartId,
    pub left_arm: PartId,
    pub right_arm: PartId,
    pub left_leg: PartId,
    pub right_leg: PartId,
}

impl HumanoidRig {
    pub fn new() -> Self {
        let mut pose = Pose::new();
        let at = |x, y| PartTransform::at(Vec3::new(x, y, 0.0));
        let body = pose.add("body", None, at(0.0, BODY_HEIGHT));
        let head = pose.add("head", None, at(0.0, HEAD_HEIGHT));
        let left_arm = pose.add("left_arm", None, at(-0.5, 1.25));
        let right_arm = pose.add("right_arm", None, at(0.5, 1.25));
        let left_leg = pose.add("left_leg", None, at(-0.18, 0.4));
        let right_leg = pose.add("right_leg", None, at(0.18, 0.4));
        Self {
            pose,
            body,
            head,
            left_arm,
            right_arm,
            left_leg,
            right_leg,
        }
    }

    fn limbs(&self) -> [PartId; 4] {
        [self.left_arm, self.right_arm, self.left_leg, self.right_leg]
    }
}

impl Default for HumanoidRig {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationState {
    /// Advance the gait and write limb transforms into the rig.
    pub fn update(
        &mut self,
        rig: &mut HumanoidRig,
        params: &LocomotionTuning,
        speed: f32,
        turn_lean: f32,
        dt: f32,
    ) {
        self.blend = approach(self.blend, (speed / params.jog_speed).min(1.0), 8.0, dt);

        if speed > CYCLE_MIN_SPEED {
            self.animate_moving(rig, params, speed, turn_lean, dt);
        } else {
            self.animate_idle(rig, turn_lean, dt);
        }
    }

    fn animate_moving(
        &mut self,
        rig: &mut HumanoidRig,
        params: &LocomotionTuning,
        speed: f32,
        turn_lean: f32,
        dt: f32,
    ) {
        self.walk_cycle += dt * (8.0 + speed * 1.2);

        let target_stride = if speed > params.sprint_speed * 0.8 {
            0.7
        } else if speed > params.jog_speed * 0.8 {
            0.5
        } else {
            0.35
        };
        self.stride_length = approach(self.stride_length, target_stride, 6.0, dt);

        let cycle = self.walk_cycle;
        let leg_swing = cycle.sin() * self.stride_length;
        let arm_swing = (cycle + 0.1).sin() * self.stride_length * 0.6;
        let pose = &mut rig.pose;

        // Legs in anti-phase, each arm opposite its leg.
        pose.local_mut(rig.left_leg).rotation.x = leg_swing;
        pose.local_mut(rig.right_leg).rotation.x = -leg_swing;
        pose.local_mut(rig.left_arm).rotation.x = -arm_swing;
        pose.local_mut(rig.right_arm).rotation.x = arm_swing;

        if speed > params.jog_speed {
            let side = (cycle * 2.0).sin() * 0.1;
            pose.local_mut(rig.left_arm).rotation.z = -0.2 + side;
            pose.local_mut(rig.right_arm).rotation.z = 0.2 - side;
        } else {
            for arm in [rig.left_arm, rig.right_arm] {
                let z = &mut pose.local_mut(arm).rotation.z;
                *z = approach(*z, 0.0, 6.0, dt);
            }
        }

        let bob = (cycle * 2.0).sin().abs() * 0.04 * self.blend;
        let sway = cycle.sin() * 0.03 * self.blend;
        let twist = cycle.sin() * 0.08 * self.blend;
        let target_lean = if speed > params.jog_speed { 0.1 } else { 0.05 };
        self.lean = approach(self.lean, target_lean * self.blend, 5.0, dt);

        let body = pose.local_mut(rig.body);
        body.translation.y = BODY_HEIGHT + bob;
        body.rotation = Vec3::new(self.lean, twist, sway + turn_lean);
        body.scale = Vec3::ONE;

        let head = pose.local_mut(rig.head);
        head.translation.y = HEAD_HEIGHT + bob * 0.8;
        head.rotation.x = self.lean * 0.5;
    }

    fn animate_idle(&mut self, rig: &mut HumanoidRig, turn_lean: f32, dt: f32) {
        self.stride_length *= per_tick_decay(0.9, dt);
        self.lean = approach(self.lean, 0.0, 5.0, dt);
        let r = (dt * 6.0).min(1.0);

        for limb in rig.limbs() {
            rig.pose.local_mut(limb).rotation.x *= 1.0 - r;
        }
        for arm in [rig.left_arm, rig.right_arm] {
            let z = &mut rig.pose.local_mut(arm).rotation.z;
            *z = lerp(*z, 0.0, r);
        }

        self.breathe_phase += dt * 1.5;
        let breath = self.breathe_phase.sin() * 0.01;

        let body = rig.pose.local_mut(rig.body);
        body.scale = Vec3::new(1.0 + breath, 1.0, 1.0 + breath * 0.5);
        body.rotation.z = (self.breathe_phase * 0.3).sin() * 0.005 + turn_lean * 0.5;
        body.translation.y = lerp(body.translation.y, BODY_HEIGHT, r);
        body.rotation.x = lerp(body.rotation.x, 0.0, r);
        body.rotation.y *= 1.0 - r;

        let head = rig.pose.local_mut(rig.head);
        head.translation.y = lerp(head.translation.y, HEAD_HEIGHT, r);
        head.rotation.x *= 1.0 - r;
    }
}
