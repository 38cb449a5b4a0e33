//! Core vehicle dynamics.
//!
//! A planar single-body model: engine/brake force along the heading, rear
//! tire friction against lateral slip, quadratic drag and rolling resistance.
//! Weight transfer shifts grip between axles and a low rear grip lets the
//! tail step out into a drift.
//!
//! Pure functions over [`VehicleState`] so the tuner and tests can step the
//! model without a running session.

use glam::Vec3;

use super::state::VehicleState;
use crate::{
    config::VehicleTuning,
    context::{Mode, SimContext},
    input::{ControlInput, DriveIntent},
    math::{approach, heading_basis, per_tick_decay, sign, wrap_angle},
    terrain::GroundSampler,
};

/// Standard gravity used for rolling resistance (m/s²).
const GRAVITY: f32 = 9.8;
/// Throttle smoothing rate (1/s).
const THROTTLE_RATE: f32 = 8.0;
/// Steer input smoothing rate (1/s).
const STEER_INPUT_RATE: f32 = 10.0;
/// Forward speed above which negative throttle brakes instead of reversing.
const BRAKE_SPEED_THRESHOLD: f32 = 0.5;
/// Steering tightens by `1 / (1 + k * speed)`.
const STEER_SPEED_FALLOFF: f32 = 0.08;
/// Slip angle past which the car counts as drifting (radians).
const DRIFT_ANGLE_THRESHOLD: f32 = 0.15;
/// Lateral speed that marks a handbrake slide (m/s).
const HANDBRAKE_SLIDE_SPEED: f32 = 2.0;
/// Below this speed the slip angle is meaningless.
const DRIFT_MIN_SPEED: f32 = 1.0;
/// Below this speed yaw rate just decays.
const YAW_MIN_SPEED: f32 = 0.5;
/// Guards the turn radius against a zero steer angle.
const STEER_EPSILON: f32 = 0.001;

/// Tire grip after load transfer and handbrake.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GripState {
    pub front: f32,
    pub rear: f32,
}

/// Output of a drive step, for telemetry and diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VehicleStepOutput {
    /// Longitudinal force applied this step (N).
    pub engine_force: f32,
    /// Grip used this step.
    pub grip: GripState,
    /// Linear acceleration integrated this step.
    pub acceleration: Vec3,
    /// Negative throttle was braking rather than reversing.
    pub braking: bool,
}

/// Step the occupied vehicle. Returns `None` when vehicle dynamics is not the
/// active controller (car unoccupied or not in driving mode).
pub fn update(
    ctx: &SimContext,
    state: &mut VehicleState,
    input: &ControlInput,
    ground: Option<&dyn GroundSampler>,
) -> Option<VehicleStepOutput> {
    if !state.occupied || ctx.mode() != Mode::Driving {
        return None;
    }
    Some(compute_drive_step(
        &ctx.tuning.vehicle,
        state,
        &input.drive_intent(),
        ground,
        ctx.dt(),
    ))
}

/// Longitudinal force for a throttle value.
///
/// Positive throttle tapers to zero at max speed. Negative throttle brakes
/// while rolling forward and otherwise reverses with its own taper.
pub fn engine_force(params: &VehicleTuning, throttle: f32, forward_speed: f32, boost: bool) -> f32 {
    let max_speed = if boost {
        params.max_speed * params.boost_multiplier
    } else {
        params.max_speed
    };

    if throttle > 0.0 {
        let taper = 1.0 - (forward_speed.abs() / max_speed).powi(2);
        params.engine_force * throttle * taper.max(0.0)
    } else if throttle < 0.0 {
        if forward_speed > BRAKE_SPEED_THRESHOLD {
            -params.brake_force * throttle.abs()
        } else {
            let reverse_max = max_speed * params.reverse_speed_ratio;
            let taper = 1.0 - (forward_speed.abs() / reverse_max).powi(2);
            -params.reverse_force * throttle.abs() * taper.max(0.0)
        }
    } else {
        0.0
    }
}

/// Front/rear grip after weight transfer, braking shift and handbrake.
pub fn effective_grip(
    params: &VehicleTuning,
    throttle: f32,
    forward_speed: f32,
    handbrake: bool,
) -> GripState {
    let mut front = params.front_grip;
    let mut rear = params.rear_grip;

    // Acceleration loads the rear axle, braking loads the front.
    let transfer = (throttle.clamp(-1.0, 1.0) * 0.5).clamp(-0.8, 0.8);
    front *= 1.0 - transfer * 0.5;
    rear *= 1.0 + transfer * 0.5;

    if throttle < 0.0 && forward_speed > BRAKE_SPEED_THRESHOLD {
        let shift = throttle.abs() * 0.6;
        front *= 1.0 + shift;
        rear *= 1.0 - shift * 0.4;
    }

    if handbrake {
        rear *= params.handbrake_grip;
    }

    GripState {
        front: front.max(0.0),
        rear: rear.max(0.0),
    }
}

/// Straight-line speed where tapered engine force balances drag and rolling
/// resistance at full throttle.
pub fn theoretical_top_speed(params: &VehicleTuning, boost: bool) -> f32 {
    let max_speed = if boost {
        params.max_speed * params.boost_multiplier
    } else {
        params.max_speed
    };
    let rolling = params.rolling_resistance * params.mass * GRAVITY;
    let net = params.engine_force - rolling;
    if net <= 0.0 {
        return 0.0;
    }
    let stiffness = params.engine_force / (max_speed * max_speed) + params.drag_coefficient;
    (net / stiffness).sqrt()
}

/// Advance one vehicle by `dt`.
pub fn compute_drive_step(
    params: &VehicleTuning,
    state: &mut VehicleState,
    intent: &DriveIntent,
    ground: Option<&dyn GroundSampler>,
    dt: f32,
) -> VehicleStepOutput {
    // Smooth controls toward their discrete targets.
    state.throttle = approach(state.throttle, intent.throttle, THROTTLE_RATE, dt);
    state.steer_input = approach(state.steer_input, intent.steer, STEER_INPUT_RATE, dt);
    state.handbrake = intent.handbrake;

    // Local velocity.
    state.refresh_derived();
    let (forward, right) = heading_basis(state.heading);
    let forward_speed = state.forward_speed();
    let lateral_speed = state.lateral_speed();
    let speed = state.speed();

    // Engine and brakes.
    let braking = state.throttle < 0.0 && forward_speed > BRAKE_SPEED_THRESHOLD;
    let engine = engine_force(params, state.throttle, forward_speed, intent.boost);
    state.brake = if braking { state.throttle.abs() } else { 0.0 };

    // Steering tightens at low speed.
    let target_angle =
        state.steer_input * params.max_steering_angle / (1.0 + speed * STEER_SPEED_FALLOFF);
    let steer_rate = if intent.steer == 0.0 {
        params.steering_return_speed
    } else {
        params.steering_speed
    };
    state.steer_angle = approach(state.steer_angle, target_angle, steer_rate, dt);

    // Grip and slip.
    let grip = effective_grip(params, state.throttle, forward_speed, state.handbrake);
    let handbrake_slide = state.handbrake && lateral_speed.abs() > HANDBRAKE_SLIDE_SPEED;

    if speed > DRIFT_MIN_SPEED {
        state.drift_angle = lateral_speed.atan2(forward_speed.abs());
        state.is_drifting = state.drift_angle.abs() > DRIFT_ANGLE_THRESHOLD || handbrake_slide;
        let target = if state.is_drifting { 1.0 } else { 0.0 };
        state.drift_factor = approach(state.drift_factor, target, 5.0, dt);
    } else {
        state.drift_angle = 0.0;
        state.is_drifting = handbrake_slide;
        state.drift_factor *= per_tick_decay(0.95, dt);
    }

    // Yaw rate from an Ackermann-like turn radius plus rear slide.
    if speed > YAW_MIN_SPEED {
        let turn_radius = params.wheelbase / (state.steer_angle.abs() + STEER_EPSILON).tan();
        let ideal = forward_speed / turn_radius * sign(state.steer_angle);
        let slide = -lateral_speed * 0.15 * (1.0 - grip.rear);
        let target = ideal * grip.front.min(grip.rear) + slide;
        state.angular_velocity = approach(state.angular_velocity, target, 8.0, dt);
    } else {
        state.angular_velocity *= per_tick_decay(0.9, dt);
    }

    // Forces.
    let mut acceleration = forward * (engine / params.mass);
    acceleration += right * (-lateral_speed * grip.rear * params.drift_factor * 8.0);
    let drag = -params.drag_coefficient * speed * speed * sign(forward_speed);
    let rolling = -params.rolling_resistance * params.mass * GRAVITY * sign(forward_speed);
    acceleration += forward * ((drag + rolling) / params.mass);

    // Integrate.
    state.velocity += acceleration * dt;
    state.heading = wrap_angle(state.heading + state.angular_velocity * dt);
    state.position += state.velocity * dt;
    if let Some(ground) = ground {
        state.sync_to_ground(ground, params.ride_height);
    }

    // Cosmetics use the pre-integration speeds.
    let throttle = state.throttle;
    let angular_velocity = state.angular_velocity;
    let steer_angle = state.steer_angle;
    state.visuals.update(
        params,
        throttle,
        forward_speed,
        speed,
        angular_velocity,
        steer_angle,
        dt,
    );
    state.rig.apply(&state.visuals);

    state.refresh_derived();

    tracing::trace!(
        speed = state.speed(),
        forward_speed = state.forward_speed(),
        drift = state.drift_angle,
        "vehicle step"
    );

    VehicleStepOutput {
        engine_force: engine,
        grip,
        acceleration,
        braking,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::terrain::FlatGround;

    const DT: f32 = 1.0 / 60.0;

    fn full_throttle() -> DriveIntent {
        DriveIntent {
            throttle: 1.0,
            ..DriveIntent::default()
        }
    }

    #[test]
    fn test_drift_detection_from_slip() {
        let params = VehicleTuning::default();
        let mut car = VehicleState::new(Vec3::ZERO, 0.0);
        car.velocity = Vec3::new(3.0, 0.0, 10.0);

        compute_drive_step(&params, &mut car, &DriveIntent::default(), None, DT);

        assert!((car.drift_angle - 3.0f32.atan2(10.0)).abs() < 1e-5);
        assert!((car.drift_angle - 0.2915).abs() < 1e-3);
        assert!(car.is_drifting);
        assert!(car.drift_factor > 0.0);
    }

    #[test]
    fn test_full_throttle_approaches_but_never_exceeds_max_speed() {
        let params = VehicleTuning::default();
        let mut car = VehicleState::new(Vec3::ZERO, 0.0);
        let mut previous = 0.0;

        for _ in 0..(60 * 90) {
            compute_drive_step(&params, &mut car, &full_throttle(), None, DT);
            assert!(car.forward_speed() >= previous - 1e-4);
            assert!(car.forward_speed() < params.max_speed);
            previous = car.forward_speed();
        }

        let top = theoretical_top_speed(&params, false);
        assert!((car.forward_speed() - top).abs() / top < 0.01);
    }

    #[test]
    fn test_theoretical_top_speed_default() {
        let top = theoretical_top_speed(&VehicleTuning::default(), false);
        assert!((top - 40.79).abs() < 0.05);
        assert!(theoretical_top_speed(&VehicleTuning::default(), true) > top);
    }

    #[test]
    fn test_braking_from_speed() {
        let params = VehicleTuning::default();
        let mut car = VehicleState::new(Vec3::ZERO, 0.0);
        car.velocity = Vec3::new(0.0, 0.0, 20.0);
        let brake = DriveIntent {
            throttle: -1.0,
            ..DriveIntent::default()
        };

        let out = compute_drive_step(&params, &mut car, &brake, None, DT);
        assert!(out.braking);
        assert!(out.engine_force < 0.0);
        assert!(car.brake > 0.0);

        for _ in 0..(60 * 5) {
            compute_drive_step(&params, &mut car, &brake, None, DT);
        }
        // Stopped and rolling backward under reverse force.
        assert!(car.forward_speed() < 0.5);
    }

    #[test]
    fn test_steering_left_increases_heading() {
        let params = VehicleTuning::default();
        let mut car = VehicleState::new(Vec3::ZERO, 0.0);
        car.velocity = Vec3::new(0.0, 0.0, 15.0);
        let intent = DriveIntent {
            throttle: 1.0,
            steer: 1.0,
            ..DriveIntent::default()
        };
        for _ in 0..60 {
            compute_drive_step(&params, &mut car, &intent, None, DT);
        }
        assert!(car.heading > 0.1);
        assert!(car.angular_velocity > 0.0);
    }

    #[test]
    fn test_no_steer_no_yaw() {
        let params = VehicleTuning::default();
        let mut car = VehicleState::new(Vec3::ZERO, 0.0);
        for _ in 0..300 {
            compute_drive_step(&params, &mut car, &full_throttle(), None, DT);
        }
        assert_eq!(car.heading, 0.0);
        assert_eq!(car.velocity.x, 0.0);
    }

    #[test]
    fn test_handbrake_forces_drift_flag_on_slide() {
        let params = VehicleTuning::default();
        let mut car = VehicleState::new(Vec3::ZERO, 0.0);
        // Fast enough that the slip angle alone stays under the threshold.
        car.velocity = Vec3::new(2.5, 0.0, 30.0);
        let intent = DriveIntent {
            handbrake: true,
            ..DriveIntent::default()
        };
        compute_drive_step(&params, &mut car, &intent, None, DT);
        assert!(car.drift_angle.abs() < DRIFT_ANGLE_THRESHOLD);
        assert!(car.is_drifting);
    }

    #[test]
    fn test_ground_snap() {
        let params = VehicleTuning::default();
        let mut car = VehicleState::new(Vec3::new(0.0, 7.0, 0.0), 0.0);
        let ground = FlatGround { height: 2.0 };
        compute_drive_step(&params, &mut car, &full_throttle(), Some(&ground), DT);
        assert!((car.position.y - 2.35).abs() < 1e-6);
    }

    #[test]
    fn test_update_requires_occupied_and_driving() {
        let mut ctx = SimContext::default();
        ctx.begin_tick(DT);
        let mut car = VehicleState::new(Vec3::ZERO, 0.0);
        let input = ControlInput::with_move(glam::Vec2::new(0.0, -1.0));

        assert!(update(&ctx, &mut car, &input, None).is_none());
        car.occupied = true;
        assert!(update(&ctx, &mut car, &input, None).is_none());

        ctx.set_mode(Mode::Driving);
        assert!(update(&ctx, &mut car, &input, None).is_some());
        assert!(car.throttle > 0.0);
    }

    #[test]
    fn test_reverse_taper() {
        let params = VehicleTuning::default();
        let reverse_max = params.max_speed * params.reverse_speed_ratio;
        assert!(engine_force(&params, -1.0, 0.0, false) < 0.0);
        assert_eq!(engine_force(&params, -1.0, -reverse_max, false), 0.0);
        assert_eq!(engine_force(&params, 0.0, 10.0, false), 0.0);
    }

    proptest! {
        #[test]
        fn prop_speed_matches_velocity_every_tick(
            heading in -3.2f32..3.2,
            intents in prop::collection::vec(
                (-1.0f32..=1.0, -1.0f32..=1.0, any::<bool>(), any::<bool>()),
                1..40,
            ),
        ) {
            let params = VehicleTuning::default();
            let mut car = VehicleState::new(Vec3::ZERO, heading);
            for (throttle, steer, handbrake, boost) in intents {
                let intent = DriveIntent { throttle, steer, handbrake, boost };
                // Hold each intent for a quarter second.
                for _ in 0..15 {
                    compute_drive_step(&params, &mut car, &intent, None, DT);
                    prop_assert_eq!(car.speed(), car.velocity.length());
                }
            }
        }

        #[test]
        fn prop_grip_stays_bounded(
            front in 0.0f32..2.0,
            rear in 0.0f32..2.0,
            throttle in -1.0f32..=1.0,
            forward_speed in -60.0f32..60.0,
            handbrake in any::<bool>(),
        ) {
            let params = VehicleTuning {
                front_grip: front,
                rear_grip: rear,
                ..VehicleTuning::default()
            };
            let grip = effective_grip(&params, throttle, forward_speed, handbrake);
            prop_assert!(grip.front >= 0.0 && grip.rear >= 0.0);
            prop_assert!(grip.front <= front * 2.0 + 1e-5);
            prop_assert!(grip.rear <= rear * 1.25 + 1e-5);
        }
    }
}
