//! Momentum-based on-foot movement.
//!
//! Speed ramps toward a tier target, direction blends toward the
//! camera-relative input direction, and the body turns through an
//! angular-velocity spring rather than snapping.

use glam::{Vec2, Vec3};

use super::animation::{AnimationState, HumanoidRig};
use crate::{
    config::LocomotionTuning,
    context::{Mode, SimContext},
    input::ControlInput,
    math::{approach, horizontal_length, shortest_angle, wrap_angle},
};

/// Input magnitude below which the stick counts as released.
const INPUT_DEADZONE: f32 = 0.1;
/// Speed above which a released stick reports `Stopping`.
const STOPPING_SPEED: f32 = 0.5;
/// Speed above which the player counts as moving.
const MOVING_SPEED: f32 = 0.1;
/// Direction blend rate (1/s).
const DIRECTION_BLEND_RATE: f32 = 8.0;
/// Turn lean per unit of angular velocity, and its clamp.
const TURN_LEAN_SCALE: f32 = 0.35;

/// Movement tier, derived from input each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MoveState {
    #[default]
    Idle,
    Walking,
    Jogging,
    Sprinting,
    Stopping,
}

impl MoveState {
    /// Derive the tier from the current input and speed.
    pub fn from_input(input: &ControlInput, speed: f32) -> Self {
        if input.move_intensity > INPUT_DEADZONE {
            if input.walking {
                MoveState::Walking
            } else if input.running {
                MoveState::Sprinting
            } else {
                MoveState::Jogging
            }
        } else if speed > STOPPING_SPEED {
            MoveState::Stopping
        } else {
            MoveState::Idle
        }
    }

    /// Speed this tier ramps toward.
    pub fn target_speed(self, params: &LocomotionTuning) -> f32 {
        match self {
            MoveState::Walking => params.walk_speed,
            MoveState::Jogging => params.jog_speed,
            MoveState::Sprinting => params.sprint_speed,
            MoveState::Idle | MoveState::Stopping => 0.0,
        }
    }

    /// Heading spring rate for this tier.
    pub fn turn_speed(self, params: &LocomotionTuning) -> f32 {
        match self {
            MoveState::Idle => params.turn_speed_idle,
            MoveState::Sprinting => params.turn_speed_sprint,
            _ => params.turn_speed_walk,
        }
    }
}

/// The player's on-foot state.
#[derive(Clone, Debug)]
pub struct PlayerState {
    /// Feet position.
    pub position: Vec3,
    /// Horizontal velocity. `y` is always zero; see `vertical_velocity`.
    pub velocity: Vec3,
    /// Facing (radians).
    pub heading: f32,
    /// Facing the heading spring is chasing.
    pub target_heading: f32,
    /// Heading spring velocity (radians per tick).
    pub angular_velocity: f32,
    pub move_state: MoveState,
    pub grounded: bool,
    pub vertical_velocity: f32,
    /// Smoothed roll into turns.
    pub turn_lean: f32,
    /// Hidden while inside a vehicle.
    pub visible: bool,
    pub animation: AnimationState,
    pub rig: HumanoidRig,
}

impl PlayerState {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            heading: 0.0,
            target_heading: 0.0,
            angular_velocity: 0.0,
            move_state: MoveState::Idle,
            grounded: true,
            vertical_velocity: 0.0,
            turn_lean: 0.0,
            visible: true,
            animation: AnimationState::default(),
            rig: HumanoidRig::new(),
        }
    }

    /// Horizontal speed, `|velocity.xz|`.
    pub fn speed(&self) -> f32 {
        horizontal_length(self.velocity)
    }

    pub fn is_moving(&self) -> bool {
        self.speed() > MOVING_SPEED
    }

    /// Jump if standing on the ground. Returns whether the jump happened.
    pub fn jump(&mut self, params: &LocomotionTuning) -> bool {
        if !self.grounded {
            return false;
        }
        self.vertical_velocity = params.jump_force;
        self.grounded = false;
        true
    }

    /// Move instantly, dropping all momentum.
    pub fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
        self.vertical_velocity = 0.0;
        self.angular_velocity = 0.0;
    }
}

/// Camera forward and right on the ground plane for a look yaw.
fn camera_basis(yaw: f32) -> (Vec3, Vec3) {
    let (sin, cos) = yaw.sin_cos();
    (Vec3::new(-sin, 0.0, -cos), Vec3::new(cos, 0.0, -sin))
}

/// Step the player. Returns `false` without touching state when the player
/// is not on foot.
pub fn update(
    ctx: &SimContext,
    player: &mut PlayerState,
    input: &ControlInput,
    ground_height: f32,
) -> bool {
    if !ctx.mode().is_on_foot() {
        return false;
    }
    let params = &ctx.tuning.locomotion;
    let dt = ctx.dt();

    update_horizontal(player, params, input, dt);
    update_heading(player, params, dt);
    update_vertical(player, params, ground_height, dt);

    let speed = player.speed();
    let turn_lean = player.turn_lean;
    player
        .animation
        .update(&mut player.rig, params, speed, turn_lean, dt);

    if ctx.mode() == Mode::Indoor {
        let (x, z) = params.indoor_bounds.clamp(player.position.x, player.position.z);
        player.position.x = x;
        player.position.z = z;
    }

    tracing::trace!(
        speed,
        state = ?player.move_state,
        grounded = player.grounded,
        "player step"
    );
    true
}

fn update_horizontal(
    player: &mut PlayerState,
    params: &LocomotionTuning,
    input: &ControlInput,
    dt: f32,
) {
    let axis = input.move_direction;
    let intensity = input.move_intensity;
    let has_input = intensity > INPUT_DEADZONE;
    let forward_only = has_input && axis.y < -0.2 && axis.x.abs() < 0.15;

    let speed = player.speed();
    player.move_state = MoveState::from_input(input, speed);
    let target_speed = player.move_state.target_speed(params);

    let (cam_forward, cam_right) = camera_basis(input.yaw);
    let target_dir = if forward_only {
        cam_forward
    } else {
        let raw = cam_forward * -axis.y + cam_right * axis.x;
        if raw.length_squared() > 1e-4 {
            raw.normalize()
        } else {
            cam_forward
        }
    };
    let current_dir = if speed > MOVING_SPEED {
        Vec3::new(player.velocity.x, 0.0, player.velocity.z) / speed
    } else {
        target_dir
    };

    if has_input {
        let t = (DIRECTION_BLEND_RATE * dt).min(1.0);
        let blended = current_dir.lerp(target_dir, t).try_normalize().unwrap_or(target_dir);

        let new_speed = if speed < target_speed {
            (speed + params.acceleration * intensity * dt).min(target_speed)
        } else {
            (speed - params.deceleration * 0.5 * dt).max(target_speed)
        };
        player.velocity = blended * new_speed;

        let facing = Vec2::new(target_dir.x, target_dir.z);
        player.target_heading = facing.x.atan2(facing.y);
    } else {
        let new_speed = (speed - params.deceleration * dt).max(0.0);
        player.velocity = if new_speed > 0.01 {
            current_dir * new_speed
        } else {
            Vec3::ZERO
        };
    }
}

fn update_heading(player: &mut PlayerState, params: &LocomotionTuning, dt: f32) {
    let diff = shortest_angle(player.heading, player.target_heading);
    let turn_speed = player.move_state.turn_speed(params);

    player.angular_velocity += diff * turn_speed * dt;
    player.angular_velocity *= (-params.turn_damping * dt).exp();
    player.heading = wrap_angle(player.heading + player.angular_velocity);

    let target_lean =
        (player.angular_velocity * TURN_LEAN_SCALE).clamp(-TURN_LEAN_SCALE, TURN_LEAN_SCALE);
    player.turn_lean = approach(player.turn_lean, target_lean, 8.0, dt);
}

fn update_vertical(player: &mut PlayerState, params: &LocomotionTuning, ground: f32, dt: f32) {
    player.position.x += player.velocity.x * dt;
    player.position.z += player.velocity.z * dt;

    // Walking off a ledge taller than the snap distance goes airborne.
    if player.grounded && player.position.y > ground + params.ground_snap {
        player.grounded = false;
    }

    if !player.grounded {
        player.vertical_velocity =
            (player.vertical_velocity - params.gravity * dt).max(-params.terminal_velocity);
        player.position.y += player.vertical_velocity * dt;
    }

    if player.position.y <= ground {
        player.position.y = ground;
        player.vertical_velocity = 0.0;
        player.grounded = true;
    } else if player.grounded {
        player.position.y = ground;
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn walking_ctx() -> SimContext {
        let mut ctx = SimContext::default();
        ctx.begin_tick(DT);
        ctx
    }

    fn forward() -> ControlInput {
        ControlInput::with_move(Vec2::new(0.0, -1.0))
    }

    #[test]
    fn test_move_state_tiers() {
        let mut input = forward();
        assert_eq!(MoveState::from_input(&input, 0.0), MoveState::Jogging);
        input.running = true;
        assert_eq!(MoveState::from_input(&input, 0.0), MoveState::Sprinting);
        input.walking = true;
        assert_eq!(MoveState::from_input(&input, 0.0), MoveState::Walking);

        let idle = ControlInput::default();
        assert_eq!(MoveState::from_input(&idle, 2.0), MoveState::Stopping);
        assert_eq!(MoveState::from_input(&idle, 0.2), MoveState::Idle);
    }

    #[test]
    fn test_accelerates_to_jog_along_camera_forward() {
        let ctx = walking_ctx();
        let mut player = PlayerState::new(Vec3::ZERO);
        for _ in 0..120 {
            update(&ctx, &mut player, &forward(), 0.0);
        }
        assert!((player.speed() - 6.5).abs() < 1e-4);
        // Yaw 0 looks down -Z.
        assert!(player.velocity.z < -6.0);
        assert!(player.velocity.x.abs() < 1e-4);
        assert!((player.heading.abs() - PI).abs() < 0.05);
    }

    #[test]
    fn test_idle_converges_to_rest() {
        let ctx = walking_ctx();
        let mut player = PlayerState::new(Vec3::ZERO);
        let mut input = forward();
        input.running = true;
        for _ in 0..120 {
            update(&ctx, &mut player, &input, 0.0);
        }
        assert!(player.speed() > 9.0);

        for _ in 0..600 {
            update(&ctx, &mut player, &ControlInput::default(), 0.0);
        }
        assert!(player.velocity.length() < 1e-6);
        assert_eq!(player.move_state, MoveState::Idle);
        assert!(player.angular_velocity.abs() < 1e-4);
    }

    #[test]
    fn test_speed_matches_horizontal_velocity() {
        let ctx = walking_ctx();
        let mut player = PlayerState::new(Vec3::ZERO);
        let inputs = [
            ControlInput::with_move(Vec2::new(1.0, 0.0)).looking(0.7, 0.0),
            ControlInput::with_move(Vec2::new(-0.7, 0.7)),
            ControlInput::default(),
        ];
        for i in 0..300 {
            update(&ctx, &mut player, &inputs[(i / 100) % 3], 0.0);
            assert_eq!(player.velocity.y, 0.0);
            assert_eq!(player.speed(), player.velocity.x.hypot(player.velocity.z));
        }
    }

    #[test]
    fn test_jump_and_land() {
        let ctx = walking_ctx();
        let params = LocomotionTuning::default();
        let mut player = PlayerState::new(Vec3::ZERO);
        assert!(player.jump(&params));
        assert!(!player.jump(&params));

        update(&ctx, &mut player, &ControlInput::default(), 0.0);
        assert!(player.position.y > 0.0);
        assert!(!player.grounded);

        for _ in 0..120 {
            update(&ctx, &mut player, &ControlInput::default(), 0.0);
        }
        assert!(player.grounded);
        assert_eq!(player.position.y, 0.0);
        assert_eq!(player.vertical_velocity, 0.0);
    }

    #[test]
    fn test_follows_small_drops_and_falls_off_ledges() {
        let ctx = walking_ctx();
        let mut player = PlayerState::new(Vec3::new(0.0, 1.0, 0.0));
        update(&ctx, &mut player, &ControlInput::default(), 0.9);
        assert!(player.grounded);
        assert_eq!(player.position.y, 0.9);

        update(&ctx, &mut player, &ControlInput::default(), 0.0);
        assert!(!player.grounded);
        assert!(player.position.y > 0.0);
    }

    #[test]
    fn test_indoor_bounds_clamp() {
        let mut ctx = walking_ctx();
        ctx.set_mode(Mode::Indoor);
        let mut player = PlayerState::new(Vec3::new(500.0, 0.0, 500.0));
        for _ in 0..600 {
            update(&ctx, &mut player, &forward(), 0.0);
        }
        assert!((player.position.z - 492.0).abs() < 1e-4);
    }

    #[test]
    fn test_inactive_while_driving() {
        let mut ctx = walking_ctx();
        ctx.set_mode(Mode::Driving);
        let mut player = PlayerState::new(Vec3::ZERO);
        assert!(!update(&ctx, &mut player, &forward(), 0.0));
        assert_eq!(player.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_teleport_drops_momentum() {
        let ctx = walking_ctx();
        let mut player = PlayerState::new(Vec3::ZERO);
        for _ in 0..30 {
            update(&ctx, &mut player, &forward(), 0.0);
        }
        player.teleport(Vec3::new(5.0, 0.0, 5.0));
        assert_eq!(player.velocity, Vec3::ZERO);
        assert!(!player.is_moving());
    }
}
