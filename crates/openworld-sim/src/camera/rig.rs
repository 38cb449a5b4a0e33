//! Spring-damped chase camera.
//!
//! Position and look-at each carry a velocity and use a discrete damped
//! spring tuned at 60 Hz:
//!
//! ```text
//! velocity += (target - current) * rate * dt * 8
//! velocity *= damping
//! current  += velocity * dt * 60
//! ```
//!
//! The damping factor is applied once per tick, so the feel changes slightly
//! away from 60 Hz.

use glam::{Vec2, Vec3};

use super::shake::Shake;
use crate::{
    collision::{Collider, CollisionSet, Ray, RayCast},
    config::CameraTuning,
    context::{Mode, SimContext},
    math::{approach, lerp, per_tick_decay},
};

/// Look-at height above the followed entity while driving.
const DRIVE_LOOK_HEIGHT: f32 = 1.2;
/// Look-at height indoors.
const INDOOR_LOOK_HEIGHT: f32 = 1.5;
/// Look-at height on foot outdoors.
const WALK_LOOK_HEIGHT: f32 = 1.6;

/// What the camera follows this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraTarget {
    pub position: Vec3,
    /// Look yaw (radians). The camera sits at `(sin yaw, cos yaw)` behind.
    pub yaw: f32,
    /// Look pitch (radians).
    pub pitch: f32,
}

/// How the followed entity is moving.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraMotion {
    pub speed: f32,
    pub is_moving: bool,
    pub is_boosting: bool,
}

/// Read-only output for the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    /// Eye position including shake.
    pub position: Vec3,
    pub look_at: Vec3,
    /// Vertical field of view (degrees).
    pub fov: f32,
}

#[derive(Clone, Copy, Debug, Default)]
struct HeadBob {
    time: f32,
    intensity: f32,
    offset: Vec2,
}

/// The chase camera.
#[derive(Clone, Debug)]
pub struct CameraRig {
    position: Vec3,
    velocity: Vec3,
    look_at: Vec3,
    look_velocity: Vec3,
    distance: f32,
    height: f32,
    look_height: f32,
    fov: f32,
    fov_offset: f32,
    bob: HeadBob,
    shake: Shake,
    colliders: CollisionSet,
}

impl CameraRig {
    /// A camera at the origin framing for walking. `seed` drives the shake.
    pub fn new(params: &CameraTuning, seed: u64) -> Self {
        Self {
            position: Vec3::new(0.0, params.walk_height, params.walk_distance),
            velocity: Vec3::ZERO,
            look_at: Vec3::new(0.0, WALK_LOOK_HEIGHT, 0.0),
            look_velocity: Vec3::ZERO,
            distance: params.walk_distance,
            height: params.walk_height,
            look_height: WALK_LOOK_HEIGHT,
            fov: params.fov_base,
            fov_offset: 0.0,
            bob: HeadBob::default(),
            shake: Shake::new(seed),
            colliders: CollisionSet::default(),
        }
    }

    /// Replace the obstruction proxies. An empty list disables the test.
    pub fn set_collision_objects(&mut self, colliders: Vec<Collider>) {
        tracing::debug!(count = colliders.len(), "camera colliders set");
        self.colliders.set(colliders);
    }

    pub fn trigger_shake(&mut self, intensity: f32, decay: f32) {
        self.shake.trigger(intensity, decay);
    }

    /// Jump straight to the resting framing of `target`, dropping spring state.
    pub fn snap_to(&mut self, target: &CameraTarget) {
        let (sin, cos) = target.yaw.sin_cos();
        self.position =
            target.position + Vec3::new(sin * self.distance, self.height, cos * self.distance);
        self.look_at = target.position + Vec3::Y * INDOOR_LOOK_HEIGHT;
        self.velocity = Vec3::ZERO;
        self.look_velocity = Vec3::ZERO;
    }

    /// Advance one tick.
    pub fn update(&mut self, ctx: &SimContext, target: &CameraTarget, motion: CameraMotion) {
        let params = &ctx.tuning.camera;
        let dt = ctx.dt();
        let mode = ctx.mode();

        let (target_distance, target_height) = self.frame_for_mode(params, mode, motion, dt);
        self.update_head_bob(mode, motion, dt);

        self.distance = approach(self.distance, target_distance, params.follow_smoothing, dt);
        self.height = approach(self.height, target_height, params.follow_smoothing, dt);

        // Looking steeply up or down pulls the camera in.
        let (sin, cos) = target.yaw.sin_cos();
        let effective = self.distance * (1.0 - target.pitch.abs() * 0.3);
        let offset = Vec3::new(
            sin * effective + self.bob.offset.x,
            self.height - target.pitch * 2.5 + self.bob.offset.y,
            cos * effective,
        );
        let pivot = target.position + Vec3::Y * self.look_height;
        let desired = self.resolve_collision(params, pivot, target.position + offset);

        self.velocity += (desired - self.position) * params.follow_smoothing * dt * 8.0;
        self.velocity *= params.position_damping;
        self.position += self.velocity * dt * 60.0;

        self.look_velocity += (pivot - self.look_at) * params.look_smoothing * dt * 8.0;
        self.look_velocity *= params.look_damping;
        self.look_at += self.look_velocity * dt * 60.0;

        self.shake.update(dt);
        self.fov = approach(self.fov, params.fov_base + self.fov_offset, 5.0, dt);
    }

    /// Target distance and height for the mode; also steers the FOV offset.
    fn frame_for_mode(
        &mut self,
        params: &CameraTuning,
        mode: Mode,
        motion: CameraMotion,
        dt: f32,
    ) -> (f32, f32) {
        match mode {
            Mode::Driving => {
                let zoom = (motion.speed / 30.0).min(1.0);
                self.look_height = DRIVE_LOOK_HEIGHT;
                self.fov_offset = approach(self.fov_offset, zoom * params.fov_drive_boost, 3.0, dt);
                (
                    params.drive_distance + zoom * params.drive_speed_zoom,
                    params.drive_height + zoom * 1.5,
                )
            }
            Mode::Indoor => {
                self.look_height = INDOOR_LOOK_HEIGHT;
                self.fov_offset *= per_tick_decay(0.95, dt);
                (params.indoor_distance, params.indoor_height)
            }
            Mode::Walking => {
                let run = (motion.speed / 8.0).min(1.0);
                self.look_height = WALK_LOOK_HEIGHT;
                let target_fov = if motion.is_boosting {
                    params.fov_sprint_boost * (0.5 + run * 0.5)
                } else {
                    run * params.fov_sprint_boost * 0.35
                };
                self.fov_offset = approach(self.fov_offset, target_fov, 4.0, dt);
                (params.walk_distance + run * 1.4, params.walk_height + run * 0.4)
            }
        }
    }

    fn update_head_bob(&mut self, mode: Mode, motion: CameraMotion, dt: f32) {
        let bob = &mut self.bob;
        if mode != Mode::Driving && motion.is_moving {
            let t = (motion.speed / 9.0).min(1.0);
            let frequency = lerp(8.0, 15.0, t);
            let amplitude = lerp(0.025, 0.065, t);
            bob.time += dt * frequency;
            bob.intensity = approach(bob.intensity, 1.0, 8.0, dt);
            bob.offset = Vec2::new(
                (bob.time * 0.5).sin() * amplitude * 0.5 * bob.intensity,
                bob.time.sin() * amplitude * bob.intensity,
            );
        } else {
            bob.intensity = approach(bob.intensity, 0.0, 6.0, dt);
            bob.offset *= per_tick_decay(0.9, dt);
        }
    }

    /// Pull `ideal` in along the pivot ray if something blocks the view.
    /// Never pushes the camera past `ideal`.
    pub fn resolve_collision(&self, params: &CameraTuning, pivot: Vec3, ideal: Vec3) -> Vec3 {
        if self.colliders.is_empty() {
            return ideal;
        }
        let to_camera = ideal - pivot;
        let distance = to_camera.length();
        let Some(ray) = Ray::new(pivot, to_camera) else {
            return ideal;
        };
        match self.colliders.cast(&ray, distance) {
            Some(hit) if hit < distance => {
                let clamped =
                    (hit - params.collision_margin).max(params.collision_min_distance);
                ray.at(clamped.min(distance))
            }
            _ => ideal,
        }
    }

    /// Renderer view for this tick.
    pub fn view(&self) -> CameraView {
        CameraView {
            position: self.position + self.shake.offset(),
            look_at: self.look_at,
            fov: self.fov,
        }
    }

    /// Smoothed eye position without shake.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn shake(&self) -> &Shake {
        &self.shake
    }

    pub fn head_bob_intensity(&self) -> f32 {
        self.bob.intensity
    }
}
