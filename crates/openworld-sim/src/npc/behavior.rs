//! Distance-driven reactions to the player.

use glam::{Vec2, Vec3};

use super::state::{BehaviorState, NpcState};
use crate::{
    config::NpcTuning,
    context::SimContext,
    math::{approach, per_tick_decay, shortest_angle, wrap_angle},
};

/// Awareness above which the NPC turns toward the player.
const FACE_AWARENESS: f32 = 0.2;
/// Awareness above which the head tracks the player.
const LOOK_AWARENESS: f32 = 0.1;
/// Awareness above which the body leans in.
const LEAN_AWARENESS: f32 = 0.5;

/// A one-shot surprise reaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Surprise {
    /// Player rushed in while the NPC was alert.
    Startled,
    /// Player crossed into the alert band from further out.
    Alerted,
}

/// Result of one NPC step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NpcStep {
    pub previous: BehaviorState,
    pub current: BehaviorState,
    pub surprise: Option<Surprise>,
}

/// Step one NPC against the player position.
pub fn update(ctx: &SimContext, npc: &mut NpcState, player_position: Vec3) -> NpcStep {
    let params = &ctx.tuning.npc;
    let dt = ctx.dt();

    let distance = npc.position.distance(player_position);
    npc.approach_speed = match npc.last_distance {
        Some(last) if dt > 0.0 => (last - distance) / dt,
        _ => 0.0,
    };
    npc.last_distance = Some(distance);

    npc.time += dt;
    npc.bob_phase += dt * 1.5;
    npc.breathe_phase += dt * 1.2;

    // Knockback recovers toward home.
    npc.surprise_offset *= per_tick_decay(params.offset_decay, dt);
    npc.position.x = npc.home().x + npc.surprise_offset.x;
    npc.position.z = npc.home().z + npc.surprise_offset.z;

    let previous = npc.behavior;
    let current = BehaviorState::from_distance(distance, params);
    npc.behavior = current;
    let surprise = react(npc, params, previous, player_position);
    if let Some(kind) = surprise {
        tracing::debug!(npc = %npc.friend.name, ?kind, distance, "npc surprised");
    }

    update_awareness(npc, distance, dt, params);
    let facing_error = update_facing(npc, params, player_position, dt);
    update_idle_motion(npc, params, dt);
    update_head(npc, facing_error, distance, dt);
    update_wave(npc, params, dt);

    NpcStep {
        previous,
        current,
        surprise,
    }
}

fn react(
    npc: &mut NpcState,
    params: &NpcTuning,
    previous: BehaviorState,
    player_position: Vec3,
) -> Option<Surprise> {
    if npc.behavior != BehaviorState::Alert {
        return None;
    }

    let away = Vec3::new(
        npc.position.x - player_position.x,
        0.0,
        npc.position.z - player_position.z,
    );
    let away = (away.length_squared() > 0.001).then(|| away.normalize());
    let impulse = |npc: &mut NpcState, surprise: f32, offset: f32| {
        npc.surprise = surprise;
        if let Some(away) = away {
            npc.surprise_offset = away * offset;
        }
    };

    // Entering the band overrides a fast-approach impulse on the same tick.
    if matches!(previous, BehaviorState::Idle | BehaviorState::Watching) {
        impulse(npc, 0.5, params.alert_offset);
        Some(Surprise::Alerted)
    } else if npc.approach_speed > params.startle_speed {
        impulse(npc, 1.0, params.startle_offset);
        Some(Surprise::Startled)
    } else {
        None
    }
}

fn update_awareness(npc: &mut NpcState, distance: f32, dt: f32, params: &NpcTuning) {
    let target = if distance < 5.0 {
        1.0
    } else if distance < 10.0 {
        0.6
    } else if distance < params.idle_distance {
        0.3
    } else {
        0.0
    };
    npc.awareness = approach(npc.awareness, target, params.awareness_rate, dt);
}

/// Turn toward the player. Returns the facing error before the turn.
fn update_facing(npc: &mut NpcState, params: &NpcTuning, player: Vec3, dt: f32) -> f32 {
    if npc.awareness > FACE_AWARENESS {
        npc.target_rotation = (player.x - npc.position.x).atan2(player.z - npc.position.z);
    }
    let diff = shortest_angle(npc.rotation, npc.target_rotation);
    let rate = if npc.behavior == BehaviorState::Alert {
        params.alert_turn_rate
    } else {
        params.calm_turn_rate
    };
    npc.rotation = wrap_angle(npc.rotation + diff * (rate * dt).min(1.0));
    diff
}

fn update_idle_motion(npc: &mut NpcState, params: &NpcTuning, dt: f32) {
    let breath = npc.breathe_phase.sin() * 0.015;
    let body = npc.rig.pose.local_mut(npc.rig.body);
    body.scale = Vec3::new(1.0 + breath, 1.0, 1.0 + breath * 0.5);

    // Less fidgeting the more attention is on the player.
    let bob = npc.bob_phase.sin() * 0.04 * (1.0 - npc.awareness * 0.7);
    npc.position.y = npc.home().y + bob + npc.surprise * 0.3;
    npc.surprise *= per_tick_decay(params.surprise_decay, dt);

    let target_lean = if npc.awareness > LEAN_AWARENESS { 0.08 } else { 0.0 };
    npc.body_lean = approach(npc.body_lean, target_lean, 4.0, dt);
    npc.rig.pose.local_mut(npc.rig.body).rotation.x = npc.body_lean;
}

fn update_head(npc: &mut NpcState, facing_error: f32, distance: f32, dt: f32) {
    if npc.awareness > LOOK_AWARENESS {
        let yaw_target = facing_error.sin() * 0.4 * npc.awareness;
        let pitch_target = (if distance < 3.0 { 0.1 } else { -0.05 }) * npc.awareness;
        npc.head_look = Vec2::new(
            approach(npc.head_look.x, yaw_target, 5.0, dt),
            approach(npc.head_look.y, pitch_target, 3.0, dt),
        );
    } else {
        npc.head_look = Vec2::new((npc.time * 0.3).sin() * 0.1, (npc.time * 0.2).sin() * 0.05);
    }

    let tilt = (npc.bob_phase * 0.5).sin() * 0.03;
    npc.rig.pose.local_mut(npc.rig.head).rotation =
        Vec3::new(npc.head_look.y, npc.head_look.x, tilt);
}

fn update_wave(npc: &mut NpcState, params: &NpcTuning, dt: f32) {
    if npc.behavior == BehaviorState::Greeting {
        npc.is_waving = true;
        npc.wave_intensity = approach(npc.wave_intensity, 1.0, params.wave_in_rate, dt);
    } else {
        npc.wave_intensity = approach(npc.wave_intensity, 0.0, params.wave_out_rate, dt);
        if npc.wave_intensity < 0.05 {
            npc.is_waving = false;
        }
    }

    let arm = npc.rig.pose.local_mut(npc.rig.wave_arm);
    if npc.wave_intensity > 0.01 {
        npc.wave_time += dt * 10.0;
        let wave = npc.wave_intensity;
        arm.rotation.z = -1.3 * wave + npc.wave_time.sin() * 0.5 * wave;
        arm.rotation.x = (npc.wave_time * 0.5).sin() * 0.3 * wave;
    } else {
        arm.rotation.z *= per_tick_decay(0.9, dt);
        arm.rotation.x = npc.bob_phase.sin() * 0.05;
    }
}
