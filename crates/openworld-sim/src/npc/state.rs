use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    config::NpcTuning,
    pose::{PartId, PartTransform, Pose},
};

/// A named character the player can talk to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub name: String,
    pub emoji: String,
    /// `0xRRGGBB` accent color.
    pub color: u32,
    pub message: String,
}

impl Friend {
    pub fn new(name: &str, emoji: &str, color: u32, message: &str) -> Self {
        Self {
            name: name.to_owned(),
            emoji: emoji.to_owned(),
            color,
            message: message.to_owned(),
        }
    }

    /// Dialog payload shown when talking to this friend.
    pub fn dialog(&self) -> FriendDialog {
        FriendDialog {
            name: self.name.clone(),
            message: self.message.clone(),
            color: self.color,
        }
    }

    /// The reference five-character roster.
    pub fn roster() -> Vec<Friend> {
        vec![
            Friend::new(
                "Mike",
                "👔",
                0x2244AA,
                "Yo, what's up? Looking for some action around here?",
            ),
            Friend::new(
                "Frank",
                "🧢",
                0x44AA22,
                "Hey man, you need a ride? I know this city like the back of my hand.",
            ),
            Friend::new(
                "Trevor",
                "🎸",
                0xAA4422,
                "HAHA! You look lost, friend. Welcome to the chaos!",
            ),
            Friend::new(
                "Lester",
                "🤓",
                0x888888,
                "I've got some intel... if you're interested in making some money.",
            ),
            Friend::new(
                "Amanda",
                "💄",
                0xFF6699,
                "This city has everything - beaches, mountains, opportunity...",
            ),
        ]
    }
}

/// Dialog payload for the UI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendDialog {
    pub name: String,
    pub message: String,
    pub color: u32,
}

/// Discrete reaction to the player, chosen by distance alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorState {
    #[default]
    Idle,
    Watching,
    Alert,
    Greeting,
}

impl BehaviorState {
    /// Band for a distance, outermost first. The idle band includes its
    /// boundary; the inner bands use strict `>`. A friend exactly at
    /// `idle_distance` stays idle, so keep the `>=` here.
    pub fn from_distance(distance: f32, params: &NpcTuning) -> Self {
        if distance >= params.idle_distance {
            BehaviorState::Idle
        } else if distance > params.watch_distance {
            BehaviorState::Watching
        } else if distance > params.greet_distance {
            BehaviorState::Alert
        } else {
            BehaviorState::Greeting
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BehaviorState::Idle => "idle",
            BehaviorState::Watching => "watching",
            BehaviorState::Alert => "alert",
            BehaviorState::Greeting => "greeting",
        }
    }
}

/// Pivots of an NPC body.
#[derive(Clone, Debug)]
pub struct NpcRig {
    pub pose: Pose,
    pub body: PartId,
    pub head: PartId,
    /// Right arm, used for waving.
    pub wave_arm: PartId,
    /// Left arm, resting slightly out from the body.
    pub rest_arm: PartId,
}

impl NpcRig {
    pub fn new() -> Self {
        let mut pose = Pose::new();
        let body = pose.add("body", None, PartTransform::at(Vec3::new(0.0, 0.75, 0.0)));
        let head = pose.add("head", None, PartTransform::at(Vec3::new(0.0, 1.8, 0.0)));
        let wave_arm = pose.add(
            "arm_pivot",
            None,
            PartTransform::at(Vec3::new(0.45, 1.15, 0.0)),
        );
        let rest_arm = pose.add(
            "left_arm_pivot",
            None,
            PartTransform::at(Vec3::new(-0.45, 1.15, 0.0)).rotated(Vec3::new(0.0, 0.0, 0.3)),
        );
        Self {
            pose,
            body,
            head,
            wave_arm,
            rest_arm,
        }
    }
}

impl Default for NpcRig {
    fn default() -> Self {
        Self::new()
    }
}

/// One non-player character.
#[derive(Clone, Debug)]
pub struct NpcState {
    pub friend: Friend,
    home: Vec3,
    /// Rendered position: home plus the decaying surprise offset, with the
    /// idle bob and surprise hop in `y`.
    pub position: Vec3,
    /// Facing (radians).
    pub rotation: f32,
    pub target_rotation: f32,
    /// Attention on the player, `[0, 1]`.
    pub awareness: f32,
    pub behavior: BehaviorState,
    /// Player distance on the previous tick.
    pub last_distance: Option<f32>,
    /// Rate at which the player closed in last tick (m/s).
    pub approach_speed: f32,
    /// Hop impulse, decaying toward zero.
    pub surprise: f32,
    /// Horizontal knockback from home, decaying toward zero.
    pub surprise_offset: Vec3,
    pub time: f32,
    pub bob_phase: f32,
    pub breathe_phase: f32,
    pub wave_time: f32,
    pub wave_intensity: f32,
    pub is_waving: bool,
    /// Head yaw (`x`) and pitch (`y`) offsets.
    pub head_look: Vec2,
    pub body_lean: f32,
    pub rig: NpcRig,
}

impl NpcState {
    /// An NPC standing at `home` with randomized idle phases.
    pub fn new<R: Rng + ?Sized>(home: Vec3, friend: Friend, rng: &mut R) -> Self {
        let home = Vec3::new(home.x, 0.0, home.z);
        Self {
            friend,
            home,
            position: home,
            rotation: 0.0,
            target_rotation: 0.0,
            awareness: 0.0,
            behavior: BehaviorState::Idle,
            last_distance: None,
            approach_speed: 0.0,
            surprise: 0.0,
            surprise_offset: Vec3::ZERO,
            time: rng.random_range(0.0..TAU),
            bob_phase: rng.random_range(0.0..TAU),
            breathe_phase: rng.random_range(0.0..TAU),
            wave_time: 0.0,
            wave_intensity: 0.0,
            is_waving: false,
            head_look: Vec2::ZERO,
            body_lean: 0.0,
            rig: NpcRig::new(),
        }
    }

    /// Anchor the NPC always returns to.
    pub fn home(&self) -> Vec3 {
        self.home
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn test_behavior_bands() {
        let params = NpcTuning::default();
        let band = |d| BehaviorState::from_distance(d, &params);
        assert_eq!(band(20.0), BehaviorState::Idle);
        assert_eq!(band(15.0), BehaviorState::Idle);
        assert_eq!(band(14.99), BehaviorState::Watching);
        assert_eq!(band(8.01), BehaviorState::Watching);
        assert_eq!(band(8.0), BehaviorState::Alert);
        assert_eq!(band(6.0), BehaviorState::Alert);
        assert_eq!(band(4.01), BehaviorState::Alert);
        assert_eq!(band(4.0), BehaviorState::Greeting);
        assert_eq!(band(3.0), BehaviorState::Greeting);
    }

    #[test]
    fn test_new_npc_stands_at_home() {
        let mut rng = StdRng::seed_from_u64(7);
        let npc = NpcState::new(Vec3::new(15.0, 3.0, -25.0), Friend::roster().remove(0), &mut rng);
        assert_eq!(npc.home(), Vec3::new(15.0, 0.0, -25.0));
        assert_eq!(npc.position, npc.home());
        assert!((0.0..TAU).contains(&npc.bob_phase));
        assert_eq!(npc.behavior, BehaviorState::Idle);
    }

    #[test]
    fn test_roster_dialog() {
        let roster = Friend::roster();
        assert_eq!(roster.len(), 5);
        let dialog = roster[2].dialog();
        assert_eq!(dialog.name, "Trevor");
        assert_eq!(dialog.color, 0xAA4422);
    }
}
