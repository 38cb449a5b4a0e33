//! Non-player characters reacting to the player.

mod behavior;
mod state;

pub use behavior::{NpcStep, Surprise, update};
pub use state::{BehaviorState, Friend, FriendDialog, NpcRig, NpcState};
