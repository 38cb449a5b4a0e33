//! On-foot player movement and procedural animation.

mod animation;
mod movement;

pub use animation::{AnimationState, HumanoidRig};
pub use movement::{MoveState, PlayerState, update};
