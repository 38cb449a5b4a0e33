//! Chase camera: mode framing, head-bob, collision pull-in and shake.

mod rig;
mod shake;

pub use rig::{CameraMotion, CameraRig, CameraTarget, CameraView};
pub use shake::Shake;
