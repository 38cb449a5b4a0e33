//! Vehicle simulation: state, dynamics and cosmetic body motion.

pub mod dynamics;
mod state;
pub mod visuals;

pub use dynamics::{
    GripState, VehicleStepOutput, compute_drive_step, effective_grip, engine_force,
    theoretical_top_speed, update,
};
pub use state::{VehicleId, VehicleState};
pub use visuals::{CarRig, VehicleVisuals};
