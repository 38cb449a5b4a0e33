//! Simulation core for an open-world walking and driving sandbox.
//!
//! Everything in this crate is engine-free: the update functions take plain
//! state structs, a [`SimContext`] and a timestep, so they can be driven by a
//! game loop, a headless tuner or a unit test with synthetic `dt` values.
//!
//! The per-tick order lives in [`session::Session::tick`]:
//! input, then vehicle dynamics or locomotion (never both), then NPC
//! behavior, then the camera rig, then interaction resolution.

pub mod camera;
pub mod collision;
pub mod config;
pub mod context;
pub mod error;
pub mod input;
pub mod interaction;
pub mod locomotion;
pub mod location;
pub mod math;
pub mod npc;
pub mod pose;
pub mod session;
pub mod telemetry;
pub mod terrain;
pub mod vehicle;
pub mod world;

pub use context::{Mode, SimContext};
pub use error::{Error, Result};
pub use input::ControlInput;
pub use session::{Session, SessionEvent, TickReport};
pub use world::{World, WorldLayout};
