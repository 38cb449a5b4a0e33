//! One running game: context, world, camera and the per-tick order.

use glam::Vec3;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    camera::{CameraMotion, CameraRig, CameraTarget, CameraView},
    collision::Collider,
    config::TuningSet,
    context::{Mode, SimContext},
    input::ControlInput,
    interaction,
    locomotion,
    location::District,
    npc::{self, FriendDialog, Surprise},
    terrain::{GroundSampler, RollingHills},
    vehicle::{self, VehicleId, VehicleStepOutput},
    world::{World, WorldLayout},
};

/// Drift amount above which the camera shakes.
const DRIFT_SHAKE_THRESHOLD: f32 = 0.05;
/// Decay rate of drift shake.
const DRIFT_SHAKE_DECAY: f32 = 10.0;
/// A driven car counts as moving above this speed.
const DRIVING_MOVING_SPEED: f32 = 0.5;

/// Something that happened during a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    EnteredVehicle(VehicleId),
    ExitedVehicle(VehicleId),
    Talked(FriendDialog),
    EnteredHouse { friend: String },
    LeftHouse { friend: String },
    NpcSurprised { friend: String, kind: Surprise },
}

/// Which integrator owned the player this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Controller {
    Vehicle,
    Locomotion,
}

/// Text for the HUD.
#[derive(Clone, Debug, PartialEq)]
pub struct HudSnapshot {
    pub mode: Mode,
    pub location: District,
    pub prompt: Option<String>,
    /// Speedometer reading while driving.
    pub speed_kmh: Option<f32>,
}

/// One car on the minimap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinimapVehicle {
    pub position: Vec3,
    pub heading: f32,
    pub occupied: bool,
}

/// Positions for the minimap.
#[derive(Clone, Debug, PartialEq)]
pub struct MinimapSnapshot {
    pub player_position: Vec3,
    pub player_heading: f32,
    pub vehicles: Vec<MinimapVehicle>,
}

/// Everything the outer layers need after a tick.
#[derive(Clone, Debug)]
pub struct TickReport {
    pub tick: u64,
    pub mode: Mode,
    /// Clamped timestep actually simulated.
    pub dt: f32,
    pub controller: Controller,
    pub camera: CameraView,
    pub hud: HudSnapshot,
    pub minimap: MinimapSnapshot,
    pub events: Vec<SessionEvent>,
    /// Dynamics diagnostics when a car was driven.
    pub vehicle_step: Option<VehicleStepOutput>,
}

/// A running session.
pub struct Session {
    ctx: SimContext,
    world: World,
    camera: CameraRig,
    ground: Box<dyn GroundSampler + Send + Sync>,
}

impl Session {
    /// Build a session on the reference terrain. `seed` drives NPC phases and
    /// camera shake.
    pub fn new(tuning: TuningSet, layout: &WorldLayout, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let world = World::from_layout(layout, &mut rng);
        let camera = CameraRig::new(&tuning.camera, seed.wrapping_add(1));
        let mut session = Self {
            ctx: SimContext::new(tuning),
            world,
            camera,
            ground: Box::new(RollingHills),
        };
        session.snap_camera(0.0, 0.0);
        tracing::info!(
            vehicles = session.world.vehicles.len(),
            npcs = session.world.npcs.len(),
            houses = session.world.houses.len(),
            "session created"
        );
        session
    }

    /// Replace the ground collaborator.
    #[must_use]
    pub fn with_ground(mut self, ground: impl GroundSampler + Send + Sync + 'static) -> Self {
        self.ground = Box::new(ground);
        self
    }

    /// Replace the camera obstruction proxies.
    pub fn set_collision_objects(&mut self, colliders: Vec<Collider>) {
        self.camera.set_collision_objects(colliders);
    }

    pub fn ctx(&self) -> &SimContext {
        &self.ctx
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn mode(&self) -> Mode {
        self.ctx.mode()
    }

    fn snap_camera(&mut self, yaw: f32, pitch: f32) {
        self.camera.snap_to(&CameraTarget {
            position: self.world.focus_position(),
            yaw,
            pitch,
        });
    }

    /// Advance the whole game by one frame.
    pub fn tick(&mut self, input: &ControlInput, raw_dt: f32) -> TickReport {
        let dt = self.ctx.begin_tick(raw_dt);
        let mut events = Vec::new();
        let ground: &dyn GroundSampler = &*self.ground;
        let world = &mut self.world;

        if input.actions.jump
            && self.ctx.mode().is_on_foot()
            && world.player.jump(&self.ctx.tuning.locomotion)
        {
            tracing::debug!("jump");
        }

        let ground_height = if self.ctx.mode() == Mode::Indoor {
            0.0
        } else {
            ground.height_at(world.player.position.x, world.player.position.z)
        };

        // Exactly one of the two integrators owns the player.
        let mut vehicle_step = None;
        let driven = world
            .active_vehicle
            .filter(|_| self.ctx.mode() == Mode::Driving)
            .and_then(|id| world.vehicles.get_mut(id.0));
        let (controller, speed, is_moving) = match driven {
            Some(car) => {
                vehicle_step = vehicle::update(&self.ctx, car, input, Some(ground));
                world.player.position = car.position;
                let speed = car.speed();
                (Controller::Vehicle, speed, speed > DRIVING_MOVING_SPEED)
            }
            None => {
                locomotion::update(&self.ctx, &mut world.player, input, ground_height);
                let player = &world.player;
                (Controller::Locomotion, player.speed(), player.is_moving())
            }
        };

        let ride_height = self.ctx.tuning.vehicle.ride_height;
        for car in world.vehicles.iter_mut().filter(|car| !car.occupied) {
            car.sync_to_ground(ground, ride_height);
        }

        let player_position = world.player.position;
        for npc in &mut world.npcs {
            let step = npc::update(&self.ctx, npc, player_position);
            if let Some(kind) = step.surprise {
                events.push(SessionEvent::NpcSurprised {
                    friend: npc.friend.name.clone(),
                    kind,
                });
            }
        }

        if let Some(car) = world.active() {
            let drift = car.drift_amount();
            if drift > DRIFT_SHAKE_THRESHOLD {
                self.camera
                    .trigger_shake(0.05 + drift * 0.15, DRIFT_SHAKE_DECAY);
            }
        }
        let target = CameraTarget {
            position: world.focus_position(),
            yaw: input.yaw,
            pitch: input.pitch,
        };
        let motion = CameraMotion {
            speed,
            is_moving,
            is_boosting: input.is_boosting(),
        };
        self.camera.update(&self.ctx, &target, motion);

        if input.actions.interact
            && let Some(event) = interaction::interact(&mut self.ctx, &mut self.world)
        {
            if matches!(
                event,
                SessionEvent::EnteredHouse { .. } | SessionEvent::LeftHouse { .. }
            ) {
                self.snap_camera(input.yaw, input.pitch);
            }
            events.push(event);
        }
        if input.actions.talk
            && let Some(dialog) = interaction::talk(&self.ctx, &self.world)
        {
            events.push(SessionEvent::Talked(dialog));
        }

        TickReport {
            tick: self.ctx.tick(),
            mode: self.ctx.mode(),
            dt,
            controller,
            camera: self.camera.view(),
            hud: self.hud(),
            minimap: self.minimap(),
            events,
            vehicle_step,
        }
    }

    /// HUD text for the current state.
    pub fn hud(&self) -> HudSnapshot {
        let focus = self.world.focus_position();
        let location = if self.ctx.mode() == Mode::Indoor {
            District::Interior
        } else {
            District::at(focus.x, focus.z, &*self.ground)
        };
        let prompt = interaction::find_nearest(&self.ctx, &self.world)
            .and_then(|nearest| interaction::prompt(&self.world, &nearest));
        HudSnapshot {
            mode: self.ctx.mode(),
            location,
            prompt,
            speed_kmh: self.world.active().map(|car| car.speed_kmh()),
        }
    }

    /// Minimap positions for the current state.
    pub fn minimap(&self) -> MinimapSnapshot {
        let player = &self.world.player;
        let player_heading = self.world.active().map_or(player.heading, |car| car.heading);
        MinimapSnapshot {
            player_position: self.world.focus_position(),
            player_heading,
            vehicles: self
                .world
                .vehicles
                .iter()
                .map(|car| MinimapVehicle {
                    position: car.position,
                    heading: car.heading,
                    occupied: car.occupied,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::{input::ActionEdges, terrain::FlatGround};

    const DT: f32 = 1.0 / 60.0;

    fn session() -> Session {
        Session::new(TuningSet::default(), &WorldLayout::city(), 7).with_ground(FlatGround::default())
    }

    fn press_interact() -> ControlInput {
        ControlInput {
            actions: ActionEdges {
                interact: true,
                ..ActionEdges::default()
            },
            ..ControlInput::default()
        }
    }

    fn forward() -> ControlInput {
        ControlInput::with_move(Vec2::new(0.0, -1.0))
    }

    #[test]
    fn test_large_frames_are_clamped() {
        let mut session = session();
        let report = session.tick(&ControlInput::default(), 0.5);
        assert!((report.dt - 0.1).abs() < 1e-6);
        assert_eq!(report.tick, 1);
    }

    #[test]
    fn test_walking_uses_locomotion_only() {
        let mut session = session();
        let parked: Vec<_> = session.world().vehicles.iter().map(|c| c.velocity).collect();
        for _ in 0..60 {
            let report = session.tick(&forward(), DT);
            assert_eq!(report.controller, Controller::Locomotion);
            assert!(report.vehicle_step.is_none());
        }
        assert!(session.world().player.speed() > 5.0);
        let after: Vec<_> = session.world().vehicles.iter().map(|c| c.velocity).collect();
        assert_eq!(parked, after);
        // Parked cars hug the ground.
        assert!(session.world().vehicles.iter().all(|c| (c.position.y - 0.35).abs() < 1e-6));
    }

    #[test]
    fn test_enter_drive_exit() {
        let mut session = session();
        session.world_mut().player.position = Vec3::new(22.0, 0.0, 20.0);
        session.world_mut().vehicles[0].throttle = 0.5;

        let report = session.tick(&press_interact(), DT);
        assert_eq!(report.events, vec![SessionEvent::EnteredVehicle(VehicleId(0))]);
        assert_eq!(report.mode, Mode::Driving);
        assert_eq!(session.world().vehicles[0].throttle, 0.0);

        let player_before = session.world().player.velocity;
        for _ in 0..120 {
            let report = session.tick(&forward(), DT);
            assert_eq!(report.controller, Controller::Vehicle);
            assert!(report.vehicle_step.is_some());
            assert!(report.hud.speed_kmh.is_some());
        }
        // Locomotion did not run while driving.
        assert_eq!(session.world().player.velocity, player_before);
        let car = &session.world().vehicles[0];
        assert!(car.forward_speed() > 5.0);
        assert_eq!(session.world().player.position, car.position);

        let report = session.tick(&press_interact(), DT);
        assert_eq!(report.events, vec![SessionEvent::ExitedVehicle(VehicleId(0))]);
        assert_eq!(report.mode, Mode::Walking);
        let car = &session.world().vehicles[0];
        assert!(!car.occupied);
        assert_eq!(car.throttle, 0.0);
        assert_eq!(car.steer_input, 0.0);
        assert!(!car.handbrake);
        assert_eq!(session.world().player.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_stale_vehicle_id_falls_back_to_locomotion() {
        let mut session = session();
        session.world_mut().player.position = Vec3::new(22.0, 0.0, 20.0);
        session.tick(&press_interact(), DT);
        assert_eq!(session.mode(), Mode::Driving);

        session.world_mut().active_vehicle = Some(VehicleId(99));
        for _ in 0..10 {
            let report = session.tick(&forward(), DT);
            assert_eq!(report.controller, Controller::Locomotion);
            assert!(report.vehicle_step.is_none());
        }
    }

    #[test]
    fn test_hud_prompt_and_location() {
        let mut session = session();
        session.world_mut().player.position = Vec3::new(22.0, 0.0, 20.0);
        let report = session.tick(&ControlInput::default(), DT);
        assert_eq!(report.hud.prompt.as_deref(), Some("Press E to enter car"));
        assert_eq!(report.hud.location, District::Vinewood);
        assert_eq!(report.minimap.vehicles.len(), 6);
    }

    #[test]
    fn test_talk_emits_dialog() {
        let mut session = session();
        let home = session.world().npcs[1].home();
        session.world_mut().player.position = home + Vec3::new(1.0, 0.0, 0.0);
        let input = ControlInput {
            actions: ActionEdges {
                talk: true,
                ..ActionEdges::default()
            },
            ..ControlInput::default()
        };
        let report = session.tick(&input, DT);
        let dialog = report.events.iter().find_map(|e| match e {
            SessionEvent::Talked(d) => Some(d.clone()),
            _ => None,
        });
        assert_eq!(dialog.unwrap().name, "Frank");
    }

    #[test]
    fn test_visit_house_goes_indoor() {
        let mut session = session();
        let door = session.world().houses[1].door_position();
        session.world_mut().player.position = door;
        let report = session.tick(&press_interact(), DT);
        assert_eq!(report.mode, Mode::Indoor);
        assert_eq!(report.hud.location, District::Interior);

        for _ in 0..30 {
            let report = session.tick(&forward(), DT);
            assert_eq!(report.controller, Controller::Locomotion);
        }
        let p = session.world().player.position;
        assert!((492.0..=508.0).contains(&p.x) && (492.0..=509.0).contains(&p.z));
        assert_eq!(p.y, 0.0);
    }
}
