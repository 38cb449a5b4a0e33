//! Nearest-interactable search and the mode transitions it drives.
//!
//! This is the only place that changes [`Mode`].

use glam::Vec3;

use crate::{
    context::{Mode, SimContext},
    npc::{Friend, FriendDialog},
    session::SessionEvent,
    vehicle::VehicleId,
    world::{World, interior},
};

/// Something the player can act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interactable {
    Vehicle(VehicleId),
    Npc(usize),
    House(usize),
    IndoorFriend,
    Exit,
}

/// Closest interactable and its distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearest {
    pub target: Interactable,
    pub distance: f32,
}

/// Keeps the closest candidate; ties go to the first one offered.
struct Search {
    origin: Vec3,
    best: Option<Nearest>,
}

impl Search {
    fn new(origin: Vec3) -> Self {
        Self { origin, best: None }
    }

    fn offer(&mut self, target: Interactable, position: Vec3, radius: f32) {
        let distance = self.origin.distance(position);
        if distance < radius && self.best.is_none_or(|b| distance < b.distance) {
            self.best = Some(Nearest { target, distance });
        }
    }
}

/// Find what the player would act on right now.
pub fn find_nearest(ctx: &SimContext, world: &World) -> Option<Nearest> {
    let reach = &ctx.tuning.interaction;
    let mut search = Search::new(world.focus_position());

    match ctx.mode() {
        Mode::Driving => {
            let id = world.active_vehicle?;
            let car = world.vehicle(id)?;
            search.offer(Interactable::Vehicle(id), car.position, reach.exit_radius);
        }
        Mode::Walking => {
            for (i, car) in world.vehicles.iter().enumerate() {
                search.offer(
                    Interactable::Vehicle(VehicleId(i)),
                    car.position,
                    reach.vehicle_radius,
                );
            }
            for (i, npc) in world.npcs.iter().enumerate() {
                search.offer(Interactable::Npc(i), npc.position, reach.npc_radius);
            }
            for (i, house) in world.houses.iter().enumerate() {
                search.offer(Interactable::House(i), house.door_position(), reach.house_radius);
            }
        }
        Mode::Indoor => {
            if world.indoor_friend().is_some() {
                search.offer(Interactable::IndoorFriend, interior::FRIEND, reach.npc_radius);
            }
            search.offer(Interactable::Exit, interior::EXIT_DOOR, reach.door_radius);
        }
    }

    search.best
}

/// Prompt text for an interactable.
pub fn prompt(world: &World, nearest: &Nearest) -> Option<String> {
    let text = match nearest.target {
        Interactable::Vehicle(id) => {
            if world.vehicle(id)?.occupied {
                "Press E to exit car".to_owned()
            } else {
                "Press E to enter car".to_owned()
            }
        }
        Interactable::House(i) => format!("Press E to visit {}", world.houses.get(i)?.friend.name),
        Interactable::Exit => "Press E to go outside".to_owned(),
        Interactable::Npc(i) => format!("Press F to talk to {}", world.npcs.get(i)?.friend.name),
        Interactable::IndoorFriend => {
            format!("Press F to talk to {}", world.indoor_friend()?.name)
        }
    };
    Some(text)
}

/// Handle the interact action.
pub fn interact(ctx: &mut SimContext, world: &mut World) -> Option<SessionEvent> {
    let nearest = find_nearest(ctx, world)?;
    match (nearest.target, ctx.mode()) {
        (Interactable::Vehicle(_), Mode::Driving) => exit_vehicle(ctx, world),
        (Interactable::Vehicle(id), Mode::Walking) => enter_vehicle(ctx, world, id),
        (Interactable::House(i), Mode::Walking) => visit_house(ctx, world, i),
        (Interactable::Exit, Mode::Indoor) => leave_house(ctx, world),
        _ => None,
    }
}

/// Handle the talk action.
pub fn talk(ctx: &SimContext, world: &World) -> Option<FriendDialog> {
    let friend: &Friend = match find_nearest(ctx, world)?.target {
        Interactable::Npc(i) => &world.npcs.get(i)?.friend,
        Interactable::IndoorFriend => world.indoor_friend()?,
        _ => return None,
    };
    tracing::info!(friend = %friend.name, "talking");
    Some(friend.dialog())
}

/// Get into a parked car.
pub fn enter_vehicle(
    ctx: &mut SimContext,
    world: &mut World,
    id: VehicleId,
) -> Option<SessionEvent> {
    if ctx.mode() != Mode::Walking || world.active_vehicle.is_some() {
        return None;
    }
    let car = world.vehicle_mut(id)?;
    car.occupied = true;
    car.reset_controls();
    world.active_vehicle = Some(id);
    world.player.visible = false;
    ctx.set_mode(Mode::Driving);
    tracing::info!(vehicle = id.0, "entered vehicle");
    Some(SessionEvent::EnteredVehicle(id))
}

/// Step out of the car being driven.
pub fn exit_vehicle(ctx: &mut SimContext, world: &mut World) -> Option<SessionEvent> {
    if ctx.mode() != Mode::Driving {
        return None;
    }
    let id = world.active_vehicle.take()?;
    let offset = ctx.tuning.interaction.exit_offset;
    let car = world.vehicle_mut(id)?;
    car.occupied = false;
    car.reset_controls();
    let exit = car.exit_position(offset);

    world.player.visible = true;
    world.player.teleport(Vec3::new(exit.x, 0.0, exit.z));
    ctx.set_mode(Mode::Walking);
    tracing::info!(vehicle = id.0, "exited vehicle");
    Some(SessionEvent::ExitedVehicle(id))
}

/// Go inside a friend's house.
pub fn visit_house(ctx: &mut SimContext, world: &mut World, index: usize) -> Option<SessionEvent> {
    if ctx.mode() != Mode::Walking {
        return None;
    }
    let name = world.houses.get(index)?.friend.name.clone();
    world.visiting = Some(index);
    world.player.teleport(interior::SPAWN);
    world.player.grounded = true;
    ctx.set_mode(Mode::Indoor);
    tracing::info!(friend = %name, "visiting house");
    Some(SessionEvent::EnteredHouse { friend: name })
}

/// Walk back out onto the doorstep.
pub fn leave_house(ctx: &mut SimContext, world: &mut World) -> Option<SessionEvent> {
    if ctx.mode() != Mode::Indoor {
        return None;
    }
    let house = world.visiting.take().and_then(|i| world.houses.get(i))?;
    let name = house.friend.name.clone();
    let doorstep = house.doorstep();
    world.player.teleport(doorstep);
    ctx.set_mode(Mode::Walking);
    tracing::info!(friend = %name, "left house");
    Some(SessionEvent::LeftHouse { friend: name })
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::world::WorldLayout;

    fn setup() -> (SimContext, World) {
        let mut rng = StdRng::seed_from_u64(0);
        let world = World::from_layout(&WorldLayout::city(), &mut rng);
        (SimContext::default(), world)
    }

    #[test]
    fn test_nothing_in_reach_at_spawn() {
        let (ctx, world) = setup();
        assert!(find_nearest(&ctx, &world).is_none());
    }

    #[test]
    fn test_nearest_car_and_prompt() {
        let (ctx, mut world) = setup();
        world.player.position = Vec3::new(22.0, 0.0, 20.0);
        let nearest = find_nearest(&ctx, &world).unwrap();
        assert_eq!(nearest.target, Interactable::Vehicle(VehicleId(0)));
        assert!((nearest.distance - 2.0).abs() < 1e-4);
        assert_eq!(prompt(&world, &nearest).unwrap(), "Press E to enter car");
    }

    #[test]
    fn test_npc_closer_than_car_wins() {
        let (ctx, mut world) = setup();
        world.npcs[0].position = Vec3::new(21.0, 0.0, 20.0);
        world.player.position = Vec3::new(22.0, 0.0, 20.0);
        let nearest = find_nearest(&ctx, &world).unwrap();
        assert_eq!(nearest.target, Interactable::Npc(0));
        assert_eq!(prompt(&world, &nearest).unwrap(), "Press F to talk to Mike");
        let dialog = talk(&ctx, &world).unwrap();
        assert_eq!(dialog.name, "Mike");
    }

    #[test]
    fn test_exact_tie_keeps_first_found() {
        let (ctx, mut world) = setup();
        world.vehicles[1].position = Vec3::new(24.0, 0.0, 20.0);
        world.player.position = Vec3::new(22.0, 0.0, 20.0);
        let nearest = find_nearest(&ctx, &world).unwrap();
        assert_eq!(nearest.target, Interactable::Vehicle(VehicleId(0)));
    }

    #[test]
    fn test_enter_and_exit_vehicle() {
        let (mut ctx, mut world) = setup();
        world.player.position = Vec3::new(22.0, 0.0, 20.0);
        world.vehicles[0].throttle = 0.7;
        world.vehicles[0].steer_input = 0.3;

        let event = interact(&mut ctx, &mut world);
        assert_eq!(event, Some(SessionEvent::EnteredVehicle(VehicleId(0))));
        assert_eq!(ctx.mode(), Mode::Driving);
        assert!(world.vehicles[0].occupied);
        assert_eq!(world.vehicles[0].throttle, 0.0);
        assert_eq!(world.vehicles[0].steer_input, 0.0);
        assert!(!world.player.visible);

        // While driving only the active car is offered.
        let nearest = find_nearest(&ctx, &world).unwrap();
        assert_eq!(prompt(&world, &nearest).unwrap(), "Press E to exit car");

        world.player.velocity = Vec3::new(3.0, 0.0, 0.0);
        let event = interact(&mut ctx, &mut world);
        assert_eq!(event, Some(SessionEvent::ExitedVehicle(VehicleId(0))));
        assert_eq!(ctx.mode(), Mode::Walking);
        assert!(!world.vehicles[0].occupied);
        assert!(world.active_vehicle.is_none());
        assert!(world.player.visible);
        assert_eq!(world.player.velocity, Vec3::ZERO);
        assert!(world.player.position.distance(Vec3::new(22.5, 0.0, 20.0)) < 1e-4);
    }

    #[test]
    fn test_visit_and_leave_house() {
        let (mut ctx, mut world) = setup();
        let door = world.houses[0].door_position();
        world.player.position = door + Vec3::new(1.0, 0.0, 0.0);

        let nearest = find_nearest(&ctx, &world).unwrap();
        assert_eq!(prompt(&world, &nearest).unwrap(), "Press E to visit Lester");
        let event = interact(&mut ctx, &mut world);
        assert_eq!(
            event,
            Some(SessionEvent::EnteredHouse {
                friend: "Lester".to_owned()
            })
        );
        assert_eq!(ctx.mode(), Mode::Indoor);
        assert_eq!(world.player.position, interior::SPAWN);

        // Spawn is within reach of the exit door, not the friend.
        let nearest = find_nearest(&ctx, &world).unwrap();
        assert_eq!(nearest.target, Interactable::Exit);
        assert_eq!(prompt(&world, &nearest).unwrap(), "Press E to go outside");

        world.player.position = interior::FRIEND + Vec3::new(0.0, 0.0, 1.0);
        assert_eq!(talk(&ctx, &world).unwrap().name, "Lester");

        world.player.position = interior::EXIT_DOOR - Vec3::new(0.0, 0.0, 1.0);
        let event = interact(&mut ctx, &mut world);
        assert!(matches!(event, Some(SessionEvent::LeftHouse { .. })));
        assert_eq!(ctx.mode(), Mode::Walking);
        assert!(world.visiting.is_none());
    }

    #[test]
    fn test_talk_ignores_cars() {
        let (ctx, mut world) = setup();
        world.player.position = Vec3::new(22.0, 0.0, 20.0);
        assert!(talk(&ctx, &world).is_none());
    }
}
