//! Entities of a running session and the layout they are built from.

use std::{
    f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_4, PI},
    path::Path,
};

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    locomotion::PlayerState,
    npc::{Friend, NpcState},
    vehicle::{VehicleId, VehicleState},
};

/// Fixed interior room shared by every house.
pub mod interior {
    use glam::Vec3;

    pub const ORIGIN: Vec3 = Vec3::new(500.0, 0.0, 500.0);
    pub const SPAWN: Vec3 = Vec3::new(500.0, 0.0, 507.0);
    pub const FRIEND: Vec3 = Vec3::new(503.0, 0.0, 500.0);
    pub const EXIT_DOOR: Vec3 = Vec3::new(500.0, 0.0, 509.9);
}

/// Distance of the door from a house center, along its local +Z.
const DOOR_DISTANCE: f32 = 5.0;
/// How far in front of the door the player reappears.
const DOORSTEP_DISTANCE: f32 = 1.5;

// ============================================================================
// Layout
// ============================================================================

/// Where a car is parked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehiclePlacement {
    pub position: Vec3,
    #[serde(default)]
    pub heading: f32,
}

/// Where an NPC stands and who they are.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NpcPlacement {
    pub position: Vec3,
    pub friend: Friend,
}

/// A friend's house.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub center: Vec3,
    #[serde(default)]
    pub rotation: f32,
    pub friend: Friend,
}

impl House {
    /// World position of the front door.
    pub fn door_position(&self) -> Vec3 {
        self.center + Quat::from_rotation_y(self.rotation) * Vec3::new(0.0, 0.0, DOOR_DISTANCE)
    }

    /// Where the player stands after leaving.
    pub fn doorstep(&self) -> Vec3 {
        self.center
            + Quat::from_rotation_y(self.rotation)
                * Vec3::new(0.0, 0.0, DOOR_DISTANCE + DOORSTEP_DISTANCE)
    }
}

/// Everything needed to populate a world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldLayout {
    pub player_spawn: Vec3,
    #[serde(default)]
    pub vehicles: Vec<VehiclePlacement>,
    #[serde(default)]
    pub npcs: Vec<NpcPlacement>,
    #[serde(default)]
    pub houses: Vec<House>,
}

impl WorldLayout {
    /// The reference city: six cars, five friends on the street and two
    /// houses.
    pub fn city() -> Self {
        let car = |x: f32, z: f32, heading: f32| VehiclePlacement {
            position: Vec3::new(x, 0.0, z),
            heading,
        };
        let vehicles = vec![
            car(20.0, 20.0, 0.0),
            car(-30.0, 10.0, FRAC_PI_4),
            car(50.0, -20.0, -FRAC_PI_2),
            car(-15.0, -45.0, 0.0),
            car(70.0, 35.0, PI),
            car(-60.0, -30.0, FRAC_PI_3),
        ];

        let roster = Friend::roster();
        let spots = [
            (15.0, -25.0),
            (-20.0, 15.0),
            (40.0, 40.0),
            (-45.0, -20.0),
            (60.0, -40.0),
        ];
        let npcs = spots
            .iter()
            .enumerate()
            .map(|(i, &(x, z))| NpcPlacement {
                position: Vec3::new(x, 0.0, z),
                friend: roster[i % roster.len()].clone(),
            })
            .collect();

        let houses = vec![
            House {
                center: Vec3::new(-80.0, 0.0, 40.0),
                rotation: 0.0,
                friend: roster[3].clone(),
            },
            House {
                center: Vec3::new(90.0, 0.0, -60.0),
                rotation: PI,
                friend: roster[4].clone(),
            },
        ];

        Self {
            player_spawn: Vec3::ZERO,
            vehicles,
            npcs,
            houses,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| Error::Parse {
            path: "<inline>".into(),
            source,
        })
    }

    /// Load a layout from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layout = serde_json::from_str(&text).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loaded world layout");
        Ok(layout)
    }
}

impl Default for WorldLayout {
    fn default() -> Self {
        Self::city()
    }
}

// ============================================================================
// World
// ============================================================================

/// Live entities of one session.
#[derive(Clone, Debug)]
pub struct World {
    pub player: PlayerState,
    pub vehicles: Vec<VehicleState>,
    pub npcs: Vec<NpcState>,
    pub houses: Vec<House>,
    /// The car being driven.
    pub active_vehicle: Option<VehicleId>,
    /// Index of the house being visited.
    pub visiting: Option<usize>,
}

impl World {
    /// Populate a world from a layout. `rng` seeds NPC idle phases.
    pub fn from_layout<R: Rng + ?Sized>(layout: &WorldLayout, rng: &mut R) -> Self {
        let vehicles = layout
            .vehicles
            .iter()
            .map(|p| VehicleState::new(p.position, p.heading))
            .collect();
        let npcs = layout
            .npcs
            .iter()
            .map(|p| NpcState::new(p.position, p.friend.clone(), rng))
            .collect();
        Self {
            player: PlayerState::new(layout.player_spawn),
            vehicles,
            npcs,
            houses: layout.houses.clone(),
            active_vehicle: None,
            visiting: None,
        }
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&VehicleState> {
        self.vehicles.get(id.0)
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut VehicleState> {
        self.vehicles.get_mut(id.0)
    }

    /// The car being driven, if any.
    pub fn active(&self) -> Option<&VehicleState> {
        self.active_vehicle.and_then(|id| self.vehicle(id))
    }

    /// Friend waiting in the interior room.
    pub fn indoor_friend(&self) -> Option<&Friend> {
        self.visiting
            .and_then(|i| self.houses.get(i))
            .map(|house| &house.friend)
    }

    /// Position of whatever the player controls.
    pub fn focus_position(&self) -> Vec3 {
        self.active().map_or(self.player.position, |car| car.position)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn test_city_layout() {
        let layout = WorldLayout::city();
        assert_eq!(layout.vehicles.len(), 6);
        assert_eq!(layout.npcs.len(), 5);
        assert_eq!(layout.houses.len(), 2);
        let names: Vec<_> = layout.npcs.iter().map(|n| n.friend.name.as_str()).collect();
        assert_eq!(names, ["Mike", "Frank", "Trevor", "Lester", "Amanda"]);
    }

    #[test]
    fn test_door_follows_rotation() {
        let house = House {
            center: Vec3::new(10.0, 0.0, 10.0),
            rotation: PI,
            friend: Friend::roster().remove(0),
        };
        assert!(house.door_position().distance(Vec3::new(10.0, 0.0, 5.0)) < 1e-4);
        assert!(house.doorstep().distance(Vec3::new(10.0, 0.0, 3.5)) < 1e-4);
    }

    #[test]
    fn test_layout_json_round_trip_and_defaults() {
        let json = r#"{ "player_spawn": [1.0, 0.0, 2.0],
                        "vehicles": [{ "position": [5.0, 0.0, 5.0] }] }"#;
        let layout = WorldLayout::from_json_str(json).unwrap();
        assert_eq!(layout.player_spawn, Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(layout.vehicles[0].heading, 0.0);
        assert!(layout.npcs.is_empty());

        let err = WorldLayout::from_json_str("{").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_world_from_layout() {
        let mut rng = StdRng::seed_from_u64(0);
        let world = World::from_layout(&WorldLayout::city(), &mut rng);
        assert_eq!(world.vehicles.len(), 6);
        assert!(world.vehicles.iter().all(|v| !v.occupied));
        assert!(world.active().is_none());
        assert_eq!(world.focus_position(), Vec3::ZERO);
        assert!(world.indoor_friend().is_none());
    }
}
