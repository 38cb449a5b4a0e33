//! Named districts for the HUD.

use std::fmt;

use glam::Vec2;

use crate::terrain::GroundSampler;

const LAKE_CENTER: Vec2 = Vec2::new(-180.0, -150.0);

/// District a position falls in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum District {
    Airport,
    Beach,
    River,
    Lake,
    Downtown,
    Vinewood,
    MountChiliad,
    VinewoodHills,
    BlaineCounty,
    RockfordHills,
    /// Inside a house.
    Interior,
}

impl District {
    /// Classify an outdoor position. Rules are checked in order.
    pub fn at(x: f32, z: f32, ground: &dyn GroundSampler) -> Self {
        let r = x.hypot(z);
        if x < -150.0 && z < -100.0 {
            District::Airport
        } else if z > 200.0 {
            District::Beach
        } else if ground.is_water(x, z) {
            District::River
        } else if Vec2::new(x, z).distance(LAKE_CENTER) < 40.0 {
            District::Lake
        } else if r < 50.0 && z < 0.0 {
            District::Downtown
        } else if r < 100.0 {
            District::Vinewood
        } else if r > 200.0 {
            let height = ground.height_at(x, z);
            if height > 30.0 {
                District::MountChiliad
            } else if height > 15.0 {
                District::VinewoodHills
            } else {
                District::BlaineCounty
            }
        } else {
            District::RockfordHills
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            District::Airport => "Los Santos Airport",
            District::Beach => "Vespucci Beach",
            District::River => "Zancudo River",
            District::Lake => "Mirror Park Lake",
            District::Downtown => "Downtown Los Santos",
            District::Vinewood => "Vinewood",
            District::MountChiliad => "Mount Chiliad",
            District::VinewoodHills => "Vinewood Hills",
            District::BlaineCounty => "Blaine County",
            District::RockfordHills => "Rockford Hills",
            District::Interior => "Indoors",
        }
    }
}

impl fmt::Display for District {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{FlatGround, HeightFn};

    #[test]
    fn test_rule_order() {
        let flat = FlatGround::default();
        assert_eq!(District::at(-200.0, -120.0, &flat), District::Airport);
        assert_eq!(District::at(0.0, 250.0, &flat), District::Beach);
        assert_eq!(District::at(-145.0, -150.0, &flat), District::Lake);
        assert_eq!(District::at(10.0, -10.0, &flat), District::Downtown);
        assert_eq!(District::at(10.0, 10.0, &flat), District::Vinewood);
        assert_eq!(District::at(150.0, 0.0, &flat), District::RockfordHills);
        assert_eq!(District::at(250.0, 0.0, &flat), District::BlaineCounty);
    }

    #[test]
    fn test_outer_ring_uses_height() {
        let high = HeightFn(|_: f32, _: f32| 40.0_f32);
        let mid = HeightFn(|_: f32, _: f32| 20.0_f32);
        assert_eq!(District::at(300.0, 0.0, &high), District::MountChiliad);
        assert_eq!(District::at(300.0, 0.0, &mid), District::VinewoodHills);
    }

    #[test]
    fn test_water_names_the_river() {
        struct AllWater;
        impl GroundSampler for AllWater {
            fn height_at(&self, _x: f32, _z: f32) -> f32 {
                0.0
            }
            fn is_water(&self, _x: f32, _z: f32) -> bool {
                true
            }
        }
        assert_eq!(District::at(0.0, 120.0, &AllWater), District::River);
        assert_eq!(District::Downtown.to_string(), "Downtown Los Santos");
    }
}
