//! Ground height collaborators.
//!
//! The core only asks two questions of the world: how high is the ground at
//! (x, z), and is that point water. Anything that can answer them can drive
//! player ground contact, vehicle ground hugging and location naming.

use glam::Vec2;

/// Deterministic ground queries.
pub trait GroundSampler {
    /// Ground height at a horizontal position.
    fn height_at(&self, x: f32, z: f32) -> f32;

    /// Whether the position is covered by water.
    fn is_water(&self, _x: f32, _z: f32) -> bool {
        false
    }
}

/// Infinite flat plane.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlatGround {
    /// Plane height.
    pub height: f32,
}

impl GroundSampler for FlatGround {
    fn height_at(&self, _x: f32, _z: f32) -> f32 {
        self.height
    }
}

/// Adapter turning a closure into a [`GroundSampler`].
pub struct HeightFn<F>(pub F);

impl<F> GroundSampler for HeightFn<F>
where
    F: Fn(f32, f32) -> f32,
{
    fn height_at(&self, x: f32, z: f32) -> f32 {
        (self.0)(x, z)
    }
}

// ============================================================================
// Procedural hills
// ============================================================================

/// Radius of the flat city disk.
const CITY_RADIUS: f32 = 150.0;
/// Distance where mountains start rising.
const MOUNTAIN_RADIUS: f32 = 300.0;
/// Center of the lake.
const LAKE_CENTER: Vec2 = Vec2::new(-180.0, -150.0);

/// Reference terrain: a flat city surrounded by hills, mountains, a river and
/// a lake, with ocean to the south.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RollingHills;

impl RollingHills {
    /// Multi-octave sine noise in `[0, 1]`.
    fn noise(x: f32, z: f32, scale: f32, octaves: u32) -> f32 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = scale;
        let mut max_value = 0.0;

        for _ in 0..octaves {
            let nx = (x * frequency * 0.01).sin() * (z * frequency * 0.013).cos();
            let nz = (x * frequency * 0.011).cos() * (z * frequency * 0.012).sin();
            value += ((nx * 10.0 + nz * 10.0).sin() * 0.5 + 0.5) * amplitude;
            max_value += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        value / max_value
    }

    /// X coordinate of the river centerline at a given z.
    fn river_x(z: f32) -> f32 {
        (z * 0.01).sin() * 50.0 + 100.0
    }
}

impl GroundSampler for RollingHills {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        let dist = x.hypot(z);
        if dist < CITY_RADIUS {
            return 0.0;
        }

        let flatten = ((dist - 100.0) / 50.0).min(1.0).powi(2);
        let mut height = Self::noise(x, z, 0.5, 4) * 40.0 * flatten;

        if dist > MOUNTAIN_RADIUS {
            let mountain = (dist - MOUNTAIN_RADIUS) / 100.0;
            height += Self::noise(x, z, 1.0, 3) * 60.0 * mountain.min(1.0);
        }

        let river_dist = (x - Self::river_x(z)).abs();
        if river_dist < 30.0 && dist > 120.0 {
            height = height.min(-2.0 + river_dist * 0.1);
        }

        height.max(0.0)
    }

    fn is_water(&self, x: f32, z: f32) -> bool {
        if (x - Self::river_x(z)).abs() < 12.0 && z > -300.0 && z < 250.0 {
            return true;
        }
        if z > 250.0 {
            return true;
        }
        Vec2::new(x, z).distance(LAKE_CENTER) < 28.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_is_flat() {
        let terrain = RollingHills;
        assert_eq!(terrain.height_at(0.0, 0.0), 0.0);
        assert_eq!(terrain.height_at(100.0, -100.0), 0.0);
    }

    #[test]
    fn test_hills_never_below_zero() {
        let terrain = RollingHills;
        for i in 0..200 {
            let angle = i as f32 * 0.1;
            let radius = 150.0 + i as f32 * 2.0;
            let h = terrain.height_at(angle.cos() * radius, angle.sin() * radius);
            assert!(h >= 0.0 && h.is_finite());
        }
    }

    #[test]
    fn test_river_bed_is_low() {
        let terrain = RollingHills;
        // Centerline at z = -200 is x = 100 + 50 sin(-2).
        let z = -200.0;
        let x = RollingHills::river_x(z);
        assert_eq!(terrain.height_at(x, z), 0.0);
        assert!(terrain.is_water(x, z));
    }

    #[test]
    fn test_water_regions() {
        let terrain = RollingHills;
        assert!(terrain.is_water(0.0, 300.0));
        assert!(terrain.is_water(-180.0, -150.0));
        assert!(!terrain.is_water(0.0, 0.0));
    }

    #[test]
    fn test_height_fn_adapter() {
        let slope = HeightFn(|x: f32, _z: f32| x * 0.5);
        assert!((slope.height_at(4.0, 9.0) - 2.0).abs() < 1e-6);
        assert!(!slope.is_water(4.0, 9.0));
    }
}
