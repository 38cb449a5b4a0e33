use glam::Vec3;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::math::per_tick_decay;

/// Decaying random positional jitter.
#[derive(Clone, Debug)]
pub struct Shake {
    intensity: f32,
    decay: f32,
    offset: Vec3,
    rng: StdRng,
}

impl Shake {
    /// Idle shake with a seeded generator.
    pub fn new(seed: u64) -> Self {
        Self {
            intensity: 0.0,
            decay: 5.0,
            offset: Vec3::ZERO,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Start or extend a shake. Keeps the stronger of the current and
    /// requested intensity and replaces the decay rate.
    pub fn trigger(&mut self, intensity: f32, decay: f32) {
        self.intensity = self.intensity.max(intensity);
        self.decay = decay;
    }

    /// Re-roll the offset inside a cube of side `2 * intensity`, then decay
    /// the intensity linearly.
    pub fn update(&mut self, dt: f32) {
        let i = self.intensity;
        if i > 0.0 {
            self.offset = Vec3::new(
                self.rng.random_range(-i..=i),
                self.rng.random_range(-i..=i),
                self.rng.random_range(-i..=i),
            );
            self.intensity = (i - self.decay * dt).max(0.0);
        } else {
            self.offset *= per_tick_decay(0.9, dt);
        }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// Current positional offset.
    pub fn offset(&self) -> Vec3 {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_trigger_takes_max_and_overwrites_decay() {
        let mut shake = Shake::new(3);
        shake.trigger(0.5, 5.0);
        shake.trigger(0.2, 10.0);
        assert_eq!(shake.intensity(), 0.5);
        assert_eq!(shake.decay(), 10.0);
        shake.trigger(0.8, 2.0);
        assert_eq!(shake.intensity(), 0.8);
    }

    #[test]
    fn test_offset_stays_in_cube_and_decays_linearly() {
        let mut shake = Shake::new(42);
        shake.trigger(1.0, 5.0);
        let mut ticks = 0;
        while shake.intensity() > 0.0 {
            let bound = shake.intensity();
            shake.update(DT);
            assert!(shake.offset().abs().max_element() <= bound);
            ticks += 1;
        }
        // 1.0 at 5 per second is gone after 0.2 s.
        assert!((11..=13).contains(&ticks));

        for _ in 0..300 {
            shake.update(DT);
        }
        assert!(shake.offset().length() < 1e-6);
    }

    #[test]
    fn test_seeded_offsets_repeat() {
        let mut a = Shake::new(9);
        let mut b = Shake::new(9);
        a.trigger(0.3, 1.0);
        b.trigger(0.3, 1.0);
        a.update(DT);
        b.update(DT);
        assert_eq!(a.offset(), b.offset());
    }
}
