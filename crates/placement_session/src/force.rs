//! Launch impulses applied to simulated bodies before the first tick

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Range of impulse magnitudes and an optional fixed heading.
///
/// The impulse is horizontal: heading `θ` (radians) maps to the unit
/// vector `(sin θ, 0, cos θ)`. Without a heading each body gets its own
/// uniformly random one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchForce {
    pub min: f32,
    pub max: f32,
    pub angle: Option<f32>,
}

impl LaunchForce {
    /// Largest impulse magnitude [`LaunchForce::sample`] will produce
    pub const MAX_MAGNITUDE: f32 = 1.0e6;

    pub fn new(min: f32, max: f32, angle: Option<f32>) -> Self {
        Self { min, max, angle }
    }

    /// No impulse at all
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether every sampled impulse is the zero vector
    pub fn is_zero(&self) -> bool {
        self.min == 0.0 && self.max == 0.0
    }

    /// Draw one impulse.
    ///
    /// Bounds are clamped to `[0, MAX_MAGNITUDE]` (NaN counts as zero) and a
    /// non-finite heading falls back to a random one.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> [f32; 3] {
        let (a, b) = (clamp_magnitude(self.min), clamp_magnitude(self.max));
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let magnitude = if lo < hi { rng.gen_range(lo..=hi) } else { lo };
        let theta = match self.angle {
            Some(angle) if angle.is_finite() => angle,
            _ => rng.gen_range(0.0..TAU),
        };
        let (sin, cos) = theta.sin_cos();
        [sin * magnitude, 0.0, cos * magnitude]
    }
}

fn clamp_magnitude(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, LaunchForce::MAX_MAGNITUDE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zero_force_gives_zero_impulse() {
        let mut rng = StdRng::seed_from_u64(1);
        let force = LaunchForce::none();
        assert!(force.is_zero());
        assert_eq!(force.sample(&mut rng), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fixed_angle_direction() {
        let mut rng = StdRng::seed_from_u64(1);
        let force = LaunchForce::new(2.0, 2.0, Some(std::f32::consts::FRAC_PI_2));
        let impulse = force.sample(&mut rng);

        assert_relative_eq!(impulse[0], 2.0, epsilon = 1e-5);
        assert_eq!(impulse[1], 0.0);
        assert_relative_eq!(impulse[2], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_magnitude_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let force = LaunchForce::new(1.0, 3.0, None);
        for _ in 0..200 {
            let [x, y, z] = force.sample(&mut rng);
            let magnitude = (x * x + y * y + z * z).sqrt();
            assert_eq!(y, 0.0);
            assert!((1.0 - 1e-4..=3.0 + 1e-4).contains(&magnitude), "magnitude {magnitude}");
        }
    }

    #[test]
    fn test_swapped_bounds_are_tolerated() {
        let mut rng = StdRng::seed_from_u64(3);
        let [x, _, z] = LaunchForce::new(4.0, 1.0, Some(0.0)).sample(&mut rng);
        assert_eq!(x, 0.0);
        assert!((1.0..=4.0).contains(&z));
    }

    #[test]
    fn test_unbounded_ranges_do_not_panic() {
        let mut rng = StdRng::seed_from_u64(5);
        let ranges = [
            LaunchForce::new(0.0, f32::INFINITY, None),
            LaunchForce::new(f32::NEG_INFINITY, f32::INFINITY, None),
            LaunchForce::new(-f32::MAX, f32::MAX, Some(1.0)),
            LaunchForce::new(f32::NAN, 2.0, Some(f32::NAN)),
        ];
        for force in ranges {
            for _ in 0..50 {
                let [x, y, z] = force.sample(&mut rng);
                let magnitude = (x * x + y * y + z * z).sqrt();
                assert!(magnitude.is_finite(), "{force:?} gave {magnitude}");
                assert!(magnitude <= LaunchForce::MAX_MAGNITUDE * 1.001);
            }
        }
    }
}
