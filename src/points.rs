use std::f32::consts::{PI, TAU};

use glam::{vec3, Vec3};
use rand::Rng;

use crate::error::{ensure_positive, ConfigError};

/// Upper bound on the instances a single blob can hold.
pub const MAX_PARTICLES: usize = 70_000;

/// Fixed set of per-instance offsets scattered over a spherical shell.
///
/// `phi` and `theta` are sampled uniformly, so points bunch up towards the
/// poles. The offsets never change after construction; only the number of
/// instances submitted for drawing does.
#[derive(Debug, Clone)]
pub struct SphericalPointSet {
    points: Vec<Vec3>,
    radius: f32,
    visible_count: usize,
}

impl SphericalPointSet {
    pub fn generate<R>(capacity: usize, radius: f32, rng: &mut R) -> Result<Self, ConfigError>
    where
        R: Rng + ?Sized,
    {
        if capacity > MAX_PARTICLES {
            return Err(ConfigError::invalid(
                "capacity",
                format!("{} exceeds the maximum of {}", capacity, MAX_PARTICLES),
            ));
        }
        ensure_positive("blob_size", radius)?;

        let points = (0..capacity)
            .map(|_| {
                let phi = rng.gen_range(0.0..PI);
                let theta = rng.gen_range(0.0..TAU);
                spherical_to_cartesian(radius, phi, theta)
            })
            .collect::<Vec<_>>();

        Ok(Self {
            points,
            radius,
            visible_count: capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn visible_points(&self) -> &[Vec3] {
        &self.points[..self.visible_count]
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Clamps `count` into `[0, capacity]` and returns the effective count.
    pub fn set_visible_count(&mut self, count: i64) -> usize {
        self.visible_count = count.clamp(0, self.capacity() as i64) as usize;
        self.visible_count
    }
}

/// `phi` is the polar angle measured from +Y, `theta` the azimuth in the XZ plane.
pub fn spherical_to_cartesian(radius: f32, phi: f32, theta: f32) -> Vec3 {
    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();
    vec3(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta) * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    fn rng() -> Pcg64Mcg {
        Pcg64Mcg::seed_from_u64(7)
    }

    #[test]
    fn points_lie_on_the_shell() {
        let mut rng = rng();
        for &(capacity, radius) in &[(1, 0.5), (100, 1.0), (2_000, 500.0), (10, 12_345.0)] {
            let set = SphericalPointSet::generate(capacity, radius, &mut rng).unwrap();
            assert_eq!(set.capacity(), capacity);
            assert_eq!(set.radius(), radius);
            for p in set.points() {
                let error = (p.length() - radius).abs();
                assert!(error <= radius * 1e-5, "|{:?}| != {}", p, radius);
            }
        }
    }

    #[test]
    fn full_capacity_is_accepted() {
        let set = SphericalPointSet::generate(MAX_PARTICLES, 500.0, &mut rng()).unwrap();
        assert_eq!(set.capacity(), MAX_PARTICLES);
        assert_eq!(set.visible_count(), MAX_PARTICLES);
    }

    #[test]
    fn rejects_oversized_capacity() {
        let err = SphericalPointSet::generate(MAX_PARTICLES + 1, 1.0, &mut rng()).unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn rejects_non_positive_radius() {
        assert!(SphericalPointSet::generate(10, 0.0, &mut rng()).is_err());
        assert!(SphericalPointSet::generate(10, -3.0, &mut rng()).is_err());
        assert!(SphericalPointSet::generate(10, f32::NAN, &mut rng()).is_err());
    }

    #[test]
    fn visible_count_is_clamped() {
        let mut set = SphericalPointSet::generate(50, 1.0, &mut rng()).unwrap();
        assert_eq!(set.set_visible_count(-5), 0);
        assert!(set.visible_points().is_empty());
        assert_eq!(set.set_visible_count(150), 50);
        assert_eq!(set.set_visible_count(20), 20);
        assert_eq!(set.visible_points().len(), 20);
    }

    #[test]
    fn resizing_leaves_points_untouched() {
        let mut set = SphericalPointSet::generate(64, 2.0, &mut rng()).unwrap();
        let before = set.points().to_vec();
        set.set_visible_count(3);
        set.set_visible_count(64);
        assert_eq!(set.points(), before.as_slice());
    }

    #[test]
    fn axis_convention() {
        let north = spherical_to_cartesian(2.0, 0.0, 1.0);
        assert!((north - vec3(0.0, 2.0, 0.0)).length() < 1e-6);
        let equator = spherical_to_cartesian(1.0, PI / 2.0, 0.0);
        assert!((equator - vec3(1.0, 0.0, 0.0)).length() < 1e-6);
    }
}
