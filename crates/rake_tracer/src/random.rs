//! Thread-local random sampling.
//!
//! Every thread owns a `SmallRng` seeded from a process-wide counter, so
//! sample sequences are reproducible under a fixed thread count and no
//! locking happens on the sampling hot path.

use std::cell::RefCell;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicU64, Ordering};

use rake_math::Vector3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

static NEXT_SEED: AtomicU64 = AtomicU64::new(0x9d5c_817f);

thread_local! {
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::seed_from_u64(NEXT_SEED.fetch_add(1, Ordering::Relaxed)));
}

/// Uniform double in [0, 1).
#[inline]
pub fn random_double() -> f64 {
    RNG.with(|rng| rng.borrow_mut().gen())
}

/// Uniform double in [min, max).
#[inline]
pub fn random_range(min: f64, max: f64) -> f64 {
    min + (max - min) * random_double()
}

/// Uniform axis index in {0, 1, 2}.
#[inline]
pub fn random_axis() -> usize {
    RNG.with(|rng| rng.borrow_mut().gen_range(0..3))
}

/// Uniform point inside the unit sphere.
///
/// Spherical coordinates with a cube-root radius, so the distribution is
/// uniform over the volume rather than clustered at the center.
pub fn random_in_unit_sphere() -> Vector3 {
    let theta = random_double() * 2.0 * PI;
    let phi = (2.0 * random_double() - 1.0).acos();
    let r = random_double().cbrt();
    Vector3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}

/// Uniform point inside the hemisphere around `normal`.
pub fn random_in_hemisphere(normal: Vector3) -> Vector3 {
    let in_unit_sphere = random_in_unit_sphere();
    if in_unit_sphere.dot(normal) > 0.0 {
        in_unit_sphere
    } else {
        -in_unit_sphere
    }
}

/// Uniform point inside the unit disk (z = 0).
pub fn random_in_unit_disk() -> Vector3 {
    let r = random_range(0.0, 1.0).sqrt();
    let theta = random_range(0.0, 1.0) * 2.0 * PI;
    Vector3::new(r * theta.cos(), r * theta.sin(), 0.0)
}
