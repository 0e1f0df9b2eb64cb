use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A seeded stream of values in the open interval (0, 1). Concurrent callers see one strict
/// sequence: drawing and advancing happen under the same lock.
pub struct RngSource {
  rng: Mutex<SmallRng>,
}
impl RngSource {
  pub fn new(seed: u64) -> RngSource {
    RngSource {
      rng: Mutex::new(SmallRng::seed_from_u64(seed)),
    }
  }

  pub fn next(&self) -> f64 {
    let mut rng = self.rng.lock();
    loop {
      // gen::<f64>() is uniform on [0, 1)
      let x: f64 = rng.gen();
      if x != 0.0 {
        return x;
      }
    }
  }
}

/// Derives a per-node seed from the run seed and the node's identifier.
pub fn mix_seed(seed: u64, id: u64) -> u64 {
  seed ^ id.wrapping_mul(0x9E37_79B9_7F4A_7C15).rotate_left(31)
}
