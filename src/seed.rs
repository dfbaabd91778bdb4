use fnv::FnvHasher;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::hash::{Hash, Hasher};

/// A session seed. Forking by label gives each consumer (question choice,
/// anything added later) its own reproducible stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Seed(u64);

impl Seed {
  const DELIM: u64 = 0xe16013eafc14eeed;
  pub fn new<H: Hash>(seed: H) -> Self {
    Self(0).fork(seed)
  }
  /// A label for an unseeded session; log it to be able to replay the session.
  pub fn random_label() -> u64 {
    rand::random()
  }
  pub fn fork<H: Hash>(&self, route: H) -> Self {
    let mut h = FnvHasher::with_key(self.0);
    Self::DELIM.hash(&mut h);
    route.hash(&mut h);
    Self(h.finish())
  }
  pub fn rng(self) -> SmallRng {
    let mut h = FnvHasher::with_key(self.0);
    Self::DELIM.hash(&mut h);
    SmallRng::seed_from_u64(h.finish())
  }
}

#[test]
fn test_forks_are_reproducible() {
  use rand::Rng;
  let draw = |seed: Seed| seed.rng().gen::<u64>();
  assert_eq!(draw(Seed::new(7u64).fork("questions")), draw(Seed::new(7u64).fork("questions")));
  assert_ne!(draw(Seed::new(7u64).fork("questions")), draw(Seed::new(7u64).fork("other")));
  assert_ne!(draw(Seed::new(7u64)), draw(Seed::new(8u64)));
}
