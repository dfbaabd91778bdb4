use crate::interval::Interval;
use crate::phrase::Phrase;
use crate::scale::Scale;
use fnv::FnvHashMap;
use rand::Rng;
use std::collections::BTreeSet;

// Below this many (rotation, phrase) pairs the space is listed outright.
const ENUMERATION_LIMIT: u128 = 4096;
const MAX_SAMPLES: usize = 16;

/// Every phrase of a fixed length whose intervals come from `steps`, whose
/// notes all fall in some transposition of a scale, and whose range stays
/// within a budget.
///
/// The space is searched depth first, one interval per level, once per
/// distinct rotation of the scale that has its tonic set. A branch is cut as
/// soon as the notes so far leave the scale or span more than the budget.
/// Subtree sizes are memoised, so a phrase can be drawn uniformly without
/// listing the whole space.
pub struct PhraseSpace {
  steps: Vec<Interval>,
  tonics: Vec<Scale>,
  interval_count: usize,
  max_range: i64,
  counts: FnvHashMap<Node, u128>,
  listing: Option<Vec<Phrase>>,
}

// Where a partial phrase stands: its current pitch class within one rotation,
// how far it has wandered below and above the current note, and how many
// intervals are still to come.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct Node {
  rotation: usize,
  pitch: i64,
  below: i64,
  above: i64,
  remaining: usize,
}

impl PhraseSpace {
  pub fn new(steps: Vec<Interval>, scale: &Scale, note_count: usize, max_range: i64) -> Self {
    assert!(note_count >= 1);
    Self {
      steps,
      tonics: scale
        .rotations()
        .into_iter()
        .filter(|rotation| rotation.contains_from_tonic(0))
        .collect(),
      interval_count: note_count - 1,
      max_range,
      counts: FnvHashMap::default(),
      listing: None,
    }
  }

  fn root(&self, rotation: usize) -> Node {
    Node {
      rotation,
      pitch: 0,
      below: 0,
      above: 0,
      remaining: self.interval_count,
    }
  }

  fn step(&self, node: Node, interval: Interval) -> Option<Node> {
    let half_steps = interval.half_steps();
    let pitch = node.pitch + half_steps;
    if !self.tonics[node.rotation].contains_from_tonic(pitch) {
      return None;
    }
    let below = (node.below + half_steps).max(0);
    let above = (node.above - half_steps).max(0);
    if below + above > self.max_range {
      return None;
    }
    Some(Node {
      rotation: node.rotation,
      pitch: pitch.rem_euclid(12),
      below,
      above,
      remaining: node.remaining - 1,
    })
  }

  fn count(&mut self, node: Node) -> u128 {
    if node.remaining == 0 {
      return 1;
    }
    if let Some(&count) = self.counts.get(&node) {
      return count;
    }
    let mut total = 0;
    for i in 0..self.steps.len() {
      if let Some(child) = self.step(node, self.steps[i]) {
        total += self.count(child);
      }
    }
    self.counts.insert(node, total);
    total
  }

  /// Number of (rotation, phrase) pairs. A phrase that fits several
  /// rotations is counted once for each.
  pub fn total(&mut self) -> u128 {
    (0..self.tonics.len()).map(|r| self.count(self.root(r))).sum()
  }

  pub fn is_empty(&mut self) -> bool {
    self.total() == 0
  }

  /// Lists every distinct phrase in the space.
  pub fn phrases(&self) -> BTreeSet<Phrase> {
    let mut result = BTreeSet::new();
    let mut path = Vec::with_capacity(self.interval_count);
    for r in 0..self.tonics.len() {
      self.collect(self.root(r), &mut path, &mut result);
    }
    result
  }

  fn collect(&self, node: Node, path: &mut Vec<Interval>, out: &mut BTreeSet<Phrase>) {
    if node.remaining == 0 {
      out.insert(Phrase::new(path.clone()));
      return;
    }
    for &interval in &self.steps {
      if let Some(child) = self.step(node, interval) {
        path.push(interval);
        self.collect(child, path, out);
        path.pop();
      }
    }
  }

  /// Draws one distinct phrase uniformly, or `None` if the space is empty.
  pub fn sample<R: Rng>(&mut self, rng: &mut R) -> Option<Phrase> {
    let total = self.total();
    if total == 0 {
      return None;
    }
    if total <= ENUMERATION_LIMIT {
      if self.listing.is_none() {
        self.listing = Some(self.phrases().into_iter().collect());
      }
      let phrases = self.listing.as_ref()?;
      return Some(phrases[rng.gen_range(0..phrases.len())].clone());
    }
    // Draw a (rotation, phrase) pair, then keep it with probability
    // 1 / (rotations the phrase fits) so each distinct phrase is equally likely.
    let mut phrase = self.nth(rng.gen_range(0..total));
    for _ in 1..MAX_SAMPLES {
      let fits = self.rotations_fitting(&phrase);
      if fits <= 1 || rng.gen_range(0..fits) == 0 {
        break;
      }
      phrase = self.nth(rng.gen_range(0..total));
    }
    Some(phrase)
  }

  fn rotations_fitting(&self, phrase: &Phrase) -> usize {
    let shape = phrase.scale();
    self
      .tonics
      .iter()
      .filter(|rotation| rotation.contains_without_rotation(&shape))
      .count()
  }

  // The `index`th (rotation, phrase) pair in depth-first order.
  fn nth(&mut self, mut index: u128) -> Phrase {
    let mut node = None;
    for r in 0..self.tonics.len() {
      let count = self.count(self.root(r));
      if index < count {
        node = Some(self.root(r));
        break;
      }
      index -= count;
    }
    let mut node = match node {
      Some(node) => node,
      None => panic!("phrase index out of range"),
    };
    let mut intervals = Vec::with_capacity(self.interval_count);
    while node.remaining > 0 {
      for i in 0..self.steps.len() {
        let interval = self.steps[i];
        if let Some(child) = self.step(node, interval) {
          let count = self.count(child);
          if index < count {
            intervals.push(interval);
            node = child;
            break;
          }
          index -= count;
        }
      }
    }
    Phrase::new(intervals)
  }
}

#[cfg(test)]
fn steps(half_steps: &[i64]) -> Vec<Interval> {
  half_steps.iter().copied().map(Interval::new).collect()
}

#[test]
fn test_fourths_and_fifths() {
  let space = PhraseSpace::new(steps(&[-7, -5, 5, 7]), &Scale::CHROMATIC, 2, 38);
  let phrases: Vec<_> = space.phrases().into_iter().map(|p| p.to_string()).collect();
  assert_eq!(phrases, vec!["P5\u{2193}", "P4\u{2193}", "P4\u{2191}", "P5\u{2191}"]);
}

#[test]
fn test_range_budget_prunes() {
  let mut space = PhraseSpace::new(steps(&[5, 7]), &Scale::CHROMATIC, 3, 12);
  let phrases = space.phrases();
  assert_eq!(phrases.len(), 3);
  assert!(phrases.iter().all(|p| p.range() <= 12));
  assert_eq!(space.total(), 3);
}

#[test]
fn test_scale_prunes() {
  let mut space = PhraseSpace::new(steps(&[1, 2]), &Scale::PENTATONIC, 2, 38);
  assert_eq!(space.phrases().len(), 1);
  let mut empty = PhraseSpace::new(steps(&[1]), &Scale::PENTATONIC, 3, 38);
  assert!(empty.is_empty());
  assert_eq!(empty.sample(&mut rand::thread_rng()), None);
  assert!(!space.is_empty());
}

#[test]
fn test_counts_match_enumeration() {
  let all: Vec<_> = (-12..=12).map(Interval::new).collect();
  for (_, scale) in Scale::catalog() {
    for &note_count in &[2, 3, 4] {
      let mut space = PhraseSpace::new(all.clone(), scale, note_count, 14);
      let phrases = space.phrases();
      let pairs: usize = phrases.iter().map(|p| space.rotations_fitting(p)).sum();
      assert_eq!(space.total(), pairs as u128, "{} {}", scale, note_count);
      for p in &phrases {
        assert!(p.can_transpose_to(scale));
        assert!(p.range() <= 14);
        assert_eq!(p.note_count(), note_count);
      }
    }
  }
}

#[test]
fn test_nth_walks_every_pair() {
  let mut space = PhraseSpace::new(steps(&[-4, -3, 0, 3, 4]), &Scale::MAJOR, 3, 8);
  let total = space.total();
  let walked: BTreeSet<_> = (0..total).map(|i| space.nth(i)).collect();
  assert_eq!(walked, space.phrases());
}

#[test]
fn test_large_space_samples_are_legal() {
  use rand::SeedableRng;
  let mut rng = rand::rngs::SmallRng::seed_from_u64(3);
  let all: Vec<_> = (-12..=12).map(Interval::new).collect();
  let mut space = PhraseSpace::new(all, &Scale::BLUES, 10, 20);
  assert!(space.total() > ENUMERATION_LIMIT);
  for _ in 0..50 {
    let p = space.sample(&mut rng).unwrap();
    assert_eq!(p.note_count(), 10);
    assert!(p.range() <= 20);
    assert!(p.can_transpose_to(&Scale::BLUES));
  }
}

#[test]
fn test_sampling_is_spread_and_reproducible() {
  use rand::SeedableRng;
  let mut space = PhraseSpace::new(steps(&[-7, -5, 5, 7]), &Scale::CHROMATIC, 2, 38);
  let draw = |space: &mut PhraseSpace, seed| {
    let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);
    (0..400).map(|_| space.sample(&mut rng).unwrap()).collect::<Vec<_>>()
  };
  let first = draw(&mut space, 11);
  assert_eq!(first, draw(&mut space, 11));
  for p in space.phrases() {
    let hits = first.iter().filter(|&q| *q == p).count();
    assert!(hits > 50, "{} drawn {} times", p, hits);
  }
}
