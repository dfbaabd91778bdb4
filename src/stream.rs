use std::time::Duration;

/// Events paired with the delay since the previous event.
pub struct Stream<'a, E: 'a>(Box<dyn Iterator<Item = (Duration, E)> + 'a>);

impl<'a, E: 'a> Stream<'a, E> {
  pub fn chain(self, other: Self) -> Self {
    Self::from_iter(self.into_iter().chain(other))
  }
  pub fn from_iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = (Duration, E)>,
    I::IntoIter: 'a,
  {
    Self(Box::new(iter.into_iter()))
  }
  pub fn immediate(event: E) -> Self {
    Self::from_iter(std::iter::once((Duration::from_secs(0), event)))
  }
  /// One event pair per item, back to back: `start` now, `stop` after `step`.
  pub fn sequence<T, I, F, G>(items: I, step: Duration, mut start: F, mut stop: G) -> Self
  where
    I: IntoIterator<Item = T>,
    I::IntoIter: 'a,
    F: FnMut(&T) -> E + 'a,
    G: FnMut(&T) -> E + 'a,
  {
    Self::from_iter(items.into_iter().flat_map(move |item| {
      vec![(Duration::from_secs(0), start(&item)), (step, stop(&item))]
    }))
  }
}

impl<'a, E: 'a> IntoIterator for Stream<'a, E> {
  type Item = (Duration, E);
  type IntoIter = Box<dyn Iterator<Item = (Duration, E)> + 'a>;
  fn into_iter(self) -> Self::IntoIter {
    self.0
  }
}

#[test]
fn test_sequence() {
  let beat = Duration::from_millis(500);
  let events: Vec<_> = Stream::immediate(0)
    .chain(Stream::sequence(vec![60, 65], beat, |note: &i32| *note, |note: &i32| -note))
    .into_iter()
    .collect();
  let zero = Duration::from_secs(0);
  assert_eq!(
    events,
    vec![(zero, 0), (zero, 60), (beat, -60), (zero, 65), (beat, -65)]
  );
}
