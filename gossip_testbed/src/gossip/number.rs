use crate::core::PeerId;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A gossiped value, tagged with the node that drew it.
///
/// Numbers are ordered by value first and origin second. Equality and hashing look at the exact
/// bit pattern of the value, so the order, equality and hash all agree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Number {
  pub origin: PeerId,
  pub value: f64,
}
impl Number {
  pub fn new(origin: PeerId, value: f64) -> Number {
    Number {
      origin: origin,
      value: value,
    }
  }
}
impl PartialEq for Number {
  fn eq(&self, other: &Self) -> bool {
    self.value.to_bits() == other.value.to_bits() && self.origin == other.origin
  }
}
impl Eq for Number {}
impl Hash for Number {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.value.to_bits().hash(state);
    self.origin.hash(state);
  }
}
impl PartialOrd for Number {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}
impl Ord for Number {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .value
      .total_cmp(&other.value)
      .then_with(|| self.origin.cmp(&other.origin))
  }
}

/// What a node reports when told to dump: how many distinct numbers it holds and their
/// rank-weighted sum.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
  pub count: usize,
  pub sum: f64,
}
impl fmt::Display for Aggregate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} numbers received, weighted sum {}", self.count, self.sum)
  }
}

/// Sorts ascending and sums `rank * value`, ranks starting at 1.
pub fn aggregate<'a, I>(received: I) -> Aggregate
where
  I: IntoIterator<Item = &'a Number>,
{
  received
    .into_iter()
    .sorted()
    .enumerate()
    .fold(Aggregate { count: 0, sum: 0.0 }, |acc, (i, n)| Aggregate {
      count: acc.count + 1,
      sum: acc.sum + (i + 1) as f64 * n.value,
    })
}

/// A node's final output, emitted once per dump request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
  pub from: PeerId,
  pub aggregate: Aggregate,
}
impl fmt::Display for Report {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.from, self.aggregate)
  }
}
