use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// The DNS name or IP address of the machine hosting a spawned actor.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize)]
pub enum Host {
  DNS(String),
  IP(IpAddr),
}
impl From<String> for Host {
  fn from(s: String) -> Self {
    match IpAddr::from_str(s.as_str()) {
      Ok(ip) => Host::IP(ip),
      Err(_) => Host::DNS(s),
    }
  }
}
impl From<&str> for Host {
  fn from(s: &str) -> Self {
    Host::from(s.to_string())
  }
}
impl fmt::Display for Host {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Host::DNS(s) => write!(f, "{}", s),
      Host::IP(ip) => write!(f, "{}", ip),
    }
  }
}

/// The address of a running actor. Assigned by the [`Network`](crate::core::Network) at spawn
/// time and never reused within a run, even after the actor terminates.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize)]
pub struct PeerId {
  /// The machine the actor was spawned on.
  pub host: Host,
  /// Unique among all actors spawned on the same [`Network`](crate::core::Network).
  pub id: u64,
}
impl PeerId {
  pub fn new(host: Host, id: u64) -> PeerId {
    PeerId { host: host, id: id }
  }
}
impl fmt::Display for PeerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}#{}", self.host, self.id)
  }
}

#[test]
fn test_host_parsing() {
  use std::net::Ipv4Addr;
  assert_eq!(
    Host::from("127.0.0.1"),
    Host::IP(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)))
  );
  assert_eq!(Host::from("localhost"), Host::DNS("localhost".to_string()));
  assert_eq!(PeerId::new(Host::from("node-a"), 7).to_string(), "node-a#7");
}
