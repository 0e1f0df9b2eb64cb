use crate::core::Host;
use im::HashMap;
use serde::{Deserialize, Serialize};

/// Whether a send goes through the failure injector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureMode {
  /// Each message is dropped with the probability configured for its recipient's host.
  Message,
  None,
}

#[derive(Default, Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct FailureConfig {
  pub drop_prob: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FailureConfigMap {
  pub cluster_wide: FailureConfig,
  pub node_wide: HashMap<Host, FailureConfig>,
}
impl FailureConfigMap {
  pub fn get(&self, host: &Host) -> &FailureConfig {
    self.node_wide.get(host).unwrap_or(&self.cluster_wide)
  }
}

#[test]
fn test_host_override() {
  let mut map = FailureConfigMap::default();
  map.cluster_wide.drop_prob = 0.25;
  map
    .node_wide
    .insert(Host::from("flaky"), FailureConfig { drop_prob: 0.9 });
  assert_eq!(map.get(&Host::from("flaky")).drop_prob, 0.9);
  assert_eq!(map.get(&Host::from("steady")).drop_prob, 0.25);
}
