#![allow(dead_code)]
use async_trait::async_trait;
use crossbeam::channel::{unbounded, Receiver, Sender};
use gossip_testbed::core::{
  Actor, ActorContext, Host, Network, NetworkConfig, PeerId, Spawnable,
};
use gossip_testbed::gossip::GossipMsg;
use gossip_testbed::testkit::LogLevel;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Runtime;

pub type Observed = (PeerId, GossipMsg);

static PROBES: Mutex<Vec<(u64, Sender<Observed>)>> = Mutex::new(Vec::new());
static NEXT_PROBE: AtomicU64 = AtomicU64::new(0);

/// Forwards everything it receives to the test that spawned it.
pub struct Probe {
  key: u64,
}
impl Spawnable for Probe {
  type Msg = GossipMsg;
  type Params = u64;

  fn from_params(key: u64) -> Self {
    Probe { key: key }
  }

  fn down_msg(peer: PeerId) -> Option<GossipMsg> {
    Some(GossipMsg::PeerDown(peer))
  }
}
#[async_trait]
impl Actor<GossipMsg> for Probe {
  async fn recv(&mut self, ctx: &ActorContext<GossipMsg>, msg: GossipMsg) {
    let probes = PROBES.lock();
    if let Some((_, tx)) = probes.iter().find(|(k, _)| *k == self.key) {
      let _ = tx.send((ctx.id.clone(), msg));
    }
  }
}

pub fn spawn_probe(net: &Network, host: &Host) -> (PeerId, Receiver<Observed>) {
  let key = NEXT_PROBE.fetch_add(1, Ordering::Relaxed);
  let (tx, rx) = unbounded();
  PROBES.lock().push((key, tx));
  let id = net.spawn::<Probe>(host, &key).unwrap();
  (id, rx)
}

pub fn network(config: NetworkConfig) -> (Runtime, Network) {
  let rt = config.runtime().unwrap();
  let net = Network::new(rt.handle().clone(), config);
  (rt, net)
}

pub fn quiet_network() -> (Runtime, Network) {
  let mut config = NetworkConfig::default();
  config.workers = 4;
  config.log_level = LogLevel::Warn;
  network(config)
}

pub fn localhost() -> Host {
  Host::from("localhost")
}
