use crate::core::{Network, PeerId, SendError};
use crate::gossip::{aggregate, Aggregate, GossipMsg, NodeState, Number, TalkState};
use crate::testkit::{FailureMode, LogLevel};
use crate::{debug, trace, warn};
use std::sync::Arc;
use std::time::Duration;

const LOG_LEVEL: LogLevel = LogLevel::Info;

/// What the protocol engine needs from the world: point-to-point sends and failure monitoring.
pub trait Transport: Clone + Send + Sync + 'static {
  fn send(&self, to: &PeerId, msg: &GossipMsg) -> Result<(), SendError>;
  /// Ask to be sent [`GossipMsg::PeerDown`] once `target` terminates.
  fn monitor(&self, watcher: &PeerId, target: &PeerId);
  fn log(&self, level: LogLevel, text: String);
}

/// Sends between peers go through the failure injector; everything else about the network is
/// used as is.
#[derive(Clone)]
pub struct NetTransport {
  pub net: Network,
  pub mode: FailureMode,
}
impl Transport for NetTransport {
  fn send(&self, to: &PeerId, msg: &GossipMsg) -> Result<(), SendError> {
    self.net.send_unreliable(self.mode, to, msg)
  }

  fn monitor(&self, watcher: &PeerId, target: &PeerId) {
    self.net.monitor(watcher, target)
  }

  fn log(&self, level: LogLevel, text: String) {
    self.net.log(level, text)
  }
}

/// The per-node protocol: the message handlers run by the control loop, and the broadcast loop.
/// Both work on the same [`NodeState`].
#[derive(Clone)]
pub struct Engine<T: Transport> {
  state: Arc<NodeState>,
  transport: T,
  interval: Option<Duration>,
}
impl<T: Transport> Engine<T> {
  pub fn new(state: Arc<NodeState>, transport: T, interval: Option<Duration>) -> Engine<T> {
    Engine {
      state: state,
      transport: transport,
      interval: interval,
    }
  }

  pub fn state(&self) -> &Arc<NodeState> {
    &self.state
  }

  /// Handles one inbound message to completion. Returns the aggregate when asked to dump.
  pub async fn handle(&self, msg: GossipMsg) -> Option<Aggregate> {
    match msg {
      GossipMsg::PeerList(ids) => {
        let me = self.state.me();
        for id in ids.iter().filter(|id| *id != me) {
          self.transport.monitor(me, id);
        }
        self.state.set_peers(ids);
      }
      GossipMsg::PeerDown(id) => self.peer_down(&id).await,
      GossipMsg::Number(n) => self.state.record_number(n),
      GossipMsg::Replay(n) => self.state.record_replay(n),
      GossipMsg::Quiesce => {
        self.state.stop_talking();
      }
      GossipMsg::Dump => return Some(aggregate(&self.state.snapshot_received())),
    }
    None
  }

  /// Forwards what we last heard from a dead peer to everyone still alive. This never waits for
  /// membership: if nobody is left, there is nobody to tell.
  async fn peer_down(&self, id: &PeerId) {
    self.state.remove_peer(id);
    let recent = self.state.recent_from(id);
    let peers = self.state.peers_now();
    debug!(
      LOG_LEVEL,
      &self.transport,
      "{}: {} is down, replaying {} numbers to {} peers",
      self.state.me(),
      id,
      recent.len(),
      peers.len()
    );
    for n in recent {
      let _batch = self.state.acquire_broadcast().await;
      self.fan_out(&peers, &GossipMsg::Replay(n));
    }
  }

  fn fan_out(&self, peers: &im::HashSet<PeerId>, msg: &GossipMsg) {
    for peer in peers.iter() {
      if let Err(e) = self.transport.send(peer, msg) {
        trace!(LOG_LEVEL, &self.transport, "{}: skipped send - {}", self.state.me(), e);
      }
    }
  }

  /// Draws, records and broadcasts numbers until the node is quiesced. Once this returns it is
  /// never restarted.
  pub async fn broadcast_loop(self) {
    while self.state.can_talk() {
      let n = Number::new(self.state.me().clone(), self.state.rng().next());
      self.state.record_number(n.clone());
      let peers = self.state.peers().await;
      {
        let _batch = self.state.acquire_broadcast().await;
        self.fan_out(&peers, &GossipMsg::Number(n));
      }
      match self.interval {
        Some(d) => tokio::time::sleep(d).await,
        None => tokio::task::yield_now().await,
      }
    }
    if self.state.talk_state() != TalkState::Quiesced {
      warn!(
        LOG_LEVEL,
        &self.transport,
        "{}: broadcast loop started before talking",
        self.state.me()
      );
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::core::Host;
  use parking_lot::Mutex;

  /// Records every send and monitor request instead of performing it.
  #[derive(Clone, Default)]
  pub(crate) struct Recorder {
    pub sent: Arc<Mutex<Vec<(PeerId, GossipMsg)>>>,
    pub monitored: Arc<Mutex<Vec<(PeerId, PeerId)>>>,
    pub dead: Arc<Mutex<Vec<PeerId>>>,
  }
  impl Transport for Recorder {
    fn send(&self, to: &PeerId, msg: &GossipMsg) -> Result<(), SendError> {
      if self.dead.lock().contains(to) {
        return Err(SendError::Unreachable(to.clone()));
      }
      self.sent.lock().push((to.clone(), msg.clone()));
      Ok(())
    }

    fn monitor(&self, watcher: &PeerId, target: &PeerId) {
      self.monitored.lock().push((watcher.clone(), target.clone()));
    }

    fn log(&self, _: LogLevel, _: String) {}
  }

  fn peer(id: u64) -> PeerId {
    PeerId::new(Host::from("localhost"), id)
  }

  fn engine(me: u64) -> (Engine<Recorder>, Recorder) {
    let rec = Recorder::default();
    let state = Arc::new(NodeState::new(peer(me), 3));
    (Engine::new(state, rec.clone(), None), rec)
  }

  #[test]
  fn test_peer_list_monitors_everyone_but_self() {
    let (e, rec) = engine(1);
    tokio_test::block_on(e.handle(GossipMsg::PeerList(vec![peer(1), peer(2), peer(3)])));
    let mut targets = rec
      .monitored
      .lock()
      .iter()
      .map(|(w, t)| {
        assert_eq!(w, &peer(1));
        t.clone()
      })
      .collect::<Vec<_>>();
    targets.sort();
    assert_eq!(targets, vec![peer(2), peer(3)]);
    assert_eq!(e.state().peers_now(), im::hashset![peer(2), peer(3)]);
  }

  #[test]
  fn test_death_replay() {
    let (a, rec) = engine(1);
    let (b, c) = (peer(2), peer(3));
    tokio_test::block_on(async {
      a.handle(GossipMsg::PeerList(vec![peer(1), b.clone(), c.clone()])).await;
      let from_b = vec![0.11, 0.22, 0.33]
        .into_iter()
        .map(|v| Number::new(b.clone(), v))
        .collect::<Vec<_>>();
      for n in from_b.iter() {
        a.handle(GossipMsg::Number(n.clone())).await;
      }
      rec.dead.lock().push(b.clone());
      a.handle(GossipMsg::PeerDown(b.clone())).await;

      let sent = rec.sent.lock().clone();
      let expected = from_b
        .iter()
        .rev()
        .map(|n| (c.clone(), GossipMsg::Replay(n.clone())))
        .collect::<Vec<_>>();
      assert_eq!(sent, expected);
      assert_eq!(a.state().peers_now(), im::hashset![c.clone()]);
    });
  }

  #[test]
  fn test_replayed_numbers_are_not_replayed_again() {
    let (a, rec) = engine(1);
    tokio_test::block_on(async {
      a.handle(GossipMsg::PeerList(vec![peer(2), peer(3), peer(4)])).await;
      a.handle(GossipMsg::Replay(Number::new(peer(2), 0.5))).await;
      a.handle(GossipMsg::PeerDown(peer(2))).await;
      a.handle(GossipMsg::PeerDown(peer(5))).await;
    });
    assert!(rec.sent.lock().is_empty());
    assert_eq!(a.state().snapshot_received().len(), 1);
  }

  #[test]
  fn test_last_peer_down_does_not_block() {
    let (a, rec) = engine(1);
    tokio_test::block_on(async {
      a.handle(GossipMsg::PeerList(vec![peer(2)])).await;
      a.handle(GossipMsg::Number(Number::new(peer(2), 0.5))).await;
      a.handle(GossipMsg::PeerDown(peer(2))).await;
    });
    assert!(rec.sent.lock().is_empty());
    assert!(a.state().peers_now().is_empty());
  }

  #[test]
  fn test_dump_and_quiesce() {
    let (a, _) = engine(1);
    tokio_test::block_on(async {
      a.handle(GossipMsg::Number(Number::new(peer(2), 0.1))).await;
      a.handle(GossipMsg::Number(Number::new(peer(3), 0.4))).await;
      a.handle(GossipMsg::Replay(Number::new(peer(4), 0.2))).await;
      a.handle(GossipMsg::Number(Number::new(peer(2), 0.1))).await;
      a.state().start_talking();
      assert_eq!(a.handle(GossipMsg::Quiesce).await, None);
      assert!(!a.state().can_talk());
      let agg = a.handle(GossipMsg::Dump).await.unwrap();
      assert_eq!(agg.count, 3);
      assert!((agg.sum - 1.7).abs() < 1e-12);
    });
  }

  #[test]
  fn test_broadcast_loop_stops_when_quiesced() {
    let rt = tokio::runtime::Builder::new_multi_thread()
      .worker_threads(2)
      .enable_all()
      .build()
      .unwrap();
    let _guard = rt.enter();
    let rec = Recorder::default();
    let state = Arc::new(NodeState::new(peer(1), 3));
    let e = Engine::new(state.clone(), rec.clone(), Some(Duration::from_millis(5)));
    state.start_talking();
    let task = rt.spawn(e.broadcast_loop());

    rt.block_on(tokio::time::sleep(Duration::from_millis(100)));
    assert!(rec.sent.lock().is_empty());
    assert_eq!(state.snapshot_received().len(), 1);

    state.set_peers(vec![peer(2), peer(3)]);
    rt.block_on(tokio::time::sleep(Duration::from_millis(100)));
    state.stop_talking();
    rt.block_on(tokio::time::timeout(Duration::from_secs(5), task))
      .unwrap()
      .unwrap();

    let sent = rec.sent.lock().clone();
    assert!(!sent.is_empty());
    let numbers = sent
      .iter()
      .map(|(to, msg)| match msg {
        GossipMsg::Number(n) => {
          assert!(to == &peer(2) || to == &peer(3));
          assert_eq!(n.origin, peer(1));
          n.clone()
        }
        other => panic!("unexpected {:?}", other),
      })
      .collect::<Vec<_>>();
    // every number goes to both peers in one batch
    for pair in numbers.chunks(2) {
      assert_eq!(pair.len(), 2);
      assert_eq!(pair[0], pair[1]);
    }
    let received = state.snapshot_received();
    assert!(numbers.iter().all(|n| received.contains(n)));
    let after = sent.len();
    rt.block_on(tokio::time::sleep(Duration::from_millis(50)));
    assert_eq!(rec.sent.lock().len(), after);
  }
}
