use crate::core::PeerId;
use crate::gossip::{Number, RngSource};
use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::{watch, MutexGuard};

/// How many of a peer's most recent numbers are kept for replay after it dies.
pub const HISTORY: usize = 10;

/// The talk flag. It only ever moves forward: `Idle -> Talking -> Quiesced`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TalkState {
  Idle = 0,
  Talking = 1,
  Quiesced = 2,
}
impl From<u8> for TalkState {
  fn from(x: u8) -> Self {
    match x {
      0 => TalkState::Idle,
      1 => TalkState::Talking,
      _ => TalkState::Quiesced,
    }
  }
}

/// Everything one node knows. Shared by the node's control loop and its broadcast loop; each
/// field group has its own lock, so neither loop holds up the other for longer than one update.
pub struct NodeState {
  me: PeerId,
  peers: watch::Sender<im::HashSet<PeerId>>,
  received: Mutex<HashSet<Number>>,
  talk: AtomicU8,
  rng: RngSource,
  last_seen: Mutex<HashMap<PeerId, SmallVec<[Number; HISTORY]>>>,
  broadcast: tokio::sync::Mutex<()>,
}
impl NodeState {
  pub fn new(me: PeerId, seed: u64) -> NodeState {
    let (peers, _) = watch::channel(im::HashSet::new());
    NodeState {
      me: me,
      peers: peers,
      received: Mutex::new(HashSet::new()),
      talk: AtomicU8::new(TalkState::Idle as u8),
      rng: RngSource::new(seed),
      last_seen: Mutex::new(HashMap::new()),
      broadcast: tokio::sync::Mutex::new(()),
    }
  }

  pub fn me(&self) -> &PeerId {
    &self.me
  }

  pub fn rng(&self) -> &RngSource {
    &self.rng
  }

  /// Replaces the membership. The node itself is never a member of its own peer set.
  pub fn set_peers<I: IntoIterator<Item = PeerId>>(&self, ids: I) {
    let peers = ids
      .into_iter()
      .filter(|id| id != &self.me)
      .collect::<im::HashSet<_>>();
    self.peers.send_replace(peers);
  }

  /// Returns true if `id` was a peer.
  pub fn remove_peer(&self, id: &PeerId) -> bool {
    self.peers.send_if_modified(|peers| peers.remove(id).is_some())
  }

  /// Waits until at least one peer is known, then returns the current membership.
  pub async fn peers(&self) -> im::HashSet<PeerId> {
    let mut rx = self.peers.subscribe();
    let peers = match rx.wait_for(|p| !p.is_empty()).await {
      Ok(peers) => peers.clone(),
      // The sender lives in self, so the channel cannot close while we wait on it.
      Err(_) => im::HashSet::new(),
    };
    peers
  }

  /// The current membership, possibly empty. Never waits.
  pub fn peers_now(&self) -> im::HashSet<PeerId> {
    self.peers.borrow().clone()
  }

  /// Returns true if the node was idle and is now talking.
  pub fn start_talking(&self) -> bool {
    self
      .talk
      .compare_exchange(
        TalkState::Idle as u8,
        TalkState::Talking as u8,
        Ordering::AcqRel,
        Ordering::Acquire,
      )
      .is_ok()
  }

  /// Returns true if this call is the one that silenced the node.
  pub fn stop_talking(&self) -> bool {
    TalkState::from(self.talk.swap(TalkState::Quiesced as u8, Ordering::AcqRel))
      != TalkState::Quiesced
  }

  pub fn talk_state(&self) -> TalkState {
    TalkState::from(self.talk.load(Ordering::Acquire))
  }

  pub fn can_talk(&self) -> bool {
    self.talk_state() == TalkState::Talking
  }

  /// Held for the whole of one fan-out, so two batches from this node never interleave.
  pub async fn acquire_broadcast(&self) -> MutexGuard<'_, ()> {
    self.broadcast.lock().await
  }

  /// Stores a number heard directly from its origin, and remembers it for replay.
  pub fn record_number(&self, n: Number) {
    {
      let mut last_seen = self.last_seen.lock();
      let history = last_seen.entry(n.origin.clone()).or_default();
      history.insert(0, n.clone());
      history.truncate(HISTORY);
    }
    self.received.lock().insert(n);
  }

  /// Stores a number forwarded on behalf of a dead node. It is not remembered for replay, so a
  /// replay never triggers another replay.
  pub fn record_replay(&self, n: Number) {
    self.received.lock().insert(n);
  }

  /// Up to [`HISTORY`] numbers recorded from `id`, newest first.
  pub fn recent_from(&self, id: &PeerId) -> Vec<Number> {
    self
      .last_seen
      .lock()
      .get(id)
      .map(|h| h.to_vec())
      .unwrap_or_default()
  }

  pub fn snapshot_received(&self) -> HashSet<Number> {
    self.received.lock().clone()
  }
}
