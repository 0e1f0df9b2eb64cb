use crate::core::PeerId;
use crate::gossip::Number;
use serde::{Deserialize, Serialize};

/// Everything a [`GossipNode`](crate::gossip::GossipNode) understands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GossipMsg {
  /// The full membership, from the master. May include the recipient itself.
  PeerList(Vec<PeerId>),
  /// A value broadcast by its origin.
  Number(Number),
  /// A dead node's value, forwarded by a survivor.
  Replay(Number),
  /// Stop broadcasting for good.
  Quiesce,
  /// Compute and emit the aggregate.
  Dump,
  /// Delivered by the network when a monitored peer terminates; never sent by a peer.
  PeerDown(PeerId),
}
