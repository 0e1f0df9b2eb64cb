//! The gossip protocol and its orchestration.
//!
//! Each [`GossipNode`] keeps a [`NodeState`]: who its peers are, every distinct [`Number`] it has
//! received, whether it may still talk, its random source, and the last few numbers it heard from
//! each peer. Its control loop handles [`GossipMsg`]s one at a time while a broadcast loop draws
//! numbers and sends them to every peer.
//!
//! ### Failures
//! A node monitors every peer it is told about. When one dies, the node removes it from its
//! membership and sends every number it still remembers from it, wrapped in
//! [`GossipMsg::Replay`], to the remaining peers. Replayed numbers are stored but not remembered
//! for replay themselves, so a chain of failures cannot turn into a replay storm.
//!
//! ### Phases
//! The [`Master`] spawns the nodes, hands out the membership, waits out the active phase, tells
//! everyone to be quiet, waits 70% of the drain window, asks for the aggregates, waits the
//! remaining 30% and then terminates everything.

mod engine;
mod master;
mod messages;
mod node;
mod number;
mod rng;
mod state;

#[rustfmt::skip]
pub use {
  engine::Engine,
  engine::NetTransport,
  engine::Transport,
  master::collect_reports,
  master::ConfigError,
  master::ExperimentConfig,
  master::Master,
  master::parse_secs,
  master::PhaseLog,
  master::PROPAGATION_SHARE,
  messages::GossipMsg,
  node::GossipNode,
  node::NodeParams,
  number::aggregate,
  number::Aggregate,
  number::Number,
  number::Report,
  rng::mix_seed,
  rng::RngSource,
  state::NodeState,
  state::TalkState,
  state::HISTORY,
};
