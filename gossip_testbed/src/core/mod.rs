//! The actor substrate the gossip protocol runs on: addressable actors, point-to-point sends,
//! failure monitoring and termination.
//!
//! Every spawned actor gets a [`PeerId`] from its [`Network`]. Messages are CBOR-encoded before
//! they are put in the recipient's mailbox, so anything that crosses an actor boundary is exactly
//! what would cross a real wire. Mailboxes are unbounded FIFO queues, which gives per-sender
//! ordering and nothing more.
//!
//! ```ignore
//! let rt = NetworkConfig::default().runtime()?;
//! let net = Network::new(rt.handle().clone(), NetworkConfig::default());
//! let id = net.spawn::<MyActor>(&Host::from("localhost"), &my_params)?;
//! net.send(&id, &MyMsg::Hello)?;
//! net.monitor(&other, &id);
//! net.terminate(&id)?;
//! ```

mod actor;
mod actor_ref;
mod actor_tasks;
mod network;
mod packets;
mod remoting;

#[rustfmt::skip]
pub(in crate::core) use {
  actor::ActorMsg,
  actor_tasks::run_single,
};

#[rustfmt::skip]
pub use {
  actor::Actor,
  actor::ActorContext,
  actor::ActorSignal,
  actor::Spawnable,
  actor_ref::LocalRef,
  network::Network,
  network::NetworkConfig,
  network::SendError,
  network::SpawnError,
  packets::deserialize,
  packets::serialize,
  packets::DeserializeError,
  remoting::Host,
  remoting::PeerId,
};
