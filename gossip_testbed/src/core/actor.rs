use crate::core::{Network, PeerId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Out-of-band instructions to an actor, handled by the runtime rather than the actor itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorSignal {
  /// Finish the current message, run [`post_stop`](Actor::post_stop) and deregister.
  Term,
}

pub(crate) enum ActorMsg {
  Serial(Vec<u8>),
  Signal(ActorSignal),
}

/// A single-threaded message handler. Messages are handed to [`recv`](Actor::recv) one at a time,
/// each handled to completion before the next is taken from the mailbox.
#[async_trait]
pub trait Actor<M: Send + 'static>: Send + 'static {
  async fn pre_start(&mut self, _: &ActorContext<M>) {}
  async fn recv(&mut self, ctx: &ActorContext<M>, msg: M);
  async fn post_stop(&mut self, _: &ActorContext<M>) {}
}

/// An actor that can be started on another host. It is constructed there from a serializable
/// parameter block, never from a closure. Implementors also implement
/// [`Actor<Self::Msg>`](Actor).
pub trait Spawnable: Sized + Send + 'static {
  type Msg: Serialize + DeserializeOwned + Send + 'static;
  type Params: Serialize + DeserializeOwned;

  fn from_params(params: Self::Params) -> Self;

  /// The message this actor wants to receive when a peer it monitors terminates. Actors that
  /// never monitor anything can keep the default.
  fn down_msg(_peer: PeerId) -> Option<Self::Msg> {
    None
  }
}

pub struct ActorContext<M> {
  pub id: PeerId,
  pub net: Network,
  x: PhantomData<fn(M)>,
}
impl<M: Serialize> ActorContext<M> {
  pub(crate) fn new(id: PeerId, net: Network) -> ActorContext<M> {
    ActorContext {
      id: id,
      net: net,
      x: PhantomData,
    }
  }
}
