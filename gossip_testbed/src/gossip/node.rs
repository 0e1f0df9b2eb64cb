use crate::core::{Actor, ActorContext, PeerId, Spawnable};
use crate::gossip::{mix_seed, Engine, GossipMsg, NetTransport, NodeState, Report};
use crate::testkit::{FailureMode, LogLevel};
use crate::info;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const LOG_LEVEL: LogLevel = LogLevel::Info;

/// Everything a node needs to start. This is all that travels to the host it is spawned on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeParams {
  pub seed: u64,
  /// If set, the node mixes its own identifier into `seed` so nodes draw different streams.
  pub distinct_seed: bool,
  /// Pause after each broadcast batch. `None` broadcasts as fast as the node can.
  pub broadcast_interval: Option<Duration>,
  pub failure_mode: FailureMode,
}
impl Default for NodeParams {
  fn default() -> Self {
    NodeParams {
      seed: 0,
      distinct_seed: false,
      broadcast_interval: None,
      failure_mode: FailureMode::None,
    }
  }
}

/// One experiment participant. Its mailbox is the control loop; the broadcast loop runs as a
/// separate task from start until the node is quiesced or terminated.
pub struct GossipNode {
  params: NodeParams,
  engine: Option<Engine<NetTransport>>,
  broadcaster: Option<JoinHandle<()>>,
}
impl Spawnable for GossipNode {
  type Msg = GossipMsg;
  type Params = NodeParams;

  fn from_params(params: NodeParams) -> Self {
    GossipNode {
      params: params,
      engine: None,
      broadcaster: None,
    }
  }

  fn down_msg(peer: PeerId) -> Option<GossipMsg> {
    Some(GossipMsg::PeerDown(peer))
  }
}
#[async_trait]
impl Actor<GossipMsg> for GossipNode {
  async fn pre_start(&mut self, ctx: &ActorContext<GossipMsg>) {
    let seed = if self.params.distinct_seed {
      mix_seed(self.params.seed, ctx.id.id)
    } else {
      self.params.seed
    };
    let state = Arc::new(NodeState::new(ctx.id.clone(), seed));
    let transport = NetTransport {
      net: ctx.net.clone(),
      mode: self.params.failure_mode,
    };
    let engine = Engine::new(state.clone(), transport, self.params.broadcast_interval);
    state.start_talking();
    self.broadcaster = Some(ctx.net.rt().spawn(engine.clone().broadcast_loop()));
    self.engine = Some(engine);
    info!(LOG_LEVEL, &ctx.net, "{}: started with seed {}", ctx.id, seed);
  }

  async fn recv(&mut self, ctx: &ActorContext<GossipMsg>, msg: GossipMsg) {
    let engine = match &self.engine {
      Some(engine) => engine,
      None => return,
    };
    if let Some(aggregate) = engine.handle(msg).await {
      ctx.net.report(Report {
        from: ctx.id.clone(),
        aggregate: aggregate,
      });
    }
  }

  async fn post_stop(&mut self, ctx: &ActorContext<GossipMsg>) {
    if let Some(broadcaster) = self.broadcaster.take() {
      broadcaster.abort();
    }
    info!(LOG_LEVEL, &ctx.net, "{}: terminated", ctx.id);
  }
}
