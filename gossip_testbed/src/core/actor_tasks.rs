use crate::core::{deserialize, Actor, ActorContext, ActorMsg, ActorSignal};
use crate::testkit::LogLevel;
use crate::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;

const LOG_LEVEL: LogLevel = LogLevel::Info;

pub(crate) async fn run_single<M, A>(
  mut actor: A,
  ctx: ActorContext<M>,
  mut rx: UnboundedReceiver<ActorMsg>,
) where
  M: Serialize + DeserializeOwned + Send + 'static,
  A: Actor<M>,
{
  actor.pre_start(&ctx).await;
  while let Some(msg) = rx.recv().await {
    match msg {
      ActorMsg::Serial(bytes) => match deserialize::<M>(&bytes) {
        Ok(m) => actor.recv(&ctx, m).await,
        Err(e) => {
          warn!(LOG_LEVEL, &ctx.net, "{}: discarding unrecognized message - {}", ctx.id, e);
        }
      },
      ActorMsg::Signal(ActorSignal::Term) => break,
    }
  }
  actor.post_stop(&ctx).await;
  ctx.net.deregister(&ctx.id);
}
