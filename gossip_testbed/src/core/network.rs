use crate::core::{
  deserialize, run_single, serialize, Actor, ActorContext, ActorMsg, ActorSignal,
  DeserializeError, Host, LocalRef, PeerId, Spawnable,
};
use crate::gossip::Report;
use crate::testkit::{FailureConfigMap, FailureMode, LogLevel, Logger, LoggerMsg};
use crossbeam::channel::{unbounded, Receiver, Sender};
use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

/// Configures a [`Network`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
  /// The hosts actors may be spawned on. If empty, any host is accepted.
  ///
  /// default: `[]`
  pub hosts: Vec<Host>,
  /// The number of worker threads for a runtime built with
  /// [`NetworkConfig::runtime`](#method.runtime).
  ///
  /// default: `num_cpus::get()`
  pub workers: usize,
  /// The threshold of the logger actor.
  ///
  /// default: `LogLevel::Info`
  pub log_level: LogLevel,
  /// Drop probabilities applied to unreliable sends, by recipient host.
  ///
  /// default: no drops
  pub fail_map: FailureConfigMap,
}
impl Default for NetworkConfig {
  fn default() -> Self {
    NetworkConfig {
      hosts: vec![],
      workers: num_cpus::get(),
      log_level: LogLevel::Info,
      fail_map: FailureConfigMap::default(),
    }
  }
}
impl NetworkConfig {
  pub fn runtime(&self) -> std::io::Result<Runtime> {
    Builder::new_multi_thread()
      .worker_threads(self.workers.max(1))
      .enable_all()
      .build()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
  /// The recipient never existed or has already terminated.
  Unreachable(PeerId),
  Serialization(String),
}
impl fmt::Display for SendError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SendError::Unreachable(id) => write!(f, "{} is unreachable", id),
      SendError::Serialization(e) => write!(f, "could not serialize message: {}", e),
    }
  }
}
impl std::error::Error for SendError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
  UnknownHost(Host),
  Params(DeserializeError),
  Serialization(String),
}
impl fmt::Display for SpawnError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SpawnError::UnknownHost(h) => write!(f, "no such host: {}", h),
      SpawnError::Params(e) => write!(f, "bad spawn parameters: {}", e),
      SpawnError::Serialization(e) => write!(f, "could not serialize spawn parameters: {}", e),
    }
  }
}
impl std::error::Error for SpawnError {}

type DownEncoder = Box<dyn Fn(PeerId) -> Option<Vec<u8>> + Send + Sync>;

struct Mailbox {
  tx: UnboundedSender<ActorMsg>,
  on_down: DownEncoder,
}

#[derive(Default)]
struct Registry {
  mailboxes: HashMap<PeerId, Mailbox>,
  // target -> watchers
  monitors: HashMap<PeerId, HashSet<PeerId>>,
}
impl Registry {
  fn notify_down(&self, watcher: &PeerId, target: &PeerId) {
    if let Some(mb) = self.mailboxes.get(watcher) {
      if let Some(bytes) = (mb.on_down)(target.clone()) {
        let _ = mb.tx.send(ActorMsg::Serial(bytes));
      }
    }
  }
}

struct Inner {
  rt: Handle,
  config: NetworkConfig,
  next_id: AtomicU64,
  registry: Mutex<Registry>,
  logger: LocalRef<LoggerMsg>,
  reports: Mutex<Vec<Sender<Report>>>,
}

/// The shared medium every actor in a run is spawned on and talks through. Cloning is cheap and
/// all clones refer to the same actors.
#[derive(Clone)]
pub struct Network {
  inner: Arc<Inner>,
}
impl Network {
  pub fn new(rt: Handle, config: NetworkConfig) -> Network {
    let (tx, rx) = unbounded_channel::<LoggerMsg>();
    rt.spawn(Logger::new(config.log_level).run(rx));
    Network::with_logger(rt, config, LocalRef::from_sender(tx))
  }

  pub(crate) fn with_logger(
    rt: Handle,
    config: NetworkConfig,
    logger: LocalRef<LoggerMsg>,
  ) -> Network {
    Network {
      inner: Arc::new(Inner {
        rt: rt,
        config: config,
        next_id: AtomicU64::new(1),
        registry: Mutex::new(Registry::default()),
        logger: logger,
        reports: Mutex::new(vec![]),
      }),
    }
  }

  pub fn rt(&self) -> &Handle {
    &self.inner.rt
  }

  pub fn config(&self) -> &NetworkConfig {
    &self.inner.config
  }

  /// Starts an actor of type `A` on `host`. The parameters go through the same encoding as any
  /// message would, so the actor is built only from what survives the trip.
  pub fn spawn<A>(&self, host: &Host, params: &A::Params) -> Result<PeerId, SpawnError>
  where
    A: Spawnable + Actor<<A as Spawnable>::Msg>,
  {
    let hosts = &self.inner.config.hosts;
    if !hosts.is_empty() && !hosts.contains(host) {
      return Err(SpawnError::UnknownHost(host.clone()));
    }
    let bytes = serialize(params).map_err(SpawnError::Serialization)?;
    let actor = A::from_params(deserialize(&bytes).map_err(SpawnError::Params)?);
    let id = PeerId::new(host.clone(), self.inner.next_id.fetch_add(1, Ordering::Relaxed));
    let (tx, rx) = unbounded_channel();
    let on_down: DownEncoder =
      Box::new(|peer: PeerId| A::down_msg(peer).and_then(|m| serialize(&m).ok()));
    self
      .inner
      .registry
      .lock()
      .mailboxes
      .insert(id.clone(), Mailbox { tx: tx, on_down: on_down });
    let ctx = ActorContext::new(id.clone(), self.clone());
    self.inner.rt.spawn(run_single::<<A as Spawnable>::Msg, A>(actor, ctx, rx));
    Ok(id)
  }

  pub fn send<M: Serialize + ?Sized>(&self, to: &PeerId, msg: &M) -> Result<(), SendError> {
    let bytes = serialize(msg).map_err(SendError::Serialization)?;
    self.send_raw(to, bytes)
  }

  /// Like [`send`](#method.send), but subject to the drop probabilities in
  /// [`NetworkConfig::fail_map`] when `mode` asks for it. A dropped message is not an error.
  pub fn send_unreliable<M: Serialize + ?Sized>(
    &self,
    mode: FailureMode,
    to: &PeerId,
    msg: &M,
  ) -> Result<(), SendError> {
    match mode {
      FailureMode::None => self.send(to, msg),
      FailureMode::Message => {
        let cfg = self.inner.config.fail_map.get(&to.host);
        if rand::random::<f64>() < cfg.drop_prob {
          Ok(())
        } else {
          self.send(to, msg)
        }
      }
    }
  }

  /// Puts bytes in a mailbox as they are. Whatever the recipient cannot decode is logged and
  /// dropped on its side.
  pub fn send_raw(&self, to: &PeerId, bytes: Vec<u8>) -> Result<(), SendError> {
    self.deliver(to, ActorMsg::Serial(bytes))
  }

  pub fn terminate(&self, id: &PeerId) -> Result<(), SendError> {
    self.deliver(id, ActorMsg::Signal(ActorSignal::Term))
  }

  fn deliver(&self, to: &PeerId, msg: ActorMsg) -> Result<(), SendError> {
    let registry = self.inner.registry.lock();
    match registry.mailboxes.get(to) {
      Some(mb) if mb.tx.send(msg).is_ok() => Ok(()),
      _ => Err(SendError::Unreachable(to.clone())),
    }
  }

  /// After this call, `watcher` is told exactly once when `target` terminates. If `target` is
  /// already gone, it is told right away.
  pub fn monitor(&self, watcher: &PeerId, target: &PeerId) {
    let mut registry = self.inner.registry.lock();
    if registry.mailboxes.contains_key(target) {
      registry
        .monitors
        .entry(target.clone())
        .or_default()
        .insert(watcher.clone());
    } else {
      registry.notify_down(watcher, target);
    }
  }

  pub fn is_alive(&self, id: &PeerId) -> bool {
    self.inner.registry.lock().mailboxes.contains_key(id)
  }

  pub(crate) fn deregister(&self, id: &PeerId) {
    let mut registry = self.inner.registry.lock();
    registry.mailboxes.remove(id);
    for watcher in registry.monitors.remove(id).into_iter().flatten() {
      registry.notify_down(&watcher, id);
    }
  }

  pub fn subscribe_reports(&self) -> Receiver<Report> {
    let (tx, rx) = unbounded();
    self.inner.reports.lock().push(tx);
    rx
  }

  /// Logs the report at `Info` and hands a copy to every subscriber still listening.
  pub fn report(&self, report: Report) {
    self.log(LogLevel::Info, report.to_string());
    self
      .inner
      .reports
      .lock()
      .retain(|tx| tx.send(report.clone()).is_ok());
  }

  pub fn log(&self, level: LogLevel, text: String) {
    self.inner.logger.send(LoggerMsg::Log(level, text));
  }
}
