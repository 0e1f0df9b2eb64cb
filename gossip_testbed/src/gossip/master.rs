use crate::core::{Host, Network, PeerId};
use crate::gossip::{GossipMsg, GossipNode, NodeParams, Report};
use crate::testkit::{FailureMode, LogLevel};
use crate::{error, info};
use crossbeam::channel::Receiver;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;

const LOG_LEVEL: LogLevel = LogLevel::Info;

/// Share of the drain window spent propagating before the dump request goes out. The rest is
/// left for the nodes to aggregate and print.
pub const PROPAGATION_SHARE: f64 = 0.7;

/// Configures one experiment run by a [`Master`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExperimentConfig {
  /// One node is spawned per entry.
  ///
  /// default: four times `localhost`
  pub hosts: Vec<Host>,
  /// How long nodes are allowed to broadcast.
  ///
  /// default: `2 seconds`
  pub active: Duration,
  /// Time reserved after quiescing, split between propagation and the dump.
  ///
  /// default: `1 second`
  pub drain: Duration,
  /// The seed handed to every node.
  ///
  /// default: `0`
  pub seed: u64,
  /// Whether each node mixes its own identifier into the seed. When false, every node draws the
  /// same sequence of values.
  ///
  /// default: `false`
  pub distinct_seeds: bool,
  /// Pause between a node's broadcast batches. `None` means no pause at all.
  ///
  /// default: `None`
  pub broadcast_interval: Option<Duration>,
  /// Whether gossip between nodes goes through the failure injector. Orchestration messages
  /// never do.
  ///
  /// default: `FailureMode::None`
  pub failure_mode: FailureMode,
}
impl Default for ExperimentConfig {
  fn default() -> Self {
    ExperimentConfig {
      hosts: vec![Host::from("localhost"); 4],
      active: Duration::from_secs(2),
      drain: Duration::from_secs(1),
      seed: 0,
      distinct_seeds: false,
      broadcast_interval: None,
      failure_mode: FailureMode::None,
    }
  }
}
impl ExperimentConfig {
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.hosts.is_empty() {
      return Err(ConfigError::NoHosts);
    }
    if self.active == Duration::from_secs(0) {
      return Err(ConfigError::ZeroActive);
    }
    Ok(())
  }

  fn node_params(&self) -> NodeParams {
    NodeParams {
      seed: self.seed,
      distinct_seed: self.distinct_seeds,
      broadcast_interval: self.broadcast_interval,
      failure_mode: self.failure_mode,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  NoHosts,
  ZeroActive,
  BadDuration(String),
}
impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NoHosts => write!(f, "an experiment needs at least one host"),
      ConfigError::ZeroActive => write!(f, "the active phase must last longer than zero"),
      ConfigError::BadDuration(s) => write!(f, "not a non-negative number of seconds: {:?}", s),
    }
  }
}
impl std::error::Error for ConfigError {}

/// Reads a phase length given in (possibly fractional) seconds.
pub fn parse_secs(arg: &str) -> Result<Duration, ConfigError> {
  arg
    .trim()
    .parse::<f64>()
    .ok()
    .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    .ok_or_else(|| ConfigError::BadDuration(arg.to_string()))
}

/// Waits until every node in `nodes` has reported once, or until `grace` has passed. Returns the
/// first report from each node, in arrival order.
pub fn collect_reports(
  reports: &Receiver<Report>,
  nodes: &[PeerId],
  grace: Duration,
) -> Vec<Report> {
  let deadline = Instant::now() + grace;
  let mut pending = nodes.iter().collect::<HashSet<_>>();
  let mut collected = Vec::with_capacity(nodes.len());
  while !pending.is_empty() {
    let left = deadline.saturating_duration_since(Instant::now());
    match reports.recv_timeout(left) {
      Ok(report) => {
        if pending.remove(&report.from) {
          collected.push(report);
        }
      }
      Err(_) => break,
    }
  }
  collected
}

/// When each phase of a run began, and who took part.
#[derive(Clone, Debug)]
pub struct PhaseLog {
  pub nodes: Vec<PeerId>,
  pub start: Instant,
  pub quiesce: Instant,
  pub dump: Instant,
  pub terminate: Instant,
}

/// Runs experiments. Phases advance on timers alone; the master never waits for a node to
/// acknowledge anything, and a failed spawn or send only shrinks the experiment.
pub struct Master {
  net: Network,
}
impl Master {
  pub fn new(net: Network) -> Master {
    Master { net: net }
  }

  pub async fn run(&self, config: &ExperimentConfig) -> Result<PhaseLog, ConfigError> {
    config.validate()?;
    let start = Instant::now();
    let params = config.node_params();
    let nodes = config
      .hosts
      .iter()
      .filter_map(|host| match self.net.spawn::<GossipNode>(host, &params) {
        Ok(id) => Some(id),
        Err(e) => {
          error!(LOG_LEVEL, &self.net, "Could not spawn on {}: {}", host, e);
          None
        }
      })
      .collect::<Vec<_>>();
    info!(LOG_LEVEL, &self.net, "Spawned {} of {} nodes", nodes.len(), config.hosts.len());

    self.broadcast(&nodes, &GossipMsg::PeerList(nodes.clone()));
    sleep(config.active).await;

    let quiesce = Instant::now();
    self.broadcast(&nodes, &GossipMsg::Quiesce);
    sleep(config.drain.mul_f64(PROPAGATION_SHARE)).await;

    let dump = Instant::now();
    self.broadcast(&nodes, &GossipMsg::Dump);
    sleep(config.drain.mul_f64(1.0 - PROPAGATION_SHARE)).await;

    let terminate = Instant::now();
    for id in nodes.iter() {
      if let Err(e) = self.net.terminate(id) {
        error!(LOG_LEVEL, &self.net, "Could not terminate {}: {}", id, e);
      }
    }
    info!(LOG_LEVEL, &self.net, "Experiment finished after {:?}", start.elapsed());
    Ok(PhaseLog {
      nodes: nodes,
      start: start,
      quiesce: quiesce,
      dump: dump,
      terminate: terminate,
    })
  }

  fn broadcast(&self, nodes: &[PeerId], msg: &GossipMsg) {
    for id in nodes {
      if let Err(e) = self.net.send(id, msg) {
        error!(LOG_LEVEL, &self.net, "Could not send {:?} to {}: {}", msg, id, e);
      }
    }
  }
}
