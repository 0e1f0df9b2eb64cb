mod common;

use common::{network, quiet_network};
use gossip_testbed::core::{Host, NetworkConfig};
use gossip_testbed::gossip::{ConfigError, ExperimentConfig, Master};
use gossip_testbed::testkit::LogLevel;
use std::collections::HashSet;
use std::time::{Duration, Instant};

// Slack for thread scheduling on a busy test machine.
const TOLERANCE: Duration = Duration::from_millis(500);

fn small_experiment() -> ExperimentConfig {
  let mut config = ExperimentConfig::default();
  config.broadcast_interval = Some(Duration::from_millis(2));
  config
}

#[test]
fn phases_follow_the_clock() {
  let (rt, net) = quiet_network();
  let reports = net.subscribe_reports();
  let mut config = small_experiment();
  config.active = Duration::from_secs(2);
  config.drain = Duration::from_secs(1);

  let log = rt.block_on(Master::new(net.clone()).run(&config)).unwrap();

  let quiesce = log.quiesce - log.start;
  let dump = log.dump - log.start;
  let terminate = log.terminate - log.start;
  assert!(quiesce >= Duration::from_secs(2));
  assert!(dump >= Duration::from_millis(2700));
  assert!(terminate >= Duration::from_secs(3));
  assert!(quiesce < Duration::from_secs(2) + TOLERANCE);
  assert!(dump - quiesce < Duration::from_millis(700) + TOLERANCE);
  assert!(terminate - dump < Duration::from_millis(300) + TOLERANCE);

  assert_eq!(log.nodes.len(), 4);
  let reported = reports
    .try_iter()
    .map(|r| {
      assert!(r.aggregate.count > 0);
      assert!(r.aggregate.sum > 0.0);
      r.from
    })
    .collect::<HashSet<_>>();
  assert_eq!(reported, log.nodes.iter().cloned().collect::<HashSet<_>>());

  let start = Instant::now();
  while log.nodes.iter().any(|id| net.is_alive(id)) {
    assert!(start.elapsed() < Duration::from_secs(5));
    std::thread::sleep(Duration::from_millis(10));
  }
}

#[test]
fn failed_spawns_shrink_the_experiment() {
  let mut net_cfg = NetworkConfig::default();
  net_cfg.workers = 4;
  net_cfg.log_level = LogLevel::Off;
  net_cfg.hosts = vec![Host::from("alpha"), Host::from("beta")];
  let (rt, net) = network(net_cfg);
  let reports = net.subscribe_reports();

  let mut config = small_experiment();
  config.hosts = vec![Host::from("alpha"), Host::from("nowhere"), Host::from("beta")];
  config.active = Duration::from_millis(300);
  config.drain = Duration::from_millis(300);
  let log = rt.block_on(Master::new(net.clone()).run(&config)).unwrap();

  assert_eq!(log.nodes.len(), 2);
  assert_eq!(reports.try_iter().count(), 2);
}

#[test]
fn invalid_experiments_do_not_start() {
  let (rt, net) = quiet_network();
  let mut config = small_experiment();
  config.hosts.clear();
  let started = Instant::now();
  let result = rt.block_on(Master::new(net).run(&config));
  assert_eq!(result.unwrap_err(), ConfigError::NoHosts);
  assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn every_live_node_hears_from_every_other() {
  let (rt, net) = quiet_network();
  let reports = net.subscribe_reports();
  let mut config = small_experiment();
  config.hosts = vec![Host::from("localhost"); 3];
  config.active = Duration::from_millis(500);
  config.drain = Duration::from_millis(500);
  config.distinct_seeds = true;
  rt.block_on(Master::new(net.clone()).run(&config)).unwrap();

  // Each node holds its own numbers plus at least some from both peers.
  for report in reports.try_iter() {
    assert!(report.aggregate.count > 3, "{}", report);
  }
}

#[test]
fn unthrottled_nodes_report_before_the_run_ends() {
  let (rt, net) = quiet_network();
  let reports = net.subscribe_reports();
  let mut config = ExperimentConfig::default();
  assert_eq!(config.broadcast_interval, None);
  config.active = Duration::from_secs(1);
  config.drain = Duration::from_secs(1);

  let log = rt.block_on(Master::new(net.clone()).run(&config)).unwrap();

  assert_eq!(log.nodes.len(), 4);
  let reported = reports
    .try_iter()
    .map(|r| {
      assert!(r.aggregate.count > 0, "{}", r);
      r.from
    })
    .collect::<HashSet<_>>();
  assert_eq!(reported, log.nodes.iter().cloned().collect::<HashSet<_>>());
}
