use gossip_testbed::core::{Host, Network, NetworkConfig};
use gossip_testbed::gossip::{collect_reports, parse_secs, ExperimentConfig, Master};
use std::time::Duration;

const USAGE: &str = "Usage: gossip-experiment [active_secs] [drain_secs] [seed] [host...]";

// How long reports may trail the terminate phase before they count as missing.
const REPORT_GRACE: Duration = Duration::from_secs(5);

fn main() {
  // Exclude the command
  let mut args = std::env::args().skip(1);
  let mut config = ExperimentConfig::default();
  if let Some(active) = args.next() {
    config.active = or_usage(parse_secs(&active), "active seconds", &active);
  }
  if let Some(drain) = args.next() {
    config.drain = or_usage(parse_secs(&drain), "drain seconds", &drain);
  }
  if let Some(seed) = args.next() {
    config.seed = or_usage(seed.parse::<u64>(), "seed", &seed);
  }
  let hosts = args.map(|h| Host::from(h)).collect::<Vec<_>>();
  if !hosts.is_empty() {
    config.hosts = hosts;
  }

  let net_cfg = NetworkConfig::default();
  let rt = match net_cfg.runtime() {
    Ok(rt) => rt,
    Err(e) => {
      eprintln!("Could not start runtime: {}", e);
      std::process::exit(1);
    }
  };
  let net = Network::new(rt.handle().clone(), net_cfg);
  let reports = net.subscribe_reports();
  let log = match rt.block_on(Master::new(net.clone()).run(&config)) {
    Ok(log) => log,
    Err(e) => {
      eprintln!("Invalid experiment: {}", e);
      std::process::exit(2);
    }
  };
  let received = collect_reports(&reports, &log.nodes, REPORT_GRACE).len();
  println!(
    "{} of {} nodes reported. Quiesce at {:?}, dump at {:?}, terminate at {:?}",
    received,
    log.nodes.len(),
    log.quiesce - log.start,
    log.dump - log.start,
    log.terminate - log.start
  );
}

fn or_usage<T, E: std::fmt::Display>(parsed: Result<T, E>, what: &str, arg: &str) -> T {
  match parsed {
    Ok(x) => x,
    Err(e) => {
      eprintln!("{}", USAGE);
      eprintln!("Could not parse {} from {:?}: {}", what, arg, e);
      std::process::exit(2);
    }
  }
}
