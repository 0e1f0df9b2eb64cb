use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;
use LoggerMsg::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
  Trace,
  Debug,
  Info,
  Warn,
  Error,
  Fatal,
  Off,
}
impl LogLevel {
  pub const MIN: LogLevel = LogLevel::Trace;
}

pub enum LoggerMsg {
  Log(LogLevel, String),
}

/// Prints every log line at or above its level. There is one per
/// [`Network`](crate::core::Network), reachable through
/// [`Network::log`](crate::core::Network::log) and the logging macros.
pub struct Logger {
  level: LogLevel,
}
impl Logger {
  pub fn new(level: LogLevel) -> Self {
    Logger { level: level }
  }

  fn recv(&mut self, msg: LoggerMsg) {
    match msg {
      Log(level, s) => {
        if level >= self.level {
          println!("[{:?}] {}", level, s);
        }
      }
    }
  }

  pub(crate) async fn run(mut self, mut rx: UnboundedReceiver<LoggerMsg>) {
    while let Some(msg) = rx.recv().await {
      self.recv(msg);
    }
  }
}

/// Logs through the [`Network`](crate::core::Network) if `$msg_level` is at or above
/// `$env_level`. The message is only formatted when it passes.
#[macro_export]
macro_rules! log {
  ($env_level:expr, $net:expr, $msg_level:expr, $($arg:tt)+) => {
    if $msg_level >= $env_level {
      $net.log($msg_level, format!($($arg)+));
    }
  };
}

#[macro_export]
macro_rules! trace {
  ($env_level:expr, $net:expr, $($arg:tt)+) => {
    $crate::log!($env_level, $net, $crate::testkit::LogLevel::Trace, $($arg)+)
  };
}

#[macro_export]
macro_rules! debug {
  ($env_level:expr, $net:expr, $($arg:tt)+) => {
    $crate::log!($env_level, $net, $crate::testkit::LogLevel::Debug, $($arg)+)
  };
}

#[macro_export]
macro_rules! info {
  ($env_level:expr, $net:expr, $($arg:tt)+) => {
    $crate::log!($env_level, $net, $crate::testkit::LogLevel::Info, $($arg)+)
  };
}

#[macro_export]
macro_rules! warn {
  ($env_level:expr, $net:expr, $($arg:tt)+) => {
    $crate::log!($env_level, $net, $crate::testkit::LogLevel::Warn, $($arg)+)
  };
}

#[macro_export]
macro_rules! error {
  ($env_level:expr, $net:expr, $($arg:tt)+) => {
    $crate::log!($env_level, $net, $crate::testkit::LogLevel::Error, $($arg)+)
  };
}

#[test]
fn test_level_order() {
  assert!(LogLevel::MIN < LogLevel::Debug);
  assert!(LogLevel::Warn >= LogLevel::Info);
  assert!(LogLevel::Off > LogLevel::Fatal);
}
