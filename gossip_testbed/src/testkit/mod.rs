//! Logging and failure injection shared by the substrate, the protocol and the tests.

mod failure_config;
mod logging;

#[rustfmt::skip]
pub use {
  failure_config::FailureConfig,
  failure_config::FailureConfigMap,
  failure_config::FailureMode,
  logging::Logger,
  logging::LoggerMsg,
  logging::LogLevel,
};
