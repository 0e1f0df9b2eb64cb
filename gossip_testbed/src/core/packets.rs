use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Bytes that arrived in a mailbox but are not a message the receiving actor understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeserializeError {
  pub expected: &'static str,
  pub reason: String,
}
impl fmt::Display for DeserializeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "could not decode {}: {}", self.expected, self.reason)
  }
}
impl std::error::Error for DeserializeError {}

/// Everything crossing an actor boundary is CBOR.
pub fn serialize<T: Serialize + ?Sized>(item: &T) -> Result<Vec<u8>, String> {
  serde_cbor::to_vec(&item).map_err(|e| e.to_string())
}

pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DeserializeError> {
  serde_cbor::from_slice(bytes).map_err(|e| DeserializeError {
    expected: std::any::type_name::<T>(),
    reason: e.to_string(),
  })
}
