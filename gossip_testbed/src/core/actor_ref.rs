use std::sync::Arc;

/// A handle to an actor living in this process that takes messages without serializing them.
pub struct LocalRef<T> {
  pub(crate) func: Arc<dyn Fn(T) -> bool + Send + Sync>,
}
impl<T> Clone for LocalRef<T> {
  fn clone(&self) -> Self {
    LocalRef {
      func: self.func.clone(),
    }
  }
}
impl<T: Send + 'static> LocalRef<T> {
  /// Returns false if the receiving actor is gone.
  pub fn send(&self, item: T) -> bool {
    (&self.func)(item)
  }
}
impl<T: Send + 'static> LocalRef<T> {
  pub(crate) fn from_sender(tx: tokio::sync::mpsc::UnboundedSender<T>) -> LocalRef<T> {
    LocalRef {
      func: Arc::new(move |x: T| tx.send(x).is_ok()),
    }
  }
}
