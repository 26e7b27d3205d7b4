// ── Registry subscriptions ──
//
// Watch-backed handles over the device list. A handle keeps the last
// snapshot it observed; the registry keeps publishing newer ones.

use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Device;

type Snapshot<T> = Arc<Vec<Arc<T>>>;

/// Subscription to the device list.
pub type DeviceStream = EntityStream<Device>;

/// Handle on a published collection snapshot.
///
/// [`current`](Self::current) is what this handle last observed,
/// [`latest`](Self::latest) peeks at whatever is published now.
pub struct EntityStream<T: Clone + Send + Sync + 'static> {
    seen: Snapshot<T>,
    rx: watch::Receiver<Snapshot<T>>,
}

impl<T: Clone + Send + Sync + 'static> EntityStream<T> {
    pub(crate) fn new(mut rx: watch::Receiver<Snapshot<T>>) -> Self {
        let seen = Arc::clone(&rx.borrow_and_update());
        Self { seen, rx }
    }

    pub fn current(&self) -> &Snapshot<T> {
        &self.seen
    }

    pub fn latest(&self) -> Snapshot<T> {
        Arc::clone(&self.rx.borrow())
    }

    /// Park until the registry publishes again. `None` once the registry
    /// is gone.
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        if self.rx.changed().await.is_err() {
            return None;
        }
        self.seen = Arc::clone(&self.rx.borrow_and_update());
        Some(Arc::clone(&self.seen))
    }

    /// Every published snapshot as a `Stream`, starting with the one
    /// published right now.
    pub fn into_stream(self) -> impl Stream<Item = Snapshot<T>> + Unpin + Send {
        WatchStream::new(self.rx)
    }
}

impl EntityStream<Device> {
    /// Device with `id` in the observed snapshot.
    pub fn device(&self, id: &str) -> Option<Arc<Device>> {
        self.seen.iter().find(|d| d.id.as_str() == id).map(Arc::clone)
    }
}
