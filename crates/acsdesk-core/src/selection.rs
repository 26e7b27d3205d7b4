// ── Selection / URL sync ──
//
// The selected device lives in a query parameter of the page location so
// that it survives reloads and can be shared as a link. The parameter is
// read once, at construction; afterwards state only flows towards the URL.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::console::Console;
use crate::model::{Device, DeviceId};

/// Query parameter carrying the selected device id.
pub const SELECTION_PARAM: &str = "device";

// ── SelectionSync ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSync {
    location: Url,
    selected: Option<DeviceId>,
}

impl SelectionSync {
    /// Read the selection from `location`. This is the only time the
    /// query is consulted.
    pub fn new(location: Url) -> Self {
        let selected = location
            .query_pairs()
            .find(|(k, _)| k == SELECTION_PARAM)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
            .map(DeviceId::from);
        Self { location, selected }
    }

    pub fn selected(&self) -> Option<&DeviceId> {
        self.selected.as_ref()
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Change the selection and rewrite the location to match. Every
    /// other query pair is kept in order.
    pub fn select(&mut self, id: Option<DeviceId>) -> &Url {
        let kept: Vec<(String, String)> = self
            .location
            .query_pairs()
            .filter(|(k, _)| k != SELECTION_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        {
            let mut query = self.location.query_pairs_mut();
            query.clear();
            query.extend_pairs(&kept);
            if let Some(id) = &id {
                query.append_pair(SELECTION_PARAM, id.as_str());
            }
        }
        if self.location.query() == Some("") {
            self.location.set_query(None);
        }

        debug!(selected = ?id, location = %self.location, "selection changed");
        self.selected = id;
        &self.location
    }
}

// ── DetailLoader ────────────────────────────────────────────────────

/// Result of one [`DetailLoader::load`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(Arc<Device>),
    NotFound,
    NothingSelected,
    /// The selection changed while the lookup was in flight.
    Stale,
    /// The loader was closed.
    Cancelled,
}

/// Owns the selection of a device-detail view and fetches the selected
/// device. Results that arrive after the selection changed, or after the
/// view was closed, are discarded.
pub struct DetailLoader {
    selection: Mutex<SelectionSync>,
    generation: AtomicU64,
    detail: Mutex<Option<Arc<Device>>>,
    alive: CancellationToken,
}

impl DetailLoader {
    pub fn new(selection: SelectionSync) -> Self {
        Self {
            selection: Mutex::new(selection),
            generation: AtomicU64::new(0),
            detail: Mutex::new(None),
            alive: CancellationToken::new(),
        }
    }

    pub fn selected(&self) -> Option<DeviceId> {
        self.lock_selection().selected().cloned()
    }

    pub fn location(&self) -> Url {
        self.lock_selection().location().clone()
    }

    /// Last applied detail, if any.
    pub fn detail(&self) -> Option<Arc<Device>> {
        self.detail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_closed(&self) -> bool {
        self.alive.is_cancelled()
    }

    /// Change the selection; returns the rewritten location. Any load in
    /// flight for the previous selection becomes stale.
    pub fn select(&self, id: Option<DeviceId>) -> Url {
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.detail.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.lock_selection().select(id).clone()
    }

    /// Fetch the selected device and apply it if still relevant.
    pub async fn load(&self, console: &Console) -> LoadOutcome {
        let generation = self.generation.load(Ordering::Acquire);
        let Some(id) = self.selected() else {
            return LoadOutcome::NothingSelected;
        };

        let Some(fetched) = self.alive.run_until_cancelled(console.get_device(&id)).await else {
            debug!(device_id = %id, "detail view closed during load");
            return LoadOutcome::Cancelled;
        };
        if self.generation.load(Ordering::Acquire) != generation {
            debug!(device_id = %id, "dropping stale device detail");
            return LoadOutcome::Stale;
        }

        *self.detail.lock().unwrap_or_else(PoisonError::into_inner) = fetched.clone();
        match fetched {
            Some(device) => LoadOutcome::Loaded(device),
            None => LoadOutcome::NotFound,
        }
    }

    /// Stop accepting results. Loads in flight resolve as `Cancelled`.
    pub fn close(&self) {
        self.alive.cancel();
    }

    fn lock_selection(&self) -> MutexGuard<'_, SelectionSync> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for DetailLoader {
    fn drop(&mut self) {
        self.alive.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::ConsoleConfig;
    use crate::storage::MemoryStorage;
    use crate::transport::FixedProbe;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn console(config: ConsoleConfig) -> Console {
        Console::with_probe(config, Arc::new(MemoryStorage::new()), Arc::new(FixedProbe(true)))
    }

    #[test]
    fn reads_selection_at_construction() {
        let sync = SelectionSync::new(url("https://acs.test/devices?device=XBHQU23321002432"));
        assert_eq!(sync.selected().unwrap().as_str(), "XBHQU23321002432");
        let none = SelectionSync::new(url("https://acs.test/devices?device="));
        assert!(none.selected().is_none());
    }

    #[test]
    fn select_rewrites_parameter_and_keeps_others() {
        let mut sync = SelectionSync::new(url("https://acs.test/devices?tab=logs&device=OLD"));
        let location = sync.select(Some(DeviceId::from("NEW"))).clone();
        assert_eq!(location.as_str(), "https://acs.test/devices?tab=logs&device=NEW");
        assert_eq!(sync.selected().unwrap().as_str(), "NEW");
    }

    #[test]
    fn clearing_selection_removes_parameter() {
        let mut sync = SelectionSync::new(url("https://acs.test/devices?device=OLD"));
        assert_eq!(sync.select(None).as_str(), "https://acs.test/devices");
        assert!(sync.selected().is_none());
    }

    #[tokio::test]
    async fn loads_selected_device() {
        let console = console(ConsoleConfig::instant());
        let loader = DetailLoader::new(SelectionSync::new(url(
            "https://acs.test/devices?device=XBHQU23321002432",
        )));
        let LoadOutcome::Loaded(device) = loader.load(&console).await else {
            panic!("expected a device");
        };
        assert_eq!(device.id.as_str(), "XBHQU23321002432");
        assert_eq!(loader.detail(), Some(device));
    }

    #[tokio::test]
    async fn unknown_selection_is_not_found() {
        let console = console(ConsoleConfig::instant());
        let loader = DetailLoader::new(SelectionSync::new(url("https://acs.test/?device=GHOST")));
        assert_eq!(loader.load(&console).await, LoadOutcome::NotFound);
        assert_eq!(
            DetailLoader::new(SelectionSync::new(url("https://acs.test/")))
                .load(&console)
                .await,
            LoadOutcome::NothingSelected
        );
    }

    #[tokio::test(start_paused = true)]
    async fn selection_change_during_load_drops_result() {
        let console = console(ConsoleConfig::default());
        let loader = DetailLoader::new(SelectionSync::new(url(
            "https://acs.test/devices?device=XBHQU23321002432",
        )));
        let (outcome, ()) = tokio::join!(loader.load(&console), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            loader.select(Some(DeviceId::from("XBHQU23321002436")));
        });
        assert_eq!(outcome, LoadOutcome::Stale);
        assert!(loader.detail().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_pending_load() {
        let console = console(ConsoleConfig::default());
        let loader = DetailLoader::new(SelectionSync::new(url(
            "https://acs.test/devices?device=XBHQU23321002432",
        )));
        let (outcome, ()) = tokio::join!(loader.load(&console), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            loader.close();
        });
        assert_eq!(outcome, LoadOutcome::Cancelled);
        assert!(loader.is_closed());
        assert!(loader.detail().is_none());
    }
}
