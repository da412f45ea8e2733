use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::calendar::OverlapIndex;
use crate::model::{BookingRecord, Event};
use crate::notify::NotifyHub;
use crate::store::{RecordStore, StoreError};

/// Handle for asking the owning collection to re-list a vehicle after a write.
#[derive(Debug, Clone)]
pub struct RefreshSignal {
    tx: mpsc::UnboundedSender<String>,
}

impl RefreshSignal {
    /// A signal not wired to any collection, plus the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a refresh. No-op once the collection is gone.
    pub fn schedule(&self, resource_id: &str) {
        let _ = self.tx.send(resource_id.to_string());
    }
}

/// Cached records per vehicle. Writes never touch the cache directly:
/// they schedule a refresh, and `apply_refreshes` re-lists from the store.
///
/// With a [`NotifyHub`] attached, every loaded vehicle is also subscribed to
/// store changes, so writes made elsewhere invalidate the cache too.
pub struct BookingCollection {
    store: Arc<dyn RecordStore>,
    records: HashMap<String, Vec<BookingRecord>>,
    signal: RefreshSignal,
    rx: mpsc::UnboundedReceiver<String>,
    hub: Option<Arc<NotifyHub>>,
    subscriptions: HashMap<String, broadcast::Receiver<Event>>,
}

impl BookingCollection {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let (signal, rx) = RefreshSignal::channel();
        Self {
            store,
            records: HashMap::new(),
            signal,
            rx,
            hub: None,
            subscriptions: HashMap::new(),
        }
    }

    /// Follow store changes for every vehicle loaded from now on.
    pub fn with_notify(mut self, hub: Arc<NotifyHub>) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn refresh_signal(&self) -> RefreshSignal {
        self.signal.clone()
    }

    /// Cached records for a vehicle; empty until loaded.
    pub fn records(&self, resource_id: &str) -> &[BookingRecord] {
        self.records.get(resource_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn index(&self, resource_id: &str) -> OverlapIndex {
        OverlapIndex::new(resource_id, self.records(resource_id))
    }

    pub async fn load(&mut self, resource_id: &str) -> Result<(), StoreError> {
        // subscribe before listing so no change slips between the two
        if let Some(hub) = &self.hub
            && !self.subscriptions.contains_key(resource_id)
        {
            self.subscriptions
                .insert(resource_id.to_string(), hub.subscribe(resource_id));
        }
        let records = self.store.list(resource_id).await?;
        self.records.insert(resource_id.to_string(), records);
        Ok(())
    }

    /// Turn queued store notifications into refresh requests.
    fn drain_notifications(&mut self, pending: &mut BTreeSet<String>) {
        for (resource_id, rx) in &mut self.subscriptions {
            loop {
                match rx.try_recv() {
                    Ok(event) => {
                        for affected in event.affected_resources() {
                            pending.insert(affected.to_string());
                        }
                    }
                    Err(TryRecvError::Lagged(skipped)) => {
                        debug!("missed {skipped} notifications for {resource_id}");
                        pending.insert(resource_id.clone());
                    }
                    Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                }
            }
        }
    }

    /// Re-list every vehicle with a queued refresh or store notification.
    /// Returns how many were reloaded. On failure the drained requests are queued again.
    pub async fn apply_refreshes(&mut self) -> Result<usize, StoreError> {
        let mut pending = BTreeSet::new();
        while let Ok(resource_id) = self.rx.try_recv() {
            pending.insert(resource_id);
        }
        self.drain_notifications(&mut pending);
        if pending.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = pending.into_iter().collect();
        let store = self.store.clone();
        match try_join_all(ids.iter().map(|id| store.list(id))).await {
            Ok(lists) => {
                for (id, records) in ids.iter().zip(lists) {
                    debug!("refreshed {} records for {id}", records.len());
                    self.records.insert(id.clone(), records);
                }
                Ok(ids.len())
            }
            Err(e) => {
                warn!("refresh failed: {e}");
                for id in &ids {
                    self.signal.schedule(id);
                }
                Err(e)
            }
        }
    }
}
