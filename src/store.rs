use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use ulid::Ulid;

use crate::calendar::OverlapIndex;
use crate::limits::*;
use crate::model::*;
use crate::notify::NotifyHub;
use crate::observability::STORE_OPERATIONS_TOTAL;

/// Failure reported by the record store. The message reaches the user as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for StoreError {}

/// Backing store for booking records. In the full application this sits behind HTTP+JSON.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self, resource_id: &str) -> Result<Vec<BookingRecord>, StoreError>;
    async fn create(&self, record: BookingRecord) -> Result<BookingRecord, StoreError>;
    async fn update(&self, id: Ulid, record: BookingRecord) -> Result<BookingRecord, StoreError>;
    async fn delete(&self, id: Ulid) -> Result<(), StoreError>;
}

fn validate_record(record: &BookingRecord) -> Result<(), StoreError> {
    if record.resource_id.is_empty() {
        return Err(StoreError::new("vehicle is required"));
    }
    if record.resource_id.len() > MAX_RESOURCE_ID_LEN {
        return Err(StoreError::new("vehicle id too long"));
    }
    if let Some(ref c) = record.client_id
        && c.len() > MAX_CLIENT_ID_LEN
    {
        return Err(StoreError::new("client id too long"));
    }
    if record.range.start >= record.range.end {
        return Err(StoreError::new("end date must be after start date"));
    }
    if record.range.nights() > MAX_RANGE_NIGHTS {
        return Err(StoreError::new("booking too long"));
    }
    Ok(())
}

fn record_outcome<T>(op: &'static str, result: &Result<T, StoreError>) {
    let status = if result.is_ok() { "ok" } else { "error" };
    metrics::counter!(STORE_OPERATIONS_TOTAL, "op" => op, "status" => status).increment(1);
}

/// Records per vehicle, with double-booking rejection and change notifications.
pub struct InMemoryStore {
    resources: DashMap<String, Vec<BookingRecord>>,
    entity_to_resource: DashMap<Ulid, String>,
    notify: Arc<NotifyHub>,
    max_records_per_resource: usize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(NotifyHub::new()))
    }
}

impl InMemoryStore {
    pub fn new(notify: Arc<NotifyHub>) -> Self {
        Self {
            resources: DashMap::new(),
            entity_to_resource: DashMap::new(),
            notify,
            max_records_per_resource: MAX_RECORDS_PER_RESOURCE,
        }
    }

    /// Override the per-vehicle record cap.
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records_per_resource = max;
        self
    }

    pub fn notify(&self) -> &Arc<NotifyHub> {
        &self.notify
    }

    pub fn record_count(&self) -> usize {
        self.entity_to_resource.len()
    }

    pub fn get(&self, id: &Ulid) -> Option<BookingRecord> {
        let resource_id = self.entity_to_resource.get(id)?.value().clone();
        let records = self.resources.get(&resource_id)?;
        records.iter().find(|r| r.id == *id).cloned()
    }

    /// Reject a record arriving on `resource_id` once the vehicle is at its cap.
    fn check_capacity(&self, resource_id: &str) -> Result<(), StoreError> {
        let count = self.resources.get(resource_id).map_or(0, |r| r.len());
        if count >= self.max_records_per_resource {
            return Err(StoreError::new("too many records on vehicle"));
        }
        Ok(())
    }

    /// Reject `record` if an occupying record on its vehicle (other than `ignore`) overlaps it.
    fn check_no_conflict(&self, record: &BookingRecord, ignore: Option<Ulid>) -> Result<(), StoreError> {
        if !record.occupies() {
            return Ok(());
        }
        let Some(existing) = self.resources.get(&record.resource_id) else {
            return Ok(());
        };
        let mut index = OverlapIndex::new(&record.resource_id, existing.iter());
        if let Some(id) = ignore {
            index = index.excluding(id);
        }
        if let Some(conflict) = index.conflicts(&record.range) {
            return Err(StoreError(format!(
                "vehicle {} is not available: overlaps {}",
                record.resource_id,
                conflict.label()
            )));
        }
        Ok(())
    }

    /// Validate + conflict-check + insert. Shared by `create` and seeding.
    pub fn insert(&self, record: BookingRecord) -> Result<BookingRecord, StoreError> {
        validate_record(&record)?;
        if self.entity_to_resource.contains_key(&record.id) {
            return Err(StoreError(format!("record {} already exists", record.id)));
        }
        self.check_capacity(&record.resource_id)?;
        self.check_no_conflict(&record, None)?;

        self.resources
            .entry(record.resource_id.clone())
            .or_default()
            .push(record.clone());
        self.entity_to_resource.insert(record.id, record.resource_id.clone());
        debug!("created {} on {}", record.id, record.resource_id);
        self.notify.send(
            &record.resource_id,
            &Event::RecordCreated {
                record: record.clone(),
            },
        );
        Ok(record)
    }

    /// Insert many records, stopping at the first rejected one.
    pub fn seed(&self, records: impl IntoIterator<Item = BookingRecord>) -> Result<usize, StoreError> {
        let mut n = 0;
        for record in records {
            self.insert(record)?;
            n += 1;
        }
        Ok(n)
    }

    fn replace(&self, id: Ulid, mut record: BookingRecord) -> Result<BookingRecord, StoreError> {
        record.id = id;
        validate_record(&record)?;
        let previous_resource_id = self
            .entity_to_resource
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or_else(|| StoreError(format!("record {id} not found")))?;
        if previous_resource_id != record.resource_id {
            self.check_capacity(&record.resource_id)?;
        }
        self.check_no_conflict(&record, Some(id))?;

        if let Some(mut old) = self.resources.get_mut(&previous_resource_id) {
            old.retain(|r| r.id != id);
        }
        self.resources
            .entry(record.resource_id.clone())
            .or_default()
            .push(record.clone());
        self.entity_to_resource.insert(id, record.resource_id.clone());
        debug!("updated {id} on {}", record.resource_id);

        let event = Event::RecordUpdated {
            previous_resource_id: previous_resource_id.clone(),
            record: record.clone(),
        };
        self.notify.send(&record.resource_id, &event);
        if previous_resource_id != record.resource_id {
            self.notify.send(&previous_resource_id, &event);
        }
        Ok(record)
    }

    fn remove(&self, id: Ulid) -> Result<(), StoreError> {
        let (_, resource_id) = self
            .entity_to_resource
            .remove(&id)
            .ok_or_else(|| StoreError(format!("record {id} not found")))?;
        if let Some(mut records) = self.resources.get_mut(&resource_id) {
            records.retain(|r| r.id != id);
        }
        debug!("deleted {id} from {resource_id}");
        self.notify
            .send(&resource_id, &Event::RecordDeleted { id, resource_id: resource_id.clone() });
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn list(&self, resource_id: &str) -> Result<Vec<BookingRecord>, StoreError> {
        let mut records = self
            .resources
            .get(resource_id)
            .map(|e| e.value().clone())
            .unwrap_or_default();
        records.sort_by_key(|r| r.range.start);
        let result = Ok(records);
        record_outcome("list", &result);
        result
    }

    async fn create(&self, record: BookingRecord) -> Result<BookingRecord, StoreError> {
        let result = self.insert(record);
        record_outcome("create", &result);
        result
    }

    async fn update(&self, id: Ulid, record: BookingRecord) -> Result<BookingRecord, StoreError> {
        let result = self.replace(id, record);
        record_outcome("update", &result);
        result
    }

    async fn delete(&self, id: Ulid) -> Result<(), StoreError> {
        let result = self.remove(id);
        record_outcome("delete", &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn d(s: &str) -> Day {
        s.parse().unwrap()
    }

    fn booking(resource: &str, start: &str, end: &str) -> BookingRecord {
        BookingRecord::reservation(resource, DayRange::new(d(start), d(end)))
    }

    #[tokio::test]
    async fn create_and_list_sorted() {
        let store = InMemoryStore::default();
        assert_ok!(store.create(booking("veh1", "2025-09-20", "2025-09-22")).await);
        assert_ok!(store.create(booking("veh1", "2025-09-10", "2025-09-12")).await);
        assert_ok!(store.create(booking("veh2", "2025-09-10", "2025-09-12")).await);

        let listed = store.list("veh1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].range.start, d("2025-09-10"));
        assert_eq!(store.record_count(), 3);
        assert!(store.list("veh9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn overlapping_create_rejected() {
        let store = InMemoryStore::default();
        store.create(booking("veh1", "2025-09-10", "2025-09-12")).await.unwrap();
        let err = store
            .create(BookingRecord::maintenance(
                "veh1",
                DayRange::new(d("2025-09-12"), d("2025-09-14")),
            ))
            .await
            .unwrap_err();
        assert_eq!(
            err.message(),
            "vehicle veh1 is not available: overlaps reservation 2025-09-10 to 2025-09-12"
        );
    }

    #[tokio::test]
    async fn cancelled_record_does_not_block() {
        let store = InMemoryStore::default();
        let mut old = booking("veh1", "2025-09-10", "2025-09-12");
        old.status = BookingStatus::Cancelled;
        store.create(old).await.unwrap();
        assert_ok!(store.create(booking("veh1", "2025-09-10", "2025-09-12")).await);
    }

    #[tokio::test]
    async fn inverted_range_rejected() {
        let store = InMemoryStore::default();
        let mut rec = booking("veh1", "2025-09-10", "2025-09-12");
        rec.range = DayRange { start: d("2025-09-12"), end: d("2025-09-12") };
        let err = store.create(rec).await.unwrap_err();
        assert_eq!(err.to_string(), "end date must be after start date");
    }

    #[tokio::test]
    async fn update_may_overlap_itself() {
        let store = InMemoryStore::default();
        let rec = store.create(booking("veh1", "2025-09-10", "2025-09-12")).await.unwrap();
        let mut moved = rec.clone();
        moved.range = DayRange::new(d("2025-09-11"), d("2025-09-15"));
        let saved = store.update(rec.id, moved).await.unwrap();
        assert_eq!(saved.range.end, d("2025-09-15"));
        assert_eq!(store.get(&rec.id).unwrap().range.start, d("2025-09-11"));
    }

    #[tokio::test]
    async fn update_moves_between_vehicles() {
        let store = InMemoryStore::default();
        let rec = store.create(booking("veh1", "2025-09-10", "2025-09-12")).await.unwrap();
        let mut moved = rec.clone();
        moved.resource_id = "veh2".into();
        store.update(rec.id, moved).await.unwrap();
        assert!(store.list("veh1").await.unwrap().is_empty());
        assert_eq!(store.list("veh2").await.unwrap()[0].id, rec.id);
    }

    #[tokio::test]
    async fn update_into_conflict_keeps_original() {
        let store = InMemoryStore::default();
        store.create(booking("veh2", "2025-09-10", "2025-09-12")).await.unwrap();
        let rec = store.create(booking("veh1", "2025-09-10", "2025-09-12")).await.unwrap();
        let mut moved = rec.clone();
        moved.resource_id = "veh2".into();
        assert_err!(store.update(rec.id, moved).await);
        assert_eq!(store.get(&rec.id).unwrap().resource_id, "veh1");
    }

    #[tokio::test]
    async fn record_cap_applies_to_creates_and_moves() {
        let store = InMemoryStore::default().with_max_records(1);
        store.create(booking("veh2", "2025-09-01", "2025-09-03")).await.unwrap();
        let err = store.create(booking("veh2", "2025-09-10", "2025-09-12")).await.unwrap_err();
        assert_eq!(err.message(), "too many records on vehicle");

        let rec = store.create(booking("veh1", "2025-09-10", "2025-09-12")).await.unwrap();
        let mut moved = rec.clone();
        moved.resource_id = "veh2".into();
        assert_err!(store.update(rec.id, moved).await);
        assert_eq!(store.get(&rec.id).unwrap().resource_id, "veh1");

        // staying on a full vehicle is fine
        let mut shifted = rec.clone();
        shifted.range = DayRange::new(d("2025-09-11"), d("2025-09-13"));
        assert_ok!(store.update(rec.id, shifted).await);
    }

    #[tokio::test]
    async fn update_and_delete_unknown_id() {
        let store = InMemoryStore::default();
        let rec = booking("veh1", "2025-09-10", "2025-09-12");
        assert_err!(store.update(rec.id, rec.clone()).await);
        assert_err!(store.delete(rec.id).await);
    }

    #[tokio::test]
    async fn delete_frees_days() {
        let store = InMemoryStore::default();
        let rec = store.create(booking("veh1", "2025-09-10", "2025-09-12")).await.unwrap();
        assert_ok!(store.delete(rec.id).await);
        assert!(store.get(&rec.id).is_none());
        assert_ok!(store.create(booking("veh1", "2025-09-10", "2025-09-12")).await);
    }

    #[tokio::test]
    async fn changes_are_broadcast() {
        let store = InMemoryStore::default();
        let mut rx = store.notify().subscribe("veh1");
        let rec = store.create(booking("veh1", "2025-09-10", "2025-09-12")).await.unwrap();
        store.delete(rec.id).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), Event::RecordCreated { record: rec.clone() });
        assert_eq!(
            rx.recv().await.unwrap(),
            Event::RecordDeleted { id: rec.id, resource_id: "veh1".into() }
        );
    }

    #[test]
    fn seed_stops_at_conflict() {
        let store = InMemoryStore::default();
        let result = store.seed(vec![
            booking("veh1", "2025-09-10", "2025-09-12"),
            booking("veh1", "2025-09-11", "2025-09-13"),
        ]);
        assert!(result.is_err());
        assert_eq!(store.record_count(), 1);
    }
}
