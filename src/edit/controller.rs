use std::sync::Arc;

use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::auth::AuthProvider;
use crate::calendar::OverlapIndex;
use crate::catalog::ResourceCatalog;
use crate::collection::RefreshSignal;
use crate::model::*;
use crate::observability::{DELETES_TOTAL, EDIT_SAVES_TOTAL, PRICE_FALLBACKS_TOTAL};
use crate::store::{RecordStore, StoreError};

use super::session::{EditSession, PriceSource};
use super::EditError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Closed,
    Open(EditSession),
    /// Update submitted, waiting on the store.
    Saving(EditSession),
    /// Delete requested; `in_flight` once submitted to the store.
    ConfirmingDelete {
        record: BookingRecord,
        in_flight: bool,
    },
}

impl EditState {
    fn is_in_flight(&self) -> bool {
        matches!(
            self,
            EditState::Saving(_) | EditState::ConfirmingDelete { in_flight: true, .. }
        )
    }
}

/// Result of a committed save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub record: BookingRecord,
    pub price_source: PriceSource,
    pub message: String,
}

/// Edit/delete workflow for one reservation at a time.
///
/// ```text
/// Closed --open--> Open --begin_save--> Saving --finish_save(ok)--> Closed
///                   ^                      |
///                   +--finish_save(err)----+
/// Closed/Open --request_delete--> ConfirmingDelete --confirm_delete(ok)--> Closed
/// ```
///
/// `save` and `confirm_delete` wrap the begin/finish pairs around the store call.
/// While a call is in flight every other transition answers `Busy`.
pub struct ReservationEditController {
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn AuthProvider>,
    catalog: Arc<dyn ResourceCatalog>,
    refresh: RefreshSignal,
    fallback_price: Money,
    state: EditState,
}

impl ReservationEditController {
    pub fn new(
        store: Arc<dyn RecordStore>,
        auth: Arc<dyn AuthProvider>,
        catalog: Arc<dyn ResourceCatalog>,
        refresh: RefreshSignal,
        fallback_price: Money,
    ) -> Self {
        Self {
            store,
            auth,
            catalog,
            refresh,
            fallback_price,
            state: EditState::Closed,
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// The live draft while open or saving.
    pub fn session(&self) -> Option<&EditSession> {
        match &self.state {
            EditState::Open(s) | EditState::Saving(s) => Some(s),
            _ => None,
        }
    }

    fn ensure_idle(&self) -> Result<(), EditError> {
        if self.state.is_in_flight() {
            return Err(EditError::Busy);
        }
        Ok(())
    }

    fn open_session_mut(&mut self) -> Result<&mut EditSession, EditError> {
        match &mut self.state {
            EditState::Open(s) => Ok(s),
            other if other.is_in_flight() => Err(EditError::Busy),
            _ => Err(EditError::NotEditing),
        }
    }

    pub fn open(&mut self, record: BookingRecord) -> Result<(), EditError> {
        self.ensure_idle()?;
        let id = record.id;
        let session = EditSession::open(record).inspect_err(|e| {
            debug!("refused to open {id}: {e}");
        })?;
        debug!("editing {id}");
        self.state = EditState::Open(session);
        Ok(())
    }

    /// Later date checks should use the new vehicle's bookings, see `selection_index`.
    pub fn change_resource(&mut self, resource_id: impl Into<String>) -> Result<(), EditError> {
        let session = self.open_session_mut()?;
        session.set_resource(resource_id.into());
        Ok(())
    }

    pub fn change_dates(&mut self, start: Day, end: Day) -> Result<(), EditError> {
        let session = self.open_session_mut()?;
        if end <= start {
            return Err(EditError::InvalidRange { start, end });
        }
        session.set_dates(start, end);
        Ok(())
    }

    pub fn set_client(&mut self, client_id: Option<String>) -> Result<(), EditError> {
        self.open_session_mut()?.set_client(client_id);
        Ok(())
    }

    pub fn set_price_override(&mut self, price: Option<Money>) -> Result<(), EditError> {
        self.open_session_mut()?.set_price_override(price);
        Ok(())
    }

    /// Bookings that constrain date picking for the draft vehicle, minus the record being edited.
    pub fn selection_index(&self, records: &[BookingRecord]) -> Option<OverlapIndex> {
        let EditState::Open(session) = &self.state else {
            return None;
        };
        Some(
            OverlapIndex::new(session.draft_resource_id(), records)
                .excluding(session.original().id),
        )
    }

    // ── Save ─────────────────────────────────────────────────

    /// Validate the draft and move to `Saving`. Returns the record to submit.
    /// Validation failures leave the session open and never reach the store.
    pub fn begin_save(&mut self) -> Result<(BookingRecord, PriceSource), EditError> {
        let session = match std::mem::take(&mut self.state) {
            EditState::Open(session) => session,
            other => {
                let err = if other.is_in_flight() { EditError::Busy } else { EditError::NotEditing };
                self.state = other;
                return Err(err);
            }
        };

        match session.build_record(&*self.auth, &*self.catalog, self.fallback_price) {
            Ok((record, source)) => {
                if source == PriceSource::Fallback {
                    warn!("no daily price for {}, using fallback {}", record.id, self.fallback_price);
                    metrics::counter!(PRICE_FALLBACKS_TOTAL).increment(1);
                }
                self.state = EditState::Saving(session);
                Ok((record, source))
            }
            Err(e) => {
                metrics::counter!(EDIT_SAVES_TOTAL, "status" => "invalid").increment(1);
                self.state = EditState::Open(session);
                Err(e)
            }
        }
    }

    /// Apply the store's answer to an in-flight save.
    pub fn finish_save(
        &mut self,
        result: Result<BookingRecord, StoreError>,
        price_source: PriceSource,
    ) -> Result<SaveOutcome, EditError> {
        let session = match std::mem::take(&mut self.state) {
            EditState::Saving(session) => session,
            other => {
                self.state = other;
                return Err(EditError::NotEditing);
            }
        };

        match result {
            Ok(record) => {
                let previous = &session.original().resource_id;
                self.refresh.schedule(previous);
                if record.resource_id != *previous {
                    self.refresh.schedule(&record.resource_id);
                }
                info!("saved {} on {} ({})", record.id, record.resource_id, record.range);
                metrics::counter!(EDIT_SAVES_TOTAL, "status" => "ok").increment(1);
                Ok(SaveOutcome {
                    message: format!("Reservation updated: {} to {}", record.range.start, record.range.end),
                    price_source,
                    record,
                })
            }
            Err(e) => {
                warn!("save of {} failed: {e}", session.original().id);
                metrics::counter!(EDIT_SAVES_TOTAL, "status" => "error").increment(1);
                self.state = EditState::Open(session);
                Err(e.into())
            }
        }
    }

    pub async fn save(&mut self) -> Result<SaveOutcome, EditError> {
        let (record, source) = self.begin_save()?;
        let result = self.store.update(record.id, record).await;
        self.finish_save(result, source)
    }

    // ── Delete ───────────────────────────────────────────────

    pub fn request_delete(&mut self, record: BookingRecord) -> Result<(), EditError> {
        self.ensure_idle()?;
        if !record.is_editable() {
            return Err(EditError::InvalidStatus { status: record.status });
        }
        debug!("delete requested for {}", record.id);
        self.state = EditState::ConfirmingDelete {
            record,
            in_flight: false,
        };
        Ok(())
    }

    /// Mark the pending delete as submitted. Returns the id to delete.
    pub fn begin_delete(&mut self) -> Result<Ulid, EditError> {
        match &mut self.state {
            EditState::ConfirmingDelete { in_flight: true, .. } => Err(EditError::Busy),
            EditState::ConfirmingDelete { record, in_flight } => {
                *in_flight = true;
                Ok(record.id)
            }
            other if other.is_in_flight() => Err(EditError::Busy),
            _ => Err(EditError::NotEditing),
        }
    }

    pub fn finish_delete(&mut self, result: Result<(), StoreError>) -> Result<String, EditError> {
        let EditState::ConfirmingDelete { record, in_flight } = &mut self.state else {
            return Err(EditError::NotEditing);
        };
        if !*in_flight {
            return Err(EditError::NotEditing);
        }

        match result {
            Ok(()) => {
                let (id, resource_id) = (record.id, record.resource_id.clone());
                self.state = EditState::Closed;
                self.refresh.schedule(&resource_id);
                info!("deleted {id} from {resource_id}");
                metrics::counter!(DELETES_TOTAL, "status" => "ok").increment(1);
                Ok("Reservation deleted".to_string())
            }
            Err(e) => {
                *in_flight = false;
                warn!("delete of {} failed: {e}", record.id);
                metrics::counter!(DELETES_TOTAL, "status" => "error").increment(1);
                Err(e.into())
            }
        }
    }

    pub async fn confirm_delete(&mut self) -> Result<String, EditError> {
        let id = self.begin_delete()?;
        let result = self.store.delete(id).await;
        self.finish_delete(result)
    }

    /// Drop any draft or pending delete. Refused while a submission is in flight.
    pub fn cancel(&mut self) -> Result<(), EditError> {
        self.ensure_idle()?;
        self.state = EditState::Closed;
        Ok(())
    }
}
