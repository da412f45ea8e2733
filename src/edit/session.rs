use serde::Serialize;

use crate::auth::AuthProvider;
use crate::catalog::ResourceCatalog;
use crate::model::*;

use super::EditError;

/// Where the saved daily price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceSource {
    Catalog,
    Override,
    Original,
    Fallback,
}

/// Working copy of a pending reservation. Discarded on cancel, written back on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditSession {
    original: BookingRecord,
    draft_start: Day,
    draft_end: Day,
    draft_resource_id: String,
    draft_client_id: Option<String>,
    price_override: Option<Money>,
}

impl EditSession {
    /// Seed a draft from `record`. Fails unless the record is still pending.
    pub fn open(record: BookingRecord) -> Result<Self, EditError> {
        if !record.is_editable() {
            return Err(EditError::InvalidStatus { status: record.status });
        }
        Ok(Self {
            draft_start: record.range.start,
            draft_end: record.range.end,
            draft_resource_id: record.resource_id.clone(),
            draft_client_id: None,
            price_override: None,
            original: record,
        })
    }

    pub fn original(&self) -> &BookingRecord {
        &self.original
    }

    pub fn draft_start(&self) -> Day {
        self.draft_start
    }

    pub fn draft_end(&self) -> Day {
        self.draft_end
    }

    pub fn draft_resource_id(&self) -> &str {
        &self.draft_resource_id
    }

    pub fn resource_changed(&self) -> bool {
        !self.draft_resource_id.is_empty() && self.draft_resource_id != self.original.resource_id
    }

    pub(super) fn set_resource(&mut self, resource_id: String) {
        self.draft_resource_id = resource_id;
    }

    pub(super) fn set_dates(&mut self, start: Day, end: Day) {
        self.draft_start = start;
        self.draft_end = end;
    }

    pub(super) fn set_client(&mut self, client_id: Option<String>) {
        self.draft_client_id = client_id;
    }

    pub(super) fn set_price_override(&mut self, price: Option<Money>) {
        self.price_override = price;
    }

    /// Draft client, else the original record's, else whoever is signed in.
    pub fn resolve_client(&self, auth: &dyn AuthProvider) -> Option<String> {
        let non_empty = |c: &String| !c.is_empty();
        self.draft_client_id
            .clone()
            .filter(non_empty)
            .or_else(|| self.original.client_id.clone().filter(non_empty))
            .or_else(|| auth.current_user().filter(non_empty))
    }

    /// Draft vehicle, else the original one.
    pub fn resolve_resource(&self) -> Option<&str> {
        [self.draft_resource_id.as_str(), self.original.resource_id.as_str()]
            .into_iter()
            .find(|r| !r.is_empty())
    }

    /// New vehicle's catalog price if the vehicle changed, else the override,
    /// else the original price, else `fallback`.
    pub fn resolve_price(&self, catalog: &dyn ResourceCatalog, fallback: Money) -> (Money, PriceSource) {
        if self.resource_changed()
            && let Some(price) = catalog.daily_price(&self.draft_resource_id) {
                return (price, PriceSource::Catalog);
            }
        if let Some(price) = self.price_override {
            return (price, PriceSource::Override);
        }
        if let Some(price) = self.original.price_per_day {
            return (price, PriceSource::Original);
        }
        (fallback, PriceSource::Fallback)
    }

    /// Full record to submit, or the validation error that blocks it.
    pub fn build_record(
        &self,
        auth: &dyn AuthProvider,
        catalog: &dyn ResourceCatalog,
        fallback: Money,
    ) -> Result<(BookingRecord, PriceSource), EditError> {
        if self.draft_end <= self.draft_start {
            return Err(EditError::InvalidRange {
                start: self.draft_start,
                end: self.draft_end,
            });
        }
        let client_id = self
            .resolve_client(auth)
            .ok_or(EditError::MissingReference("client"))?;
        let resource_id = self
            .resolve_resource()
            .ok_or(EditError::MissingReference("vehicle"))?
            .to_string();
        let (price, source) = self.resolve_price(catalog, fallback);

        Ok((
            BookingRecord {
                id: self.original.id,
                resource_id,
                client_id: Some(client_id),
                range: DayRange::new(self.draft_start, self.draft_end),
                status: self.original.status,
                kind: self.original.kind,
                price_per_day: Some(price),
            },
            source,
        ))
    }
}
