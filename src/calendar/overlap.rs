use chrono::{Datelike, NaiveDate};
use ulid::Ulid;

use crate::model::*;

/// Linear scan over an unindexed record list. Returns the first occupying
/// record on `resource_id` whose range covers `date`, both bounds inclusive.
pub fn is_date_occupied<'a>(
    resource_id: &str,
    date: Day,
    records: &'a [BookingRecord],
) -> Option<&'a BookingRecord> {
    records
        .iter()
        .find(|r| r.resource_id == resource_id && r.occupies() && r.range.contains(date))
}

/// Occupying records of one vehicle, sorted by `range.start`.
#[derive(Debug, Clone, Default)]
pub struct OverlapIndex {
    resource_id: String,
    records: Vec<BookingRecord>,
}

impl OverlapIndex {
    /// Keeps only records that belong to `resource_id` and still occupy it.
    pub fn new<'a>(resource_id: &str, records: impl IntoIterator<Item = &'a BookingRecord>) -> Self {
        let mut records: Vec<BookingRecord> = records
            .into_iter()
            .filter(|r| r.resource_id == resource_id && r.occupies())
            .cloned()
            .collect();
        records.sort_by_key(|r| r.range.start);
        Self {
            resource_id: resource_id.to_string(),
            records,
        }
    }

    /// Drop one record, e.g. the reservation being edited so it does not block itself.
    pub fn excluding(mut self, id: Ulid) -> Self {
        self.records.retain(|r| r.id != id);
        self
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn records(&self) -> &[BookingRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose range overlaps `query`.
    /// Uses binary search to skip records starting after `query.end`.
    pub fn overlapping(&self, query: &DayRange) -> impl Iterator<Item = &BookingRecord> {
        let right_bound = self.records.partition_point(|r| r.range.start <= query.end);
        self.records[..right_bound]
            .iter()
            .filter(move |r| r.range.end >= query.start)
    }

    /// The record occupying `date`, if any.
    pub fn occupant(&self, date: Day) -> Option<&BookingRecord> {
        self.overlapping(&DayRange::new(date, date)).next()
    }

    pub fn is_occupied(&self, date: Day) -> bool {
        self.occupant(date).is_some()
    }

    /// First record that would collide with booking `range`.
    pub fn conflicts(&self, range: &DayRange) -> Option<&BookingRecord> {
        self.overlapping(range).next()
    }

    /// Free stretches of days inside `window`, in order.
    pub fn free_ranges(&self, window: &DayRange) -> Vec<DayRange> {
        let mut free = Vec::new();
        let mut cursor = Some(window.start);

        for record in self.overlapping(window) {
            let Some(start) = cursor else { break };
            if record.range.start > start
                && let Some(before) = record.range.start.pred_opt() {
                    free.push(DayRange::new(start, before));
                }
            if record.range.end >= start {
                cursor = record.range.end.succ_opt();
            }
        }

        if let Some(start) = cursor
            && start <= window.end {
                free.push(DayRange::new(start, window.end));
            }
        free
    }
}

fn position_in(date: Day, range: &DayRange) -> Position {
    if range.is_single_day() {
        Position::Single
    } else if date == range.start {
        Position::Start
    } else if date == range.end {
        Position::End
    } else {
        Position::Middle
    }
}

enum Position {
    Start,
    Middle,
    End,
    Single,
}

/// Role of `date` on the rendered calendar. First match wins:
/// temp start, then the confirmed selection, then existing bookings.
pub fn classify_day(
    date: Day,
    pending: &PendingSelection,
    confirmed: Option<&DayRange>,
    index: &OverlapIndex,
) -> DayRole {
    if pending.temp_start == Some(date) {
        return DayRole::TempStart;
    }

    if let Some(range) = confirmed
        && range.contains(date) {
            return match position_in(date, range) {
                Position::Start => DayRole::SelectedStart,
                Position::Middle => DayRole::SelectedMiddle,
                Position::End => DayRole::SelectedEnd,
                Position::Single => DayRole::SelectedSingle,
            };
        }

    if let Some(record) = index.occupant(date) {
        return match position_in(date, &record.range) {
            Position::Start => DayRole::BookedStart,
            Position::Middle => DayRole::BookedMiddle,
            Position::End => DayRole::BookedEnd,
            Position::Single => DayRole::BookedSingle,
        };
    }

    DayRole::Free
}

/// Every day of one month with its role. `None` for an invalid year/month.
pub fn month_view(
    year: i32,
    month: u32,
    pending: &PendingSelection,
    confirmed: Option<&DayRange>,
    index: &OverlapIndex,
) -> Option<Vec<CalendarDay>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(
        first
            .iter_days()
            .take_while(|d| d.month() == month)
            .map(|date| CalendarDay {
                date,
                role: classify_day(date, pending, confirmed, index),
            })
            .collect(),
    )
}
