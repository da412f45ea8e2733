use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Calendar day — the only time type. Time-of-day never enters a comparison.
pub type Day = NaiveDate;

/// Whole currency units per rental day.
pub type Money = u32;

/// Closed range `[start, end]` of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayRange {
    pub start: Day,
    pub end: Day,
}

impl DayRange {
    pub fn new(start: Day, end: Day) -> Self {
        debug_assert!(start <= end, "DayRange start must not be after end");
        Self { start, end }
    }

    /// Build from two days in any order.
    pub fn ordered(a: Day, b: Day) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn contains(&self, day: Day) -> bool {
        self.start <= day && day <= self.end
    }

    /// Both bounds inclusive: ranges sharing a single day overlap.
    pub fn overlaps(&self, other: &DayRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }
}

impl std::fmt::Display for DayRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// What occupies the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingKind {
    Reservation,
    Maintenance,
}

/// An occupied stretch of days on one vehicle — reservations and maintenance are both records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: Ulid,
    pub resource_id: String,
    #[serde(default)]
    pub client_id: Option<String>,
    pub range: DayRange,
    pub status: BookingStatus,
    pub kind: BookingKind,
    #[serde(default)]
    pub price_per_day: Option<Money>,
}

impl BookingRecord {
    pub fn reservation(resource_id: impl Into<String>, range: DayRange) -> Self {
        Self {
            id: Ulid::new(),
            resource_id: resource_id.into(),
            client_id: None,
            range,
            status: BookingStatus::Pending,
            kind: BookingKind::Reservation,
            price_per_day: None,
        }
    }

    pub fn maintenance(resource_id: impl Into<String>, range: DayRange) -> Self {
        Self {
            kind: BookingKind::Maintenance,
            status: BookingStatus::Active,
            ..Self::reservation(resource_id, range)
        }
    }

    /// Cancelled records stay listed but no longer block the calendar.
    pub fn occupies(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }

    pub fn is_editable(&self) -> bool {
        self.status == BookingStatus::Pending
    }

    /// Human-readable description for conflict messages.
    pub fn label(&self) -> String {
        let kind = match self.kind {
            BookingKind::Reservation => "reservation",
            BookingKind::Maintenance => "maintenance",
        };
        format!("{kind} {}", self.range)
    }

    /// `nights * price_per_day`, if a price is set.
    pub fn total_price(&self) -> Option<u64> {
        let nights = u64::try_from(self.range.nights()).ok()?;
        self.price_per_day.map(|p| nights * u64::from(p))
    }
}

/// Role of a rendered calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayRole {
    Free,
    TempStart,
    SelectedStart,
    SelectedMiddle,
    SelectedEnd,
    SelectedSingle,
    BookedStart,
    BookedMiddle,
    BookedEnd,
    BookedSingle,
}

impl DayRole {
    pub fn is_booked(&self) -> bool {
        matches!(
            self,
            DayRole::BookedStart | DayRole::BookedMiddle | DayRole::BookedEnd | DayRole::BookedSingle
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: Day,
    pub role: DayRole,
}

/// First click of a two-click range selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSelection {
    pub temp_start: Option<Day>,
}

/// Store change notifications, broadcast per vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RecordCreated {
        record: BookingRecord,
    },
    RecordUpdated {
        previous_resource_id: String,
        record: BookingRecord,
    },
    RecordDeleted {
        id: Ulid,
        resource_id: String,
    },
}

impl Event {
    /// Vehicles whose bookings changed. A move touches both sides.
    pub fn affected_resources(&self) -> Vec<&str> {
        match self {
            Event::RecordCreated { record } => vec![record.resource_id.as_str()],
            Event::RecordUpdated { previous_resource_id, record } => {
                if *previous_resource_id == record.resource_id {
                    vec![record.resource_id.as_str()]
                } else {
                    vec![previous_resource_id.as_str(), record.resource_id.as_str()]
                }
            }
            Event::RecordDeleted { resource_id, .. } => vec![resource_id.as_str()],
        }
    }
}
