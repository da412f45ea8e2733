use crate::model::{BookingStatus, Day};
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// End date on or before start date.
    InvalidRange { start: Day, end: Day },
    /// Only pending reservations may be edited or deleted.
    InvalidStatus { status: BookingStatus },
    /// No client or vehicle could be resolved for the save.
    MissingReference(&'static str),
    /// Store rejected the write; message passed through unchanged.
    Store(String),
    /// No edit session or pending delete to act on.
    NotEditing,
    /// A save or delete is already in flight.
    Busy,
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::InvalidRange { start, end } => {
                write!(f, "end date {end} must be after start date {start}")
            }
            EditError::InvalidStatus { status } => {
                write!(f, "only pending reservations can be modified (this one is {status})")
            }
            EditError::MissingReference(what) => write!(f, "no {what} could be determined for this reservation"),
            EditError::Store(msg) => f.write_str(msg),
            EditError::NotEditing => f.write_str("no reservation is being edited"),
            EditError::Busy => f.write_str("a previous request is still in progress"),
        }
    }
}

impl std::error::Error for EditError {}

impl From<StoreError> for EditError {
    fn from(e: StoreError) -> Self {
        EditError::Store(e.0)
    }
}
