use crate::model::Day;

/// Rejected day click. The selector state is untouched when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    PastDate { date: Day, today: Day },
    OccupiedDate { date: Day, label: String },
}

impl std::fmt::Display for CalendarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalendarError::PastDate { date, today } => {
                write!(f, "cannot select {date}: date is before today ({today})")
            }
            CalendarError::OccupiedDate { date, label } => {
                write!(f, "cannot select {date}: already taken by {label}")
            }
        }
    }
}

impl std::error::Error for CalendarError {}

impl CalendarError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            CalendarError::PastDate { .. } => "past_date",
            CalendarError::OccupiedDate { .. } => "occupied_date",
        }
    }
}
