mod error;
mod overlap;
mod selector;

pub use error::CalendarError;
pub use overlap::{classify_day, is_date_occupied, month_view, OverlapIndex};
pub use selector::{DateRangeSelector, DateSelect, Endpoint, SelectionState};
