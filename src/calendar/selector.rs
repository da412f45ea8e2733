use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::*;
use crate::observability::SELECTIONS_REJECTED_TOTAL;

use super::overlap::OverlapIndex;
use super::CalendarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    Start,
    End,
}

/// One `onDateSelect` notification for the owning form. `None` clears that end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSelect {
    pub date: Option<Day>,
    pub endpoint: Endpoint,
}

impl DateSelect {
    fn set(date: Day, endpoint: Endpoint) -> Self {
        Self {
            date: Some(date),
            endpoint,
        }
    }

    fn clear(endpoint: Endpoint) -> Self {
        Self { date: None, endpoint }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionState {
    #[default]
    Empty,
    Pending {
        temp_start: Day,
    },
    Confirmed {
        range: DayRange,
    },
}

/// Two-click range picker for one vehicle's calendar.
///
/// - Empty + click → Pending (first day held as temp start)
/// - Pending + click → Confirmed, ends ordered regardless of click order
/// - Confirmed + click → Pending on the clicked day, prior range cleared
///
/// Past or occupied days are rejected and leave the state as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeSelector {
    state: SelectionState,
}

impl DateRangeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn pending(&self) -> PendingSelection {
        match self.state {
            SelectionState::Pending { temp_start } => PendingSelection {
                temp_start: Some(temp_start),
            },
            _ => PendingSelection::default(),
        }
    }

    pub fn confirmed(&self) -> Option<DayRange> {
        match self.state {
            SelectionState::Confirmed { range } => Some(range),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.state = SelectionState::Empty;
    }

    /// Handle one day click. Returns the notifications to forward, in order.
    pub fn click(
        &mut self,
        date: Day,
        today: Day,
        index: &OverlapIndex,
    ) -> Result<Vec<DateSelect>, CalendarError> {
        if let Err(e) = check_selectable(date, today, index) {
            debug!(resource = index.resource_id(), "rejected click on {date}: {e}");
            metrics::counter!(SELECTIONS_REJECTED_TOTAL, "reason" => e.reason()).increment(1);
            return Err(e);
        }

        let (next, emitted) = match self.state {
            SelectionState::Empty => (SelectionState::Pending { temp_start: date }, Vec::new()),
            SelectionState::Pending { temp_start } => {
                let range = DayRange::ordered(temp_start, date);
                (
                    SelectionState::Confirmed { range },
                    vec![
                        DateSelect::set(range.start, Endpoint::Start),
                        DateSelect::set(range.end, Endpoint::End),
                    ],
                )
            }
            SelectionState::Confirmed { .. } => (
                SelectionState::Pending { temp_start: date },
                vec![DateSelect::clear(Endpoint::End), DateSelect::clear(Endpoint::Start)],
            ),
        };

        debug!(resource = index.resource_id(), "selection {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(emitted)
    }
}

fn check_selectable(date: Day, today: Day, index: &OverlapIndex) -> Result<(), CalendarError> {
    if date < today {
        return Err(CalendarError::PastDate { date, today });
    }
    if let Some(record) = index.occupant(date) {
        return Err(CalendarError::OccupiedDate {
            date,
            label: record.label(),
        });
    }
    Ok(())
}
