mod controller;
mod error;
mod session;

pub use controller::{EditState, ReservationEditController, SaveOutcome};
pub use error::EditError;
pub use session::{EditSession, PriceSource};
