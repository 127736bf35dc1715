mod session;
mod state;

pub use session::{CookOutcome, CookRecord, CookSession};
pub use state::{DoorState, Effect, StateMachine, Transition, Trigger};
