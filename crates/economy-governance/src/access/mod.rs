//! Store access
//!
//! Whether a user may spend MC in the store right now, and how much.

mod guards;
mod logic;
mod service;

pub use guards::check_guards;
pub use logic::{available_balance, evaluate_access};
pub use service::{AccessOutcome, StoreAccessService};
