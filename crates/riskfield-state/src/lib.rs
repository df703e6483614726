//! State Vector Store and the decision physics that advance it.
//!
//! A state vector maps dimension name to a value in `[0, 1]` (1.0 is fully
//! healthy; risk is `1 - value`). The only two mutation paths are half-life
//! recovery (`advance`) and all-or-nothing event application (`apply_event`);
//! both are pure functions of the prior vector, the domain configuration,
//! and their explicit inputs, which is what makes ledger replay exact.

pub mod error;
pub mod store;
pub mod vector;

pub use error::StateError;
pub use store::{EntityState, StateStore};
pub use vector::StateVector;
