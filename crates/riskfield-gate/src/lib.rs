//! Risk classification and the gate state machine.
//!
//! The aggregate score is a weighted combination of mean dimension risk and
//! propagated pressure. Classification maps it onto the ordered gate states;
//! the state machine allows movement in both directions except out of
//! `Irreversible`, which is terminal by policy, not by configuration.

pub mod classifier;
pub mod error;
pub mod fsm;
pub mod pnr;

pub use classifier::{aggregate_score, classify};
pub use error::GateError;
pub use fsm::GateCell;
pub use pnr::PnrPredictor;
