//! `ordrec-recon` — Order-export vs platform-report reconciliation engine.
//!
//! Pure engine crate: receives CSV text and pre-fetched reference data,
//! returns a `ReconReport`. No CLI, no network, no process-wide state.

pub mod aggregate;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod load;
pub mod model;
pub mod normalize;

pub use config::ReconConfig;
pub use engine::{run, ReconInput};
pub use error::ReconError;
pub use model::{OrderRecord, ReconReport, StatusClass};
