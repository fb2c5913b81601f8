#![forbid(unsafe_code)]

pub mod common;
pub mod interaction;
pub mod state;
pub mod vocab;

pub use common::{
    ContractViolation, ElapsedNs, SchemaVersion, StepIndex, Validate, WallClockNs,
};
