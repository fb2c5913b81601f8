#![forbid(unsafe_code)]

pub mod document;
pub mod ports;
pub mod session;

pub use document::{PersistError, SessionDocument};
pub use ports::{ConsistencyOutcome, PortMatching};
pub use session::{OracleError, TestOracle};
