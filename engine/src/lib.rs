//! Pure, DB-agnostic competition-flow logic (C2-C5): vote tally, ordering,
//! the attempt state machine, and ranking. Depends on `storage` only
//! through the narrow `CatalogPort`/`Publisher` traits in `ports` -- never
//! on sqlx or axum directly, so the whole crate is testable without a
//! database or a running broker.

pub mod error;
pub mod ordering;
pub mod ports;
pub mod ranking;
pub mod state_machine;
pub mod tally;

pub use error::{EngineError, Result};
