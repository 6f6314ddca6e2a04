//! Monotonic sequence counters.
//!
//! Hands out strictly increasing integers per scope (the global order-number
//! counter and one counter per product category), safe under concurrent
//! callers.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod scope;
pub mod store;

pub use error::{Result, SequenceError};
pub use memory::InMemorySequenceCounter;
pub use postgres::PostgresSequenceCounter;
pub use scope::CounterScope;
pub use store::{SequenceCounter, SequenceCounterExt};
