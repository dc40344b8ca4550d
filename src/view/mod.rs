//! Derived view models.
//!
//! Pure, synchronous transforms from raw backend payloads into chart- and
//! table-ready structures.

mod channels;
mod latency;
mod uptime;
mod usage;

pub use channels::*;
pub use latency::*;
pub use uptime::*;
pub use usage::*;
