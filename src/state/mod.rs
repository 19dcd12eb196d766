//! Client-side state models.
//!
//! DESIGN
//! ======
//! State is split by domain (`chat`, `history`) into synchronous machines
//! with no I/O; the async drivers in `services` sequence requests around them.

pub mod chat;
pub mod history;
