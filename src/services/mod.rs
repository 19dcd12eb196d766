//! Async drivers that join client state to the transport.
//!
//! SYSTEM CONTEXT
//! ==============
//! `chat` runs the single-flight question flow, `history` runs polling
//! rounds and confirmed deletions, and `poller` schedules rounds on a timer.
//! The two components share only the `Transport` they are given.

pub mod chat;
pub mod history;
pub mod poller;
