//! Networking modules for the answer and admin HTTP APIs.
//!
//! SYSTEM CONTEXT
//! ==============
//! `http` owns the transport seam and credential handling, `api` maps
//! endpoints to requests and replies to typed results, and `types` defines
//! the wire schema.

pub mod api;
pub mod http;
pub mod types;
