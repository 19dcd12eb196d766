//! Client engine for the document summarization service.
//!
//! SYSTEM CONTEXT
//! ==============
//! Two independent components share one HTTP contract:
//!
//! - [`services::chat::ChatSession`] drives the assistant conversation
//!   against `POST /chat`, one question at a time.
//! - [`services::history::HistoryReconciler`] keeps the admin content and
//!   chat histories in sync by polling, and applies confirmed deletions.
//!
//! Both take an `Arc<dyn net::http::Transport>`; production code uses
//! [`net::http::HttpClient`], which injects the bearer token and handles 401.

pub mod config;
pub mod error;
pub mod net;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::ClientConfig;
pub use error::{ClientError, ValidationError};
pub use net::http::{CredentialStore, HttpClient, MemoryCredentialStore, Transport};
pub use services::chat::ChatSession;
pub use services::history::{Confirm, DeleteOutcome, HistoryReconciler};
pub use services::poller::{Poller, spawn_poller};
