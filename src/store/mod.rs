//!  Storage is organized through [document_store::DocumentStore].
//!  The basic idea is:
//!   - There is one document holding every task, check-in and user.
//!   - The document lives as a single JSON value under a well-known key of a
//!     [backend::DocumentBackend].
//!   - Callers talk to [repository::CheckinRepository] and never see the document layout.

pub mod backend;
pub mod document_store;
pub mod entities;
pub mod error;
pub mod registration;
pub mod repository;
