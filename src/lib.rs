//! manifest-sync: reconcile npm manifest metadata with GitHub
//!
//! The crate is split the same way the run is: a platform client trait,
//! content checkers that produce notes, and a reconciliation engine that
//! decides which branch to write to and whether a pull request is opened.

pub mod auth;
pub mod checks;
pub mod config;
pub mod error;
pub mod messages;
pub mod platform;
pub mod reconcile;
pub mod types;
