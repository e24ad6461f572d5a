//! elegant-core - Core library for Elegant Notes
//!
//! This crate contains the note model, the optimistic local store with its
//! remote mirror, the remote gateways, authentication, and the sync logic
//! shared by every Elegant Notes client.

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod persist;
pub mod remote;
pub mod share;
pub mod store;
pub mod sync;
mod util;

pub use error::{Error, Result};
pub use models::{Note, NoteId};
pub use store::NoteStore;
