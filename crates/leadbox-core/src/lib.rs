//! Core library for Leadbox.
//!
//! Everything between a visitor's keystrokes and a stored contact request:
//! phone normalization, field validation, the client-side form model, the
//! request store with its status workflow, and the admin authenticator. This
//! crate depends on `leadbox-storage` for the storage backend trait and knows
//! nothing about HTTP.

pub mod auth;
pub mod error;
pub mod form;
pub mod phone;
pub mod store;
pub mod submission;
pub mod validate;
