//! Expressly Core - Shared types library.
//!
//! This crate provides common types used across all Expressly components:
//! - `web` - The public site and member directory admin panel
//! - `integration-tests` - End-to-end tests against a running instance
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for identities, emails, handles, and the
//!   profile document schema
//! - [`error`] - The closed backend error taxonomy shared by the identity
//!   and document-store clients

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod types;

pub use error::BackendError;
pub use types::*;
