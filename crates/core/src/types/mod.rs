//! Core types for Expressly.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod handle;
pub mod id;
pub mod profile;
pub mod session;

pub use email::{Email, EmailError};
pub use handle::{Handle, HandleError};
pub use id::UserId;
pub use profile::{NewProfile, Profile, ProfileFields, ProfileUpdate};
pub use session::Session;
