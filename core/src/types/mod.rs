//! Domain DTOs for the wenshu API, grouped by capability.
//!
//! # Design
//! Field names are camelCase on the wire. Optional request fields are
//! omitted when `None` so partial updates only touch what the caller set.
//! Payloads whose schema is known (chart configurations) are tagged enums;
//! genuinely free-form data (query context, result rows, preview rows)
//! stays a JSON object map.

pub mod auth;
pub mod chat;
pub mod common;
pub mod users;

pub use auth::*;
pub use chat::*;
pub use common::*;
pub use users::*;
