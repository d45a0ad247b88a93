//! Data models for the client
//!
//! `upload` holds the direct upload protocol types, `profile` the avatar/banner
//! references a caller persists once an upload succeeds.

mod profile;
mod upload;

pub use profile::*;
pub use upload::*;
