//! daybook - Personal journal with daily ratings
//!
//! Entries carry rich text, a 1-5 rating for the day and file attachments.
//! Incomplete entries can be kept as drafts, which stay visible for a
//! configurable retention window. Storage, blob hosting and identity are
//! reached through async traits with in-memory and local-directory backends.

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::DaybookError;
