//! Client-side data layer for a user administration screen.
//!
//! A single actor owns the cached user collection. Edits and deletes are
//! applied optimistically and rolled back if the server rejects them; creates
//! wait for the server. Selection and bulk delete sit on top of the cache,
//! and a notifier turns settlement outcomes into user-facing notices.

pub mod api;
pub mod app_system;
pub mod bulk;
pub mod cache;
pub mod clients;
pub mod domain;
pub mod error;
pub mod messages;
pub mod notify;
pub mod selection;
pub mod user;

#[cfg(test)]
mod mock_framework;
