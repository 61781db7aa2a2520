//! HerOol Core - Shared domain types.
//!
//! This crate provides the types shared by every HerOol component:
//! - `client` - Session store, remote gateway, poller and view controllers
//! - `cli` - Command-line front end
//! - `integration-tests` - End-to-end scenarios against a stub remote API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no timers.
//! Every identifier is assigned by the remote system; the client never mints one.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, prices, roles and statuses
//! - [`models`] - Users, service catalog entries, requests and offers as they
//!   travel over the wire

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
