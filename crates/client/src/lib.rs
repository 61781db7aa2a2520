//! HerOol Client - Polling synchronization client for the service marketplace.
//!
//! Customers post requests for home services and technicians bid on them.
//! This crate keeps a local view of requests and offers in step with the
//! remote API, which remains the only source of truth.
//!
//! # Architecture
//!
//! - [`session`] - Who is signed in, persisted to a key-value store and
//!   observable through a replay-latest channel
//! - [`gateway`] - One typed method per remote operation, no business logic
//! - [`poller`] - Fixed-cadence refresh primitive with tab-scoped activation
//! - [`generation`] - Latest-response-wins guard for each cached resource
//! - [`controllers`] - Customer, technician and request-detail view state
//! - [`auth`] - Login, registration and logout flows
//! - [`config`] - Environment-driven configuration
//!
//! All view state lives in `tokio::sync::watch` channels owned by the
//! controller that fetched it. Front ends subscribe and render; they never
//! mutate it directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod controllers;
pub mod error;
pub mod gateway;
pub mod generation;
pub mod poller;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ApiConfig, ApiEnvironment, ClientConfig, PollSettings};
pub use error::{ClientError, ValidationError};
pub use gateway::{Gateway, GatewayError, HttpGateway};
pub use poller::Poller;
pub use session::{FileStore, KeyValueStore, MemoryStore, SessionStore};
