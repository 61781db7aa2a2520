//! Domain models as exchanged with the remote API.
//!
//! Field names follow the remote system's JSON (`nombre`, `cliente_id`, ...)
//! through `serde(rename)`; the Rust side uses English names throughout.
//! Entities fetched from the remote always carry an id; the `New*` payloads
//! are what the client submits before an id has been assigned.

mod lenient;
pub mod offer;
pub mod request;
pub mod service;
pub mod user;

pub use offer::{NewOffer, Offer};
pub use request::{Coordinates, NewRequest, Request};
pub use service::{ServiceCatalogEntry, service_name};
pub use user::User;
