//! Value types carried by the models: ids, login emails, prices, roles and statuses.

pub mod email;
pub mod id;
pub mod price;
pub mod status;
pub mod timestamp;

pub use email::{Email, EmailError};
pub use id::{IdError, OfferId, RequestId, ServiceId, UserId};
pub use price::Price;
pub use status::*;
