//! Marketplace user.

use serde::{Deserialize, Serialize};

use crate::{Email, UserId, UserRole};

/// A registered user as returned by login, registration and profile lookups.
///
/// The password never appears here; it only travels in the login and
/// registration payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: Email,
    #[serde(rename = "tipo_usuario")]
    pub role: UserRole,
    /// Registration responses omit the phone number.
    #[serde(rename = "telefono", default)]
    pub phone: String,
    #[serde(
        rename = "calificacion",
        default,
        deserialize_with = "super::lenient::f64_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<f64>,
    #[serde(
        rename = "descripcion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bio: Option<String>,
}

impl User {
    #[must_use]
    pub fn is_customer(&self) -> bool {
        self.role == UserRole::Customer
    }

    #[must_use]
    pub fn is_technician(&self) -> bool {
        self.role == UserRole::Technician
    }
}
