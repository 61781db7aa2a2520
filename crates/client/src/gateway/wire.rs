//! Request and response bodies that exist only on the wire.

use herool_core::UserRole;
use serde::{Deserialize, Serialize};

/// `POST /usuarios/login` body.
#[derive(Serialize)]
pub(super) struct LoginBody<'a> {
    pub email: &'a str,
    pub contrasena: &'a str,
}

/// `POST /usuarios/register` body.
#[derive(Serialize)]
pub(super) struct RegisterBody<'a> {
    pub nombre: &'a str,
    pub email: &'a str,
    pub contrasena: &'a str,
    pub tipo_usuario: UserRole,
    pub telefono: &'a str,
}

/// Creation endpoints answer with the new id and a human message rather
/// than the full entity.
#[derive(Debug, Deserialize)]
pub(super) struct Created {
    pub id: i32,
    #[serde(rename = "mensaje", default)]
    pub message: Option<String>,
}

/// Either the full entity or the `{id, mensaje}` acknowledgement.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum CreatedOr<T> {
    Entity(T),
    Ack(Created),
}

/// Error body: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub error: String,
}
