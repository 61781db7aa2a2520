//! Customer service requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RequestId, RequestStatus, ServiceId, UserId};

/// A geographic point attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A customer's posted need for a service.
///
/// Status is owned by the remote system and only changes indirectly when
/// one of the request's offers is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    #[serde(rename = "cliente_id")]
    pub customer_id: UserId,
    #[serde(rename = "servicio_id")]
    pub service_id: ServiceId,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "ubicacion")]
    pub location: String,
    #[serde(
        default,
        deserialize_with = "super::lenient::f64_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub latitude: Option<f64>,
    #[serde(
        default,
        deserialize_with = "super::lenient::f64_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub longitude: Option<f64>,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
    #[serde(
        rename = "fecha_creada",
        default,
        with = "crate::types::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "cliente_nombre",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_name: Option<String>,
    #[serde(
        rename = "servicio_nombre",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub service_name: Option<String>,
}

impl Request {
    /// Both coordinates, when the customer supplied them.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates {
            latitude: self.latitude?,
            longitude: self.longitude?,
        })
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.status, Some(RequestStatus::Open))
    }
}

/// Payload for creating a request; the remote assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRequest {
    #[serde(rename = "cliente_id")]
    pub customer_id: UserId,
    #[serde(rename = "servicio_id")]
    pub service_id: ServiceId,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "ubicacion")]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl NewRequest {
    /// The created entity once the remote has assigned `id`.
    ///
    /// Fields the remote fills in (status, timestamps, names) stay empty
    /// until the next list fetch.
    #[must_use]
    pub fn into_request(self, id: RequestId) -> Request {
        Request {
            id,
            customer_id: self.customer_id,
            service_id: self.service_id,
            description: self.description,
            location: self.location,
            latitude: self.latitude,
            longitude: self.longitude,
            status: None,
            created_at: None,
            customer_name: None,
            service_name: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_open_request_row() {
        let json = r#"{
            "id": 7,
            "cliente_id": 1,
            "servicio_id": 2,
            "descripcion": "Fuga en la cocina",
            "ubicacion": "Calle 1",
            "latitude": null,
            "longitude": null,
            "estado": "abierta",
            "fecha_creada": "Tue, 14 Jan 2025 10:30:00 GMT",
            "cliente_nombre": "Ana",
            "servicio_nombre": "Plomería"
        }"#;
        let request: Request = serde_json::from_str(json).unwrap();
        assert_eq!(request.id, RequestId::new(7));
        assert!(request.is_open());
        assert!(request.created_at.is_some());
        assert_eq!(request.coordinates(), None);
    }

    #[test]
    fn test_coordinates_as_strings() {
        let json = r#"{"id": 1, "cliente_id": 1, "servicio_id": 1, "descripcion": "d",
            "ubicacion": "u", "latitude": "4.60", "longitude": "-74.08"}"#;
        let request: Request = serde_json::from_str(json).unwrap();
        let coords = request.coordinates().unwrap();
        assert!((coords.latitude - 4.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_new_request_wire_shape() {
        let new = NewRequest {
            customer_id: UserId::new(1),
            service_id: ServiceId::new(2),
            description: "Fuga".to_owned(),
            location: "Calle 1".to_owned(),
            latitude: None,
            longitude: None,
        };
        let value = serde_json::to_value(&new).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "cliente_id": 1,
                "servicio_id": 2,
                "descripcion": "Fuga",
                "ubicacion": "Calle 1"
            })
        );

        let created = new.into_request(RequestId::new(9));
        assert_eq!(created.id, RequestId::new(9));
        assert_eq!(created.status, None);
    }
}
