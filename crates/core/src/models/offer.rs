//! Technician offers (bids) against requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{OfferId, OfferStatus, Price, RequestId, UserId};

/// A technician's bid against a request.
///
/// Offer lists are joined server-side, so rows carry denormalized fields
/// from the technician (name, rating, phone) or from the request and its
/// customer, depending on which list they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    #[serde(rename = "solicitud_id")]
    pub request_id: RequestId,
    #[serde(rename = "tecnico_id")]
    pub technician_id: UserId,
    #[serde(rename = "precio")]
    pub price: Price,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OfferStatus>,
    #[serde(
        rename = "fecha_oferta",
        default,
        with = "crate::types::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "tecnico_nombre", default, skip_serializing_if = "Option::is_none")]
    pub technician_name: Option<String>,
    #[serde(
        rename = "calificacion",
        default,
        deserialize_with = "super::lenient::f64_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<f64>,
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub technician_phone: Option<String>,
    #[serde(
        rename = "solicitud_descripcion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub request_description: Option<String>,
    #[serde(rename = "ubicacion", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "servicio_nombre", default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(rename = "cliente_nombre", default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
}

impl Offer {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, Some(OfferStatus::Accepted))
    }
}

/// Payload for submitting an offer; the remote assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOffer {
    #[serde(rename = "solicitud_id")]
    pub request_id: RequestId,
    #[serde(rename = "tecnico_id")]
    pub technician_id: UserId,
    #[serde(rename = "precio")]
    pub price: Price,
    #[serde(rename = "descripcion", default)]
    pub description: String,
}

impl NewOffer {
    /// The created entity once the remote has assigned `id`.
    #[must_use]
    pub fn into_offer(self, id: OfferId) -> Offer {
        Offer {
            id,
            request_id: self.request_id,
            technician_id: self.technician_id,
            price: self.price,
            description: (!self.description.is_empty()).then_some(self.description),
            status: None,
            created_at: None,
            technician_name: None,
            rating: None,
            technician_phone: None,
            request_description: None,
            location: None,
            service_name: None,
            customer_name: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_offer_for_request_row() {
        let json = r#"{
            "id": 42,
            "solicitud_id": 7,
            "tecnico_id": 3,
            "precio": "50.00",
            "descripcion": "Mañana temprano",
            "estado": "pendiente",
            "fecha_oferta": "Tue, 14 Jan 2025 11:00:00 GMT",
            "tecnico_nombre": "Luis",
            "calificacion": "4.80",
            "telefono": "555-0101"
        }"#;
        let offer: Offer = serde_json::from_str(json).unwrap();
        assert_eq!(offer.id, OfferId::new(42));
        assert_eq!(offer.price, Price::from_units(50));
        assert_eq!(offer.status, Some(OfferStatus::Pending));
        assert_eq!(offer.rating, Some(4.8));
        assert!(!offer.is_accepted());
    }

    #[test]
    fn test_new_offer_wire_shape() {
        let new = NewOffer {
            request_id: RequestId::new(7),
            technician_id: UserId::new(3),
            price: Price::from_units(50),
            description: String::new(),
        };
        let value = serde_json::to_value(&new).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "solicitud_id": 7,
                "tecnico_id": 3,
                "precio": 50.0,
                "descripcion": ""
            })
        );

        let offer = new.into_offer(OfferId::new(1));
        assert_eq!(offer.description, None);
    }
}
