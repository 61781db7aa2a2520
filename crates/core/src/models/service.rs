//! Service catalog reference data.

use serde::{Deserialize, Serialize};

use crate::ServiceId;

/// One category of home service (plumbing, electrical, ...).
///
/// Immutable reference data: fetched once per controller activation and
/// used to denormalize service names onto requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalogEntry {
    pub id: ServiceId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "icono", default)]
    pub icon_ref: String,
}

/// Look up a service's display name in a catalog slice.
#[must_use]
pub fn service_name(catalog: &[ServiceCatalogEntry], id: ServiceId) -> Option<&str> {
    catalog
        .iter()
        .find(|entry| entry.id == id)
        .map(|entry| entry.name.as_str())
}
