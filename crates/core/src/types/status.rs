//! Roles and status enums.
//!
//! Wire values are the remote system's (`cliente`, `abierta`, `aceptada`, ...).
//! Statuses are owned by the remote side, so unknown values are preserved in
//! an `Other` variant instead of failing the whole list decode.

use serde::{Deserialize, Serialize};

/// Which side of the marketplace a user acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    /// Posts requests and accepts offers.
    #[serde(rename = "cliente")]
    Customer,
    /// Browses open requests and submits offers.
    #[serde(rename = "tecnico")]
    Technician,
}

impl UserRole {
    /// The value the remote API uses for this role.
    #[must_use]
    pub const fn as_wire(&self) -> &'static str {
        match self {
            Self::Customer => "cliente",
            Self::Technician => "tecnico",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Technician => write!(f, "technician"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" | "cliente" => Ok(Self::Customer),
            "technician" | "tecnico" => Ok(Self::Technician),
            other => Err(format!("invalid role: {other}")),
        }
    }
}

/// Lifecycle of a customer request, as reported by the remote system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestStatus {
    /// Accepting offers.
    Open,
    /// An offer was accepted and the job is underway.
    InProgress,
    /// Any status this client does not know about.
    Other(String),
}

impl From<String> for RequestStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "abierta" => Self::Open,
            "en_progreso" => Self::InProgress,
            _ => Self::Other(value),
        }
    }
}

impl From<RequestStatus> for String {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Open => "abierta".to_owned(),
            RequestStatus::InProgress => "en_progreso".to_owned(),
            RequestStatus::Other(value) => value,
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::InProgress => write!(f, "in progress"),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

/// Lifecycle of a technician's offer.
///
/// Accepting one offer rejects its siblings; that transition happens on the
/// remote side and is only observed here after a refetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Other(String),
}

impl From<String> for OfferStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pendiente" => Self::Pending,
            "aceptada" => Self::Accepted,
            "rechazada" => Self::Rejected,
            _ => Self::Other(value),
        }
    }
}

impl From<OfferStatus> for String {
    fn from(status: OfferStatus) -> Self {
        match status {
            OfferStatus::Pending => "pendiente".to_owned(),
            OfferStatus::Accepted => "aceptada".to_owned(),
            OfferStatus::Rejected => "rechazada".to_owned(),
            OfferStatus::Other(value) => value,
        }
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_values() {
        assert_eq!(
            serde_json::to_string(&UserRole::Customer).unwrap(),
            "\"cliente\""
        );
        let role: UserRole = serde_json::from_str("\"tecnico\"").unwrap();
        assert_eq!(role, UserRole::Technician);
    }

    #[test]
    fn test_role_from_str_accepts_both_languages() {
        assert_eq!("customer".parse::<UserRole>(), Ok(UserRole::Customer));
        assert_eq!("Tecnico".parse::<UserRole>(), Ok(UserRole::Technician));
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_request_status_preserves_unknown_values() {
        let status: RequestStatus = serde_json::from_str("\"completada\"").unwrap();
        assert_eq!(status, RequestStatus::Other("completada".to_owned()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"completada\"");
    }

    #[test]
    fn test_offer_status_known_values() {
        let status: OfferStatus = serde_json::from_str("\"aceptada\"").unwrap();
        assert_eq!(status, OfferStatus::Accepted);
        assert_eq!(
            serde_json::to_string(&OfferStatus::Rejected).unwrap(),
            "\"rechazada\""
        );
    }
}
