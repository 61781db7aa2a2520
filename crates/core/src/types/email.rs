//! Login email address.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why an address was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email is required")]
    Empty,

    #[error("email is longer than {max} characters")]
    TooLong { max: usize },

    #[error("email cannot contain spaces")]
    ContainsWhitespace,

    /// Zero or several `@`.
    #[error("email must contain exactly one @")]
    AtSymbol,

    #[error("email is missing the part before @")]
    EmptyLocalPart,

    #[error("email is missing the domain after @")]
    EmptyDomain,
}

/// The address an account signs in with.
///
/// Parsing only checks shape; whether an account exists is up to the
/// remote. Addresses decoded from remote payloads are taken as-is.
///
/// ```
/// use herool_core::Email;
///
/// let email = Email::parse(" Ana@Example.com ").unwrap();
/// assert_eq!(email.as_str(), "Ana@Example.com");
/// assert!(email.matches("ana@example.com"));
/// assert!(Email::parse("ana@@example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Parse form input, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first problem found.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let address = input.trim();
        if address.is_empty() {
            return Err(EmailError::Empty);
        }
        if address.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if address.chars().any(char::is_whitespace) {
            return Err(EmailError::ContainsWhitespace);
        }

        match address.split('@').collect::<Vec<_>>().as_slice() {
            [local, domain] => {
                if local.is_empty() {
                    Err(EmailError::EmptyLocalPart)
                } else if domain.is_empty() {
                    Err(EmailError::EmptyDomain)
                } else {
                    Ok(Self(address.to_owned()))
                }
            }
            _ => Err(EmailError::AtSymbol),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison, the way the remote matches logins.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_login_addresses() {
        for address in ["ana@example.com", "luis.perez+trabajo@correo.co", "a@b"] {
            assert!(Email::parse(address).is_ok(), "{address}");
        }
    }

    #[test]
    fn test_form_input_is_trimmed() {
        let email = Email::parse("\tana@example.com  ").unwrap();
        assert_eq!(email.to_string(), "ana@example.com");
    }

    #[test]
    fn test_refusals() {
        assert_eq!(Email::parse("  "), Err(EmailError::Empty));
        assert_eq!(Email::parse("ana"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("a@b@c"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("@example.com"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("ana@"), Err(EmailError::EmptyDomain));
        assert_eq!(
            Email::parse("ana perez@example.com"),
            Err(EmailError::ContainsWhitespace)
        );
        let long = format!("{}@example.com", "x".repeat(Email::MAX_LENGTH));
        assert_eq!(
            Email::parse(&long),
            Err(EmailError::TooLong {
                max: Email::MAX_LENGTH
            })
        );
    }

    #[test]
    fn test_matches_ignores_case() {
        let email = Email::parse("Ana@Example.com").unwrap();
        assert!(email.matches(" ana@EXAMPLE.com"));
        assert!(!email.matches("ana@example.org"));
    }

    #[test]
    fn test_wire_form_is_a_plain_string() {
        let email: Email = serde_json::from_str("\"ana@example.com\"").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"ana@example.com\"");
    }
}
