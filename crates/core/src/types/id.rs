//! Remote-assigned identifiers.
//!
//! The remote numbers every user, service, request and offer with a
//! positive integer. Each kind gets its own newtype so a `RequestId` can
//! never be passed where an `OfferId` is expected.

/// Error reading an id from text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("{kind} id must be a number, got {input:?}")]
    NotANumber { kind: &'static str, input: String },

    #[error("{kind} id must be positive, got {value}")]
    NotPositive { kind: &'static str, value: i32 },
}

/// Define an `i32`-backed id newtype.
///
/// The second argument names the kind in parse errors.
///
/// ```rust
/// # use herool_core::define_id;
/// define_id!(InvoiceId, "invoice");
///
/// let id: InvoiceId = "7".parse().unwrap();
/// assert_eq!(id, InvoiceId::new(7));
/// assert!("0".parse::<InvoiceId>().is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $kind:literal) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw id. Values decoded from the remote are taken as-is.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        /// Command-line input: a positive integer.
        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                let value: i32 = s.trim().parse().map_err(|_| {
                    $crate::types::id::IdError::NotANumber {
                        kind: $kind,
                        input: s.to_owned(),
                    }
                })?;
                if value <= 0 {
                    return Err($crate::types::id::IdError::NotPositive { kind: $kind, value });
                }
                Ok(Self(value))
            }
        }
    };
}

define_id!(UserId, "user");
define_id!(ServiceId, "service");
define_id!(RequestId, "request");
define_id!(OfferId, "offer");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_form_is_a_bare_integer() {
        assert_eq!(serde_json::to_string(&RequestId::new(7)).unwrap(), "7");
        let parsed: OfferId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, OfferId::new(42));
    }

    #[test]
    fn test_parse_from_command_line() {
        let id: UserId = " 12 ".parse().unwrap();
        assert_eq!(id.as_i32(), 12);
        assert_eq!(id.to_string(), "12");
    }

    #[test]
    fn test_parse_errors_name_the_kind() {
        let err = "abc".parse::<RequestId>().unwrap_err();
        assert_eq!(err.to_string(), "request id must be a number, got \"abc\"");

        let err = "-3".parse::<ServiceId>().unwrap_err();
        assert_eq!(
            err,
            IdError::NotPositive {
                kind: "service",
                value: -3
            }
        );
    }
}
