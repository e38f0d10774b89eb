//! Validated string identifiers.
//!
//! Validation happens on deserialization, so a packet carrying a malformed
//! identifier never decodes.

use std::{fmt, ops::Deref, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("value must not be empty")]
    Empty,
    #[error("expected an id starting with `{prefix}_`, got {value:?}")]
    InvalidPrefix { prefix: &'static str, value: String },
}

/// A string guaranteed to be non-empty.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Wrap a string, rejecting the empty string.
    ///
    /// # Errors
    /// Returns [`IdError::Empty`] if `value` is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        if value.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(value))
    }

    /// Wrap a literal known to be non-empty.
    pub(crate) fn from_static(value: &'static str) -> Self {
        debug_assert!(!value.is_empty());
        Self(value.to_string())
    }

    /// Borrow the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl FromStr for NonEmptyString {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Deref for NonEmptyString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NonEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Prefix every identifier of this kind starts with (without `_`).
            pub const PREFIX: &'static str = $prefix;

            /// Validate and wrap an identifier.
            ///
            /// # Errors
            /// Returns an error if the value is empty or lacks the prefix.
            pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
                let value = value.into();
                if value.is_empty() {
                    return Err(IdError::Empty);
                }
                match value.strip_prefix(Self::PREFIX) {
                    Some(rest) if rest.starts_with('_') => Ok(Self(value)),
                    _ => Err(IdError::InvalidPrefix {
                        prefix: Self::PREFIX,
                        value,
                    }),
                }
            }

            /// Borrow the identifier as a string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

prefixed_id!(
    /// Customer identifier (`cust_...`).
    CustomerId,
    "cust"
);
prefixed_id!(
    /// Stored payment-method identifier (`pm_...`).
    PaymentMethodId,
    "pm"
);
prefixed_id!(
    /// Workspace identifier (`wosp_...`).
    WorkspaceId,
    "wosp"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_id_requires_prefix() {
        assert!(CustomerId::new("cust_123").is_ok());
        assert_eq!(
            CustomerId::new("pm_123"),
            Err(IdError::InvalidPrefix {
                prefix: "cust",
                value: "pm_123".to_string()
            })
        );
        assert_eq!(CustomerId::new(""), Err(IdError::Empty));
        // "customer_1" starts with "cust" but not "cust_"
        assert!(CustomerId::new("customer_1").is_err());
    }

    #[test]
    fn test_id_deserialization_validates() {
        let id: PaymentMethodId = serde_json::from_str("\"pm_card_visa\"").unwrap();
        assert_eq!(id.as_str(), "pm_card_visa");
        assert!(serde_json::from_str::<PaymentMethodId>("\"card_visa\"").is_err());
    }

    #[test]
    fn test_non_empty_string() {
        assert!(NonEmptyString::new("").is_err());
        let s: NonEmptyString = serde_json::from_str("\"stripe\"").unwrap();
        assert_eq!(&*s, "stripe");
        assert!(serde_json::from_str::<NonEmptyString>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"stripe\"");
    }
}
