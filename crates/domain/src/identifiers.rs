//! Newtype identifiers and the title-or-id query classifier.
//!
//! Every resource the Connect server assigns an identity to is represented as a
//! distinct newtype wrapping a `String`. This prevents accidentally passing an
//! [`ItemId`] where a [`VaultId`] is expected even though both are 26-character
//! strings on the wire.
//!
//! [`Query`] is the tagged form of a caller-supplied lookup string: either a
//! stable identifier or a human title. It is produced by [`Query::classify`] and
//! never by inspecting optional fields.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ValidationError;

/// Length of every server-assigned identifier.
pub const ID_LENGTH: usize = 26;

/// Prefix carried by client-generated section identifiers.
pub const SECTION_ID_PREFIX: &str = "Section_";

/// Returns `true` if `value` has the identifier shape: exactly
/// [`ID_LENGTH`] characters, each a lower-case ASCII letter or a digit.
pub fn is_valid_id(value: &str) -> bool {
    value.len() == ID_LENGTH
        && value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identifies a vault. Assigned by the server; read-only to this client.
    VaultId
}

string_id! {
    /// Identifies an item within a vault. Absent on client-built drafts until
    /// the server persists them.
    ItemId
}

string_id! {
    /// Identifies a section. Unique only within its parent item.
    SectionId
}

string_id! {
    /// Identifies a file attached to an item.
    FileId
}

impl SectionId {
    /// Generates a fresh section identifier: [`SECTION_ID_PREFIX`] followed by
    /// an [`ID_LENGTH`]-character lower-case alphanumeric suffix.
    ///
    /// Uniqueness only matters within one item, so the suffix is cut from a
    /// random UUID rather than drawn from a cryptographic source.
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(format!("{SECTION_ID_PREFIX}{}", &simple[..ID_LENGTH]))
    }

    /// Returns `true` if this id is `Section_<valid id>`.
    pub fn is_generated(&self) -> bool {
        self.0
            .strip_prefix(SECTION_ID_PREFIX)
            .is_some_and(is_valid_id)
    }
}

// ---------------------------------------------------------------------------
// Query classification
// ---------------------------------------------------------------------------

/// A lookup key for a vault or item: either its identifier or its title.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    /// The query has the identifier shape and is used for a direct fetch.
    ById(String),
    /// Anything else; resolved through an exact-match title filter.
    ByTitle(String),
}

impl Query {
    /// Classifies `raw` as an identifier or a title.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingQuery`] when `raw` is empty.
    pub fn classify(raw: &str) -> Result<Self, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::MissingQuery);
        }
        if is_valid_id(raw) {
            Ok(Self::ById(raw.to_owned()))
        } else {
            Ok(Self::ByTitle(raw.to_owned()))
        }
    }

    /// Returns the raw query string regardless of its kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ById(s) | Self::ByTitle(s) => s,
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ById(id) => write!(f, "id {id}"),
            Self::ByTitle(title) => write!(f, "title \"{title}\""),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_id_shape() {
        assert!(is_valid_id("llriqid2uq6ucvxpe2nta4hcb1"));
    }

    #[test]
    fn invalid_id_shapes() {
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("123"));
        assert!(!is_valid_id("llriqid2uq6ucvxpe2nta-hcb1"));
        assert!(!is_valid_id("Llriqid2uq6ucvxpe2nta4hcb1"));
        assert!(!is_valid_id("llriqid2uq6ucvxpe2nta4hcb12"));
    }

    #[test]
    fn string_id_rejects_empty() {
        assert!(VaultId::new("").is_none());
        assert_eq!(VaultId::new("abc").map(|v| v.to_string()), Some("abc".into()));
    }

    #[test]
    fn string_id_serializes_transparently() {
        let id = ItemId::new("abc").unwrap();
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("abc"));
    }

    #[test]
    fn generated_section_id_has_prefix_and_valid_suffix() {
        let id = SectionId::generate();
        assert!(id.as_str().starts_with(SECTION_ID_PREFIX));
        let suffix = id.as_str().split('_').nth(1).unwrap();
        assert!(is_valid_id(suffix));
        assert!(id.is_generated());
    }

    #[test]
    fn generated_section_ids_differ() {
        assert_ne!(SectionId::generate(), SectionId::generate());
    }

    #[test]
    fn classify_id_and_title() {
        assert_eq!(
            Query::classify("llriqid2uq6ucvxpe2nta4hcb1").unwrap(),
            Query::ById("llriqid2uq6ucvxpe2nta4hcb1".into())
        );
        assert_eq!(
            Query::classify("Bank of 1Password").unwrap(),
            Query::ByTitle("Bank of 1Password".into())
        );
        // Right length, wrong alphabet.
        assert!(matches!(
            Query::classify("LLRIQID2UQ6UCVXPE2NTA4HCB1").unwrap(),
            Query::ByTitle(_)
        ));
    }

    #[test]
    fn classify_empty_is_rejected() {
        assert_eq!(Query::classify(""), Err(ValidationError::MissingQuery));
    }
}
