//! Error taxonomy for the Connect client.
//!
//! [`ConnectError`] is what every public operation returns. Its variants keep
//! local validation, resolution outcomes, transport failures and logically
//! missing sub-resources apart so callers can match on the category without
//! parsing messages.
//!
//! Marshaling failures are defined next to the engine in
//! [`crate::marshal::MarshalError`] and wrapped here.

use thiserror::Error;

use crate::marshal::MarshalError;

/// The kind of resource a resolution or validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A vault.
    Vault,
    /// An item inside a vault.
    Item,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vault => write!(f, "vault"),
            Self::Item => write!(f, "item"),
        }
    }
}

// ---------------------------------------------------------------------------
// Local validation
// ---------------------------------------------------------------------------

/// Caller-side precondition failures.
///
/// Always raised synchronously, before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `build` was called before a category was set.
    #[error("Item Category is required")]
    MissingCategory,

    /// The supplied category is not a member of the category enumeration.
    #[error("Item Category is invalid: '{value}'")]
    InvalidCategory {
        /// The rejected input.
        value: String,
    },

    /// A field asked for value generation with a recipe that breaks the
    /// character-set rules.
    #[error("Field '{}' contains an invalid Recipe: {reason}", label.as_deref().unwrap_or_default())]
    InvalidRecipe {
        /// Label of the offending field, when one was given.
        label: Option<String>,
        /// Which rule the recipe broke.
        reason: String,
    },

    /// An operation needs an identifier the record does not carry
    /// (e.g. updating an item that was never persisted).
    #[error("{resource} ID must be defined")]
    MissingIdentifier {
        /// The resource whose identifier is missing.
        resource: ResourceKind,
    },

    /// A file operation was given an empty file identifier.
    #[error("No file ID provided")]
    MissingFileId,

    /// A lookup was given an empty title-or-id query.
    #[error("Please provide either the name or the ID")]
    MissingQuery,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Failures reported by the transport adapter.
///
/// The core never inspects, translates or retries these; they surface to the
/// caller exactly as the adapter produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never produced an HTTP response (DNS, TLS, connection reset).
    #[error("network error: {message}")]
    Network {
        /// Adapter-supplied description.
        message: String,
    },

    /// The request exceeded its timeout.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-2xx status.
    #[error("server responded with status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-supplied message, or the canonical reason phrase.
        message: String,
    },

    /// The request could not be constructed (e.g. the path does not join onto
    /// the base URL).
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Adapter-supplied description.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

/// A successful fetch whose requested sub-resource is logically missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The item carries no field typed as a one-time password, or that field
    /// has no current code.
    #[error("No one-time password found for the item {item_id}")]
    OtpNotFound {
        /// Identifier of the fetched item (empty when the server omitted it).
        item_id: String,
    },

    /// The server returned a record without the identifier needed for the
    /// next request in a chain.
    #[error("{resource} returned by the server has no ID")]
    MissingId {
        /// The resource lacking an identifier.
        resource: ResourceKind,
    },

    /// Buffered file content is not valid UTF-8.
    #[error("content of file {file_id} is not valid UTF-8")]
    ContentNotUtf8 {
        /// Identifier of the file.
        file_id: String,
    },
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

/// Every failure a Connect client operation can produce.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Local precondition failure; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A title lookup matched nothing.
    #[error("No {resource}s found with title \"{title}\"")]
    NotFound {
        /// What was searched for.
        resource: ResourceKind,
        /// The title that matched nothing.
        title: String,
    },

    /// A title lookup matched more than one record.
    #[error("Found {count} {resource}s with title \"{title}\". Provide a more specific {resource} title")]
    Ambiguous {
        /// What was searched for.
        resource: ResourceKind,
        /// The ambiguous title.
        title: String,
        /// How many records matched.
        count: usize,
    },

    /// Pass-through of whatever the transport adapter reported.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The fetch succeeded but the requested sub-resource is missing.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A payload could not be shaped into the expected record.
    #[error(transparent)]
    Marshal(#[from] MarshalError),
}

impl ConnectError {
    /// HTTP-style status for the failure, where one is meaningful.
    ///
    /// Resolution failures use the codes the Connect server would return for
    /// the equivalent lookup: `404` for no match and `400` for an ambiguous
    /// title. Transport status errors report the server's own code.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Ambiguous { .. } => Some(400),
            Self::Transport(TransportError::Status { status, .. }) => Some(*status),
            _ => None,
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
    fn not_found_message_names_resource_and_title() {
        let err = ConnectError::NotFound {
            resource: ResourceKind::Vault,
            title: "Personal".into(),
        };
        assert_eq!(err.to_string(), "No vaults found with title \"Personal\"");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn ambiguous_message_includes_count() {
        let err = ConnectError::Ambiguous {
            resource: ResourceKind::Item,
            title: "Bank".into(),
            count: 2,
        };
        assert!(err.to_string().contains("Found 2 items"));
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn transport_errors_pass_through_unchanged() {
        let inner = TransportError::Status {
            status: 403,
            message: "Vault not in scope".into(),
        };
        let err = ConnectError::from(inner.clone());
        assert!(matches!(&err, ConnectError::Transport(e) if *e == inner));
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.to_string(), inner.to_string());
    }

    #[test]
    fn validation_errors_have_no_status() {
        let err = ConnectError::from(ValidationError::MissingFileId);
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "No file ID provided");
    }

    #[test]
    fn invalid_recipe_message_includes_label() {
        let err = ValidationError::InvalidRecipe {
            label: Some("password".into()),
            reason: "unknown character set 'EMOJI'".into(),
        };
        assert!(err.to_string().starts_with("Field 'password' contains an invalid Recipe"));
    }
}
