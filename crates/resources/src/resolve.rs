//! Request helpers shared by the resource handles.
//!
//! Every call goes through [`send_json`] or [`send_raw`] so request logging and
//! body decoding happen in one place. [`single_match`] enforces the rule that a
//! title lookup must match exactly one record.

use domain::{ConnectError, DomainError, MarshalError, Request, ResourceKind, Response, Transport};
use serde_json::Value;
use tracing::debug;

/// Sends `request` and returns the raw response.
pub(crate) async fn send_raw(
    transport: &dyn Transport,
    request: Request,
) -> Result<Response, ConnectError> {
    debug!(method = %request.method, path = %request.path, "sending request");
    let response = transport.send(request).await?;
    Ok(response)
}

/// Sends `request` and parses the response body as JSON.
pub(crate) async fn send_json(
    transport: &dyn Transport,
    request: Request,
) -> Result<Value, ConnectError> {
    let response = send_raw(transport, request).await?;
    let body = response.json().map_err(MarshalError::from)?;
    Ok(body)
}

/// Returns the only element of `matches`.
///
/// # Errors
///
/// [`ConnectError::NotFound`] for no matches, [`ConnectError::Ambiguous`] for
/// more than one.
pub(crate) fn single_match<T>(
    mut matches: Vec<T>,
    resource: ResourceKind,
    title: &str,
) -> Result<T, ConnectError> {
    match matches.len() {
        0 => Err(ConnectError::NotFound {
            resource,
            title: title.to_owned(),
        }),
        1 => Ok(matches.remove(0)),
        count => Err(ConnectError::Ambiguous {
            resource,
            title: title.to_owned(),
            count,
        }),
    }
}

/// Unwraps an identifier the server should have sent.
pub(crate) fn require_id<T>(id: Option<T>, resource: ResourceKind) -> Result<T, ConnectError> {
    id.ok_or_else(|| DomainError::MissingId { resource }.into())
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_match_cardinality() {
        assert_eq!(single_match(vec![7], ResourceKind::Vault, "t").unwrap(), 7);

        let none = single_match(Vec::<u8>::new(), ResourceKind::Vault, "t").unwrap_err();
        assert!(matches!(none, ConnectError::NotFound { resource: ResourceKind::Vault, .. }));

        let many = single_match(vec![1, 2, 3], ResourceKind::Item, "t").unwrap_err();
        assert!(matches!(many, ConnectError::Ambiguous { count: 3, .. }));
    }

    #[test]
    fn require_id_reports_resource() {
        let err = require_id::<String>(None, ResourceKind::Item).unwrap_err();
        assert!(matches!(
            err,
            ConnectError::Domain(DomainError::MissingId { resource: ResourceKind::Item })
        ));
    }
}
