//! reqwest implementation of the [`Transport`] port.

use async_trait::async_trait;
use domain::{from_wire, ByteStream, ErrorResponse, Method, Request, Response, Transport, TransportError};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use tracing::{debug, warn};

use crate::config::{ConfigError, ConnectConfig};

/// `User-Agent` sent on every request.
pub const USER_AGENT: &str = concat!("opconnect/", env!("CARGO_PKG_VERSION"));

/// Sends Connect requests over HTTP(S).
///
/// Request paths are joined onto the configured base URL, so
/// `http://host/` + `/v1/vaults` and `http://host` + `v1/vaults` both reach
/// `http://host/v1/vaults`.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl HttpTransport {
    /// Builds a transport from `config`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if the server URL does not parse or the HTTP
    /// client cannot be built.
    pub fn new(config: &ConnectConfig) -> Result<Self, ConfigError> {
        let mut base_url = Url::parse(&config.server_url).map_err(|e| ConfigError::Invalid {
            name: "server_url",
            reason: e.to_string(),
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout);
        if !config.keep_alive {
            builder = builder.pool_max_idle_per_host(0);
        }
        let http = builder.build().map_err(|e| ConfigError::Invalid {
            name: "http client",
            reason: e.to_string(),
        })?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
        })
    }

    /// Absolute URL for a request path.
    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidRequest {
                message: format!("cannot join '{path}' onto base URL: {e}"),
            })
    }

    async fn execute(&self, request: Request) -> Result<reqwest::Response, TransportError> {
        let url = self.url_for(&request.path)?;
        debug!(method = %request.method, url = %url, "http request");

        let mut builder = self
            .http
            .request(to_reqwest_method(request.method), url)
            .bearer_auth(&self.token);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        check_status(response).await
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_builder() {
        TransportError::InvalidRequest {
            message: error.to_string(),
        }
    } else {
        TransportError::Network {
            message: error.to_string(),
        }
    }
}

/// Passes 2xx responses through and turns everything else into
/// [`TransportError::Status`], preferring the server's own message.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice(&body)
        .ok()
        .and_then(|wire| from_wire::<ErrorResponse>(wire).ok())
        .and_then(|error| error.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown status").to_owned());

    warn!(status = status.as_u16(), message = %message, "connect server error");
    Err(TransportError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let response = self.execute(request).await?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(Response::new(status, body.to_vec()))
    }

    async fn send_streaming(&self, request: Request) -> Result<ByteStream, TransportError> {
        let response = self.execute(request).await?;
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(map_reqwest_error));
        Ok(Box::pin(stream))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::TryStreamExt;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const TOKEN: &str = "test-token";

    fn transport_for(base: &str) -> HttpTransport {
        HttpTransport::new(&ConnectConfig::new(base, TOKEN)).unwrap()
    }

    #[tokio::test]
    async fn sends_auth_user_agent_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/vaults/"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("User-Agent", USER_AGENT))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "v"}])))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport_for(&server.uri())
            .send(Request::get("v1/vaults/"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.json().unwrap(), json!([{"id": "v"}]));
    }

    #[tokio::test]
    async fn joins_paths_without_double_slashes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/vaults/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(2)
            .mount(&server)
            .await;

        let with_slash = transport_for(&format!("{}/", server.uri()));
        with_slash.send(Request::get("/v1/vaults/abc")).await.unwrap();
        let without_slash = transport_for(&server.uri());
        without_slash.send(Request::get("v1/vaults/abc")).await.unwrap();
    }

    #[tokio::test]
    async fn keeps_base_path_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/connect/v1/vaults/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        transport_for(&format!("{}/connect", server.uri()))
            .send(Request::get("v1/vaults/"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn sends_filter_query_and_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/vaults/"))
            .and(query_param("filter", "title eq \"Demo\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/vaults/v/items/"))
            .and(body_json(json!({"title": "new"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "i"})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server.uri());
        transport
            .send(Request::get("v1/vaults/").with_query("filter", "title eq \"Demo\""))
            .await
            .unwrap();
        transport
            .send(Request::post("v1/vaults/v/items/", json!({"title": "new"})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn error_body_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/vaults/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"status": 404, "message": "Invalid Vault UUID"})),
            )
            .mount(&server)
            .await;

        let err = transport_for(&server.uri())
            .send(Request::get("v1/vaults/missing"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Status {
                status: 404,
                message: "Invalid Vault UUID".into()
            }
        );
    }

    #[tokio::test]
    async fn non_json_error_uses_reason_phrase() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let err = transport_for(&server.uri())
            .send(Request::get("v1/vaults/"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Status {
                status: 500,
                message: "Internal Server Error".into()
            }
        );
    }

    #[tokio::test]
    async fn per_request_timeout_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = transport_for(&server.uri())
            .send(Request::get("v1/vaults/").with_timeout(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Timeout);
    }

    #[tokio::test]
    async fn streams_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/vaults/v/items/i/files/f/content"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"file body".to_vec()))
            .mount(&server)
            .await;

        let stream = transport_for(&server.uri())
            .send_streaming(Request::get("v1/vaults/v/items/i/files/f/content"))
            .await
            .unwrap();
        let chunks: Vec<Vec<u8>> = stream.try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"file body");
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let err = HttpTransport::new(&ConnectConfig::new("not a url", TOKEN)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "server_url", .. }));
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", transport_for("http://localhost:8080"));
        assert!(!rendered.contains(TOKEN));
    }
}
