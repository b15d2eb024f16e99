//! WebDAV client over a pluggable HTTP exchange.

use crate::config::SyncConfig;
use crate::error::{EngineResult, SyncError};
use crate::transport::DavTransport;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use std::fmt;

/// User-Agent header sent with every request.
pub const USER_AGENT: &str = concat!("PromptHub-Sync/", env!("CARGO_PKG_VERSION"));

/// Header carrying the device identifier, for server-side log correlation.
pub const CLIENT_ID_HEADER: &str = "X-PromptHub-Client";

/// One HTTP request, method and all.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method, including WebDAV extension methods.
    pub method: &'static str,
    /// Absolute request URL.
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Request body, when the method carries one.
    pub body: Option<Vec<u8>>,
}

/// One HTTP response, reduced to what the client inspects.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

/// Executes HTTP requests on behalf of the WebDAV client.
///
/// The error type is a plain message: everything below the HTTP status
/// level (DNS, TLS, timeouts) is a transport failure to the engine.
pub trait HttpExchange: Send + Sync {
    /// Executes a request and returns the response.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String>;
}

/// WebDAV transport speaking Basic Auth over an [`HttpExchange`].
///
/// Maps WebDAV status conventions onto the [`DavTransport`] contract:
/// existence is probed with depth-0 PROPFIND, collections are created
/// with MKCOL where 405 Method Not Allowed means the collection is
/// already there, and 401 anywhere becomes an authentication error.
pub struct WebDavClient<E: HttpExchange> {
    base_url: String,
    authorization: String,
    client_id: String,
    exchange: E,
}

impl<E: HttpExchange> fmt::Debug for WebDavClient<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDavClient")
            .field("base_url", &self.base_url)
            .field("authorization", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl<E: HttpExchange> WebDavClient<E> {
    /// Creates a client for the configured endpoint.
    pub fn new(config: &SyncConfig, exchange: E) -> Self {
        let credentials = format!("{}:{}", config.username, config.password);
        Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            authorization: format!("Basic {}", BASE64_STANDARD.encode(credentials)),
            client_id: config.client_id.clone(),
            exchange,
        }
    }

    fn url_for(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn request(
        &self,
        method: &'static str,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> EngineResult<HttpResponse> {
        let mut headers = vec![
            ("Authorization".to_string(), self.authorization.clone()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
            (CLIENT_ID_HEADER.to_string(), self.client_id.clone()),
        ];
        if method == "PROPFIND" {
            headers.push(("Depth".to_string(), "0".to_string()));
        }

        let request = HttpRequest { method, url: self.url_for(path), headers, body };
        let response = self.exchange.execute(&request).map_err(SyncError::transport)?;

        if response.status == 401 {
            return Err(SyncError::auth(format!("{method} {path} returned 401")));
        }
        Ok(response)
    }
}

impl<E: HttpExchange> DavTransport for WebDavClient<E> {
    fn exists(&self, path: &str) -> EngineResult<bool> {
        let response = self.request("PROPFIND", path, None)?;
        match response.status {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(SyncError::transport(format!(
                "PROPFIND {path} returned unexpected status {status}"
            ))),
        }
    }

    fn ensure_directory(&self, path: &str) -> EngineResult<()> {
        let response = self.request("MKCOL", path, None)?;
        match response.status {
            // An existing collection answers 405; that is success here.
            200..=299 | 405 => Ok(()),
            status => Err(SyncError::transport(format!(
                "MKCOL {path} returned unexpected status {status}"
            ))),
        }
    }

    fn get(&self, path: &str) -> EngineResult<Vec<u8>> {
        let response = self.request("GET", path, None)?;
        match response.status {
            200..=299 => Ok(response.body),
            404 => Err(SyncError::not_found(path)),
            status => Err(SyncError::transport(format!(
                "GET {path} returned unexpected status {status}"
            ))),
        }
    }

    fn put(&self, path: &str, bytes: &[u8]) -> EngineResult<()> {
        let response = self.request("PUT", path, Some(bytes.to_vec()))?;
        match response.status {
            200..=299 => Ok(()),
            status => Err(SyncError::transport(format!(
                "PUT {path} returned unexpected status {status}"
            ))),
        }
    }
}

/// [`HttpExchange`] backed by a blocking reqwest client.
#[cfg(feature = "reqwest-client")]
#[derive(Debug)]
pub struct ReqwestExchange {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "reqwest-client")]
impl ReqwestExchange {
    /// Creates an exchange honoring the configured timeout.
    pub fn new(config: &SyncConfig) -> Result<Self, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| err.to_string())?;
        Ok(Self { client })
    }
}

#[cfg(feature = "reqwest-client")]
impl HttpExchange for ReqwestExchange {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|err| err.to_string())?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(|err| err.to_string())?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(|err| err.to_string())?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replays a scripted list of responses and records every request.
    struct ScriptedExchange {
        responses: Mutex<VecDeque<HttpResponse>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedExchange {
        fn new(responses: Vec<HttpResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().clone()
        }
    }

    impl HttpExchange for ScriptedExchange {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
            self.requests.lock().push(request.clone());
            self.responses
                .lock()
                .pop_front()
                .ok_or_else(|| "no scripted response left".to_string())
        }
    }

    fn client(responses: Vec<HttpResponse>) -> WebDavClient<ScriptedExchange> {
        let config = SyncConfig::new("https://dav.example.com/backups/", "alice", "secret")
            .with_client_id("device-1");
        WebDavClient::new(&config, ScriptedExchange::new(responses))
    }

    fn response(status: u16) -> HttpResponse {
        HttpResponse { status, body: Vec::new() }
    }

    #[test]
    fn exists_uses_depth_zero_propfind() {
        let client = client(vec![HttpResponse { status: 207, body: b"<xml/>".to_vec() }]);
        assert!(client.exists("manifest.json").unwrap());

        let requests = client.exchange.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "PROPFIND");
        assert_eq!(requests[0].url, "https://dav.example.com/backups/manifest.json");
        assert!(requests[0]
            .headers
            .contains(&("Depth".to_string(), "0".to_string())));
    }

    #[test]
    fn exists_maps_404_to_false() {
        let client = client(vec![response(404)]);
        assert!(!client.exists("manifest.json").unwrap());
    }

    #[test]
    fn empty_path_addresses_the_collection() {
        let client = client(vec![response(207)]);
        client.exists("").unwrap();

        let requests = client.exchange.requests();
        assert_eq!(requests[0].url, "https://dav.example.com/backups");
    }

    #[test]
    fn every_request_carries_auth_and_client_id() {
        let client = client(vec![response(200)]);
        client.get("data.json").unwrap();

        let requests = client.exchange.requests();
        let headers = &requests[0].headers;
        assert!(headers.iter().any(|(name, value)| {
            name == "Authorization" && value == &format!("Basic {}", BASE64_STANDARD.encode("alice:secret"))
        }));
        assert!(headers
            .contains(&(CLIENT_ID_HEADER.to_string(), "device-1".to_string())));
        assert!(headers
            .contains(&("User-Agent".to_string(), USER_AGENT.to_string())));
    }

    #[test]
    fn debug_output_redacts_the_credentials() {
        let client = client(vec![]);
        let rendered = format!("{:?}", client);

        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("secret"));
        assert!(!rendered.contains(&BASE64_STANDARD.encode("alice:secret")));
    }

    #[test]
    fn mkcol_treats_405_as_success() {
        let existing = client(vec![response(405)]);
        existing.ensure_directory("").unwrap();

        let created = client(vec![response(201)]);
        created.ensure_directory("").unwrap();
    }

    #[test]
    fn get_distinguishes_missing_from_failed() {
        let missing = client(vec![response(404)]);
        let err = missing.get("data.json").unwrap_err();
        assert!(err.is_not_found());

        let failing = client(vec![response(500)]);
        let err = failing.get("data.json").unwrap_err();
        assert!(!err.is_not_found());
        assert!(matches!(err, SyncError::Transport { .. }));
    }

    #[test]
    fn unauthorized_is_an_auth_error_everywhere() {
        for run in 0..3 {
            let client = client(vec![response(401)]);
            let err = match run {
                0 => client.exists("x").unwrap_err(),
                1 => client.get("x").unwrap_err(),
                _ => client.put("x", b"body").unwrap_err(),
            };
            assert!(err.is_auth());
        }
    }

    #[test]
    fn put_sends_the_body() {
        let client = client(vec![response(201)]);
        client.put("data.json", b"payload-bytes").unwrap();

        let requests = client.exchange.requests();
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].body.as_deref(), Some(&b"payload-bytes"[..]));
    }

    #[test]
    fn exchange_failure_is_a_transport_error() {
        let client = client(vec![]);
        let err = client.get("data.json").unwrap_err();
        assert!(matches!(err, SyncError::Transport { .. }));
    }
}
