//! HTTP transport implementation.
//!
//! This module provides an HTTP-based transport for the client.
//! The actual HTTP client is abstracted via a trait to allow different
//! implementations (reqwest, hyper, etc.).

use crate::error::{ClientError, ClientResult};
use crate::transport::MonitorTransport;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use vigil_protocol::{CommandRequest, CommandResponse, ListRequest, ListResponse};

/// Path of the server's listing endpoint.
pub const TABLE_ENDPOINT: &str = "/api/table.json";

/// Path of the server's command endpoint.
pub const COMMAND_ENDPOINT: &str = "/api/command";

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport.
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the response body.
    fn get(&self, url: &str) -> Result<Vec<u8>, String>;

    /// Sends a POST request and returns the response body.
    fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, String>;

    /// Checks if the client is connected/healthy.
    fn is_healthy(&self) -> bool;
}

/// HTTP-based monitor transport.
///
/// Listings are GET requests against the table endpoint; commands are
/// POSTed as JSON.
pub struct HttpTransport<C: HttpClient> {
    /// Base URL of the server (e.g., "https://monitor.example.com").
    base_url: String,
    /// HTTP client implementation.
    client: C,
    /// Cleared only by `close`; request failures leave it set.
    open: AtomicBool,
    /// Last error message.
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            open: AtomicBool::new(true),
            last_error: RwLock::new(None),
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Builds the listing URL for a request.
    pub fn list_url(&self, request: &ListRequest) -> String {
        format!("{}{}?{}", self.base_url, TABLE_ENDPOINT, request.to_query())
    }

    fn record_failure(&self, err: &str) -> ClientError {
        *self.last_error.write() = Some(err.to_string());
        ClientError::transport_retryable(err)
    }

    fn clear_error(&self) {
        *self.last_error.write() = None;
    }
}

impl<C: HttpClient> MonitorTransport for HttpTransport<C> {
    fn list(&self, request: &ListRequest) -> ClientResult<ListResponse> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }

        let url = self.list_url(request);
        let body = self.client.get(&url).map_err(|e| self.record_failure(&e))?;
        self.clear_error();

        ListResponse::decode(&body)
            .map_err(|e| ClientError::Protocol(format!("Failed to decode listing: {}", e)))
    }

    fn execute(&self, request: &CommandRequest) -> ClientResult<CommandResponse> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }

        let body = request
            .encode()
            .map_err(|e| ClientError::Protocol(format!("Failed to encode command: {}", e)))?;

        let url = format!("{}{}", self.base_url, COMMAND_ENDPOINT);
        let response_body = self
            .client
            .post(&url, body)
            .map_err(|e| self.record_failure(&e))?;
        self.clear_error();

        CommandResponse::decode(&response_body)
            .map_err(|e| ClientError::Protocol(format!("Failed to decode response: {}", e)))
    }

    fn is_connected(&self) -> bool {
        self.open.load(Ordering::SeqCst) && self.client.is_healthy()
    }

    fn close(&self) -> ClientResult<()> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// A loopback HTTP client that routes requests directly to an in-process
/// server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }

    /// Returns the server.
    pub fn server(&self) -> &S {
        &self.server
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer: Send + Sync {
    /// Handles a GET request for a path with query string.
    fn handle_get(&self, path_and_query: &str) -> Result<Vec<u8>, String>;

    /// Handles a POST request and returns the response.
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String>;
}

impl<S: LoopbackServer> HttpClient for LoopbackClient<S> {
    fn get(&self, url: &str) -> Result<Vec<u8>, String> {
        self.server.handle_get(strip_origin(url))
    }

    fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, String> {
        self.server.handle_post(strip_origin(url), &body)
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

fn strip_origin(url: &str) -> &str {
    url.find("/api/").map(|i| &url[i..]).unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_protocol::{
        CreateCommand, NewGroupParameters, ObjectId, ObjectKind, ObjectRecord, Scope,
    };

    struct TestClient {
        response: RwLock<Option<Vec<u8>>>,
        requested: RwLock<Vec<String>>,
        healthy: AtomicBool,
    }

    impl TestClient {
        fn new() -> Self {
            Self {
                response: RwLock::new(None),
                requested: RwLock::new(Vec::new()),
                healthy: AtomicBool::new(true),
            }
        }

        fn set_response(&self, resp: Vec<u8>) {
            *self.response.write() = Some(resp);
        }

        fn set_healthy(&self, healthy: bool) {
            self.healthy.store(healthy, Ordering::SeqCst);
        }

        fn respond(&self, url: &str) -> Result<Vec<u8>, String> {
            self.requested.write().push(url.to_string());
            self.response
                .read()
                .clone()
                .ok_or_else(|| "No response set".into())
        }
    }

    impl HttpClient for TestClient {
        fn get(&self, url: &str) -> Result<Vec<u8>, String> {
            self.respond(url)
        }

        fn post(&self, url: &str, _body: Vec<u8>) -> Result<Vec<u8>, String> {
            self.respond(url)
        }

        fn is_healthy(&self) -> bool {
            self.healthy.load(Ordering::SeqCst)
        }
    }

    fn devices_of_1001() -> ListRequest {
        ListRequest::new(ObjectKind::Device, Scope::Parent(ObjectId(1001)))
    }

    #[test]
    fn transport_creation() {
        let transport = HttpTransport::new("https://monitor.example.com/", TestClient::new());
        assert_eq!(transport.base_url(), "https://monitor.example.com");
        assert!(transport.is_connected());
        assert_eq!(
            transport.list_url(&devices_of_1001()),
            "https://monitor.example.com/api/table.json?content=devices&filter_parentid=1001"
        );
    }

    #[test]
    fn transport_disconnect() {
        let transport = HttpTransport::new("https://monitor.example.com", TestClient::new());
        transport.close().unwrap();
        assert!(!transport.is_connected());
        assert!(matches!(
            transport.list(&devices_of_1001()),
            Err(ClientError::NotConnected)
        ));
    }

    #[test]
    fn transport_unhealthy_client() {
        let client = TestClient::new();
        client.set_healthy(false);
        let transport = HttpTransport::new("https://monitor.example.com", client);
        assert!(!transport.is_connected());
    }

    #[test]
    fn transport_list() {
        let client = TestClient::new();
        let records = vec![ObjectRecord::new(
            ObjectId(1002),
            Some(ObjectId(1001)),
            "Probe Device2",
            ObjectKind::Device,
        )];
        client.set_response(ListResponse::new(records.clone()).encode().unwrap());

        let transport = HttpTransport::new("https://monitor.example.com", client);
        let response = transport.list(&devices_of_1001()).unwrap();
        assert_eq!(response.records, records);
        assert!(transport.last_error().is_none());
    }

    #[test]
    fn transport_execute_posts_to_command_endpoint() {
        let client = TestClient::new();
        client.set_response(CommandResponse::accepted().encode().unwrap());

        let transport = HttpTransport::new("https://monitor.example.com", client);
        let request = CommandRequest::new(
            ObjectId(0),
            CreateCommand::AddGroup(NewGroupParameters::new("Servers")),
        );
        assert!(transport.execute(&request).unwrap().accepted);
        assert_eq!(
            *transport.client.requested.read(),
            vec!["https://monitor.example.com/api/command".to_string()]
        );
    }

    #[test]
    fn transport_failure_is_recoverable() {
        let transport = HttpTransport::new("https://monitor.example.com", TestClient::new());
        let err = transport.list(&devices_of_1001()).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(transport.last_error().as_deref(), Some("No response set"));
        assert!(transport.is_connected());

        transport
            .client
            .set_response(ListResponse::new(vec![]).encode().unwrap());
        assert!(transport.list(&devices_of_1001()).unwrap().records.is_empty());
        assert!(transport.last_error().is_none());
        assert_eq!(transport.client.requested.read().len(), 2);
    }

    #[test]
    fn transport_garbage_body() {
        let client = TestClient::new();
        client.set_response(b"<html>login</html>".to_vec());
        let transport = HttpTransport::new("https://monitor.example.com", client);
        assert!(matches!(
            transport.list(&devices_of_1001()),
            Err(ClientError::Protocol(_))
        ));
    }

    #[test]
    fn loopback_strips_origin() {
        assert_eq!(
            strip_origin("http://localhost:8080/api/table.json?content=groups"),
            "/api/table.json?content=groups"
        );
        assert_eq!(strip_origin("/elsewhere"), "/elsewhere");
    }
}
