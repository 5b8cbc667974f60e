//! Test fixtures: an in-process server wired to a real client.
//!
//! The client talks to the server through the HTTP transport and a
//! loopback client, so URLs, query strings and JSON bodies are exercised
//! exactly as over the network.

use parking_lot::Mutex;
use std::sync::Arc;
use vigil_engine::{
    ClientConfig, HttpTransport, LoopbackClient, LoopbackServer, MonitorClient, RetryConfig,
};
use vigil_protocol::{ObjectId, ObjectKind, ObjectRecord};
use vigil_server::{MonitorServer, ServerConfig, ROOT_ID};

/// Client type produced by [`TestHarness`].
pub type LoopbackMonitorClient = MonitorClient<HttpTransport<LoopbackClient<ServerHandle>>>;

/// An object some other client creates while a command is in flight.
#[derive(Debug, Clone)]
struct Interference {
    kind: ObjectKind,
    parent: ObjectId,
    name: String,
}

/// Shared handle to an in-process server, usable as a loopback target.
#[derive(Clone)]
pub struct ServerHandle {
    server: Arc<MonitorServer>,
    interference: Arc<Mutex<Option<Interference>>>,
}

impl ServerHandle {
    /// Wraps a server.
    pub fn new(server: Arc<MonitorServer>) -> Self {
        Self {
            server,
            interference: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the server.
    pub fn server(&self) -> &MonitorServer {
        &self.server
    }

    /// Creates an object right after the next command is accepted, as a
    /// concurrent client would.
    pub fn interfere_on_next_command(&self, kind: ObjectKind, parent: ObjectId, name: &str) {
        *self.interference.lock() = Some(Interference {
            kind,
            parent,
            name: name.to_string(),
        });
    }
}

impl LoopbackServer for ServerHandle {
    fn handle_get(&self, path_and_query: &str) -> Result<Vec<u8>, String> {
        self.server.route_get(path_and_query).map_err(|e| e.to_string())
    }

    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String> {
        let response = self.server.route_post(path, body).map_err(|e| e.to_string())?;
        if let Some(other) = self.interference.lock().take() {
            self.server
                .inject(other.kind, other.parent, &other.name)
                .map_err(|e| e.to_string())?;
        }
        Ok(response)
    }
}

/// A server plus a client connected to it.
pub struct TestHarness {
    handle: ServerHandle,
    client: LoopbackMonitorClient,
}

impl TestHarness {
    /// Creates a harness whose server applies commands after
    /// `apply_after_polls` listings and whose client makes up to
    /// `attempts` listings without delay.
    pub fn new(apply_after_polls: u32, attempts: u32) -> Self {
        Self::with_configs(
            ServerConfig::new(apply_after_polls),
            RetryConfig::immediate(attempts),
        )
    }

    /// Creates a harness whose server never applies commands.
    pub fn stalled(attempts: u32) -> Self {
        Self::with_configs(ServerConfig::stalled(), RetryConfig::immediate(attempts))
    }

    /// Creates a harness from explicit configurations.
    pub fn with_configs(server: ServerConfig, retry: RetryConfig) -> Self {
        let handle = ServerHandle::new(Arc::new(MonitorServer::new(server)));
        let config = ClientConfig::new("http://vigil.test").with_retry(retry);
        let client = MonitorClient::over_http(config, LoopbackClient::new(handle.clone()));
        Self { handle, client }
    }

    /// Returns the server.
    pub fn server(&self) -> &MonitorServer {
        self.handle.server()
    }

    /// Returns the server handle.
    pub fn handle(&self) -> &ServerHandle {
        &self.handle
    }

    /// Returns the client.
    pub fn client(&self) -> &LoopbackMonitorClient {
        &self.client
    }

    /// Creates an object directly on the server.
    pub fn seed(&self, kind: ObjectKind, parent: ObjectId, name: &str) -> ObjectRecord {
        self.server()
            .inject(kind, parent, name)
            .expect("Failed to seed object")
    }
}

/// Runs a test with a fresh harness.
///
/// # Example
///
/// ```rust,ignore
/// use vigil_testkit::with_harness;
///
/// #[test]
/// fn my_test() {
///     with_harness(0, 3, |harness| {
///         let client = harness.client();
///         // ... create objects
///     });
/// }
/// ```
pub fn with_harness<F, R>(apply_after_polls: u32, attempts: u32, f: F) -> R
where
    F: FnOnce(&TestHarness) -> R,
{
    let harness = TestHarness::new(apply_after_polls, attempts);
    f(&harness)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Name of the group seeded by [`probe_group`].
    pub const PROBE_GROUP: &str = "Probe Group";

    /// Seeds a group under the root. On a fresh server it gets id 1001.
    pub fn probe_group(harness: &TestHarness) -> ObjectId {
        harness.seed(ObjectKind::Group, ROOT_ID, PROBE_GROUP).id
    }

    /// Seeds a group holding one device. Returns (group, device).
    pub fn probe_device(harness: &TestHarness) -> (ObjectId, ObjectId) {
        let group = probe_group(harness);
        let device = harness.seed(ObjectKind::Device, group, "Probe Device").id;
        (group, device)
    }

    /// Seeds `count` devices under `parent`, named "Device N".
    pub fn populated_group(harness: &TestHarness, parent: ObjectId, count: usize) -> Vec<ObjectId> {
        (0..count)
            .map(|i| {
                harness
                    .seed(ObjectKind::Device, parent, &format!("Device {i}"))
                    .id
            })
            .collect()
    }
}
