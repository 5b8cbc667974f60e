//! Main reference server.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler};
use crate::store::ObjectStore;
use std::sync::Arc;
use vigil_protocol::{
    CommandRequest, CommandResponse, ListRequest, ListResponse, ObjectId, ObjectKind,
    ObjectRecord,
};

/// Path of the listing endpoint.
pub const TABLE_PATH: &str = "/api/table.json";

/// Path of the command endpoint.
pub const COMMAND_PATH: &str = "/api/command";

/// The reference monitoring server.
///
/// Accepts creation commands fire-and-forget: a command response never
/// says which object was created, and the object only shows up in
/// listings once the configured latency has elapsed.
///
/// # Example
///
/// ```
/// use vigil_server::{MonitorServer, ServerConfig};
/// use vigil_protocol::{ObjectKind, ObjectId};
///
/// let server = MonitorServer::new(ServerConfig::new(1));
/// let group = server.inject(ObjectKind::Group, ObjectId(0), "Servers").unwrap();
/// assert_eq!(group.id, ObjectId(1001));
/// ```
pub struct MonitorServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl MonitorServer {
    /// Creates a new server.
    pub fn new(config: ServerConfig) -> Self {
        let store = Arc::new(ObjectStore::new(
            &config.root_name,
            config.first_object_id,
            &config.generated_name_prefix,
        ));
        Self::with_store(config, store)
    }

    /// Creates a server over an existing store.
    pub fn with_store(config: ServerConfig, store: Arc<ObjectStore>) -> Self {
        let context = Arc::new(HandlerContext::new(config, store));
        let handler = RequestHandler::new(Arc::clone(&context));

        Self { handler, context }
    }

    /// Handles a listing request.
    pub fn handle_list(&self, request: ListRequest) -> Result<ListResponse, String> {
        self.handler.handle_list(request).map_err(|e| e.to_string())
    }

    /// Handles a creation command.
    pub fn handle_command(&self, request: CommandRequest) -> Result<CommandResponse, String> {
        self.handler
            .handle_command(request)
            .map_err(|e| e.to_string())
    }

    /// Routes a GET request (path plus query string) and returns the JSON body.
    pub fn route_get(&self, path_and_query: &str) -> ServerResult<Vec<u8>> {
        let (path, query) = path_and_query
            .split_once('?')
            .unwrap_or((path_and_query, ""));

        if path != TABLE_PATH {
            return Err(ServerError::NotFound(path.to_string()));
        }

        let request = ListRequest::from_query(query)?;
        let response = self.handler.handle_list(request)?;
        Ok(response.encode()?)
    }

    /// Routes a POST request and returns the JSON body.
    pub fn route_post(&self, path: &str, body: &[u8]) -> ServerResult<Vec<u8>> {
        if path != COMMAND_PATH {
            return Err(ServerError::NotFound(path.to_string()));
        }

        let request = CommandRequest::decode(body)?;
        let response = self.handler.handle_command(request)?;
        Ok(response.encode()?)
    }

    /// Creates an object immediately, as another client would.
    pub fn inject(&self, kind: ObjectKind, parent: ObjectId, name: &str) -> ServerResult<ObjectRecord> {
        self.context.store.insert(kind, parent, name)
    }

    /// Applies every pending command now.
    pub fn flush(&self) {
        self.context.store.flush();
    }

    /// Number of accepted but unapplied commands.
    pub fn pending_count(&self) -> usize {
        self.context.store.pending_len()
    }

    /// Number of stored objects, including the root group.
    pub fn object_count(&self) -> usize {
        self.context.store.len()
    }

    /// Number of listing requests served.
    pub fn list_requests(&self) -> u64 {
        self.context.list_requests()
    }

    /// Number of commands accepted.
    pub fn commands_accepted(&self) -> u64 {
        self.context.commands_accepted()
    }
}
