//! Request handlers for the listing and command endpoints.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::store::ObjectStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use vigil_protocol::{CommandRequest, CommandResponse, ListRequest, ListResponse};

/// Context for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Object store (shared across all handlers).
    pub store: Arc<ObjectStore>,
    list_requests: AtomicU64,
    commands_accepted: AtomicU64,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(config: ServerConfig, store: Arc<ObjectStore>) -> Self {
        Self {
            config,
            store,
            list_requests: AtomicU64::new(0),
            commands_accepted: AtomicU64::new(0),
        }
    }

    /// Number of listing requests served.
    pub fn list_requests(&self) -> u64 {
        self.list_requests.load(Ordering::SeqCst)
    }

    /// Number of commands accepted.
    pub fn commands_accepted(&self) -> u64 {
        self.commands_accepted.load(Ordering::SeqCst)
    }
}

/// Handler for monitoring requests.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Handles a listing request.
    pub fn handle_list(&self, request: ListRequest) -> ServerResult<ListResponse> {
        self.context.list_requests.fetch_add(1, Ordering::SeqCst);
        let records = self.context.store.list(&request);
        Ok(ListResponse::new(records))
    }

    /// Handles a creation command.
    ///
    /// Validation failures are reported as a rejected response rather than
    /// an error, the way the real server answers bad parameters.
    pub fn handle_command(&self, request: CommandRequest) -> ServerResult<CommandResponse> {
        let kind = request.command.kind();
        let target = request.target;

        match self
            .context
            .store
            .enqueue(request, self.context.config.apply_after_polls)
        {
            Ok(()) => {
                self.context.commands_accepted.fetch_add(1, Ordering::SeqCst);
                debug!(%target, %kind, "accepted command");
                Ok(CommandResponse::accepted())
            }
            Err(e) if e.is_client_error() => Ok(CommandResponse::rejected(e.to_string())),
            Err(e) => Err(e),
        }
    }
}
