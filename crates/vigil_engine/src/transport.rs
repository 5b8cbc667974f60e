//! Transport layer abstraction for the monitoring server.

use crate::error::{ClientError, ClientResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use vigil_protocol::{CommandRequest, CommandResponse, ListRequest, ListResponse};

/// A monitor transport handles network communication with the server.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, in-process loopback, mock for testing, etc.).
pub trait MonitorTransport: Send + Sync {
    /// Lists objects of one kind within a scope.
    fn list(&self, request: &ListRequest) -> ClientResult<ListResponse>;

    /// Sends a creation command.
    fn execute(&self, request: &CommandRequest) -> ClientResult<CommandResponse>;

    /// Checks if the transport is connected.
    fn is_connected(&self) -> bool;

    /// Closes the transport connection.
    fn close(&self) -> ClientResult<()>;
}

/// A mock transport for testing.
///
/// Listing responses are served from a queue; once a single response is
/// left it is repeated for every further listing.
#[derive(Debug, Default)]
pub struct MockTransport {
    connected: AtomicBool,
    list_responses: Mutex<VecDeque<ListResponse>>,
    command_response: Mutex<Option<CommandResponse>>,
    list_failure: Mutex<Option<(usize, String)>>,
    list_calls: AtomicUsize,
    execute_calls: AtomicUsize,
    executed: Mutex<Vec<CommandRequest>>,
}

impl MockTransport {
    /// Creates a new mock transport that accepts every command.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            command_response: Mutex::new(Some(CommandResponse::accepted())),
            ..Self::default()
        }
    }

    /// Queues a listing response.
    pub fn push_list_response(&self, response: ListResponse) {
        self.list_responses.lock().push_back(response);
    }

    /// Sets the command response.
    pub fn set_command_response(&self, response: CommandResponse) {
        *self.command_response.lock() = Some(response);
    }

    /// Makes listings fail once `after` listings have been served.
    pub fn fail_lists_after(&self, after: usize, message: impl Into<String>) {
        *self.list_failure.lock() = Some((after, message.into()));
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Number of listing calls made.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of command calls made.
    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }

    /// Commands received so far.
    pub fn executed(&self) -> Vec<CommandRequest> {
        self.executed.lock().clone()
    }
}

impl MonitorTransport for MockTransport {
    fn list(&self, _request: &ListRequest) -> ClientResult<ListResponse> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst);

        if let Some((after, message)) = self.list_failure.lock().as_ref() {
            if call >= *after {
                return Err(ClientError::transport_retryable(message.clone()));
            }
        }

        let mut responses = self.list_responses.lock();
        let response = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        response.ok_or_else(|| ClientError::Protocol("No mock list response set".into()))
    }

    fn execute(&self, request: &CommandRequest) -> ClientResult<CommandResponse> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        self.executed.lock().push(request.clone());
        self.command_response
            .lock()
            .clone()
            .ok_or_else(|| ClientError::Protocol("No mock command response set".into()))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn close(&self) -> ClientResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}
