//! Public client: creation commands with resolution of what they created.

use crate::cancel::CancellationToken;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::{HttpClient, HttpTransport};
use crate::resolver::{Resolution, Resolver, ResolverStats};
use crate::request::ResolutionRequest;
use crate::transport::MonitorTransport;
use parking_lot::RwLock;
use std::sync::Arc;
use vigil_protocol::{
    CommandRequest, CreateCommand, NewDeviceParameters, NewGroupParameters, NewSensorParameters,
    ObjectId, ObjectRecord, TriggerParameters,
};

/// Client for a monitoring server.
///
/// Every `create_*` method sends one creation command and, when `resolve`
/// is true, returns the object(s) the server created for it. With
/// `resolve` false the command is sent and `None` is returned without
/// listing anything.
pub struct MonitorClient<T: MonitorTransport + 'static> {
    config: ClientConfig,
    transport: Arc<T>,
    resolver: Resolver<T>,
    cancel: RwLock<CancellationToken>,
}

impl<C: HttpClient + 'static> MonitorClient<HttpTransport<C>> {
    /// Creates a client that talks HTTP to `config.server_url`.
    pub fn over_http(config: ClientConfig, client: C) -> Self {
        let transport = HttpTransport::new(config.server_url.clone(), client);
        Self::new(config, transport)
    }
}

impl<T: MonitorTransport + 'static> MonitorClient<T> {
    /// Creates a client over a transport.
    pub fn new(config: ClientConfig, transport: T) -> Self {
        let transport = Arc::new(transport);
        let resolver = Resolver::new(Arc::clone(&transport), config.retry.clone());
        Self {
            config,
            transport,
            resolver,
            cancel: RwLock::new(CancellationToken::new()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Gets the resolver stats.
    pub fn stats(&self) -> ResolverStats {
        self.resolver.stats()
    }

    /// Cancels every resolution currently in progress.
    ///
    /// Calls made afterwards start with a fresh token.
    pub fn cancel(&self) {
        let previous = std::mem::take(&mut *self.cancel.write());
        previous.cancel();
    }

    /// Returns the token the `create_*` methods currently observe.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.read().clone()
    }

    /// Closes the transport.
    pub fn close(&self) -> ClientResult<()> {
        self.transport.close()
    }

    /// Sends `command` to `target` and resolves its result under `cancel`.
    pub fn create(
        &self,
        target: ObjectId,
        command: CreateCommand,
        resolve: bool,
        cancel: &CancellationToken,
    ) -> ClientResult<Resolution> {
        let request = ResolutionRequest::for_command(target, &command, resolve);
        let command = CommandRequest::new(target, command);
        let transport = Arc::clone(&self.transport);
        self.resolver
            .resolve(&request, cancel, move || execute(&*transport, &command))
    }

    /// Async variant of [`create`](Self::create).
    pub async fn create_async(
        &self,
        target: ObjectId,
        command: CreateCommand,
        resolve: bool,
        cancel: &CancellationToken,
    ) -> ClientResult<Resolution> {
        let request = ResolutionRequest::for_command(target, &command, resolve);
        let command = CommandRequest::new(target, command);
        let transport = Arc::clone(&self.transport);
        self.resolver
            .resolve_async(&request, cancel, move || execute(&*transport, &command))
            .await
    }

    /// Adds a sensor to a device.
    ///
    /// One command may create several sensors; all of them are returned,
    /// ordered by id.
    pub fn create_sensor(
        &self,
        device: ObjectId,
        params: NewSensorParameters,
        resolve: bool,
    ) -> ClientResult<Option<Vec<ObjectRecord>>> {
        let cancel = self.cancellation_token();
        let resolution = self.create(device, CreateCommand::AddSensor(params), resolve, &cancel)?;
        Ok(resolution.into_many())
    }

    /// Adds a device to a group.
    pub fn create_device(
        &self,
        group: ObjectId,
        params: NewDeviceParameters,
        resolve: bool,
    ) -> ClientResult<Option<ObjectRecord>> {
        let cancel = self.cancellation_token();
        let resolution = self.create(group, CreateCommand::AddDevice(params), resolve, &cancel)?;
        Ok(resolution.into_one())
    }

    /// Adds a group to a group.
    pub fn create_group(
        &self,
        group: ObjectId,
        params: NewGroupParameters,
        resolve: bool,
    ) -> ClientResult<Option<ObjectRecord>> {
        let cancel = self.cancellation_token();
        let resolution = self.create(group, CreateCommand::AddGroup(params), resolve, &cancel)?;
        Ok(resolution.into_one())
    }

    /// Adds a notification trigger to an object.
    ///
    /// Only triggers owned by `owner` itself are candidates; triggers it
    /// inherits are ignored.
    pub fn create_trigger(
        &self,
        owner: ObjectId,
        params: TriggerParameters,
        resolve: bool,
    ) -> ClientResult<Option<ObjectRecord>> {
        let cancel = self.cancellation_token();
        let resolution = self.create(owner, CreateCommand::AddTrigger(params), resolve, &cancel)?;
        Ok(resolution.into_one())
    }

    /// Async variant of [`create_sensor`](Self::create_sensor).
    pub async fn create_sensor_async(
        &self,
        device: ObjectId,
        params: NewSensorParameters,
        resolve: bool,
    ) -> ClientResult<Option<Vec<ObjectRecord>>> {
        let cancel = self.cancellation_token();
        let resolution = self
            .create_async(device, CreateCommand::AddSensor(params), resolve, &cancel)
            .await?;
        Ok(resolution.into_many())
    }

    /// Async variant of [`create_device`](Self::create_device).
    pub async fn create_device_async(
        &self,
        group: ObjectId,
        params: NewDeviceParameters,
        resolve: bool,
    ) -> ClientResult<Option<ObjectRecord>> {
        let cancel = self.cancellation_token();
        let resolution = self
            .create_async(group, CreateCommand::AddDevice(params), resolve, &cancel)
            .await?;
        Ok(resolution.into_one())
    }

    /// Async variant of [`create_group`](Self::create_group).
    pub async fn create_group_async(
        &self,
        group: ObjectId,
        params: NewGroupParameters,
        resolve: bool,
    ) -> ClientResult<Option<ObjectRecord>> {
        let cancel = self.cancellation_token();
        let resolution = self
            .create_async(group, CreateCommand::AddGroup(params), resolve, &cancel)
            .await?;
        Ok(resolution.into_one())
    }

    /// Async variant of [`create_trigger`](Self::create_trigger).
    pub async fn create_trigger_async(
        &self,
        owner: ObjectId,
        params: TriggerParameters,
        resolve: bool,
    ) -> ClientResult<Option<ObjectRecord>> {
        let cancel = self.cancellation_token();
        let resolution = self
            .create_async(owner, CreateCommand::AddTrigger(params), resolve, &cancel)
            .await?;
        Ok(resolution.into_one())
    }
}

/// Sends one command. A rejection becomes [`ClientError::Mutation`].
fn execute<T: MonitorTransport + ?Sized>(transport: &T, request: &CommandRequest) -> ClientResult<()> {
    let response = transport.execute(request)?;
    if response.accepted {
        return Ok(());
    }
    Err(ClientError::Mutation {
        kind: request.command.kind(),
        target: request.target,
        message: response
            .error
            .unwrap_or_else(|| "command rejected".to_string()),
    })
}
