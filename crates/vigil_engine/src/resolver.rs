//! Resolution orchestrator.
//!
//! A resolution runs in five steps:
//! 1. If the caller did not ask for resolution, run the mutation and stop.
//! 2. Capture the "before" snapshot of the target scope.
//! 3. Run the mutation exactly once.
//! 4. Repeatedly capture "after", diff it against "before" and select,
//!    under the [`RetryScheduler`].
//! 5. Turn the terminal outcome into a value or a [`ResolutionError`].
//!
//! The steps are the same for every object kind; only the
//! [`ResolutionRequest`] differs.

use crate::cancel::CancellationToken;
use crate::config::RetryConfig;
use crate::diff::diff;
use crate::disambiguate::{select, Selection};
use crate::error::{CandidateSummary, ClientError, ClientResult, ResolutionError};
use crate::request::{ResolutionOutcome, ResolutionRequest};
use crate::retry::{RetryReport, RetryScheduler};
use crate::snapshot::{Snapshot, SnapshotProvider};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument, Span};
use uuid::Uuid;
use vigil_protocol::ObjectRecord;

/// Value produced by a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Resolution was not requested; the mutation ran and nothing was
    /// looked up.
    Skipped,
    /// The single object a singular creation produced.
    One(ObjectRecord),
    /// The objects a plural creation produced, ordered by id.
    Many(Vec<ObjectRecord>),
}

impl Resolution {
    /// Returns the single resolved object.
    pub fn into_one(self) -> Option<ObjectRecord> {
        match self {
            Resolution::One(record) => Some(record),
            Resolution::Skipped | Resolution::Many(_) => None,
        }
    }

    /// Returns every resolved object.
    pub fn into_many(self) -> Option<Vec<ObjectRecord>> {
        match self {
            Resolution::One(record) => Some(vec![record]),
            Resolution::Many(records) => Some(records),
            Resolution::Skipped => None,
        }
    }

    /// Returns true if nothing was resolved.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Resolution::Skipped)
    }
}

/// Counters about resolutions. Observational only.
#[derive(Debug, Clone, Default)]
pub struct ResolverStats {
    /// Resolutions that produced a value.
    pub resolutions: u64,
    /// Mutations run without resolution.
    pub skipped: u64,
    /// "After" listings beyond the first, summed over all resolutions.
    pub retries: u64,
    /// Resolutions that failed as ambiguous.
    pub ambiguous: u64,
    /// Resolutions that ran out of attempts.
    pub timeouts: u64,
    /// Resolutions cancelled by the caller.
    pub cancelled: u64,
    /// Time of the last successful resolution.
    pub last_resolution_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Finds the object(s) a mutation created by diffing listings.
pub struct Resolver<P: SnapshotProvider + 'static> {
    provider: Arc<P>,
    scheduler: RetryScheduler,
    stats: RwLock<ResolverStats>,
}

impl<P: SnapshotProvider + 'static> Resolver<P> {
    /// Creates a resolver over a snapshot provider.
    pub fn new(provider: Arc<P>, retry: RetryConfig) -> Self {
        Self {
            provider,
            scheduler: RetryScheduler::new(retry),
            stats: RwLock::new(ResolverStats::default()),
        }
    }

    /// Returns the snapshot provider.
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Returns the retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        self.scheduler.config()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> ResolverStats {
        self.stats.read().clone()
    }

    /// Runs `mutate` and resolves what it created, blocking between
    /// attempts.
    ///
    /// A failing `mutate` ends the resolution with its error before any
    /// "after" listing is taken. Snapshot errors are never retried.
    pub fn resolve<M>(
        &self,
        request: &ResolutionRequest,
        cancel: &CancellationToken,
        mutate: M,
    ) -> ClientResult<Resolution>
    where
        M: FnOnce() -> ClientResult<()>,
    {
        if !request.resolve {
            mutate()?;
            self.record_skipped();
            return Ok(Resolution::Skipped);
        }

        let span = resolution_span(request);
        let _enter = span.enter();

        let result = self.resolve_inner(request, cancel, mutate);
        self.finish(request, result)
    }

    fn resolve_inner<M>(
        &self,
        request: &ResolutionRequest,
        cancel: &CancellationToken,
        mutate: M,
    ) -> ClientResult<RetryReport>
    where
        M: FnOnce() -> ClientResult<()>,
    {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let before = self.provider.capture(request.scope, request.kind)?;
        debug!(known = before.len(), "captured before snapshot");
        mutate()?;

        self.scheduler.run_blocking(cancel, |attempt| {
            let after = self.provider.capture(request.scope, request.kind)?;
            Ok(examine(attempt, &before, &after, request))
        })
    }

    /// Async variant of [`resolve`](Self::resolve).
    ///
    /// Listings and the mutation run on the blocking pool; waits between
    /// attempts yield to the runtime.
    pub async fn resolve_async<M>(
        &self,
        request: &ResolutionRequest,
        cancel: &CancellationToken,
        mutate: M,
    ) -> ClientResult<Resolution>
    where
        M: FnOnce() -> ClientResult<()> + Send + 'static,
    {
        if !request.resolve {
            blocking(mutate).await??;
            self.record_skipped();
            return Ok(Resolution::Skipped);
        }

        let span = resolution_span(request);
        let result = self
            .resolve_inner_async(request, cancel, mutate)
            .instrument(span.clone())
            .await;

        let _enter = span.enter();
        self.finish(request, result)
    }

    async fn resolve_inner_async<M>(
        &self,
        request: &ResolutionRequest,
        cancel: &CancellationToken,
        mutate: M,
    ) -> ClientResult<RetryReport>
    where
        M: FnOnce() -> ClientResult<()> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let before = Arc::new(self.capture_async(request).await?);
        debug!(known = before.len(), "captured before snapshot");
        blocking(mutate).await??;

        self.scheduler
            .run_async(cancel, |attempt| {
                let before = Arc::clone(&before);
                let capture = self.capture_async(request);
                async move {
                    let after = capture.await?;
                    Ok(examine(attempt, &before, &after, request))
                }
            })
            .await
    }

    fn capture_async(
        &self,
        request: &ResolutionRequest,
    ) -> impl std::future::Future<Output = ClientResult<Snapshot>> + Send + 'static {
        let provider = Arc::clone(&self.provider);
        let (scope, kind) = (request.scope, request.kind);
        async move { blocking(move || provider.capture(scope, kind)).await? }
    }

    /// Converts a terminal outcome into the caller-facing result and
    /// updates the stats.
    fn finish(
        &self,
        request: &ResolutionRequest,
        result: ClientResult<RetryReport>,
    ) -> ClientResult<Resolution> {
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                match &e {
                    ClientError::Cancelled => warn!("resolution cancelled"),
                    other => warn!(error = %other, "resolution failed"),
                }
                self.record_error(&e);
                return Err(e);
            }
        };

        let retries = u64::from(report.attempts.saturating_sub(1));
        self.stats.write().retries += retries;

        let result = match report.outcome {
            ResolutionOutcome::Resolved(record) => {
                info!(id = %record.id, name = %record.name, attempts = report.attempts, "resolved");
                Ok(Resolution::One(record))
            }
            ResolutionOutcome::ResolvedMany(records) => {
                info!(count = records.len(), attempts = report.attempts, "resolved");
                Ok(Resolution::Many(records))
            }
            ResolutionOutcome::Ambiguous(records) => {
                let candidates: Vec<CandidateSummary> =
                    records.iter().map(CandidateSummary::from).collect();
                warn!(
                    count = candidates.len(),
                    name_hint = request.name_hint.as_deref().unwrap_or(""),
                    "ambiguous resolution"
                );
                Err(ResolutionError::Ambiguous {
                    kind: request.kind,
                    scope: request.scope,
                    name_hint: request.name_hint.clone(),
                    candidates,
                }
                .into())
            }
            ResolutionOutcome::TimedOut { attempts } => {
                warn!(attempts, "no new object appeared");
                Err(ResolutionError::Timeout {
                    kind: request.kind,
                    scope: request.scope,
                    attempts,
                }
                .into())
            }
        };

        match &result {
            Ok(_) => {
                let mut stats = self.stats.write();
                stats.resolutions += 1;
                stats.last_resolution_time = Some(Instant::now());
            }
            Err(e) => self.record_error(e),
        }
        result
    }

    fn record_skipped(&self) {
        debug!("resolution not requested");
        self.stats.write().skipped += 1;
    }

    fn record_error(&self, error: &ClientError) {
        let mut stats = self.stats.write();
        match error {
            ClientError::Cancelled => stats.cancelled += 1,
            ClientError::Resolution(ResolutionError::Ambiguous { .. }) => stats.ambiguous += 1,
            ClientError::Resolution(ResolutionError::Timeout { .. }) => stats.timeouts += 1,
            _ => {}
        }
        stats.last_error = Some(error.to_string());
    }
}

/// One attempt: diff the listings and decide.
fn examine(
    attempt: u32,
    before: &Snapshot,
    after: &Snapshot,
    request: &ResolutionRequest,
) -> Selection {
    let candidates = diff(before, after);
    debug!(attempt, candidates = candidates.len(), "examined after snapshot");
    select(candidates, request)
}

fn resolution_span(request: &ResolutionRequest) -> Span {
    info_span!(
        "resolve",
        id = %Uuid::new_v4(),
        kind = %request.kind,
        scope = %request.scope,
    )
}

async fn blocking<F, R>(f: F) -> ClientResult<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ClientError::Internal(format!("blocking task failed: {e}")))
}
