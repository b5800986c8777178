//! Trace session state machine
//!
//! A session moves `Resolving → Tracing → {Completed, Failed, Cancelled}`.
//! One background task owns the subprocess and is the only writer of the
//! hop list; consumers observe a typed event stream. Enrichment lookups
//! run in the session's [`Enricher`] and complete in any order, each
//! tagged with its hop index.

use crate::enrich::{Enricher, EnrichmentResult};
use crate::geo::{GeoLookup, GeoProvider};
use crate::services::Services;
use crate::trace::config::{TraceConfig, DEFAULT_GEO_ENDPOINT};
use crate::trace::driver::TraceProcess;
use crate::trace::error::TraceError;
use crate::trace::is_reserved_ip;
use crate::trace::parser::{Dialect, HopLineParser};
use crate::trace::resolver::resolve_target;
use crate::trace::types::{Hop, SessionStatus};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Upper bound on a single reverse DNS lookup so a dead resolver cannot
/// stall hop delivery. Clamped to the configured grace period, so a
/// lookup never outlives the cancellation bound.
const RDNS_TIMEOUT: Duration = Duration::from_secs(2);

/// Events published by a trace session.
///
/// `Hop` events arrive in subprocess output order; `Enrichment` events
/// arrive in lookup completion order and may interleave with later hops.
#[derive(Debug, Clone)]
pub enum TraceEvent {
    /// Human-readable status message.
    Progress(String),
    /// A hop line was parsed; enrichment for it may follow.
    Hop(Hop),
    /// An enrichment lookup finished for the hop at `hop_index`
    /// (arrival index into the session's hop list).
    Enrichment {
        /// Index of the hop this result belongs to.
        hop_index: usize,
        /// The lookup outcome.
        result: EnrichmentResult,
    },
    /// The session failed; partial hops already delivered remain valid.
    Error(String),
    /// The subprocess stream closed normally; the full ordered hop list.
    Completed(Vec<Hop>),
}

/// Consumer side of a running trace session.
#[derive(Debug)]
pub struct TraceHandle {
    events: mpsc::UnboundedReceiver<TraceEvent>,
    status: watch::Receiver<SessionStatus>,
    cancel: CancellationToken,
}

impl TraceHandle {
    /// Receive the next event. `None` means the session task has ended
    /// and all events have been drained.
    pub async fn next_event(&mut self) -> Option<TraceEvent> {
        self.events.recv().await
    }

    /// Current session status.
    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Request cooperative cancellation of this session.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait until the session reaches a terminal status.
    pub async fn wait_terminal(&mut self) -> SessionStatus {
        loop {
            let current = *self.status.borrow_and_update();
            if current.is_terminal() {
                return current;
            }
            if self.status.changed().await.is_err() {
                return *self.status.borrow();
            }
        }
    }
}

struct ActiveSession {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
    grace: Duration,
}

/// Owner of trace sessions; at most one session is active at a time.
///
/// Starting a new trace first cancels any running session and waits out
/// its grace period, so two subprocesses never run concurrently.
#[derive(Debug)]
pub struct TraceController {
    services: Services,
    active: Option<ActiveSession>,
}

impl std::fmt::Debug for ActiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSession").finish_non_exhaustive()
    }
}

impl TraceController {
    /// Create a controller with default services.
    pub fn new() -> Self {
        Self::with_services(Services::new())
    }

    /// Create a controller with custom services.
    pub fn with_services(services: Services) -> Self {
        Self {
            services,
            active: None,
        }
    }

    /// Start a trace session for a target (IPv4 literal or hostname).
    ///
    /// Resolution happens on the session task; resolver and spawn errors
    /// surface as an `Error` event and a `Failed` terminal status rather
    /// than an `Err` here. `Err` is returned only for invalid config.
    pub async fn start_trace(
        &mut self,
        target: &str,
        config: TraceConfig,
    ) -> Result<TraceHandle, TraceError> {
        config.validate().map_err(TraceError::Config)?;
        self.cancel_trace().await;

        let cancel = CancellationToken::new();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SessionStatus::Resolving);

        let session = Session {
            target: target.to_string(),
            config: config.clone(),
            services: self.services.clone(),
            cancel: cancel.clone(),
            events: event_tx,
            status: status_tx,
        };
        let task = tokio::spawn(session.run());

        self.active = Some(ActiveSession {
            cancel: cancel.clone(),
            task,
            grace: config.grace_period,
        });

        Ok(TraceHandle {
            events: event_rx,
            status: status_rx,
            cancel,
        })
    }

    /// Cancel the active session, if any, and wait for it to wind down
    /// within its grace period.
    pub async fn cancel_trace(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            let mut task = active.task;
            let wait = active.grace + Duration::from_millis(500);
            if tokio::time::timeout(wait, &mut task).await.is_err() {
                task.abort();
            }
        }
    }
}

impl Default for TraceController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TraceController {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            // The subprocess is reclaimed by kill_on_drop when the task
            // unwinds.
            active.task.abort();
        }
    }
}

/// State owned by one session's background task.
struct Session {
    target: String,
    config: TraceConfig,
    services: Services,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<TraceEvent>,
    status: watch::Sender<SessionStatus>,
}

impl Session {
    fn emit(&self, event: TraceEvent) {
        // A dropped handle just means nobody is listening anymore.
        let _ = self.events.send(event);
    }

    fn set_status(&self, status: SessionStatus) {
        let _ = self.status.send(status);
    }

    fn fail(&self, message: String) {
        self.emit(TraceEvent::Error(message));
        self.set_status(SessionStatus::Failed);
    }

    async fn run(self) {
        self.emit(TraceEvent::Progress(format!(
            "Resolving target {}...",
            self.target
        )));

        let addr = tokio::select! {
            _ = self.cancel.cancelled() => {
                self.set_status(SessionStatus::Cancelled);
                return;
            }
            resolved = resolve_target(&self.target) => match resolved {
                Ok(addr) => addr,
                Err(e) => {
                    self.fail(e.to_string());
                    return;
                }
            },
        };

        self.emit(TraceEvent::Progress(format!("Starting trace to {addr}...")));

        let dialect = Dialect::for_platform();
        let parser = HopLineParser::new(dialect);
        let mut process = match TraceProcess::spawn(dialect, &addr.to_string(), &self.config) {
            Ok(process) => process,
            Err(e) => {
                self.fail(e.to_string());
                return;
            }
        };
        self.set_status(SessionStatus::Tracing);

        let mut hops: Vec<Hop> = Vec::new();
        // A non-default endpoint gets its own client; the shared service
        // and its cache only answer for the default endpoint.
        let provider: Arc<dyn GeoProvider> = if self.config.geo_endpoint == DEFAULT_GEO_ENDPOINT {
            Arc::clone(&self.services.geo) as Arc<dyn GeoProvider>
        } else {
            Arc::new(GeoLookup::with_endpoint(self.config.geo_endpoint.clone()))
        };
        let mut enricher = Enricher::new(provider);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    process.stop(self.config.grace_period).await;
                    enricher.abort_all();
                    self.set_status(SessionStatus::Cancelled);
                    return;
                }
                line = process.next_line() => match line {
                    Ok(Some(line)) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        self.emit(TraceEvent::Progress(format!("Processing: {trimmed}")));
                        if let Some(hop) = parser.parse_line(&line) {
                            self.deliver_hop(hop, &mut hops, &mut enricher).await;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        process.stop(self.config.grace_period).await;
                        enricher.abort_all();
                        self.fail(format!("failed to read trace output: {e}"));
                        return;
                    }
                },
                Some((hop_index, result)) = enricher.join_next(), if !enricher.is_idle() => {
                    self.emit(TraceEvent::Enrichment { hop_index, result });
                }
            }
        }

        let (exit_status, stderr) = process.finish(self.config.grace_period).await;
        let exited_cleanly = exit_status.map(|s| s.success()).unwrap_or(false);
        if !exited_cleanly && hops.is_empty() {
            let detail = if stderr.trim().is_empty() {
                "exited abnormally before producing output".to_string()
            } else {
                stderr.trim().to_string()
            };
            self.fail(TraceError::Process(detail).to_string());
            return;
        }

        self.emit(TraceEvent::Progress("Trace completed".to_string()));
        self.emit(TraceEvent::Completed(hops));
        self.set_status(SessionStatus::Completed);

        // Keep delivering lookups that were still in flight when the
        // stream closed, then abandon the rest.
        let drain = async {
            while let Some((hop_index, result)) = enricher.join_next().await {
                self.emit(TraceEvent::Enrichment { hop_index, result });
            }
        };
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::timeout(self.config.enrichment_grace, drain) => {}
        }
    }

    /// Record a parsed hop, emit it, and kick off enrichment if its
    /// address is routable.
    async fn deliver_hop(&self, mut hop: Hop, hops: &mut Vec<Hop>, enricher: &mut Enricher) {
        if self.config.enable_rdns && hop.host_unresolved() && !hop.is_timeout() {
            tokio::select! {
                _ = self.cancel.cancelled() => {}
                name = self.reverse_lookup(&hop.ip) => {
                    if let Some(name) = name {
                        hop.host = name;
                    }
                }
            }
        }

        // A cancel that landed during the lookup still suppresses the
        // hop event.
        if self.cancel.is_cancelled() {
            return;
        }

        let hop_index = hops.len();
        hops.push(hop.clone());
        let enrichable =
            self.config.enable_geo && !hop.is_timeout() && !is_reserved_ip(&hop.ip);
        self.emit(TraceEvent::Hop(hop.clone()));
        if enrichable {
            enricher.spawn(hop_index, hop.ip);
        }
    }

    async fn reverse_lookup(&self, ip: &str) -> Option<String> {
        let addr: IpAddr = ip.parse().ok()?;
        let limit = RDNS_TIMEOUT.min(self.config.grace_period);
        tokio::time::timeout(limit, self.services.rdns.lookup(addr))
            .await
            .ok()?
            .ok()
    }
}
