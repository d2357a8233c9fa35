//! # Reachability Monitor
//!
//! The stateful half of the crate: owns a target, seeds its status with one
//! synchronous query, then turns flags-changed pings from a [`FlagSource`]
//! into at-most-one handler invocation per actual status change.
//!
//! ## Locking discipline
//! The `(status, connection_required, handler)` triple lives under a single
//! `Mutex`. The delivery path updates state under the lock, releases it, and
//! only then invokes the handler, recording the delivering thread while it
//! does. Handler invocations never overlap for one monitor: a re-entrant
//! classification (a handler calling [`ReachabilityMonitor::refresh`] on its
//! own monitor) is parked and delivered by the outer frame after the running
//! invocation returns. [`ReachabilityMonitor::stop`] clears the handler under
//! the same lock and blocks on a condvar until an in-flight delivery drains,
//! unless it is called *from* that delivery (the handler calling `stop()` on
//! its own monitor), which is detected by thread id and returns without
//! waiting. Either way, no callback fires after `stop` returns.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use tracing::{debug, warn};

use reachr_common::error::ConstructionError;
use reachr_common::status::ReachabilityStatus;
use reachr_common::target::Target;

use crate::classify::{self, Classification};
use crate::source::{EventSink, FlagSource, Subscription, TargetHandle};

/// Callback invoked with the new `(status, connection_required)` pair after
/// every change. Never invoked re-entrantly for the same monitor.
pub type ChangeHandler = dyn Fn(ReachabilityStatus, bool) + Send + Sync;

struct Inner {
    status: ReachabilityStatus,
    connection_required: bool,
    handler: Option<Arc<ChangeHandler>>,
    /// Thread currently running a handler invocation, if any.
    delivering: Option<ThreadId>,
    /// Classification produced re-entrantly while a handler was running,
    /// waiting for the outer delivery frame to pick it up.
    pending: Option<Classification>,
}

struct Shared {
    state: Mutex<Inner>,
    drained: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking handler must not wedge the monitor for good.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Watches one [`Target`] through a [`FlagSource`].
///
/// Construct with one of the four target helpers, call [`start`] to seed the
/// status and attach to change events, read [`status`] /
/// [`is_connection_required`] at any time, and [`stop`] (or drop) to detach.
///
/// [`start`]: ReachabilityMonitor::start
/// [`status`]: ReachabilityMonitor::status
/// [`is_connection_required`]: ReachabilityMonitor::is_connection_required
/// [`stop`]: ReachabilityMonitor::stop
pub struct ReachabilityMonitor {
    target: Target,
    handle: TargetHandle,
    wwan_capable: bool,
    source: Arc<dyn FlagSource>,
    shared: Arc<Shared>,
    subscription: Mutex<Option<Subscription>>,
}

impl ReachabilityMonitor {
    /// Creates a monitor for an explicit target.
    ///
    /// Fails when the target is an empty host name or when the source cannot
    /// produce a handle for it.
    pub fn new(
        target: Target,
        source: Arc<dyn FlagSource>,
    ) -> Result<Self, ConstructionError> {
        if let Target::Host { name } = &target {
            if name.trim().is_empty() {
                return Err(ConstructionError::EmptyHostName);
            }
        }

        let handle = source.resolve(&target)?;

        // The local segment is by definition not behind a cellular link.
        let wwan_capable =
            source.supports_wwan() && !matches!(target, Target::LocalWiFi);

        Ok(ReachabilityMonitor {
            target,
            handle,
            wwan_capable,
            source,
            shared: Arc::new(Shared {
                state: Mutex::new(Inner {
                    status: ReachabilityStatus::Unknown,
                    connection_required: false,
                    handler: None,
                    delivering: None,
                    pending: None,
                }),
                drained: Condvar::new(),
            }),
            subscription: Mutex::new(None),
        })
    }

    /// Monitor reachability of a named host.
    pub fn for_host(
        name: impl Into<String>,
        source: Arc<dyn FlagSource>,
    ) -> Result<Self, ConstructionError> {
        Self::new(Target::host(name)?, source)
    }

    /// Monitor reachability of a raw IPv4 endpoint.
    pub fn for_address(
        endpoint: std::net::SocketAddrV4,
        source: Arc<dyn FlagSource>,
    ) -> Result<Self, ConstructionError> {
        Self::new(Target::address(endpoint), source)
    }

    /// Monitor whether any outbound route exists at all.
    pub fn for_internet(source: Arc<dyn FlagSource>) -> Result<Self, ConstructionError> {
        Self::new(Target::default_route(), source)
    }

    /// Monitor the local wireless segment only.
    pub fn for_local_wifi(source: Arc<dyn FlagSource>) -> Result<Self, ConstructionError> {
        Self::new(Target::local_wifi(), source)
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The most recently classified status. `Unknown` before the first
    /// successful query. Available with or without a running subscription.
    pub fn status(&self) -> ReachabilityStatus {
        self.shared.lock().status
    }

    /// Whether reaching the target needs a user-visible connection step first.
    pub fn is_connection_required(&self) -> bool {
        self.shared.lock().connection_required
    }

    /// Seeds the status with one synchronous flag query, registers the change
    /// handler, and attaches to the source's event stream.
    ///
    /// The seed itself never invokes the handler; callers read [`status`]
    /// directly after `start` returns. Returns `false` when the event
    /// attachment fails; the monitor then stays usable for synchronous
    /// polling ([`status`], [`refresh`]) and `start` may be retried.
    ///
    /// Starting an already-attached monitor replaces the handler, keeps the
    /// existing subscription and cached status, and returns `true`; use
    /// [`refresh`] for an explicit re-query.
    ///
    /// [`status`]: ReachabilityMonitor::status
    /// [`refresh`]: ReachabilityMonitor::refresh
    pub fn start<F>(&self, on_change: F) -> bool
    where
        F: Fn(ReachabilityStatus, bool) + Send + Sync + 'static,
    {
        let mut slot = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        {
            let mut inner = self.shared.lock();
            inner.handler = Some(Arc::new(on_change));

            if slot.is_some() {
                return true;
            }

            let seed = self.query_classification();
            debug!(watching = %self.target, status = %seed.status, "seeded status");
            inner.status = seed.status;
            inner.connection_required = seed.connection_required;
        }

        match self.source.subscribe(&self.handle, self.event_sink()) {
            Ok(id) => {
                *slot = Some(Subscription::new(Arc::clone(&self.source), id));
                true
            }
            Err(err) => {
                warn!(watching = %self.target, "event attach failed: {err}");
                false
            }
        }
    }

    /// Detaches from the event stream and clears the handler.
    ///
    /// Idempotent. Safe to call while a delivery is in flight (blocks until
    /// it drains) and safe to call from inside the change handler itself.
    pub fn stop(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let mut inner = self.shared.lock();
        inner.handler = None;

        let current = thread::current().id();
        while inner.delivering.is_some_and(|tid| tid != current) {
            inner = self
                .shared
                .drained
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
        drop(inner);

        drop(subscription);
    }

    /// Re-queries the flags right now and runs the normal classify-and-diff
    /// step: stored state is updated and, if the result changed and a handler
    /// is registered, the handler fires. Called from inside the change
    /// handler itself, the result is delivered after the running invocation
    /// returns; invocations never overlap.
    pub fn refresh(&self) {
        let classification = self.query_classification();
        deliver(&self.shared, classification);
    }

    fn query_classification(&self) -> Classification {
        match self.source.query(&self.handle) {
            Ok(flags) => classify::classify(flags, self.wwan_capable),
            Err(err) => {
                warn!(watching = %self.target, "flag query failed: {err}");
                Classification::UNKNOWN
            }
        }
    }

    fn event_sink(&self) -> EventSink {
        let shared = Arc::clone(&self.shared);
        let source = Arc::clone(&self.source);
        let handle = self.handle.clone();
        let target = self.target.clone();
        let wwan_capable = self.wwan_capable;

        Arc::new(move || {
            let classification = match source.query(&handle) {
                Ok(flags) => classify::classify(flags, wwan_capable),
                Err(err) => {
                    warn!(watching = %target, "flag query failed: {err}");
                    Classification::UNKNOWN
                }
            };
            deliver(&shared, classification);
        })
    }
}

impl Drop for ReachabilityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The classify-and-diff step shared by event delivery and [`refresh`].
///
/// Stored state is updated first, under the lock; the handler is invoked
/// afterwards with the pair it was dispatched with, outside the lock, so a
/// handler may call `stop()` on its own monitor. With no handler registered
/// the result is still stored, which keeps polling live on a stopped monitor.
///
/// Handler invocations never overlap. A re-entrant call on the delivering
/// thread (a handler calling [`refresh`]) parks its classification in
/// `pending`; the outer frame picks it up after the running invocation
/// returns and delivers it as its own change. The `delivering` marker is set
/// and cleared only by the frame that owns the delivery loop, so a concurrent
/// `stop()` cannot observe it cleared while a callback is still on the stack.
///
/// [`refresh`]: ReachabilityMonitor::refresh
fn deliver(shared: &Shared, classification: Classification) {
    let mut inner = shared.lock();
    let current = thread::current().id();

    // Re-entry from inside the handler: park the result for the outer frame.
    // Parking only matters when the value actually differs from what the
    // outer frame just stored.
    if inner.delivering == Some(current) {
        if classification.pair() != (inner.status, inner.connection_required) {
            inner.pending = Some(classification);
        }
        return;
    }

    // Sources deliver serially per handle; tolerate ones that do not by
    // draining a foreign in-flight delivery before touching state.
    while inner.delivering.is_some() {
        inner = shared
            .drained
            .wait(inner)
            .unwrap_or_else(PoisonError::into_inner);
    }

    let mut next = Some(classification);
    while let Some(cls) = next.take() {
        if cls.pair() == (inner.status, inner.connection_required) {
            break;
        }

        inner.status = cls.status;
        inner.connection_required = cls.connection_required;
        debug!(status = %cls.status, "reachability changed");

        let Some(handler) = inner.handler.clone() else {
            break;
        };

        inner.delivering = Some(current);
        drop(inner);

        handler(cls.status, cls.connection_required);

        // The lock is held from here through the next iteration's handler
        // dispatch, so waiters never observe the marker cleared between two
        // parked deliveries.
        inner = shared.lock();
        inner.delivering = None;
        next = inner.pending.take();
    }

    drop(inner);
    shared.drained.notify_all();
}
