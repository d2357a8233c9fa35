//! # Flag Source Boundary
//!
//! The trait that isolates the monitor from the platform.
//!
//! A flag source knows three things: how to turn a [`Target`] into a handle it
//! can evaluate, what the connectivity flags for that handle currently are,
//! and how to ping a sink whenever those flags change. The monitor depends
//! strictly on this abstraction; the system adapter and the test mock
//! implement it.

use std::sync::Arc;

use reachr_common::error::{QueryError, ResolveError, SubscribeError};
use reachr_common::flags::RawFlags;
use reachr_common::target::Target;

/// A resolved, source-validated target.
///
/// Opaque to callers: monitors receive one from [`FlagSource::resolve`] and
/// hand it back unmodified to `query` and `subscribe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHandle {
    target: Target,
}

impl TargetHandle {
    pub fn new(target: Target) -> Self {
        TargetHandle { target }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }
}

/// Identifies one active subscription inside a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Called by a source on its own delivery context whenever the flags for a
/// subscribed handle may have changed. Carries no payload: the receiver
/// re-queries, so a stale ping costs one query and nothing else.
pub type EventSink = Arc<dyn Fn() + Send + Sync>;

/// Where connectivity flags come from.
///
/// Implementations must deliver events for one handle serially: a sink is
/// never invoked concurrently with itself.
pub trait FlagSource: Send + Sync {
    /// Validates a target and produces the handle used for later calls.
    fn resolve(&self, target: &Target) -> Result<TargetHandle, ResolveError>;

    /// Queries the current flags for a handle. A failure here is transient;
    /// callers degrade to `Unknown` and do not retry.
    fn query(&self, handle: &TargetHandle) -> Result<RawFlags, QueryError>;

    /// Attaches a sink to the flags-changed events for a handle.
    fn subscribe(
        &self,
        handle: &TargetHandle,
        sink: EventSink,
    ) -> Result<SubscriptionId, SubscribeError>;

    /// Detaches a previously attached sink. After this returns, the source
    /// will start no new deliveries for the subscription; a delivery already
    /// in flight may still complete.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Whether this platform can route traffic over a cellular transport at
    /// all. Sources without that knowledge report `false`.
    fn supports_wwan(&self) -> bool {
        false
    }
}

/// Owned attachment to a source's event stream. Dropping it detaches.
pub struct Subscription {
    source: Arc<dyn FlagSource>,
    id: SubscriptionId,
}

impl Subscription {
    pub fn new(source: Arc<dyn FlagSource>, id: SubscriptionId) -> Self {
        Subscription { source, id }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.source.unsubscribe(self.id);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
