//! Platform abstraction traits for engine runtime services.
//!
//! These traits let the engine delegate deferred work and timing to the
//! host, so the same engine runs under a desktop loop, a test harness or a
//! manual pump without depending on a particular event loop.

/// Schedules deferred flushes of dirty units.
///
/// The engine calls [`schedule_flush`](RuntimeScheduler::schedule_flush)
/// once per batch, when the first dirty unit is queued. The host is expected
/// to call [`Engine::flush`](crate::Engine::flush) soon afterwards on the
/// thread that owns the engine.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host run a flush.
    fn schedule_flush(&self);
}

/// Provides timing information for hosts that drive periodic work.
pub trait Clock: Send + Sync {
    /// Instant type produced by this clock implementation.
    type Instant: Copy + Send + Sync;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;

    /// Returns the number of milliseconds elapsed since `since`.
    fn elapsed_millis(&self, since: Self::Instant) -> u64;
}
