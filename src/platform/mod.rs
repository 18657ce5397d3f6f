//! Seam between the load controller and the host platform.
//!
//! The controller never touches the browser directly. It asks a [`Platform`] for
//! resources (a fetch, a ticker, a reachability subscription) and receives
//! their results back as [`PlatformEvent`]s tagged with the [`LoadToken`] of
//! the load that produced them.

use serde::Serialize;
use web_time::{Duration, Instant};

use crate::config::CompletionStrategy;
use crate::error::{LoadFailure, Result};

#[cfg(test)]
pub mod mock;

/// Generation token identifying one `start()` of one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadToken(u64);

impl LoadToken {
    pub fn new(generation: u64) -> Self {
        Self(generation)
    }

    pub fn generation(&self) -> u64 {
        self.0
    }

    /// Token for the load following this one.
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// How a fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Loaded,
    Failed(LoadFailure),
}

/// Something the platform observed on behalf of a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    /// A fetch delivered its first completion callback
    FetchSettled {
        token: LoadToken,
        outcome: FetchOutcome,
    },
    /// The elapsed-time ticker fired
    Tick { token: LoadToken },
    /// Network reachability changed
    Reachability(bool),
}

/// Instrumentation emitted on every tick while loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEvent {
    /// Time since the load started, in milliseconds
    pub elapsed_time: u64,
    /// Configured resource size, if known
    pub size: Option<u64>,
    pub over_threshold: bool,
}

impl ConnectionEvent {
    pub fn new(elapsed: Duration, size: Option<u64>, over_threshold: bool) -> Self {
        Self {
            elapsed_time: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            size,
            over_threshold,
        }
    }
}

/// A platform resource that must be given back.
///
/// Releasing detaches every hook the resource holds, so no event is delivered
/// for it afterwards. Calling `release` more than once is allowed.
pub trait Release {
    fn release(&mut self);
}

/// Browser-like primitives the controller is built on.
pub trait Platform {
    /// An in-flight image fetch
    type Fetch: Release;
    /// A recurring elapsed-time ticker
    type Ticker: Release;
    /// A subscription to online/offline notifications
    type Watch: Release;

    fn now(&self) -> Instant;

    /// Current reachability as reported by the platform.
    fn is_online(&self) -> bool;

    /// Begin fetching `src`. The outcome arrives later as
    /// [`PlatformEvent::FetchSettled`] carrying `token`.
    fn open_fetch(
        &mut self,
        src: &str,
        token: LoadToken,
        strategy: CompletionStrategy,
    ) -> Result<Self::Fetch>;

    /// Start delivering [`PlatformEvent::Tick`] every `interval`.
    fn start_ticker(&mut self, interval: Duration, token: LoadToken) -> Result<Self::Ticker>;

    /// Start delivering [`PlatformEvent::Reachability`] on changes.
    fn watch_reachability(&mut self) -> Result<Self::Watch>;

    /// Publish instrumentation to the platform's own event channel.
    fn dispatch_connection(&mut self, _event: &ConnectionEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generations() {
        let first = LoadToken::new(0);
        let second = first.next();
        assert_ne!(first, second);
        assert_eq!(second.generation(), 1);
        assert!(second > first);
    }

    #[test]
    fn test_connection_event_json() {
        let event = ConnectionEvent::new(Duration::from_millis(250), Some(1024), true);
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"elapsedTime":250,"size":1024,"overThreshold":true}"#);
    }
}
