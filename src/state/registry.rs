//! The Registry - shared map of active sessions.
//!
//! The Registry is the single source of truth for who is currently
//! connected. Every membership mutation and every snapshot goes through one
//! critical section, so a check-and-insert can never race with another
//! registration and a broadcast always sees a consistent point-in-time view.

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Outbound sink for one connected session.
///
/// Lines queued here are drained into the peer's socket by that session's
/// own writer task. The Registry holds the only long-lived clone; the queue
/// dies with the session.
pub type Sink = mpsc::Sender<String>;

/// Shared nickname -> sink map, insertion-ordered.
pub struct Registry {
    /// All access serializes on this lock. It is never held across an
    /// `.await`; callers snapshot what they need and release.
    entries: Mutex<Vec<(String, Sink)>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Atomically claim `nickname` for the given sink.
    ///
    /// Returns `false` and mutates nothing if the nickname is already
    /// registered. Exactly one of any set of concurrent attempts on the
    /// same nickname succeeds.
    pub fn try_register(&self, nickname: &str, sink: Sink) -> bool {
        let mut entries = self.entries.lock();
        if entries.iter().any(|(nick, _)| nick == nickname) {
            return false;
        }
        entries.push((nickname.to_string(), sink));
        true
    }

    /// Remove `nickname` from the registry. Idempotent; a no-op if absent.
    pub fn unregister(&self, nickname: &str) {
        self.entries.lock().retain(|(nick, _)| nick != nickname);
    }

    /// Look up the sink for a registered nickname.
    pub fn lookup(&self, nickname: &str) -> Option<Sink> {
        self.entries
            .lock()
            .iter()
            .find(|(nick, _)| nick == nickname)
            .map(|(_, sink)| sink.clone())
    }

    /// Point-in-time view of every outbound sink, in registration order.
    pub fn snapshot_sinks(&self) -> Vec<Sink> {
        self.entries
            .lock()
            .iter()
            .map(|(_, sink)| sink.clone())
            .collect()
    }

    /// Currently registered nicknames, in registration order.
    pub fn snapshot_nicknames(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|(nick, _)| nick.clone())
            .collect()
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when no session is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
