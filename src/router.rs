//! Message classification and delivery.
//!
//! The router is pure logic: given a line from an active session and the
//! Registry, decide which outbound lines go where. It never touches a
//! socket; delivery happens through the per-session sinks.

use crate::state::Registry;
use tracing::debug;

/// The explicit disconnect keyword, matched case-insensitively.
const TERMINATE_KEYWORD: &str = "chao";

/// Prefix of the roster refresh line sent on every membership change.
const ROSTER_PREFIX: &str = "Active Users: ";

/// What an inbound line from an active session means.
#[derive(Debug, PartialEq, Eq)]
pub enum Action<'a> {
    /// End the session.
    Terminate,
    /// Deliver a private message to one recipient.
    Direct { recipient: &'a str, body: &'a str },
    /// No server action.
    Ignore,
}

/// Classify one line from an active session.
pub fn classify(line: &str) -> Action<'_> {
    if line.eq_ignore_ascii_case(TERMINATE_KEYWORD) {
        return Action::Terminate;
    }
    if let Some(rest) = line.strip_prefix('@') {
        // Directed form is "@recipient:body", split on the first colon.
        // A missing colon is a malformed line: no delivery, no error.
        let Some((recipient, body)) = rest.split_once(':') else {
            return Action::Ignore;
        };
        // A body of just the terminate keyword ends the sender's session
        // without notifying the recipient. Surprising, but deployed clients
        // rely on it as an alternate way to sign off.
        if body.trim().eq_ignore_ascii_case(TERMINATE_KEYWORD) {
            return Action::Terminate;
        }
        return Action::Direct { recipient, body };
    }
    // Free-text broadcast is not part of the protocol.
    Action::Ignore
}

/// Whether the session keeps running after one routed line.
#[derive(Debug, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    Terminate,
}

/// Route one line from the active session `sender`.
pub async fn route(registry: &Registry, sender: &str, line: &str) -> Disposition {
    match classify(line) {
        Action::Terminate => Disposition::Terminate,
        Action::Direct { recipient, body } => {
            deliver_private(registry, sender, recipient, body).await;
            Disposition::Continue
        }
        Action::Ignore => Disposition::Continue,
    }
}

/// Deliver a private message to `recipient` and echo a copy to `sender`.
///
/// An unregistered recipient drops the message silently; the sender is not
/// told.
async fn deliver_private(registry: &Registry, sender: &str, recipient: &str, body: &str) {
    let Some(recipient_sink) = registry.lookup(recipient) else {
        debug!(sender, recipient, "dropping message for unknown recipient");
        return;
    };
    let message = format_private(sender, body);
    let _ = recipient_sink.send(message.clone()).await;
    if let Some(sender_sink) = registry.lookup(sender) {
        let _ = sender_sink.send(message).await;
    }
}

/// Format a private message line as delivered to both parties.
pub fn format_private(sender: &str, body: &str) -> String {
    format!("[{sender}(Private)]: {body}")
}

/// Send the current roster to every registered session.
///
/// Both snapshots are taken under the Registry lock, so the roster string
/// and the sink list reflect the same membership instant. A session that
/// dies mid-broadcast just fails its send; its own cleanup removes it.
pub async fn broadcast_roster(registry: &Registry) {
    // The last departure leaves nobody to tell.
    if registry.is_empty() {
        return;
    }
    let line = roster_line(&registry.snapshot_nicknames());
    for sink in registry.snapshot_sinks() {
        let _ = sink.send(line.clone()).await;
    }
}

fn roster_line(nicknames: &[String]) -> String {
    format!("{ROSTER_PREFIX}{}", nicknames.join(", "))
}
