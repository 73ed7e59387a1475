//! User-visible feedback for orchestration events.
//!
//! The orchestrator reports each initialization error and each destroyed
//! widget to an optional [`FeedbackSink`] in addition to logging it. An
//! [`Element`] works as a sink by appending one `<p>` per line, the way an
//! info panel on the page would show them. A [`Signal<String>`] works as a
//! sink by emitting each line.

use trellis_core::{Element, Signal};

/// Receives one human-readable line per reported event.
pub trait FeedbackSink: Send + Sync {
    fn report(&self, line: &str);
}

impl FeedbackSink for Element {
    fn report(&self, line: &str) {
        let appended = self
            .append_element("p")
            .and_then(|paragraph| paragraph.set_text(line));
        if let Err(err) = appended {
            tracing::warn!(target: "trellis::orchestrator", %err, line, "could not write feedback");
        }
    }
}

impl FeedbackSink for Signal<String> {
    fn report(&self, line: &str) {
        self.emit(line.to_string());
    }
}
