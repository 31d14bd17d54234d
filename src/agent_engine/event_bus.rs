use std::fmt;

use tokio::sync::mpsc;

use crate::agent_engine::state::RunOutcome;

/// One line of the loop → environment notification stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Status(String),
    Assistant(String),
    ActionPerformed(serde_json::Value),
    Finished(RunOutcome),
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Status(text) => f.write_str(text),
            Notification::Assistant(text) => write!(f, "Assistant: {text}"),
            Notification::ActionPerformed(summary) => write!(f, "Performed action: {summary}"),
            Notification::Finished(outcome) => f.write_str(&outcome.message()),
        }
    }
}

/// Sending half held by the run loop. A dropped receiver is not an error:
/// the run continues without an observer.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notification>>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A notifier that only logs.
    pub fn silent() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, note: Notification) {
        tracing::debug!(notification = %note, "notify");
        if let Some(tx) = &self.tx {
            if tx.send(note).is_err() {
                tracing::trace!("notification receiver dropped");
            }
        }
    }

    pub fn status(&self, text: impl Into<String>) {
        self.send(Notification::Status(text.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notifications_arrive_in_order() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.status("Starting run");
        notifier.send(Notification::Assistant("hi".into()));
        notifier.send(Notification::Finished(RunOutcome::Succeeded));
        drop(notifier);

        let mut lines = Vec::new();
        while let Some(note) = rx.recv().await {
            lines.push(note.to_string());
        }
        assert_eq!(
            lines,
            vec!["Starting run", "Assistant: hi", "Task completed successfully."]
        );
    }

    #[test]
    fn send_after_receiver_dropped_is_ignored() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.status("nobody listening");
        Notifier::silent().status("nor here");
    }
}
