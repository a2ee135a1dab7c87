//! Utilities to report what a provider is doing to the user

use std::fmt::{Display, Error, Formatter};

use crate::calendar::ViewMode;

/// An event that is worth telling the user
#[derive(Clone, Debug, PartialEq)]
pub enum FeedbackEvent {
    /// Nothing happened yet
    Idle,
    /// A view is being fetched
    Loading{ view: ViewMode },
    /// A view has been fetched and is now displayed
    Loaded{ view: ViewMode },
    /// A transient notice that an action succeeded
    Success(String),
    /// A transient notice that something failed
    Error(String),
}

impl Display for FeedbackEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            FeedbackEvent::Idle => write!(f, "Idle"),
            FeedbackEvent::Loading{view} => write!(f, "Loading the {} view...", view),
            FeedbackEvent::Loaded{view} => write!(f, "The {} view is up to date", view),
            FeedbackEvent::Success(text) => write!(f, "{}", text),
            FeedbackEvent::Error(text) => write!(f, "Error: {}", text),
        }
    }
}

impl Default for FeedbackEvent {
    fn default() -> Self {
        Self::Idle
    }
}



/// See [`feedback_channel`]
pub type FeedbackSender = tokio::sync::watch::Sender<FeedbackEvent>;
/// See [`feedback_channel`]
pub type FeedbackReceiver = tokio::sync::watch::Receiver<FeedbackEvent>;

/// Create a feeback channel, that can be used to retrieve the latest notice of a provider
pub fn feedback_channel() -> (FeedbackSender, FeedbackReceiver) {
    tokio::sync::watch::channel(FeedbackEvent::default())
}



/// A structure that logs notices, counts errors, and forwards them to a listener (if any)
#[derive(Debug, Default)]
pub struct Feedback {
    n_errors: u32,
    channel: Option<FeedbackSender>,
}

impl Feedback {
    pub fn new() -> Self {
        Self { n_errors: 0, channel: None }
    }
    pub fn new_with_feedback_channel(channel: FeedbackSender) -> Self {
        Self { n_errors: 0, channel: Some(channel) }
    }

    /// How many errors have been reported so far
    pub fn n_errors(&self) -> u32 {
        self.n_errors
    }

    /// Log an error, and send it as a transient notice
    pub fn error(&mut self, text: &str) {
        log::error!("{}", text);
        self.n_errors += 1;
        self.send(FeedbackEvent::Error(text.to_string()));
    }
    /// Log a success, and send it as a transient notice
    pub fn success(&mut self, text: &str) {
        log::info!("{}", text);
        self.send(FeedbackEvent::Success(text.to_string()));
    }
    /// Log an info. Nothing is sent to the listener
    pub fn info(&mut self, text: &str) {
        log::info!("{}", text);
    }

    /// Send an event as a feedback to the listener (if any).
    pub fn send(&mut self, event: FeedbackEvent) {
        if let Some(sender) = &self.channel {
            // Nobody listening is fine
            let _ = sender.send(event);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_counted_and_forwarded() {
        let (sender, receiver) = feedback_channel();
        let mut feedback = Feedback::new_with_feedback_channel(sender);
        assert_eq!(*receiver.borrow(), FeedbackEvent::Idle);

        feedback.success("Todo created");
        assert_eq!(*receiver.borrow(), FeedbackEvent::Success("Todo created".to_string()));
        assert_eq!(feedback.n_errors(), 0);

        feedback.error("Failed to reorder");
        assert_eq!(receiver.borrow().to_string(), "Error: Failed to reorder");
        assert_eq!(feedback.n_errors(), 1);

        let mut silent = Feedback::new();
        silent.error("nobody hears this");
        assert_eq!(silent.n_errors(), 1);
    }
}
