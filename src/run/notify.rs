use std::fmt;

/// How a run ended. Delivered once to the completion callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every job settled and the results were written.
    Completed,
    /// No test qualified; nothing was rendered or written.
    Empty,
    /// The run was canceled before persistence; nothing was written.
    Canceled,
    /// Every job settled but writing results failed.
    PersistFailed(String),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::Empty)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Empty => f.write_str("empty"),
            Self::Canceled => f.write_str("canceled"),
            Self::PersistFailed(msg) => write!(f, "persist failed: {msg}"),
        }
    }
}

type Callback = Box<dyn FnOnce(&RunOutcome) + Send>;

/// Single-shot completion callback.
pub struct CompletionNotifier {
    callback: Option<Callback>,
    fired: bool,
}

impl CompletionNotifier {
    pub fn new(callback: impl FnOnce(&RunOutcome) + Send + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
            fired: false,
        }
    }

    /// Notifier without a callback; still tracks whether it fired.
    pub fn noop() -> Self {
        Self {
            callback: None,
            fired: false,
        }
    }

    /// Invoke the callback. Returns `false` (and does nothing) when already fired.
    pub fn notify(&mut self, outcome: &RunOutcome) -> bool {
        if self.fired {
            tracing::warn!(%outcome, "completion already signaled; ignoring");
            return false;
        }
        self.fired = true;
        if let Some(cb) = self.callback.take() {
            cb(outcome);
        }
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

impl Default for CompletionNotifier {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for CompletionNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionNotifier")
            .field("has_callback", &self.callback.is_some())
            .field("fired", &self.fired)
            .finish()
    }
}
