/// Coarse stage of the install workflow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Compatibility feed request in flight.
    FeedLoading,
    /// Feed could not be loaded. Re-invoking the loader retries.
    FeedError(String),
    /// Feed loaded, user is choosing components.
    Selecting,
    /// Download requests dispatched, waiting on responses.
    Downloading,
    /// Every report entry has a terminal outcome.
    Complete,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "IDLE",
            Phase::FeedLoading => "LOADING",
            Phase::FeedError(_) => "ERROR",
            Phase::Selecting => "SELECTING",
            Phase::Downloading => "DOWNLOADING",
            Phase::Complete => "COMPLETE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_label_ignores_reason() {
        assert_eq!(Phase::FeedError("timeout".into()).label(), "ERROR");
        assert_eq!(Phase::default().label(), "IDLE");
    }
}
