//! Session Configuration - passed from higher layers

use crate::core::{DerivationPath, KeyContext};
use crate::keys::DerivationScheme;
use crate::tx::{PollPolicy, SubmissionConfig};
use std::time::Duration;

/// Session configuration. Higher layers construct this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub scheme: DerivationScheme,
    /// Path shown before the user edits anything.
    pub initial_path: DerivationPath,
    pub submission: SubmissionConfig,
}

impl SessionConfig {
    pub fn new() -> Self { Self::default() }

    /// Defaults with submission settings taken from the environment.
    pub fn from_env() -> Self { Self { submission: SubmissionConfig::from_env(), ..Default::default() } }

    pub fn with_scheme(mut self, scheme: DerivationScheme) -> Self { self.scheme = scheme; self }
    pub fn with_initial_path(mut self, path: DerivationPath) -> Self { self.initial_path = path; self }
    pub fn with_context(mut self, context: KeyContext) -> Self { self.initial_path.context = context; self }
    pub fn with_submission(mut self, c: SubmissionConfig) -> Self { self.submission = c; self }
    pub fn with_poll(mut self, poll: PollPolicy) -> Self { self.submission.poll = poll; self }
    pub fn with_poll_interval(mut self, interval: Duration) -> Self { self.submission.poll.interval = interval; self }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = SessionConfig::new();
        assert_eq!(c.scheme, DerivationScheme::Khovratovich);
        assert_eq!(c.initial_path, DerivationPath::default());
        assert_eq!(c.submission.poll.max_attempts, 30);
        assert_eq!(c.submission.poll.interval, Duration::from_secs(1));
    }

    #[test]
    fn test_builder() {
        let c = SessionConfig::new()
            .with_scheme(DerivationScheme::Peikert)
            .with_context(KeyContext::Identity)
            .with_poll(PollPolicy { max_attempts: 5, interval: Duration::from_millis(10) });
        assert_eq!(c.scheme, DerivationScheme::Peikert);
        assert_eq!(c.initial_path.context, KeyContext::Identity);
        assert_eq!(c.submission.poll.max_attempts, 5);
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("ARCWALLET_POLL_MAX_ATTEMPTS", "7");
        std::env::set_var("ARCWALLET_POLL_INTERVAL_MS", "250");
        let c = SessionConfig::from_env();
        assert_eq!(c.submission.poll, PollPolicy { max_attempts: 7, interval: Duration::from_millis(250) });

        std::env::set_var("ARCWALLET_POLL_MAX_ATTEMPTS", "0");
        let c = SessionConfig::from_env();
        std::env::remove_var("ARCWALLET_POLL_MAX_ATTEMPTS");
        std::env::remove_var("ARCWALLET_POLL_INTERVAL_MS");
        assert_eq!(c.submission.poll.max_attempts, 1);
    }
}
