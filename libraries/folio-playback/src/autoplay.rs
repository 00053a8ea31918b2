//! Autoplay policy
//!
//! Decides when the engine may start playback without a direct user gesture.
//! Browsers reject such attempts routinely, so a rejection is treated as a
//! pause rather than a failure, and it never counts as the user refusing.

/// What prompted the policy to be consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoplayTrigger {
    /// Engine mounted with its initial track
    Mount,

    /// The current track changed (next, prev, select, ended, playlist switch)
    TrackChange,

    /// The media resource reported it can start playing
    MediaReady,
}

/// Autoplay decision state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoplayPolicy {
    enabled: bool,
    /// Set on mount; the first attempt waits for the resource to be ready
    awaiting_ready: bool,
}

impl AutoplayPolicy {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            awaiting_ready: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.awaiting_ready = false;
        }
    }

    /// Whether a deferred mount attempt is still outstanding
    pub fn is_awaiting_ready(&self) -> bool {
        self.awaiting_ready
    }

    /// Returns true if `play()` should be attempted now
    pub fn decide(&mut self, trigger: AutoplayTrigger, user_paused: bool) -> bool {
        match trigger {
            AutoplayTrigger::Mount => {
                self.awaiting_ready = self.enabled;
                false
            }
            AutoplayTrigger::TrackChange => {
                // A track change supersedes the deferred mount attempt
                self.awaiting_ready = false;
                self.enabled && !user_paused
            }
            AutoplayTrigger::MediaReady => {
                let pending = std::mem::take(&mut self.awaiting_ready);
                pending && self.enabled && !user_paused
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_defers_until_ready() {
        let mut policy = AutoplayPolicy::new(true);

        assert!(!policy.decide(AutoplayTrigger::Mount, false));
        assert!(policy.is_awaiting_ready());

        assert!(policy.decide(AutoplayTrigger::MediaReady, false));
        // Only the first readiness after mount counts
        assert!(!policy.decide(AutoplayTrigger::MediaReady, false));
    }

    #[test]
    fn track_change_attempts_immediately() {
        let mut policy = AutoplayPolicy::new(true);
        assert!(policy.decide(AutoplayTrigger::TrackChange, false));
        assert!(!policy.decide(AutoplayTrigger::MediaReady, false));
    }

    #[test]
    fn user_pause_suppresses_attempts() {
        let mut policy = AutoplayPolicy::new(true);
        assert!(!policy.decide(AutoplayTrigger::TrackChange, true));

        policy.decide(AutoplayTrigger::Mount, true);
        assert!(!policy.decide(AutoplayTrigger::MediaReady, true));
    }

    #[test]
    fn disabled_policy_never_attempts() {
        let mut policy = AutoplayPolicy::new(false);
        policy.decide(AutoplayTrigger::Mount, false);
        assert!(!policy.is_awaiting_ready());
        assert!(!policy.decide(AutoplayTrigger::MediaReady, false));
        assert!(!policy.decide(AutoplayTrigger::TrackChange, false));
    }

    #[test]
    fn track_change_supersedes_deferred_mount() {
        let mut policy = AutoplayPolicy::new(true);
        policy.decide(AutoplayTrigger::Mount, false);
        assert!(policy.decide(AutoplayTrigger::TrackChange, false));
        assert!(!policy.is_awaiting_ready());
    }
}
