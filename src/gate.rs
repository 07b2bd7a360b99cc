//! Suppression of touch input around keyboard activity.

use std::time::{Duration, Instant};

/// How long touch input stays suppressed after a keystroke.
pub const QUIET_WINDOW: Duration = Duration::from_millis(500);

/// Represents the input suppression state consulted before any report is
/// processed.
///
/// Both mutators are driven by the keyboard collaborator; the report path
/// only ever reads.
#[derive(Clone, Copy, Debug)]
pub struct InputGate {
    /// Set while touch input is disabled as a whole.
    ignore_all: bool,

    /// When the most recent keystroke was observed.
    last_keystroke: Option<Instant>,

    /// The quiet window opened by every keystroke.
    quiet_window: Duration,
}

impl InputGate {
    pub fn new(quiet_window: Duration) -> Self {
        Self {
            ignore_all: false,
            last_keystroke: None,
            quiet_window,
        }
    }

    /// Whether a report arriving at `now` may be processed.
    pub fn should_process(&self, now: Instant) -> bool {
        if self.ignore_all {
            return false;
        }

        match self.last_keystroke {
            Some(at) => now.duration_since(at) >= self.quiet_window,
            None => true,
        }
    }

    /// Suppresses or re-enables touch input as a whole.
    pub fn set_ignore_all(&mut self, ignore: bool) {
        self.ignore_all = ignore;
    }

    /// Whether touch input is currently suppressed as a whole.
    pub fn ignore_all(&self) -> bool {
        self.ignore_all
    }

    /// Records keyboard activity, opening the quiet window.
    pub fn record_keystroke(&mut self, at: Instant) {
        self.last_keystroke = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processes_by_default() {
        let gate = InputGate::new(QUIET_WINDOW);
        assert!(gate.should_process(Instant::now()));
    }

    #[test]
    fn keystroke_opens_a_quiet_window() {
        let mut gate = InputGate::new(QUIET_WINDOW);
        let at = Instant::now();

        gate.record_keystroke(at);

        assert!(!gate.should_process(at));
        assert!(!gate.should_process(at + Duration::from_millis(499)));
        assert!(gate.should_process(at + QUIET_WINDOW));
        assert!(gate.should_process(at + Duration::from_secs(2)));
    }

    #[test]
    fn later_keystrokes_reopen_the_window() {
        let mut gate = InputGate::new(QUIET_WINDOW);
        let at = Instant::now();

        gate.record_keystroke(at);
        gate.record_keystroke(at + Duration::from_millis(400));

        assert!(!gate.should_process(at + Duration::from_millis(700)));
        assert!(gate.should_process(at + Duration::from_millis(900)));
    }

    #[test]
    fn ignore_all_wins_over_the_window() {
        let mut gate = InputGate::new(QUIET_WINDOW);

        gate.set_ignore_all(true);
        assert!(!gate.should_process(Instant::now()));

        gate.set_ignore_all(false);
        assert!(gate.should_process(Instant::now()));
    }
}
