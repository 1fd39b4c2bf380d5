//! Blink detection state machine.
//!
//! Consumes one "eyes closed this frame" flag per frame and emits a blink
//! once a closure episode of acceptable length is followed by enough open
//! frames:
//!
//! ```text
//! Open -> Closing -> Closed -> Opening -> Open (blink)
//!                      |          ^
//!                      v          |
//!                  HeldClosed ----+        (suppressed, no blink)
//! ```
//!
//! Closures longer than the maximum duration are sustained closure (looking
//! down, rubbing eyes) and never count as blinks, even after the eyes reopen.

use crate::{
    config::BlinkConfig,
    constants::{BLINK_DURATION_MAX_FRAMES, BLINK_DURATION_MIN_FRAMES, MIN_OPEN_FRAMES},
};
use log::debug;
use std::fmt;

/// Eye state tracked across frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlinkState {
    #[default]
    Open,
    Closing,
    Closed,
    Opening,
    HeldClosed,
}

impl BlinkState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closing => "CLOSING",
            Self::Closed => "CLOSED",
            Self::Opening => "OPENING",
            Self::HeldClosed => "HELD_CLOSED",
        }
    }
}

impl fmt::Display for BlinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one state machine step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: BlinkState,
    pub to: BlinkState,
    pub blink_detected: bool,
    /// Closed-frame count after the step
    pub closed_frames: u32,
    /// Open-frame count after the step
    pub open_frames: u32,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.blink_detected {
            return f.write_str("BLINK DETECTED!");
        }
        match (self.from, self.to) {
            (BlinkState::Closing, BlinkState::Open) => write!(f, "{}→{} (too brief)", self.from, self.to),
            (BlinkState::Closing | BlinkState::Closed, BlinkState::Closing | BlinkState::Closed) => {
                write!(f, "{} ({})", self.to, self.closed_frames)
            }
            (BlinkState::Opening, BlinkState::Opening) => write!(f, "{} ({})", self.to, self.open_frames),
            (from, to) if from == to => write!(f, "{to}"),
            (from, to) => write!(f, "{from}→{to}"),
        }
    }
}

/// Frame-count limits of a valid blink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkLimits {
    /// Closed frames needed before a closure counts as a blink candidate
    pub min_closed_frames: u32,
    /// Closed frames beyond which the closure is sustained, not a blink
    pub max_closed_frames: u32,
    /// Consecutive open frames that confirm a blink
    pub min_open_frames: u32,
}

impl Default for BlinkLimits {
    fn default() -> Self {
        Self {
            min_closed_frames: BLINK_DURATION_MIN_FRAMES,
            max_closed_frames: BLINK_DURATION_MAX_FRAMES,
            min_open_frames: MIN_OPEN_FRAMES,
        }
    }
}

impl From<&BlinkConfig> for BlinkLimits {
    fn from(config: &BlinkConfig) -> Self {
        Self {
            min_closed_frames: config.min_closed_frames,
            max_closed_frames: config.max_closed_frames,
            min_open_frames: config.min_open_frames,
        }
    }
}

/// Debounced blink detector.
///
/// Exactly one instance lives per session and it is stepped once per frame
/// with a face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlinkStateMachine {
    limits: BlinkLimits,
    state: BlinkState,
    closed_frames: u32,
    open_frames: u32,
    /// Current episode exceeded the maximum closure length
    suppressed: bool,
    total_blinks: u64,
}

impl BlinkStateMachine {
    /// Create a state machine in the `Open` state.
    ///
    /// # Panics
    ///
    /// Panics if any limit is zero or the minimum closure exceeds the maximum.
    #[must_use]
    pub fn new(limits: BlinkLimits) -> Self {
        assert!(limits.min_closed_frames > 0, "Minimum closed frames must be greater than 0");
        assert!(limits.min_open_frames > 0, "Minimum open frames must be greater than 0");
        assert!(
            limits.min_closed_frames <= limits.max_closed_frames,
            "Minimum closed frames must not exceed maximum"
        );
        Self {
            limits,
            state: BlinkState::Open,
            closed_frames: 0,
            open_frames: 0,
            suppressed: false,
            total_blinks: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> BlinkState {
        self.state
    }

    #[must_use]
    pub fn total_blinks(&self) -> u64 {
        self.total_blinks
    }

    #[must_use]
    pub fn closed_frames(&self) -> u32 {
        self.closed_frames
    }

    #[must_use]
    pub fn open_frames(&self) -> u32 {
        self.open_frames
    }

    #[must_use]
    pub fn limits(&self) -> BlinkLimits {
        self.limits
    }

    /// Advance by one frame
    pub fn update(&mut self, is_closed: bool) -> Transition {
        let from = self.state;
        let mut blink_detected = false;

        match (self.state, is_closed) {
            (BlinkState::Open, false) => {}
            (BlinkState::Open, true) => {
                self.closed_frames = 1;
                self.open_frames = 0;
                self.suppressed = false;
                self.state = BlinkState::Closing;
                self.promote_closure();
            }
            (BlinkState::Closing, true) => {
                self.closed_frames += 1;
                self.promote_closure();
            }
            (BlinkState::Closing, false) => self.reset_episode(),
            (BlinkState::Closed, true) => {
                self.closed_frames += 1;
                self.check_held();
            }
            (BlinkState::Closed | BlinkState::HeldClosed, false) => {
                self.state = BlinkState::Opening;
                self.open_frames = 1;
                blink_detected = self.confirm_if_open_long_enough();
            }
            (BlinkState::Opening, false) => {
                self.open_frames += 1;
                blink_detected = self.confirm_if_open_long_enough();
            }
            (BlinkState::Opening, true) => {
                self.open_frames = 0;
                self.closed_frames = self.closed_frames.saturating_add(1);
                self.state = if self.suppressed {
                    BlinkState::HeldClosed
                } else {
                    BlinkState::Closed
                };
                self.check_held();
            }
            (BlinkState::HeldClosed, true) => {
                self.closed_frames = self.closed_frames.saturating_add(1);
            }
        }

        let transition = Transition {
            from,
            to: self.state,
            blink_detected,
            closed_frames: self.closed_frames,
            open_frames: self.open_frames,
        };
        if from != self.state || blink_detected {
            debug!("Blink FSM: {transition}");
        }
        transition
    }

    /// Reset to `Open`, keeping the blink total
    pub fn reset(&mut self) {
        self.reset_episode();
    }

    fn promote_closure(&mut self) {
        if self.closed_frames >= self.limits.min_closed_frames {
            self.state = BlinkState::Closed;
            self.check_held();
        }
    }

    fn check_held(&mut self) {
        if self.closed_frames > self.limits.max_closed_frames {
            self.state = BlinkState::HeldClosed;
            self.suppressed = true;
        }
    }

    fn confirm_if_open_long_enough(&mut self) -> bool {
        if self.open_frames < self.limits.min_open_frames {
            return false;
        }
        let counted = !self.suppressed;
        if counted {
            self.total_blinks += 1;
        }
        self.reset_episode();
        counted
    }

    fn reset_episode(&mut self) {
        self.state = BlinkState::Open;
        self.closed_frames = 0;
        self.open_frames = 0;
        self.suppressed = false;
    }
}

impl Default for BlinkStateMachine {
    fn default() -> Self {
        Self::new(BlinkLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fsm: &mut BlinkStateMachine, closed: &[bool]) -> Vec<usize> {
        closed
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| fsm.update(c).blink_detected.then_some(i))
            .collect()
    }

    fn episode(closed_len: usize, open_len: usize) -> Vec<bool> {
        let mut frames = vec![false];
        frames.extend(std::iter::repeat(true).take(closed_len));
        frames.extend(std::iter::repeat(false).take(open_len));
        frames
    }

    #[test]
    fn test_short_blink_detected_on_second_open_frame() {
        let mut fsm = BlinkStateMachine::default();
        let blinks = run(&mut fsm, &episode(2, 2));
        assert_eq!(blinks, vec![4]);
        assert_eq!(fsm.total_blinks(), 1);
        assert_eq!(fsm.state(), BlinkState::Open);
    }

    #[test]
    fn test_single_frame_closure_counts() {
        let mut fsm = BlinkStateMachine::default();
        let t = fsm.update(true);
        assert_eq!(t.to, BlinkState::Closed);
        assert_eq!(run(&mut fsm, &[false, false]), vec![1]);
    }

    #[test]
    fn test_max_duration_boundary() {
        let mut fsm = BlinkStateMachine::default();
        assert_eq!(run(&mut fsm, &episode(7, 2)).len(), 1);

        let mut fsm = BlinkStateMachine::default();
        assert!(run(&mut fsm, &episode(8, 5)).is_empty());
        assert_eq!(fsm.total_blinks(), 0);
    }

    #[test]
    fn test_held_closed_reopening_is_suppressed() {
        let mut fsm = BlinkStateMachine::default();
        for _ in 0..9 {
            fsm.update(true);
        }
        assert_eq!(fsm.state(), BlinkState::HeldClosed);

        let t = fsm.update(false);
        assert_eq!(t.to, BlinkState::Opening);
        assert_eq!(t.open_frames, 1);
        let t = fsm.update(false);
        assert!(!t.blink_detected);
        assert_eq!(t.to, BlinkState::Open);

        // A normal blink afterwards still counts
        assert_eq!(run(&mut fsm, &episode(2, 2)).len(), 1);
    }

    #[test]
    fn test_reclosing_before_confirmation() {
        let mut fsm = BlinkStateMachine::default();
        let blinks = run(&mut fsm, &[true, true, false, true, false, false]);
        assert_eq!(blinks, vec![5]);
        assert_eq!(fsm.total_blinks(), 1);
    }

    #[test]
    fn test_reclosing_pushes_episode_past_max() {
        let mut fsm = BlinkStateMachine::default();
        let mut frames = vec![true; 6];
        frames.push(false);
        frames.extend([true, true]);
        frames.extend([false, false]);
        assert!(run(&mut fsm, &frames).is_empty());
    }

    #[test]
    fn test_closing_state_with_longer_minimum() {
        let mut fsm = BlinkStateMachine::new(BlinkLimits {
            min_closed_frames: 2,
            max_closed_frames: 7,
            min_open_frames: 2,
        });
        let t = fsm.update(true);
        assert_eq!(t.to, BlinkState::Closing);
        let t = fsm.update(false);
        assert_eq!(t.to, BlinkState::Open);
        assert_eq!(t.to_string(), "CLOSING→OPEN (too brief)");

        assert_eq!(run(&mut fsm, &[true, true, false, false]), vec![3]);
    }

    #[test]
    fn test_transition_labels() {
        let mut fsm = BlinkStateMachine::default();
        assert_eq!(fsm.update(false).to_string(), "OPEN");
        assert_eq!(fsm.update(true).to_string(), "OPEN→CLOSED");
        assert_eq!(fsm.update(true).to_string(), "CLOSED (2)");
        assert_eq!(fsm.update(false).to_string(), "CLOSED→OPENING");
        assert_eq!(fsm.update(false).to_string(), "BLINK DETECTED!");
    }

    #[test]
    #[should_panic(expected = "Minimum closed frames must not exceed maximum")]
    fn test_inverted_limits_panic() {
        let _ = BlinkStateMachine::new(BlinkLimits {
            min_closed_frames: 5,
            max_closed_frames: 2,
            min_open_frames: 2,
        });
    }
}
