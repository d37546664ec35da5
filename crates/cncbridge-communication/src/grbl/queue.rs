//! Command Queue (C3).
//!
//! An ordered sequence of g-code lines plus a cursor and run-state, with
//! strict at-most-one-in-flight dispatch (§4.3). The queue never touches
//! the transport itself — `play`/`next` return the line to send (if any)
//! and the caller (the Grbl Session) is responsible for actually writing
//! it and, later, calling `next` again once an ack arrives.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Default)]
pub struct CommandQueue {
    lines: Vec<String>,
    executed: usize,
    state: RunStateCell,
    /// True between a dispatch (`play`/`next` returning `Some`) and the
    /// next acknowledgement.
    dispatched: bool,
}

/// Wraps `RunState` only so `#[derive(Default)]` has an impl to reach for;
/// `RunState` itself carries no meaningful "default" semantically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunStateCell(RunState);
impl Default for RunStateCell {
    fn default() -> Self {
        RunStateCell(RunState::Idle)
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append lines to the tail of the queue. Does not affect run-state.
    pub fn push<I: IntoIterator<Item = String>>(&mut self, lines: I) {
        self.lines.extend(lines);
    }

    /// Remove all lines and reset the cursor. Any in-flight command's
    /// eventual ack is handled by the Session, not the queue — the queue
    /// itself no longer considers anything dispatched once cleared.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.executed = 0;
        self.dispatched = false;
    }

    /// Reset to Idle and rewind the cursor without discarding lines. Also
    /// clears the in-flight flag so a following `play()` re-dispatches
    /// from index 0 instead of believing a command is still outstanding.
    pub fn stop(&mut self) {
        self.state.0 = RunState::Idle;
        self.executed = 0;
        self.dispatched = false;
    }

    /// Pause. Does not cancel an in-flight command.
    pub fn pause(&mut self) {
        self.state.0 = RunState::Paused;
    }

    /// Resume/start. If nothing is in flight and there is work left,
    /// returns the line at the current cursor to dispatch.
    pub fn play(&mut self) -> Option<String> {
        self.state.0 = RunState::Running;
        self.dispatch_if_idle()
    }

    /// Called by the Session on an observed `ok`/`error` that belongs to
    /// this queue. Advances the cursor only while Running, and if still
    /// Running afterward, returns the next line to dispatch.
    pub fn next(&mut self) -> Option<String> {
        self.dispatched = false;
        if self.state.0 != RunState::Running {
            return None;
        }
        self.executed += 1;
        if self.executed >= self.lines.len() {
            self.state.0 = RunState::Idle;
            return None;
        }
        self.dispatch_if_idle()
    }

    fn dispatch_if_idle(&mut self) -> Option<String> {
        if self.dispatched || self.executed >= self.lines.len() {
            return None;
        }
        self.dispatched = true;
        Some(self.lines[self.executed].clone())
    }

    pub fn size(&self) -> usize {
        self.lines.len()
    }

    pub fn executed_count(&self) -> usize {
        self.executed
    }

    pub fn is_running(&self) -> bool {
        self.state.0 == RunState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert;

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("G0 X{i}")).collect()
    }

    #[test]
    fn play_dispatches_first_line_only() {
        let mut q = CommandQueue::new();
        q.push(lines(3));
        assert_eq!(q.play(), Some("G0 X0".to_string()));
        // Already dispatched — a second play() before an ack is a no-op.
        assert_eq!(q.play(), None);
    }

    #[test]
    fn next_advances_and_dispatches_following_line() {
        let mut q = CommandQueue::new();
        q.push(lines(3));
        q.play();
        assert_eq!(q.next(), Some("G0 X1".to_string()));
        assert_eq!(q.executed_count(), 1);
        assert_eq!(q.next(), Some("G0 X2".to_string()));
        assert_eq!(q.executed_count(), 2);
        assert_eq!(q.next(), None);
        assert_eq!(q.executed_count(), 3);
        assert!(!q.is_running());
    }

    #[test]
    fn pause_stops_dispatch_without_losing_progress() {
        let mut q = CommandQueue::new();
        q.push(lines(3));
        q.play();
        q.next(); // executed=1, dispatched index 1
        q.pause();
        // The Session only calls next() while is_running(); this models a
        // defensive call arriving anyway (e.g. a stray ack) and asserts it
        // is a no-op rather than silently advancing the cursor.
        assert_eq!(q.next(), None);
        assert_eq!(q.executed_count(), 1);
        assert!(!q.is_running());
    }

    #[test]
    fn stop_resets_executed_without_truncating_queue() {
        let mut q = CommandQueue::new();
        q.push(lines(3));
        q.play();
        q.next();
        q.stop();
        assert_eq!(q.executed_count(), 0);
        assert_eq!(q.size(), 3);
        assert!(!q.is_running());
        assert_eq!(q.play(), Some("G0 X0".to_string()));
    }

    #[test]
    fn clear_zeroes_size_and_executed() {
        let mut q = CommandQueue::new();
        q.push(lines(3));
        q.play();
        q.clear();
        assert_eq!(q.size(), 0);
        assert_eq!(q.executed_count(), 0);
    }

    #[test]
    fn queue_status_sequence_matches_dispatch_cadence() {
        let mut q = CommandQueue::new();
        q.push(lines(3));
        let mut observed = vec![(q.executed_count(), q.size())];
        q.play();
        for _ in 0..3 {
            q.next();
            observed.push((q.executed_count(), q.size()));
        }
        assert_eq!(observed, vec![(0, 3), (1, 3), (2, 3), (3, 3)]);
    }

    proptest::proptest! {
        /// Invariant 3 (§8): for any sequence of play/next/pause/stop calls,
        /// `executed_count()` never exceeds `size()`.
        #[test]
        fn executed_never_exceeds_size(ops in proptest::collection::vec(0u8..4, 0..50), n in 1usize..8) {
            let mut q = CommandQueue::new();
            q.push(lines(n));
            for op in ops {
                match op {
                    0 => { q.play(); }
                    1 => { q.next(); }
                    2 => q.pause(),
                    _ => q.stop(),
                }
                prop_assert!(q.executed_count() <= q.size());
            }
        }
    }
}
