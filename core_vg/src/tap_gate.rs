//! Single tap versus double tap on touch clients.
//!
//! Touch browsers fire a click for the first half of a double tap (the zoom
//! gesture), so a single-tap action is deferred by the double tap window and
//! dropped if a second touch lands in the meantime. Time is supplied by the
//! caller; nothing here reads a clock.

use std::collections::VecDeque;
use std::time::Instant;

use crate::viewer_config::TapConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientKind {
    #[default]
    Desktop,
    Touch,
}

#[derive(Debug)]
struct Deferred<A> {
    due: Instant,
    seq: u64,
    action: A,
}

#[derive(Debug)]
pub struct TapGate<A> {
    kind: ClientKind,
    config: TapConfig,
    double_tapping: bool,
    /// Clears `double_tapping` once due; replaced by every touch.
    reset: Option<(Instant, u64)>,
    pending: VecDeque<Deferred<A>>,
    next_seq: u64,
}

impl<A> TapGate<A> {
    pub fn new(kind: ClientKind, config: TapConfig) -> Self {
        Self {
            kind,
            config,
            double_tapping: false,
            reset: None,
            pending: VecDeque::new(),
            next_seq: 0,
        }
    }

    pub fn kind(&self) -> ClientKind {
        self.kind
    }

    pub fn is_double_tapping(&self) -> bool {
        self.double_tapping
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// A finger touched the map. Returns actions that came due before `now`.
    pub fn touch_start(&mut self, now: Instant) -> Vec<A> {
        let released = self.advance(now);
        if self.reset.take().is_some() {
            self.double_tapping = true;
            tracing::trace!(target: "vegmap::tap", "tap.double=detected");
        }
        let seq = self.seq();
        self.reset = Some((now + self.config.reset_delay(), seq));
        released
    }

    /// A click landed on the map. Desktop clients get the action back
    /// immediately; touch clients get it from a later [`TapGate::advance`]
    /// unless a double tap intervenes.
    pub fn single_click(&mut self, now: Instant, action: A) -> Vec<A> {
        let mut released = self.advance(now);
        match self.kind {
            ClientKind::Desktop => released.push(action),
            ClientKind::Touch if self.double_tapping => {
                tracing::trace!(target: "vegmap::tap", "tap.click=ignored_second_tap");
            }
            ClientKind::Touch => {
                let seq = self.seq();
                self.pending.push_back(Deferred {
                    due: now + self.config.double_tap_window(),
                    seq,
                    action,
                });
            }
        }
        released
    }

    /// Fires every timer due at or before `now`, in the order it was
    /// scheduled, and returns the actions that survived.
    pub fn advance(&mut self, now: Instant) -> Vec<A> {
        let mut released = Vec::new();
        loop {
            let reset_due = self.reset.filter(|(due, _)| *due <= now);
            let pending_due = self
                .pending
                .front()
                .filter(|deferred| deferred.due <= now)
                .map(|deferred| (deferred.due, deferred.seq));

            let reset_first = match (reset_due, pending_due) {
                (None, None) => break,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (Some(reset), Some(pending)) => reset <= pending,
            };

            if reset_first {
                self.reset = None;
                self.double_tapping = false;
            } else if let Some(deferred) = self.pending.pop_front() {
                if self.double_tapping {
                    tracing::debug!(target: "vegmap::tap", "tap.single=suppressed");
                } else {
                    released.push(deferred.action);
                }
            }
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn gate(kind: ClientKind) -> TapGate<&'static str> {
        TapGate::new(kind, TapConfig::default())
    }

    fn ms(origin: Instant, millis: u64) -> Instant {
        origin + Duration::from_millis(millis)
    }

    #[test]
    fn desktop_runs_immediately() {
        let mut gate = gate(ClientKind::Desktop);
        let now = Instant::now();
        assert_eq!(gate.single_click(now, "select"), vec!["select"]);
        assert_eq!(gate.pending_len(), 0);
    }

    #[test]
    fn single_tap_runs_after_the_window() {
        let mut gate = gate(ClientKind::Touch);
        let origin = Instant::now();
        assert!(gate.touch_start(origin).is_empty());
        assert!(gate.single_click(origin, "select").is_empty());
        assert!(gate.advance(ms(origin, 249)).is_empty());
        assert_eq!(gate.advance(ms(origin, 250)), vec!["select"]);
    }

    #[test]
    fn double_tap_suppresses_the_first_click() {
        let mut gate = gate(ClientKind::Touch);
        let origin = Instant::now();
        gate.touch_start(origin);
        gate.single_click(origin, "first");
        gate.touch_start(ms(origin, 120));
        assert!(gate.is_double_tapping());
        assert!(gate.single_click(ms(origin, 120), "second").is_empty());
        assert!(gate.advance(ms(origin, 1_000)).is_empty());
        assert!(!gate.is_double_tapping());
    }

    #[test]
    fn taps_outside_the_window_are_independent() {
        let mut gate = gate(ClientKind::Touch);
        let origin = Instant::now();
        gate.touch_start(origin);
        gate.single_click(origin, "first");
        let released = gate.touch_start(ms(origin, 400));
        assert_eq!(released, vec!["first"]);
        assert!(!gate.is_double_tapping());
        gate.single_click(ms(origin, 400), "second");
        assert_eq!(gate.advance(ms(origin, 650)), vec!["second"]);
    }

    #[test]
    fn reset_clears_before_the_deferred_click_fires() {
        let mut gate = gate(ClientKind::Touch);
        let origin = Instant::now();
        gate.touch_start(origin);
        gate.single_click(ms(origin, 10), "select");
        // The reset timer (245 ms) fires first, so the click survives.
        assert_eq!(gate.advance(ms(origin, 300)), vec!["select"]);
    }
}
